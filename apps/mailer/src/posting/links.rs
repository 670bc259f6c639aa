use std::path::Path;

use tracing::info;

use crate::errors::AppError;

/// Reads the newline-delimited list of posting URLs that makes up one batch.
pub fn load_posting_urls(path: &Path) -> Result<Vec<String>, AppError> {
    let content = std::fs::read_to_string(path).map_err(|source| AppError::LinksFile {
        path: path.to_path_buf(),
        source,
    })?;

    let urls = parse_posting_urls(&content);
    info!("Loaded {} posting URLs from {}", urls.len(), path.display());
    Ok(urls)
}

/// One URL per line, trimmed; blank lines are skipped. Order is preserved.
pub fn parse_posting_urls(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_are_trimmed_and_blanks_skipped() {
        let content = "  https://www.linkedin.com/posts/a  \r\n\r\n\thttps://www.linkedin.com/posts/b\n   \n";
        assert_eq!(
            parse_posting_urls(content),
            vec![
                "https://www.linkedin.com/posts/a".to_string(),
                "https://www.linkedin.com/posts/b".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_file_yields_no_urls() {
        assert!(parse_posting_urls("").is_empty());
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job_links.txt");
        std::fs::write(&path, "https://a.example/1\nhttps://a.example/2\n").unwrap();
        assert_eq!(load_posting_urls(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_posting_urls(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, AppError::LinksFile { .. }));
    }
}
