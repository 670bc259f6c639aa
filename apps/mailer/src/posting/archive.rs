use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

/// Separator written between archived postings.
pub const POST_SEPARATOR: &str = "\n|\n";

/// Append-only local copy of every scraped posting.
#[derive(Debug, Clone)]
pub struct PostArchive {
    path: PathBuf,
}

impl PostArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `posting`, preceded by the separator when the archive already has content.
    /// Creates the file on first use.
    pub async fn append(&self, posting: &str) -> std::io::Result<()> {
        let has_content = match tokio::fs::read_to_string(&self.path).await {
            Ok(existing) => !existing.trim().is_empty(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e),
        };

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        if has_content {
            file.write_all(POST_SEPARATOR.as_bytes()).await?;
        }
        file.write_all(posting.as_bytes()).await?;
        file.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_posting_has_no_separator() {
        let dir = tempfile::tempdir().unwrap();
        let archive = PostArchive::new(dir.path().join("job_posts.txt"));

        archive.append("first posting").await.unwrap();
        let content = tokio::fs::read_to_string(archive.path()).await.unwrap();
        assert_eq!(content, "first posting");
    }

    #[tokio::test]
    async fn test_later_postings_are_separated() {
        let dir = tempfile::tempdir().unwrap();
        let archive = PostArchive::new(dir.path().join("job_posts.txt"));

        archive.append("one").await.unwrap();
        archive.append("two").await.unwrap();
        archive.append("three").await.unwrap();

        let content = tokio::fs::read_to_string(archive.path()).await.unwrap();
        assert_eq!(content, "one\n|\ntwo\n|\nthree");
    }

    #[tokio::test]
    async fn test_whitespace_only_file_counts_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job_posts.txt");
        tokio::fs::write(&path, "\n  \n").await.unwrap();

        PostArchive::new(&path).append("posting").await.unwrap();
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "\n  \nposting");
    }
}
