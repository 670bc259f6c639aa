// Prompt constants for turning a job posting into application emails.
// The extractor and normalizer depend on the key names and the "null" sentinel
// spelled out here; change them together.

/// Application email prompt template.
/// Replace: {applicant_profile}, {job_post}
pub const APPLICATION_PROMPT_TEMPLATE: &str = r#"You are an AI that generates professional job application emails.
Based on the language of the job offer (French or English), generate a JSON object with the following keys:

1. subject: The subject of the email. Use the job post's subject if mentioned, otherwise create one based on the job position.
2. message: The full email message including a short introduction, a mention of the attached CV and motivation letter, and a polite closing signature with the applicant's name and contact details.
3. receiver_email: The email address of the receiver if mentioned in the job post; otherwise the string "null".

About the applicant (use only this when you need personal details):
{applicant_profile}

Rules:
- Do not leave any blank fields.
- Use a professional and polite tone.
- Avoid uncertain information.

Job posting:
{job_post}

Output ONLY the JSON, without extra text, and use exactly [subject, message, receiver_email] as JSON keys.
If the offer contains more than one job, generate one JSON object per job and separate them by commas. Do NOT wrap them in an array."#;

/// Fills the application template with the applicant profile and the scraped posting.
pub fn build_application_prompt(applicant_profile: &str, job_post: &str) -> String {
    APPLICATION_PROMPT_TEMPLATE
        .replace("{applicant_profile}", applicant_profile.trim())
        .replace("{job_post}", job_post.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intents::normalizer::{MESSAGE_KEY, NULL_SENTINEL, RECEIVER_KEY, SUBJECT_KEY};

    #[test]
    fn test_template_names_every_key_the_normalizer_reads() {
        for key in [SUBJECT_KEY, MESSAGE_KEY, RECEIVER_KEY] {
            assert!(APPLICATION_PROMPT_TEMPLATE.contains(key), "missing key {key}");
        }
    }

    #[test]
    fn test_template_requests_json_only_and_string_sentinel() {
        assert!(APPLICATION_PROMPT_TEMPLATE.contains("Output ONLY the JSON"));
        assert!(APPLICATION_PROMPT_TEMPLATE.contains(&format!("\"{NULL_SENTINEL}\"")));
        assert!(APPLICATION_PROMPT_TEMPLATE.contains("separate them by commas"));
    }

    #[test]
    fn test_build_prompt_interpolates_both_placeholders() {
        let prompt = build_application_prompt(
            "  Jane Doe, +33 6 00 00 00 00, 4 years of embedded C  ",
            "\nWe are hiring a firmware engineer. Send your CV to hr@acme.fr\n",
        );
        assert!(prompt.contains("Jane Doe, +33 6 00 00 00 00, 4 years of embedded C\n"));
        assert!(prompt.contains("Job posting:\nWe are hiring a firmware engineer."));
        assert!(!prompt.contains("{applicant_profile}"));
        assert!(!prompt.contains("{job_post}"));
    }
}
