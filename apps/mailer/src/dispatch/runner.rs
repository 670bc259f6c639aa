//! Dispatch Loop: drives each posting from URL to sent mail.
//!
//! Flow per posting: scrape → build prompt → LLM complete → extract + normalize →
//! one mail per intent. Postings and intents are processed strictly in sequence.
//!
//! Failure isolation: a scrape or generation failure ends that posting with a `Failed`
//! outcome; a mail failure fails that intent only. Nothing raised by a collaborator
//! stops the batch.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument};

use crate::dispatch::outcome::{BatchReport, Outcome, PostingStage};
use crate::dispatch::pacing::Pacer;
use crate::intents::intents_from_completion;
use crate::intents::normalizer::EmailIntent;
use crate::intents::prompts::build_application_prompt;
use crate::llm_client::LanguageModel;
use crate::mail::MailTransport;
use crate::posting::archive::PostArchive;
use crate::posting::PageScraper;

/// Pacing gates in front of the two rate-sensitive services.
pub struct Pacing {
    pub llm: Arc<dyn Pacer>,
    pub mail: Arc<dyn Pacer>,
}

pub struct DispatchLoop {
    scraper: Arc<dyn PageScraper>,
    llm: Arc<dyn LanguageModel>,
    mailer: Arc<dyn MailTransport>,
    pacing: Pacing,
    applicant_profile: String,
    attachments: Vec<PathBuf>,
    archive: Option<PostArchive>,
}

impl DispatchLoop {
    pub fn new(
        scraper: Arc<dyn PageScraper>,
        llm: Arc<dyn LanguageModel>,
        mailer: Arc<dyn MailTransport>,
        pacing: Pacing,
        applicant_profile: String,
    ) -> Self {
        Self {
            scraper,
            llm,
            mailer,
            pacing,
            applicant_profile,
            attachments: Vec::new(),
            archive: None,
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<PathBuf>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn with_archive(mut self, archive: Option<PostArchive>) -> Self {
        self.archive = archive;
        self
    }

    /// Processes every posting URL in order and returns the accumulated outcomes.
    pub async fn run(&self, urls: &[String]) -> BatchReport {
        let mut report = BatchReport::start();
        let span = info_span!("batch", run_id = %report.run_id);

        async {
            info!("Starting batch of {} postings", urls.len());
            for url in urls {
                report.postings += 1;
                self.process_posting(url, &mut report)
                    .instrument(info_span!("posting", posting = %url))
                    .await;
            }
        }
        .instrument(span)
        .await;

        report.finish();
        debug!(kinds = ?report.kinds(), "Outcome sequence");
        info!(run_id = %report.run_id, "Batch finished: {}", report.summary());
        report
    }

    async fn process_posting(&self, url: &str, report: &mut BatchReport) {
        enter(PostingStage::Scraping);
        let posting = match self.scraper.scrape(url).await {
            Ok(text) => text,
            Err(e) => {
                fail_posting(report, url, PostingStage::Scraping, e.to_string());
                return;
            }
        };

        if let Some(archive) = &self.archive {
            if let Err(e) = archive.append(&posting).await {
                warn!("Could not archive posting to {}: {}", archive.path().display(), e);
            }
        }

        enter(PostingStage::Generating);
        let prompt = build_application_prompt(&self.applicant_profile, &posting);
        self.pacing.llm.ready().await;
        let completion = match self.llm.complete(&prompt).await {
            Ok(completion) => completion,
            Err(e) => {
                fail_posting(report, url, PostingStage::Generating, e.to_string());
                return;
            }
        };
        if !completion.is_success() {
            let reason = format!("LLM returned status {}", completion.status);
            fail_posting(report, url, PostingStage::Generating, reason);
            return;
        }

        enter(PostingStage::Extracting);
        let parsed = intents_from_completion(&completion.body);
        if let Some(diagnostic) = parsed.diagnostic {
            report.extraction_warnings += 1;
            warn!("Extraction diagnostic: {}", diagnostic);
        }
        info!("Number of emails to send: {}", parsed.intents.len());

        enter(PostingStage::Dispatching);
        for intent in &parsed.intents {
            let outcome = self.dispatch_intent(intent).await;
            report.record(url, outcome);
        }

        enter(PostingStage::Done);
    }

    async fn dispatch_intent(&self, intent: &EmailIntent) -> Outcome {
        self.pacing.mail.ready().await;

        debug!(
            recipient = ?intent.recipient,
            subject = %intent.subject,
            "message: {}",
            intent.body.replace('\n', " ")
        );

        let Some(recipient) = intent.recipient.as_deref() else {
            info!(subject = %intent.subject, "Skipped: no recipient address in posting");
            return Outcome::SkippedNoRecipient {
                subject: intent.subject.clone(),
            };
        };

        match self
            .mailer
            .send(recipient, &intent.subject, &intent.body, &self.attachments)
            .await
        {
            Ok(()) => {
                info!(recipient = %recipient, subject = %intent.subject, "Sent");
                Outcome::Sent {
                    recipient: recipient.to_string(),
                    subject: intent.subject.clone(),
                }
            }
            Err(e) => {
                warn!(recipient = %recipient, "Failed: {}", e);
                Outcome::Failed {
                    stage: PostingStage::Dispatching,
                    reason: e.to_string(),
                }
            }
        }
    }
}

fn enter(stage: PostingStage) {
    debug!(?stage, "Posting stage");
}

fn fail_posting(report: &mut BatchReport, url: &str, stage: PostingStage, reason: String) {
    warn!(?stage, "Failed: {}", reason);
    enter(PostingStage::Failed);
    report.record(url, Outcome::Failed { stage, reason });
}
