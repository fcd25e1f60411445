use chrono::{DateTime, Local, Utc};
use thiserror::Error;

use super::models::{DispatchTrigger, NewDispatchRecord, PartialDispatch};
use crate::mail::MailSender;
use crate::news::ContentProvider;
use crate::recipient::Recipient;
use crate::render::Renderer;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("no active recipients")]
    NoRecipients,

    #[error("no articles found to send")]
    NoContent,

    #[error("failed to render newsletter: {0}")]
    Render(String),

    #[error("delivery to {recipient} failed: {reason}")]
    DeliveryFailure { recipient: String, reason: String },
}

/// Result of one call to [`dispatch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Nobody to send to; nothing attempted and nothing to record
    NoRecipients,
    /// An attempt was made and must be recorded exactly once
    Attempted {
        record: NewDispatchRecord,
        failure: Option<DispatchError>,
    },
}

impl DispatchOutcome {
    pub fn record(&self) -> Option<&NewDispatchRecord> {
        match self {
            DispatchOutcome::NoRecipients => None,
            DispatchOutcome::Attempted { record, .. } => Some(record),
        }
    }

    pub fn failure(&self) -> Option<&DispatchError> {
        match self {
            DispatchOutcome::NoRecipients => Some(&DispatchError::NoRecipients),
            DispatchOutcome::Attempted { failure, .. } => failure.as_ref(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Attempted { failure: None, .. })
    }
}

/// Deliver the newsletter to every active recipient.
///
/// Content is fetched and rendered once and the same document goes to every
/// recipient. Sends are sequential and fail-fast: the first delivery failure
/// stops the remaining sends, and earlier deliveries stay delivered. Any
/// attempt that gets past the recipient check yields exactly one record.
pub async fn dispatch(
    recipients: &[Recipient],
    provider: &dyn ContentProvider,
    renderer: &dyn Renderer,
    sender: &dyn MailSender,
    query: &str,
    trigger: DispatchTrigger,
    now: DateTime<Local>,
) -> DispatchOutcome {
    let snapshot: Vec<String> = recipients
        .iter()
        .filter(|r| r.active)
        .map(|r| r.email.clone())
        .collect();

    if snapshot.is_empty() {
        tracing::info!("Dispatch skipped: no active recipients");
        return DispatchOutcome::NoRecipients;
    }

    tracing::info!("Starting {} dispatch to {} recipients", trigger, snapshot.len());

    let mut partial = PartialDispatch::new(snapshot);
    let result = run(&mut partial, provider, renderer, sender, query, now).await;

    match &result {
        Ok(()) => tracing::info!("Dispatch completed: {} sent", partial.sent_count),
        Err(e) => tracing::error!(
            sent = partial.sent_count,
            "Dispatch failed: {}",
            e
        ),
    }

    let failure = result.err();
    let record = partial.into_record(
        trigger,
        now.with_timezone(&Utc),
        failure.as_ref().map(|e| e.to_string()),
    );

    DispatchOutcome::Attempted { record, failure }
}

async fn run(
    partial: &mut PartialDispatch,
    provider: &dyn ContentProvider,
    renderer: &dyn Renderer,
    sender: &dyn MailSender,
    query: &str,
    now: DateTime<Local>,
) -> Result<(), DispatchError> {
    let articles = provider.fetch(query).await;
    if articles.is_empty() {
        return Err(DispatchError::NoContent);
    }

    let as_of = now.date_naive();
    partial.subject = renderer.subject(as_of);

    let document = renderer
        .render(&articles, as_of)
        .map_err(|e| DispatchError::Render(e.to_string()))?;
    partial.content = document.as_str().to_string();

    for address in &partial.recipients {
        sender
            .send(&partial.subject, &document, address)
            .await
            .map_err(|e| DispatchError::DeliveryFailure {
                recipient: address.clone(),
                reason: e.to_string(),
            })?;
        partial.sent_count += 1;
    }

    Ok(())
}
