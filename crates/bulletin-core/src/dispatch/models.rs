use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStatus {
    Success,
    Error,
}

impl DispatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStatus::Success => "success",
            DispatchStatus::Error => "error",
        }
    }
}

impl fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DispatchStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(DispatchStatus::Success),
            "error" => Ok(DispatchStatus::Error),
            other => Err(Error::Other(format!("unknown dispatch status '{}'", other))),
        }
    }
}

/// What started a dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchTrigger {
    /// Operator asked for it, schedule not consulted
    Manual,
    /// The schedule evaluator fired
    Scheduled,
}

impl DispatchTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchTrigger::Manual => "manual",
            DispatchTrigger::Scheduled => "scheduled",
        }
    }
}

impl fmt::Display for DispatchTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DispatchTrigger {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(DispatchTrigger::Manual),
            "scheduled" => Ok(DispatchTrigger::Scheduled),
            other => Err(Error::Other(format!("unknown dispatch trigger '{}'", other))),
        }
    }
}

/// Stored audit entry for one dispatch attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub id: Uuid,
    pub dispatched_at: DateTime<Utc>,
    pub trigger: DispatchTrigger,
    pub subject: String,
    pub content: String,
    /// Active recipients when the attempt began, in order
    pub recipients: Vec<String>,
    pub sent_count: u32,
    pub status: DispatchStatus,
    pub error: Option<String>,
}

/// Data required to append a history entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDispatchRecord {
    pub dispatched_at: DateTime<Utc>,
    pub trigger: DispatchTrigger,
    pub subject: String,
    pub content: String,
    pub recipients: Vec<String>,
    pub sent_count: u32,
    pub status: DispatchStatus,
    pub error: Option<String>,
}

/// Whatever a dispatch has determined so far.
///
/// Every field starts empty and is filled as the sequence advances, so the
/// error path can always build a record from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialDispatch {
    pub recipients: Vec<String>,
    pub subject: String,
    pub content: String,
    pub sent_count: u32,
}

impl PartialDispatch {
    pub fn new(recipients: Vec<String>) -> Self {
        Self {
            recipients,
            ..Self::default()
        }
    }

    pub fn into_record(
        self,
        trigger: DispatchTrigger,
        dispatched_at: DateTime<Utc>,
        error: Option<String>,
    ) -> NewDispatchRecord {
        NewDispatchRecord {
            dispatched_at,
            trigger,
            subject: self.subject,
            content: self.content,
            recipients: self.recipients,
            sent_count: self.sent_count,
            status: if error.is_some() {
                DispatchStatus::Error
            } else {
                DispatchStatus::Success
            },
            error,
        }
    }
}
