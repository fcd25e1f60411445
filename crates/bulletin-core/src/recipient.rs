use chrono::{DateTime, Utc};
use lettre::Address;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// A newsletter recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: Uuid,
    pub email: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Data required to add a recipient
#[derive(Debug, Clone)]
pub struct NewRecipient {
    pub email: String,
}

impl NewRecipient {
    /// Normalise and validate an address before it is stored
    pub fn parse(email: &str) -> Result<Self> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(Error::InvalidEmail("(empty)".to_string()));
        }

        email
            .parse::<Address>()
            .map_err(|_| Error::InvalidEmail(email.clone()))?;

        Ok(Self { email })
    }
}
