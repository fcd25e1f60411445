use anyhow::Result;

use bulletin_core::{
    recipient::{NewRecipient, Recipient},
    storage::{Database, RecipientRepository},
    Error,
};

pub async fn add(db: &Database, email: &str) -> Result<()> {
    let new_recipient = NewRecipient::parse(email)?;
    let repo = RecipientRepository::new(db);

    match repo.create(&new_recipient).await {
        Ok(recipient) => {
            println!("Added recipient: {} ({})", recipient.email, recipient.id);
            Ok(())
        }
        Err(Error::DuplicateRecipient(email)) => {
            println!("Already subscribed: {}", email);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn list(db: &Database, all: bool) -> Result<()> {
    let repo = RecipientRepository::new(db);
    let recipients = if all {
        repo.list_all().await?
    } else {
        repo.list_active().await?
    };

    if recipients.is_empty() {
        println!("No recipients yet.");
        println!("\nTo add one, run:");
        println!("  bulletin recipients add <email>");
        return Ok(());
    }

    println!("Recipients ({}):\n", recipients.len());
    for recipient in &recipients {
        let state = if recipient.active { "" } else { " [inactive]" };
        println!(
            "  {}{}  (added {})",
            recipient.email,
            state,
            recipient.created_at.format("%Y-%m-%d")
        );
    }

    Ok(())
}

pub async fn remove(db: &Database, email: &str) -> Result<()> {
    let recipient = lookup(db, email).await?;
    RecipientRepository::new(db).delete(recipient.id).await?;
    println!("Removed recipient: {}", recipient.email);
    Ok(())
}

pub async fn set_active(db: &Database, email: &str, active: bool) -> Result<()> {
    let recipient = lookup(db, email).await?;
    RecipientRepository::new(db)
        .set_active(recipient.id, active)
        .await?;

    if active {
        println!("Activated recipient: {}", recipient.email);
    } else {
        println!("Deactivated recipient: {}", recipient.email);
    }
    Ok(())
}

async fn lookup(db: &Database, email: &str) -> Result<Recipient> {
    RecipientRepository::new(db)
        .find_by_email(email)
        .await?
        .ok_or_else(|| Error::RecipientNotFound(email.trim().to_string()).into())
}
