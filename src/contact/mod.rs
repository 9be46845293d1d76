//! Contact-seller flow
//!
//! Validates the buyer's message and turns it into an email for the seller.

mod templates;

pub use templates::Templates;

use crate::models::{Advertisement, User};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

/// Longest message accepted
const MAX_MESSAGE_LEN: usize = 2000;

/// Message a buyer sends to a seller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRequest {
    pub sender_name: String,
    pub sender_email: String,
    #[serde(default)]
    pub sender_phone: Option<String>,
    pub message: String,
}

/// Contact flow failures
#[derive(Debug, Error)]
pub enum ContactError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("message must not be empty")]
    EmptyMessage,

    #[error("message is longer than {MAX_MESSAGE_LEN} characters")]
    MessageTooLong,

    #[error("seller has no email address")]
    NoRecipient,

    #[error("failed to render email: {0}")]
    Render(#[from] anyhow::Error),
}

impl ContactRequest {
    pub fn validate(&self) -> Result<(), ContactError> {
        if self.sender_name.trim().is_empty() {
            return Err(ContactError::EmptyName);
        }
        if !is_valid_email(&self.sender_email) {
            return Err(ContactError::InvalidEmail(self.sender_email.clone()));
        }
        if self.message.trim().is_empty() {
            return Err(ContactError::EmptyMessage);
        }
        if self.message.chars().count() > MAX_MESSAGE_LEN {
            return Err(ContactError::MessageTooLong);
        }
        Ok(())
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Body parts of an outgoing email
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BodyParts {
    pub textmessage: String,
    pub htmlmessage: String,
}

/// Email as accepted by the backend messaging endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub bodyparts: BodyParts,
    pub to: Vec<String>,
}

#[derive(Serialize)]
struct ContactContext<'a> {
    seller_name: Option<&'a str>,
    sender_name: &'a str,
    sender_email: &'a str,
    sender_phone: Option<&'a str>,
    message: &'a str,
    title: String,
    year: i64,
    price: i64,
}

/// Build the email to the seller of `ad`
pub fn compose_email(
    templates: &Templates,
    ad: &Advertisement,
    seller: &User,
    request: &ContactRequest,
) -> Result<EmailMessage, ContactError> {
    request.validate()?;
    if !is_valid_email(&seller.email) {
        return Err(ContactError::NoRecipient);
    }

    let context = ContactContext {
        seller_name: seller.name.as_deref(),
        sender_name: request.sender_name.trim(),
        sender_email: request.sender_email.trim(),
        sender_phone: request.sender_phone.as_deref().filter(|p| !p.trim().is_empty()),
        message: request.message.trim(),
        title: ad.title(),
        year: ad.year_of_manufacture,
        price: ad.price,
    };

    Ok(EmailMessage {
        subject: format!("{}: new message from {}", ad.title(), context.sender_name),
        bodyparts: BodyParts {
            textmessage: templates.render(templates::CONTACT_TEXT, &context)?,
            htmlmessage: templates.render(templates::CONTACT_HTML, &context)?,
        },
        to: vec![seller.email.clone()],
    })
}
