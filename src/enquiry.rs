// Validators for enquiry (lead capture) forms

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const ENQUIRIES_TABLE: &str = "enquiries";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EnquiryError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("email address is invalid")]
    InvalidEmail,
    #[error("phone number is invalid")]
    InvalidPhone,
}

#[derive(Deserialize, Debug, Clone)]
pub struct EnquiryForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Enquiry {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub course: Option<String>,
    pub message: String,
    pub submitted_at: DateTime<Utc>,
}

pub fn max_len(field: &str) -> usize {
    match field {
        "name" => 120,
        "email" => 254,
        "phone" => 32,
        "course" => 200,
        "message" => 2000,
        _ => 255,
    }
}

pub fn is_valid_email(v: &str) -> bool {
    match v.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|part| !part.is_empty())
                && !v.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Collapses runs of whitespace; `None` if anything but digits, `+ - ( )`
/// and spaces appears, or fewer than seven digits remain.
pub fn normalize_phone(v: &str) -> Option<String> {
    let allowed = |c: char| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' ');
    if !v.chars().all(allowed) {
        return None;
    }
    if v.chars().filter(char::is_ascii_digit).count() < 7 {
        return None;
    }
    Some(v.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn required(field: &'static str, value: &str) -> Result<String, EnquiryError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(EnquiryError::Required(field));
    }
    bounded(field, value)
}

fn bounded(field: &'static str, value: &str) -> Result<String, EnquiryError> {
    let max = max_len(field);
    if value.chars().count() > max {
        return Err(EnquiryError::TooLong { field, max });
    }
    Ok(value.to_string())
}

impl EnquiryForm {
    pub fn validate(self) -> Result<Enquiry, EnquiryError> {
        let name = required("name", &self.name)?;
        let email = required("email", &self.email)?;
        if !is_valid_email(&email) {
            return Err(EnquiryError::InvalidEmail);
        }
        let phone = required("phone", &self.phone)?;
        let phone = normalize_phone(&phone).ok_or(EnquiryError::InvalidPhone)?;
        let course = self
            .course
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| bounded("course", c))
            .transpose()?;
        let message = bounded("message", self.message.as_deref().unwrap_or_default().trim())?;

        Ok(Enquiry {
            id: Uuid::new_v4(),
            name,
            email,
            phone,
            course,
            message,
            submitted_at: Utc::now(),
        })
    }
}
