//! Per-field business rules.
//!
//! Each check returns the cleaned value or a [`ValidationError`] naming the
//! field it rejects. Presence and email syntax are checked by the
//! `validator` derive on the form DTO.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use serde::Serialize;
use thiserror::Error;

use crate::features::records::dtos::UploadedFile;
use crate::features::records::models::{Country, Gender, Hobby};
use crate::shared::constants::{
    MAX_UPLOAD_SIZE, MESSAGE_MAX_LEN, MESSAGE_MIN_LEN, MINIMUM_AGE, MIN_HOBBIES,
    PASSWORD_MAX_LEN, UPLOAD_EXTENSION,
};
use crate::shared::validation::is_strong_password;

/// A rejected field and the message shown next to it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// All messages for a submission, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn push(&mut self, error: ValidationError) {
        self.add(error.field, error.message);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Take over the messages of fields that have none here yet
    pub fn merge_missing(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_insert(messages);
        }
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut out = FieldErrors::default();
        for (field, errs) in errors.field_errors() {
            for err in errs {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({})", err.code));
                out.add(field.to_string(), message);
            }
        }
        out
    }
}

/// Age in whole years on `today`. The year only counts once the birthday
/// (month and day) has been reached.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> i32 {
    let before_birthday = (today.month(), today.day()) < (dob.month(), dob.day());
    today.year() - dob.year() - i32::from(before_birthday)
}

pub fn validate_dob(raw: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let dob = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::new("dob", "Enter a valid date."))?;

    if age_on(dob, today) < MINIMUM_AGE {
        return Err(ValidationError::new(
            "dob",
            "You must be at least 18 years old to register.",
        ));
    }
    Ok(dob)
}

/// Every value must come from the catalog; duplicates collapse so that at
/// least three *distinct* hobbies are required.
pub fn validate_hobbies(raw: &[String]) -> Result<Vec<Hobby>, ValidationError> {
    let mut hobbies: Vec<Hobby> = Vec::with_capacity(raw.len());
    for value in raw {
        let hobby = Hobby::parse(value).map_err(|e| {
            ValidationError::new(
                "hobbies",
                format!(
                    "Select a valid choice. {} is not one of the available choices.",
                    e.value
                ),
            )
        })?;
        if !hobbies.contains(&hobby) {
            hobbies.push(hobby);
        }
    }

    if hobbies.len() < MIN_HOBBIES {
        return Err(ValidationError::new("hobbies", "Select at least 3 hobbies."));
    }
    Ok(hobbies)
}

/// Length is counted in characters and must lie in `[8, 300]`.
pub fn validate_message(raw: &str) -> Result<String, ValidationError> {
    let len = raw.chars().count();
    if !(MESSAGE_MIN_LEN..=MESSAGE_MAX_LEN).contains(&len) {
        return Err(ValidationError::new(
            "message",
            "Message must be at least 8 characters long and at most 300 characters long.",
        ));
    }
    Ok(raw.to_string())
}

pub fn validate_password(raw: &str) -> Result<String, ValidationError> {
    if raw.chars().count() > PASSWORD_MAX_LEN {
        return Err(ValidationError::new(
            "password",
            "Ensure this value has at most 40 characters.",
        ));
    }
    if !is_strong_password(raw) {
        return Err(ValidationError::new(
            "password",
            "Password must contain at least one letter, one digit, one uppercase letter, \
             one lowercase letter and one special character.",
        ));
    }
    Ok(raw.to_string())
}

pub const FILE_TOO_LARGE: &str = "File size must be no more than 5 MB.";

/// Size is checked against the uploaded bytes; the extension check ignores
/// case, so `CV.PDF` is accepted.
pub fn validate_file(file: &UploadedFile) -> Result<(), ValidationError> {
    if file.data.len() > MAX_UPLOAD_SIZE {
        return Err(ValidationError::new("file", FILE_TOO_LARGE));
    }
    if !file.file_name.to_lowercase().ends_with(UPLOAD_EXTENSION) {
        return Err(ValidationError::new("file", "Only PDF files are allowed."));
    }
    Ok(())
}

pub fn validate_gender(raw: &str) -> Result<Gender, ValidationError> {
    Gender::parse(raw).map_err(|e| {
        ValidationError::new(
            "gender",
            format!(
                "Select a valid choice. {} is not one of the available choices.",
                e.value
            ),
        )
    })
}

pub fn validate_country(raw: &str) -> Result<Country, ValidationError> {
    Country::parse(raw).map_err(|e| {
        ValidationError::new(
            "country",
            format!(
                "Select a valid choice. {} is not one of the available choices.",
                e.value
            ),
        )
    })
}
