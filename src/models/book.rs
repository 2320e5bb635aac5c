//! Book model, request payload and its validation rules

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const MSG_TITLE: &str = "Titel ist erforderlich und muss mindestens 3 Zeichen lang sein.";
pub const MSG_AUTHOR: &str = "Autor ist erforderlich und muss mindestens 3 Zeichen lang sein.";
pub const MSG_ISBN: &str = "ISBN ist erforderlich und muss 10-13 Ziffern lang sein.";
pub const MSG_PUBLISHED_DATE: &str =
    "publishedDate ist erforderlich und muss ein gültiges ISO-Datum sein (YYYY-MM-DD).";
pub const MSG_AVAILABLE: &str = "Verfügbarkeit (available) muss ein Boolean (true/false) sein.";

/// Rule messages in the order they are reported
const RULE_MESSAGES: [&str; 5] = [
    MSG_TITLE,
    MSG_AUTHOR,
    MSG_ISBN,
    MSG_PUBLISHED_DATE,
    MSG_AVAILABLE,
];

const DATE_FORMAT: &str = "%Y-%m-%d";

// ASCII digits only, `\d` would also accept other Unicode digits
static ISBN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{10,13}$").expect("ISBN pattern is a valid regex"));

/// Stored book record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    /// 10 to 13 digits
    pub isbn: String,
    /// Publication date (YYYY-MM-DD)
    pub published_date: NaiveDate,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Build a fresh record with a new id, both timestamps set to `now`
    pub fn new(fields: NewBook, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: fields.title,
            author: fields.author,
            isbn: fields.isbn,
            published_date: fields.published_date,
            available: fields.available,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge the provided fields over this record and bump `updated_at`.
    /// `id` and `created_at` never change.
    pub fn apply(&mut self, changes: BookChanges, now: DateTime<Utc>) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(author) = changes.author {
            self.author = author;
        }
        if let Some(isbn) = changes.isbn {
            self.isbn = isbn;
        }
        if let Some(published_date) = changes.published_date {
            self.published_date = published_date;
        }
        if let Some(available) = changes.available {
            self.available = available;
        }
        self.updated_at = now.max(self.created_at);
    }
}

/// Writable fields of a validated book
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub published_date: NaiveDate,
    pub available: bool,
}

/// Partial set of writable fields; `None` keeps the stored value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub published_date: Option<NaiveDate>,
    pub available: Option<bool>,
}

impl From<NewBook> for BookChanges {
    fn from(fields: NewBook) -> Self {
        Self {
            title: Some(fields.title),
            author: Some(fields.author),
            isbn: Some(fields.isbn),
            published_date: Some(fields.published_date),
            available: Some(fields.available),
        }
    }
}

/// Create/update request body.
///
/// Every field is optional and a value of the wrong JSON type reads as
/// absent, so shape problems surface as validation messages instead of a
/// body rejection.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    #[serde(default, deserialize_with = "lenient")]
    #[validate(
        required(message = "Titel ist erforderlich und muss mindestens 3 Zeichen lang sein."),
        length(min = 3, message = "Titel ist erforderlich und muss mindestens 3 Zeichen lang sein.")
    )]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    #[validate(
        required(message = "Autor ist erforderlich und muss mindestens 3 Zeichen lang sein."),
        length(min = 3, message = "Autor ist erforderlich und muss mindestens 3 Zeichen lang sein.")
    )]
    pub author: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    #[validate(
        required(message = "ISBN ist erforderlich und muss 10-13 Ziffern lang sein."),
        regex(path = *ISBN_PATTERN, message = "ISBN ist erforderlich und muss 10-13 Ziffern lang sein.")
    )]
    pub isbn: Option<String>,

    /// Publication date (YYYY-MM-DD)
    #[serde(default, deserialize_with = "lenient")]
    #[validate(
        required(message = "publishedDate ist erforderlich und muss ein gültiges ISO-Datum sein (YYYY-MM-DD)."),
        custom(function = "validate_published_date")
    )]
    pub published_date: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    #[validate(required(message = "Verfügbarkeit (available) muss ein Boolean (true/false) sein."))]
    pub available: Option<bool>,
}

/// Outcome of parsing and validating a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid(NewBook),
    Invalid(Vec<String>),
}

impl BookPayload {
    /// Read a request body. Anything but a JSON object carries no fields,
    /// so every rule reports its message.
    pub fn from_body(body: serde_json::Value) -> Self {
        match body {
            serde_json::Value::Object(_) => serde_json::from_value(body).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    /// Run every rule and turn the payload into typed fields
    pub fn into_validated(self) -> Validation {
        let errors = validate(&self);
        if !errors.is_empty() {
            return Validation::Invalid(errors);
        }

        let published_date = self.published_date.as_deref().and_then(parse_date);
        match (self.title, self.author, self.isbn, published_date, self.available) {
            (Some(title), Some(author), Some(isbn), Some(published_date), Some(available)) => {
                Validation::Valid(NewBook {
                    title,
                    author,
                    isbn,
                    published_date,
                    available,
                })
            }
            _ => Validation::Invalid(RULE_MESSAGES.iter().map(|m| m.to_string()).collect()),
        }
    }
}

/// Check a payload against all rules, returning every violated rule's
/// message in rule order. An empty list means the payload is valid.
pub fn validate(payload: &BookPayload) -> Vec<String> {
    let Err(errors) = payload.validate() else {
        return Vec::new();
    };

    let mut messages: Vec<String> = errors
        .field_errors()
        .into_values()
        .flatten()
        .map(|e| match &e.message {
            Some(message) => message.to_string(),
            None => e.code.to_string(),
        })
        .collect();

    messages.sort_by_key(|m| {
        RULE_MESSAGES
            .iter()
            .position(|rule| rule == m)
            .unwrap_or(RULE_MESSAGES.len())
    });
    messages.dedup();
    messages
}

/// Parse a date in its canonical zero-padded form only, so a stored date
/// always reads back exactly as it was sent
fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .filter(|date| date.format(DATE_FORMAT).to_string() == value)
}

fn validate_published_date(value: &str) -> Result<(), ValidationError> {
    if parse_date(value).is_some() {
        return Ok(());
    }
    let mut error = ValidationError::new("published_date");
    error.message = Some(Cow::Borrowed(MSG_PUBLISHED_DATE));
    Err(error)
}

/// Deserialize a field, treating a value of the wrong type as missing
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}
