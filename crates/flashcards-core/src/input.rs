// ABOUTME: Request payloads for signup, signin, folders, and cards, with their length limits.
// ABOUTME: Parsing a payload validates it; nothing reaches the store without passing here first.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub const MAX_USERNAME_LEN: usize = 30;
pub const MAX_PASSWORD_LEN: usize = 30;
pub const MAX_FOLDER_NAME_LEN: usize = 30;
pub const MAX_TERM_LEN: usize = 30;
pub const MAX_TRANSLATION_LEN: usize = 30;

/// Reasons a request payload is rejected before any storage access.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// Username and password as posted to `/signup` and `/signin`.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Body of `POST /google_signin`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSignIn {
    pub id_token: String,
}

/// Body of folder create and rename.
#[derive(Debug, Clone, Deserialize)]
pub struct FolderInput {
    pub name: String,
}

/// Body of card create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct CardInput {
    pub term: String,
    pub translation: String,
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ValidationError> {
    serde_json::from_slice(body).map_err(|e| ValidationError::MalformedBody(e.to_string()))
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

impl Credentials {
    pub fn parse(body: &[u8]) -> Result<Self, ValidationError> {
        let creds: Self = decode(body)?;
        check_len("username", &creds.username, MAX_USERNAME_LEN)?;
        check_len("password", &creds.password, MAX_PASSWORD_LEN)?;
        Ok(creds)
    }
}

impl ExternalSignIn {
    pub fn parse(body: &[u8]) -> Result<Self, ValidationError> {
        decode(body)
    }
}

impl FolderInput {
    pub fn parse(body: &[u8]) -> Result<Self, ValidationError> {
        let input: Self = decode(body)?;
        check_len("name", &input.name, MAX_FOLDER_NAME_LEN)?;
        Ok(input)
    }
}

impl CardInput {
    pub fn parse(body: &[u8]) -> Result<Self, ValidationError> {
        let input: Self = decode(body)?;
        check_len("term", &input.term, MAX_TERM_LEN)?;
        check_len("translation", &input.translation, MAX_TRANSLATION_LEN)?;
        Ok(input)
    }
}
