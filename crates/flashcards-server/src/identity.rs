// ABOUTME: Third-party identity verification for Google sign-in.
// ABOUTME: The verifier is a trait so the server can run against Google or a stub in tests.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::session::ExternalIdentity;

const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("identity provider rejected the token (status {0})")]
    Rejected(u16),

    #[error("token was issued for a different client")]
    WrongAudience,
}

/// Turns an opaque id token into a verified identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<ExternalIdentity, IdentityError>;
}

/// Verifies Google id tokens with the `tokeninfo` endpoint.
pub struct GoogleVerifier {
    client: reqwest::Client,
    client_id: String,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    sub: String,
    name: Option<String>,
    email: Option<String>,
}

impl GoogleVerifier {
    pub fn new(client_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id,
            endpoint: GOOGLE_TOKENINFO_URL.to_string(),
        }
    }
}

#[async_trait]
impl IdentityVerifier for GoogleVerifier {
    async fn verify(&self, id_token: &str) -> Result<ExternalIdentity, IdentityError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("id_token", id_token)])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(IdentityError::Rejected(resp.status().as_u16()));
        }

        let info: TokenInfo = resp.json().await?;
        identity_from_token_info(info, &self.client_id)
    }
}

fn identity_from_token_info(
    info: TokenInfo,
    client_id: &str,
) -> Result<ExternalIdentity, IdentityError> {
    if info.aud != client_id {
        return Err(IdentityError::WrongAudience);
    }
    let name = info.name.or(info.email).unwrap_or_else(|| info.sub.clone());
    Ok(ExternalIdentity {
        subject: info.sub,
        name,
    })
}
