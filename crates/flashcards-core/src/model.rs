// ABOUTME: Defines the persisted entities: users, sessions, folders, and cards.
// ABOUTME: Every folder and card carries its owner id, which scopes all access to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Row identifier generated by the store on insert.
pub type RowId = i64;

/// An account. Either `username` (password signup) or `external_id`
/// (third-party sign-in) identifies the user; the id never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: RowId,
    pub username: Option<String>,
    pub external_id: Option<String>,
    pub display_name: Option<String>,
    pub password_hash: Option<String>,
}

/// A pair of bearer credentials bound to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: RowId,
    pub access_expires: DateTime<Utc>,
    pub refresh_expires: DateTime<Utc>,
}

impl Session {
    /// True once the access token may no longer authorize requests.
    pub fn access_expired(&self, now: DateTime<Utc>) -> bool {
        self.access_expires <= now
    }

    /// True once the refresh token may no longer mint new tokens.
    pub fn refresh_expired(&self, now: DateTime<Utc>) -> bool {
        self.refresh_expires <= now
    }

    /// The client-facing view of this session.
    pub fn tokens(&self) -> SessionTokens {
        SessionTokens {
            access_token: self.access_token.clone(),
            access_token_expires: self.access_expires,
            refresh_token: self.refresh_token.clone(),
            refresh_token_expires: self.refresh_expires,
        }
    }
}

/// Session credentials as returned by signup, signin, and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokens {
    pub access_token: String,
    pub access_token_expires: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires: DateTime<Utc>,
}

/// A named group of cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: RowId,
    #[serde(skip)]
    pub owner_id: RowId,
    pub name: String,
}

/// A term and its translation, living in exactly one folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: RowId,
    #[serde(skip)]
    pub owner_id: RowId,
    pub folder_id: RowId,
    pub term: String,
    pub translation: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session_expiring(access: DateTime<Utc>, refresh: DateTime<Utc>) -> Session {
        Session {
            access_token: "a".repeat(64),
            refresh_token: "r".repeat(64),
            user_id: 7,
            access_expires: access,
            refresh_expires: refresh,
        }
    }

    #[test]
    fn session_expiry_is_inclusive_of_now() {
        let now = Utc::now();
        let session = session_expiring(now, now + Duration::days(30));

        assert!(session.access_expired(now));
        assert!(!session.refresh_expired(now));
        assert!(session.refresh_expired(now + Duration::days(31)));
    }

    #[test]
    fn card_serializes_without_owner() {
        let card = Card {
            id: 3,
            owner_id: 42,
            folder_id: 9,
            term: "hund".to_string(),
            translation: "dog".to_string(),
        };

        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["folderId"], 9);
        assert_eq!(json["term"], "hund");
        assert_eq!(json["translation"], "dog");
        assert!(json.get("ownerId").is_none());
        assert!(json.get("owner_id").is_none());
    }

    #[test]
    fn session_tokens_use_camel_case_keys() {
        let now = Utc::now();
        let tokens = session_expiring(now, now).tokens();
        let json = serde_json::to_value(&tokens).unwrap();

        assert!(json["accessToken"].is_string());
        assert!(json["accessTokenExpires"].is_string());
        assert!(json["refreshToken"].is_string());
        assert!(json["refreshTokenExpires"].is_string());
    }
}
