// ABOUTME: The entity handler seam: one trait with a method per HTTP verb, selected from the request path.
// ABOUTME: Also holds the per-request input (path, query, body, owner) and the path/query id parsing.

use axum::body::Bytes;
use axum::extract::Query;
use axum::http::{Method, StatusCode, Uri};
use flashcards_core::RowId;
use flashcards_store::Store;
use serde::Deserialize;

use super::ApiResponse;
use super::cards::CardHandler;
use super::folders::FolderHandler;

/// Everything an entity handler sees of one authenticated request.
#[derive(Debug, Clone)]
pub struct EntityRequest {
    pub uri: Uri,
    pub body: Bytes,
    pub owner: RowId,
}

#[derive(Debug, Deserialize)]
struct FolderScopeQuery {
    #[serde(rename = "folderId")]
    folder_id: Option<String>,
}

impl EntityRequest {
    /// The id in the path segment following `segment`, e.g. `7` in
    /// `/cards/7` for `"cards"`. `Ok(None)` when there is no such segment;
    /// 400 when it is present but not an integer.
    pub fn path_id(&self, segment: &str) -> Result<Option<RowId>, ApiResponse> {
        let mut parts = self.uri.path().split('/');
        if !parts.any(|part| part == segment) {
            return Ok(None);
        }
        match parts.next() {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse::<RowId>().map(Some).map_err(|_| {
                ApiResponse::error(StatusCode::BAD_REQUEST, format!("Invalid {segment} id: {raw}"))
            }),
        }
    }

    /// The folder a card operation is scoped to: the `folderId` query
    /// parameter, or the id after `/folders/` in the path. Absence is a 400.
    pub fn folder_scope(&self) -> Result<RowId, ApiResponse> {
        let from_query = Query::<FolderScopeQuery>::try_from_uri(&self.uri)
            .ok()
            .and_then(|Query(q)| q.folder_id);

        match from_query {
            Some(raw) => raw.parse::<RowId>().map_err(|_| {
                ApiResponse::error(StatusCode::BAD_REQUEST, format!("Invalid folder id: {raw}"))
            }),
            None => self.path_id("folders")?.ok_or_else(|| {
                ApiResponse::error(
                    StatusCode::BAD_REQUEST,
                    "Folder ID must be provided for card operations",
                )
            }),
        }
    }
}

/// CRUD for one kind of entity. Implementations hold nothing but a store
/// handle and are built fresh for every request.
pub trait EntityHandler: Send {
    fn handle_get(&self, req: &EntityRequest) -> ApiResponse;
    fn handle_post(&self, req: &EntityRequest) -> ApiResponse;
    fn handle_put(&self, req: &EntityRequest) -> ApiResponse;
    fn handle_delete(&self, req: &EntityRequest) -> ApiResponse;
}

/// Route `req` to the method of `handler` matching the HTTP verb.
pub fn handle(handler: &dyn EntityHandler, method: &Method, req: &EntityRequest) -> ApiResponse {
    match *method {
        Method::GET => handler.handle_get(req),
        Method::POST => handler.handle_post(req),
        Method::PUT => handler.handle_put(req),
        Method::DELETE => handler.handle_delete(req),
        _ => ApiResponse::error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
    }
}

/// Which entity a request path addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Card,
    Folder,
}

impl EntityKind {
    /// Classify by substring. `cards` wins, so `/folders/3/cards` is a card
    /// request scoped to folder 3.
    pub fn from_path(path: &str) -> Option<Self> {
        if path.contains("cards") {
            Some(Self::Card)
        } else if path.contains("folders") {
            Some(Self::Folder)
        } else {
            None
        }
    }

    pub fn handler(self, store: Store) -> Box<dyn EntityHandler> {
        match self {
            Self::Card => Box::new(CardHandler::new(store)),
            Self::Folder => Box::new(FolderHandler::new(store)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str) -> EntityRequest {
        EntityRequest {
            uri: uri.parse().unwrap(),
            body: Bytes::new(),
            owner: 1,
        }
    }

    #[test]
    fn classifies_paths_by_entity() {
        assert_eq!(EntityKind::from_path("/cards"), Some(EntityKind::Card));
        assert_eq!(EntityKind::from_path("/cards/4"), Some(EntityKind::Card));
        assert_eq!(EntityKind::from_path("/folders/2"), Some(EntityKind::Folder));
        assert_eq!(EntityKind::from_path("/folders/2/cards"), Some(EntityKind::Card));
        assert_eq!(EntityKind::from_path("/decks"), None);
    }

    #[test]
    fn path_id_reads_following_segment() {
        assert_eq!(request("/cards/42").path_id("cards").unwrap(), Some(42));
        assert_eq!(request("/cards").path_id("cards").unwrap(), None);
        assert_eq!(request("/cards/").path_id("cards").unwrap(), None);
        assert_eq!(request("/folders/3/cards/9").path_id("cards").unwrap(), Some(9));
    }

    #[test]
    fn non_numeric_path_id_is_400() {
        let err = request("/folders/abc").path_id("folders").unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn folder_scope_prefers_query_then_path() {
        assert_eq!(request("/cards?folderId=5").folder_scope().unwrap(), 5);
        assert_eq!(request("/folders/6/cards").folder_scope().unwrap(), 6);
        assert_eq!(
            request("/folders/6/cards?folderId=7").folder_scope().unwrap(),
            7
        );
    }

    #[test]
    fn missing_or_bad_folder_scope_is_400() {
        assert_eq!(
            request("/cards").folder_scope().unwrap_err().status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            request("/cards?folderId=x").folder_scope().unwrap_err().status,
            StatusCode::BAD_REQUEST
        );
    }

    struct Echo;

    impl EntityHandler for Echo {
        fn handle_get(&self, _: &EntityRequest) -> ApiResponse {
            ApiResponse::message("get")
        }
        fn handle_post(&self, _: &EntityRequest) -> ApiResponse {
            ApiResponse::message("post")
        }
        fn handle_put(&self, _: &EntityRequest) -> ApiResponse {
            ApiResponse::message("put")
        }
        fn handle_delete(&self, _: &EntityRequest) -> ApiResponse {
            ApiResponse::message("delete")
        }
    }

    #[test]
    fn unsupported_method_is_405() {
        let req = request("/folders");
        assert_eq!(handle(&Echo, &Method::PUT, &req).body["data"]["message"], "put");
        assert_eq!(
            handle(&Echo, &Method::PATCH, &req).status,
            StatusCode::METHOD_NOT_ALLOWED
        );
    }
}
