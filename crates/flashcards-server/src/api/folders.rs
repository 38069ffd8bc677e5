// ABOUTME: Folder CRUD against the store, scoped to the authenticated owner.
// ABOUTME: Deleting a folder takes its cards with it in the same transaction.

use axum::http::StatusCode;
use flashcards_core::FolderInput;
use flashcards_store::Store;

use super::ApiResponse;
use super::handler::{EntityHandler, EntityRequest};

pub struct FolderHandler {
    store: Store,
}

impl FolderHandler {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

fn folder_not_found() -> ApiResponse {
    ApiResponse::error(StatusCode::NOT_FOUND, "Folder not found")
}

impl EntityHandler for FolderHandler {
    fn handle_get(&self, req: &EntityRequest) -> ApiResponse {
        let folder_id = match req.path_id("folders") {
            Ok(id) => id,
            Err(resp) => return resp,
        };

        match folder_id {
            Some(id) => match self.store.folder(id, req.owner) {
                Some(folder) => ApiResponse::data(folder),
                None => folder_not_found(),
            },
            None => match self.store.folders(req.owner) {
                Some(folders) => ApiResponse::data(folders),
                None => ApiResponse::internal(),
            },
        }
    }

    fn handle_post(&self, req: &EntityRequest) -> ApiResponse {
        let input = match FolderInput::parse(&req.body) {
            Ok(input) => input,
            Err(e) => return e.into(),
        };

        match self.store.insert_folder(req.owner, &input.name) {
            Some(folder) => ApiResponse::data(folder),
            None => ApiResponse::error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create folder"),
        }
    }

    fn handle_put(&self, req: &EntityRequest) -> ApiResponse {
        let folder_id = match req.path_id("folders") {
            Ok(Some(id)) => id,
            Ok(None) => return ApiResponse::error(StatusCode::BAD_REQUEST, "Invalid folder ID"),
            Err(resp) => return resp,
        };
        let input = match FolderInput::parse(&req.body) {
            Ok(input) => input,
            Err(e) => return e.into(),
        };

        if self.store.rename_folder(folder_id, req.owner, &input.name) {
            ApiResponse::message("Folder updated successfully")
        } else {
            folder_not_found()
        }
    }

    fn handle_delete(&self, req: &EntityRequest) -> ApiResponse {
        let folder_id = match req.path_id("folders") {
            Ok(Some(id)) => id,
            Ok(None) => return ApiResponse::error(StatusCode::BAD_REQUEST, "Invalid folder ID"),
            Err(resp) => return resp,
        };

        if self.store.delete_folder(folder_id, req.owner) {
            ApiResponse::message("Folder deleted successfully")
        } else {
            folder_not_found()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use flashcards_core::input::MAX_FOLDER_NAME_LEN;
    use serde_json::json;

    fn request(uri: &str, owner: i64, body: serde_json::Value) -> EntityRequest {
        EntityRequest {
            uri: uri.parse().unwrap(),
            body: Bytes::from(body.to_string()),
            owner,
        }
    }

    #[test]
    fn post_then_get_returns_folder() {
        let store = Store::open_in_memory().unwrap();
        let handler = FolderHandler::new(store);

        let created = handler.handle_post(&request("/folders", 1, json!({ "name": "Verbs" })));
        assert_eq!(created.status, StatusCode::OK);
        let id = created.body["data"]["id"].as_i64().unwrap();
        assert_eq!(created.body["data"]["name"], "Verbs");

        let fetched = handler.handle_get(&request(&format!("/folders/{id}"), 1, json!(null)));
        assert_eq!(fetched.body["data"], json!({ "id": id, "name": "Verbs" }));

        let listed = handler.handle_get(&request("/folders", 1, json!(null)));
        assert_eq!(listed.body["data"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn empty_list_is_success() {
        let handler = FolderHandler::new(Store::open_in_memory().unwrap());
        let listed = handler.handle_get(&request("/folders", 1, json!(null)));
        assert_eq!(listed.status, StatusCode::OK);
        assert_eq!(listed.body["data"], json!([]));
    }

    #[test]
    fn oversized_name_is_rejected_without_a_write() {
        let store = Store::open_in_memory().unwrap();
        let handler = FolderHandler::new(store.clone());

        let name = "n".repeat(MAX_FOLDER_NAME_LEN + 1);
        let resp = handler.handle_post(&request("/folders", 1, json!({ "name": name })));

        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert!(store.folders(1).unwrap().is_empty());
    }

    #[test]
    fn other_owner_sees_not_found() {
        let store = Store::open_in_memory().unwrap();
        let folder = store.insert_folder(1, "Verbs").unwrap();
        let handler = FolderHandler::new(store);
        let uri = format!("/folders/{}", folder.id);

        let get = handler.handle_get(&request(&uri, 2, json!(null)));
        let put = handler.handle_put(&request(&uri, 2, json!({ "name": "Mine" })));
        let delete = handler.handle_delete(&request(&uri, 2, json!(null)));

        assert_eq!(get.status, StatusCode::NOT_FOUND);
        assert_eq!(put.status, StatusCode::NOT_FOUND);
        assert_eq!(delete.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn put_and_delete_need_an_id() {
        let handler = FolderHandler::new(Store::open_in_memory().unwrap());
        let put = handler.handle_put(&request("/folders", 1, json!({ "name": "x" })));
        let delete = handler.handle_delete(&request("/folders", 1, json!(null)));
        assert_eq!(put.status, StatusCode::BAD_REQUEST);
        assert_eq!(delete.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn malformed_body_is_400() {
        let store = Store::open_in_memory().unwrap();
        let folder = store.insert_folder(1, "Verbs").unwrap();
        let handler = FolderHandler::new(store);

        let req = EntityRequest {
            uri: format!("/folders/{}", folder.id).parse().unwrap(),
            body: Bytes::from_static(b"{\"name\":"),
            owner: 1,
        };
        assert_eq!(handler.handle_put(&req).status, StatusCode::BAD_REQUEST);
    }
}
