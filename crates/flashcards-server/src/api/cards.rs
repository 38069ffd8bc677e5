// ABOUTME: Card CRUD against the store, scoped to (card id, owner, folder).
// ABOUTME: A card in another folder answers exactly like a card that does not exist.

use axum::http::StatusCode;
use flashcards_core::{CardInput, RowId};
use flashcards_store::{CardInsert, Store};

use super::ApiResponse;
use super::handler::{EntityHandler, EntityRequest};

pub struct CardHandler {
    store: Store,
}

impl CardHandler {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

/// Folder scope and required card id for PUT and DELETE.
fn scoped_card_id(req: &EntityRequest) -> Result<(RowId, RowId), ApiResponse> {
    let folder_id = req.folder_scope()?;
    let card_id = req
        .path_id("cards")?
        .ok_or_else(|| ApiResponse::error(StatusCode::BAD_REQUEST, "Card ID must be provided"))?;
    Ok((folder_id, card_id))
}

impl EntityHandler for CardHandler {
    fn handle_get(&self, req: &EntityRequest) -> ApiResponse {
        let folder_id = match req.folder_scope() {
            Ok(id) => id,
            Err(resp) => return resp,
        };
        let card_id = match req.path_id("cards") {
            Ok(id) => id,
            Err(resp) => return resp,
        };

        match card_id {
            Some(id) => match self.store.card(id, req.owner, folder_id) {
                Some(card) => ApiResponse::data(card),
                None => ApiResponse::error(
                    StatusCode::NOT_FOUND,
                    "Card not found in the specified folder",
                ),
            },
            None => match self.store.cards(req.owner, folder_id) {
                Some(cards) => ApiResponse::data(cards),
                None => ApiResponse::internal(),
            },
        }
    }

    fn handle_post(&self, req: &EntityRequest) -> ApiResponse {
        let folder_id = match req.folder_scope() {
            Ok(id) => id,
            Err(resp) => return resp,
        };
        let input = match CardInput::parse(&req.body) {
            Ok(input) => input,
            Err(e) => return e.into(),
        };

        match self
            .store
            .insert_card(req.owner, folder_id, &input.term, &input.translation)
        {
            CardInsert::Created(card) => ApiResponse::data(card),
            CardInsert::FolderNotFound => {
                ApiResponse::error(StatusCode::NOT_FOUND, "Folder not found")
            }
            CardInsert::Failed => ApiResponse::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create card in the specified folder",
            ),
        }
    }

    fn handle_put(&self, req: &EntityRequest) -> ApiResponse {
        let (folder_id, card_id) = match scoped_card_id(req) {
            Ok(ids) => ids,
            Err(resp) => return resp,
        };
        let input = match CardInput::parse(&req.body) {
            Ok(input) => input,
            Err(e) => return e.into(),
        };

        if self.store.update_card(
            card_id,
            req.owner,
            folder_id,
            &input.term,
            &input.translation,
        ) {
            ApiResponse::message(format!("Card updated with ID: {card_id}"))
        } else {
            ApiResponse::error(
                StatusCode::NOT_FOUND,
                format!("Card with ID: {card_id} not found in folder"),
            )
        }
    }

    fn handle_delete(&self, req: &EntityRequest) -> ApiResponse {
        let (folder_id, card_id) = match scoped_card_id(req) {
            Ok(ids) => ids,
            Err(resp) => return resp,
        };

        if self.store.delete_card(card_id, req.owner, folder_id) {
            ApiResponse::message("Card deleted successfully from folder")
        } else {
            ApiResponse::error(StatusCode::NOT_FOUND, "Card or folder not found")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use flashcards_core::input::MAX_TERM_LEN;
    use serde_json::json;

    const ALICE: RowId = 1;
    const BOB: RowId = 2;

    fn request(uri: &str, owner: RowId, body: serde_json::Value) -> EntityRequest {
        EntityRequest {
            uri: uri.parse().unwrap(),
            body: Bytes::from(body.to_string()),
            owner,
        }
    }

    fn setup() -> (Store, CardHandler, RowId) {
        let store = Store::open_in_memory().unwrap();
        let folder = store.insert_folder(ALICE, "Verbs").unwrap();
        (store.clone(), CardHandler::new(store), folder.id)
    }

    fn create(handler: &CardHandler, folder_id: RowId) -> RowId {
        let resp = handler.handle_post(&request(
            &format!("/cards?folderId={folder_id}"),
            ALICE,
            json!({ "term": "gehen", "translation": "to go" }),
        ));
        assert_eq!(resp.status, StatusCode::OK);
        resp.body["data"]["id"].as_i64().unwrap()
    }

    #[test]
    fn missing_folder_id_is_400_for_every_verb() {
        let (_, handler, _) = setup();
        let req = request("/cards/1", ALICE, json!({ "term": "a", "translation": "b" }));

        assert_eq!(handler.handle_get(&req).status, StatusCode::BAD_REQUEST);
        assert_eq!(handler.handle_post(&req).status, StatusCode::BAD_REQUEST);
        assert_eq!(handler.handle_put(&req).status, StatusCode::BAD_REQUEST);
        assert_eq!(handler.handle_delete(&req).status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn created_card_is_readable_in_its_folder() {
        let (_, handler, folder_id) = setup();
        let id = create(&handler, folder_id);

        let resp = handler.handle_get(&request(
            &format!("/cards/{id}?folderId={folder_id}"),
            ALICE,
            json!(null),
        ));
        assert_eq!(
            resp.body["data"],
            json!({ "id": id, "folderId": folder_id, "term": "gehen", "translation": "to go" })
        );

        let list = handler.handle_get(&request(
            &format!("/cards?folderId={folder_id}"),
            ALICE,
            json!(null),
        ));
        assert_eq!(list.body["data"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn other_owner_gets_not_found() {
        let (_, handler, folder_id) = setup();
        let id = create(&handler, folder_id);

        let resp = handler.handle_get(&request(
            &format!("/cards/{id}?folderId={folder_id}"),
            BOB,
            json!(null),
        ));
        assert_eq!(resp.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn wrong_folder_behaves_like_missing_card() {
        let (store, handler, folder_id) = setup();
        let other = store.insert_folder(ALICE, "Nouns").unwrap().id;
        let id = create(&handler, folder_id);
        let uri = format!("/cards/{id}?folderId={other}");
        let body = json!({ "term": "x", "translation": "y" });

        let missing_uri = format!("/cards/9999?folderId={folder_id}");
        let put_wrong = handler.handle_put(&request(&uri, ALICE, body.clone()));
        let put_missing = handler.handle_put(&request(&missing_uri, ALICE, body));
        assert_eq!(put_wrong.status, StatusCode::NOT_FOUND);
        assert_eq!(put_missing.status, StatusCode::NOT_FOUND);

        let delete = handler.handle_delete(&request(&uri, ALICE, json!(null)));
        assert_eq!(delete.status, StatusCode::NOT_FOUND);
        assert!(store.card(id, ALICE, folder_id).is_some());
    }

    #[test]
    fn post_into_foreign_folder_is_404() {
        let (store, handler, folder_id) = setup();
        let resp = handler.handle_post(&request(
            &format!("/cards?folderId={folder_id}"),
            BOB,
            json!({ "term": "a", "translation": "b" }),
        ));
        assert_eq!(resp.status, StatusCode::NOT_FOUND);
        assert_eq!(store.card_count(), Some(0));
    }

    #[test]
    fn oversized_term_writes_nothing() {
        let (store, handler, folder_id) = setup();
        let resp = handler.handle_post(&request(
            &format!("/cards?folderId={folder_id}"),
            ALICE,
            json!({ "term": "t".repeat(MAX_TERM_LEN + 1), "translation": "b" }),
        ));
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert_eq!(store.card_count(), Some(0));
    }

    #[test]
    fn update_then_delete() {
        let (store, handler, folder_id) = setup();
        let id = create(&handler, folder_id);
        let uri = format!("/cards/{id}?folderId={folder_id}");

        let put = handler.handle_put(&request(
            &uri,
            ALICE,
            json!({ "term": "laufen", "translation": "to run" }),
        ));
        assert_eq!(put.status, StatusCode::OK);
        assert_eq!(store.card(id, ALICE, folder_id).unwrap().term, "laufen");

        let delete = handler.handle_delete(&request(&uri, ALICE, json!(null)));
        assert_eq!(delete.status, StatusCode::OK);
        assert!(store.card(id, ALICE, folder_id).is_none());
    }
}
