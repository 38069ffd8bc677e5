// ABOUTME: Router assembly and the request dispatcher for the flashcards API.
// ABOUTME: Auth routes, logout, and entity CRUD all flow through one dispatch handler.

use std::any::Any;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::header::{CONTENT_TYPE, SERVER};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::api::handler::{EntityKind, EntityRequest, handle};
use crate::api::{self, ApiResponse};
use crate::app_state::SharedState;
use crate::auth::{AuthLayer, AuthRoute, Caller};

/// Largest request body read into memory.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build the complete Axum router with shared state.
pub fn create_router(state: SharedState) -> Router {
    let router = Router::new()
        .route("/", any(dispatch))
        .route("/{*path}", any(dispatch))
        .layer(AuthLayer::new(state.auth.clone()))
        .with_state(state);
    with_response_layers(router)
}

/// Layers every response passes through: panics become the 500 envelope,
/// then the `Server` header and request tracing.
pub fn with_response_layers(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(SetResponseHeaderLayer::overriding(
            SERVER,
            HeaderValue::from_static("flashcards"),
        ))
        .layer(TraceLayer::new_for_http())
}

async fn dispatch(State(state): State<SharedState>, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let body: Bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(error = %e, "request body rejected");
            return ApiResponse::error(StatusCode::BAD_REQUEST, "Request body could not be read")
                .into_response();
        }
    };
    let path = parts.uri.path();

    if let Some(route) = AuthRoute::from_path(path) {
        return api::accounts::handle(&state, route, &parts.method, &parts.headers, body)
            .await
            .into_response();
    }

    let Some(caller) = parts.extensions.get::<Caller>().cloned() else {
        return ApiResponse::error(StatusCode::UNAUTHORIZED, "Token is not present in request")
            .into_response();
    };

    if path.starts_with("/logout") {
        return api::accounts::logout(&state, &parts.method, caller)
            .await
            .into_response();
    }

    let Some(kind) = EntityKind::from_path(path) else {
        return ApiResponse::error(StatusCode::NOT_FOUND, "Unknown resource").into_response();
    };

    let request = EntityRequest {
        uri: parts.uri.clone(),
        body,
        owner: caller.user_id,
    };
    let store = state.store.clone();
    let method = parts.method.clone();
    tracing::debug!(?kind, %method, owner = caller.user_id, "entity request");

    match api::blocking(move || handle(&*kind.handler(store), &method, &request)).await {
        Ok(resp) | Err(resp) => resp.into_response(),
    }
}

/// 500 envelope for a panic that escaped a handler.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> http::Response<String> {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "request handler panicked");

    let mut resp = http::Response::new(ApiResponse::internal().body.to_string());
    *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::AppState;
    use crate::session::TokenPolicy;
    use axum::body::Body;
    use flashcards_store::Store;
    use http::Request;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> SharedState {
        Arc::new(AppState::new(
            Store::open_in_memory().unwrap(),
            TokenPolicy::default(),
        ))
    }

    async fn json_body(resp: Response) -> Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn signup(app: &Router, username: &str) -> String {
        let resp = app
            .clone()
            .oneshot(
                Request::post("/signup")
                    .body(Body::from(
                        json!({ "username": username, "password": "pw" }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        json_body(resp).await["data"]["accessToken"]
            .as_str()
            .unwrap()
            .to_string()
    }

    fn authed(method: &str, uri: &str, token: &str, body: Body) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .body(body)
            .unwrap()
    }

    #[tokio::test]
    async fn responses_carry_server_header() {
        let app = create_router(test_state());
        let resp = app
            .oneshot(Request::get("/folders").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(resp.headers()[SERVER], "flashcards");
        let json = json_body(resp).await;
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Token is not present in request");
    }

    #[tokio::test]
    async fn unknown_entity_path_is_404() {
        let app = create_router(test_state());
        let token = signup(&app, "alice").await;

        let resp = app
            .oneshot(authed("GET", "/decks", &token, Body::empty()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn patch_is_405() {
        let app = create_router(test_state());
        let token = signup(&app, "alice").await;

        let resp = app
            .oneshot(authed("PATCH", "/folders/1", &token, Body::empty()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn creates_and_lists_folders() {
        let app = create_router(test_state());
        let token = signup(&app, "alice").await;

        let resp = app
            .clone()
            .oneshot(authed(
                "POST",
                "/folders",
                &token,
                Body::from(json!({ "name": "Verbs" }).to_string()),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .oneshot(authed("GET", "/folders", &token, Body::empty()))
            .await
            .unwrap();
        let json = json_body(resp).await;
        assert_eq!(json["data"][0]["name"], "Verbs");
    }

    #[tokio::test]
    async fn oversized_body_is_400() {
        let app = create_router(test_state());
        let token = signup(&app, "alice").await;

        let resp = app
            .oneshot(authed(
                "POST",
                "/folders",
                &token,
                Body::from(vec![b'x'; MAX_BODY_BYTES + 1]),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    async fn failing_handler() -> &'static str {
        panic!("handler failed")
    }

    #[tokio::test]
    async fn panicking_handler_becomes_500_envelope() {
        let app = with_response_layers(Router::new().route("/boom", any(failing_handler)));

        let resp = app
            .oneshot(Request::get("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.headers()[SERVER], "flashcards");
        let json = json_body(resp).await;
        assert_eq!(json, json!({ "status": "error", "message": "Internal server error" }));
    }

    #[test]
    fn panic_response_is_500_envelope() {
        let resp = panic_response(Box::new("boom"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json: Value = serde_json::from_str(resp.body()).unwrap();
        assert_eq!(json["status"], "error");
    }
}
