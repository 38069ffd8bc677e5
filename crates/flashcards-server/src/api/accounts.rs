// ABOUTME: Account routes: signup, signin, Google sign-in, refresh rotation, and logout.
// ABOUTME: Every route answers with the session envelope or a 401 carrying the failure reason.

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use flashcards_core::{Credentials, ExternalSignIn};

use super::{ApiResponse, blocking};
use crate::app_state::SharedState;
use crate::auth::{AuthRoute, Caller, bearer_token};

/// Run one of the unauthenticated account routes.
pub async fn handle(
    state: &SharedState,
    route: AuthRoute,
    method: &Method,
    headers: &HeaderMap,
    body: Bytes,
) -> ApiResponse {
    if *method != Method::POST {
        return ApiResponse::error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    }

    match route {
        AuthRoute::Signup => signup(state, &body).await,
        AuthRoute::Signin => signin(state, &body).await,
        AuthRoute::GoogleSignin => google_signin(state, &body).await,
        AuthRoute::RefreshToken => refresh_token(state, headers).await,
    }
}

async fn signup(state: &SharedState, body: &[u8]) -> ApiResponse {
    let creds = match Credentials::parse(body) {
        Ok(creds) => creds,
        Err(e) => return e.into(),
    };

    let auth = state.auth.clone();
    match blocking(move || auth.signup(&creds)).await {
        Ok(Ok(tokens)) => ApiResponse::data(tokens),
        Ok(Err(e)) => e.into(),
        Err(resp) => resp,
    }
}

async fn signin(state: &SharedState, body: &[u8]) -> ApiResponse {
    let creds = match Credentials::parse(body) {
        Ok(creds) => creds,
        Err(e) => return e.into(),
    };

    let auth = state.auth.clone();
    match blocking(move || auth.login(&creds)).await {
        Ok(Ok(tokens)) => ApiResponse::data(tokens),
        Ok(Err(e)) => e.into(),
        Err(resp) => resp,
    }
}

async fn google_signin(state: &SharedState, body: &[u8]) -> ApiResponse {
    let Some(verifier) = state.identity.clone() else {
        return ApiResponse::error(StatusCode::UNAUTHORIZED, "Google sign-in is not configured");
    };
    let sign_in = match ExternalSignIn::parse(body) {
        Ok(sign_in) => sign_in,
        Err(e) => return e.into(),
    };

    let identity = match verifier.verify(&sign_in.id_token).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::info!(error = %e, "google id token rejected");
            return ApiResponse::error(StatusCode::UNAUTHORIZED, "Invalid Google ID token");
        }
    };

    let auth = state.auth.clone();
    match blocking(move || auth.external_login(&identity)).await {
        Ok(Ok(tokens)) => ApiResponse::data(tokens),
        Ok(Err(e)) => e.into(),
        Err(resp) => resp,
    }
}

async fn refresh_token(state: &SharedState, headers: &HeaderMap) -> ApiResponse {
    let Some(token) = bearer_token(headers) else {
        return ApiResponse::error(StatusCode::UNAUTHORIZED, "Refresh token is missing");
    };

    let auth = state.auth.clone();
    match blocking(move || auth.refresh(&token)).await {
        Ok(Ok(tokens)) => ApiResponse::data(tokens),
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "refresh refused");
            e.into()
        }
        Err(resp) => resp,
    }
}

/// End the caller's session.
pub async fn logout(state: &SharedState, method: &Method, caller: Caller) -> ApiResponse {
    if *method != Method::POST {
        return ApiResponse::error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    }

    let auth = state.auth.clone();
    match blocking(move || auth.logout(&caller.access_token)).await {
        Ok(Ok(())) => ApiResponse::data("Logged out"),
        Ok(Err(e)) => e.into(),
        Err(resp) => resp,
    }
}
