// ABOUTME: Session-token authentication middleware for the flashcards API.
// ABOUTME: Auth routes pass straight through; everything else needs a live access token.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Request, Response, StatusCode};
use axum::response::IntoResponse;
use flashcards_core::RowId;
use tower::{Layer, Service};

use crate::api::ApiResponse;
use crate::session::{AuthError, AuthManager};

/// Routes that mint sessions and therefore cannot require one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRoute {
    Signup,
    Signin,
    GoogleSignin,
    RefreshToken,
}

impl AuthRoute {
    pub fn from_path(path: &str) -> Option<Self> {
        if path.starts_with("/signup") {
            Some(Self::Signup)
        } else if path.starts_with("/signin") {
            Some(Self::Signin)
        } else if path.starts_with("/google_signin") {
            Some(Self::GoogleSignin)
        } else if path.starts_with("/refresh_token") {
            Some(Self::RefreshToken)
        } else {
            None
        }
    }
}

/// The authenticated user behind a request, stored as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: RowId,
    pub access_token: String,
}

/// The token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// A tower Layer that resolves access tokens to a [`Caller`].
#[derive(Clone)]
pub struct AuthLayer {
    auth: AuthManager,
}

impl AuthLayer {
    pub fn new(auth: AuthManager) -> Self {
        Self { auth }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            auth: self.auth.clone(),
        }
    }
}

/// The middleware service that checks access tokens outside the auth routes.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    auth: AuthManager,
}

fn unauthorized(message: &str) -> Response<Body> {
    ApiResponse::error(StatusCode::UNAUTHORIZED, message).into_response()
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();

        if AuthRoute::from_path(req.uri().path()).is_some() {
            return Box::pin(async move { inner.call(req).await });
        }

        let Some(token) = bearer_token(req.headers()) else {
            tracing::debug!(path = req.uri().path(), "request without access token");
            return Box::pin(async move { Ok(unauthorized("Token is not present in request")) });
        };

        let auth = self.auth.clone();
        Box::pin(async move {
            let lookup = token.clone();
            let validated = tokio::task::spawn_blocking(move || auth.validate(&lookup)).await;

            match validated {
                Ok(Ok(user_id)) => {
                    req.extensions_mut().insert(Caller {
                        user_id,
                        access_token: token,
                    });
                    inner.call(req).await
                }
                Ok(Err(AuthError::Storage)) => Ok(ApiResponse::internal().into_response()),
                Ok(Err(e)) => {
                    tracing::debug!(error = %e, "access token rejected");
                    Ok(unauthorized("Authentication failed or token expired"))
                }
                Err(e) => {
                    tracing::error!(error = %e, "token validation task failed");
                    Ok(ApiResponse::internal().into_response())
                }
            }
        })
    }
}
