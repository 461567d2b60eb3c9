//! HTTP API consumed by the site's checkout view and admin dashboard.

pub mod admin;
pub mod checkout;

use std::sync::Arc;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};
use uuid::Uuid;
use atelier_core::Error;

use crate::context::ServerContext;

/// Header carrying the signed-in user's profile id.
pub const REQUESTER_HEADER: &str = "x-requester-id";

pub type AppState = Arc<ServerContext>;

pub fn router(ctx: AppState) -> Router {
    Router::new()
        .merge(checkout::routes())
        .merge(admin::routes())
        .with_state(ctx)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Requester id from `x-requester-id`, absent when the visitor is signed out.
#[derive(Debug, Clone, Copy)]
pub struct Requester(pub Option<Uuid>);

impl<S: Send + Sync> FromRequestParts<S> for Requester {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(REQUESTER_HEADER) else {
            return Ok(Requester(None));
        };
        let raw = value
            .to_str()
            .map_err(|_| Error::Parse(format!("{REQUESTER_HEADER} is not valid text")))?;
        let id = Uuid::parse_str(raw.trim()).map_err(Error::from)?;
        Ok(Requester(Some(id)))
    }
}

/// Maps the crate error onto an HTTP status and a JSON `{ "error": .. }` body.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, message) = if err.is_storage_unavailable() {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "The coupon service is unavailable right now. Please try again.".to_string(),
            )
        } else {
            match &err {
                Error::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
                Error::Parse(_) | Error::Uuid(_) | Error::Json(_) => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                Error::DuplicateCode(_) => (StatusCode::CONFLICT, err.to_string()),
                Error::Forbidden(_) => (StatusCode::FORBIDDEN, err.to_string()),
                Error::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string()),
            }
        };

        if status.is_server_error() {
            error!("request failed: {}", err);
        } else {
            debug!("request rejected ({}): {}", status, err);
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;
    use atelier_core::repositories::{InMemoryCouponRepository, InMemoryProfileRepository};
    use atelier_core::AppConfig;

    use crate::context::ServerContext;

    pub struct Harness {
        pub app: Router,
        pub coupons: InMemoryCouponRepository,
        pub profiles: InMemoryProfileRepository,
    }

    pub fn harness() -> Harness {
        let coupons = InMemoryCouponRepository::new();
        let profiles = InMemoryProfileRepository::new();
        let config = AppConfig::from_lookup(|_| None).expect("memory config");
        let ctx = ServerContext::from_repositories(
            config,
            Arc::new(coupons.clone()),
            Arc::new(profiles.clone()),
        );
        Harness {
            app: super::router(Arc::new(ctx)),
            coupons,
            profiles,
        }
    }

    pub async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        requester: Option<String>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(id) = requester {
            req = req.header(super::REQUESTER_HEADER, id);
        }
        let req = match body {
            Some(v) => req
                .header("content-type", "application/json")
                .body(Body::from(v.to_string())),
            None => req.body(Body::empty()),
        }
        .expect("request");

        let resp = app.clone().oneshot(req).await.expect("response");
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }
}
