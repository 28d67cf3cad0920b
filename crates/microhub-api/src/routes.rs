use std::future::Future;
use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use microhub_core::remote::{FetchQuery, RemoteRequest, RemoteResponse};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::error::AppError;
use crate::rate_limit::{store_fingerprint, CredentialRateLimiter, RateLimitMetricsSnapshot};
use crate::store::StoreRegistry;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    stores: Arc<StoreRegistry>,
    credential_limiter: Arc<CredentialRateLimiter>,
}

impl AppState {
    pub async fn from_config(config: Arc<ApiConfig>) -> Result<Self, AppError> {
        let stores = StoreRegistry::open(config.data_file.clone()).await?;
        Ok(Self::with_registry(config, stores))
    }

    pub fn with_registry(config: Arc<ApiConfig>, stores: StoreRegistry) -> Self {
        Self {
            stores: Arc::new(stores),
            credential_limiter: Arc::new(CredentialRateLimiter::from_config(config.as_ref())),
            config,
        }
    }
}

/// `GET /` fetches a snapshot, `POST /` dispatches on the body's `action`.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(fetch_snapshot).post(dispatch_action))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
    stores: usize,
    rate_limit: RateLimitMetricsSnapshot,
}

async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp(),
        stores: state.stores.store_count().await,
        rate_limit: state.credential_limiter.metrics_snapshot(),
    })
}

async fn fetch_snapshot(
    State(state): State<AppState>,
    query: Result<Query<FetchQuery>, QueryRejection>,
) -> Result<Json<RemoteResponse>, AppError> {
    let Query(query) =
        query.map_err(|_| AppError::bad_request("storeId and authKey are required"))?;
    let store_id = required_store_id(&query.store_id)?;
    tracing::debug!(store = store_fingerprint(store_id), "Serving snapshot");
    let response = with_credentials(&state, store_id, state.stores.fetch(store_id, &query.auth_key))
        .await?;
    Ok(Json(response))
}

/// The body is parsed as JSON whatever its content type; form-less clients
/// post `text/plain` to avoid CORS preflights.
async fn dispatch_action(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<RemoteResponse>, AppError> {
    let request: RemoteRequest = serde_json::from_str(&body)
        .map_err(|error| AppError::bad_request(format!("unrecognized request: {error}")))?;
    let store_id = required_store_id(request.store_id())?.to_string();
    tracing::debug!(
        action = request.action(),
        store = store_fingerprint(&store_id),
        "Handling remote action"
    );

    let stores = &state.stores;
    let response = match request {
        RemoteRequest::CheckStatus { .. } => stores.check_status(&store_id).await,
        RemoteRequest::SetupNewUser { user_name, .. } => {
            stores.setup_new_user(&store_id, &user_name).await?
        }
        RemoteRequest::Login { auth_key, .. } => {
            with_credentials(&state, &store_id, stores.login(&store_id, &auth_key)).await?
        }
        RemoteRequest::WipeAndReset { user_name, .. } => {
            stores
                .wipe_and_reset(&store_id, user_name.as_deref())
                .await?
        }
        RemoteRequest::SyncPush { auth_key, data, .. } => {
            with_credentials(&state, &store_id, stores.push(&store_id, &auth_key, data)).await?
        }
    };
    Ok(Json(response))
}

/// Run a key-checked store call behind the per-store credential limiter.
async fn with_credentials<T>(
    state: &AppState,
    store_id: &str,
    call: impl Future<Output = Result<T, AppError>>,
) -> Result<T, AppError> {
    state.credential_limiter.check(store_id).await?;
    let result = call.await;
    if matches!(result, Err(AppError::Unauthorized(_))) {
        state.credential_limiter.record_rejection(store_id).await;
    }
    result
}

fn required_store_id(store_id: &str) -> Result<&str, AppError> {
    let trimmed = store_id.trim();
    if trimmed.is_empty() {
        Err(AppError::bad_request("storeId is required"))
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use microhub_core::remote::{ErrorCode, ResponseStatus};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    use super::*;

    fn router() -> Router {
        app_router(AppState::with_registry(
            Arc::new(ApiConfig::default()),
            StoreRegistry::in_memory(),
        ))
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, RemoteResponse) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_text(body: &str) -> Request<Body> {
        Request::post("/")
            .header("content-type", "text/plain;charset=utf-8")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn plain_text_bodies_are_parsed_as_json() {
        let (status, body) = send(
            router(),
            post_text(r#"{"action":"check_status","sheetId":"legacy-sheet"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, ResponseStatus::NewUser);
    }

    #[tokio::test]
    async fn unknown_action_is_invalid_request() {
        let (status, body) = send(router(), post_text(r#"{"action":"drop_tables","storeId":"s"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.status, ResponseStatus::Error);
        assert_eq!(body.code, Some(ErrorCode::InvalidRequest));
    }

    #[tokio::test]
    async fn blank_store_id_is_rejected() {
        let (status, body) = send(router(), post_text(r#"{"action":"check_status","storeId":" "}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, Some(ErrorCode::InvalidRequest));
    }

    #[tokio::test]
    async fn fetch_without_query_is_invalid_request() {
        let request = Request::get("/").body(Body::empty()).unwrap();
        let (status, body) = send(router(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, Some(ErrorCode::InvalidRequest));
    }

    #[tokio::test]
    async fn fetch_with_unknown_store_is_unauthorized() {
        let request = Request::get("/?storeId=missing&authKey=123456")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(router(), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.code, Some(ErrorCode::Unauthorized));
        assert_eq!(body.message.as_deref(), Some("Invalid Credentials"));
    }

    #[tokio::test]
    async fn repeated_fetch_guesses_are_rate_limited() {
        let stores = StoreRegistry::in_memory();
        let key = stores
            .setup_new_user("sheet", "Alex")
            .await
            .unwrap()
            .raw_key
            .unwrap();
        let config = ApiConfig {
            login_rate_limit_per_window: 3,
            ..ApiConfig::default()
        };
        let router = app_router(AppState::with_registry(Arc::new(config), stores));
        let fetch = |auth_key: &str| {
            Request::get(format!("/?storeId=sheet&authKey={auth_key}"))
                .body(Body::empty())
                .unwrap()
        };

        let guesses = (0..10)
            .map(|n| format!("{n:06}"))
            .filter(|guess| *guess != key)
            .take(3);
        for guess in guesses {
            let (status, _) = send(router.clone(), fetch(&guess)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }

        let (status, body) = send(router.clone(), fetch(&key)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body.code, Some(ErrorCode::RateLimited));
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let response = router()
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["stores"], 0);
    }
}
