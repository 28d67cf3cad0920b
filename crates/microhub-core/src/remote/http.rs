//! reqwest implementation of [`RemoteEndpoint`].

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::Deserialize;

use super::wire::{FetchQuery, RemoteRequest, RemoteResponse, ResponseStatus, Snapshot};
use super::{MintedKey, RemoteEndpoint, RemoteError, RemoteResult, StoreStatus};
use crate::models::{Connection, StoreTarget};
use crate::util::compact_text;

#[derive(Clone)]
pub struct HttpRemoteClient {
    client: reqwest::Client,
}

impl HttpRemoteClient {
    /// Every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> RemoteResult<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    async fn post(&self, endpoint_url: &str, request: &RemoteRequest) -> RemoteResult<RemoteResponse> {
        tracing::debug!(action = request.action(), "Calling remote endpoint");
        let response = self
            .client
            .post(endpoint_url)
            .header(ACCEPT, "application/json")
            .json(request)
            .send()
            .await?;
        read_envelope(response).await
    }

    async fn get(&self, endpoint_url: &str, query: &FetchQuery) -> RemoteResult<RemoteResponse> {
        tracing::debug!(action = "fetch", "Calling remote endpoint");
        let response = self
            .client
            .get(endpoint_url)
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;
        read_envelope(response).await
    }
}

impl RemoteEndpoint for HttpRemoteClient {
    async fn check_status(&self, target: &StoreTarget) -> RemoteResult<StoreStatus> {
        let request = RemoteRequest::CheckStatus {
            store_id: target.store_id().to_string(),
        };
        let response = self.post(target.endpoint_url(), &request).await?;
        match response.status {
            ResponseStatus::NewUser => Ok(StoreStatus::NewUser),
            ResponseStatus::ReturningUser => Ok(StoreStatus::ReturningUser {
                user_name: response.user_name,
            }),
            other => Err(RemoteError::InvalidPayload(format!(
                "unexpected check_status response: {other:?}"
            ))),
        }
    }

    async fn setup_new_user(&self, target: &StoreTarget, user_name: &str) -> RemoteResult<MintedKey> {
        let request = RemoteRequest::SetupNewUser {
            store_id: target.store_id().to_string(),
            user_name: user_name.to_string(),
        };
        let response = self.post(target.endpoint_url(), &request).await?;
        MintedKey::new(response.raw_key.unwrap_or_default())
    }

    async fn login(&self, target: &StoreTarget, access_key: &str) -> RemoteResult<()> {
        let request = RemoteRequest::Login {
            store_id: target.store_id().to_string(),
            auth_key: access_key.to_string(),
        };
        self.post(target.endpoint_url(), &request).await?;
        Ok(())
    }

    async fn wipe_and_reset(
        &self,
        target: &StoreTarget,
        user_name: Option<&str>,
    ) -> RemoteResult<Option<MintedKey>> {
        let request = RemoteRequest::WipeAndReset {
            store_id: target.store_id().to_string(),
            user_name: user_name.map(str::to_string),
        };
        let response = self.post(target.endpoint_url(), &request).await?;
        response.raw_key.map(MintedKey::new).transpose()
    }

    async fn fetch_snapshot(&self, connection: &Connection) -> RemoteResult<Snapshot> {
        let query = FetchQuery {
            store_id: connection.store_id().to_string(),
            auth_key: connection.access_key().to_string(),
        };
        let response = self.get(connection.endpoint_url(), &query).await?;
        Ok(response.data.unwrap_or_default())
    }

    async fn push_snapshot(&self, connection: &Connection, data: &Snapshot) -> RemoteResult<()> {
        let request = RemoteRequest::SyncPush {
            store_id: connection.store_id().to_string(),
            auth_key: connection.access_key().to_string(),
            data: data.clone(),
        };
        self.post(connection.endpoint_url(), &request).await?;
        Ok(())
    }
}

async fn read_envelope(response: reqwest::Response) -> RemoteResult<RemoteResponse> {
    let status = response.status();
    let body = response.text().await?;
    decode_envelope(status, &body)
}

fn decode_envelope(status: StatusCode, body: &str) -> RemoteResult<RemoteResponse> {
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return Err(RemoteError::Unauthorized(parse_api_error(status, body)));
    }

    match serde_json::from_str::<RemoteResponse>(body) {
        Ok(envelope) if envelope.status == ResponseStatus::Error => Err(RemoteError::from_envelope(
            envelope.code,
            envelope
                .message
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
        )),
        Ok(envelope) if status.is_success() => Ok(envelope),
        Err(error) if status.is_success() => Err(RemoteError::InvalidPayload(format!(
            "{error}: {}",
            compact_text(body)
        ))),
        _ => Err(RemoteError::from_envelope(
            None,
            parse_api_error(status, body),
        )),
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}
