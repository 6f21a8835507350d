use crate::{
    config::WebhookConfig,
    handler::{HandleTransaction, WebhookContext},
};
use anyhow::{anyhow, bail, Result};
use axum::{
    body::to_bytes,
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::post,
    Router,
};
use chrono::Duration;
use corpbank_domain::{ApiKey, BearerToken, Transaction};
use http_body_util::LengthLimitError;
use std::{error::Error as StdError, fmt::Display, iter::once, sync::Arc};
use tokio::net::TcpListener;
use tower_http::{sensitive_headers::SetSensitiveRequestHeadersLayer, trace::TraceLayer};
use tracing::{error, info, warn};

const BEARER_SCHEME: &str = "bearer ";

const MISSING_HEADER_ERROR: (StatusCode, &str) =
    (StatusCode::UNAUTHORIZED, "Missing `Authorization` header.");
const MULTIPLE_HEADERS_ERROR: (StatusCode, &str) =
    (StatusCode::BAD_REQUEST, "Multiple `Authorization` header.");
const INVALID_HEADER_ERROR: (StatusCode, &str) =
    (StatusCode::BAD_REQUEST, "Invalid `Authorization` header.");
const INCOMPLETE_HEADER_ERROR: (StatusCode, &str) =
    (StatusCode::BAD_REQUEST, "Incomplete `Authorization` header.");
const INVALID_TOKEN_TYPE_ERROR: (StatusCode, &str) =
    (StatusCode::BAD_REQUEST, "Invalid `Authorization` token type.");
const MISSING_TOKEN_ERROR: (StatusCode, &str) =
    (StatusCode::BAD_REQUEST, "Missing bearer token.");
const PROCESSED: (StatusCode, &str) = (
    StatusCode::ACCEPTED,
    "The webhook notification has been processed successfully.",
);

type Rejection = (StatusCode, String);

pub struct AppState {
    pub key: ApiKey,
    pub max_clock_skew: Duration,
    pub max_body_bytes: usize,
    pub expose_failure_details: bool,
    pub handler: Arc<dyn HandleTransaction + Sync + Send>,
}

impl AppState {
    /// Builds a rejection whose body ends with `detail` only when details are exposed.
    /// The full detail is always logged.
    fn reject(&self, status: StatusCode, message: &str, detail: impl Display) -> Rejection {
        warn!("Rejected webhook notification with {status}: {message}: {detail}");

        let body = if self.expose_failure_details {
            format!("{message}: {detail}")
        } else {
            format!("{message}.")
        };
        (status, body)
    }
}

#[derive(Clone)]
pub struct Server {
    config: WebhookConfig,
    state: Arc<AppState>,
}

impl Server {
    /// Fails when the configured credentials cannot be parsed, so a misconfigured
    /// receiver never starts answering requests.
    pub fn new(
        config: WebhookConfig,
        handler: impl HandleTransaction + Sync + Send + 'static,
    ) -> Result<Self> {
        let key = config.corpbank.credentials().parse()?;

        if !config.path.starts_with('/') {
            bail!("Webhook path must start with `/`, got `{}`", config.path);
        }

        let max_clock_skew = config.corpbank.max_time_diff()?;
        if max_clock_skew < Duration::zero() {
            bail!("Maximum clock skew must not be negative, got {max_clock_skew}");
        }

        let state = Arc::new(AppState {
            key,
            max_clock_skew,
            max_body_bytes: config.max_body_bytes,
            expose_failure_details: config.expose_failure_details,
            handler: Arc::new(handler),
        });

        Ok(Self { config, state })
    }

    pub async fn run(&self) -> Result<()> {
        let app = self.router();
        info!(
            "Webhook server listening on {}{}",
            self.config.address, self.config.path
        );

        let tcp_listener = TcpListener::bind(&self.config.address)
            .await
            .map_err(|e| anyhow!("Failed to bind to address: {}", e))?;

        axum::serve(tcp_listener, app.into_make_service())
            .await
            .map_err(|e| anyhow!("Server error: {}", e))
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route(&self.config.path, post(receive_transaction))
            .layer(SetSensitiveRequestHeadersLayer::new(once(AUTHORIZATION)))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }
}

async fn receive_transaction(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, &'static str), Rejection> {
    let (parts, body) = request.into_parts();

    let packed = bearer_token(&parts.headers).map_err(|(status, message)| {
        warn!("Rejected webhook notification with {status}: {message}");
        (status, message.to_owned())
    })?;

    let token = BearerToken::unpack(packed)
        .map_err(|e| state.reject(StatusCode::BAD_REQUEST, "Invalid bearer token", e))?;

    let payload = to_bytes(body, state.max_body_bytes).await.map_err(|e| {
        if is_length_limit(&e) {
            state.reject(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body is too large",
                format!("{e} (allowed max: {} bytes)", state.max_body_bytes),
            )
        } else {
            state.reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Unable to read request body",
                e,
            )
        }
    })?;

    token
        .verify(state.key.secret(), &payload, state.max_clock_skew)
        .map_err(|e| {
            state.reject(
                StatusCode::FORBIDDEN,
                "Unable to verify the request signature",
                e,
            )
        })?;

    if token.api_key_id() != state.key.id {
        return Err(state.reject(
            StatusCode::FORBIDDEN,
            "Illegal signer",
            token.api_key_id(),
        ));
    }

    let trx = serde_json::from_slice::<Transaction>(&payload)
        .map_err(|e| state.reject(StatusCode::BAD_REQUEST, "Invalid request payload", e))?;

    let ctx = WebhookContext {
        api_key_id: token.api_key_id(),
        signed_at: *token.timestamp(),
        headers: parts.headers,
    };

    let trx_id = trx.id;
    if let Err(e) = state.handler.handle(&ctx, trx).await {
        error!("Failed to process transaction {trx_id}: {e:?}");
        let message = "An error occurred while processing the webhook notification";
        let body = if state.expose_failure_details {
            format!("{message}: {e}")
        } else {
            format!("{message}.")
        };
        return Err((StatusCode::INTERNAL_SERVER_ERROR, body));
    }

    Ok(PROCESSED)
}

/// Extracts the packed token from the single `Authorization: Bearer <token>` header.
/// The scheme is matched case-insensitively.
fn bearer_token(headers: &HeaderMap) -> Result<&str, (StatusCode, &'static str)> {
    let mut values = headers.get_all(AUTHORIZATION).iter();
    let value = match (values.next(), values.next()) {
        (None, _) => return Err(MISSING_HEADER_ERROR),
        (Some(_), Some(_)) => return Err(MULTIPLE_HEADERS_ERROR),
        (Some(value), None) => value,
    };

    // to_str only accepts visible ASCII, so byte offsets below are char boundaries
    let value = value
        .to_str()
        .map_err(|_| INVALID_HEADER_ERROR)?
        .trim_start();
    if value.len() < BEARER_SCHEME.len() {
        return Err(INCOMPLETE_HEADER_ERROR);
    }

    let (scheme, token) = value.split_at(BEARER_SCHEME.len());
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(INVALID_TOKEN_TYPE_ERROR);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(MISSING_TOKEN_ERROR);
    }

    Ok(token)
}

fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}
