use crate::{ProxyFailure, ProxyState};
use axum::extract::State;
use axum::Json;
use kloner_core::{CoreError, ProxyError, RedditApiError};
use reddit_client::auth::now_millis;
use serde::Serialize;
use tracing::{error, info};

#[derive(Debug, Serialize)]
pub struct TokenPayload {
    pub token: String,
    /// Seconds until the cached token is considered expired.
    pub expires_in: u64,
}

/// `GET /api/reddit-token`
pub async fn reddit_token(State(state): State<ProxyState>) -> Result<Json<TokenPayload>, ProxyFailure> {
    info!("Token request received");
    let provider = state.tokens.as_ref().ok_or_else(|| ProxyError::NotConfigured {
        route: "Reddit token endpoint".to_string(),
        reason: "REDDIT_CLIENT_ID and REDDIT_CLIENT_SECRET must be set".to_string(),
    })?;

    match provider.get_access_token().await {
        Ok(token) => Ok(Json(TokenPayload {
            expires_in: token.remaining_secs_at(now_millis()),
            token: token.value,
        })),
        Err(e) => {
            error!("Error fetching Reddit token: {}", e);
            Err(token_failure(e))
        }
    }
}

fn token_failure(error: CoreError) -> ProxyFailure {
    match error {
        CoreError::RedditApi(RedditApiError::TokenRejected { status_code, body }) => {
            ProxyFailure::upstream(status_code, "Failed to get Reddit token", body)
        }
        CoreError::RedditApi(RedditApiError::MissingAccessToken) => {
            ProxyFailure::internal("No access token in response", RedditApiError::MissingAccessToken)
        }
        other => ProxyFailure::internal("Internal server error", other),
    }
}
