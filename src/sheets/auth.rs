use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};
use crate::sheets::credentials::{ServiceAccountKey, SCOPES};
use crate::sheets::models::TokenResponse;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Assertions are valid for one hour, the maximum Google accepts.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Tokens are renewed this long before they expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_usable(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

/// OAuth2 service-account token source (JWT bearer grant).
///
/// Holds the signing key and the most recent access token; callers always
/// get a token with at least a minute of validity left.
pub struct TokenProvider {
    http_client: Client,
    client_email: String,
    token_uri: String,
    signing_key: EncodingKey,
    key_id: Option<String>,
    current: Mutex<Option<AccessToken>>,
}

impl TokenProvider {
    /// # Errors
    ///
    /// Returns `AppError::Authentication` if the private key is not a valid RSA PEM.
    pub fn new(http_client: Client, key: &ServiceAccountKey) -> AppResult<Self> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| AppError::Authentication(format!("Invalid private key: {e}")))?;

        Ok(Self {
            http_client,
            client_email: key.client_email.clone(),
            token_uri: key.token_uri.clone(),
            signing_key,
            key_id: key.private_key_id.clone(),
            current: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// Return a valid access token, exchanging a fresh assertion if needed.
    ///
    /// # Errors
    ///
    /// `AppError::Authentication` when the token endpoint rejects the
    /// assertion, `AppError::SourceUnavailable` when it cannot be reached.
    pub async fn access_token(&self) -> AppResult<String> {
        let mut current = self.current.lock().await;
        let now = Utc::now();

        if let Some(token) = current.as_ref().filter(|t| t.is_usable(now)) {
            return Ok(token.value.clone());
        }

        let token = self.exchange(now).await?;
        let value = token.value.clone();
        *current = Some(token);
        Ok(value)
    }

    fn assertion(&self, now: DateTime<Utc>) -> AppResult<String> {
        let claims = Claims {
            iss: &self.client_email,
            scope: SCOPES.join(" "),
            aud: &self.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid.clone_from(&self.key_id);

        jsonwebtoken::encode(&header, &claims, &self.signing_key)
            .map_err(|e| AppError::Authentication(format!("Failed to sign assertion: {e}")))
    }

    async fn exchange(&self, now: DateTime<Utc>) -> AppResult<AccessToken> {
        let assertion = self.assertion(now)?;

        tracing::debug!(client_email = %self.client_email, "Requesting access token");

        let response = self
            .http_client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| AppError::SourceUnavailable(format!("Token request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::UNAUTHORIZED
        {
            return Err(AppError::Authentication(format!(
                "Token endpoint rejected credentials (HTTP {status}): {}",
                response.text().await.unwrap_or_default()
            )));
        }

        if !status.is_success() {
            return Err(AppError::SourceUnavailable(format!(
                "Token endpoint returned HTTP {status}"
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Authentication(format!("Malformed token response: {e}")))?;

        tracing::info!(
            client_email = %self.client_email,
            expires_in = body.expires_in,
            "Access token obtained"
        );

        Ok(AccessToken {
            value: body.access_token,
            expires_at: now + Duration::seconds(body.expires_in),
        })
    }
}
