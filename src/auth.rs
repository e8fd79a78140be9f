use axum::http::{HeaderMap, header};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{AppConfig, Env};

/// Audience the auth subsystem stamps on access tokens of signed-in users.
pub const TOKEN_AUDIENCE: &str = "authenticated";

/// Claims
///
/// Payload of the access tokens issued by the auth subsystem and verified with the
/// shared JWT secret.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the identity id, also the primary key of `public.profiles`.
    pub sub: Uuid,
    /// Expiration time; expired tokens never yield a session.
    pub exp: usize,
    /// Issued at.
    pub iat: usize,
    pub aud: String,
}

/// Session
///
/// Proof of an authenticated identity for the current request. The raw token is kept so
/// sign-out can be forwarded to the auth subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub access_token: Option<String>,
}

impl Session {
    /// from_headers
    ///
    /// Resolves the session carried by a request, if any:
    /// 1. In `Env::Local`, an `x-user-id` header holding a UUID is accepted as-is.
    /// 2. Otherwise a `Bearer` token must decode against the configured secret with a
    ///    valid signature, unexpired `exp` and the expected audience.
    ///
    /// Anything else means "no session"; the caller decides where to redirect.
    pub fn from_headers(headers: &HeaderMap, config: &AppConfig) -> Option<Session> {
        if config.env == Env::Local {
            let bypass = headers
                .get("x-user-id")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| Uuid::parse_str(value).ok());
            if let Some(user_id) = bypass {
                return Some(Session {
                    user_id,
                    access_token: None,
                });
            }
        }

        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))?;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.set_audience(&[TOKEN_AUDIENCE]);

        match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(data) => Some(Session {
                user_id: data.claims.sub,
                access_token: Some(token.to_string()),
            }),
            Err(e) => {
                match e.kind() {
                    ErrorKind::ExpiredSignature => tracing::debug!("access token expired"),
                    other => tracing::debug!(reason = ?other, "access token rejected"),
                }
                None
            }
        }
    }
}

/// sign_out
///
/// Revokes the session at the auth subsystem (`POST /auth/v1/logout`). Without a
/// configured auth URL, or for development sessions that carry no token, there is
/// nothing to revoke.
pub async fn sign_out(config: &AppConfig, session: &Session) -> Result<(), String> {
    let (Some(base_url), Some(token)) = (&config.supabase_url, &session.access_token) else {
        return Ok(());
    };

    let client = reqwest::Client::new();
    let mut request = client
        .post(format!("{}/auth/v1/logout", base_url))
        .bearer_auth(token);
    if let Some(key) = &config.supabase_anon_key {
        request = request.header("apikey", key);
    }

    let response = request.send().await.map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("auth service answered {}", response.status()));
    }
    Ok(())
}
