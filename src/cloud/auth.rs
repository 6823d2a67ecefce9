//! Authentication
//!
//! Obtains identity v3 tokens, either by password or by validating a
//! pre-issued token, and caches them together with the service catalog.

use super::catalog::{strip_version_suffix, Catalog};
use super::http::{EclHttpClient, RequestOptions, SUBJECT_TOKEN_HEADER};
use crate::error::{Error, Result};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Token expiry buffer - refresh tokens this much before they actually expire
/// This prevents using tokens that are about to expire during a request
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Default token TTL if we can't determine expiry (conservative: 30 minutes)
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Domain used when none is configured
pub const DEFAULT_DOMAIN_ID: &str = "default";

/// How to obtain a token
#[derive(Clone)]
pub enum AuthMethod {
    /// Password authentication scoped to a project
    Password {
        auth_url: String,
        username: String,
        password: String,
        user_domain_id: Option<String>,
        project_id: Option<String>,
    },
    /// A token issued elsewhere; validated once to fetch its catalog
    Token { auth_url: String, token: String },
}

impl AuthMethod {
    fn auth_url(&self) -> &str {
        match self {
            AuthMethod::Password { auth_url, .. } | AuthMethod::Token { auth_url, .. } => auth_url,
        }
    }
}

/// A usable token with the data that came with it
#[derive(Debug, Clone)]
pub struct AuthToken {
    pub token: String,
    pub project_id: Option<String>,
    pub catalog: Arc<Catalog>,
}

#[derive(Clone)]
struct CachedToken {
    auth: AuthToken,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    /// Check if this cached token is still valid
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Credentials holder with token caching
#[derive(Clone)]
pub struct Credentials {
    method: Arc<AuthMethod>,
    http: EclHttpClient,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

impl Credentials {
    pub fn new(method: AuthMethod, http: EclHttpClient) -> Self {
        Self {
            method: Arc::new(method),
            http,
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// URL of the identity v3 token API
    pub fn tokens_url(&self) -> String {
        format!("{}/v3/auth/tokens", strip_version_suffix(self.method.auth_url()))
    }

    /// Get a token for API calls
    /// Security: Checks token expiry before returning cached token
    pub async fn get_token(&self) -> Result<AuthToken> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.auth.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let (auth, ttl) = self.authenticate().await?;
        let expires_at = Instant::now() + ttl.saturating_sub(TOKEN_EXPIRY_BUFFER);

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                auth: auth.clone(),
                expires_at,
            });
        }

        tracing::debug!(
            "New token cached, expires in ~{} minutes",
            ttl.saturating_sub(TOKEN_EXPIRY_BUFFER).as_secs() / 60
        );

        Ok(auth)
    }

    /// Force refresh the token
    pub async fn refresh_token(&self) -> Result<AuthToken> {
        {
            let mut cache = self.token_cache.write().await;
            *cache = None;
        }

        self.get_token().await
    }

    async fn authenticate(&self) -> Result<(AuthToken, Duration)> {
        let url = self.tokens_url();

        let (token, body) = match self.method.as_ref() {
            AuthMethod::Password {
                username,
                password,
                user_domain_id,
                project_id,
                ..
            } => {
                tracing::info!("Authenticating user {} against {}", username, url);
                let request = password_request(
                    username,
                    password,
                    user_domain_id.as_deref().unwrap_or(DEFAULT_DOMAIN_ID),
                    project_id.as_deref(),
                );
                let (headers, body) = self
                    .http
                    .send_raw(Method::POST, &url, &RequestOptions::default(), Some(&request))
                    .await?;
                let token = headers
                    .get(SUBJECT_TOKEN_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(|s| s.to_string())
                    .ok_or_else(|| {
                        Error::Auth(format!("response is missing the {} header", SUBJECT_TOKEN_HEADER))
                    })?;
                (token, body)
            }
            AuthMethod::Token { token, .. } => {
                tracing::info!("Validating pre-issued token against {}", url);
                let opts = RequestOptions {
                    token: Some(token.as_str()),
                    subject_token: Some(token.as_str()),
                    ..Default::default()
                };
                let body = self.http.get(&url, &opts).await?;
                (token.clone(), body)
            }
        };

        let token_body = body
            .get("token")
            .ok_or_else(|| Error::Auth("response has no token body".to_string()))?;

        let project_id = token_body
            .get("project")
            .and_then(|p| p.get("id"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        let ttl = token_ttl(token_body, chrono::Utc::now());
        let catalog = Arc::new(Catalog::from_token_body(token_body));

        if catalog.is_empty() {
            tracing::warn!("Token carries an empty service catalog (unscoped token?)");
        }

        Ok((
            AuthToken {
                token,
                project_id,
                catalog,
            },
            ttl,
        ))
    }
}

/// Identity v3 password authentication request body
fn password_request(
    username: &str,
    password: &str,
    user_domain_id: &str,
    project_id: Option<&str>,
) -> Value {
    let mut request = json!({
        "auth": {
            "identity": {
                "methods": ["password"],
                "password": {
                    "user": {
                        "name": username,
                        "domain": {"id": user_domain_id},
                        "password": password
                    }
                }
            }
        }
    });

    if let Some(project_id) = project_id {
        request["auth"]["scope"] = json!({"project": {"id": project_id}});
    }

    request
}

/// Remaining lifetime of a token from its `expires_at` field
fn token_ttl(token_body: &Value, now: chrono::DateTime<chrono::Utc>) -> Duration {
    token_body
        .get("expires_at")
        .and_then(|v| v.as_str())
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|expires| {
            (expires.with_timezone(&chrono::Utc) - now)
                .to_std()
                .unwrap_or(Duration::ZERO)
        })
        .unwrap_or(DEFAULT_TOKEN_TTL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_password_request_scoped() {
        let body = password_request("alice", "secret", "default", Some("p-1"));
        assert_eq!(body["auth"]["identity"]["password"]["user"]["name"], "alice");
        assert_eq!(body["auth"]["scope"]["project"]["id"], "p-1");
    }

    #[test]
    fn test_password_request_unscoped() {
        let body = password_request("alice", "secret", "default", None);
        assert!(body["auth"].get("scope").is_none());
    }

    #[test]
    fn test_token_ttl_from_expires_at() {
        let now = chrono::Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let body = json!({"expires_at": "2026-01-01T02:00:00.000000Z"});
        assert_eq!(token_ttl(&body, now), Duration::from_secs(2 * 3600));
    }

    #[test]
    fn test_token_ttl_defaults() {
        let now = chrono::Utc::now();
        assert_eq!(token_ttl(&json!({}), now), DEFAULT_TOKEN_TTL);
        assert_eq!(token_ttl(&json!({"expires_at": "soon"}), now), DEFAULT_TOKEN_TTL);

        let body = json!({"expires_at": "2000-01-01T00:00:00Z"});
        assert_eq!(token_ttl(&body, now), Duration::ZERO);
    }

    #[test]
    fn test_tokens_url() {
        let http = EclHttpClient::new().unwrap();
        let creds = Credentials::new(
            AuthMethod::Token {
                auth_url: "https://keystone.example.com/v3/".to_string(),
                token: "t".to_string(),
            },
            http,
        );
        assert_eq!(creds.tokens_url(), "https://keystone.example.com/v3/auth/tokens");
    }
}
