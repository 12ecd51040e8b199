//! Bearer-token verification against the issuer's published key set.
//!
//! Keys are held in a [`KeyCache`] owned by the caller and shared across
//! invocations. A lookup for an unknown or stale key id refetches the whole
//! set before giving up. Two invocations missing at once may both fetch;
//! the later write simply replaces the earlier one.

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use lambda_http::http::header::AUTHORIZATION;
use lambda_http::http::HeaderMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

pub const KEY_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing Authorization header")]
    MissingHeader,
    #[error("invalid Authorization header format")]
    MalformedHeader,
    #[error("failed to parse token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("unexpected signing method {0:?}")]
    UnsupportedAlgorithm(Algorithm),
    #[error("missing kid in token header")]
    MissingKeyId,
    #[error("key not found for kid: {0}")]
    UnknownKey(String),
    #[error("failed to fetch JWKS: {0}")]
    KeySetFetch(String),
    #[error("invalid token_use claim")]
    WrongTokenUse,
    #[error("no user ID found in token claims")]
    MissingSubject,
}

/// Where the issuer's signing keys come from.
#[async_trait]
pub trait KeySetSource: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet, AuthError>;
}

pub struct HttpKeySetSource {
    client: reqwest::Client,
    url: String,
}

impl HttpKeySetSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl KeySetSource for HttpKeySetSource {
    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        debug!(url = %self.url, "fetching JWKS");
        self.client
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| AuthError::KeySetFetch(err.to_string()))?
            .json::<JwkSet>()
            .await
            .map_err(|err| AuthError::KeySetFetch(err.to_string()))
    }
}

struct CachedKey {
    key: DecodingKey,
    fetched_at: Instant,
}

pub struct KeyCache<S> {
    source: S,
    ttl: Duration,
    keys: RwLock<HashMap<String, CachedKey>>,
}

impl<S: KeySetSource> KeyCache<S> {
    pub fn new(source: S) -> Self {
        Self::with_ttl(source, KEY_CACHE_TTL)
    }

    pub fn with_ttl(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            keys: RwLock::new(HashMap::new()),
        }
    }

    pub async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        if let Some(key) = self.cached(kid).await {
            return Ok(key);
        }
        self.refresh(kid).await
    }

    async fn cached(&self, kid: &str) -> Option<DecodingKey> {
        let keys = self.keys.read().await;
        keys.get(kid)
            .filter(|cached| cached.fetched_at.elapsed() < self.ttl)
            .map(|cached| cached.key.clone())
    }

    // The fetch happens before the write lock is taken.
    async fn refresh(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        let set = self.source.fetch().await?;
        let fetched_at = Instant::now();

        let mut fresh = HashMap::new();
        for jwk in &set.keys {
            let Some(id) = jwk.common.key_id.clone() else {
                continue;
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    fresh.insert(id, CachedKey { key, fetched_at });
                }
                Err(err) => warn!(kid = %id, error = %err, "skipping unusable JWK"),
            }
        }

        let found = fresh.get(kid).map(|cached| cached.key.clone());
        *self.keys.write().await = fresh;
        found.ok_or_else(|| AuthError::UnknownKey(kid.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct AccessClaims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(rename = "cognito:username", default)]
    cognito_username: Option<String>,
    #[serde(default)]
    token_use: Option<String>,
}

/// Verifies Cognito access tokens and yields the caller's owner id.
pub struct JwtVerifier<S> {
    keys: KeyCache<S>,
    issuer: String,
}

impl<S: KeySetSource> JwtVerifier<S> {
    pub fn new(keys: KeyCache<S>, issuer: impl Into<String>) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
        }
    }

    pub async fn owner_from_headers(&self, headers: &HeaderMap) -> Result<String, AuthError> {
        let token = bearer_token(headers)?;
        self.verify(token).await
    }

    pub async fn verify(&self, token: &str) -> Result<String, AuthError> {
        let header = decode_header(token)?;
        if !matches!(
            header.alg,
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512
        ) {
            return Err(AuthError::UnsupportedAlgorithm(header.alg));
        }
        let kid = header.kid.ok_or(AuthError::MissingKeyId)?;
        let key = self.keys.decoding_key(&kid).await?;

        let mut validation = Validation::new(header.alg);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.validate_aud = false;
        validation.leeway = 0;

        let claims = decode::<AccessClaims>(token, &key, &validation)?.claims;
        if claims.token_use.as_deref() != Some("access") {
            return Err(AuthError::WrongTokenUse);
        }

        [claims.sub, claims.username, claims.cognito_username]
            .into_iter()
            .flatten()
            .find(|value| !value.is_empty())
            .ok_or(AuthError::MissingSubject)
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    match value.split_once(' ') {
        Some(("Bearer", token)) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::MalformedHeader),
    }
}
