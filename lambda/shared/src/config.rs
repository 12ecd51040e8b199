use std::env;
use thiserror::Error;

pub const DEFAULT_TABLE: &str = "books";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
}

/// A variable that must be present and non-empty.
pub fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::Missing(key))
}

pub fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

pub fn table_name() -> String {
    optional("BOOKS_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string())
}

/// The Cognito user pool that issues access tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CognitoConfig {
    pub region: String,
    pub user_pool_id: String,
}

impl CognitoConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            region: required("COGNITO_REGION")?,
            user_pool_id: required("COGNITO_USER_POOL_ID")?,
        })
    }

    pub fn issuer(&self) -> String {
        format!(
            "https://cognito-idp.{}.amazonaws.com/{}",
            self.region, self.user_pool_id
        )
    }

    pub fn jwks_url(&self) -> String {
        format!("{}/.well-known/jwks.json", self.issuer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cognito_urls_follow_the_pool() {
        let cognito = CognitoConfig {
            region: "us-east-1".to_string(),
            user_pool_id: "us-east-1_Rojs1ZGHQ".to_string(),
        };
        assert_eq!(
            cognito.issuer(),
            "https://cognito-idp.us-east-1.amazonaws.com/us-east-1_Rojs1ZGHQ"
        );
        assert_eq!(
            cognito.jwks_url(),
            "https://cognito-idp.us-east-1.amazonaws.com/us-east-1_Rojs1ZGHQ/.well-known/jwks.json"
        );
    }
}
