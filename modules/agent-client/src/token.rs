use std::time::Instant;

use async_trait::async_trait;

use crate::error::AgentClientError;

/// A bearer token plus its expiry, if known. `expires_at = None` means
/// the token never expires.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: Option<Instant>,
}

impl AccessToken {
    pub fn static_token(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expires_at: None,
        }
    }

    /// Reusable while its expiry is more than one minute away, per
    /// spec §4.1.
    pub fn still_fresh(&self) -> bool {
        match self.expires_at {
            None => true,
            Some(at) => at.saturating_duration_since(Instant::now()) > std::time::Duration::from_secs(60),
        }
    }
}

/// Credential provider targeting a fixed audience. See spec §4.1.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn fetch(&self) -> Result<AccessToken, AgentClientError>;
}

/// Reads a bearer token from an environment variable once and treats it
/// as never-expiring. No OAuth/Entra flow is in scope; a managed-identity
/// provider can implement the same trait without touching call sites.
pub struct EnvTokenProvider {
    value: String,
}

impl EnvTokenProvider {
    pub fn from_env(var_name: &str) -> Result<Self, AgentClientError> {
        let value = std::env::var(var_name)
            .map_err(|_| AgentClientError::Config(format!("missing environment variable: {var_name}")))?;
        Ok(Self { value })
    }
}

#[async_trait]
impl TokenProvider for EnvTokenProvider {
    async fn fetch(&self) -> Result<AccessToken, AgentClientError> {
        Ok(AccessToken::static_token(self.value.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_token_is_always_fresh() {
        let token = AccessToken::static_token("abc");
        assert!(token.still_fresh());
    }

    #[test]
    fn expiring_token_respects_one_minute_buffer() {
        let soon = AccessToken {
            value: "abc".to_string(),
            expires_at: Some(Instant::now() + std::time::Duration::from_secs(30)),
        };
        assert!(!soon.still_fresh());

        let later = AccessToken {
            value: "abc".to_string(),
            expires_at: Some(Instant::now() + std::time::Duration::from_secs(300)),
        };
        assert!(later.still_fresh());
    }
}
