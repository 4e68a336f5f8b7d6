//! Client configuration.

use std::env;

use crate::error::{Error, Result};

pub const DEFAULT_ORIGIN: &str = "https://api.mapbox.com";
pub const ACCESS_TOKEN_ENV: &str = "MAPBOX_ACCESS_TOKEN";
pub const ORIGIN_ENV: &str = "MAPBOX_ORIGIN";

/// Access credential plus the API origin requests are sent to.
///
/// Immutable once built; every service created from a client shares it.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    access_token: String,
    origin: String,
}

impl ClientConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            origin: DEFAULT_ORIGIN.to_string(),
        }
    }

    /// Point the client at another origin, e.g. a staging host or a local
    /// mock server.
    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin = origin.trim_end_matches('/').to_string();
        self
    }

    /// Build a configuration from `MAPBOX_ACCESS_TOKEN` and the optional
    /// `MAPBOX_ORIGIN`.
    pub fn from_env() -> Result<Self> {
        let token = env::var(ACCESS_TOKEN_ENV)
            .map_err(|_| Error::invalid("accessToken", format!("{ACCESS_TOKEN_ENV} is not set")))?;
        let config = Self::new(token);
        Ok(match env::var(ORIGIN_ENV) {
            Ok(origin) if !origin.trim().is_empty() => config.with_origin(origin.trim()),
            _ => config,
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.access_token.trim().is_empty() {
            return Err(Error::invalid("accessToken", "an access token is required"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("access_token", &redact(&self.access_token))
            .field("origin", &self.origin)
            .finish()
    }
}

/// Keep the token's usage prefix (`pk`, `sk`, `tk`) and hide the rest.
pub(crate) fn redact(token: &str) -> String {
    match token.split_once('.') {
        Some((usage, _)) => format!("{usage}.***"),
        None => "***".to_string(),
    }
}
