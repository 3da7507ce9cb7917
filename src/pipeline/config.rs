//! Pipeline configuration.

use super::generator::AgentRole;
use crate::email::Branding;
use crate::error::{Error, Result};
use std::time::Duration;

pub const DEFAULT_SEARCH_COUNT: usize = 5;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// Output-token caps per agent, used for usage monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenCaps {
    pub planner: u32,
    pub search: u32,
    pub writer: u32,
}

impl Default for TokenCaps {
    fn default() -> Self {
        Self {
            planner: 200,
            search: 300,
            writer: 900,
        }
    }
}

impl TokenCaps {
    pub fn cap(&self, role: AgentRole) -> u32 {
        match role {
            AgentRole::Planner => self.planner,
            AgentRole::Search => self.search,
            AgentRole::Writer => self.writer,
        }
    }
}

/// Configuration for brief generation and delivery.
#[derive(Clone)]
pub struct BriefConfig {
    /// Number of web searches the planner is asked for
    pub search_count: usize,
    /// Wall-clock budget for planning, searching and writing
    pub timeout: Duration,
    pub token_caps: TokenCaps,
    /// Verified sender address
    pub from_email: Option<String>,
    pub to_email: Option<String>,
    pub sendgrid_api_key: Option<String>,
    pub branding: Branding,
}

impl Default for BriefConfig {
    fn default() -> Self {
        Self {
            search_count: DEFAULT_SEARCH_COUNT,
            timeout: DEFAULT_TIMEOUT,
            token_caps: TokenCaps::default(),
            from_email: None,
            to_email: None,
            sendgrid_api_key: None,
            branding: Branding::default(),
        }
    }
}

impl BriefConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `SENDGRID_API_KEY`, `BRIEF_FROM_EMAIL`, `BRIEF_TO_EMAIL`,
    /// `BRIEF_TIMEOUT_SECS` and `BRIEF_SEARCH_COUNT`. Unset variables keep
    /// their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`BriefConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        config.sendgrid_api_key = var("SENDGRID_API_KEY");
        config.from_email = var("BRIEF_FROM_EMAIL");
        config.to_email = var("BRIEF_TO_EMAIL");

        if let Some(secs) = var("BRIEF_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|_| Error::Config(format!("BRIEF_TIMEOUT_SECS must be a whole number of seconds, got {:?}", secs)))?;
            if secs == 0 {
                return Err(Error::Config("BRIEF_TIMEOUT_SECS must be greater than zero".to_string()));
            }
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(count) = var("BRIEF_SEARCH_COUNT") {
            let count: usize = count
                .parse()
                .map_err(|_| Error::Config(format!("BRIEF_SEARCH_COUNT must be a positive integer, got {:?}", count)))?;
            if count == 0 {
                return Err(Error::Config("BRIEF_SEARCH_COUNT must be greater than zero".to_string()));
            }
            config.search_count = count;
        }

        Ok(config)
    }

    /// Set the number of planned searches.
    pub fn search_count(mut self, n: usize) -> Self {
        self.search_count = n.max(1);
        self
    }

    /// Set the overall timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn token_caps(mut self, caps: TokenCaps) -> Self {
        self.token_caps = caps;
        self
    }

    pub fn from_email(mut self, address: impl Into<String>) -> Self {
        self.from_email = Some(address.into());
        self
    }

    pub fn to_email(mut self, address: impl Into<String>) -> Self {
        self.to_email = Some(address.into());
        self
    }

    pub fn sendgrid_api_key(mut self, key: impl Into<String>) -> Self {
        self.sendgrid_api_key = Some(key.into());
        self
    }

    /// Set the brand constants used by the email template.
    pub fn branding(mut self, branding: Branding) -> Self {
        self.branding = branding;
        self
    }
}
