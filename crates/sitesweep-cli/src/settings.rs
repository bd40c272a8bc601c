//! Credential settings.
//!
//! Credentials ride the environment, never argv. The controller reads
//! them here and forwards them to the agent as `KEY=VALUE` lines over
//! the SSH stdin pipe; the agent folds those lines back over its own
//! environment through [`Credentials::apply_env_lines`].

use sitesweep_core::Secret;
use sitesweep_dns::ProviderCredentials;

/// Provider account email
pub const PROVIDER_EMAIL_VAR: &str = "CF_API_EMAIL";
/// Provider API key
pub const PROVIDER_KEY_VAR: &str = "CF_API_KEY";
/// Fleet-wide database root password
pub const DB_PASSWORD_VAR: &str = "DB_ROOT_PASSWORD";

/// The credential set for one run
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// Provider account email
    pub provider_email: Option<String>,
    /// Provider API key
    pub provider_key: Option<Secret>,
    /// Fleet-wide database root password
    pub db_password: Option<Secret>,
}

impl Credentials {
    /// Read the credential environment. Unset and empty are the same.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            provider_email: env_nonempty(PROVIDER_EMAIL_VAR),
            provider_key: env_nonempty(PROVIDER_KEY_VAR).map(Secret::from),
            db_password: env_nonempty(DB_PASSWORD_VAR).map(Secret::from),
        }
    }

    /// Fold injected `KEY=VALUE` lines over the current values.
    ///
    /// Unknown keys and malformed lines are ignored; injected values win
    /// over whatever the environment held.
    pub fn apply_env_lines(&mut self, lines: &str) {
        for line in lines.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            match key {
                PROVIDER_EMAIL_VAR => self.provider_email = Some(value.to_owned()),
                PROVIDER_KEY_VAR => self.provider_key = Some(Secret::from(value)),
                DB_PASSWORD_VAR => self.db_password = Some(Secret::from(value)),
                _ => {}
            }
        }
    }

    /// Provider credentials, when both halves are present
    #[must_use]
    pub fn provider(&self) -> Option<ProviderCredentials> {
        match (&self.provider_email, &self.provider_key) {
            (Some(email), Some(key)) => Some(ProviderCredentials::new(email.clone(), key.clone())),
            _ => None,
        }
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}
