use std::path::{Path, PathBuf};

use super::Secret;

/// A locally hosted site discovered under the fleet root.
///
/// Built once during discovery and treated as immutable for the rest of
/// the run. The domain doubles as the unique key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    /// Domain name, taken from the site's directory name
    pub domain: String,

    /// Absolute path of the site directory
    pub path: PathBuf,

    /// Name of the site's primary container
    pub container: String,

    /// Site-local database root credential, when the service declares one
    pub db_password: Option<Secret>,
}

impl Site {
    /// Create a site record
    #[must_use]
    pub fn new(
        domain: impl Into<String>,
        path: impl Into<PathBuf>,
        container: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            path: path.into(),
            container: container.into(),
            db_password: None,
        }
    }

    /// Attach the site-local database credential
    #[must_use]
    pub fn with_db_password(mut self, password: impl Into<Secret>) -> Self {
        self.db_password = Some(password.into());
        self
    }

    /// Database and database-user name derived from the domain.
    ///
    /// Dots and dashes are stripped, matching how the fleet names the
    /// per-site databases.
    #[must_use]
    pub fn database_name(&self) -> String {
        sanitized(&self.domain)
    }

    /// Site directory path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Container identifier for a domain: the site prefix plus the domain
/// with dots and dashes stripped.
#[must_use]
pub fn container_name(prefix: &str, domain: &str) -> String {
    format!("{prefix}{}", sanitized(domain))
}

fn sanitized(domain: &str) -> String {
    domain.chars().filter(|c| *c != '.' && *c != '-').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_name_strips_separators() {
        let site = Site::new(
            "my-shop.example.com",
            "/var/opt/my-shop.example.com",
            "wp_myshopexamplecom",
        );
        assert_eq!(site.database_name(), "myshopexamplecom");
    }

    #[test]
    fn container_name_applies_prefix() {
        assert_eq!(container_name("wp_", "coolsite.net"), "wp_coolsitenet");
    }

    #[test]
    fn db_password_is_redacted_in_debug() {
        let site = Site::new("a.com", "/var/opt/a.com", "wp_acom").with_db_password("s3cret");
        let debug = format!("{site:?}");
        assert!(!debug.contains("s3cret"));
    }
}
