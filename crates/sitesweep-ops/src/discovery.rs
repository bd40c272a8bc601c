//! Site discovery under the fleet root.
//!
//! A site is an immediate subdirectory whose compose file declares at
//! least one service carrying the content-site prefix. The directory
//! name is the domain; infrastructure stacks (database, cache, proxy)
//! declare no prefixed service and are skipped.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use sitesweep_core::Site;
use tracing::{debug, warn};

use crate::error::{OpsError, OpsResult};

/// Compose file names probed inside each site directory
const COMPOSE_FILES: [&str; 2] = ["docker-compose.yml", "docker-compose.yaml"];

/// Environment key carrying the site-local database credential
const DB_PASSWORD_KEY: &str = "MYSQL_ROOT_PASSWORD";

#[derive(Debug, Deserialize)]
struct ComposeFile {
    #[serde(default)]
    services: BTreeMap<String, ComposeService>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ComposeService {
    container_name: Option<String>,
    environment: Option<EnvSection>,
}

/// Compose accepts both the map and the `KEY=VALUE` list form
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EnvSection {
    Map(BTreeMap<String, serde_yaml::Value>),
    List(Vec<String>),
}

impl EnvSection {
    fn get(&self, key: &str) -> Option<String> {
        match self {
            Self::Map(map) => map.get(key).map(yaml_scalar),
            Self::List(entries) => entries.iter().find_map(|entry| {
                let (k, v) = entry.split_once('=')?;
                (k == key).then(|| v.to_owned())
            }),
        }
    }
}

fn yaml_scalar(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_owned())
            .unwrap_or_default(),
    }
}

/// Discover the sites hosted under `root`, in lexical order.
///
/// Deterministic and read-only. An absent or empty root yields an empty
/// list; a directory with an unreadable or unparsable compose file is
/// skipped with a warning rather than failing the sweep.
pub fn discover(root: &Path, site_prefix: &str) -> OpsResult<Vec<Site>> {
    let read = match std::fs::read_dir(root) {
        Ok(read) => read,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(root = %root.display(), "fleet root does not exist");
            return Ok(Vec::new());
        }
        Err(e) => return Err(OpsError::Io(e)),
    };

    let mut dirs = Vec::new();
    for entry in read {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();

    let mut sites = Vec::new();
    for dir in dirs {
        match site_from_dir(&dir, site_prefix) {
            Ok(Some(site)) => {
                debug!(domain = %site.domain, container = %site.container, "discovered site");
                sites.push(site);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "skipping site directory");
            }
        }
    }
    Ok(sites)
}

fn site_from_dir(dir: &Path, site_prefix: &str) -> OpsResult<Option<Site>> {
    let Some(domain) = dir.file_name().and_then(|n| n.to_str()) else {
        return Ok(None);
    };
    if domain.starts_with('.') {
        return Ok(None);
    }

    let Some(compose_path) = COMPOSE_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
    else {
        return Ok(None);
    };

    let raw = std::fs::read_to_string(&compose_path)?;
    let compose: ComposeFile = serde_yaml::from_str(&raw)
        .map_err(|e| OpsError::Compose(format!("{}: {e}", compose_path.display())))?;

    // BTreeMap iteration is sorted, so the primary service is stable
    let Some((service_name, service)) = compose
        .services
        .iter()
        .find(|(name, _)| name.starts_with(site_prefix))
    else {
        debug!(path = %dir.display(), "no content-site service, skipping");
        return Ok(None);
    };

    let container = service
        .container_name
        .clone()
        .unwrap_or_else(|| service_name.clone());

    let mut site = Site::new(domain, dir, container);
    if let Some(password) = service
        .environment
        .as_ref()
        .and_then(|env| env.get(DB_PASSWORD_KEY))
    {
        site = site.with_db_password(password);
    }
    Ok(Some(site))
}
