use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("configuration not found: {0}")]
    MissingFile(PathBuf),
    #[error("invalid config {path}: {reason}")]
    InvalidFormat { path: PathBuf, reason: String },
    #[error("no environments defined in {0}")]
    Empty(PathBuf),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Host {
    pub name: String,
    pub target: String,
}

impl Host {
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Environment {
    pub id: String,
    pub suffix: String,
    pub hosts: Vec<Host>,
}

impl Environment {
    pub fn display_name(&self) -> String {
        display_name(&self.id)
    }
}

pub fn display_name(id: &str) -> String {
    id.replace('_', " ")
}

#[derive(Clone, Debug)]
pub struct Catalog {
    environments: Vec<Environment>,
}

impl Catalog {
    pub fn new(environments: Vec<Environment>) -> Self {
        Self { environments }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => CatalogError::MissingFile(path.to_path_buf()),
            _ => CatalogError::InvalidFormat {
                path: path.to_path_buf(),
                reason: err.to_string(),
            },
        })?;

        let file: CatalogFile =
            toml::from_str(&contents).map_err(|err| CatalogError::InvalidFormat {
                path: path.to_path_buf(),
                reason: err.message().to_string(),
            })?;

        let environments: Vec<Environment> = file
            .environments
            .into_iter()
            .map(EnvironmentEntry::into_environment)
            .collect();
        if environments.is_empty() {
            return Err(CatalogError::Empty(path.to_path_buf()));
        }

        Ok(Self::new(environments))
    }

    pub fn environments(&self) -> &[Environment] {
        &self.environments
    }

    pub fn hosts_of(&self, id: &str) -> &[Host] {
        self.env(id).map(|env| env.hosts.as_slice()).unwrap_or(&[])
    }

    pub fn suffix_of(&self, id: &str) -> &str {
        self.env(id).map(|env| env.suffix.as_str()).unwrap_or("")
    }

    pub fn resolve_target(&self, env_id: &str, host_target: &str) -> String {
        if host_target.contains('.') || host_target.contains('@') {
            return host_target.to_string();
        }
        format!("{host_target}{}", self.suffix_of(env_id))
    }

    fn env(&self, id: &str) -> Option<&Environment> {
        self.environments.iter().find(|env| env.id == id)
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var_os("HOME").ok_or_else(|| anyhow!("HOME not set"))?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("hopper")
        .join("hosts.toml"))
}

pub fn example_path(config: &Path) -> PathBuf {
    let mut name = config
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".example");
    config.with_file_name(name)
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    environments: Vec<EnvironmentEntry>,
}

#[derive(Debug, Deserialize)]
struct EnvironmentEntry {
    name: String,
    #[serde(default)]
    suffix: String,
    #[serde(default)]
    hosts: Vec<HostEntry>,
}

impl EnvironmentEntry {
    fn into_environment(self) -> Environment {
        Environment {
            id: self.name,
            suffix: self.suffix,
            hosts: self.hosts.into_iter().map(HostEntry::into_host).collect(),
        }
    }
}

// A host is either a bare name or an alias/target pair.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HostEntry {
    Bare(String),
    Aliased { name: String, target: String },
}

impl HostEntry {
    fn into_host(self) -> Host {
        match self {
            HostEntry::Bare(name) => {
                let target = name.clone();
                Host::new(name, target)
            }
            HostEntry::Aliased { name, target } => Host::new(name, target),
        }
    }
}
