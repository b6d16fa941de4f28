//! Configuration Management
//!
//! Settings are layered: built-in defaults, then an optional JSON file, then
//! environment variables, then command line flags (applied by `main`).

use crate::resource::ResourceKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Endpoint used when nothing else is configured (LocalStack edge port)
pub const DEFAULT_ENDPOINT: &str = "http://localhost:4566";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_BIND: &str = "0.0.0.0:8000";

/// Gateway configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Address the HTTP server listens on
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Provider region
    #[serde(default = "default_region")]
    pub region: String,
    /// Per-service endpoint overrides
    #[serde(default)]
    pub endpoints: Endpoints,
}

/// Service endpoint overrides
///
/// An empty string selects the provider's regional endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_endpoint")]
    pub sqs: Option<String>,
    #[serde(default = "default_endpoint")]
    pub sns: Option<String>,
    #[serde(default = "default_endpoint")]
    pub dynamodb: Option<String>,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_endpoint() -> Option<String> {
    Some(DEFAULT_ENDPOINT.to_string())
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            sqs: default_endpoint(),
            sns: default_endpoint(),
            dynamodb: default_endpoint(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            region: default_region(),
            endpoints: Endpoints::default(),
        }
    }
}

impl Endpoints {
    fn slot_mut(&mut self, kind: ResourceKind) -> &mut Option<String> {
        match kind {
            ResourceKind::Queue => &mut self.sqs,
            ResourceKind::Topic => &mut self.sns,
            ResourceKind::Table => &mut self.dynamodb,
        }
    }

    pub fn get(&self, kind: ResourceKind) -> Option<&str> {
        match kind {
            ResourceKind::Queue => self.sqs.as_deref(),
            ResourceKind::Topic => self.sns.as_deref(),
            ResourceKind::Table => self.dynamodb.as_deref(),
        }
    }

    pub fn set(&mut self, kind: ResourceKind, url: impl Into<String>) {
        *self.slot_mut(kind) = Some(url.into());
    }
}

/// Environment variable holding the endpoint override for a service
pub fn endpoint_env_var(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Queue => "SQS_ENDPOINT_URL",
        ResourceKind::Topic => "SNS_ENDPOINT_URL",
        ResourceKind::Table => "DYNAMODB_ENDPOINT_URL",
    }
}

impl Config {
    /// Get the default config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cloudgate").join("config.json"))
    }

    /// Load configuration from `path`, or from the default location if it exists
    ///
    /// An explicitly given path must exist; the default one is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply `AWS_REGION`, `CLOUDGATE_BIND` and the `*_ENDPOINT_URL` variables
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(region) = lookup("AWS_REGION").filter(|r| !r.is_empty()) {
            self.region = region;
        }
        if let Some(bind) = lookup("CLOUDGATE_BIND").filter(|b| !b.is_empty()) {
            self.bind = bind;
        }
        for kind in ResourceKind::ALL {
            if let Some(url) = lookup(endpoint_env_var(kind)) {
                self.endpoints.set(kind, url);
            }
        }
    }

    /// Check that every configured endpoint is a valid http(s) URL
    pub fn validate(&self) -> Result<()> {
        for kind in ResourceKind::ALL {
            let Some(endpoint) = self.endpoints.get(kind).filter(|e| !e.is_empty()) else {
                continue;
            };
            let url = url::Url::parse(endpoint)
                .with_context(|| format!("Invalid {} endpoint URL: {}", kind, endpoint))?;
            if !matches!(url.scheme(), "http" | "https") {
                anyhow::bail!("Unsupported scheme in {} endpoint URL: {}", kind, endpoint);
            }
        }
        if self.region.is_empty() {
            anyhow::bail!("Region must not be empty");
        }
        Ok(())
    }

    /// Effective endpoint for a service (override > regional endpoint)
    pub fn endpoint_url(&self, kind: ResourceKind) -> String {
        match self.endpoints.get(kind) {
            Some(endpoint) if !endpoint.is_empty() => endpoint.trim_end_matches('/').to_string(),
            _ => format!("https://{}.{}.amazonaws.com", kind.service(), self.region),
        }
    }
}
