//! Stack configuration
//!
//! A stack file is TOML with an optional project/stack header and a
//! `[config]` table of namespaced keys:
//!
//! ```toml
//! project = "static-site"
//! stack = "dev"
//!
//! [config]
//! "static-site:domain" = "example.com"
//! "static-site:bucketName" = "my-static-site"
//! "static-site:hostedZoneId" = { secure = "Z0123456789" }
//! "aws:profile" = "default"
//! ```
//!
//! Keys without a namespace are looked up in the project's namespace.
//! `{ secure = "…" }` values only leave this module wrapped in [`Secret`].

use crate::error::ConfigError;
use serde::Deserialize;
use sitestack_kernel::secret::Secret;
use sitestack_kernel::GraphContext;
use std::collections::BTreeMap;
use std::fmt::{self, Debug, Formatter};
use std::path::Path;

pub const DEFAULT_PROJECT: &str = "static-site";
pub const DEFAULT_STACK: &str = "dev";

/// On-disk shape of a stack file
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StackFile {
    project: Option<String>,
    stack: Option<String>,
    #[serde(default)]
    config: BTreeMap<String, RawValue>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Plain(String),
    Secure { secure: String },
}

/// A configuration value
#[derive(Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Plain(String),
    Secure(Secret<String>),
}

impl ConfigValue {
    #[must_use]
    pub fn is_secret(&self) -> bool {
        matches!(self, ConfigValue::Secure(_))
    }
}

impl Debug for ConfigValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Plain(value) => write!(f, "Plain({value:?})"),
            ConfigValue::Secure(secret) => write!(f, "Secure({secret:?})"),
        }
    }
}

impl From<RawValue> for ConfigValue {
    fn from(raw: RawValue) -> Self {
        match raw {
            RawValue::Plain(value) => ConfigValue::Plain(value),
            RawValue::Secure { secure } => ConfigValue::Secure(Secret::new(secure)),
        }
    }
}

/// Project/stack-scoped configuration store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackConfig {
    project: String,
    stack: String,
    values: BTreeMap<String, ConfigValue>,
}

impl StackConfig {
    /// Empty configuration for `project` / `stack`
    pub fn new(project: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            stack: stack.into(),
            values: BTreeMap::new(),
        }
    }

    /// Load a stack file
    ///
    /// # Errors
    /// [`ConfigError::NotFound`] for a missing file, [`ConfigError::Io`] when
    /// it cannot be read, [`ConfigError::Parse`] for malformed TOML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let config = Self::parse(&content, &path.display().to_string())?;
        tracing::debug!(
            path = %path.display(),
            project = %config.project,
            stack = %config.stack,
            keys = config.values.len(),
            "loaded stack configuration"
        );
        Ok(config)
    }

    /// Parse stack file content
    ///
    /// # Errors
    /// [`ConfigError::Parse`] for malformed TOML or unknown top-level fields.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, "<inline>")
    }

    fn parse(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let file: StackFile = toml::from_str(content).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        Ok(Self {
            project: file.project.unwrap_or_else(|| DEFAULT_PROJECT.to_string()),
            stack: file.stack.unwrap_or_else(|| DEFAULT_STACK.to_string()),
            values: file
                .config
                .into_iter()
                .map(|(key, value)| (key, value.into()))
                .collect(),
        })
    }

    #[must_use]
    pub fn set(mut self, key: &str, value: impl Into<String>) -> Self {
        let key = self.qualify(key);
        self.values.insert(key, ConfigValue::Plain(value.into()));
        self
    }

    #[must_use]
    pub fn set_secret(mut self, key: &str, value: impl Into<String>) -> Self {
        let key = self.qualify(key);
        self.values
            .insert(key, ConfigValue::Secure(Secret::new(value.into())));
        self
    }

    #[inline]
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    #[inline]
    #[must_use]
    pub fn stack(&self) -> &str {
        &self.stack
    }

    /// Graph context for declarations made against this stack
    #[must_use]
    pub fn context(&self) -> GraphContext {
        GraphContext::new(self.project.clone(), self.stack.clone())
    }

    /// `domain` -> `<project>:domain`; qualified keys are kept
    #[must_use]
    pub fn qualify(&self, key: &str) -> String {
        if key.contains(':') {
            key.to_string()
        } else {
            format!("{}:{key}", self.project)
        }
    }

    /// Raw value lookup
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(&self.qualify(key))
    }

    /// Plain value, if present
    ///
    /// Secure values are never returned in plain form.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        match self.value(key)? {
            ConfigValue::Plain(value) => Some(value),
            ConfigValue::Secure(_) => None,
        }
    }

    /// Plain value that must be present
    ///
    /// # Errors
    /// [`ConfigError::MissingKey`] when absent, [`ConfigError::SecretAsPlain`]
    /// when the value is secure.
    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        match self.value(key) {
            Some(ConfigValue::Plain(value)) => Ok(value),
            Some(ConfigValue::Secure(_)) => Err(ConfigError::SecretAsPlain(self.qualify(key))),
            None => Err(ConfigError::MissingKey(self.qualify(key))),
        }
    }

    /// Value wrapped as secret, whether or not it was stored securely
    ///
    /// # Errors
    /// [`ConfigError::MissingKey`] when absent.
    pub fn require_secret(&self, key: &str) -> Result<Secret<String>, ConfigError> {
        match self.value(key) {
            Some(ConfigValue::Secure(secret)) => Ok(secret.clone()),
            Some(ConfigValue::Plain(value)) => Ok(Secret::new(value.clone())),
            None => Err(ConfigError::MissingKey(self.qualify(key))),
        }
    }
}

impl Default for StackConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PROJECT, DEFAULT_STACK)
    }
}

/// Parameters of one static-site deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub domain: String,
    pub bucket_name: String,
    pub hosted_zone_id: Secret<String>,
    /// AWS credential profile for the regional provider
    pub profile: Option<String>,
}

impl SiteConfig {
    /// Build a site configuration in code
    ///
    /// # Errors
    /// [`ConfigError::InvalidValue`] for an empty or malformed field.
    pub fn new(
        domain: impl Into<String>,
        bucket_name: impl Into<String>,
        hosted_zone_id: impl Into<Secret<String>>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            domain: domain.into(),
            bucket_name: bucket_name.into(),
            hosted_zone_id: hosted_zone_id.into(),
            profile: None,
        };
        config.check()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Read `domain`, `bucketName`, the secret `hostedZoneId` and the
    /// optional `aws:profile`
    ///
    /// # Errors
    /// [`ConfigError::MissingKey`] for an absent required key, or any
    /// error from [`SiteConfig::new`].
    pub fn from_stack_config(config: &StackConfig) -> Result<Self, ConfigError> {
        let site = Self {
            domain: config.require("domain")?.to_string(),
            bucket_name: config.require("bucketName")?.to_string(),
            hosted_zone_id: config.require_secret("hostedZoneId")?,
            profile: config.get("aws:profile").map(str::to_string),
        };
        site.check()?;
        Ok(site)
    }

    fn check(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, reason: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: reason.to_string(),
        };
        if self.domain.is_empty() {
            return Err(invalid("domain", "must not be empty"));
        }
        if self.bucket_name.is_empty() {
            return Err(invalid("bucketName", "must not be empty"));
        }
        if self.hosted_zone_id.expose().is_empty() {
            return Err(invalid("hostedZoneId", "must not be empty"));
        }
        Ok(())
    }

    /// `www.<domain>`
    #[must_use]
    pub fn www_domain(&self) -> String {
        format!("www.{}", self.domain)
    }

    /// `*.<domain>`
    #[must_use]
    pub fn wildcard_domain(&self) -> String {
        format!("*.{}", self.domain)
    }
}
