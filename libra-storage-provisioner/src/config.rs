//! Configuration management for the Libra storage provisioner
//!
//! Settings are loaded from:
//! 1. Environment variables (highest priority)
//! 2. Configuration file (TOML format)
//! 3. Default values (lowest priority)
//!
//! The defaults describe the Libra test network layout: one io1-backed
//! `teststorageclass` and thirty 50Gi claims per node role.

use crate::kubernetes::types::{PvcRequest, StorageClassRequest};
use crate::logging::LoggingConfig;
use libra_storage_common::validation::{
    validate_access_mode, validate_label, validate_namespace, validate_quantity,
    validate_resource_name,
};
use libra_storage_common::{
    NodeRole, ProvisionPlan, DEFAULT_CLAIMS_PER_ROLE, DEFAULT_CLAIM_STORAGE,
    DEFAULT_STORAGE_CLASS, LIBRA_NODE_LABEL,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// StorageClass reclaim policies accepted for dynamically provisioned volumes
const RECLAIM_POLICIES: [&str; 2] = ["Delete", "Retain"];

const VOLUME_BINDING_MODES: [&str; 2] = ["Immediate", "WaitForFirstConsumer"];

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// StorageClass configuration
    pub storage_class: StorageClassConfig,
    /// Node claim configuration
    pub claims: ClaimConfig,
    /// kubectl invocation
    pub kubectl: KubectlConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// StorageClass configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageClassConfig {
    /// StorageClass name referenced by every claim
    pub name: String,
    /// Volume provisioner
    pub provisioner: String,
    /// EBS volume type (`parameters.type`)
    pub volume_type: String,
    /// Provisioned IOPS per GiB (`parameters.iopsPerGB`)
    pub iops_per_gb: String,
    pub reclaim_policy: String,
    pub volume_binding_mode: String,
    pub allow_volume_expansion: bool,
    /// Additional provisioner parameters (e.g. `fsType`, `encrypted`)
    pub extra_parameters: BTreeMap<String, String>,
}

/// PersistentVolumeClaim configuration, shared by both node roles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimConfig {
    /// Claims per node role
    pub count: u32,
    /// Requested storage per claim
    pub storage: String,
    pub access_modes: Vec<String>,
    pub labels: BTreeMap<String, String>,
    /// Target namespace; kubectl's current namespace when unset
    pub namespace: Option<String>,
}

/// kubectl configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KubectlConfig {
    /// kubectl binary name or path
    pub binary: PathBuf,
    /// Kubeconfig file; kubectl's own resolution when unset
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context; the current context when unset
    pub context: Option<String>,
}

impl Default for StorageClassConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_STORAGE_CLASS.to_string(),
            provisioner: "kubernetes.io/aws-ebs".to_string(),
            volume_type: "io1".to_string(),
            iops_per_gb: "50".to_string(),
            reclaim_policy: "Delete".to_string(),
            volume_binding_mode: "WaitForFirstConsumer".to_string(),
            allow_volume_expansion: true,
            extra_parameters: BTreeMap::new(),
        }
    }
}

impl Default for ClaimConfig {
    fn default() -> Self {
        let mut labels = BTreeMap::new();
        labels.insert(LIBRA_NODE_LABEL.to_string(), "true".to_string());

        Self {
            count: DEFAULT_CLAIMS_PER_ROLE,
            storage: DEFAULT_CLAIM_STORAGE.to_string(),
            access_modes: vec!["ReadWriteOnce".to_string()],
            labels,
            namespace: None,
        }
    }
}

impl Default for KubectlConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("kubectl"),
            kubeconfig: None,
            context: None,
        }
    }
}

impl StorageClassConfig {
    pub fn to_request(&self) -> StorageClassRequest {
        let mut parameters = self.extra_parameters.clone();
        parameters.insert("type".to_string(), self.volume_type.clone());
        parameters.insert("iopsPerGB".to_string(), self.iops_per_gb.clone());

        StorageClassRequest {
            name: self.name.clone(),
            provisioner: self.provisioner.clone(),
            reclaim_policy: Some(self.reclaim_policy.clone()),
            volume_binding_mode: Some(self.volume_binding_mode.clone()),
            allow_volume_expansion: self.allow_volume_expansion,
            parameters,
            labels: BTreeMap::new(),
        }
    }
}

impl ClaimConfig {
    /// Claim request for node `index` of `role`
    pub fn request_for(&self, role: NodeRole, index: u32, storage_class: &str) -> PvcRequest {
        PvcRequest {
            name: role.claim_name(index),
            namespace: self.namespace.clone(),
            storage_class: Some(storage_class.to_string()),
            access_modes: self.access_modes.clone(),
            storage: self.storage.clone(),
            labels: self.labels.clone(),
        }
    }
}

impl ProvisionConfig {
    /// Load configuration from defaults, a config file and the environment.
    ///
    /// An explicitly given `path` must exist; otherwise the standard
    /// locations are searched and a missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => match Self::find_config_file() {
                Some(found) => {
                    tracing::debug!(path = %found.display(), "Using configuration file");
                    Self::load_from_file(&found)?
                }
                None => Self::default(),
            },
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_path_buf(), e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            std::env::var("LIBRA_STORAGE_CONFIG").ok().map(PathBuf::from),
            Some(PathBuf::from("/etc/libra-storage/config.toml")),
            Some(PathBuf::from("./libra-storage.toml")),
        ];

        paths.into_iter().flatten().find(|p| p.exists())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // StorageClass
        if let Some(name) = lookup("LIBRA_STORAGE_CLASS_NAME") {
            self.storage_class.name = name;
        }
        if let Some(iops) = lookup("LIBRA_STORAGE_IOPS_PER_GB") {
            self.storage_class.iops_per_gb = iops;
        }

        // Claims
        if let Some(size) = lookup("LIBRA_STORAGE_SIZE") {
            self.claims.storage = size;
        }
        if let Some(count) = lookup("LIBRA_STORAGE_CLAIM_COUNT") {
            self.claims.count = count.trim().parse().map_err(|_| {
                ConfigError::Validation(format!(
                    "LIBRA_STORAGE_CLAIM_COUNT must be a non-negative integer, got '{}'",
                    count
                ))
            })?;
        }
        if let Some(namespace) = lookup("LIBRA_STORAGE_NAMESPACE") {
            self.claims.namespace = Some(namespace).filter(|ns| !ns.is_empty());
        }

        // kubectl
        if let Some(binary) = lookup("LIBRA_STORAGE_KUBECTL") {
            self.kubectl.binary = PathBuf::from(binary);
        }
        if let Some(path) = lookup("LIBRA_STORAGE_KUBECONFIG") {
            self.kubectl.kubeconfig = Some(PathBuf::from(path));
        }
        if let Some(context) = lookup("LIBRA_STORAGE_CONTEXT") {
            self.kubectl.context = Some(context);
        }

        // Logging
        if let Some(level) = lookup("LIBRA_STORAGE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(dir) = lookup("LIBRA_STORAGE_LOG_DIR") {
            self.logging.log_dir = Some(PathBuf::from(dir));
        }

        Ok(())
    }

    /// Layout of the resources this configuration provisions
    pub fn plan(&self) -> ProvisionPlan {
        ProvisionPlan::new(self.storage_class.name.clone(), self.claims.count)
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sc = &self.storage_class;
        validate_resource_name("StorageClass", &sc.name)?;

        if sc.provisioner.is_empty() {
            return Err(ConfigError::Validation(
                "StorageClass provisioner cannot be empty".to_string(),
            ));
        }

        if sc.iops_per_gb.parse::<u32>().map(|v| v == 0).unwrap_or(true) {
            return Err(ConfigError::Validation(format!(
                "iops_per_gb must be a positive integer, got '{}'",
                sc.iops_per_gb
            )));
        }

        if !RECLAIM_POLICIES.contains(&sc.reclaim_policy.as_str()) {
            return Err(ConfigError::Validation(format!(
                "reclaim_policy must be one of {}, got '{}'",
                RECLAIM_POLICIES.join(", "),
                sc.reclaim_policy
            )));
        }

        if !VOLUME_BINDING_MODES.contains(&sc.volume_binding_mode.as_str()) {
            return Err(ConfigError::Validation(format!(
                "volume_binding_mode must be one of {}, got '{}'",
                VOLUME_BINDING_MODES.join(", "),
                sc.volume_binding_mode
            )));
        }

        let claims = &self.claims;
        if claims.count == 0 {
            return Err(ConfigError::Validation(
                "Claim count must be at least 1".to_string(),
            ));
        }

        validate_quantity(&claims.storage)?;

        if claims.access_modes.is_empty() {
            return Err(ConfigError::Validation(
                "At least one access mode is required".to_string(),
            ));
        }
        for mode in &claims.access_modes {
            validate_access_mode(mode)?;
        }

        for (key, value) in &claims.labels {
            validate_label(key, value)?;
        }

        if let Some(namespace) = &claims.namespace {
            validate_namespace(namespace)?;
        }

        // The longest generated name has the highest index
        for role in NodeRole::ALL {
            validate_resource_name("PersistentVolumeClaim", &role.claim_name(claims.count - 1))?;
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("Failed to read config file {0:?}: {1}")]
    FileRead(PathBuf, String),

    /// Failed to parse configuration
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// Configuration validation failed
    #[error("Config validation failed: {0}")]
    Validation(String),
}

impl From<libra_storage_common::Error> for ConfigError {
    fn from(err: libra_storage_common::Error) -> Self {
        match err {
            libra_storage_common::Error::Validation(msg) => ConfigError::Validation(msg),
        }
    }
}
