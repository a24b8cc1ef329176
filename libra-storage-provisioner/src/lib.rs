//! Libra storage provisioner
//!
//! Renders the StorageClass and node PersistentVolumeClaims a Libra test
//! network needs and submits them to a Kubernetes cluster, either through
//! `kubectl apply -f-` or directly through the Kubernetes API.

pub mod config;
pub mod kubernetes;
pub mod logging;
pub mod provision;

pub use config::{ConfigError, ProvisionConfig};
pub use provision::{FailurePolicy, ProvisionReport, Provisioner};
