//! Validation of Kubernetes names, quantities and labels
//!
//! Catches configuration mistakes before anything is submitted to the cluster.

use crate::Error;
use regex::Regex;
use std::sync::LazyLock;

/// Maximum length of a DNS-1123 subdomain (object names)
pub const MAX_SUBDOMAIN_LENGTH: usize = 253;
/// Maximum length of a DNS-1123 label (namespaces)
pub const MAX_LABEL_LENGTH: usize = 63;

/// Access modes a PersistentVolumeClaim may request
pub const ACCESS_MODES: &[&str] = &[
    "ReadWriteOnce",
    "ReadOnlyMany",
    "ReadWriteMany",
    "ReadWriteOncePod",
];

static DNS_SUBDOMAIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$").unwrap()
});

static DNS_LABEL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").unwrap()
});

static QUANTITY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+(\.[0-9]+)?(Ki|Mi|Gi|Ti|Pi|Ei|k|M|G|T|P|E)?$").unwrap()
});

static LABEL_VALUE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9]([-A-Za-z0-9_.]*[A-Za-z0-9])?)?$").unwrap()
});

pub type ValidationResult<T> = Result<T, Error>;

/// Validate an object name (StorageClass, PersistentVolumeClaim)
pub fn validate_resource_name(what: &str, name: &str) -> ValidationResult<()> {
    if name.is_empty() {
        return Err(Error::Validation(format!("{} name cannot be empty", what)));
    }

    if name.len() > MAX_SUBDOMAIN_LENGTH {
        return Err(Error::Validation(format!(
            "{} name '{}' too long (max {} characters)",
            what, name, MAX_SUBDOMAIN_LENGTH
        )));
    }

    if !DNS_SUBDOMAIN_REGEX.is_match(name) {
        return Err(Error::Validation(format!(
            "{} name '{}' must consist of lower case alphanumeric characters, '-' or '.'",
            what, name
        )));
    }

    Ok(())
}

pub fn validate_namespace(namespace: &str) -> ValidationResult<()> {
    if namespace.is_empty() || namespace.len() > MAX_LABEL_LENGTH {
        return Err(Error::Validation(format!(
            "Namespace '{}' must be 1-{} characters",
            namespace, MAX_LABEL_LENGTH
        )));
    }

    if !DNS_LABEL_REGEX.is_match(namespace) {
        return Err(Error::Validation(format!(
            "Namespace '{}' must be a DNS-1123 label",
            namespace
        )));
    }

    Ok(())
}

/// Validate a resource quantity such as `50Gi`
pub fn validate_quantity(quantity: &str) -> ValidationResult<()> {
    if !QUANTITY_REGEX.is_match(quantity) {
        return Err(Error::Validation(format!(
            "Invalid storage quantity '{}' (expected e.g. 50Gi)",
            quantity
        )));
    }

    if quantity
        .trim_end_matches(|c: char| c.is_ascii_alphabetic())
        .parse::<f64>()
        .map(|v| v <= 0.0)
        .unwrap_or(true)
    {
        return Err(Error::Validation(format!(
            "Storage quantity '{}' must be greater than zero",
            quantity
        )));
    }

    Ok(())
}

pub fn validate_access_mode(mode: &str) -> ValidationResult<()> {
    if !ACCESS_MODES.contains(&mode) {
        return Err(Error::Validation(format!(
            "Unknown access mode '{}' (expected one of {})",
            mode,
            ACCESS_MODES.join(", ")
        )));
    }
    Ok(())
}

/// Validate a label key and value pair
pub fn validate_label(key: &str, value: &str) -> ValidationResult<()> {
    let name = match key.rsplit_once('/') {
        Some((prefix, name)) => {
            validate_resource_name("Label prefix", prefix)?;
            name
        }
        None => key,
    };

    if name.is_empty() || name.len() > MAX_LABEL_LENGTH || !LABEL_VALUE_REGEX.is_match(name) {
        return Err(Error::Validation(format!("Invalid label key '{}'", key)));
    }

    if value.len() > MAX_LABEL_LENGTH || !LABEL_VALUE_REGEX.is_match(value) {
        return Err(Error::Validation(format!(
            "Invalid value '{}' for label '{}'",
            value, key
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_names() {
        assert!(validate_resource_name("StorageClass", "teststorageclass").is_ok());
        assert!(validate_resource_name("PersistentVolumeClaim", "fullnode-29-0").is_ok());
        assert!(validate_resource_name("StorageClass", "ebs.io1").is_ok());

        assert!(validate_resource_name("StorageClass", "").is_err());
        assert!(validate_resource_name("StorageClass", "Test").is_err());
        assert!(validate_resource_name("StorageClass", "-bad").is_err());
        assert!(validate_resource_name("StorageClass", "under_score").is_err());
        assert!(validate_resource_name("StorageClass", &"a".repeat(254)).is_err());
    }

    #[test]
    fn test_namespaces() {
        assert!(validate_namespace("libra").is_ok());
        assert!(validate_namespace("with.dot").is_err());
        assert!(validate_namespace(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_quantities() {
        assert!(validate_quantity("50Gi").is_ok());
        assert!(validate_quantity("1.5Ti").is_ok());
        assert!(validate_quantity("1000").is_ok());

        assert!(validate_quantity("0Gi").is_err());
        assert!(validate_quantity("50GB").is_err());
        assert!(validate_quantity("Gi").is_err());
        assert!(validate_quantity("-5Gi").is_err());
    }

    #[test]
    fn test_access_modes() {
        assert!(validate_access_mode("ReadWriteOnce").is_ok());
        assert!(validate_access_mode("ReadWriteSometimes").is_err());
    }

    #[test]
    fn test_labels() {
        assert!(validate_label("libra-node", "true").is_ok());
        assert!(validate_label("app.kubernetes.io/part-of", "libra").is_ok());
        assert!(validate_label("libra-node", "").is_ok());

        assert!(validate_label("", "true").is_err());
        assert!(validate_label("libra node", "true").is_err());
        assert!(validate_label("libra-node", "not ok").is_err());
    }
}
