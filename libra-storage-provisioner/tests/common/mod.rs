//! Common test utilities and helpers

#![allow(dead_code)]

use async_trait::async_trait;
use libra_storage_common::ResourceKind;
use libra_storage_provisioner::kubernetes::error::{K8sError, K8sResult};
use libra_storage_provisioner::kubernetes::manifests::Manifest;
use libra_storage_provisioner::kubernetes::types::{ApplyOutcome, DeleteOutcome, ResourceStatus};
use libra_storage_provisioner::kubernetes::ClusterBackend;
use std::collections::HashSet;
use std::sync::Mutex;

/// In-memory cluster that records every call in order
#[derive(Default)]
pub struct RecordingBackend {
    pub calls: Mutex<Vec<String>>,
    existing: Mutex<HashSet<String>>,
    fail_on: HashSet<String>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject any operation on the named resource
    pub fn failing_on(names: &[&str]) -> Self {
        Self {
            fail_on: names.iter().map(|n| n.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.existing.lock().unwrap().contains(name)
    }

    fn record(&self, verb: &str, name: &str) -> K8sResult<()> {
        self.calls.lock().unwrap().push(format!("{} {}", verb, name));
        if self.fail_on.contains(name) {
            return Err(K8sError::Kubectl {
                verb: verb.to_string(),
                resource: name.to_string(),
                status: "exit code 1".to_string(),
                stderr: "error: admission webhook denied the request".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ClusterBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn apply(&self, manifest: &Manifest) -> K8sResult<ApplyOutcome> {
        self.record("apply", manifest.name())?;
        let created = self
            .existing
            .lock()
            .unwrap()
            .insert(manifest.name().to_string());
        Ok(if created {
            ApplyOutcome::Created
        } else {
            ApplyOutcome::Unchanged
        })
    }

    async fn status(&self, kind: ResourceKind, name: &str) -> K8sResult<ResourceStatus> {
        self.record("get", name)?;
        if self.exists(name) {
            Ok(ResourceStatus {
                kind,
                name: name.to_string(),
                present: true,
                phase: matches!(kind, ResourceKind::PersistentVolumeClaim)
                    .then(|| "Pending".to_string()),
                storage_class: None,
                capacity: None,
                volume: None,
                provisioner: None,
            })
        } else {
            Ok(ResourceStatus::missing(kind, name))
        }
    }

    async fn delete(&self, _kind: ResourceKind, name: &str) -> K8sResult<DeleteOutcome> {
        self.record("delete", name)?;
        if self.existing.lock().unwrap().remove(name) {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::NotFound)
        }
    }
}

/// Shell stand-in for kubectl.
///
/// Logs its arguments to `calls.log` and every applied document to
/// `stdin.log`. Objects it "creates" are kept as files under `objects/`.
/// A resource whose name is in `fail_on` makes it fail like a rejected apply.
#[cfg(unix)]
pub const FAKE_KUBECTL: &str = r#"#!/bin/sh
dir="$(dirname "$0")"
echo "$*" >> "$dir/calls.log"

while [ $# -gt 0 ]; do
  case "$1" in
    --kubeconfig|--context|--namespace) shift 2 ;;
    *) break ;;
  esac
done

verb="$1"
case "$verb" in
  apply)
    doc="$(cat)"
    printf '%s\n---\n' "$doc" >> "$dir/stdin.log"
    kind="$(printf '%s\n' "$doc" | sed -n 's/^kind: //p' | head -n 1)"
    name="$(printf '%s\n' "$doc" | sed -n 's/^  name: //p' | head -n 1)"
    if [ -f "$dir/fail_on" ] && grep -qx "$name" "$dir/fail_on"; then
      echo "Error from server (Forbidden): exceeded quota for $name" >&2
      exit 1
    fi
    mkdir -p "$dir/objects"
    if [ -f "$dir/objects/$name" ]; then
      echo "$kind/$name unchanged"
    else
      echo "$kind" > "$dir/objects/$name"
      echo "$kind/$name created"
    fi
    ;;
  get)
    name="$3"
    if [ -f "$dir/objects/$name.json" ]; then
      cat "$dir/objects/$name.json"
    fi
    ;;
  delete)
    name="$3"
    if [ -f "$dir/objects/$name" ]; then
      rm -f "$dir/objects/$name" "$dir/objects/$name.json"
      echo "$2 \"$name\" deleted"
    fi
    ;;
  *)
    echo "unknown command $verb" >&2
    exit 2
    ;;
esac
"#;

/// Install the fake kubectl into a fresh temporary directory
#[cfg(unix)]
pub fn install_fake_kubectl() -> (tempfile::TempDir, std::path::PathBuf) {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kubectl");
    std::fs::write(&path, FAKE_KUBECTL).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    (dir, path)
}

/// Lines the fake kubectl logged as its arguments
pub fn logged_calls(dir: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("calls.log"))
        .unwrap_or_default()
        .lines()
        .map(String::from)
        .collect()
}
