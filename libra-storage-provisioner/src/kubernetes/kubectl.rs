//! kubectl backend
//!
//! Submits manifests with `kubectl apply -f-`, writing the YAML document to
//! the child's stdin. Reads and deletes go through `kubectl get` and
//! `kubectl delete`.

use crate::config::KubectlConfig;
use crate::kubernetes::config_storage::{pvcs, storageclasses};
use crate::kubernetes::error::{K8sError, K8sResult};
use crate::kubernetes::manifests::Manifest;
use crate::kubernetes::types::{ApplyOutcome, DeleteOutcome, ResourceStatus};
use crate::kubernetes::ClusterBackend;
use async_trait::async_trait;
use libra_storage_common::ResourceKind;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Cluster backend driving the kubectl CLI
#[derive(Debug, Clone)]
pub struct KubectlBackend {
    binary: PathBuf,
    kubeconfig: Option<PathBuf>,
    context: Option<String>,
    namespace: Option<String>,
}

impl KubectlBackend {
    pub fn new(config: &KubectlConfig, namespace: Option<String>) -> Self {
        Self {
            binary: config.binary.clone(),
            kubeconfig: config.kubeconfig.clone(),
            context: config.context.clone(),
            namespace,
        }
    }

    /// Base command with the connection flags shared by every verb
    fn command(&self, kind: ResourceKind) -> Command {
        let mut cmd = Command::new(&self.binary);

        if let Some(kubeconfig) = &self.kubeconfig {
            cmd.arg("--kubeconfig").arg(kubeconfig);
        }
        if let Some(context) = &self.context {
            cmd.arg("--context").arg(context);
        }
        if kind.is_namespaced() {
            if let Some(namespace) = &self.namespace {
                cmd.arg("--namespace").arg(namespace);
            }
        }

        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        cmd
    }

    async fn run(&self, mut cmd: Command, stdin: Option<&[u8]>) -> K8sResult<Output> {
        let binary = self.binary.display().to_string();
        let spawn_err = |source| K8sError::KubectlSpawn {
            binary: binary.clone(),
            source,
        };

        cmd.stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        let mut child = cmd.spawn().map_err(spawn_err)?;

        if let Some(input) = stdin {
            let mut pipe = child
                .stdin
                .take()
                .ok_or_else(|| K8sError::Internal("kubectl stdin not captured".to_string()))?;
            // kubectl may exit before reading its input; its exit status says why
            if let Err(e) = pipe.write_all(input).await {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(spawn_err(e));
                }
            }
            // Closing stdin marks the end of the manifest
            drop(pipe);
        }

        child.wait_with_output().await.map_err(spawn_err)
    }

    fn check(verb: &str, resource: &str, output: &Output) -> K8sResult<()> {
        if output.status.success() {
            return Ok(());
        }

        let status = match output.status.code() {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        };

        Err(K8sError::Kubectl {
            verb: verb.to_string(),
            resource: resource.to_string(),
            status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    /// Pipe one YAML document into `kubectl apply -f-`
    pub async fn apply_yaml(
        &self,
        kind: ResourceKind,
        resource: &str,
        yaml: &str,
    ) -> K8sResult<ApplyOutcome> {
        let mut cmd = self.command(kind);
        cmd.arg("apply").arg("-f-");

        let output = self.run(cmd, Some(yaml.as_bytes())).await?;
        Self::check("apply", resource, &output)?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_apply_outcome(&stdout))
    }

    /// `kubectl get -o json`; `None` when the resource does not exist
    async fn get_json(&self, kind: ResourceKind, name: &str) -> K8sResult<Option<Vec<u8>>> {
        let mut cmd = self.command(kind);
        cmd.arg("get")
            .arg(kind.kubectl_resource())
            .arg(name)
            .arg("--ignore-not-found")
            .arg("--output")
            .arg("json");

        let output = self.run(cmd, None).await?;
        Self::check("get", &format!("{}/{}", kind.kubectl_resource(), name), &output)?;

        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            Ok(None)
        } else {
            Ok(Some(output.stdout))
        }
    }
}

/// Parse the outcome word from kubectl's `<kind>/<name> <outcome>` line
pub fn parse_apply_outcome(stdout: &str) -> ApplyOutcome {
    let word = stdout
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .and_then(|line| line.split_whitespace().last())
        .unwrap_or_default();

    match word {
        "created" => ApplyOutcome::Created,
        "configured" => ApplyOutcome::Configured,
        "unchanged" => ApplyOutcome::Unchanged,
        _ => ApplyOutcome::Applied,
    }
}

#[async_trait]
impl ClusterBackend for KubectlBackend {
    fn name(&self) -> &'static str {
        "kubectl"
    }

    async fn apply(&self, manifest: &Manifest) -> K8sResult<ApplyOutcome> {
        let yaml = manifest.to_yaml()?;
        self.apply_yaml(manifest.kind(), &manifest.display_name(), &yaml)
            .await
    }

    async fn status(&self, kind: ResourceKind, name: &str) -> K8sResult<ResourceStatus> {
        let Some(json) = self.get_json(kind, name).await? else {
            return Ok(ResourceStatus::missing(kind, name));
        };

        let status: ResourceStatus = match kind {
            ResourceKind::StorageClass => {
                let sc = serde_json::from_slice(&json)?;
                storageclasses::storage_class_to_info(sc).into()
            }
            ResourceKind::PersistentVolumeClaim => {
                let pvc = serde_json::from_slice(&json)?;
                pvcs::pvc_to_info(pvc).into()
            }
        };

        Ok(status)
    }

    async fn delete(&self, kind: ResourceKind, name: &str) -> K8sResult<DeleteOutcome> {
        let mut cmd = self.command(kind);
        cmd.arg("delete")
            .arg(kind.kubectl_resource())
            .arg(name)
            .arg("--ignore-not-found");

        let output = self.run(cmd, None).await?;
        Self::check("delete", &format!("{}/{}", kind.kubectl_resource(), name), &output)?;

        // --ignore-not-found prints nothing when there was nothing to delete
        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            Ok(DeleteOutcome::NotFound)
        } else {
            Ok(DeleteOutcome::Deleted)
        }
    }
}
