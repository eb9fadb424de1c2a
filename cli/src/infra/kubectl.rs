//! Infrastructure implementation of the remote cluster ports.
//!
//! `KubectlCluster<R>` routes pod lookup, exec, and copy through the `kubectl`
//! binary via a `CommandRunner`, leaving the exec stream protocol, the
//! tar-based copy, and authentication (kubeconfig or in-cluster service
//! account) to kubectl itself.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Output;

use serde::Deserialize;

use crate::application::ports::{
    CommandRunner, ExecOutput, RemoteExec, RemoteTransfer, UnitDirectory,
};
use crate::domain::config::KubectlConfig;
use crate::domain::{PortError, RemoteCommandSpec, UnitMetadata, UnitRef};
use crate::infra::command_runner::TokioCommandRunner;

/// Infrastructure adapter that routes all cluster calls through a `CommandRunner`.
///
/// Generic over `R: CommandRunner` so that tests can inject a mock runner
/// without spawning real processes.
pub struct KubectlCluster<R: CommandRunner> {
    runner: R,
    binary: String,
    context: Option<String>,
}

impl<R: CommandRunner> KubectlCluster<R> {
    /// Create an adapter with an explicit runner.
    pub fn new(runner: R, config: &KubectlConfig) -> Self {
        Self {
            runner,
            binary: config.binary.clone(),
            context: config.context.clone(),
        }
    }

    /// The runner every invocation goes through.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Global flags shared by every invocation.
    fn global_args(&self) -> Vec<String> {
        match &self.context {
            Some(context) => vec!["--context".to_string(), context.clone()],
            None => Vec::new(),
        }
    }

    async fn kubectl(&self, args: &[String]) -> Result<Output, PortError> {
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        self.runner
            .run(&self.binary, &arg_refs)
            .await
            .map_err(|e| PortError::Transport(format!("{e:#}")))
    }
}

impl KubectlCluster<TokioCommandRunner> {
    /// Convenience constructor for production use.
    #[must_use]
    pub fn default_runner(config: &KubectlConfig) -> Self {
        Self::new(TokioCommandRunner::default(), config)
    }
}

// ── Argument builders ─────────────────────────────────────────────────────────

/// `kubectl get pod <pod> --namespace <ns> --output json`.
#[must_use]
pub fn get_pod_args(namespace: &str, pod: &str) -> Vec<String> {
    ["get", "pod", pod, "--namespace", namespace, "--output", "json"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// `kubectl exec <pod> --namespace <ns> --container <c> [-i] [-t] -- <argv>`.
#[must_use]
pub fn exec_args(unit: UnitRef<'_>, spec: &RemoteCommandSpec) -> Vec<String> {
    let mut args: Vec<String> = [
        "exec",
        unit.pod,
        "--namespace",
        unit.namespace,
        "--container",
        unit.container,
    ]
    .into_iter()
    .map(str::to_string)
    .collect();
    if spec.attach_stdin {
        args.push("--stdin".to_string());
    }
    if spec.allocate_tty {
        args.push("--tty".to_string());
    }
    args.push("--".to_string());
    args.extend(spec.argv.iter().cloned());
    args
}

/// `kubectl cp <local> <ns>/<pod>:<remote> --container <c>`.
#[must_use]
pub fn copy_args(unit: UnitRef<'_>, local: &Path, remote: &str) -> Vec<String> {
    vec![
        "cp".to_string(),
        local.to_string_lossy().into_owned(),
        format!("{}/{}:{remote}", unit.namespace, unit.pod),
        "--container".to_string(),
        unit.container.to_string(),
    ]
}

// ── Pod JSON ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct PodManifest {
    spec: PodSpec,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PodSpec {
    #[serde(default)]
    containers: Vec<ContainerSpec>,
    #[serde(default)]
    node_selector: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct ContainerSpec {
    name: String,
}

/// Extract container names and node selector from `kubectl get pod -o json`.
///
/// # Errors
///
/// Returns `PortError::Transport` if the output is not a pod manifest.
pub fn parse_pod(json: &[u8]) -> Result<UnitMetadata, PortError> {
    let pod: PodManifest = serde_json::from_slice(json)
        .map_err(|e| PortError::Transport(format!("invalid pod JSON from kubectl: {e}")))?;
    Ok(UnitMetadata {
        containers: pod.spec.containers.into_iter().map(|c| c.name).collect(),
        node_selector: pod.spec.node_selector,
    })
}

fn is_not_found(stderr: &str) -> bool {
    stderr.contains("(NotFound)")
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

// ── Port implementations ──────────────────────────────────────────────────────

impl<R: CommandRunner> UnitDirectory for KubectlCluster<R> {
    async fn get_unit(&self, namespace: &str, pod: &str) -> Result<UnitMetadata, PortError> {
        let mut args = self.global_args();
        args.extend(get_pod_args(namespace, pod));
        let output = self.kubectl(&args).await?;
        if !output.status.success() {
            let stderr = stderr_of(&output);
            if is_not_found(&stderr) {
                return Err(PortError::NotFound {
                    namespace: namespace.to_string(),
                    pod: pod.to_string(),
                });
            }
            return Err(PortError::Transport(format!("kubectl get pod: {stderr}")));
        }
        parse_pod(&output.stdout)
    }
}

impl<R: CommandRunner> RemoteExec for KubectlCluster<R> {
    async fn run(
        &self,
        unit: UnitRef<'_>,
        spec: &RemoteCommandSpec,
    ) -> Result<ExecOutput, PortError> {
        let mut args = self.global_args();
        args.extend(exec_args(unit, spec));
        let output = self.kubectl(&args).await?;
        if !output.status.success() {
            return Err(PortError::NonZeroExit {
                code: output.status.code(),
                stderr: stderr_of(&output),
            });
        }
        let keep = |wanted: bool, bytes: &[u8]| {
            if wanted {
                String::from_utf8_lossy(bytes).into_owned()
            } else {
                String::new()
            }
        };
        Ok(ExecOutput {
            stdout: keep(spec.capture_stdout, &output.stdout),
            stderr: keep(spec.capture_stderr, &output.stderr),
        })
    }
}

impl<R: CommandRunner> RemoteTransfer for KubectlCluster<R> {
    async fn copy_into(
        &self,
        unit: UnitRef<'_>,
        local: &Path,
        remote: &str,
    ) -> Result<(), PortError> {
        let meta = tokio::fs::metadata(local).await?;
        if !meta.is_file() {
            return Err(PortError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a file", local.display()),
            )));
        }
        let mut args = self.global_args();
        args.extend(copy_args(unit, local, remote));
        let output = self.kubectl(&args).await?;
        if !output.status.success() {
            return Err(PortError::Transport(format!(
                "kubectl cp: {}",
                stderr_of(&output)
            )));
        }
        Ok(())
    }
}
