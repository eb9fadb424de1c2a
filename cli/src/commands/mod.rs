//! Command implementations

pub mod config;
pub mod dump;
pub mod ps;
pub mod version;

use clap::Args;

use crate::domain::DumpRequest;

/// Which pod and container a command addresses.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Namespace of the pod
    #[arg(long, env = "NAMESPACE", default_value = "default")]
    pub namespace: String,

    /// Name of the pod
    #[arg(long, env = "POD_NAME")]
    pub pod: Option<String>,

    /// Container in the pod [default: the first one]
    #[arg(long, env = "CONTAINER_NAME")]
    pub container: Option<String>,
}

impl TargetArgs {
    /// Request without a process selector.
    #[must_use]
    pub fn to_request(&self) -> DumpRequest {
        DumpRequest {
            namespace: self.namespace.clone(),
            pod: self.pod.clone().unwrap_or_default(),
            container: self.container.clone().unwrap_or_default(),
            process_name: String::new(),
            process_id: String::new(),
        }
    }
}
