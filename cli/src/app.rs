//! Application context — unified state passed to every command handler.
//!
//! Adding a new cross-cutting concern requires only one field change here;
//! command signatures stay the same.

use std::path::PathBuf;

use crate::infra::config::YamlConfigStore;
use crate::output::OutputContext;
use crate::output::human::HumanRenderer;

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
    /// Explicit configuration file.
    pub config: Option<PathBuf>,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    ///
    /// Quiet in JSON mode so progress never mixes with the JSON document.
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Tuning configuration store.
    pub config_store: YamlConfigStore,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    #[must_use]
    pub fn new(flags: AppFlags) -> Self {
        let mode = if flags.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        let config_store = flags
            .config
            .map_or_else(YamlConfigStore::default, YamlConfigStore::at);
        Self {
            output: OutputContext::new(flags.no_color, flags.quiet || flags.json),
            mode,
            config_store,
        }
    }

    /// Whether commands should emit a single JSON document.
    #[must_use]
    pub fn json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Human renderer over this context's output.
    #[must_use]
    pub fn human(&self) -> HumanRenderer<'_> {
        HumanRenderer::new(&self.output)
    }
}
