//! `TerminalReporter` — Presentation-layer implementation of `ProgressReporter`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::ProgressReporter`
//! trait so the dump orchestrator can emit progress events without depending on
//! any presentation type directly.

use std::sync::Mutex;

use indicatif::ProgressBar;

use crate::application::ports::ProgressReporter;
use crate::output::{OutputContext, progress};

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// On a TTY each `step()` runs a spinner until the next event; otherwise
/// steps print as `"  → {message}"`. Everything is suppressed when `ctx.quiet`.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    spinner: Mutex<Option<ProgressBar>>,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            spinner: Mutex::new(None),
        }
    }

    fn take_spinner(&self) -> Option<ProgressBar> {
        self.spinner.lock().ok().and_then(|mut slot| slot.take())
    }

    fn settle(&self) {
        if let Some(pb) = self.take_spinner() {
            progress::finish_step(&pb);
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        self.settle();
        if !self.ctx.show_progress() {
            if !self.ctx.quiet {
                println!("  → {message}");
            }
            return;
        }
        if let Ok(mut slot) = self.spinner.lock() {
            *slot = Some(progress::spinner(message));
        }
    }

    fn success(&self, message: &str) {
        match self.take_spinner() {
            Some(pb) => progress::finish_ok(&pb, message),
            None => self.ctx.success(message),
        }
    }

    fn warn(&self, message: &str) {
        self.settle();
        self.ctx.warn(message);
    }

    fn diagnostic(&self, title: &str, body: &str) {
        self.settle();
        if body.trim().is_empty() {
            return;
        }
        self.ctx.header(&format!("{title}:"));
        self.ctx.block(body);
    }
}

impl Drop for TerminalReporter<'_> {
    fn drop(&mut self) {
        if let Some(pb) = self.take_spinner() {
            pb.finish_and_clear();
        }
    }
}
