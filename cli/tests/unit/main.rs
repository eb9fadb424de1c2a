//! Unit tests for the procdump CLI
//!
//! These tests use mocked ports and run fast without external I/O.

mod dump_orchestrator;
mod helpers;
