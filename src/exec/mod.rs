// src/exec/mod.rs

//! Process execution layer.
//!
//! The engine itself only knows about the [`Task`](crate::task::Task)
//! trait; this module provides the one concrete implementation the CLI
//! driver needs: [`command::CommandTask`], which runs a shell command via
//! `tokio::process::Command` and reports its declared events on success.

pub mod command;

pub use command::CommandTask;
