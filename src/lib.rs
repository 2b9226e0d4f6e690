//! Code Companion - workspace-aware AI chat for your editor
//!
//! The context engine (`context`) decides which workspace files accompany a
//! question; the session (`session`) pairs it with a model client and a
//! transcript. The CLI and terminal UI are thin front ends over both.

pub mod ai;
pub mod cli;
pub mod config;
pub mod context;
pub mod session;
pub mod ui;
