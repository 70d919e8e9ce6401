#![allow(clippy::enum_variant_names)]

//! Headless core of a texture-authoring project browser.
//!
//! Owns the project directory scanner (with material classification and
//! folder denylisting), the per-project tree cache, the live tree filter,
//! and the refresh bridge that reacts to resync requests and finished
//! extraction jobs. The desktop shell talks to it through the
//! [`commands`] surface; `src/main.rs` wraps the same surface in a small
//! CLI for headless inspection.

pub mod app;
pub mod bridge;
pub mod cli;
pub mod commands;
pub mod filter;
pub mod registry;
pub mod scanner;
pub mod session;
pub mod tree;
