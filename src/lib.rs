//! Client library for the VisAlive AR media backend.
//!
//! The backend owns auth, persistence and file storage; this crate wraps its
//! HTTP API, composes shareable QR images locally and drives the multi-row
//! upload workflow. The `visalive` binary exposes all of it as subcommands.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
