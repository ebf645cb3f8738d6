//! Core data models for the AR media client.
//!
//! `media` and `user` hold the canonical types handed to callers, `draft`
//! models rows of the multi-row upload form, and `wire` is the private
//! boundary where the backend's loose JSON is normalized.

pub mod draft;
pub mod media;
pub mod user;
pub(crate) mod wire;
