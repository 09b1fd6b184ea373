//! Core abstractions for fott: project models, security tokens and the storage contract.
//! This crate is intentionally small to keep dependency surface minimal.

pub mod project;
pub mod storage;
pub mod tokens;
