//! Core domain types
//!
//! These types are shared by the agent (which buffers and persists them) and
//! any tooling that reads persisted documents back.

pub mod document;
pub mod log;
