//! Logship Core
//!
//! Core types for the Logship log-shipping agent.
//!
//! This crate contains:
//! - Domain types: log entries and the documents they are batched into
//! - Codec: conversion between entry batches and the document wire format

pub mod codec;
pub mod domain;

pub use codec::{CodecError, DATE_FORMAT, DOCUMENT_TYPE, decode, encode, encode_entries};
pub use domain::document::{DocumentEntry, LogDocument};
pub use domain::log::LogEntry;
