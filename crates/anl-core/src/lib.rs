//! # anl-core
//!
//! Core types and error types for annoloop.
//!
//! This crate provides the foundational types shared across all annoloop crates:
//! - Project and IDOL query definitions
//! - The JSONL staging record exchanged between IDOL and Doccano
//! - Training examples and their annotation shapes
//! - Operation outcomes printed by the CLI
//! - Cross-cutting error types

pub mod errors;
pub mod outcomes;
pub mod project;
pub mod query;
pub mod staging;
pub mod training;
