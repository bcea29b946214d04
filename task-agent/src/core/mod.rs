//! Deterministic, pure logic for the task agent.
//!
//! Core modules must be free of I/O side effects. They operate on strings and
//! return deterministic outputs suitable for tests.

pub mod answer;
pub mod artifact;
pub mod extract;
pub mod plan;
pub mod types;
