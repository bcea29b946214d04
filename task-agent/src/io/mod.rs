//! I/O helpers: processes, the model backend, artifacts, config and the terminal.

pub mod artifact;
pub mod config;
pub mod console;
pub mod model;
pub mod process;
pub mod prompt;
