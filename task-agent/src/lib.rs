//! Interactive assistant that asks a local language model for a plan and
//! code, shows both, and runs the code once the user approves.
//!
//! - **[`core`]**: Pure logic (code extraction, plan isolation, artifact
//!   naming, answer parsing). No I/O.
//! - **[`io`]**: Side effects (processes, the model command, files, config,
//!   the terminal), each behind a small seam so tests can substitute it.
//!
//! [`planner`] and [`session`] combine the two into the approve → execute →
//! feedback → retry loop.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod planner;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
