//! External process module
//!
//! Runs external commands with merged, line-streamed output and opens
//! URLs through the platform handler.

pub mod invocation;
pub mod opener;
pub mod runner;

// Public re-exports
pub use invocation::{Invocation, InvocationResult};
pub use opener::{SystemOpener, UrlOpener};
pub use runner::{CommandRunner, SystemRunner};
