//! CLI command handlers.

mod mirror;
mod serve;

pub use mirror::run_mirror;
pub use serve::run_serve;
