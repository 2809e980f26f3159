//! CLI command handlers. Each command is in its own file.

mod policy;
mod send;

pub use policy::run_policy;
pub use send::run_send;
