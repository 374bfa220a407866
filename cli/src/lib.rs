//! Shared command implementations for the `policy-setup` and `policy-preset` binaries.

pub mod commands;
pub mod utils;
