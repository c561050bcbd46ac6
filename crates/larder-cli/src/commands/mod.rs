//! CLI command handlers

pub mod claims;
pub mod policy;
