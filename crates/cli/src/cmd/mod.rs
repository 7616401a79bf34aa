//! CLI command implementations

pub mod config;
pub mod copy;
pub mod equal;
pub mod merge;
pub mod pack;
pub mod scheme;
pub mod ua;
pub mod url;
