//! CLI command implementations.

pub mod create;
pub mod info;
pub mod read;
