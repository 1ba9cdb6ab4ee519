//! # Quire Testkit
//!
//! Test utilities for Quire.
//!
//! This crate provides:
//! - Temporary on-disk modules and a module writer
//! - A spy backend that counts state and activation calls and injects failures
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quire_testkit::prelude::*;
//!
//! #[test]
//! fn reads_genesis() {
//!     with_test_module(|module| {
//!         let backend = module.backend();
//!         // ... read operations
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod spy;
pub mod writer;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::spy::*;
    pub use crate::writer::*;
}

pub use fixtures::*;
pub use generators::*;
pub use spy::*;
pub use writer::*;
