//! # seglog testkit
//!
//! Test utilities for seglog.
//!
//! This crate provides:
//! - Fixtures that open stores and indexes in temporary directories
//! - Property-based test generators using proptest
//! - On-disk format vectors for the store frame and index entry
//! - Stress helpers for concurrent appends and reads
//!
//! ## Usage
//!
//! ```rust
//! use seglog_testkit::prelude::*;
//!
//! with_temp_store(|store| {
//!     let (_, position) = store.append(b"hello").unwrap();
//!     assert_eq!(store.read(position).unwrap(), b"hello");
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
pub use vectors::*;
