//! # seglog storage
//!
//! Durable storage primitives for one segment of an append-only commit log.
//!
//! A segment pairs two files:
//!
//! - a [`Store`], the record log: length-prefixed frames appended through a
//!   write buffer
//! - an [`Index`], a memory-mapped table of fixed-width entries mapping a
//!   record's offset relative to the segment base to its store position
//!
//! Both treat payloads as opaque bytes. Deciding when to roll to a new
//! segment, naming and placing the files, and pairing a store with its index
//! belong to the caller.
//!
//! ## Writing and reading a record
//!
//! ```rust
//! use seglog_storage::{EntryRef, Index, IndexConfig, Store};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = Store::open(&dir.path().join("0.store")).unwrap();
//! let mut index = Index::open(
//!     &dir.path().join("0.index"),
//!     &IndexConfig::new().max_entries(1024),
//! )
//! .unwrap();
//!
//! // Append to the store first, then record where the frame landed.
//! let (_, position) = store.append(b"hello").unwrap();
//! index.write(0, position).unwrap();
//!
//! let entry = index.read(EntryRef::At(0)).unwrap();
//! assert_eq!(store.read(entry.position).unwrap(), b"hello");
//!
//! index.close().unwrap();
//! store.close().unwrap();
//! ```
//!
//! ## Errors
//!
//! Every operation returns a [`StorageResult`]. Running out of index space
//! is reported as [`StorageError::IndexFull`], reading past the written data
//! as [`StorageError::EndOfData`], and any use after close as
//! [`StorageError::Closed`]. Nothing is retried internally.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
pub mod format;
mod index;
#[allow(unsafe_code)]
mod mmap;
mod store;

pub use config::{Config, IndexConfig, StoreConfig};
pub use error::{StorageError, StorageResult};
pub use format::{Entry, EntryRef, ENTRY_WIDTH, LEN_WIDTH};
pub use index::Index;
pub use store::Store;
