//! Core types, invariants and engine for the bitemporal version store.
//!
//! Every fact about an entity is a [`version::Version`] carrying two
//! intervals: when it was true in the world, and when the store believed it.
//! History is never rewritten; revisions close old versions in transaction
//! time and append new ones.
//!
//! This crate has no database or HTTP dependencies. Storage backends
//! implement [`store::VersionStore`]; [`memory::MemoryStore`] is the
//! in-process one.

pub mod clock;
pub mod engine;
pub mod error;
pub mod guard;
pub mod interval;
pub mod invariant;
pub mod lifecycle;
pub mod memory;
pub mod query;
pub mod store;
pub mod version;

pub use engine::Engine;
pub use error::{Error, Result};
