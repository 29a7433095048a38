//! Domain model for the discussion forest.
//!
//! # Responsibility
//! - Define canonical data structures used by core engine logic.
//! - Keep the path-key ordering semantics in one place.
//!
//! # Invariants
//! - Every item is identified by a stable integer `ItemId`.
//! - Root items carry the `ROOT_PARENT` sentinel, never a null parent.

pub mod account;
pub mod item;
