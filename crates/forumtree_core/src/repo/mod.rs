//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Item writes assign `sort_position` and insert in one immediate
//!   transaction, so concurrent creators never observe the same position.
//! - Repository APIs return semantic errors (`ParentNotFound`, `NotFound`)
//!   in addition to DB transport errors.

pub mod account_repo;
pub mod item_repo;
pub(crate) mod sequencer;
