//! Engine use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the two external engine operations.
//! - Keep collaborator layers (HTTP, RPC) decoupled from storage details.

pub mod forest_service;
