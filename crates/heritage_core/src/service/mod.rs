//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Check cross-record rules that a single row write cannot enforce.
//! - Keep CLI callers decoupled from storage details.

pub mod family_service;
pub mod person_service;
pub mod relationship_service;
pub mod tree_service;
