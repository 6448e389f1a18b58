//! Typed genealogy records shared by storage, services and the tree core.
//!
//! # Responsibility
//! - Define canonical shapes for persons, families and relationships.
//! - Keep wire field names aligned with the JSON consumed by the tree client.
//!
//! # Invariants
//! - Every record is identified by a stable, non-nil UUID.
//! - Records are plain data; lifecycle is owned by the repository layer.

pub mod family;
pub mod person;
pub mod relationship;
