//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for persons, families
//!   and relationships.
//! - Isolate SQLite query details from service and tree orchestration.
//!
//! # Invariants
//! - Write paths validate records before persistence.
//! - Family-scoped reads only return rows whose every person endpoint is a
//!   member of the requested family.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to DB transport errors.

pub mod family_repo;
pub mod person_repo;
pub mod relationship_repo;
mod support;

pub use support::{RepoError, RepoResult};
