//! Core domain logic for the heritage family tree.
//!
//! Persons, families and relationships are stored flat; this crate derives
//! the nested tree views from them and owns every invariant on the way.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod tree;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::family::{Family, FamilyId, FamilyValidationError, Membership};
pub use model::person::{Gender, Person, PersonId, PersonValidationError};
pub use model::relationship::{
    RelationKind, Relationship, RelationshipId, RelationshipValidationError,
};
pub use repo::family_repo::{FamilyRepository, SqliteFamilyRepository};
pub use repo::person_repo::{PersonListQuery, PersonRepository, SqlitePersonRepository};
pub use repo::relationship_repo::{
    RelationshipRepository, RelationshipUpdate, SqliteRelationshipRepository,
};
pub use repo::{RepoError, RepoResult};
pub use service::family_service::{FamilyService, FamilyServiceError};
pub use service::person_service::PersonService;
pub use service::relationship_service::{RelationshipService, RelationshipServiceError};
pub use service::tree_service::{FamilyTreeResponse, TreeService, TreeServiceError};
pub use tree::{
    build_forest, AssemblyOptions, Forest, RichTreeView, ScopeSnapshot, SharedDescendantPolicy,
    SimpleTreeNode, SimpleTreeView, TreeNode,
};

/// Minimal health-check API for callers wiring the crate in.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
