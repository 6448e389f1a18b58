//! Relationship use-case service.
//!
//! # Responsibility
//! - Validate edge creation against existing persons and edges.
//! - Provide metadata update, delete and listing entry points.
//!
//! # Invariants
//! - Both endpoints exist before an edge is written.
//! - A directed edge of one kind is stored once.
//! - A spouse pair is stored once regardless of endpoint order.

use crate::model::family::FamilyId;
use crate::model::person::PersonId;
use crate::model::relationship::{RelationKind, Relationship, RelationshipId};
use crate::repo::person_repo::PersonRepository;
use crate::repo::relationship_repo::{RelationshipRepository, RelationshipUpdate};
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from relationship service operations.
#[derive(Debug)]
pub enum RelationshipServiceError {
    /// Both endpoints are the same person.
    SelfRelation(PersonId),
    /// An endpoint does not exist.
    PersonNotFound(PersonId),
    /// The same directed edge already exists.
    Duplicate {
        kind: RelationKind,
        from: PersonId,
        to: PersonId,
    },
    /// A spouse edge exists between the pair in either direction.
    DuplicateSpouse { first: PersonId, second: PersonId },
    /// Update carried no field to change.
    EmptyUpdate,
    NotFound(RelationshipId),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for RelationshipServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfRelation(id) => {
                write!(f, "a person cannot have a relationship with themselves: {id}")
            }
            Self::PersonNotFound(id) => write!(f, "person not found: {id}"),
            Self::Duplicate { kind, from, to } => write!(
                f,
                "{} relationship already exists from {from} to {to}",
                kind.as_str()
            ),
            Self::DuplicateSpouse { first, second } => {
                write!(f, "spouse relationship already exists between {first} and {second}")
            }
            Self::EmptyUpdate => write!(f, "relationship update has no fields to change"),
            Self::NotFound(id) => write!(f, "relationship not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RelationshipServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for RelationshipServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "relationship",
                id,
            } => Self::NotFound(id),
            RepoError::NotFound {
                entity: "person",
                id,
            } => Self::PersonNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub type RelationshipServiceResult<T> = Result<T, RelationshipServiceError>;

/// Relationship service facade.
pub struct RelationshipService<R: RelationshipRepository, P: PersonRepository> {
    relationships: R,
    persons: P,
}

impl<R: RelationshipRepository, P: PersonRepository> RelationshipService<R, P> {
    pub fn new(relationships: R, persons: P) -> Self {
        Self {
            relationships,
            persons,
        }
    }

    /// Creates one edge after existence and duplicate checks.
    ///
    /// # Errors
    /// - `SelfRelation` when both endpoints are equal.
    /// - `PersonNotFound` when an endpoint is missing.
    /// - `Duplicate` for a repeated directed edge.
    /// - `DuplicateSpouse` for a spouse pair stored in reverse order.
    pub fn create_relationship(
        &self,
        relationship: &Relationship,
    ) -> RelationshipServiceResult<Relationship> {
        let (from, to, kind) = (
            relationship.from_person,
            relationship.to_person,
            relationship.kind,
        );
        if from == to {
            return Err(RelationshipServiceError::SelfRelation(from));
        }
        for person_id in [from, to] {
            if self.persons.get_person(person_id)?.is_none() {
                return Err(RelationshipServiceError::PersonNotFound(person_id));
            }
        }
        if self.relationships.exists(from, to, kind)? {
            return Err(RelationshipServiceError::Duplicate { kind, from, to });
        }
        if kind == RelationKind::Spouse && self.relationships.exists(to, from, kind)? {
            return Err(RelationshipServiceError::DuplicateSpouse {
                first: from,
                second: to,
            });
        }

        let mut stored = relationship.clone();
        stored.note = relationship
            .note
            .as_deref()
            .map(str::trim)
            .filter(|note| !note.is_empty())
            .map(str::to_string);
        self.relationships.create_relationship(&stored)?;
        info!(
            "event=relationship_create module=service status=ok relation_type={}",
            kind.as_str()
        );
        Ok(stored)
    }

    /// Convenience for `parent -> child`.
    pub fn link_parent(
        &self,
        parent: PersonId,
        child: PersonId,
    ) -> RelationshipServiceResult<Relationship> {
        self.create_relationship(&Relationship::parent(parent, child))
    }

    /// Convenience for an undirected spouse pair.
    pub fn link_spouses(
        &self,
        first: PersonId,
        second: PersonId,
    ) -> RelationshipServiceResult<Relationship> {
        self.create_relationship(&Relationship::spouse(first, second))
    }

    pub fn get_relationship(
        &self,
        id: RelationshipId,
    ) -> RelationshipServiceResult<Option<Relationship>> {
        Ok(self.relationships.get_relationship(id)?)
    }

    /// Changes start, end or note; endpoints and kind are immutable.
    pub fn update_relationship(
        &self,
        id: RelationshipId,
        update: &RelationshipUpdate,
    ) -> RelationshipServiceResult<Relationship> {
        if update.is_empty() {
            return Err(RelationshipServiceError::EmptyUpdate);
        }
        self.relationships.update_relationship(id, update)?;
        self.relationships
            .get_relationship(id)?
            .ok_or(RelationshipServiceError::NotFound(id))
    }

    pub fn delete_relationship(&self, id: RelationshipId) -> RelationshipServiceResult<()> {
        self.relationships.delete_relationship(id)?;
        Ok(())
    }

    pub fn list_for_person(
        &self,
        person_id: PersonId,
    ) -> RelationshipServiceResult<Vec<Relationship>> {
        Ok(self.relationships.list_by_person(person_id)?)
    }

    pub fn list_for_family(
        &self,
        family_id: FamilyId,
    ) -> RelationshipServiceResult<Vec<Relationship>> {
        Ok(self.relationships.list_by_family(family_id)?)
    }

    pub fn count_relationships(&self) -> RelationshipServiceResult<u64> {
        Ok(self.relationships.count_relationships()?)
    }
}
