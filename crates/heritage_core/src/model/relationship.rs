//! Relationship (edge) domain model.
//!
//! # Responsibility
//! - Define typed parent/spouse edges between two persons.
//!
//! # Invariants
//! - `Parent` edges are directed: `from_person` is the parent of `to_person`.
//! - `Spouse` edges are undirected; endpoint order is arbitrary.
//! - An edge never connects a person to themselves.

use crate::model::person::PersonId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a relationship row.
pub type RelationshipId = Uuid;

/// Relationship kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Directed parent -> child edge.
    Parent,
    /// Undirected partnership edge.
    Spouse,
}

impl RelationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Spouse => "spouse",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "parent" => Some(Self::Parent),
            "spouse" => Some(Self::Spouse),
            _ => None,
        }
    }
}

/// Validation failures for [`Relationship`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationshipValidationError {
    NilId,
    NilMember,
    SelfRelation(PersonId),
}

impl Display for RelationshipValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "relationship id must not be nil"),
            Self::NilMember => write!(f, "relationship members must not be nil"),
            Self::SelfRelation(id) => {
                write!(f, "a person cannot have a relationship with themselves: {id}")
            }
        }
    }
}

impl Error for RelationshipValidationError {}

/// Typed edge between two persons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(rename = "relationship_id")]
    pub id: RelationshipId,
    #[serde(rename = "member_id_1")]
    pub from_person: PersonId,
    #[serde(rename = "member_id_2")]
    pub to_person: PersonId,
    #[serde(rename = "relation_type")]
    pub kind: RelationKind,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub note: Option<String>,
}

impl Relationship {
    /// Creates an edge with a generated id and no metadata.
    pub fn new(kind: RelationKind, from_person: PersonId, to_person: PersonId) -> Self {
        Self {
            id: Uuid::new_v4(),
            from_person,
            to_person,
            kind,
            started_at: None,
            ended_at: None,
            note: None,
        }
    }

    /// Creates a `parent -> child` edge.
    pub fn parent(parent: PersonId, child: PersonId) -> Self {
        Self::new(RelationKind::Parent, parent, child)
    }

    /// Creates a spouse edge; endpoint order carries no meaning.
    pub fn spouse(first: PersonId, second: PersonId) -> Self {
        Self::new(RelationKind::Spouse, first, second)
    }

    pub fn validate(&self) -> Result<(), RelationshipValidationError> {
        if self.id.is_nil() {
            return Err(RelationshipValidationError::NilId);
        }
        if self.from_person.is_nil() || self.to_person.is_nil() {
            return Err(RelationshipValidationError::NilMember);
        }
        if self.from_person == self.to_person {
            return Err(RelationshipValidationError::SelfRelation(self.from_person));
        }
        Ok(())
    }

    /// Returns the endpoint opposite to `person`, if `person` is an endpoint.
    pub fn other_end(&self, person: PersonId) -> Option<PersonId> {
        if self.from_person == person {
            Some(self.to_person)
        } else if self.to_person == person {
            Some(self.from_person)
        } else {
            None
        }
    }
}
