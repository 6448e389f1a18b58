//! Family tree use-case service.
//!
//! # Responsibility
//! - Load one family's persons and edges as a snapshot.
//! - Derive the forest and return the rich or compact response.
//!
//! # Invariants
//! - Every build reads the repositories once per list and never writes.
//! - The rich response requires the family record; the compact response
//!   treats an unknown family as an empty scope.

use crate::model::family::{Family, FamilyId};
use crate::model::person::Person;
use crate::model::relationship::Relationship;
use crate::repo::family_repo::FamilyRepository;
use crate::repo::person_repo::PersonRepository;
use crate::repo::relationship_repo::RelationshipRepository;
use crate::repo::{RepoError, RepoResult};
use crate::tree::{
    build_forest, AssemblyOptions, Forest, RichTreeView, ScopeSnapshot, SimpleTreeView,
};
use log::error;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from tree service operations.
#[derive(Debug)]
pub enum TreeServiceError {
    FamilyNotFound(FamilyId),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for TreeServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FamilyNotFound(id) => write!(f, "family not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TreeServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::FamilyNotFound(_) => None,
        }
    }
}

impl From<RepoError> for TreeServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Full tree response with the raw records it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyTreeResponse {
    pub family: Family,
    pub tree: RichTreeView,
    pub persons: Vec<Person>,
    pub relationships: Vec<Relationship>,
}

/// Tree derivation facade over the three repositories.
pub struct TreeService<P, R, F>
where
    P: PersonRepository,
    R: RelationshipRepository,
    F: FamilyRepository,
{
    persons: P,
    relationships: R,
    families: F,
    options: AssemblyOptions,
}

impl<P, R, F> TreeService<P, R, F>
where
    P: PersonRepository,
    R: RelationshipRepository,
    F: FamilyRepository,
{
    /// Creates a service with default assembly options.
    pub fn new(persons: P, relationships: R, families: F) -> Self {
        Self::with_options(persons, relationships, families, AssemblyOptions::default())
    }

    pub fn with_options(
        persons: P,
        relationships: R,
        families: F,
        options: AssemblyOptions,
    ) -> Self {
        Self {
            persons,
            relationships,
            families,
            options,
        }
    }

    pub fn options(&self) -> AssemblyOptions {
        self.options
    }

    /// Loads the persons and edges of one family in presentation order.
    pub fn load_snapshot(&self, family_id: FamilyId) -> Result<ScopeSnapshot, TreeServiceError> {
        self.read_snapshot(family_id).map_err(|err| {
            error!(
                "event=tree_load module=service status=error family_id={family_id} error={err}"
            );
            err.into()
        })
    }

    fn read_snapshot(&self, family_id: FamilyId) -> RepoResult<ScopeSnapshot> {
        Ok(ScopeSnapshot {
            persons: self.persons.list_by_family(family_id)?,
            parent_edges: self.relationships.list_parent_child_edges(family_id)?,
            spouse_edges: self.relationships.list_spouse_edges(family_id)?,
        })
    }

    /// Derives the forest for one family without loading the family record.
    pub fn forest(&self, family_id: FamilyId) -> Result<Forest, TreeServiceError> {
        let snapshot = self.load_snapshot(family_id)?;
        Ok(build_forest(&snapshot, self.options))
    }

    /// Returns the family, its rich tree and the raw records.
    ///
    /// # Errors
    /// - `FamilyNotFound` when no family has `family_id`.
    pub fn family_tree(
        &self,
        family_id: FamilyId,
    ) -> Result<FamilyTreeResponse, TreeServiceError> {
        let family = self
            .families
            .get_family(family_id)?
            .ok_or(TreeServiceError::FamilyNotFound(family_id))?;
        let snapshot = self.load_snapshot(family_id)?;
        let forest = build_forest(&snapshot, self.options);
        let relationships = self.relationships.list_by_family(family_id)?;

        Ok(FamilyTreeResponse {
            family,
            tree: forest.into_rich_view(),
            persons: snapshot.persons,
            relationships,
        })
    }

    /// Returns the compact tree. An unknown family yields an empty forest.
    pub fn simple_tree(&self, family_id: FamilyId) -> Result<SimpleTreeView, TreeServiceError> {
        Ok(self.forest(family_id)?.simple_view())
    }
}
