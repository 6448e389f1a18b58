//! Family and membership use-case service.
//!
//! # Responsibility
//! - Provide family CRUD with normalized names.
//! - Guard membership changes with existence checks on both sides.
//!
//! # Invariants
//! - A membership is only written when both family and person exist.
//! - Membership role defaults to `bloodline` when not provided.

use crate::model::family::{Family, FamilyId, Membership, DEFAULT_FAMILY_ROLE};
use crate::model::person::{Person, PersonId};
use crate::repo::family_repo::FamilyRepository;
use crate::repo::person_repo::PersonRepository;
use crate::repo::RepoError;
use crate::service::person_service::normalize_name;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from family service operations.
#[derive(Debug)]
pub enum FamilyServiceError {
    FamilyNotFound(FamilyId),
    PersonNotFound(PersonId),
    /// Person is already listed in the family.
    AlreadyMember {
        family_id: FamilyId,
        person_id: PersonId,
    },
    /// Person is not listed in the family.
    NotMember {
        family_id: FamilyId,
        person_id: PersonId,
    },
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for FamilyServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FamilyNotFound(id) => write!(f, "family not found: {id}"),
            Self::PersonNotFound(id) => write!(f, "person not found: {id}"),
            Self::AlreadyMember {
                family_id,
                person_id,
            } => write!(f, "person {person_id} is already a member of family {family_id}"),
            Self::NotMember {
                family_id,
                person_id,
            } => write!(f, "person {person_id} is not a member of family {family_id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FamilyServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for FamilyServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "family",
                id,
            } => Self::FamilyNotFound(id),
            RepoError::NotFound {
                entity: "person",
                id,
            } => Self::PersonNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub type FamilyServiceResult<T> = Result<T, FamilyServiceError>;

/// Family service facade.
pub struct FamilyService<F: FamilyRepository, P: PersonRepository> {
    families: F,
    persons: P,
}

impl<F: FamilyRepository, P: PersonRepository> FamilyService<F, P> {
    pub fn new(families: F, persons: P) -> Self {
        Self { families, persons }
    }

    /// Creates a family after collapsing whitespace in its name.
    pub fn create_family(
        &self,
        name: &str,
        description: Option<String>,
    ) -> FamilyServiceResult<Family> {
        let mut family = Family::new(normalize_name(name));
        family.description = description
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        self.families.create_family(&family)?;
        Ok(family)
    }

    pub fn update_family(&self, family: &Family) -> FamilyServiceResult<()> {
        let mut normalized = family.clone();
        normalized.name = normalize_name(&family.name);
        self.families.update_family(&normalized)?;
        Ok(())
    }

    pub fn get_family(&self, id: FamilyId) -> FamilyServiceResult<Option<Family>> {
        Ok(self.families.get_family(id)?)
    }

    /// Deletes a family and its memberships; persons are kept.
    pub fn delete_family(&self, id: FamilyId) -> FamilyServiceResult<()> {
        self.families.delete_family(id)?;
        Ok(())
    }

    pub fn list_families(&self) -> FamilyServiceResult<Vec<Family>> {
        Ok(self.families.list_families()?)
    }

    pub fn count_families(&self) -> FamilyServiceResult<u64> {
        Ok(self.families.count_families()?)
    }

    /// Adds a person to a family with an optional role.
    ///
    /// # Errors
    /// - `FamilyNotFound` / `PersonNotFound` when either side is missing.
    /// - `AlreadyMember` when the membership exists.
    pub fn add_member(
        &self,
        family_id: FamilyId,
        person_id: PersonId,
        role: Option<&str>,
    ) -> FamilyServiceResult<Membership> {
        self.ensure_family(family_id)?;
        self.ensure_person(person_id)?;
        if self.families.is_member(family_id, person_id)? {
            return Err(FamilyServiceError::AlreadyMember {
                family_id,
                person_id,
            });
        }

        let role = role
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_FAMILY_ROLE);
        let membership = Membership {
            family_id,
            person_id,
            role_in_family: role.to_string(),
            note: None,
        };
        self.families.add_member(&membership)?;
        Ok(membership)
    }

    pub fn remove_member(
        &self,
        family_id: FamilyId,
        person_id: PersonId,
    ) -> FamilyServiceResult<()> {
        match self.families.remove_member(family_id, person_id) {
            Ok(()) => Ok(()),
            Err(RepoError::NotFound { .. }) => Err(FamilyServiceError::NotMember {
                family_id,
                person_id,
            }),
            Err(err) => Err(err.into()),
        }
    }

    pub fn list_memberships(&self, family_id: FamilyId) -> FamilyServiceResult<Vec<Membership>> {
        self.ensure_family(family_id)?;
        Ok(self.families.list_memberships(family_id)?)
    }

    /// Members of a family in presentation order.
    pub fn list_members(&self, family_id: FamilyId) -> FamilyServiceResult<Vec<Person>> {
        self.ensure_family(family_id)?;
        Ok(self.persons.list_by_family(family_id)?)
    }

    pub fn families_of_person(&self, person_id: PersonId) -> FamilyServiceResult<Vec<Family>> {
        Ok(self.families.families_of_person(person_id)?)
    }

    fn ensure_family(&self, id: FamilyId) -> FamilyServiceResult<Family> {
        self.families
            .get_family(id)?
            .ok_or(FamilyServiceError::FamilyNotFound(id))
    }

    fn ensure_person(&self, id: PersonId) -> FamilyServiceResult<Person> {
        self.persons
            .get_person(id)?
            .ok_or(FamilyServiceError::PersonNotFound(id))
    }
}
