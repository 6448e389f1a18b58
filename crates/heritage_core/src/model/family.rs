//! Family and membership models.
//!
//! A family is the scope a tree is built over; membership is the
//! person <-> family relation carrying a role label.

use crate::model::person::PersonId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a family.
pub type FamilyId = Uuid;

/// Role stored when the caller does not name one.
pub const DEFAULT_FAMILY_ROLE: &str = "bloodline";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FamilyValidationError {
    NilId,
    BlankName,
}

impl Display for FamilyValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "family id must not be nil"),
            Self::BlankName => write!(f, "family name must not be blank"),
        }
    }
}

impl Error for FamilyValidationError {}

/// Family record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    #[serde(rename = "family_id")]
    pub id: FamilyId,
    #[serde(rename = "family_name")]
    pub name: String,
    pub description: Option<String>,
}

impl Family {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
        }
    }

    pub fn validate(&self) -> Result<(), FamilyValidationError> {
        if self.id.is_nil() {
            return Err(FamilyValidationError::NilId);
        }
        if self.name.trim().is_empty() {
            return Err(FamilyValidationError::BlankName);
        }
        Ok(())
    }
}

/// Person membership in one family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub family_id: FamilyId,
    pub person_id: PersonId,
    pub role_in_family: String,
    pub note: Option<String>,
}
