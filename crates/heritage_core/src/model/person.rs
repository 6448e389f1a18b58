//! Person domain model.
//!
//! # Responsibility
//! - Define the person record rendered as a tree node.
//! - Validate identity, display name and calendar date formats.
//!
//! # Invariants
//! - `id` is stable and never reused for another person.
//! - `full_name` is non-blank after trim.
//! - Dates, when set, are `YYYY-MM-DD` strings naming a real calendar day
//!   (proleptic Gregorian, leap years included).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a person.
pub type PersonId = Uuid;

static CALENDAR_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$").expect("valid date regex")
});

/// Recorded gender of a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Storage/wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }

    /// Parses the storage/wire representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Validation failures for [`Person`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonValidationError {
    NilId,
    BlankName,
    InvalidDate { field: &'static str, value: String },
}

impl Display for PersonValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "person id must not be nil"),
            Self::BlankName => write!(f, "person name must not be blank"),
            Self::InvalidDate { field, value } => {
                write!(f, "{field} must be formatted YYYY-MM-DD, got `{value}`")
            }
        }
    }
}

impl Error for PersonValidationError {}

/// Person record as stored and as returned in the raw `persons` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    #[serde(rename = "person_id")]
    pub id: PersonId,
    #[serde(rename = "fullname")]
    pub full_name: String,
    pub gender: Option<Gender>,
    #[serde(rename = "birthdate")]
    pub birth_date: Option<String>,
    #[serde(rename = "deathdate")]
    pub death_date: Option<String>,
    pub is_alive: bool,
    pub birthplace: Option<String>,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
}

impl Person {
    /// Creates a living person with a generated id and no optional attributes.
    pub fn new(full_name: impl Into<String>) -> Self {
        Self::blank(Uuid::new_v4(), full_name.into())
    }

    /// Creates a person with a caller-provided id.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(
        id: PersonId,
        full_name: impl Into<String>,
    ) -> Result<Self, PersonValidationError> {
        if id.is_nil() {
            return Err(PersonValidationError::NilId);
        }
        Ok(Self::blank(id, full_name.into()))
    }

    fn blank(id: PersonId, full_name: String) -> Self {
        Self {
            id,
            full_name,
            gender: None,
            birth_date: None,
            death_date: None,
            is_alive: true,
            birthplace: None,
            photo_url: None,
            notes: None,
        }
    }

    /// Checks record-level invariants before persistence.
    pub fn validate(&self) -> Result<(), PersonValidationError> {
        if self.id.is_nil() {
            return Err(PersonValidationError::NilId);
        }
        if self.full_name.trim().is_empty() {
            return Err(PersonValidationError::BlankName);
        }
        validate_date("birthdate", self.birth_date.as_deref())?;
        validate_date("deathdate", self.death_date.as_deref())?;
        Ok(())
    }
}

fn validate_date(field: &'static str, value: Option<&str>) -> Result<(), PersonValidationError> {
    match value {
        Some(value) if !is_calendar_date(value) => Err(PersonValidationError::InvalidDate {
            field,
            value: value.to_string(),
        }),
        _ => Ok(()),
    }
}

fn is_calendar_date(value: &str) -> bool {
    let Some(caps) = CALENDAR_DATE_RE.captures(value) else {
        return false;
    };
    let parse = |idx: usize| caps[idx].parse::<u32>().ok();
    match (parse(1), parse(2), parse(3)) {
        (Some(year), Some(month), Some(day)) => day <= days_in_month(year, month),
        _ => false,
    }
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

fn is_leap_year(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[cfg(test)]
mod tests {
    use super::{is_calendar_date, Gender, Person, PersonValidationError};
    use uuid::Uuid;

    #[test]
    fn new_person_is_alive_with_generated_id() {
        let person = Person::new("Ada Lovelace");
        assert!(!person.id.is_nil());
        assert!(person.is_alive);
        assert_eq!(person.validate(), Ok(()));
    }

    #[test]
    fn with_id_rejects_nil() {
        let err = Person::with_id(Uuid::nil(), "Nobody").unwrap_err();
        assert_eq!(err, PersonValidationError::NilId);
    }

    #[test]
    fn impossible_days_are_rejected() {
        for value in ["2023-02-29", "2023-02-31", "1900-02-29", "2024-04-31", "2024-11-31"] {
            assert!(!is_calendar_date(value), "{value}");
        }
        for value in ["2024-02-29", "2000-02-29", "2023-01-31", "2023-06-30", "0001-12-31"] {
            assert!(is_calendar_date(value), "{value}");
        }

        let mut person = Person::new("Grace");
        person.birth_date = Some("2023-02-31".to_string());
        assert_eq!(
            person.validate(),
            Err(PersonValidationError::InvalidDate {
                field: "birthdate",
                value: "2023-02-31".to_string(),
            })
        );
    }

    #[test]
    fn validate_rejects_blank_name_and_bad_dates() {
        let mut person = Person::new("   ");
        assert_eq!(person.validate(), Err(PersonValidationError::BlankName));

        person.full_name = "Grace".to_string();
        person.birth_date = Some("1906-13-09".to_string());
        assert_eq!(
            person.validate(),
            Err(PersonValidationError::InvalidDate {
                field: "birthdate",
                value: "1906-13-09".to_string(),
            })
        );

        person.birth_date = Some("1906-12-09".to_string());
        person.death_date = Some("1992".to_string());
        assert!(matches!(
            person.validate(),
            Err(PersonValidationError::InvalidDate {
                field: "deathdate",
                ..
            })
        ));
    }

    #[test]
    fn gender_round_trips_through_storage_text() {
        for gender in [Gender::Male, Gender::Female, Gender::Other] {
            assert_eq!(Gender::parse(gender.as_str()), Some(gender));
        }
        assert_eq!(Gender::parse("unknown"), None);
    }
}
