//! Person use-case service.
//!
//! # Responsibility
//! - Normalize user-entered person fields before persistence.
//! - Delegate CRUD and lookups to repository implementations.
//!
//! # Invariants
//! - Stored names never carry leading, trailing or repeated whitespace.
//! - Blank optional text is stored as `None`.

use crate::model::family::FamilyId;
use crate::model::person::{Person, PersonId};
use crate::repo::person_repo::{PersonListQuery, PersonRepository};
use crate::repo::RepoResult;
use once_cell::sync::Lazy;
use regex::Regex;

const DEFAULT_SEARCH_LIMIT: u32 = 20;

static INNER_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex must compile"));

/// Use-case service wrapper for person records.
pub struct PersonService<R: PersonRepository> {
    repo: R,
}

impl<R: PersonRepository> PersonService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Normalizes and persists a new person.
    pub fn create_person(&self, person: &Person) -> RepoResult<PersonId> {
        self.repo.create_person(&normalize_person(person))
    }

    /// Normalizes and overwrites an existing person.
    ///
    /// Returns repository-level not-found or validation errors unchanged.
    pub fn update_person(&self, person: &Person) -> RepoResult<()> {
        self.repo.update_person(&normalize_person(person))
    }

    pub fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>> {
        self.repo.get_person(id)
    }

    /// Deletes a person; memberships and relationships cascade.
    pub fn delete_person(&self, id: PersonId) -> RepoResult<()> {
        self.repo.delete_person(id)
    }

    pub fn list_persons(&self, query: &PersonListQuery) -> RepoResult<Vec<Person>> {
        self.repo.list_persons(query)
    }

    /// Case-insensitive name search. Blank input returns no rows.
    pub fn search_persons(&self, fragment: &str, limit: Option<u32>) -> RepoResult<Vec<Person>> {
        let fragment = normalize_name(fragment);
        if fragment.is_empty() {
            return Ok(Vec::new());
        }
        self.repo
            .search_persons(&fragment, limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
    }

    pub fn list_family_members(&self, family_id: FamilyId) -> RepoResult<Vec<Person>> {
        self.repo.list_by_family(family_id)
    }

    pub fn count_persons(&self) -> RepoResult<u64> {
        self.repo.count_persons()
    }
}

fn normalize_person(person: &Person) -> Person {
    let mut normalized = person.clone();
    normalized.full_name = normalize_name(&person.full_name);
    normalized.birth_date = normalize_optional(person.birth_date.as_deref());
    normalized.death_date = normalize_optional(person.death_date.as_deref());
    normalized.birthplace = normalize_optional(person.birthplace.as_deref());
    normalized.photo_url = normalize_optional(person.photo_url.as_deref());
    normalized.notes = normalize_optional(person.notes.as_deref());
    normalized
}

pub(crate) fn normalize_name(value: &str) -> String {
    INNER_WHITESPACE.replace_all(value.trim(), " ").into_owned()
}

fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::{normalize_name, normalize_optional, normalize_person};
    use crate::model::person::Person;

    #[test]
    fn normalize_name_collapses_whitespace() {
        assert_eq!(normalize_name("  Nguyen \t Van\n A "), "Nguyen Van A");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn normalize_optional_drops_blank_values() {
        assert_eq!(normalize_optional(Some("  ")), None);
        assert_eq!(normalize_optional(Some(" Hue ")), Some("Hue".to_string()));
        assert_eq!(normalize_optional(None), None);
    }

    #[test]
    fn normalize_person_keeps_identity_and_flags() {
        let mut person = Person::new(" Tran   Thi B ");
        person.is_alive = false;
        person.birthplace = Some(" ".to_string());

        let normalized = normalize_person(&person);

        assert_eq!(normalized.id, person.id);
        assert_eq!(normalized.full_name, "Tran Thi B");
        assert!(!normalized.is_alive);
        assert_eq!(normalized.birthplace, None);
    }
}
