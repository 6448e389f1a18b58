//! Person repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and lookup APIs over `persons`.
//! - Provide the family-scoped person listing consumed by tree builds.
//!
//! # Invariants
//! - Write paths call `Person::validate()` before SQL mutations.
//! - Family listing is ordered `birthdate ASC, fullname ASC, person_id ASC`
//!   (presentation order of the tree).

use crate::model::family::FamilyId;
use crate::model::person::{Gender, Person, PersonId};
use crate::repo::support::{
    bool_to_int, ensure_connection_ready, escape_like, int_to_bool, map_write_error, parse_uuid,
    RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const PERSON_SELECT_SQL: &str = "SELECT
    p.person_id AS person_id,
    p.fullname AS fullname,
    p.gender AS gender,
    p.birthdate AS birthdate,
    p.deathdate AS deathdate,
    p.is_alive AS is_alive,
    p.birthplace AS birthplace,
    p.photo_url AS photo_url,
    p.notes AS notes
FROM persons p";

/// Pagination options for listing persons.
#[derive(Debug, Clone, Default)]
pub struct PersonListQuery {
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for person records.
pub trait PersonRepository {
    fn create_person(&self, person: &Person) -> RepoResult<PersonId>;
    fn update_person(&self, person: &Person) -> RepoResult<()>;
    fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>>;
    /// Deletes a person; memberships and relationships cascade.
    fn delete_person(&self, id: PersonId) -> RepoResult<()>;
    /// Lists persons newest first.
    fn list_persons(&self, query: &PersonListQuery) -> RepoResult<Vec<Person>>;
    /// Case-insensitive substring search on display name.
    fn search_persons(&self, fragment: &str, limit: u32) -> RepoResult<Vec<Person>>;
    /// Lists members of one family in tree presentation order.
    fn list_by_family(&self, family_id: FamilyId) -> RepoResult<Vec<Person>>;
    fn count_persons(&self) -> RepoResult<u64>;
}

/// SQLite-backed person repository.
pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["persons", "person_families"])?;
        Ok(Self { conn })
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn create_person(&self, person: &Person) -> RepoResult<PersonId> {
        person.validate()?;

        self.conn
            .execute(
                "INSERT INTO persons (
                    person_id,
                    fullname,
                    gender,
                    birthdate,
                    deathdate,
                    is_alive,
                    birthplace,
                    photo_url,
                    notes
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
                params![
                    person.id.to_string(),
                    person.full_name.as_str(),
                    person.gender.map(Gender::as_str),
                    person.birth_date.as_deref(),
                    person.death_date.as_deref(),
                    bool_to_int(person.is_alive),
                    person.birthplace.as_deref(),
                    person.photo_url.as_deref(),
                    person.notes.as_deref(),
                ],
            )
            .map_err(|err| map_write_error(err, &format!("person already exists: {}", person.id)))?;

        Ok(person.id)
    }

    fn update_person(&self, person: &Person) -> RepoResult<()> {
        person.validate()?;

        let changed = self.conn.execute(
            "UPDATE persons
             SET
                fullname = ?1,
                gender = ?2,
                birthdate = ?3,
                deathdate = ?4,
                is_alive = ?5,
                birthplace = ?6,
                photo_url = ?7,
                notes = ?8,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE person_id = ?9;",
            params![
                person.full_name.as_str(),
                person.gender.map(Gender::as_str),
                person.birth_date.as_deref(),
                person.death_date.as_deref(),
                bool_to_int(person.is_alive),
                person.birthplace.as_deref(),
                person.photo_url.as_deref(),
                person.notes.as_deref(),
                person.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "person",
                id: person.id,
            });
        }
        Ok(())
    }

    fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} WHERE p.person_id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_person_row(row)?));
        }
        Ok(None)
    }

    fn delete_person(&self, id: PersonId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM persons WHERE person_id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "person",
                id,
            });
        }
        Ok(())
    }

    fn list_persons(&self, query: &PersonListQuery) -> RepoResult<Vec<Person>> {
        let mut sql = format!("{PERSON_SELECT_SQL} ORDER BY p.created_at DESC, p.person_id ASC");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        collect_persons(&mut rows)
    }

    fn search_persons(&self, fragment: &str, limit: u32) -> RepoResult<Vec<Person>> {
        let pattern = format!("%{}%", escape_like(fragment.trim()));
        let mut stmt = self.conn.prepare(&format!(
            "{PERSON_SELECT_SQL}
             WHERE p.fullname LIKE ?1 ESCAPE '\\'
             ORDER BY p.fullname ASC, p.person_id ASC
             LIMIT ?2;"
        ))?;
        let mut rows = stmt.query(params![pattern, i64::from(limit)])?;
        collect_persons(&mut rows)
    }

    fn list_by_family(&self, family_id: FamilyId) -> RepoResult<Vec<Person>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PERSON_SELECT_SQL}
             INNER JOIN person_families pf ON pf.person_id = p.person_id
             WHERE pf.family_id = ?1
             ORDER BY p.birthdate ASC, p.fullname ASC, p.person_id ASC;"
        ))?;
        let mut rows = stmt.query([family_id.to_string()])?;
        collect_persons(&mut rows)
    }

    fn count_persons(&self) -> RepoResult<u64> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM persons;", [], |row| row.get(0))?;
        Ok(total.max(0) as u64)
    }
}

fn collect_persons(rows: &mut rusqlite::Rows<'_>) -> RepoResult<Vec<Person>> {
    let mut persons = Vec::new();
    while let Some(row) = rows.next()? {
        persons.push(parse_person_row(row)?);
    }
    Ok(persons)
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    let id_text: String = row.get("person_id")?;
    let id = parse_uuid(&id_text, "persons.person_id")?;

    let gender = match row.get::<_, Option<String>>("gender")? {
        Some(value) => Some(Gender::parse(&value).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid gender `{value}` in persons.gender"))
        })?),
        None => None,
    };

    let person = Person {
        id,
        full_name: row.get("fullname")?,
        gender,
        birth_date: row.get("birthdate")?,
        death_date: row.get("deathdate")?,
        is_alive: int_to_bool(row.get("is_alive")?, "persons.is_alive")?,
        birthplace: row.get("birthplace")?,
        photo_url: row.get("photo_url")?,
        notes: row.get("notes")?,
    };
    person.validate()?;
    Ok(person)
}
