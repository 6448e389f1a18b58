//! Family and membership repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over `families`.
//! - Maintain the `person_families` membership relation that defines the
//!   scope of a tree build.
//!
//! # Invariants
//! - A person is a member of one family at most once.
//! - Deleting a family removes its memberships but never its persons.

use crate::model::family::{Family, FamilyId, Membership};
use crate::model::person::PersonId;
use crate::repo::support::{
    ensure_connection_ready, map_write_error, parse_uuid, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const FAMILY_SELECT_SQL: &str = "SELECT
    f.family_id AS family_id,
    f.family_name AS family_name,
    f.description AS description
FROM families f";

/// Repository interface for families and memberships.
pub trait FamilyRepository {
    fn create_family(&self, family: &Family) -> RepoResult<FamilyId>;
    fn update_family(&self, family: &Family) -> RepoResult<()>;
    fn get_family(&self, id: FamilyId) -> RepoResult<Option<Family>>;
    fn delete_family(&self, id: FamilyId) -> RepoResult<()>;
    /// Lists families ordered by name.
    fn list_families(&self) -> RepoResult<Vec<Family>>;
    fn add_member(&self, membership: &Membership) -> RepoResult<()>;
    fn remove_member(&self, family_id: FamilyId, person_id: PersonId) -> RepoResult<()>;
    fn is_member(&self, family_id: FamilyId, person_id: PersonId) -> RepoResult<bool>;
    fn list_memberships(&self, family_id: FamilyId) -> RepoResult<Vec<Membership>>;
    fn families_of_person(&self, person_id: PersonId) -> RepoResult<Vec<Family>>;
    fn count_families(&self) -> RepoResult<u64>;
}

/// SQLite-backed family repository.
pub struct SqliteFamilyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFamilyRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["families", "person_families"])?;
        Ok(Self { conn })
    }
}

impl FamilyRepository for SqliteFamilyRepository<'_> {
    fn create_family(&self, family: &Family) -> RepoResult<FamilyId> {
        family.validate()?;
        self.conn
            .execute(
                "INSERT INTO families (family_id, family_name, description)
                 VALUES (?1, ?2, ?3);",
                params![
                    family.id.to_string(),
                    family.name.as_str(),
                    family.description.as_deref(),
                ],
            )
            .map_err(|err| map_write_error(err, &format!("family already exists: {}", family.id)))?;
        Ok(family.id)
    }

    fn update_family(&self, family: &Family) -> RepoResult<()> {
        family.validate()?;
        let changed = self.conn.execute(
            "UPDATE families
             SET family_name = ?1,
                 description = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE family_id = ?3;",
            params![
                family.name.as_str(),
                family.description.as_deref(),
                family.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "family",
                id: family.id,
            });
        }
        Ok(())
    }

    fn get_family(&self, id: FamilyId) -> RepoResult<Option<Family>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{FAMILY_SELECT_SQL} WHERE f.family_id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_family_row(row)?));
        }
        Ok(None)
    }

    fn delete_family(&self, id: FamilyId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM families WHERE family_id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "family",
                id,
            });
        }
        Ok(())
    }

    fn list_families(&self) -> RepoResult<Vec<Family>> {
        let mut stmt = self.conn.prepare(&format!(
            "{FAMILY_SELECT_SQL} ORDER BY f.family_name ASC, f.family_id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut families = Vec::new();
        while let Some(row) = rows.next()? {
            families.push(parse_family_row(row)?);
        }
        Ok(families)
    }

    fn add_member(&self, membership: &Membership) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO person_families (id, person_id, family_id, role_in_family, note)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    Uuid::new_v4().to_string(),
                    membership.person_id.to_string(),
                    membership.family_id.to_string(),
                    membership.role_in_family.as_str(),
                    membership.note.as_deref(),
                ],
            )
            .map_err(|err| {
                map_write_error(
                    err,
                    &format!(
                        "person {} is already a member of family {}",
                        membership.person_id, membership.family_id
                    ),
                )
            })?;
        Ok(())
    }

    fn remove_member(&self, family_id: FamilyId, person_id: PersonId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM person_families WHERE family_id = ?1 AND person_id = ?2;",
            params![family_id.to_string(), person_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "membership",
                id: person_id,
            });
        }
        Ok(())
    }

    fn is_member(&self, family_id: FamilyId, person_id: PersonId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM person_families WHERE family_id = ?1 AND person_id = ?2
            );",
            params![family_id.to_string(), person_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_memberships(&self, family_id: FamilyId) -> RepoResult<Vec<Membership>> {
        let mut stmt = self.conn.prepare(
            "SELECT pf.family_id, pf.person_id, pf.role_in_family, pf.note
             FROM person_families pf
             INNER JOIN persons p ON p.person_id = pf.person_id
             WHERE pf.family_id = ?1
             ORDER BY p.birthdate ASC, p.fullname ASC, p.person_id ASC;",
        )?;
        let mut rows = stmt.query([family_id.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            let family_text: String = row.get(0)?;
            let person_text: String = row.get(1)?;
            items.push(Membership {
                family_id: parse_uuid(&family_text, "person_families.family_id")?,
                person_id: parse_uuid(&person_text, "person_families.person_id")?,
                role_in_family: row.get(2)?,
                note: row.get(3)?,
            });
        }
        Ok(items)
    }

    fn families_of_person(&self, person_id: PersonId) -> RepoResult<Vec<Family>> {
        let mut stmt = self.conn.prepare(&format!(
            "{FAMILY_SELECT_SQL}
             INNER JOIN person_families pf ON pf.family_id = f.family_id
             WHERE pf.person_id = ?1
             ORDER BY f.family_name ASC, f.family_id ASC;"
        ))?;
        let mut rows = stmt.query([person_id.to_string()])?;
        let mut families = Vec::new();
        while let Some(row) = rows.next()? {
            families.push(parse_family_row(row)?);
        }
        Ok(families)
    }

    fn count_families(&self) -> RepoResult<u64> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM families;", [], |row| row.get(0))?;
        Ok(total.max(0) as u64)
    }
}

fn parse_family_row(row: &Row<'_>) -> RepoResult<Family> {
    let id_text: String = row.get("family_id")?;
    let family = Family {
        id: parse_uuid(&id_text, "families.family_id")?,
        name: row.get("family_name")?,
        description: row.get("description")?,
    };
    family.validate()?;
    Ok(family)
}
