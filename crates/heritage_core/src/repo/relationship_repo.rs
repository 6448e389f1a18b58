//! Relationship repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over `relationships`.
//! - Provide the family-scoped edge lists consumed by tree builds.
//!
//! # Invariants
//! - Family-scoped queries only return edges whose both endpoints are members
//!   of the family.
//! - Parent edges are ordered by child presentation order
//!   (`birthdate ASC, fullname ASC, person_id ASC`), so child lists built from
//!   them match the person list order.
//! - Spouse pairs are unique regardless of endpoint order (schema index).

use crate::model::family::FamilyId;
use crate::model::person::PersonId;
use crate::model::relationship::{RelationKind, Relationship, RelationshipId};
use crate::repo::support::{ensure_connection_ready, map_write_error, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const RELATIONSHIP_SELECT_SQL: &str = "SELECT
    r.relationship_id AS relationship_id,
    r.member_id_1 AS member_id_1,
    r.member_id_2 AS member_id_2,
    r.relation_type AS relation_type,
    r.started_at AS started_at,
    r.ended_at AS ended_at,
    r.note AS note
FROM relationships r";

const FAMILY_SCOPE_JOIN_SQL: &str = "
    INNER JOIN person_families pf1 ON pf1.person_id = r.member_id_1 AND pf1.family_id = ?1
    INNER JOIN person_families pf2 ON pf2.person_id = r.member_id_2 AND pf2.family_id = ?1";

/// Partial metadata update. `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipUpdate {
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub note: Option<String>,
}

impl RelationshipUpdate {
    pub fn is_empty(&self) -> bool {
        self.started_at.is_none() && self.ended_at.is_none() && self.note.is_none()
    }
}

/// Repository interface for relationship edges.
pub trait RelationshipRepository {
    fn create_relationship(&self, relationship: &Relationship) -> RepoResult<RelationshipId>;
    fn get_relationship(&self, id: RelationshipId) -> RepoResult<Option<Relationship>>;
    fn update_relationship(
        &self,
        id: RelationshipId,
        update: &RelationshipUpdate,
    ) -> RepoResult<()>;
    fn delete_relationship(&self, id: RelationshipId) -> RepoResult<()>;
    /// Directed existence check: `from -> to` with the given kind.
    fn exists(&self, from: PersonId, to: PersonId, kind: RelationKind) -> RepoResult<bool>;
    fn list_by_person(&self, person_id: PersonId) -> RepoResult<Vec<Relationship>>;
    /// All in-scope edges, ordered by kind then start.
    fn list_by_family(&self, family_id: FamilyId) -> RepoResult<Vec<Relationship>>;
    fn list_parent_child_edges(&self, family_id: FamilyId) -> RepoResult<Vec<Relationship>>;
    fn list_spouse_edges(&self, family_id: FamilyId) -> RepoResult<Vec<Relationship>>;
    fn count_relationships(&self) -> RepoResult<u64>;
}

/// SQLite-backed relationship repository.
pub struct SqliteRelationshipRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRelationshipRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["relationships", "person_families", "persons"])?;
        Ok(Self { conn })
    }

    fn query_edges(&self, sql: &str, bind: String) -> RepoResult<Vec<Relationship>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([bind])?;
        let mut edges = Vec::new();
        while let Some(row) = rows.next()? {
            edges.push(parse_relationship_row(row)?);
        }
        Ok(edges)
    }
}

impl RelationshipRepository for SqliteRelationshipRepository<'_> {
    fn create_relationship(&self, relationship: &Relationship) -> RepoResult<RelationshipId> {
        relationship.validate()?;
        self.conn
            .execute(
                "INSERT INTO relationships (
                    relationship_id,
                    member_id_1,
                    member_id_2,
                    relation_type,
                    started_at,
                    ended_at,
                    note
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    relationship.id.to_string(),
                    relationship.from_person.to_string(),
                    relationship.to_person.to_string(),
                    relationship.kind.as_str(),
                    relationship.started_at.as_deref(),
                    relationship.ended_at.as_deref(),
                    relationship.note.as_deref(),
                ],
            )
            .map_err(|err| {
                map_write_error(
                    err,
                    &format!(
                        "{} relationship already exists between {} and {}",
                        relationship.kind.as_str(),
                        relationship.from_person,
                        relationship.to_person
                    ),
                )
            })?;
        Ok(relationship.id)
    }

    fn get_relationship(&self, id: RelationshipId) -> RepoResult<Option<Relationship>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RELATIONSHIP_SELECT_SQL} WHERE r.relationship_id = ?1;"
        ))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_relationship_row(row)?));
        }
        Ok(None)
    }

    fn update_relationship(
        &self,
        id: RelationshipId,
        update: &RelationshipUpdate,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE relationships
             SET started_at = COALESCE(?2, started_at),
                 ended_at = COALESCE(?3, ended_at),
                 note = COALESCE(?4, note),
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE relationship_id = ?1;",
            params![
                id.to_string(),
                update.started_at.as_deref(),
                update.ended_at.as_deref(),
                update.note.as_deref(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "relationship",
                id,
            });
        }
        Ok(())
    }

    fn delete_relationship(&self, id: RelationshipId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM relationships WHERE relationship_id = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "relationship",
                id,
            });
        }
        Ok(())
    }

    fn exists(&self, from: PersonId, to: PersonId, kind: RelationKind) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM relationships
                WHERE member_id_1 = ?1
                  AND member_id_2 = ?2
                  AND relation_type = ?3
            );",
            params![from.to_string(), to.to_string(), kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_by_person(&self, person_id: PersonId) -> RepoResult<Vec<Relationship>> {
        self.query_edges(
            &format!(
                "{RELATIONSHIP_SELECT_SQL}
                 WHERE r.member_id_1 = ?1 OR r.member_id_2 = ?1
                 ORDER BY r.relation_type ASC, r.started_at ASC, r.relationship_id ASC;"
            ),
            person_id.to_string(),
        )
    }

    fn list_by_family(&self, family_id: FamilyId) -> RepoResult<Vec<Relationship>> {
        self.query_edges(
            &format!(
                "{RELATIONSHIP_SELECT_SQL}
                 {FAMILY_SCOPE_JOIN_SQL}
                 ORDER BY r.relation_type ASC, r.started_at ASC, r.relationship_id ASC;"
            ),
            family_id.to_string(),
        )
    }

    fn list_parent_child_edges(&self, family_id: FamilyId) -> RepoResult<Vec<Relationship>> {
        self.query_edges(
            &format!(
                "{RELATIONSHIP_SELECT_SQL}
                 {FAMILY_SCOPE_JOIN_SQL}
                 INNER JOIN persons child ON child.person_id = r.member_id_2
                 WHERE r.relation_type = 'parent'
                 ORDER BY child.birthdate ASC,
                          child.fullname ASC,
                          child.person_id ASC,
                          r.member_id_1 ASC;"
            ),
            family_id.to_string(),
        )
    }

    fn list_spouse_edges(&self, family_id: FamilyId) -> RepoResult<Vec<Relationship>> {
        self.query_edges(
            &format!(
                "{RELATIONSHIP_SELECT_SQL}
                 {FAMILY_SCOPE_JOIN_SQL}
                 WHERE r.relation_type = 'spouse'
                 ORDER BY r.started_at ASC, r.relationship_id ASC;"
            ),
            family_id.to_string(),
        )
    }

    fn count_relationships(&self) -> RepoResult<u64> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM relationships;", [], |row| row.get(0))?;
        Ok(total.max(0) as u64)
    }
}

fn parse_relationship_row(row: &Row<'_>) -> RepoResult<Relationship> {
    let id_text: String = row.get("relationship_id")?;
    let from_text: String = row.get("member_id_1")?;
    let to_text: String = row.get("member_id_2")?;
    let kind_text: String = row.get("relation_type")?;
    let kind = RelationKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid relation type `{kind_text}` in relationships.relation_type"
        ))
    })?;

    Ok(Relationship {
        id: parse_uuid(&id_text, "relationships.relationship_id")?,
        from_person: parse_uuid(&from_text, "relationships.member_id_1")?,
        to_person: parse_uuid(&to_text, "relationships.member_id_2")?,
        kind,
        started_at: row.get("started_at")?,
        ended_at: row.get("ended_at")?,
        note: row.get("note")?,
    })
}
