//! Relation Store: binary student/club relations with at most one row per
//! pair, instantiated as memberships and bookmarks.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use clubhouse_types::{Bookmark, Membership, PrincipalKind};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::Database;
use crate::error::{StoreError, StoreResult};
use crate::models::{RelationRow, format_timestamp, parse_timestamp};
use crate::principals::resolve_in;

/// A relation kind stored in its own table with the shared
/// `(id, student_id, club_id, created_at)` layout and a
/// `UNIQUE(student_id, club_id)` constraint.
pub trait Relation: Sized {
    /// Table name. Interpolated into SQL, so it must be a trusted constant.
    const TABLE: &'static str;
    /// Human-readable noun for logs and error messages.
    const NOUN: &'static str;

    fn from_parts(id: i64, student_id: i64, club_id: i64, created_at: DateTime<Utc>) -> Self;
    fn id(&self) -> i64;
}

impl Relation for Membership {
    const TABLE: &'static str = "memberships";
    const NOUN: &'static str = "membership";

    fn from_parts(id: i64, student_id: i64, club_id: i64, created_at: DateTime<Utc>) -> Self {
        Membership {
            membership_id: id,
            student_id,
            club_id,
            joined_at: created_at,
        }
    }

    fn id(&self) -> i64 {
        self.membership_id
    }
}

impl Relation for Bookmark {
    const TABLE: &'static str = "bookmarks";
    const NOUN: &'static str = "bookmark";

    fn from_parts(id: i64, student_id: i64, club_id: i64, created_at: DateTime<Utc>) -> Self {
        Bookmark {
            bookmark_id: id,
            student_id,
            club_id,
            bookmarked_at: created_at,
        }
    }

    fn id(&self) -> i64 {
        self.bookmark_id
    }
}

/// A relation row together with the display names of both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRelation<K> {
    pub relation: K,
    pub student_name: String,
    pub club_name: String,
}

/// Result of [`RelationStore::add`]. `created` is false when the pair
/// already existed and `relation` is the untouched existing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome<K> {
    pub relation: K,
    pub created: bool,
}

pub struct RelationStore<'db, K> {
    db: &'db Database,
    _kind: PhantomData<fn() -> K>,
}

impl Database {
    pub fn relations<K: Relation>(&self) -> RelationStore<'_, K> {
        RelationStore {
            db: self,
            _kind: PhantomData,
        }
    }

    pub fn memberships(&self) -> RelationStore<'_, Membership> {
        self.relations()
    }

    pub fn bookmarks(&self) -> RelationStore<'_, Bookmark> {
        self.relations()
    }
}

impl<K: Relation> RelationStore<'_, K> {
    /// Idempotent insert. Both principals are resolved in the same
    /// transaction; the uniqueness constraint settles concurrent adds of the
    /// same pair, and the loser gets the winner's row back.
    pub fn add(&self, student_id: i64, club_id: i64) -> StoreResult<AddOutcome<K>> {
        self.db.transact(|conn| {
            resolve_in(conn, PrincipalKind::Student, student_id)?;
            resolve_in(conn, PrincipalKind::Club, club_id)?;

            let inserted = conn.execute(
                &format!(
                    "INSERT INTO {} (student_id, club_id, created_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(student_id, club_id) DO NOTHING",
                    K::TABLE
                ),
                params![student_id, club_id, format_timestamp(Utc::now())],
            )?;

            let relation = query_pair::<K>(conn, student_id, club_id)?.ok_or_else(|| {
                StoreError::InvalidData(format!(
                    "{} ({}, {}) missing after insert",
                    K::NOUN,
                    student_id,
                    club_id
                ))
            })?;

            if inserted == 1 {
                debug!("{} {} created: student {} -> club {}", K::NOUN, relation.id(), student_id, club_id);
            }

            Ok(AddOutcome {
                relation,
                created: inserted == 1,
            })
        })
    }

    /// Delete the pair's row. Absent rows are not an error.
    pub fn remove(&self, student_id: i64, club_id: i64) -> StoreResult<bool> {
        let removed = self.db.transact(|conn| {
            Ok(conn.execute(
                &format!("DELETE FROM {} WHERE student_id = ?1 AND club_id = ?2", K::TABLE),
                params![student_id, club_id],
            )?)
        })?;

        debug!("{} remove student {} / club {}: {}", K::NOUN, student_id, club_id, removed > 0);
        Ok(removed > 0)
    }

    pub fn remove_by_id(&self, id: i64) -> StoreResult<bool> {
        let removed = self.db.transact(|conn| {
            Ok(conn.execute(&format!("DELETE FROM {} WHERE id = ?1", K::TABLE), [id])?)
        })?;

        debug!("{} remove id {}: {}", K::NOUN, id, removed > 0);
        Ok(removed > 0)
    }

    pub fn get(&self, student_id: i64, club_id: i64) -> StoreResult<Option<K>> {
        self.db.with_conn(|conn| query_pair::<K>(conn, student_id, club_id))
    }

    pub fn contains(&self, student_id: i64, club_id: i64) -> StoreResult<bool> {
        Ok(self.get(student_id, club_id)?.is_some())
    }

    /// All of a student's rows, oldest first. `NotFound` if the student does not exist.
    pub fn list_for_student(&self, student_id: i64) -> StoreResult<Vec<NamedRelation<K>>> {
        self.db.with_conn(|conn| {
            resolve_in(conn, PrincipalKind::Student, student_id)?;
            query_named::<K>(conn, "r.student_id", student_id)
        })
    }

    /// All of a club's rows, oldest first. `NotFound` if the club does not exist.
    pub fn list_for_club(&self, club_id: i64) -> StoreResult<Vec<NamedRelation<K>>> {
        self.db.with_conn(|conn| {
            resolve_in(conn, PrincipalKind::Club, club_id)?;
            query_named::<K>(conn, "r.club_id", club_id)
        })
    }
}

fn query_pair<K: Relation>(conn: &Connection, student_id: i64, club_id: i64) -> StoreResult<Option<K>> {
    let row = conn
        .prepare_cached(&format!(
            "SELECT id, student_id, club_id, created_at FROM {} WHERE student_id = ?1 AND club_id = ?2",
            K::TABLE
        ))?
        .query_row(params![student_id, club_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })
        .optional()?;

    row.map(|(id, sid, cid, created_at)| -> StoreResult<K> {
        Ok(K::from_parts(id, sid, cid, parse_timestamp(&created_at)?))
    })
    .transpose()
}

fn query_named<K: Relation>(conn: &Connection, column: &str, value: i64) -> StoreResult<Vec<NamedRelation<K>>> {
    // JOIN both principal tables to fetch names in a single query
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT r.id, r.student_id, r.club_id, r.created_at,
                s.first_name || ' ' || s.last_name, c.name
         FROM {} r
         JOIN students s ON s.id = r.student_id
         JOIN clubs c ON c.id = r.club_id
         WHERE {} = ?1
         ORDER BY r.id",
        K::TABLE,
        column
    ))?;

    let rows = stmt
        .query_map([value], |row| {
            Ok(RelationRow {
                id: row.get(0)?,
                student_id: row.get(1)?,
                club_id: row.get(2)?,
                created_at: row.get(3)?,
                student_name: row.get(4)?,
                club_name: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|row| -> StoreResult<NamedRelation<K>> {
            Ok(NamedRelation {
                relation: K::from_parts(row.id, row.student_id, row.club_id, parse_timestamp(&row.created_at)?),
                student_name: row.student_name,
                club_name: row.club_name,
            })
        })
        .collect()
}
