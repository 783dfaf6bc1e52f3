//! Principal Resolver: checks that a `(kind, id)` pair names an existing
//! student or club, and looks up display names.

use std::collections::HashMap;

use chrono::Utc;
use clubhouse_types::{PrincipalKind, PrincipalRef};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use crate::Database;
use crate::error::{StoreError, StoreResult};
use crate::models::format_timestamp;

/// Clubs every fresh deployment starts with: (name, description, category).
pub const DEFAULT_CLUBS: &[(&str, &str, &str)] = &[
    (
        "Basketball Club",
        "A fun and competitive basketball group for all skill levels.",
        "Sport",
    ),
    ("Tennis Club", "Weekly tennis practice and friendly matches.", "Sport"),
    ("Art Club", "Painting, drawing, and creative expression.", "Culture"),
    (
        "Volunteer Society",
        "Make a difference in the community through volunteering.",
        "Volunteer",
    ),
    (
        "Coding Club",
        "Learn programming and build amazing projects together.",
        "Technology",
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub students: u64,
    pub clubs: u64,
    pub memberships: u64,
    pub bookmarks: u64,
    pub messages: u64,
}

fn table_for(kind: PrincipalKind) -> &'static str {
    match kind {
        PrincipalKind::Student => "students",
        PrincipalKind::Club => "clubs",
    }
}

/// Resolve on an existing connection, so callers can check principals inside
/// the same transaction as the write that depends on them.
pub fn resolve_in(conn: &Connection, kind: PrincipalKind, id: i64) -> StoreResult<PrincipalRef> {
    let sql = format!("SELECT 1 FROM {} WHERE id = ?1", table_for(kind));
    let found: Option<i64> = conn
        .prepare_cached(&sql)?
        .query_row([id], |row| row.get(0))
        .optional()?;

    match found {
        Some(_) => Ok(PrincipalRef { kind, id }),
        None => Err(StoreError::NotFound(format!("{} {}", kind, id))),
    }
}

impl Database {
    pub fn resolve(&self, kind: PrincipalKind, id: i64) -> StoreResult<PrincipalRef> {
        self.with_conn(|conn| resolve_in(conn, kind, id))
    }

    pub fn insert_student(&self, first_name: &str, last_name: &str, email: &str) -> StoreResult<i64> {
        self.transact(|conn| {
            conn.execute(
                "INSERT INTO students (first_name, last_name, email, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![first_name, last_name, email, format_timestamp(Utc::now())],
            )?;
            let id = conn.last_insert_rowid();
            debug!("Inserted student {} ({} {})", id, first_name, last_name);
            Ok(id)
        })
    }

    pub fn insert_club(&self, name: &str, description: &str, category: &str) -> StoreResult<i64> {
        self.transact(|conn| {
            conn.execute(
                "INSERT INTO clubs (name, description, category, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![name, description, category, format_timestamp(Utc::now())],
            )?;
            let id = conn.last_insert_rowid();
            debug!("Inserted club {} ({})", id, name);
            Ok(id)
        })
    }

    /// Insert any of [`DEFAULT_CLUBS`] not already present by name.
    /// Returns how many were inserted.
    pub fn seed_default_clubs(&self) -> StoreResult<usize> {
        let inserted = self.transact(|conn| {
            let now = format_timestamp(Utc::now());
            let mut stmt = conn.prepare_cached(
                "INSERT OR IGNORE INTO clubs (name, description, category, created_at) VALUES (?1, ?2, ?3, ?4)",
            )?;
            let mut inserted = 0;
            for (name, description, category) in DEFAULT_CLUBS {
                inserted += stmt.execute(params![name, description, category, now])?;
            }
            Ok(inserted)
        })?;

        info!("Club seeding complete ({} inserted)", inserted);
        Ok(inserted)
    }

    /// "First Last" for students, the club name for clubs.
    pub fn display_name(&self, principal: PrincipalRef) -> StoreResult<String> {
        self.display_names(&[principal])?
            .remove(&principal)
            .ok_or_else(|| StoreError::NotFound(principal.to_string()))
    }

    /// Batch name lookup, two queries regardless of how many refs are given.
    /// Unknown refs are simply absent from the result.
    pub fn display_names(&self, principals: &[PrincipalRef]) -> StoreResult<HashMap<PrincipalRef, String>> {
        let mut student_ids: Vec<i64> = Vec::new();
        let mut club_ids: Vec<i64> = Vec::new();
        for p in principals {
            match p.kind {
                PrincipalKind::Student => student_ids.push(p.id),
                PrincipalKind::Club => club_ids.push(p.id),
            }
        }
        student_ids.sort_unstable();
        student_ids.dedup();
        club_ids.sort_unstable();
        club_ids.dedup();

        self.with_conn(|conn| {
            let mut names = HashMap::with_capacity(student_ids.len() + club_ids.len());
            for (id, name) in query_names(
                conn,
                "SELECT id, first_name || ' ' || last_name FROM students",
                &student_ids,
            )? {
                names.insert(PrincipalRef::student(id), name);
            }
            for (id, name) in query_names(conn, "SELECT id, name FROM clubs", &club_ids)? {
                names.insert(PrincipalRef::club(id), name);
            }
            Ok(names)
        })
    }

    pub fn stats(&self) -> StoreResult<Stats> {
        self.with_conn(|conn| {
            let count = |table: &str| -> StoreResult<u64> {
                let n: i64 =
                    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
                Ok(n as u64)
            };
            Ok(Stats {
                students: count("students")?,
                clubs: count("clubs")?,
                memberships: count("memberships")?,
                bookmarks: count("bookmarks")?,
                messages: count("messages")?,
            })
        })
    }
}

fn query_names(conn: &Connection, select: &str, ids: &[i64]) -> StoreResult<Vec<(i64, String)>> {
    if ids.is_empty() {
        return Ok(vec![]);
    }

    let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!("{} WHERE id IN ({})", select, placeholders.join(", "));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(ids.iter()), |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}
