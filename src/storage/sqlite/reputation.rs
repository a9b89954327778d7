use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::SqliteTx;
use crate::{
    storage::{models::ReputationEvent, traits::ReputationStore},
    types::ReputationAction,
};

/// Actions excluded from the daily cap. Kept in sync with
/// `ReputationAction::is_one_time`.
const UNCAPPED_ACTIONS: &str = "'link_github', 'link_linkedin'";

fn map_event_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReputationEvent> {
    Ok(ReputationEvent {
        user_id: row.get(0)?,
        action: row.get(1)?,
        points: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn db_insert_reputation_event(conn: &Connection, event: &ReputationEvent) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO reputation_events (user_id, action, points, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![event.user_id, event.action, event.points, event.created_at],
    )?;
    Ok(())
}

fn db_add_reputation(conn: &Connection, user_id: Uuid, delta: i64) -> rusqlite::Result<()> {
    let rows = conn.execute(
        "UPDATE profiles SET reputation = reputation + ?2 WHERE id = ?1",
        params![user_id, delta],
    )?;
    if rows == 0 {
        return Err(rusqlite::Error::QueryReturnedNoRows);
    }
    Ok(())
}

fn db_has_reputation_event(
    conn: &Connection,
    user_id: Uuid,
    action: ReputationAction,
) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM reputation_events WHERE user_id = ?1 AND action = ?2)",
        params![user_id, action],
        |row| row.get(0),
    )
}

fn db_sum_capped_points_since(
    conn: &Connection,
    user_id: Uuid,
    since: DateTime<Utc>,
) -> rusqlite::Result<i64> {
    conn.query_row(
        &format!(
            "SELECT COALESCE(SUM(points), 0) FROM reputation_events
             WHERE user_id = ?1 AND created_at >= ?2 AND action NOT IN ({UNCAPPED_ACTIONS})"
        ),
        params![user_id, since],
        |row| row.get(0),
    )
}

fn db_list_reputation_events(
    conn: &Connection,
    user_id: Uuid,
    limit: u32,
) -> rusqlite::Result<Vec<ReputationEvent>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, action, points, created_at FROM reputation_events
         WHERE user_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(params![user_id, limit], map_event_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

impl ReputationStore for SqliteTx {
    fn insert_reputation_event(&self, event: &ReputationEvent) -> Result<()> {
        Ok(db_insert_reputation_event(&self.conn, event)?)
    }

    fn add_reputation(&self, user_id: Uuid, delta: i64) -> Result<()> {
        Ok(db_add_reputation(&self.conn, user_id, delta)?)
    }

    fn has_reputation_event(&self, user_id: Uuid, action: ReputationAction) -> Result<bool> {
        Ok(db_has_reputation_event(&self.conn, user_id, action)?)
    }

    fn sum_capped_points_since(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<i64> {
        Ok(db_sum_capped_points_since(&self.conn, user_id, since)?)
    }

    fn list_reputation_events(&self, user_id: Uuid, limit: u32) -> Result<Vec<ReputationEvent>> {
        Ok(db_list_reputation_events(&self.conn, user_id, limit)?)
    }
}
