use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::SqliteTx;
use crate::storage::{
    models::{Match, Swipe},
    traits::MatchStore,
};

fn map_swipe_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Swipe> {
    Ok(Swipe {
        id: row.get(0)?,
        swiper_id: row.get(1)?,
        target_id: row.get(2)?,
        direction: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_match_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Match> {
    Ok(Match {
        id: row.get(0)?,
        user_a: row.get(1)?,
        user_b: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn db_load_swipe(conn: &Connection, swiper: Uuid, target: Uuid) -> rusqlite::Result<Option<Swipe>> {
    conn.query_row(
        "SELECT id, swiper_id, target_id, direction, created_at FROM swipes
         WHERE swiper_id = ?1 AND target_id = ?2",
        params![swiper, target],
        map_swipe_row,
    )
    .optional()
}

fn db_insert_swipe(conn: &Connection, swipe: &Swipe) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO swipes (id, swiper_id, target_id, direction, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            swipe.id,
            swipe.swiper_id,
            swipe.target_id,
            swipe.direction,
            swipe.created_at
        ],
    )?;
    Ok(())
}

fn db_load_match(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<Match>> {
    conn.query_row(
        "SELECT id, user_a, user_b, created_at FROM matches WHERE id = ?1",
        params![id],
        map_match_row,
    )
    .optional()
}

fn db_find_match_between(
    conn: &Connection,
    first: Uuid,
    second: Uuid,
) -> rusqlite::Result<Option<Match>> {
    let (user_a, user_b) = if first < second {
        (first, second)
    } else {
        (second, first)
    };
    conn.query_row(
        "SELECT id, user_a, user_b, created_at FROM matches WHERE user_a = ?1 AND user_b = ?2",
        params![user_a, user_b],
        map_match_row,
    )
    .optional()
}

fn db_list_matches_for(conn: &Connection, user: Uuid) -> rusqlite::Result<Vec<Match>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, user_a, user_b, created_at
        FROM matches
        WHERE user_a = ?1 OR user_b = ?1
        ORDER BY created_at DESC, rowid DESC
        "#,
    )?;
    let rows = stmt
        .query_map(params![user], map_match_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_insert_match(conn: &Connection, m: &Match) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO matches (id, user_a, user_b, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![m.id, m.user_a, m.user_b, m.created_at],
    )?;
    Ok(())
}

fn db_delete_match(conn: &Connection, id: Uuid) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM messages WHERE match_id = ?1", params![id])?;
    conn.execute("DELETE FROM matches WHERE id = ?1", params![id])?;
    Ok(())
}

impl MatchStore for SqliteTx {
    fn load_swipe(&self, swiper: Uuid, target: Uuid) -> Result<Option<Swipe>> {
        Ok(db_load_swipe(&self.conn, swiper, target)?)
    }

    fn insert_swipe(&self, swipe: &Swipe) -> Result<()> {
        Ok(db_insert_swipe(&self.conn, swipe)?)
    }

    fn load_match(&self, id: Uuid) -> Result<Option<Match>> {
        Ok(db_load_match(&self.conn, id)?)
    }

    fn find_match_between(&self, first: Uuid, second: Uuid) -> Result<Option<Match>> {
        Ok(db_find_match_between(&self.conn, first, second)?)
    }

    fn list_matches_for(&self, user: Uuid) -> Result<Vec<Match>> {
        Ok(db_list_matches_for(&self.conn, user)?)
    }

    fn insert_match(&self, m: &Match) -> Result<()> {
        Ok(db_insert_match(&self.conn, m)?)
    }

    fn delete_match(&self, id: Uuid) -> Result<()> {
        Ok(db_delete_match(&self.conn, id)?)
    }
}
