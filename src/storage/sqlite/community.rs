use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::SqliteTx;
use crate::storage::{
    models::{Block, Report, Star},
    traits::CommunityStore,
};

fn map_star_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Star> {
    Ok(Star {
        giver_id: row.get(0)?,
        receiver_id: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn map_block_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Block> {
    Ok(Block {
        blocker_id: row.get(0)?,
        blocked_id: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn db_load_star(conn: &Connection, giver: Uuid, receiver: Uuid) -> rusqlite::Result<Option<Star>> {
    conn.query_row(
        "SELECT giver_id, receiver_id, created_at FROM stars
         WHERE giver_id = ?1 AND receiver_id = ?2",
        params![giver, receiver],
        map_star_row,
    )
    .optional()
}

fn db_insert_star(conn: &Connection, star: &Star) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO stars (giver_id, receiver_id, created_at) VALUES (?1, ?2, ?3)",
        params![star.giver_id, star.receiver_id, star.created_at],
    )?;
    Ok(())
}

fn db_delete_star(conn: &Connection, giver: Uuid, receiver: Uuid) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM stars WHERE giver_id = ?1 AND receiver_id = ?2",
        params![giver, receiver],
    )
}

fn db_list_stars_received(
    conn: &Connection,
    receiver: Uuid,
    limit: u32,
) -> rusqlite::Result<Vec<Star>> {
    let mut stmt = conn.prepare(
        "SELECT giver_id, receiver_id, created_at FROM stars
         WHERE receiver_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(params![receiver, limit], map_star_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_load_block(conn: &Connection, blocker: Uuid, blocked: Uuid) -> rusqlite::Result<Option<Block>> {
    conn.query_row(
        "SELECT blocker_id, blocked_id, created_at FROM blocked_users
         WHERE blocker_id = ?1 AND blocked_id = ?2",
        params![blocker, blocked],
        map_block_row,
    )
    .optional()
}

fn db_is_blocked_pair(conn: &Connection, first: Uuid, second: Uuid) -> rusqlite::Result<bool> {
    conn.query_row(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM blocked_users
            WHERE (blocker_id = ?1 AND blocked_id = ?2)
               OR (blocker_id = ?2 AND blocked_id = ?1)
        )
        "#,
        params![first, second],
        |row| row.get(0),
    )
}

fn db_insert_block(conn: &Connection, block: &Block) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO blocked_users (blocker_id, blocked_id, created_at) VALUES (?1, ?2, ?3)",
        params![block.blocker_id, block.blocked_id, block.created_at],
    )?;
    Ok(())
}

fn db_delete_block(conn: &Connection, blocker: Uuid, blocked: Uuid) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM blocked_users WHERE blocker_id = ?1 AND blocked_id = ?2",
        params![blocker, blocked],
    )
}

fn db_list_blocked_by(conn: &Connection, blocker: Uuid) -> rusqlite::Result<Vec<Block>> {
    let mut stmt = conn.prepare(
        "SELECT blocker_id, blocked_id, created_at FROM blocked_users
         WHERE blocker_id = ?1 ORDER BY created_at DESC, rowid DESC",
    )?;
    let rows = stmt
        .query_map(params![blocker], map_block_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_insert_report(conn: &Connection, report: &Report) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO reports (id, reporter_id, reported_id, reason, details, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            report.id,
            report.reporter_id,
            report.reported_id,
            report.reason,
            report.details,
            report.created_at
        ],
    )?;
    Ok(())
}

impl CommunityStore for SqliteTx {
    fn load_star(&self, giver: Uuid, receiver: Uuid) -> Result<Option<Star>> {
        Ok(db_load_star(&self.conn, giver, receiver)?)
    }

    fn insert_star(&self, star: &Star) -> Result<()> {
        Ok(db_insert_star(&self.conn, star)?)
    }

    fn delete_star(&self, giver: Uuid, receiver: Uuid) -> Result<usize> {
        Ok(db_delete_star(&self.conn, giver, receiver)?)
    }

    fn list_stars_received(&self, receiver: Uuid, limit: u32) -> Result<Vec<Star>> {
        Ok(db_list_stars_received(&self.conn, receiver, limit)?)
    }

    fn load_block(&self, blocker: Uuid, blocked: Uuid) -> Result<Option<Block>> {
        Ok(db_load_block(&self.conn, blocker, blocked)?)
    }

    fn is_blocked_pair(&self, first: Uuid, second: Uuid) -> Result<bool> {
        Ok(db_is_blocked_pair(&self.conn, first, second)?)
    }

    fn insert_block(&self, block: &Block) -> Result<()> {
        Ok(db_insert_block(&self.conn, block)?)
    }

    fn delete_block(&self, blocker: Uuid, blocked: Uuid) -> Result<usize> {
        Ok(db_delete_block(&self.conn, blocker, blocked)?)
    }

    fn list_blocked_by(&self, blocker: Uuid) -> Result<Vec<Block>> {
        Ok(db_list_blocked_by(&self.conn, blocker)?)
    }

    fn insert_report(&self, report: &Report) -> Result<()> {
        Ok(db_insert_report(&self.conn, report)?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::storage::{models::Block, CommunityStore, Storage, StorageTx};

    #[test]
    fn block_is_symmetric_for_pair_checks() {
        let (_dir, storage) = temp_storage();
        let a = seed_profile(&storage, "a", &[]);
        let b = seed_profile(&storage, "b", &[]);

        let tx = storage.begin_tx().unwrap();
        tx.insert_block(&Block {
            blocker_id: a.id,
            blocked_id: b.id,
            created_at: at(15, 0),
        })
        .unwrap();
        tx.commit().unwrap();

        let read = storage.begin_read().unwrap();
        assert!(read.is_blocked_pair(a.id, b.id).unwrap());
        assert!(read.is_blocked_pair(b.id, a.id).unwrap());
        assert!(read.load_block(b.id, a.id).unwrap().is_none());
        assert_eq!(read.list_blocked_by(a.id).unwrap().len(), 1);
        drop(read);

        let tx = storage.begin_tx().unwrap();
        assert_eq!(tx.delete_block(a.id, b.id).unwrap(), 1);
        tx.commit().unwrap();
        let read = storage.begin_read().unwrap();
        assert!(!read.is_blocked_pair(a.id, b.id).unwrap());
    }
}
