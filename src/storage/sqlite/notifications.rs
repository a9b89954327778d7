use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::SqliteTx;
use crate::storage::{models::Notification, traits::NotificationStore};

const NOTIFICATION_COLUMNS: &str = "id, user_id, kind, actor_id, subject_id, body, read, created_at";

fn map_notification_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Notification> {
    let read: i64 = row.get(6)?;
    Ok(Notification {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: row.get(2)?,
        actor_id: row.get(3)?,
        subject_id: row.get(4)?,
        body: row.get(5)?,
        read: read != 0,
        created_at: row.get(7)?,
    })
}

fn db_insert_notification(conn: &Connection, n: &Notification) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO notifications ({NOTIFICATION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
        ),
        params![
            n.id,
            n.user_id,
            n.kind,
            n.actor_id,
            n.subject_id,
            n.body,
            n.read as i64,
            n.created_at
        ],
    )?;
    Ok(())
}

fn db_load_notification(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<Notification>> {
    conn.query_row(
        &format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?1"),
        params![id],
        map_notification_row,
    )
    .optional()
}

fn db_list_notifications(
    conn: &Connection,
    user_id: Uuid,
    unread_only: bool,
    limit: u32,
) -> rusqlite::Result<Vec<Notification>> {
    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT {NOTIFICATION_COLUMNS}
        FROM notifications
        WHERE user_id = ?1 AND (?2 = 0 OR read = 0)
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?3
        "#
    ))?;
    let rows = stmt
        .query_map(
            params![user_id, unread_only as i64, limit],
            map_notification_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_mark_notification_read(conn: &Connection, id: Uuid) -> rusqlite::Result<()> {
    conn.execute("UPDATE notifications SET read = 1 WHERE id = ?1", params![id])?;
    Ok(())
}

fn db_mark_all_notifications_read(conn: &Connection, user_id: Uuid) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE notifications SET read = 1 WHERE user_id = ?1 AND read = 0",
        params![user_id],
    )
}

fn db_count_unread_notifications(conn: &Connection, user_id: Uuid) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND read = 0",
        params![user_id],
        |row| row.get(0),
    )
}

impl NotificationStore for SqliteTx {
    fn insert_notification(&self, notification: &Notification) -> Result<()> {
        Ok(db_insert_notification(&self.conn, notification)?)
    }

    fn load_notification(&self, id: Uuid) -> Result<Option<Notification>> {
        Ok(db_load_notification(&self.conn, id)?)
    }

    fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: u32,
    ) -> Result<Vec<Notification>> {
        Ok(db_list_notifications(&self.conn, user_id, unread_only, limit)?)
    }

    fn mark_notification_read(&self, id: Uuid) -> Result<()> {
        Ok(db_mark_notification_read(&self.conn, id)?)
    }

    fn mark_all_notifications_read(&self, user_id: Uuid) -> Result<usize> {
        Ok(db_mark_all_notifications_read(&self.conn, user_id)?)
    }

    fn count_unread_notifications(&self, user_id: Uuid) -> Result<i64> {
        Ok(db_count_unread_notifications(&self.conn, user_id)?)
    }
}
