use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::SqliteTx;
use crate::storage::{
    models::{Message, MessageCursor},
    traits::ChatStore,
};

const MESSAGE_COLUMNS: &str = "id, match_id, sender_id, content, read_at, created_at";

fn map_message_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        match_id: row.get(1)?,
        sender_id: row.get(2)?,
        content: row.get(3)?,
        read_at: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn db_insert_message(conn: &Connection, message: &Message) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO messages (id, match_id, sender_id, content, read_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            message.id,
            message.match_id,
            message.sender_id,
            message.content,
            message.read_at,
            message.created_at
        ],
    )?;
    Ok(())
}

fn db_list_messages(
    conn: &Connection,
    match_id: Uuid,
    before: Option<MessageCursor>,
    limit: u32,
) -> rusqlite::Result<Vec<Message>> {
    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT {MESSAGE_COLUMNS}
        FROM messages
        WHERE match_id = ?1
          AND (?2 IS NULL
               OR created_at < ?2
               OR (created_at = ?2
                   AND rowid < (SELECT rowid FROM messages WHERE id = ?3)))
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?4
        "#
    ))?;
    let before_at = before.map(|c| c.created_at);
    let before_id = before.and_then(|c| c.id);
    let rows = stmt
        .query_map(params![match_id, before_at, before_id, limit], map_message_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_last_message(conn: &Connection, match_id: Uuid) -> rusqlite::Result<Option<Message>> {
    conn.query_row(
        &format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE match_id = ?1
             ORDER BY created_at DESC, rowid DESC LIMIT 1"
        ),
        params![match_id],
        map_message_row,
    )
    .optional()
}

fn db_count_unread_in_match(conn: &Connection, match_id: Uuid, reader: Uuid) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM messages
         WHERE match_id = ?1 AND sender_id != ?2 AND read_at IS NULL",
        params![match_id, reader],
        |row| row.get(0),
    )
}

fn db_count_unread_messages(conn: &Connection, reader: Uuid) -> rusqlite::Result<i64> {
    conn.query_row(
        r#"
        SELECT COUNT(*)
        FROM messages m
        JOIN matches x ON x.id = m.match_id
        WHERE (x.user_a = ?1 OR x.user_b = ?1)
          AND m.sender_id != ?1
          AND m.read_at IS NULL
        "#,
        params![reader],
        |row| row.get(0),
    )
}

fn db_mark_messages_read(
    conn: &Connection,
    match_id: Uuid,
    reader: Uuid,
    at: DateTime<Utc>,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE messages SET read_at = ?3
         WHERE match_id = ?1 AND sender_id != ?2 AND read_at IS NULL",
        params![match_id, reader, at],
    )
}

impl ChatStore for SqliteTx {
    fn insert_message(&self, message: &Message) -> Result<()> {
        Ok(db_insert_message(&self.conn, message)?)
    }

    fn list_messages(
        &self,
        match_id: Uuid,
        before: Option<MessageCursor>,
        limit: u32,
    ) -> Result<Vec<Message>> {
        Ok(db_list_messages(&self.conn, match_id, before, limit)?)
    }

    fn last_message(&self, match_id: Uuid) -> Result<Option<Message>> {
        Ok(db_last_message(&self.conn, match_id)?)
    }

    fn count_unread_in_match(&self, match_id: Uuid, reader: Uuid) -> Result<i64> {
        Ok(db_count_unread_in_match(&self.conn, match_id, reader)?)
    }

    fn count_unread_messages(&self, reader: Uuid) -> Result<i64> {
        Ok(db_count_unread_messages(&self.conn, reader)?)
    }

    fn mark_messages_read(
        &self,
        match_id: Uuid,
        reader: Uuid,
        at: DateTime<Utc>,
    ) -> Result<usize> {
        Ok(db_mark_messages_read(&self.conn, match_id, reader, at)?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::storage::{
        models::{Match, Message, MessageCursor},
        ChatStore, MatchStore, Storage, StorageTx,
    };
    use uuid::Uuid;

    fn message(m: &Match, sender: Uuid, content: &str, minute: u32) -> Message {
        Message {
            id: Uuid::new_v4(),
            match_id: m.id,
            sender_id: sender,
            content: content.to_string(),
            read_at: None,
            created_at: at(12, minute),
        }
    }

    #[test]
    fn history_pages_backwards_and_tracks_unread() {
        let (_dir, storage) = temp_storage();
        let a = seed_profile(&storage, "a", &[]);
        let b = seed_profile(&storage, "b", &[]);
        let m = Match::between(Uuid::new_v4(), a.id, b.id, at(11, 0));

        let tx = storage.begin_tx().unwrap();
        tx.insert_match(&m).unwrap();
        tx.insert_message(&message(&m, a.id, "hi", 1)).unwrap();
        tx.insert_message(&message(&m, b.id, "hey", 2)).unwrap();
        tx.insert_message(&message(&m, a.id, "team up?", 3)).unwrap();
        tx.commit().unwrap();

        let read = storage.begin_read().unwrap();
        let newest = read.list_messages(m.id, None, 2).unwrap();
        let contents: Vec<_> = newest.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["team up?", "hey"]);

        let older = read
            .list_messages(
                m.id,
                Some(MessageCursor {
                    created_at: newest[1].created_at,
                    id: None,
                }),
                10,
            )
            .unwrap();
        assert_eq!(older.len(), 1);
        assert_eq!(older[0].content, "hi");

        assert_eq!(read.count_unread_in_match(m.id, b.id).unwrap(), 2);
        assert_eq!(read.count_unread_messages(a.id).unwrap(), 1);
        assert_eq!(
            read.last_message(m.id).unwrap().map(|m| m.content),
            Some("team up?".to_string())
        );
        drop(read);

        let tx = storage.begin_tx().unwrap();
        assert_eq!(tx.mark_messages_read(m.id, b.id, at(13, 0)).unwrap(), 2);
        assert_eq!(tx.mark_messages_read(m.id, b.id, at(13, 0)).unwrap(), 0);
        tx.commit().unwrap();

        let read = storage.begin_read().unwrap();
        assert_eq!(read.count_unread_messages(b.id).unwrap(), 0);
    }

    #[test]
    fn cursor_with_id_keeps_messages_sharing_a_timestamp() {
        let (_dir, storage) = temp_storage();
        let a = seed_profile(&storage, "a", &[]);
        let b = seed_profile(&storage, "b", &[]);
        let m = Match::between(Uuid::new_v4(), a.id, b.id, at(11, 0));

        let tx = storage.begin_tx().unwrap();
        tx.insert_match(&m).unwrap();
        tx.insert_message(&message(&m, a.id, "one", 5)).unwrap();
        tx.insert_message(&message(&m, b.id, "two", 5)).unwrap();
        tx.insert_message(&message(&m, a.id, "three", 5)).unwrap();
        tx.commit().unwrap();

        let read = storage.begin_read().unwrap();
        let mut seen = Vec::new();
        let mut cursor = None;
        loop {
            let page = read.list_messages(m.id, cursor, 1).unwrap();
            let Some(last) = page.last() else { break };
            seen.push(last.content.clone());
            cursor = Some(MessageCursor {
                created_at: last.created_at,
                id: Some(last.id),
            });
        }
        assert_eq!(seen, vec!["three", "two", "one"]);
    }

    #[test]
    fn deleting_a_match_drops_its_messages() {
        let (_dir, storage) = temp_storage();
        let a = seed_profile(&storage, "a", &[]);
        let b = seed_profile(&storage, "b", &[]);
        let m = Match::between(Uuid::new_v4(), a.id, b.id, at(11, 0));

        let tx = storage.begin_tx().unwrap();
        tx.insert_match(&m).unwrap();
        tx.insert_message(&message(&m, a.id, "hi", 1)).unwrap();
        tx.delete_match(m.id).unwrap();
        tx.commit().unwrap();

        let read = storage.begin_read().unwrap();
        assert!(read.load_match(m.id).unwrap().is_none());
        assert!(read.list_messages(m.id, None, 10).unwrap().is_empty());
    }
}
