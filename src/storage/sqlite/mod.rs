mod chat;
mod community;
mod matching;
mod notifications;
mod profiles;
mod reputation;
mod teams;

use anyhow::Result;
use rusqlite::{functions::FunctionFlags, types::Type, Connection};
use std::path::Path;

use super::traits::{Storage, StorageTx};

const DB_SCHEMA_VERSION: i64 = 1;

#[derive(Clone)]
pub struct SqliteStorage {
    pub path: String,
}

pub struct SqliteTx {
    conn: Connection,
}

impl StorageTx for SqliteTx {
    fn commit(self) -> Result<()> {
        self.conn.execute("COMMIT", [])?;
        Ok(())
    }
}

impl Storage for SqliteStorage {
    type Tx = SqliteTx;

    fn begin_tx(&self) -> Result<Self::Tx> {
        let conn = Self::open(&self.path)?;
        conn.execute("BEGIN IMMEDIATE", [])?;
        Ok(SqliteTx { conn })
    }

    fn begin_read(&self) -> Result<Self::Tx> {
        let conn = Self::open(&self.path)?;
        conn.execute("BEGIN DEFERRED", [])?;
        Ok(SqliteTx { conn })
    }
}

impl SqliteStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_string_lossy().to_string(),
        }
    }

    pub fn reset_all(&self) -> Result<()> {
        for suffix in ["", "-wal", "-shm"] {
            let path = format!("{}{}", self.path, suffix);
            if Path::new(&path).exists() {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    pub fn init(&self) -> Result<()> {
        let conn = Self::open(&self.path)?;
        Self::migrate(&conn)?;
        Ok(())
    }

    fn open(path: &str) -> rusqlite::Result<Connection> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(std::time::Duration::from_millis(500))?;
        register_functions(&conn)?;
        Ok(conn)
    }

    fn migrate(conn: &Connection) -> rusqlite::Result<()> {
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version == DB_SCHEMA_VERSION {
            return Ok(());
        }

        log::info!(
            "SQLite schema migration: {} -> {}",
            version,
            DB_SCHEMA_VERSION
        );

        if version == 0 {
            conn.execute_batch(SCHEMA_V1)?;
            conn.pragma_update(None, "user_version", DB_SCHEMA_VERSION)?;
            return Ok(());
        }

        Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::ErrorCode::SchemaChanged as i32),
            Some("database schema version mismatch; please run with --reset option".to_string()),
        ))
    }
}

const SCHEMA_V1: &str = r#"
CREATE TABLE profiles (
    id BLOB PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL,
    college TEXT NOT NULL,
    branch TEXT,
    year INTEGER,
    bio TEXT,
    skills TEXT NOT NULL DEFAULT '[]',
    interests TEXT NOT NULL DEFAULT '[]',
    github_username TEXT,
    linkedin_url TEXT,
    avatar_url TEXT,
    reputation INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX profiles_reputation_idx ON profiles(reputation DESC, username);

CREATE TABLE swipes (
    id BLOB PRIMARY KEY,
    swiper_id BLOB NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    target_id BLOB NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    direction TEXT NOT NULL CHECK (direction IN ('like', 'pass')),
    created_at TEXT NOT NULL,
    UNIQUE (swiper_id, target_id)
);

CREATE TABLE matches (
    id BLOB PRIMARY KEY,
    user_a BLOB NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    user_b BLOB NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    CHECK (user_a < user_b),
    UNIQUE (user_a, user_b)
);
CREATE INDEX matches_user_b_idx ON matches(user_b);

CREATE TABLE messages (
    id BLOB PRIMARY KEY,
    match_id BLOB NOT NULL REFERENCES matches(id) ON DELETE CASCADE,
    sender_id BLOB NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    content TEXT NOT NULL,
    read_at TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX messages_match_created_idx ON messages(match_id, created_at);

CREATE TABLE teams (
    id BLOB PRIMARY KEY,
    owner_id BLOB NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    description TEXT,
    required_skills TEXT NOT NULL DEFAULT '[]',
    max_members INTEGER NOT NULL CHECK (max_members > 0),
    is_open INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE team_members (
    team_id BLOB NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
    user_id BLOB NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    role TEXT NOT NULL CHECK (role IN ('owner', 'admin', 'member')),
    joined_at TEXT NOT NULL,
    PRIMARY KEY (team_id, user_id)
);
CREATE INDEX team_members_user_idx ON team_members(user_id);

CREATE TABLE team_applications (
    id BLOB PRIMARY KEY,
    team_id BLOB NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
    user_id BLOB NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    kind TEXT NOT NULL CHECK (kind IN ('application', 'invite')),
    status TEXT NOT NULL CHECK (status IN ('pending', 'approved', 'rejected')),
    message TEXT,
    invited_by BLOB REFERENCES profiles(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL,
    responded_at TEXT
);
CREATE UNIQUE INDEX team_applications_pending_idx
    ON team_applications(team_id, user_id)
    WHERE status = 'pending';

CREATE TABLE notifications (
    id BLOB PRIMARY KEY,
    user_id BLOB NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    kind TEXT NOT NULL,
    actor_id BLOB,
    subject_id BLOB,
    body TEXT NOT NULL,
    read INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
CREATE INDEX notifications_user_created_idx ON notifications(user_id, created_at);

CREATE TABLE reputation_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id BLOB NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    action TEXT NOT NULL,
    points INTEGER NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX reputation_events_user_created_idx ON reputation_events(user_id, created_at);

CREATE TABLE stars (
    giver_id BLOB NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    receiver_id BLOB NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    PRIMARY KEY (giver_id, receiver_id)
);

CREATE TABLE blocked_users (
    blocker_id BLOB NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    blocked_id BLOB NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    PRIMARY KEY (blocker_id, blocked_id)
);

CREATE TABLE reports (
    id BLOB PRIMARY KEY,
    reporter_id BLOB NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    reported_id BLOB NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    reason TEXT NOT NULL,
    details TEXT,
    created_at TEXT NOT NULL
);
"#;

fn encode_list(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

fn decode_list(idx: usize, raw: &str) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

/// SQLite's `lower()` and `LIKE` only fold ASCII. `unicode_lower` folds like
/// `str::to_lowercase`, so `Émile` and `émile` compare equal.
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "unicode_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )
}

/// Escapes `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
fn like_pattern(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('%');
    for ch in text.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, TimeZone, Utc};
    use tempfile::TempDir;
    use uuid::Uuid;

    use super::SqliteStorage;
    use crate::storage::{models::Profile, ProfileStore, Storage, StorageTx};

    pub fn temp_storage() -> (TempDir, SqliteStorage) {
        let dir = TempDir::new().unwrap();
        let storage = SqliteStorage::new(dir.path().join("campusmatch.sqlite"));
        storage.init().unwrap();
        (dir, storage)
    }

    pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 14, hour, minute, 0).unwrap()
    }

    pub fn profile(username: &str, skills: &[&str]) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            username: username.to_string(),
            full_name: format!("{} Example", username),
            college: "IIT Delhi".to_string(),
            branch: None,
            year: Some(2),
            bio: None,
            skills: skills.iter().map(|s| s.to_string()).collect(),
            interests: Vec::new(),
            github_username: None,
            linkedin_url: None,
            avatar_url: None,
            reputation: 0,
            created_at: at(9, 0),
            updated_at: at(9, 0),
        }
    }

    pub fn seed_profile(storage: &SqliteStorage, username: &str, skills: &[&str]) -> Profile {
        let p = profile(username, skills);
        let tx = storage.begin_tx().unwrap();
        tx.insert_profile(&p).unwrap();
        tx.commit().unwrap();
        p
    }
}
