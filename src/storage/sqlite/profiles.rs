use anyhow::Result;
use rusqlite::{params, params_from_iter, types::Value, Connection, OptionalExtension};
use uuid::Uuid;

use super::{decode_list, encode_list, like_pattern, SqliteTx};
use crate::storage::{
    models::{Profile, ProfileQuery},
    traits::ProfileStore,
};

const PROFILE_COLUMNS: &str = "p.id, p.username, p.full_name, p.college, p.branch, p.year, p.bio, \
     p.skills, p.interests, p.github_username, p.linkedin_url, p.avatar_url, p.reputation, \
     p.created_at, p.updated_at";

fn map_profile_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Profile> {
    let skills: String = row.get(7)?;
    let interests: String = row.get(8)?;
    Ok(Profile {
        id: row.get(0)?,
        username: row.get(1)?,
        full_name: row.get(2)?,
        college: row.get(3)?,
        branch: row.get(4)?,
        year: row.get(5)?,
        bio: row.get(6)?,
        skills: decode_list(7, &skills)?,
        interests: decode_list(8, &interests)?,
        github_username: row.get(9)?,
        linkedin_url: row.get(10)?,
        avatar_url: row.get(11)?,
        reputation: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

fn db_load_profile(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<Profile>> {
    conn.query_row(
        &format!("SELECT {PROFILE_COLUMNS} FROM profiles p WHERE p.id = ?1"),
        params![id],
        map_profile_row,
    )
    .optional()
}

fn db_load_profile_by_username(
    conn: &Connection,
    username: &str,
) -> rusqlite::Result<Option<Profile>> {
    conn.query_row(
        &format!("SELECT {PROFILE_COLUMNS} FROM profiles p WHERE p.username = ?1"),
        params![username],
        map_profile_row,
    )
    .optional()
}

fn db_search_profiles(conn: &Connection, query: &ProfileQuery) -> rusqlite::Result<Vec<Profile>> {
    let mut clauses: Vec<&str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(college) = &query.college {
        clauses.push("unicode_lower(p.college) = unicode_lower(?)");
        values.push(Value::Text(college.clone()));
    }
    if let Some(skill) = &query.skill {
        clauses.push(
            "EXISTS (SELECT 1 FROM json_each(p.skills) s \
             WHERE unicode_lower(s.value) = unicode_lower(?))",
        );
        values.push(Value::Text(skill.clone()));
    }
    if let Some(text) = &query.text {
        let pattern = like_pattern(text);
        clauses.push(
            "(unicode_lower(p.username) LIKE ? ESCAPE '\\' \
             OR unicode_lower(p.full_name) LIKE ? ESCAPE '\\')",
        );
        values.push(Value::Text(pattern.clone()));
        values.push(Value::Text(pattern));
    }
    values.push(Value::Integer(query.limit as i64));

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles p {where_sql} \
         ORDER BY p.reputation DESC, p.username ASC LIMIT ?"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), map_profile_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_list_discover_candidates(conn: &Connection, user: Uuid) -> rusqlite::Result<Vec<Profile>> {
    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT {PROFILE_COLUMNS}
        FROM profiles p
        WHERE p.id != ?1
          AND NOT EXISTS (
              SELECT 1 FROM swipes s WHERE s.swiper_id = ?1 AND s.target_id = p.id
          )
          AND NOT EXISTS (
              SELECT 1 FROM blocked_users b
              WHERE (b.blocker_id = ?1 AND b.blocked_id = p.id)
                 OR (b.blocker_id = p.id AND b.blocked_id = ?1)
          )
        ORDER BY p.username
        "#
    ))?;
    let rows = stmt
        .query_map(params![user], map_profile_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_leaderboard(
    conn: &Connection,
    college: Option<&str>,
    limit: u32,
) -> rusqlite::Result<Vec<Profile>> {
    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT {PROFILE_COLUMNS}
        FROM profiles p
        WHERE ?1 IS NULL OR unicode_lower(p.college) = unicode_lower(?1)
        ORDER BY p.reputation DESC, p.username ASC
        LIMIT ?2
        "#
    ))?;
    let rows = stmt
        .query_map(params![college, limit], map_profile_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_insert_profile(conn: &Connection, profile: &Profile) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO profiles (
            id, username, full_name, college, branch, year, bio, skills, interests,
            github_username, linkedin_url, avatar_url, reputation, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        "#,
        params![
            profile.id,
            profile.username,
            profile.full_name,
            profile.college,
            profile.branch,
            profile.year,
            profile.bio,
            encode_list(&profile.skills),
            encode_list(&profile.interests),
            profile.github_username,
            profile.linkedin_url,
            profile.avatar_url,
            profile.reputation,
            profile.created_at,
            profile.updated_at,
        ],
    )?;
    Ok(())
}

/// Reputation is owned by the reputation ledger and is left untouched here.
fn db_update_profile(conn: &Connection, profile: &Profile) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        UPDATE profiles
        SET full_name = ?2,
            college = ?3,
            branch = ?4,
            year = ?5,
            bio = ?6,
            skills = ?7,
            interests = ?8,
            github_username = ?9,
            linkedin_url = ?10,
            avatar_url = ?11,
            updated_at = ?12
        WHERE id = ?1
        "#,
        params![
            profile.id,
            profile.full_name,
            profile.college,
            profile.branch,
            profile.year,
            profile.bio,
            encode_list(&profile.skills),
            encode_list(&profile.interests),
            profile.github_username,
            profile.linkedin_url,
            profile.avatar_url,
            profile.updated_at,
        ],
    )?;
    Ok(())
}

impl ProfileStore for SqliteTx {
    fn load_profile(&self, id: Uuid) -> Result<Option<Profile>> {
        Ok(db_load_profile(&self.conn, id)?)
    }

    fn load_profile_by_username(&self, username: &str) -> Result<Option<Profile>> {
        Ok(db_load_profile_by_username(&self.conn, username)?)
    }

    fn search_profiles(&self, query: &ProfileQuery) -> Result<Vec<Profile>> {
        Ok(db_search_profiles(&self.conn, query)?)
    }

    fn list_discover_candidates(&self, user: Uuid) -> Result<Vec<Profile>> {
        Ok(db_list_discover_candidates(&self.conn, user)?)
    }

    fn leaderboard(&self, college: Option<&str>, limit: u32) -> Result<Vec<Profile>> {
        Ok(db_leaderboard(&self.conn, college, limit)?)
    }

    fn insert_profile(&self, profile: &Profile) -> Result<()> {
        Ok(db_insert_profile(&self.conn, profile)?)
    }

    fn update_profile(&self, profile: &Profile) -> Result<()> {
        Ok(db_update_profile(&self.conn, profile)?)
    }
}
