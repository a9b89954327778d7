use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{decode_list, encode_list, SqliteTx};
use crate::{
    storage::{
        models::{Team, TeamApplication, TeamMember, TeamQuery},
        traits::TeamStore,
    },
    types::{ApplicationStatus, TeamRole},
};

const TEAM_COLUMNS: &str =
    "t.id, t.owner_id, t.name, t.description, t.required_skills, t.max_members, t.is_open, t.created_at";
const APPLICATION_COLUMNS: &str =
    "id, team_id, user_id, kind, status, message, invited_by, created_at, responded_at";

fn map_team_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Team> {
    let skills: String = row.get(4)?;
    let is_open: i64 = row.get(6)?;
    Ok(Team {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        required_skills: decode_list(4, &skills)?,
        max_members: row.get(5)?,
        is_open: is_open != 0,
        created_at: row.get(7)?,
    })
}

fn map_member_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TeamMember> {
    Ok(TeamMember {
        team_id: row.get(0)?,
        user_id: row.get(1)?,
        role: row.get(2)?,
        joined_at: row.get(3)?,
    })
}

fn map_application_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TeamApplication> {
    Ok(TeamApplication {
        id: row.get(0)?,
        team_id: row.get(1)?,
        user_id: row.get(2)?,
        kind: row.get(3)?,
        status: row.get(4)?,
        message: row.get(5)?,
        invited_by: row.get(6)?,
        created_at: row.get(7)?,
        responded_at: row.get(8)?,
    })
}

fn db_load_team(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<Team>> {
    conn.query_row(
        &format!("SELECT {TEAM_COLUMNS} FROM teams t WHERE t.id = ?1"),
        params![id],
        map_team_row,
    )
    .optional()
}

fn db_list_teams(conn: &Connection, query: &TeamQuery) -> rusqlite::Result<Vec<Team>> {
    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT {TEAM_COLUMNS}
        FROM teams t
        WHERE (?1 IS NULL OR t.is_open = ?1)
          AND (?2 IS NULL OR EXISTS (
              SELECT 1 FROM json_each(t.required_skills) s WHERE unicode_lower(s.value) = unicode_lower(?2)
          ))
        ORDER BY t.created_at DESC, t.rowid DESC
        LIMIT ?3
        "#
    ))?;
    let open = query.open.map(i64::from);
    let rows = stmt
        .query_map(params![open, query.skill, query.limit], map_team_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_insert_team(conn: &Connection, team: &Team) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO teams (id, owner_id, name, description, required_skills, max_members, is_open, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            team.id,
            team.owner_id,
            team.name,
            team.description,
            encode_list(&team.required_skills),
            team.max_members,
            team.is_open as i64,
            team.created_at
        ],
    )?;
    Ok(())
}

fn db_update_team(conn: &Connection, team: &Team) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        UPDATE teams
        SET name = ?2, description = ?3, required_skills = ?4, max_members = ?5, is_open = ?6
        WHERE id = ?1
        "#,
        params![
            team.id,
            team.name,
            team.description,
            encode_list(&team.required_skills),
            team.max_members,
            team.is_open as i64
        ],
    )?;
    Ok(())
}

fn db_load_member(
    conn: &Connection,
    team_id: Uuid,
    user_id: Uuid,
) -> rusqlite::Result<Option<TeamMember>> {
    conn.query_row(
        "SELECT team_id, user_id, role, joined_at FROM team_members
         WHERE team_id = ?1 AND user_id = ?2",
        params![team_id, user_id],
        map_member_row,
    )
    .optional()
}

fn db_list_members(conn: &Connection, team_id: Uuid) -> rusqlite::Result<Vec<TeamMember>> {
    let mut stmt = conn.prepare(
        "SELECT team_id, user_id, role, joined_at FROM team_members
         WHERE team_id = ?1 ORDER BY joined_at, rowid",
    )?;
    let rows = stmt
        .query_map(params![team_id], map_member_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_list_memberships_for(conn: &Connection, user_id: Uuid) -> rusqlite::Result<Vec<TeamMember>> {
    let mut stmt = conn.prepare(
        "SELECT team_id, user_id, role, joined_at FROM team_members
         WHERE user_id = ?1 ORDER BY joined_at DESC, rowid DESC",
    )?;
    let rows = stmt
        .query_map(params![user_id], map_member_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_count_members(conn: &Connection, team_id: Uuid) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COUNT(*) FROM team_members WHERE team_id = ?1",
        params![team_id],
        |row| row.get(0),
    )
}

fn db_insert_member(conn: &Connection, member: &TeamMember) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO team_members (team_id, user_id, role, joined_at) VALUES (?1, ?2, ?3, ?4)",
        params![member.team_id, member.user_id, member.role, member.joined_at],
    )?;
    Ok(())
}

fn db_update_member_role(
    conn: &Connection,
    team_id: Uuid,
    user_id: Uuid,
    role: TeamRole,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE team_members SET role = ?3 WHERE team_id = ?1 AND user_id = ?2",
        params![team_id, user_id, role],
    )?;
    Ok(())
}

fn db_delete_member(conn: &Connection, team_id: Uuid, user_id: Uuid) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM team_members WHERE team_id = ?1 AND user_id = ?2",
        params![team_id, user_id],
    )
}

fn db_load_application(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<TeamApplication>> {
    conn.query_row(
        &format!("SELECT {APPLICATION_COLUMNS} FROM team_applications WHERE id = ?1"),
        params![id],
        map_application_row,
    )
    .optional()
}

fn db_find_pending_application(
    conn: &Connection,
    team_id: Uuid,
    user_id: Uuid,
) -> rusqlite::Result<Option<TeamApplication>> {
    conn.query_row(
        &format!(
            "SELECT {APPLICATION_COLUMNS} FROM team_applications
             WHERE team_id = ?1 AND user_id = ?2 AND status = 'pending'"
        ),
        params![team_id, user_id],
        map_application_row,
    )
    .optional()
}

fn db_list_pending_applications(
    conn: &Connection,
    team_id: Uuid,
) -> rusqlite::Result<Vec<TeamApplication>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPLICATION_COLUMNS} FROM team_applications
         WHERE team_id = ?1 AND status = 'pending'
         ORDER BY created_at, rowid"
    ))?;
    let rows = stmt
        .query_map(params![team_id], map_application_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_insert_application(conn: &Connection, app: &TeamApplication) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO team_applications ({APPLICATION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
        ),
        params![
            app.id,
            app.team_id,
            app.user_id,
            app.kind,
            app.status,
            app.message,
            app.invited_by,
            app.created_at,
            app.responded_at
        ],
    )?;
    Ok(())
}

fn db_update_application_status(
    conn: &Connection,
    id: Uuid,
    status: ApplicationStatus,
    at: DateTime<Utc>,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE team_applications SET status = ?2, responded_at = ?3 WHERE id = ?1",
        params![id, status, at],
    )?;
    Ok(())
}

fn db_count_pending_applications_managed_by(
    conn: &Connection,
    user_id: Uuid,
) -> rusqlite::Result<i64> {
    conn.query_row(
        r#"
        SELECT COUNT(*)
        FROM team_applications a
        JOIN team_members m ON m.team_id = a.team_id
        WHERE m.user_id = ?1
          AND m.role IN ('owner', 'admin')
          AND a.kind = 'application'
          AND a.status = 'pending'
        "#,
        params![user_id],
        |row| row.get(0),
    )
}

fn db_count_pending_invites_for(conn: &Connection, user_id: Uuid) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM team_applications
         WHERE user_id = ?1 AND kind = 'invite' AND status = 'pending'",
        params![user_id],
        |row| row.get(0),
    )
}

impl TeamStore for SqliteTx {
    fn load_team(&self, id: Uuid) -> Result<Option<Team>> {
        Ok(db_load_team(&self.conn, id)?)
    }

    fn list_teams(&self, query: &TeamQuery) -> Result<Vec<Team>> {
        Ok(db_list_teams(&self.conn, query)?)
    }

    fn insert_team(&self, team: &Team) -> Result<()> {
        Ok(db_insert_team(&self.conn, team)?)
    }

    fn update_team(&self, team: &Team) -> Result<()> {
        Ok(db_update_team(&self.conn, team)?)
    }

    fn load_member(&self, team_id: Uuid, user_id: Uuid) -> Result<Option<TeamMember>> {
        Ok(db_load_member(&self.conn, team_id, user_id)?)
    }

    fn list_members(&self, team_id: Uuid) -> Result<Vec<TeamMember>> {
        Ok(db_list_members(&self.conn, team_id)?)
    }

    fn list_memberships_for(&self, user_id: Uuid) -> Result<Vec<TeamMember>> {
        Ok(db_list_memberships_for(&self.conn, user_id)?)
    }

    fn count_members(&self, team_id: Uuid) -> Result<u32> {
        Ok(db_count_members(&self.conn, team_id)?)
    }

    fn insert_member(&self, member: &TeamMember) -> Result<()> {
        Ok(db_insert_member(&self.conn, member)?)
    }

    fn update_member_role(&self, team_id: Uuid, user_id: Uuid, role: TeamRole) -> Result<()> {
        Ok(db_update_member_role(&self.conn, team_id, user_id, role)?)
    }

    fn delete_member(&self, team_id: Uuid, user_id: Uuid) -> Result<usize> {
        Ok(db_delete_member(&self.conn, team_id, user_id)?)
    }

    fn load_application(&self, id: Uuid) -> Result<Option<TeamApplication>> {
        Ok(db_load_application(&self.conn, id)?)
    }

    fn find_pending_application(
        &self,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<TeamApplication>> {
        Ok(db_find_pending_application(&self.conn, team_id, user_id)?)
    }

    fn list_pending_applications(&self, team_id: Uuid) -> Result<Vec<TeamApplication>> {
        Ok(db_list_pending_applications(&self.conn, team_id)?)
    }

    fn insert_application(&self, application: &TeamApplication) -> Result<()> {
        Ok(db_insert_application(&self.conn, application)?)
    }

    fn update_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
        at: DateTime<Utc>,
    ) -> Result<()> {
        Ok(db_update_application_status(&self.conn, id, status, at)?)
    }

    fn count_pending_applications_managed_by(&self, user_id: Uuid) -> Result<i64> {
        Ok(db_count_pending_applications_managed_by(&self.conn, user_id)?)
    }

    fn count_pending_invites_for(&self, user_id: Uuid) -> Result<i64> {
        Ok(db_count_pending_invites_for(&self.conn, user_id)?)
    }
}
