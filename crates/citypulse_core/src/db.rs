use crate::schema::{CommunityComment, Issue, User};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

pub fn open(db_path: &str) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("opening document store at {db_path}"))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    init(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init(&conn)?;
    Ok(conn)
}

fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS issues (
          id TEXT PRIMARY KEY,
          status TEXT NOT NULL,
          category TEXT NOT NULL,
          municipal_code TEXT NOT NULL,
          municipal_corp TEXT NOT NULL,
          user_id TEXT NOT NULL,
          escalated INTEGER NOT NULL,
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL,
          doc_json TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_issues_created_at ON issues(created_at);
        CREATE INDEX IF NOT EXISTS idx_issues_municipal_code ON issues(municipal_code);

        CREATE TABLE IF NOT EXISTS users (
          uid TEXT PRIMARY KEY,
          email TEXT NOT NULL,
          role TEXT NOT NULL,
          doc_json TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS community_comments (
          id TEXT PRIMARY KEY,
          timestamp TEXT NOT NULL,
          engagement INTEGER NOT NULL,
          like_count INTEGER NOT NULL,
          doc_json TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_comments_timestamp ON community_comments(timestamp);
        "#,
    )?;
    Ok(())
}

/// Writes the whole document; a later write to the same id replaces it.
pub fn upsert_issue(conn: &Connection, issue: &Issue) -> Result<()> {
    let doc_json = serde_json::to_string(issue)?;

    conn.execute(
        r#"
        INSERT INTO issues (
          id, status, category, municipal_code, municipal_corp,
          user_id, escalated, created_at, updated_at, doc_json
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(id) DO UPDATE SET
          status=excluded.status,
          category=excluded.category,
          municipal_code=excluded.municipal_code,
          municipal_corp=excluded.municipal_corp,
          user_id=excluded.user_id,
          escalated=excluded.escalated,
          updated_at=excluded.updated_at,
          doc_json=excluded.doc_json
        "#,
        params![
            issue.id,
            issue.status.as_str(),
            issue.category.as_str(),
            issue.municipal_code,
            issue.municipal_corp,
            issue.user_id,
            issue.escalated,
            issue.created_at,
            issue.updated_at,
            doc_json
        ],
    )?;

    Ok(())
}

pub fn get_issue(conn: &Connection, id: &str) -> Result<Option<Issue>> {
    let doc: Option<String> = conn
        .query_row(
            "SELECT doc_json FROM issues WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    doc.map(|raw| serde_json::from_str(&raw).with_context(|| format!("decoding issue {id}")))
        .transpose()
}

/// Newest first, the order the dashboards list issues in.
pub fn list_issues(conn: &Connection) -> Result<Vec<Issue>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, doc_json
        FROM issues
        ORDER BY created_at DESC, id ASC
        "#,
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut issues = Vec::new();
    for r in rows {
        let (id, raw) = r?;
        let issue: Issue =
            serde_json::from_str(&raw).with_context(|| format!("decoding issue {id}"))?;
        issues.push(issue);
    }
    debug!(count = issues.len(), "loaded issues");
    Ok(issues)
}

pub fn upsert_user(conn: &Connection, user: &User) -> Result<()> {
    let doc_json = serde_json::to_string(user)?;
    let role = match user.role {
        crate::schema::Role::Citizen => "citizen",
        crate::schema::Role::Admin => "admin",
    };

    conn.execute(
        r#"
        INSERT INTO users (uid, email, role, doc_json)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(uid) DO UPDATE SET
          email=excluded.email,
          doc_json=excluded.doc_json
        "#,
        params![user.uid, user.email, role, doc_json],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, uid: &str) -> Result<Option<User>> {
    let doc: Option<String> = conn
        .query_row(
            "SELECT doc_json FROM users WHERE uid = ?1",
            params![uid],
            |row| row.get(0),
        )
        .optional()?;
    doc.map(|raw| serde_json::from_str(&raw).with_context(|| format!("decoding user {uid}")))
        .transpose()
}

pub fn upsert_comment(conn: &Connection, comment: &CommunityComment) -> Result<()> {
    let doc_json = serde_json::to_string(comment)?;

    conn.execute(
        r#"
        INSERT INTO community_comments (id, timestamp, engagement, like_count, doc_json)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(id) DO UPDATE SET
          engagement=excluded.engagement,
          like_count=excluded.like_count,
          doc_json=excluded.doc_json
        "#,
        params![
            comment.id,
            comment.timestamp,
            comment.engagement,
            comment.likes.len() as i64,
            doc_json
        ],
    )?;
    Ok(())
}

pub fn get_comment(conn: &Connection, id: &str) -> Result<Option<CommunityComment>> {
    let doc: Option<String> = conn
        .query_row(
            "SELECT doc_json FROM community_comments WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    doc.map(|raw| serde_json::from_str(&raw).with_context(|| format!("decoding comment {id}")))
        .transpose()
}

/// `order_by` must be one of the fixed clauses built by the community module.
pub(crate) fn list_comments(conn: &Connection, order_by: &str) -> Result<Vec<CommunityComment>> {
    let sql = format!("SELECT id, doc_json FROM community_comments ORDER BY {order_by}");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut comments = Vec::new();
    for r in rows {
        let (id, raw) = r?;
        let comment: CommunityComment =
            serde_json::from_str(&raw).with_context(|| format!("decoding comment {id}"))?;
        comments.push(comment);
    }
    Ok(comments)
}
