use anyhow::Result;
use citypulse_core::community::{self, CommentSort};
use citypulse_core::db;
use citypulse_core::notify;
use citypulse_core::registry;
use citypulse_core::schema::{Category, Issue, IssueStatus};
use citypulse_core::store;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::info;

const GENERATED_NOTICE: &str = "This index is generated. Do not edit manually.";

pub struct VaultPaths {
    pub root: PathBuf,
    pub index_dir: PathBuf,
    pub issues_dir: PathBuf,
}

impl VaultPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            index_dir: root.join("00_Index"),
            issues_dir: root.join("Issues"),
            root,
        }
    }

    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.index_dir)?;
        fs::create_dir_all(&self.issues_dir)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestSummary {
    pub issues: usize,
    pub corporations: usize,
    pub community_threads: usize,
}

/// Writes one note per issue plus the index pages under `00_Index`.
pub fn build_digest(conn: &Connection, vault_root: &Path) -> Result<DigestSummary> {
    let paths = VaultPaths::new(vault_root);
    paths.ensure()?;

    // 1) Issue notes and the status board
    let issues = db::list_issues(conn)?;
    let mut board: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
    for issue in &issues {
        write_issue_note(&paths, issue)?;
        board
            .entry(status_heading(issue.status))
            .or_default()
            .push(format!("- [[Issues/{}|{}]] ({})", issue.id, note_title(issue), issue.area));
    }

    let mut lines = page_header("MOC - Issues");
    for status in IssueStatus::ALL {
        let heading = status_heading(status);
        lines.push(format!("## {heading}"));
        lines.push(String::new());
        match board.get(heading) {
            Some(entries) => lines.extend(entries.iter().cloned()),
            None => lines.push("_No issues._".to_string()),
        }
        lines.push(String::new());
    }
    fs::write(paths.index_dir.join("MOC - Issues.md"), lines.join("\n"))?;

    // 2) Per-corporation counts
    let corporations = corporation_rows(conn)?;
    let mut lines = page_header("MOC - Corporations");
    if corporations.is_empty() {
        lines.push("_No reports yet._".to_string());
    } else {
        lines.push("| Corporation | Code | Region | Open | Resolved |".to_string());
        lines.push("| --- | --- | --- | --- | --- |".to_string());
        for row in &corporations {
            lines.push(format!(
                "| {} | {} | {} | {} | {} |",
                row.name,
                row.code,
                registry::region_for_name(&row.name),
                row.open,
                row.resolved
            ));
        }
    }
    fs::write(paths.index_dir.join("MOC - Corporations.md"), lines.join("\n"))?;

    // 3) Category breakdown
    let stats = store::compute_statistics(&issues);
    let mut lines = page_header("MOC - Categories");
    let mut by_count: Vec<(Category, usize)> = stats.category_stats.into_iter().collect();
    by_count.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    for (category, count) in by_count {
        lines.push(format!("- {} ({count})", category.label()));
    }
    lines.push(String::new());
    lines.push(format!("Escalated: {}", stats.escalated));
    fs::write(paths.index_dir.join("MOC - Categories.md"), lines.join("\n"))?;

    // 4) Community board, most engaged first
    let threads = community::list(conn, CommentSort::Trending)?;
    let now = OffsetDateTime::now_utc();
    let mut lines = page_header("MOC - Community");
    if threads.is_empty() {
        lines.push("_No community posts found._".to_string());
    }
    for thread in &threads {
        lines.push(format!(
            "- {} ({}, {} likes, {} replies, {})",
            thread.text,
            thread.user_name,
            thread.likes.len(),
            thread.replies.len(),
            community::relative_time(&thread.timestamp, now)
        ));
    }
    fs::write(paths.index_dir.join("MOC - Community.md"), lines.join("\n"))?;

    let summary = DigestSummary {
        issues: issues.len(),
        corporations: corporations.len(),
        community_threads: threads.len(),
    };
    info!(
        root = %paths.root.display(),
        issues = summary.issues,
        corporations = summary.corporations,
        "digest written"
    );
    Ok(summary)
}

fn page_header(title: &str) -> Vec<String> {
    vec![
        format!("# {title}"),
        String::new(),
        GENERATED_NOTICE.to_string(),
        String::new(),
    ]
}

fn status_heading(status: IssueStatus) -> &'static str {
    match status {
        IssueStatus::Pending => "Pending",
        IssueStatus::InProgress => "In Progress",
        IssueStatus::Resolved => "Resolved",
    }
}

/// One-line title, safe inside a heading and a `[[target|label]]` link.
fn note_title(issue: &Issue) -> String {
    let flat = issue.description.split_whitespace().collect::<Vec<_>>().join(" ");
    let short: String = flat.chars().take(60).collect();
    let title = if short.chars().count() < flat.chars().count() {
        format!("{}...", short.trim_end())
    } else {
        short
    };
    title.replace('|', "\\|").replace(']', "\\]")
}

#[derive(Debug)]
struct CorporationRow {
    code: String,
    name: String,
    open: usize,
    resolved: usize,
}

fn corporation_rows(conn: &Connection) -> Result<Vec<CorporationRow>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT municipal_code, municipal_corp,
               SUM(CASE WHEN status != 'resolved' THEN 1 ELSE 0 END),
               SUM(CASE WHEN status = 'resolved' THEN 1 ELSE 0 END)
        FROM issues
        GROUP BY municipal_code, municipal_corp
        ORDER BY COUNT(*) DESC, municipal_corp ASC
        "#,
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(CorporationRow {
            code: row.get(0)?,
            name: row.get(1)?,
            open: row.get::<_, i64>(2)? as usize,
            resolved: row.get::<_, i64>(3)? as usize,
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Searchable fields for the note's YAML frontmatter.
#[derive(Debug, Serialize)]
struct IssueFrontmatter<'a> {
    id: &'a str,
    status: &'a str,
    category: &'a str,
    subcategory: &'a str,
    municipal_code: &'a str,
    municipal_corp: &'a str,
    area: &'a str,
    created_at: &'a str,
    updated_at: &'a str,
    upvotes: u32,
    escalated: bool,
    tags: Vec<String>,
}

fn write_issue_note(paths: &VaultPaths, issue: &Issue) -> Result<()> {
    let note_path = paths.issues_dir.join(format!("{}.md", issue.id));

    let frontmatter = IssueFrontmatter {
        id: &issue.id,
        status: issue.status.as_str(),
        category: issue.category.as_str(),
        subcategory: &issue.subcategory,
        municipal_code: &issue.municipal_code,
        municipal_corp: &issue.municipal_corp,
        area: &issue.area,
        created_at: &issue.created_at,
        updated_at: &issue.updated_at,
        upvotes: issue.upvotes,
        escalated: issue.escalated,
        tags: vec![
            issue.category.as_str().to_string(),
            registry::state_for_name(&issue.municipal_corp)
                .to_lowercase()
                .replace(' ', "_"),
        ],
    };

    let mut md = String::new();
    md.push_str("---\n");
    md.push_str(&serde_yaml::to_string(&frontmatter)?);
    md.push_str("---\n\n");

    md.push_str(&format!("# {}\n\n", note_title(issue)));

    md.push_str("## Report\n");
    md.push_str(&format!(
        "- Status: {} {} ({}%)\n",
        notify::status_emoji(issue.status.as_str()),
        status_heading(issue.status),
        notify::status_progress(issue.status.as_str())
    ));
    md.push_str(&format!("- Category: {} / {}\n", issue.category.label(), issue.subcategory));
    md.push_str(&format!("- Location: {}\n", notify::location_of(issue)));
    md.push_str(&format!("- Reported by: {}\n", issue.user_name));
    md.push_str(&format!("- Reported: `{}`\n\n", issue.created_at));

    md.push_str("## Description\n");
    md.push_str(&issue.description);
    md.push_str("\n\n");

    if let Some(notes) = issue.admin_notes.as_deref().filter(|notes| !notes.trim().is_empty()) {
        md.push_str("## Admin Notes\n");
        md.push_str(notes);
        md.push_str("\n\n");
    }

    md.push_str("## Comments\n");
    if issue.comments.is_empty() {
        md.push_str("_No comments yet._\n");
    }
    for comment in &issue.comments {
        md.push_str(&format!(
            "- **{}** (`{}`): {}\n",
            comment.author_name, comment.created_at, comment.text
        ));
    }

    if !issue.media_urls.is_empty() {
        md.push_str("\n## Attachments\n");
        for media in &issue.media_urls {
            md.push_str(&format!("- {media}\n"));
        }
    }

    fs::write(note_path, md)?;
    Ok(())
}
