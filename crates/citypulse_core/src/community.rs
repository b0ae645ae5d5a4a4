//! Community discussion board: top-level comments, replies and reactions.

use anyhow::{anyhow, Result};
use rusqlite::Connection;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::db;
use crate::schema::{CommunityComment, Reply, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentSort {
    #[default]
    Recent,
    Popular,
    Trending,
}

impl CommentSort {
    fn order_by(&self) -> &'static str {
        match self {
            CommentSort::Recent => "timestamp DESC",
            CommentSort::Popular => "like_count DESC, timestamp DESC",
            CommentSort::Trending => "engagement DESC, timestamp DESC",
        }
    }
}

impl std::str::FromStr for CommentSort {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "recent" => Ok(CommentSort::Recent),
            "popular" => Ok(CommentSort::Popular),
            "trending" => Ok(CommentSort::Trending),
            other => Err(anyhow!("Unknown sort order: {other}")),
        }
    }
}

/// What a reaction applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Comment,
    Reply(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub is_verified: bool,
}

impl Author {
    pub fn from_user(user: &User) -> Self {
        let user_name = if user.display_name.is_empty() {
            user.email.clone()
        } else {
            user.display_name.clone()
        };
        Self {
            user_id: user.uid.clone(),
            user_name,
            user_email: user.email.clone(),
            is_verified: false,
        }
    }
}

pub fn post_comment(conn: &Connection, author: &Author, text: &str) -> Result<CommunityComment> {
    let text = text.trim();
    if text.is_empty() {
        return Err(anyhow!("Comment text is required"));
    }
    let comment = CommunityComment {
        id: crate::new_id(),
        text: text.to_string(),
        user_id: author.user_id.clone(),
        user_name: author.user_name.clone(),
        user_email: author.user_email.clone(),
        timestamp: crate::timestamp_now(),
        likes: Vec::new(),
        dislikes: Vec::new(),
        replies: Vec::new(),
        engagement: 0,
        is_verified: author.is_verified,
    };
    db::upsert_comment(conn, &comment)?;
    info!(id = %comment.id, "community comment posted");
    Ok(comment)
}

/// Returns `None` when the parent comment no longer exists.
pub fn reply(
    conn: &Connection,
    comment_id: &str,
    author: &Author,
    text: &str,
) -> Result<Option<CommunityComment>> {
    let text = text.trim();
    if text.is_empty() {
        return Err(anyhow!("Reply text is required"));
    }
    let Some(mut comment) = db::get_comment(conn, comment_id)? else {
        warn!(comment_id, "reply to missing comment ignored");
        return Ok(None);
    };
    comment.replies.push(Reply {
        text: text.to_string(),
        user_id: author.user_id.clone(),
        user_name: author.user_name.clone(),
        user_email: author.user_email.clone(),
        timestamp: crate::timestamp_now(),
        likes: Vec::new(),
        dislikes: Vec::new(),
        is_verified: author.is_verified,
    });
    comment.engagement += 1;
    db::upsert_comment(conn, &comment)?;
    Ok(Some(comment))
}

pub fn like(
    conn: &Connection,
    comment_id: &str,
    user_id: &str,
    target: Target,
) -> Result<Option<CommunityComment>> {
    react(conn, comment_id, |comment| apply_like(comment, user_id, target))
}

pub fn dislike(
    conn: &Connection,
    comment_id: &str,
    user_id: &str,
    target: Target,
) -> Result<Option<CommunityComment>> {
    react(conn, comment_id, |comment| apply_dislike(comment, user_id, target))
}

fn react(
    conn: &Connection,
    comment_id: &str,
    apply: impl FnOnce(&mut CommunityComment) -> Result<()>,
) -> Result<Option<CommunityComment>> {
    let Some(mut comment) = db::get_comment(conn, comment_id)? else {
        return Ok(None);
    };
    apply(&mut comment)?;
    db::upsert_comment(conn, &comment)?;
    Ok(Some(comment))
}

pub fn list(conn: &Connection, sort: CommentSort) -> Result<Vec<CommunityComment>> {
    db::list_comments(conn, sort.order_by())
}

/// Toggles a like. Liking clears an existing dislike from the same user.
pub fn apply_like(comment: &mut CommunityComment, user_id: &str, target: Target) -> Result<()> {
    match target {
        Target::Comment => {
            if remove(&mut comment.likes, user_id) {
                comment.engagement -= 1;
            } else {
                comment.likes.push(user_id.to_string());
                remove(&mut comment.dislikes, user_id);
                comment.engagement += 1;
            }
        }
        Target::Reply(index) => {
            let reply = reply_mut(comment, index)?;
            let liked = if remove(&mut reply.likes, user_id) {
                false
            } else {
                reply.likes.push(user_id.to_string());
                remove(&mut reply.dislikes, user_id);
                true
            };
            comment.engagement += if liked { 1 } else { -1 };
        }
    }
    Ok(())
}

/// Toggles a dislike. Disliking clears an existing like from the same user.
pub fn apply_dislike(comment: &mut CommunityComment, user_id: &str, target: Target) -> Result<()> {
    match target {
        Target::Comment => {
            if remove(&mut comment.dislikes, user_id) {
                comment.engagement += 1;
            } else {
                comment.dislikes.push(user_id.to_string());
                remove(&mut comment.likes, user_id);
                comment.engagement -= 1;
            }
        }
        Target::Reply(index) => {
            let reply = reply_mut(comment, index)?;
            let disliked = if remove(&mut reply.dislikes, user_id) {
                false
            } else {
                reply.dislikes.push(user_id.to_string());
                remove(&mut reply.likes, user_id);
                true
            };
            comment.engagement += if disliked { -1 } else { 1 };
        }
    }
    Ok(())
}

fn reply_mut(comment: &mut CommunityComment, index: usize) -> Result<&mut Reply> {
    let id = comment.id.clone();
    comment
        .replies
        .get_mut(index)
        .ok_or_else(|| anyhow!("Comment {id} has no reply #{index}"))
}

fn remove(ids: &mut Vec<String>, user_id: &str) -> bool {
    let before = ids.len();
    ids.retain(|id| id != user_id);
    ids.len() != before
}

/// Short age label such as `5m ago`; unparseable timestamps read as `Just now`.
pub fn relative_time(timestamp: &str, now: OffsetDateTime) -> String {
    let Ok(at) = OffsetDateTime::parse(timestamp, &Rfc3339) else {
        return "Just now".to_string();
    };
    let minutes = (now - at).whole_minutes();
    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if minutes < 1440 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / 1440)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn author(id: &str) -> Author {
        Author {
            user_id: id.to_string(),
            user_name: format!("user {id}"),
            user_email: format!("{id}@example.com"),
            is_verified: false,
        }
    }

    fn comment() -> CommunityComment {
        CommunityComment {
            id: "c1".to_string(),
            text: "Streetlights out on MG Road".to_string(),
            user_id: "u1".to_string(),
            user_name: "user u1".to_string(),
            user_email: "u1@example.com".to_string(),
            timestamp: "2024-05-01T10:00:00Z".to_string(),
            likes: Vec::new(),
            dislikes: Vec::new(),
            replies: vec![Reply {
                text: "Same here".to_string(),
                user_id: "u2".to_string(),
                user_name: "user u2".to_string(),
                user_email: "u2@example.com".to_string(),
                timestamp: "2024-05-01T10:05:00Z".to_string(),
                likes: Vec::new(),
                dislikes: Vec::new(),
                is_verified: false,
            }],
            engagement: 1,
            is_verified: false,
        }
    }

    #[test]
    fn like_toggles_and_clears_dislike() {
        let mut c = comment();
        apply_dislike(&mut c, "u3", Target::Comment).unwrap();
        assert_eq!(c.dislikes, vec!["u3"]);
        assert_eq!(c.engagement, 0);

        apply_like(&mut c, "u3", Target::Comment).unwrap();
        assert_eq!(c.likes, vec!["u3"]);
        assert!(c.dislikes.is_empty());
        assert_eq!(c.engagement, 1);

        apply_like(&mut c, "u3", Target::Comment).unwrap();
        assert!(c.likes.is_empty());
        assert_eq!(c.engagement, 0);
    }

    #[test]
    fn undoing_dislike_restores_engagement() {
        let mut c = comment();
        apply_dislike(&mut c, "u3", Target::Comment).unwrap();
        apply_dislike(&mut c, "u3", Target::Comment).unwrap();
        assert!(c.dislikes.is_empty());
        assert_eq!(c.engagement, 1);
    }

    #[test]
    fn reply_reactions_adjust_parent_engagement() {
        let mut c = comment();
        apply_like(&mut c, "u4", Target::Reply(0)).unwrap();
        assert_eq!(c.replies[0].likes, vec!["u4"]);
        assert_eq!(c.engagement, 2);

        apply_dislike(&mut c, "u4", Target::Reply(0)).unwrap();
        assert!(c.replies[0].likes.is_empty());
        assert_eq!(c.replies[0].dislikes, vec!["u4"]);
        assert_eq!(c.engagement, 1);

        assert!(apply_like(&mut c, "u4", Target::Reply(7)).is_err());
    }

    #[test]
    fn board_round_trip_and_sorting() {
        let conn = db::open_in_memory().unwrap();
        let first = post_comment(&conn, &author("u1"), "Park benches broken").unwrap();
        let second = post_comment(&conn, &author("u2"), "Garbage not collected").unwrap();
        assert!(post_comment(&conn, &author("u2"), "   ").is_err());

        like(&conn, &first.id, "u3", Target::Comment).unwrap();
        like(&conn, &first.id, "u4", Target::Comment).unwrap();
        let replied = reply(&conn, &second.id, &author("u5"), "Third week now")
            .unwrap()
            .unwrap();
        assert_eq!(replied.replies.len(), 1);
        assert_eq!(replied.engagement, 1);

        let popular = list(&conn, CommentSort::Popular).unwrap();
        assert_eq!(popular[0].id, first.id);
        let trending = list(&conn, CommentSort::Trending).unwrap();
        assert_eq!(trending[0].id, first.id);
        assert_eq!(trending[0].engagement, 2);

        assert!(reply(&conn, "missing", &author("u1"), "hello").unwrap().is_none());
        assert!(like(&conn, "missing", "u1", Target::Comment).unwrap().is_none());
    }

    #[test]
    fn relative_time_buckets() {
        let now = datetime!(2024-05-02 12:00 UTC);
        assert_eq!(relative_time("2024-05-02T11:59:30Z", now), "Just now");
        assert_eq!(relative_time("2024-05-02T11:45:00Z", now), "15m ago");
        assert_eq!(relative_time("2024-05-02T09:00:00Z", now), "3h ago");
        assert_eq!(relative_time("2024-04-29T12:00:00Z", now), "3d ago");
        assert_eq!(relative_time("not a date", now), "Just now");
    }
}
