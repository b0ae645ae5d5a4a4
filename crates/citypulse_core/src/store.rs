//! Issue store: a cached view of the `issues` collection plus the operations
//! citizens and admins perform on it.
//!
//! Reads go against the in-memory cache, writes go to the document store and
//! are followed by a refresh. Concurrent writers race with last-write-wins
//! semantics; there is no version check.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info};

use crate::db;
use crate::error::IssueError;
use crate::registry;
use crate::schema::{
    Category, Issue, IssueComment, IssueStatus, NewIssue, SocialMediaPosts, SocialPlatform,
};

pub const MAX_DESCRIPTION_CHARS: usize = 1000;

/// One filter dimension. `All` matches every value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector<T> {
    All,
    Only(T),
}

impl<T> Default for Selector<T> {
    fn default() -> Self {
        Selector::All
    }
}

impl<T: PartialEq> Selector<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Selector::All => true,
            Selector::Only(expected) => expected == value,
        }
    }
}

impl<T: FromStr> FromStr for Selector<T> {
    type Err = T::Err;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == "all" {
            Ok(Selector::All)
        } else {
            value.parse().map(Selector::Only)
        }
    }
}

impl<T: fmt::Display> fmt::Display for Selector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::All => f.write_str("all"),
            Selector::Only(value) => value.fmt(f),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilter {
    pub status: Selector<IssueStatus>,
    pub category: Selector<Category>,
    pub area: Selector<String>,
    pub municipal_corp: Selector<String>,
}

impl IssueFilter {
    pub fn matches(&self, issue: &Issue) -> bool {
        self.status.matches(&issue.status)
            && self.category.matches(&issue.category)
            && self.area.matches(&issue.area)
            && self.municipal_corp.matches(&issue.municipal_corp)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub escalated: usize,
    pub category_stats: BTreeMap<Category, usize>,
}

/// Keeps input order.
pub fn filter_issues<'a>(issues: &'a [Issue], filter: &IssueFilter) -> Vec<&'a Issue> {
    issues.iter().filter(|issue| filter.matches(issue)).collect()
}

pub fn compute_statistics<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> Statistics {
    let mut stats = Statistics {
        category_stats: Category::ALL.into_iter().map(|category| (category, 0)).collect(),
        ..Statistics::default()
    };
    for issue in issues {
        stats.total += 1;
        match issue.status {
            IssueStatus::Pending => stats.pending += 1,
            IssueStatus::InProgress => stats.in_progress += 1,
            IssueStatus::Resolved => stats.resolved += 1,
        }
        if issue.escalated {
            stats.escalated += 1;
        }
        *stats.category_stats.entry(issue.category).or_insert(0) += 1;
    }
    stats
}

pub fn is_municipal_code(value: &str) -> bool {
    value.len() == 6 && value.bytes().all(|byte| byte.is_ascii_digit())
}

/// Six-digit input matches `municipal_code`, anything else the corporation name.
pub fn issues_by_municipal_corp<'a>(issues: &'a [Issue], key: &str) -> Vec<&'a Issue> {
    if is_municipal_code(key) {
        issues.iter().filter(|issue| issue.municipal_code == key).collect()
    } else {
        issues.iter().filter(|issue| issue.municipal_corp == key).collect()
    }
}

/// Every problem with a submission, in form order.
pub fn validate_new_issue(new_issue: &NewIssue) -> Vec<IssueError> {
    let mut errors = Vec::new();

    let description = new_issue.description.trim();
    if description.is_empty() {
        errors.push(IssueError::MissingDescription);
    } else if new_issue.description.chars().count() > MAX_DESCRIPTION_CHARS {
        errors.push(IssueError::DescriptionTooLong);
    }

    if new_issue.category.is_none() {
        errors.push(IssueError::MissingCategory);
    }
    if new_issue.subcategory.is_empty() {
        errors.push(IssueError::MissingSubcategory);
    } else if let Some(category) = new_issue.category {
        if !category.subcategories().contains(&new_issue.subcategory.as_str()) {
            errors.push(IssueError::SubcategoryMismatch {
                category: category.to_string(),
                subcategory: new_issue.subcategory.clone(),
            });
        }
    }

    if new_issue.municipal_corp.is_empty() {
        errors.push(IssueError::MissingMunicipalCorp);
    }
    if new_issue.municipal_code.is_empty() {
        errors.push(IssueError::MissingMunicipalCode);
    }
    if new_issue.area.trim().is_empty() {
        errors.push(IssueError::MissingArea);
    }

    errors
}

pub struct IssueStore {
    conn: Connection,
    issues: Vec<Issue>,
    filters: IssueFilter,
}

impl IssueStore {
    pub fn open(conn: Connection) -> Result<Self> {
        let mut store = Self {
            conn,
            issues: Vec::new(),
            filters: IssueFilter::default(),
        };
        store.refresh()?;
        Ok(store)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Reconciles the cache with the document store.
    pub fn refresh(&mut self) -> Result<()> {
        self.issues = db::list_issues(&self.conn)?;
        Ok(())
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn issue(&self, id: &str) -> Option<&Issue> {
        self.issues.iter().find(|issue| issue.id == id)
    }

    pub fn filters(&self) -> &IssueFilter {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: IssueFilter) {
        self.filters = filters;
    }

    pub fn filtered_issues(&self) -> Vec<&Issue> {
        let filtered = filter_issues(&self.issues, &self.filters);
        debug!(matched = filtered.len(), total = self.issues.len(), "filtered issues");
        filtered
    }

    pub fn statistics(&self) -> Statistics {
        compute_statistics(&self.issues)
    }

    pub fn issues_by_user(&self, user_id: &str) -> Vec<&Issue> {
        self.issues
            .iter()
            .filter(|issue| issue.user_id == user_id)
            .collect()
    }

    pub fn issues_by_municipal_corp(&self, key: &str) -> Vec<&Issue> {
        issues_by_municipal_corp(&self.issues, key)
    }

    /// Admin dashboard search over description and reporter name.
    pub fn search(&self, term: &str) -> Vec<&Issue> {
        let needle = term.to_lowercase();
        self.issues
            .iter()
            .filter(|issue| {
                issue.description.to_lowercase().contains(&needle)
                    || issue.user_name.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn escalated_issues(
        &self,
        platform: Option<SocialPlatform>,
        term: Option<&str>,
    ) -> Vec<&Issue> {
        let needle = term.map(str::to_lowercase);
        self.issues
            .iter()
            .filter(|issue| issue.escalated)
            .filter(|issue| match platform {
                Some(platform) => issue.social_media_posts.get(platform).is_some(),
                None => true,
            })
            .filter(|issue| match &needle {
                Some(needle) => {
                    issue.description.to_lowercase().contains(needle)
                        || issue.category.as_str().contains(needle.as_str())
                        || issue.subcategory.to_lowercase().contains(needle)
                        || issue.area.to_lowercase().contains(needle)
                }
                None => true,
            })
            .collect()
    }

    pub fn add_issue(&mut self, mut new_issue: NewIssue) -> Result<Issue> {
        if new_issue.municipal_code.is_empty() {
            if let Some(code) = registry::municipal_code_by_name(&new_issue.municipal_corp) {
                new_issue.municipal_code = code.to_string();
            }
        }

        let mut errors = validate_new_issue(&new_issue);
        if !errors.is_empty() {
            return Err(errors.remove(0).into());
        }
        let category = new_issue.category.ok_or(IssueError::MissingCategory)?;

        if !new_issue.media.is_empty() {
            info!(
                files = new_issue.media.len(),
                "media upload not enabled, storing file metadata only"
            );
        }
        let media_urls = new_issue.media.iter().map(|file| file.placeholder()).collect();

        let now = crate::timestamp_now();
        let issue = Issue {
            id: crate::new_id(),
            description: new_issue.description,
            category,
            subcategory: new_issue.subcategory,
            municipal_corp: new_issue.municipal_corp,
            municipal_code: new_issue.municipal_code,
            area: new_issue.area,
            address: new_issue.address,
            coordinates: new_issue.coordinates,
            media_urls,
            status: IssueStatus::Pending,
            admin_notes: None,
            created_at: now.clone(),
            updated_at: now,
            upvotes: 0,
            comments: Vec::new(),
            escalated: false,
            escalated_at: None,
            social_media_posts: SocialMediaPosts::default(),
            user_id: new_issue.reporter.user_id,
            user_name: new_issue.reporter.user_name,
            user_email: new_issue.reporter.user_email,
        };

        db::upsert_issue(&self.conn, &issue).context("Failed to report issue")?;
        info!(id = %issue.id, category = %issue.category, "issue reported");
        self.refresh()?;
        Ok(issue)
    }

    pub fn update_issue_status(
        &mut self,
        id: &str,
        status: IssueStatus,
        admin_notes: &str,
    ) -> Result<Issue> {
        let issue = self.modify(id, |issue| {
            issue.status = status;
            issue.admin_notes = Some(admin_notes.to_string());
        })?;
        info!(id, status = %status, "issue status updated");
        Ok(issue)
    }

    pub fn add_comment(
        &mut self,
        id: &str,
        text: &str,
        author_id: &str,
        author_name: &str,
    ) -> Result<Issue> {
        let comment = IssueComment {
            id: crate::new_id(),
            text: text.to_string(),
            author_id: author_id.to_string(),
            author_name: author_name.to_string(),
            created_at: crate::timestamp_now(),
        };
        // Appends to the cached list, so a comment written elsewhere since the
        // last refresh is overwritten.
        let mut comments = self
            .issue(id)
            .map(|issue| issue.comments.clone())
            .unwrap_or_default();
        comments.push(comment);
        let issue = self.modify(id, |issue| issue.comments = comments)?;
        info!(id, "comment added");
        Ok(issue)
    }

    /// Increments the cached count; concurrent upvotes can be lost.
    pub fn upvote_issue(&mut self, id: &str) -> Result<Issue> {
        let upvotes = self.issue(id).map(|issue| issue.upvotes).unwrap_or(0) + 1;
        let issue = self.modify(id, |issue| issue.upvotes = upvotes)?;
        info!(id, upvotes, "issue upvoted");
        Ok(issue)
    }

    pub fn escalate_issue(&mut self, id: &str) -> Result<Issue> {
        let now = crate::timestamp_now();
        let issue = self.modify(id, |issue| {
            issue.escalated = true;
            issue.escalated_at = Some(now.clone());
        })?;
        info!(id, "issue escalated");
        Ok(issue)
    }

    pub fn record_social_post(
        &mut self,
        id: &str,
        platform: SocialPlatform,
        post_ref: &str,
    ) -> Result<Issue> {
        self.modify(id, |issue| {
            issue.social_media_posts.set(platform, post_ref.to_string())
        })
    }

    fn modify(&mut self, id: &str, apply: impl FnOnce(&mut Issue)) -> Result<Issue> {
        let mut issue =
            db::get_issue(&self.conn, id)?.ok_or_else(|| IssueError::NotFound(id.to_string()))?;
        apply(&mut issue);
        issue.updated_at = crate::timestamp_now();
        db::upsert_issue(&self.conn, &issue)?;
        self.refresh()?;
        Ok(issue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Coordinates, MediaFile, Reporter};

    fn issue(id: &str, status: IssueStatus, category: Category) -> Issue {
        Issue {
            id: id.to_string(),
            description: format!("issue {id}"),
            category,
            subcategory: category.subcategories()[0].to_string(),
            municipal_corp: "Pune Municipal Corporation".to_string(),
            municipal_code: "100133".to_string(),
            area: "Kothrud".to_string(),
            address: None,
            coordinates: Some(Coordinates { lat: 18.5, lng: 73.8 }),
            media_urls: Vec::new(),
            status,
            admin_notes: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
            upvotes: 0,
            comments: Vec::new(),
            escalated: false,
            escalated_at: None,
            social_media_posts: SocialMediaPosts::default(),
            user_id: "u1".to_string(),
            user_name: "Asha".to_string(),
            user_email: "asha@example.com".to_string(),
        }
    }

    fn submission() -> NewIssue {
        NewIssue {
            description: "Deep pothole near the bus stop".to_string(),
            category: Some(Category::RoadsTransport),
            subcategory: "Potholes or road damage".to_string(),
            municipal_corp: "Pune Municipal Corporation".to_string(),
            municipal_code: String::new(),
            area: "Kothrud".to_string(),
            address: Some("Paud Road".to_string()),
            coordinates: None,
            media: vec![MediaFile {
                name: "hole.jpg".to_string(),
                size_bytes: 2 * 1024 * 1024,
            }],
            reporter: Reporter {
                user_id: "u1".to_string(),
                user_name: "Asha".to_string(),
                user_email: "asha@example.com".to_string(),
            },
        }
    }

    #[test]
    fn all_filter_returns_input_in_order() {
        let issues = vec![
            issue("a", IssueStatus::Resolved, Category::WaterDrainage),
            issue("b", IssueStatus::Pending, Category::RoadsTransport),
            issue("c", IssueStatus::InProgress, Category::WasteManagement),
        ];
        let filtered = filter_issues(&issues, &IssueFilter::default());
        let ids: Vec<&str> = filtered.iter().map(|issue| issue.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn status_filter_selects_exact_subset() {
        let issues = vec![
            issue("a", IssueStatus::Resolved, Category::WaterDrainage),
            issue("b", IssueStatus::Pending, Category::RoadsTransport),
            issue("c", IssueStatus::Resolved, Category::WasteManagement),
        ];
        let filter = IssueFilter {
            status: Selector::Only(IssueStatus::Resolved),
            ..IssueFilter::default()
        };
        let filtered = filter_issues(&issues, &filter);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|issue| issue.status == IssueStatus::Resolved));
    }

    #[test]
    fn filters_combine_with_and() {
        let mut other_area = issue("b", IssueStatus::Resolved, Category::WaterDrainage);
        other_area.area = "Baner".to_string();
        let issues = vec![
            issue("a", IssueStatus::Resolved, Category::WaterDrainage),
            other_area,
            issue("c", IssueStatus::Resolved, Category::RoadsTransport),
        ];
        let filter = IssueFilter {
            status: Selector::Only(IssueStatus::Resolved),
            category: "water-drainage".parse().unwrap(),
            area: Selector::Only("Kothrud".to_string()),
            municipal_corp: Selector::All,
        };
        let ids: Vec<&str> = filter_issues(&issues, &filter)
            .iter()
            .map(|issue| issue.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn selector_parses_all_keyword() {
        assert_eq!("all".parse::<Selector<IssueStatus>>().unwrap(), Selector::All);
        assert_eq!(
            "pending".parse::<Selector<IssueStatus>>().unwrap(),
            Selector::Only(IssueStatus::Pending)
        );
        assert!("bogus".parse::<Selector<Category>>().is_err());
    }

    #[test]
    fn statistics_example() {
        let issues = vec![
            issue("a", IssueStatus::Pending, Category::RoadsTransport),
            issue("b", IssueStatus::Resolved, Category::RoadsTransport),
            issue("c", IssueStatus::Resolved, Category::WaterDrainage),
        ];
        let stats = compute_statistics(&issues);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.resolved, 2);
        assert_eq!(stats.in_progress, 0);
        assert_eq!(stats.escalated, 0);
        assert_eq!(stats.category_stats[&Category::RoadsTransport], 2);
        assert_eq!(stats.category_stats[&Category::WaterDrainage], 1);
        assert_eq!(stats.category_stats[&Category::EnvironmentParks], 0);
        assert_eq!(stats.category_stats.len(), Category::ALL.len());
    }

    #[test]
    fn municipal_lookup_by_code_or_name() {
        let mut by_name_only = issue("b", IssueStatus::Pending, Category::RoadsTransport);
        by_name_only.municipal_code = "100001".to_string();
        let mut by_code_only = issue("c", IssueStatus::Pending, Category::RoadsTransport);
        by_code_only.municipal_corp = "PMC".to_string();
        let issues = vec![
            issue("a", IssueStatus::Pending, Category::RoadsTransport),
            by_name_only,
            by_code_only,
        ];

        fn ids(found: Vec<&Issue>) -> Vec<String> {
            found.iter().map(|issue| issue.id.clone()).collect()
        }
        assert_eq!(ids(issues_by_municipal_corp(&issues, "100133")), vec!["a", "c"]);
        assert_eq!(
            ids(issues_by_municipal_corp(&issues, "Pune Municipal Corporation")),
            vec!["a", "b"]
        );
        assert!(issues_by_municipal_corp(&issues, "10013").is_empty());
        assert!(!is_municipal_code("10013a"));
    }

    #[test]
    fn validation_reports_every_missing_field() {
        let mut bad = submission();
        bad.description = "   ".to_string();
        bad.category = None;
        bad.subcategory = String::new();
        bad.municipal_corp = String::new();
        bad.area = String::new();
        assert_eq!(
            validate_new_issue(&bad),
            vec![
                IssueError::MissingDescription,
                IssueError::MissingCategory,
                IssueError::MissingSubcategory,
                IssueError::MissingMunicipalCorp,
                IssueError::MissingMunicipalCode,
                IssueError::MissingArea,
            ]
        );

        let mut long = submission();
        long.description = "x".repeat(MAX_DESCRIPTION_CHARS + 1);
        long.municipal_code = "100133".to_string();
        assert_eq!(validate_new_issue(&long), vec![IssueError::DescriptionTooLong]);

        let mut wrong_sub = submission();
        wrong_sub.municipal_code = "100133".to_string();
        wrong_sub.subcategory = "Garbage bin overflow".to_string();
        assert!(matches!(
            validate_new_issue(&wrong_sub).as_slice(),
            [IssueError::SubcategoryMismatch { .. }]
        ));
    }

    #[test]
    fn add_issue_fills_defaults_and_code() {
        let mut store = IssueStore::open(db::open_in_memory().unwrap()).unwrap();
        let issue = store.add_issue(submission()).unwrap();

        assert_eq!(issue.status, IssueStatus::Pending);
        assert_eq!(issue.municipal_code, "100133");
        assert_eq!(issue.upvotes, 0);
        assert!(!issue.escalated);
        assert!(issue.comments.is_empty());
        assert_eq!(issue.media_urls, vec!["File: hole.jpg (2.00 MB)".to_string()]);
        assert_eq!(store.issues().len(), 1);
    }

    #[test]
    fn add_issue_rejects_invalid_submission() {
        let mut store = IssueStore::open(db::open_in_memory().unwrap()).unwrap();
        let mut bad = submission();
        bad.area = String::new();
        let err = store.add_issue(bad).unwrap_err();
        assert_eq!(err.downcast_ref::<IssueError>(), Some(&IssueError::MissingArea));
        assert!(store.issues().is_empty());
    }

    #[test]
    fn mutations_round_trip_through_store() {
        let mut store = IssueStore::open(db::open_in_memory().unwrap()).unwrap();
        let id = store.add_issue(submission()).unwrap().id;

        store.upvote_issue(&id).unwrap();
        store.upvote_issue(&id).unwrap();
        store
            .update_issue_status(&id, IssueStatus::InProgress, "crew assigned")
            .unwrap();
        store.add_comment(&id, "Seen it too", "u2", "Ravi").unwrap();
        store.escalate_issue(&id).unwrap();
        store
            .record_social_post(&id, SocialPlatform::Twitter, "tw-42")
            .unwrap();

        let issue = store.issue(&id).unwrap();
        assert_eq!(issue.upvotes, 2);
        assert_eq!(issue.status, IssueStatus::InProgress);
        assert_eq!(issue.admin_notes.as_deref(), Some("crew assigned"));
        assert_eq!(issue.comments.len(), 1);
        assert_eq!(issue.comments[0].author_name, "Ravi");
        assert!(issue.escalated);
        assert!(issue.escalated_at.is_some());

        assert_eq!(store.escalated_issues(Some(SocialPlatform::Twitter), None).len(), 1);
        assert!(store.escalated_issues(Some(SocialPlatform::Instagram), None).is_empty());
        assert_eq!(store.escalated_issues(None, Some("POTHOLE")).len(), 1);
        assert_eq!(store.statistics().escalated, 1);
    }

    #[test]
    fn mutating_unknown_issue_fails() {
        let mut store = IssueStore::open(db::open_in_memory().unwrap()).unwrap();
        let err = store.upvote_issue("missing").unwrap_err();
        assert_eq!(
            err.downcast_ref::<IssueError>(),
            Some(&IssueError::NotFound("missing".to_string()))
        );
    }

    #[test]
    fn search_matches_description_or_reporter() {
        let mut store = IssueStore::open(db::open_in_memory().unwrap()).unwrap();
        store.add_issue(submission()).unwrap();
        assert_eq!(store.search("bus stop").len(), 1);
        assert_eq!(store.search("asha").len(), 1);
        assert!(store.search("streetlight").is_empty());
        assert_eq!(store.issues_by_user("u1").len(), 1);
        assert!(store.issues_by_user("u9").is_empty());
    }
}
