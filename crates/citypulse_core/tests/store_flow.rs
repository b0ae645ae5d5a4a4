use citypulse_core::db;
use citypulse_core::error::IssueError;
use citypulse_core::geo;
use citypulse_core::notify::{Notifier, Recipient, RecordingGateway, Sent};
use citypulse_core::schema::{
    Category, Coordinates, IssueStatus, MediaFile, NewIssue, Reporter, SocialPlatform,
};
use citypulse_core::store::{IssueFilter, IssueStore, Selector};
use pretty_assertions::assert_eq;

fn report(description: &str, category: Category, area: &str, at: Option<Coordinates>) -> NewIssue {
    NewIssue {
        description: description.to_string(),
        category: Some(category),
        subcategory: category.subcategories()[0].to_string(),
        municipal_corp: "Pune Municipal Corporation".to_string(),
        municipal_code: String::new(),
        area: area.to_string(),
        address: None,
        coordinates: at,
        media: Vec::new(),
        reporter: Reporter {
            user_id: "citizen-1".to_string(),
            user_name: "Asha Patil".to_string(),
            user_email: "asha@example.com".to_string(),
        },
    }
}

fn open_store(path: &str) -> IssueStore {
    IssueStore::open(db::open(path).unwrap()).unwrap()
}

#[test]
fn report_triage_and_resolve() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("issues.db");
    let path = path.to_str().unwrap();
    let mut store = open_store(path);

    let mut pothole = report(
        "Deep pothole near bus stop",
        Category::RoadsTransport,
        "Kothrud",
        None,
    );
    pothole.media.push(MediaFile {
        name: "pothole.jpg".to_string(),
        size_bytes: 2 * 1024 * 1024,
    });
    let pothole = store.add_issue(pothole).unwrap();
    assert_eq!(pothole.municipal_code, "100133");
    assert_eq!(pothole.media_urls, vec!["File: pothole.jpg (2.00 MB)".to_string()]);
    assert_eq!(pothole.status, IssueStatus::Pending);

    let garbage = store
        .add_issue(report("Overflowing bins", Category::WasteManagement, "Aundh", None))
        .unwrap();

    store
        .update_issue_status(&pothole.id, IssueStatus::InProgress, "Crew assigned")
        .unwrap();
    store.add_comment(&pothole.id, "Crew on site", "admin-1", "Ward Officer").unwrap();
    store.upvote_issue(&pothole.id).unwrap();
    store.upvote_issue(&pothole.id).unwrap();
    store
        .update_issue_status(&garbage.id, IssueStatus::Resolved, "Bins cleared")
        .unwrap();

    let stats = store.statistics();
    assert_eq!(
        (stats.total, stats.pending, stats.in_progress, stats.resolved),
        (2, 0, 1, 1)
    );

    store.set_filters(IssueFilter {
        status: Selector::Only(IssueStatus::Resolved),
        ..IssueFilter::default()
    });
    let resolved: Vec<&str> = store
        .filtered_issues()
        .iter()
        .map(|issue| issue.id.as_str())
        .collect();
    assert_eq!(resolved, vec![garbage.id.as_str()]);

    drop(store);
    let reopened = open_store(path);
    let stored = reopened.issue(&pothole.id).unwrap();
    assert_eq!(stored.upvotes, 2);
    assert_eq!(stored.admin_notes.as_deref(), Some("Crew assigned"));
    assert_eq!(stored.comments.len(), 1);
    assert_eq!(stored.comments[0].author_name, "Ward Officer");
    assert_eq!(reopened.issues_by_municipal_corp("100133").len(), 2);
    assert_eq!(reopened.issues_by_municipal_corp("Pune Municipal Corporation").len(), 2);
    assert_eq!(reopened.issues_by_user("citizen-1").len(), 2);
    assert_eq!(reopened.search("bins").len(), 1);
}

#[test]
fn rejected_reports_are_not_stored() {
    let mut store = IssueStore::open(db::open_in_memory().unwrap()).unwrap();

    let mut blank = report("", Category::WaterDrainage, "Baner", None);
    blank.description = "   ".to_string();
    let err = store.add_issue(blank).unwrap_err();
    assert_eq!(err.downcast_ref::<IssueError>(), Some(&IssueError::MissingDescription));

    let mut unknown_corp = report("Leaking pipe", Category::WaterDrainage, "Baner", None);
    unknown_corp.municipal_corp = "Atlantis Municipal Corporation".to_string();
    let err = store.add_issue(unknown_corp).unwrap_err();
    assert_eq!(err.downcast_ref::<IssueError>(), Some(&IssueError::MissingMunicipalCode));

    assert!(store.issues().is_empty());
    assert!(store.upvote_issue("missing").is_err());
}

#[test]
fn nearby_issues_sorted_from_fallback() {
    let mut store = IssueStore::open(db::open_in_memory().unwrap()).unwrap();
    let far = store
        .add_issue(report(
            "Broken streetlight",
            Category::ElectricityLighting,
            "Shivajinagar",
            Some(Coordinates { lat: 18.5204, lng: 73.8567 }),
        ))
        .unwrap();
    let near = store
        .add_issue(report(
            "Fallen tree",
            Category::EnvironmentParks,
            "Colaba",
            Some(Coordinates { lat: 18.9067, lng: 72.8147 }),
        ))
        .unwrap();
    store
        .add_issue(report("No location", Category::PublicSafetyOthers, "Kothrud", None))
        .unwrap();

    let nearby = geo::sort_by_distance(store.issues(), geo::FALLBACK_LOCATION);
    let ids: Vec<&str> = nearby.iter().map(|entry| entry.issue.id.as_str()).collect();
    assert_eq!(ids, vec![near.id.as_str(), far.id.as_str()]);

    let close = geo::within_radius(store.issues(), geo::FALLBACK_LOCATION, 50.0);
    assert_eq!(close.len(), 1);
}

#[test]
fn escalation_posts_are_recorded() {
    let mut store = IssueStore::open(db::open_in_memory().unwrap()).unwrap();
    let issue = store
        .add_issue(report("Open manhole", Category::PublicSafetyOthers, "Kothrud", None))
        .unwrap();
    let issue = store.escalate_issue(&issue.id).unwrap();
    assert!(issue.escalated);

    let notifier = Notifier::new(RecordingGateway::new(), "+910000000000");
    for (platform, post_ref) in notifier.escalate(&issue, &[SocialPlatform::Twitter]) {
        store.record_social_post(&issue.id, platform, &post_ref).unwrap();
    }
    assert_eq!(store.escalated_issues(Some(SocialPlatform::Twitter), None).len(), 1);
    assert!(store.escalated_issues(Some(SocialPlatform::Instagram), None).is_empty());
    assert_eq!(store.escalated_issues(None, Some("manhole")).len(), 1);

    let delivery = notifier.issue_confirmation(
        &issue,
        &Recipient {
            display_name: Some("Asha".to_string()),
            email: "asha@example.com".to_string(),
            phone_number: Some("+919999999999".to_string()),
        },
    );
    assert!(delivery.success);
    assert_eq!(notifier.gateway().sent().len(), 2);
    assert!(matches!(notifier.gateway().sent()[0], Sent::Social { .. }));
}
