use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::IssueError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum IssueStatus {
    Pending,
    InProgress,
    Resolved,
}

impl IssueStatus {
    pub const ALL: [IssueStatus; 3] = [
        IssueStatus::Pending,
        IssueStatus::InProgress,
        IssueStatus::Resolved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Pending => "pending",
            IssueStatus::InProgress => "in-progress",
            IssueStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueStatus {
    type Err = IssueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        IssueStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| IssueError::UnknownStatus(value.to_string()))
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    RoadsTransport,
    WasteManagement,
    WaterDrainage,
    ElectricityLighting,
    EnvironmentParks,
    PublicSafetyOthers,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::RoadsTransport,
        Category::WasteManagement,
        Category::WaterDrainage,
        Category::ElectricityLighting,
        Category::EnvironmentParks,
        Category::PublicSafetyOthers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::RoadsTransport => "roads-transport",
            Category::WasteManagement => "waste-management",
            Category::WaterDrainage => "water-drainage",
            Category::ElectricityLighting => "electricity-lighting",
            Category::EnvironmentParks => "environment-parks",
            Category::PublicSafetyOthers => "public-safety-others",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::RoadsTransport => "Roads & Infrastructure",
            Category::WasteManagement => "Waste Management",
            Category::WaterDrainage => "Water & Drainage",
            Category::ElectricityLighting => "Electricity & Utilities",
            Category::EnvironmentParks => "Environment & Green Spaces",
            Category::PublicSafetyOthers => "Public Safety & Law Enforcement",
        }
    }

    /// Subcategories offered on the report form for this category.
    pub fn subcategories(&self) -> &'static [&'static str] {
        match self {
            Category::RoadsTransport => &[
                "Potholes or road damage",
                "Broken or missing streetlights",
                "Damaged or uneven footpaths",
                "Broken traffic signals",
                "Faded or missing road markings",
                "Damaged bridges or flyovers",
                "Poor road drainage / waterlogging",
                "Other",
            ],
            Category::WaterDrainage => &[
                "Leaking water pipelines",
                "Blocked or clogged drains",
                "Water contamination (smell, color, or taste)",
                "Low water pressure / no water supply",
                "Overflowing manholes",
                "Illegal water connections",
                "Stormwater drain blockage",
            ],
            Category::WasteManagement => &[
                "Garbage bin overflow",
                "Illegal dumping of waste",
                "Delay in garbage collection",
                "Dead animal carcass removal",
                "Improper disposal of medical waste",
                "Burning of garbage causing air pollution",
            ],
            Category::PublicSafetyOthers => &[
                "Traffic signal violations",
                "Illegal parking blocking public space",
                "Rash driving or overspeeding zones",
                "Unsafe or poorly lit public areas",
                "Suspicious or anti-social activities",
                "Encroachment on public property",
                "Broken CCTV cameras in public areas",
            ],
            Category::EnvironmentParks => &[
                "Unauthorized tree cutting",
                "Poor maintenance of public parks",
                "Damaged park benches/play equipment",
                "Encroachment into green spaces",
                "Lack of greenery / tree plantation requests",
                "Uncontrolled stray animals in parks",
            ],
            Category::ElectricityLighting => &[
                "Power outages / frequent load shedding",
                "Exposed or hanging electrical wires",
                "Damaged electric poles or transformers",
                "Faulty public charging points",
                "Streetlights not working",
                "Voltage fluctuation issues",
            ],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = IssueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
            .ok_or_else(|| IssueError::UnknownCategory(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    Instagram,
    Twitter,
}

impl SocialPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            SocialPlatform::Instagram => "instagram",
            SocialPlatform::Twitter => "twitter",
        }
    }
}

impl FromStr for SocialPlatform {
    type Err = IssueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "instagram" => Ok(SocialPlatform::Instagram),
            "twitter" => Ok(SocialPlatform::Twitter),
            other => Err(IssueError::UnknownPlatform(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SocialMediaPosts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
}

impl SocialMediaPosts {
    pub fn get(&self, platform: SocialPlatform) -> Option<&str> {
        match platform {
            SocialPlatform::Instagram => self.instagram.as_deref(),
            SocialPlatform::Twitter => self.twitter.as_deref(),
        }
    }

    pub fn set(&mut self, platform: SocialPlatform, post: String) {
        match platform {
            SocialPlatform::Instagram => self.instagram = Some(post),
            SocialPlatform::Twitter => self.twitter = Some(post),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueComment {
    pub id: String,
    pub text: String,
    pub author_id: String,
    pub author_name: String,
    pub created_at: String, // ISO-8601 UTC
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub description: String,
    pub category: Category,
    pub subcategory: String,
    pub municipal_corp: String,
    pub municipal_code: String,
    pub area: String,
    pub address: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub media_urls: Vec<String>,
    pub status: IssueStatus,
    #[serde(default)]
    pub admin_notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub upvotes: u32,
    pub comments: Vec<IssueComment>,
    pub escalated: bool,
    pub escalated_at: Option<String>,
    pub social_media_posts: SocialMediaPosts,
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
}

/// A file attached to a report. Only its metadata is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFile {
    pub name: String,
    pub size_bytes: u64,
}

impl MediaFile {
    /// Placeholder stored in `mediaUrls` while uploads are not wired up.
    pub fn placeholder(&self) -> String {
        let megabytes = self.size_bytes as f64 / 1024.0 / 1024.0;
        format!("File: {} ({megabytes:.2} MB)", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reporter {
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
}

/// Citizen submission before it becomes an [`Issue`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIssue {
    pub description: String,
    pub category: Option<Category>,
    pub subcategory: String,
    pub municipal_corp: String,
    pub municipal_code: String,
    pub area: String,
    pub address: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub media: Vec<MediaFile>,
    pub reporter: Reporter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Citizen,
    Admin,
}

impl FromStr for Role {
    type Err = IssueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "citizen" => Ok(Role::Citizen),
            "admin" => Ok(Role::Admin),
            other => Err(IssueError::UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub email_notifications: bool,
    pub push_notifications: bool,
    pub issue_updates: bool,
    pub weekly_digest: bool,
    pub emergency_alerts: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email_notifications: true,
            push_notifications: true,
            issue_updates: true,
            weekly_digest: false,
            emergency_alerts: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrivacySettings {
    pub profile_visibility: String,
    pub show_email: bool,
    pub show_phone: bool,
    pub allow_contact: bool,
    pub data_sharing: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            profile_visibility: "public".to_string(),
            show_email: false,
            show_phone: false,
            allow_contact: true,
            data_sharing: false,
        }
    }
}

/// Fields only kept on admin accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    pub municipal_code: String,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub area_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub phone_number: Option<String>,
    pub role: Role,
    pub municipal_code: Option<String>,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub area_name: Option<String>,
    pub photo_url: Option<String>,
    pub selected_municipal_corp: Option<String>,
    #[serde(default)]
    pub notification_settings: NotificationSettings,
    #[serde(default)]
    pub privacy_settings: PrivacySettings,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub text: String,
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub timestamp: String,
    pub likes: Vec<String>,
    pub dislikes: Vec<String>,
    pub is_verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommunityComment {
    pub id: String,
    pub text: String,
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub timestamp: String,
    pub likes: Vec<String>,
    pub dislikes: Vec<String>,
    pub replies: Vec<Reply>,
    pub engagement: i64,
    pub is_verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MunicipalCorporation {
    pub name: String,
    pub code: String,
}
