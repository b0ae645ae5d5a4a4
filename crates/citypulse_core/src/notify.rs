//! Outbound notifications: WhatsApp messages and social-media escalation.
//!
//! Delivery goes through [`NotificationGateway`]. No real provider is wired
//! up; [`LoggingGateway`] writes what would have been sent to the log and
//! [`RecordingGateway`] keeps it in memory for tests.

use std::cell::RefCell;

use anyhow::{anyhow, Result};
use serde::Serialize;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::schema::{Issue, IssueStatus, SocialPlatform};

pub trait NotificationGateway {
    fn send_whatsapp(&self, to: &str, body: &str) -> Result<()>;

    /// Returns a reference to the created post.
    fn post_to_social(&self, platform: SocialPlatform, body: &str) -> Result<String>;
}

#[derive(Debug, Clone, Default)]
pub struct LoggingGateway;

impl NotificationGateway for LoggingGateway {
    fn send_whatsapp(&self, to: &str, body: &str) -> Result<()> {
        info!(to, body, "whatsapp message not sent (no provider configured)");
        Ok(())
    }

    fn post_to_social(&self, platform: SocialPlatform, body: &str) -> Result<String> {
        info!(
            platform = platform.as_str(),
            body, "social post not published (no provider configured)"
        );
        Ok(format!("simulated-{}-{}", platform.as_str(), crate::new_id()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    WhatsApp { to: String, body: String },
    Social { platform: SocialPlatform, body: String },
}

/// Keeps every message in memory. `failing()` rejects all deliveries.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    sent: RefCell<Vec<Sent>>,
    fail: bool,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: RefCell::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.borrow().clone()
    }
}

impl NotificationGateway for RecordingGateway {
    fn send_whatsapp(&self, to: &str, body: &str) -> Result<()> {
        if self.fail {
            return Err(anyhow!("gateway unavailable"));
        }
        self.sent.borrow_mut().push(Sent::WhatsApp {
            to: to.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }

    fn post_to_social(&self, platform: SocialPlatform, body: &str) -> Result<String> {
        if self.fail {
            return Err(anyhow!("gateway unavailable"));
        }
        let mut sent = self.sent.borrow_mut();
        sent.push(Sent::Social {
            platform,
            body: body.to_string(),
        });
        Ok(format!("{}-{}", platform.as_str(), sent.len()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub success: bool,
    pub message: String,
    pub sent: bool,
}

impl Delivery {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            sent: true,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            sent: false,
        }
    }
}

/// Who gets the citizen-facing messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub display_name: Option<String>,
    pub email: String,
    pub phone_number: Option<String>,
}

/// Normalises a phone number to the `whatsapp:+<digits>` address form.
pub fn whatsapp_address(number: &str) -> String {
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:+{}", number.replace('+', ""))
    }
}

pub fn status_emoji(status: &str) -> &'static str {
    match status {
        "pending" => "⏳",
        "in-progress" => "🔄",
        "resolved" => "✅",
        "rejected" => "❌",
        _ => "📋",
    }
}

pub fn status_description(status: &str) -> &'static str {
    match status {
        "pending" => {
            "Your issue has been received and is waiting for review by municipal authorities."
        }
        "in-progress" => "Your issue is now being worked on by the relevant department.",
        "resolved" => "Your issue has been successfully resolved! Thank you for your patience.",
        "rejected" => {
            "Your issue has been reviewed but could not be processed. Please check details."
        }
        _ => "Status update received.",
    }
}

pub fn status_progress(status: &str) -> u8 {
    match status {
        "pending" => 25,
        "in-progress" => 75,
        "resolved" => 100,
        _ => 0,
    }
}

fn format_when(at: OffsetDateTime) -> String {
    let format = format_description!("[day]/[month]/[year], [hour]:[minute]");
    at.format(&format).unwrap_or_default()
}

pub fn location_of(issue: &Issue) -> &str {
    issue
        .address
        .as_deref()
        .filter(|address| !address.is_empty())
        .or_else(|| Some(issue.area.as_str()).filter(|area| !area.is_empty()))
        .unwrap_or("Not specified")
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn confirmation_message(issue: &Issue, recipient: &Recipient, at: OffsetDateTime) -> String {
    let reporter = recipient
        .display_name
        .as_deref()
        .unwrap_or(recipient.email.as_str());
    format!(
        "✅ *Issue Submitted Successfully!*\n\n\
         *Issue ID:* {id}\n\
         *Location:* {location}\n\n\
         *Description:*\n{description}\n\n\
         *Reported by:* {reporter}\n\
         *Reported on:* {when}\n\n\
         We have received your report and will review it shortly. \
         You'll receive updates on the progress via WhatsApp.\n\n\
         *CityPulse Team* 🏙️",
        id = issue.id,
        location = location_of(issue),
        description = issue.description,
        when = format_when(at),
    )
}

pub fn alert_message(issue: &Issue, at: OffsetDateTime) -> String {
    let reporter = if issue.user_name.is_empty() {
        "Anonymous"
    } else {
        issue.user_name.as_str()
    };
    format!(
        "🚨 *New Issue Reported*\n\n\
         *Issue ID:* {id}\n\
         *Location:* {location}\n\n\
         *Description:*\n{description}\n\n\
         *Reported by:* {reporter}\n\
         *Reported on:* {when}\n\n\
         Please review and take appropriate action.\n\n\
         *CityPulse System* 🏙️",
        id = issue.id,
        location = location_of(issue),
        description = issue.description,
        when = format_when(at),
    )
}

pub fn status_update_message(issue: &Issue, status: IssueStatus, at: OffsetDateTime) -> String {
    let key = status.as_str();
    format!(
        "📱 *CityPulse Status Update*\n\n\
         {emoji} *Issue Status Changed to:* {label}\n\n\
         📋 *Issue ID:* {id}\n\
         📍 *Location:* {location}\n\n\
         📝 *Issue Description:*\n{description}\n\n\
         ⏰ *Updated on:* {when}\n\n\
         🔍 *What This Means:*\n{meaning}\n\n\
         📊 *Current Progress:* {progress}%\n\n\
         ---\n\
         *CityPulse Civic Issue Tracker*",
        emoji = status_emoji(key),
        label = capitalize(key),
        id = issue.id,
        location = location_of(issue),
        description = issue.description,
        when = format_when(at),
        meaning = status_description(key),
        progress = status_progress(key),
    )
}

pub fn escalation_post(issue: &Issue) -> String {
    format!(
        "Unresolved civic issue in {area} ({corp}): {description} \
         Reported {reported}, {upvotes} upvotes. #CityPulse #{tag}",
        area = issue.area,
        corp = issue.municipal_corp,
        description = issue.description,
        reported = issue.created_at.get(..10).unwrap_or(issue.created_at.as_str()),
        upvotes = issue.upvotes,
        tag = issue.category.as_str().replace('-', ""),
    )
}

/// Sends the workflow messages. Gateway failures are reported in the
/// returned [`Delivery`] and never abort the caller.
pub struct Notifier<G> {
    gateway: G,
    authority_number: String,
}

impl<G: NotificationGateway> Notifier<G> {
    pub fn new(gateway: G, authority_number: impl Into<String>) -> Self {
        Self {
            gateway,
            authority_number: authority_number.into(),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn issue_confirmation(&self, issue: &Issue, recipient: &Recipient) -> Delivery {
        let Some(phone) = recipient.phone_number.as_deref() else {
            return Delivery::failed(
                "Issue submitted but no WhatsApp number is on file. You will still receive email confirmation.",
            );
        };
        let body = confirmation_message(issue, recipient, OffsetDateTime::now_utc());
        match self.gateway.send_whatsapp(&whatsapp_address(phone), &body) {
            Ok(()) => Delivery::ok(format!(
                "Issue submitted successfully! WhatsApp confirmation sent to {phone}."
            )),
            Err(err) => {
                warn!(error = %err, "whatsapp confirmation failed");
                Delivery::failed(
                    "Issue submitted but WhatsApp notification failed. You will still receive email confirmation.",
                )
            }
        }
    }

    pub fn alert_authorities(&self, issue: &Issue) -> Delivery {
        let body = alert_message(issue, OffsetDateTime::now_utc());
        match self
            .gateway
            .send_whatsapp(&whatsapp_address(&self.authority_number), &body)
        {
            Ok(()) => Delivery::ok("Alert sent to municipal authorities via WhatsApp"),
            Err(err) => {
                warn!(error = %err, "authority alert failed");
                Delivery::failed("Failed to send alert to authorities")
            }
        }
    }

    pub fn status_update(&self, issue: &Issue, phone: &str) -> Delivery {
        let body = status_update_message(issue, issue.status, OffsetDateTime::now_utc());
        match self.gateway.send_whatsapp(&whatsapp_address(phone), &body) {
            Ok(()) => Delivery::ok("Status update sent via WhatsApp"),
            Err(err) => {
                warn!(error = %err, "status update failed");
                Delivery::failed("Failed to send status update via WhatsApp")
            }
        }
    }

    /// Posts the issue to each platform; only successful posts are returned.
    pub fn escalate(
        &self,
        issue: &Issue,
        platforms: &[SocialPlatform],
    ) -> Vec<(SocialPlatform, String)> {
        let body = escalation_post(issue);
        platforms
            .iter()
            .filter_map(|platform| match self.gateway.post_to_social(*platform, &body) {
                Ok(post_ref) => Some((*platform, post_ref)),
                Err(err) => {
                    warn!(platform = platform.as_str(), error = %err, "social escalation failed");
                    None
                }
            })
            .collect()
    }
}
