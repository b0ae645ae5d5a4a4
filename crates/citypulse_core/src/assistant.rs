//! Help-desk replies for citizens asking how the app works.

use tracing::debug;

pub trait Assistant {
    fn respond(&mut self, message: &str) -> String;
}

pub const DEFAULT_REPLY: &str = "I understand you're asking about civic issues. Could you please be more specific? I can help with reporting, tracking, categories, location services, and more.";

/// Checked in order; the first group with a keyword in the message answers.
const TOPICS: &[(&[&str], &str)] = &[
    (
        &["report", "issue", "problem"],
        "To report a civic issue, click on 'Report Issue' in your dashboard. You can upload photos, describe the problem, and use your current location for accurate reporting.",
    ),
    (
        &["status", "track", "update"],
        "You can track your reported issues in your dashboard. Each issue shows its current status: Pending, In Progress, or Resolved. You'll also get notifications when status changes.",
    ),
    (
        &["category", "type"],
        "We have 6 main categories: Roads & Transport, Waste Management, Water & Drainage, Electricity & Lighting, Environment & Parks, and Public Safety & Others.",
    ),
    (
        &["location", "gps", "coordinates"],
        "When reporting an issue, you can use the 'Use Current Location' button to automatically capture your GPS coordinates, or manually enter the address.",
    ),
    (
        &["photo", "image", "media"],
        "Yes, you can upload photos and videos when reporting issues. This helps authorities better understand the problem. Supported formats include JPG, PNG, GIF, and MP4.",
    ),
    (
        &["escalate", "social media"],
        "Issues that remain unresolved for 3 days are automatically escalated to social media platforms like Instagram and Twitter to get more attention from authorities.",
    ),
    (
        &["admin", "authority"],
        "Admins can update issue statuses, add notes, and manage all reported issues. They also handle social media escalations and WhatsApp integrations.",
    ),
    (
        &["whatsapp"],
        "You can report issues via WhatsApp by sending photos/videos with descriptions. Our bot will automatically process these and create issue reports in the system.",
    ),
    (
        &["help", "support"],
        "I'm here to help! You can ask me about reporting issues, tracking status, categories, location services, media uploads, or any other civic issue related questions.",
    ),
];

/// Keyword matcher used when no conversational backend is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackAssistant;

impl Assistant for FallbackAssistant {
    fn respond(&mut self, message: &str) -> String {
        let message = message.to_lowercase();
        let reply = TOPICS
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|keyword| message.contains(keyword)))
            .map(|(_, reply)| *reply)
            .unwrap_or(DEFAULT_REPLY);
        debug!(matched = reply != DEFAULT_REPLY, "assistant reply chosen");
        reply.to_string()
    }
}
