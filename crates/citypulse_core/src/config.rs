use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::schema::Coordinates;

pub const CONFIG_FILE: &str = "citypulse.toml";
pub const ENV_FILE: &str = ".env.local";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub location: LocationConfig,
    pub simulation: SimulationConfig,
    pub firebase: FirebaseConfig,
    pub twilio: TwilioConfig,
    pub social: SocialConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "citypulse.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub fallback_lat: f64,
    pub fallback_lng: f64,
    pub timeout_secs: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            fallback_lat: crate::geo::FALLBACK_LOCATION.lat,
            fallback_lng: crate::geo::FALLBACK_LOCATION.lng,
            timeout_secs: 10,
        }
    }
}

impl LocationConfig {
    pub fn fallback(&self) -> Coordinates {
        Coordinates {
            lat: self.fallback_lat,
            lng: self.fallback_lng,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Artificial delay applied by the simulated insight components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub severity_latency_ms: u64,
    pub weather_latency_ms: u64,
    pub impact_latency_ms: u64,
    pub route_latency_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            severity_latency_ms: 2000,
            weather_latency_ms: 1500,
            impact_latency_ms: 1500,
            route_latency_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
}

impl FirebaseConfig {
    /// Names of the settings that are still blank.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("api_key", &self.api_key),
            ("auth_domain", &self.auth_domain),
            ("project_id", &self.project_id),
            ("storage_bucket", &self.storage_bucket),
            ("messaging_sender_id", &self.messaging_sender_id),
            ("app_id", &self.app_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwilioConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub whatsapp_number: Option<String>,
    /// Receives new-issue alerts.
    pub authority_number: Option<String>,
}

impl TwilioConfig {
    pub fn is_configured(&self) -> bool {
        self.account_sid.is_some() && self.auth_token.is_some() && self.whatsapp_number.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialConfig {
    pub meta_access_token: Option<String>,
    pub instagram_page_id: Option<String>,
    pub twitter_bearer_token: Option<String>,
}

impl Config {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config =
            toml::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = toml::to_string_pretty(self)?;
        fs::write(path, raw).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// `KEY=value` lines for the web client, optional credentials left blank.
    pub fn env_local(&self) -> String {
        let optional = |value: &Option<String>| value.as_deref().unwrap_or_default().to_string();
        let required = [
            ("REACT_APP_FIREBASE_API_KEY", self.firebase.api_key.clone()),
            ("REACT_APP_FIREBASE_AUTH_DOMAIN", self.firebase.auth_domain.clone()),
            ("REACT_APP_FIREBASE_PROJECT_ID", self.firebase.project_id.clone()),
            ("REACT_APP_FIREBASE_STORAGE_BUCKET", self.firebase.storage_bucket.clone()),
            (
                "REACT_APP_FIREBASE_MESSAGING_SENDER_ID",
                self.firebase.messaging_sender_id.clone(),
            ),
            ("REACT_APP_FIREBASE_APP_ID", self.firebase.app_id.clone()),
        ];
        let social = [
            ("REACT_APP_TWILIO_ACCOUNT_SID", optional(&self.twilio.account_sid)),
            ("REACT_APP_TWILIO_AUTH_TOKEN", optional(&self.twilio.auth_token)),
            ("REACT_APP_TWILIO_WHATSAPP_NUMBER", optional(&self.twilio.whatsapp_number)),
            ("REACT_APP_META_ACCESS_TOKEN", optional(&self.social.meta_access_token)),
            ("REACT_APP_META_PAGE_ID", optional(&self.social.instagram_page_id)),
            ("REACT_APP_TWITTER_BEARER_TOKEN", optional(&self.social.twitter_bearer_token)),
        ];

        let mut out = String::from("# CityPulse Environment Variables\n");
        for (key, value) in required {
            out.push_str(&format!("{key}={value}\n"));
        }
        out.push_str("\n# Optional: Social Media APIs\n");
        for (key, value) in social {
            out.push_str(&format!("{key}={value}\n"));
        }
        out
    }

    /// `firebase functions:config:set` commands for the credentials that are set.
    pub fn functions_config_commands(&self) -> Vec<String> {
        let mut commands = Vec::new();
        if let (Some(sid), Some(token), Some(number)) = (
            &self.twilio.account_sid,
            &self.twilio.auth_token,
            &self.twilio.whatsapp_number,
        ) {
            commands.push(format!(
                "firebase functions:config:set twilio.account_sid=\"{sid}\" twilio.auth_token=\"{token}\" twilio.whatsapp_number=\"{number}\""
            ));
        }
        if let (Some(token), Some(page)) =
            (&self.social.meta_access_token, &self.social.instagram_page_id)
        {
            commands.push(format!(
                "firebase functions:config:set meta.access_token=\"{token}\" meta.instagram_page_id=\"{page}\""
            ));
        }
        if let Some(token) = &self.social.twitter_bearer_token {
            commands.push(format!(
                "firebase functions:config:set twitter.bearer_token=\"{token}\""
            ));
        }
        commands
    }
}
