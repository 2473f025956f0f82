use serde::{Deserialize, Serialize};

/// Configuration for the event_tracker module (`modules.event_tracker`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventTrackerConfig {
    #[serde(default = "default_upcoming_horizon_days")]
    pub upcoming_horizon_days: u32,
    #[serde(default = "default_conflict_window_minutes")]
    pub conflict_window_minutes: u32,
    #[serde(default = "default_max_event_name_length")]
    pub max_event_name_length: usize,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub suggestions: SuggestionsConfig,
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for EventTrackerConfig {
    fn default() -> Self {
        Self {
            upcoming_horizon_days: default_upcoming_horizon_days(),
            conflict_window_minutes: default_conflict_window_minutes(),
            max_event_name_length: default_max_event_name_length(),
            notifications: NotificationsConfig::default(),
            suggestions: SuggestionsConfig::default(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

/// SMS delivery. `enabled` is the user-granted permission to send.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationsConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Base URL of the SMS gateway; messages are logged only when absent.
    #[serde(default)]
    pub gateway_url: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuggestionsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_context_events")]
    pub max_context_events: usize,
    #[serde(default = "default_max_title_length")]
    pub max_title_length: usize,
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            max_context_events: default_max_context_events(),
            max_title_length: default_max_title_length(),
        }
    }
}

impl SuggestionsConfig {
    /// Remote calls need both the switch and a key.
    pub fn remote_enabled(&self) -> bool {
        self.enabled && self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

fn default_upcoming_horizon_days() -> u32 {
    7
}

fn default_conflict_window_minutes() -> u32 {
    120
}

fn default_max_event_name_length() -> usize {
    100
}

fn default_event_channel_capacity() -> usize {
    64
}

fn default_true() -> bool {
    true
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_timeout_ms() -> u64 {
    3000
}

fn default_max_context_events() -> usize {
    10
}

fn default_max_title_length() -> usize {
    50
}
