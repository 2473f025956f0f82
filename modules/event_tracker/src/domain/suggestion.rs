//! Event title suggestions: a remote generator raced against a deadline,
//! with a local keyword-based fallback.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::config::SuggestionsConfig;
use crate::contract::model::{Event, TimeContext};
use crate::domain::ports::TitleSuggester;

pub const DEFAULT_TITLE: &str = "New Event";
const GENERIC_BASE: &str = "Event";
const ELLIPSIS: &str = "...";

/// Keyword families checked in order; first hit wins.
const KEYWORD_FAMILIES: &[(&[&str], &str)] = &[
    (&["meeting", "call"], "Meeting"),
    (&["workout", "gym"], "Workout"),
    (&["lunch", "dinner"], "Meal"),
    (&["appointment", "doctor"], "Appointment"),
    (&["coffee", "break"], "Break"),
    (&["review", "planning"], "Planning"),
];

pub struct SuggestionService {
    remote: Option<Arc<dyn TitleSuggester>>,
    config: SuggestionsConfig,
}

impl SuggestionService {
    /// `remote` is ignored unless the config enables remote calls.
    pub fn new(remote: Option<Arc<dyn TitleSuggester>>, config: SuggestionsConfig) -> Self {
        let remote = remote.filter(|_| config.enabled);
        Self { remote, config }
    }

    pub fn local_only(config: SuggestionsConfig) -> Self {
        Self {
            remote: None,
            config,
        }
    }

    pub fn max_context_events(&self) -> usize {
        self.config.max_context_events
    }

    /// Never fails: timeouts, errors, and empty answers all produce the fallback.
    #[instrument(
        name = "event_tracker.suggestion.suggest_title",
        skip(self, recent),
        fields(recent = recent.len())
    )]
    pub async fn suggest_title(
        &self,
        recent: &[Event],
        time_context: TimeContext,
        location: Option<&str>,
    ) -> String {
        let recent = &recent[..recent.len().min(self.config.max_context_events)];
        let Some(remote) = &self.remote else {
            return fallback_title(recent, time_context);
        };

        let deadline = Duration::from_millis(self.config.timeout_ms);
        // The losing branch is dropped together with its in-flight request.
        match tokio::time::timeout(deadline, remote.suggest(recent, time_context, location)).await
        {
            Ok(Ok(raw)) if raw.trim().is_empty() => {
                debug!("remote suggestion was empty; using fallback");
                fallback_title(recent, time_context)
            }
            Ok(Ok(raw)) => {
                let title = clean_suggestion(&raw, self.config.max_title_length);
                debug!(%title, "remote suggestion accepted");
                title
            }
            Ok(Err(e)) => {
                warn!(error = %e, "title suggestion failed; using fallback");
                fallback_title(recent, time_context)
            }
            Err(_) => {
                warn!(timeout_ms = self.config.timeout_ms, "title suggestion timed out; using fallback");
                fallback_title(recent, time_context)
            }
        }
    }
}

/// Local title from keywords in recent event names, prefixed by time of day.
pub fn fallback_title(recent: &[Event], time_context: TimeContext) -> String {
    let base = keyword_base(recent)
        .map(str::to_string)
        .or_else(|| {
            recent
                .first()
                .and_then(|e| e.name.split_whitespace().last())
                .map(str::to_string)
        })
        .unwrap_or_else(|| GENERIC_BASE.to_string());

    match time_context.label() {
        Some(label) => format!("{label} {base}"),
        None => base,
    }
}

fn keyword_base(recent: &[Event]) -> Option<&'static str> {
    recent.iter().find_map(|event| {
        let name = event.name.to_lowercase();
        KEYWORD_FAMILIES
            .iter()
            .find(|(words, _)| words.iter().any(|w| name.contains(w)))
            .map(|(_, base)| *base)
    })
}

/// Strip quotes and `Title:`/`Suggestion:` labels, then cap the length.
/// Falls back to [`DEFAULT_TITLE`] when nothing usable is left.
pub fn clean_suggestion(raw: &str, max_len: usize) -> String {
    let Some(first_line) = raw.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return DEFAULT_TITLE.to_string();
    };
    let mut text = first_line.to_string();

    for label in ["title:", "suggestion:"] {
        if text.to_lowercase().starts_with(label) {
            text = text[label.len()..].trim().to_string();
        }
    }
    let text = text
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '*')
        .trim()
        .to_string();
    if text.is_empty() {
        return DEFAULT_TITLE.to_string();
    }
    truncate_title(&text, max_len)
}

fn truncate_title(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let keep = max_len.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.truncate(out.trim_end().len());
    out.push_str(ELLIPSIS);
    out
}

/// Prompt for the remote generator. Lists at most `max_events` events.
pub fn build_prompt(
    recent: &[Event],
    time_context: TimeContext,
    location: Option<&str>,
    max_events: usize,
) -> String {
    let mut prompt = String::from(
        "Suggest a short, specific title for a new calendar event. \
         Reply with the title only, no quotes, at most a few words.\n",
    );
    if let Some(label) = time_context.label() {
        prompt.push_str(&format!("Time of day: {label}\n"));
    }
    if let Some(location) = location.map(str::trim).filter(|l| !l.is_empty()) {
        prompt.push_str(&format!("Location: {location}\n"));
    }
    if !recent.is_empty() {
        prompt.push_str("Recent events:\n");
        for event in recent.iter().take(max_events) {
            prompt.push_str(&format!("- {} ({})\n", event.name, event.date));
        }
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;
    use async_trait::async_trait;

    fn event(name: &str) -> Event {
        Event {
            id: 1,
            name: name.into(),
            date: "3/10/2025".into(),
            time: None,
            user_id: 1,
            category: None,
        }
    }

    struct Fixed(Result<&'static str, ()>, Duration);

    #[async_trait]
    impl TitleSuggester for Fixed {
        async fn suggest(
            &self,
            _recent: &[Event],
            _time_context: TimeContext,
            _location: Option<&str>,
        ) -> Result<String, DomainError> {
            tokio::time::sleep(self.1).await;
            self.0
                .map(str::to_string)
                .map_err(|_| DomainError::external("suggestions", "boom"))
        }
    }

    fn service(remote: Fixed, timeout_ms: u64) -> SuggestionService {
        let config = SuggestionsConfig {
            timeout_ms,
            ..SuggestionsConfig::default()
        };
        SuggestionService::new(Some(Arc::new(remote)), config)
    }

    #[test]
    fn fallback_uses_keyword_families_in_order() {
        let recent = [event("Gym session"), event("Client call")];
        assert_eq!(fallback_title(&recent, TimeContext::Morning), "Morning Workout");
        assert_eq!(
            fallback_title(&[event("Doctor visit")], TimeContext::Afternoon),
            "Afternoon Appointment"
        );
        assert_eq!(fallback_title(&[event("Sprint Planning")], TimeContext::Anytime), "Planning");
    }

    #[test]
    fn fallback_uses_last_word_then_generic() {
        assert_eq!(fallback_title(&[event("Piano lesson")], TimeContext::Evening), "Evening lesson");
        assert_eq!(fallback_title(&[], TimeContext::Night), "Night Event");
        assert_eq!(fallback_title(&[], TimeContext::Anytime), "Event");
    }

    #[test]
    fn cleaning_strips_labels_and_quotes() {
        assert_eq!(clean_suggestion("\"Team Lunch\"", 50), "Team Lunch");
        assert_eq!(clean_suggestion("Title: Code Review", 50), "Code Review");
        assert_eq!(clean_suggestion("suggestion: 'Gym'\nextra", 50), "Gym");
        assert_eq!(clean_suggestion("  \n \"\" ", 50), DEFAULT_TITLE);
    }

    #[test]
    fn long_titles_are_truncated_with_ellipsis() {
        let long = "A".repeat(80);
        let cleaned = clean_suggestion(&long, 50);
        assert_eq!(cleaned.chars().count(), 50);
        assert!(cleaned.ends_with("..."));
    }

    #[test]
    fn prompt_lists_recent_events() {
        let recent = [event("Standup"), event("Lunch")];
        let prompt = build_prompt(&recent, TimeContext::Morning, Some("Office"), 1);
        assert!(prompt.contains("- Standup (3/10/2025)"));
        assert!(!prompt.contains("Lunch"));
        assert!(prompt.contains("Time of day: Morning"));
        assert!(prompt.contains("Location: Office"));
    }

    #[tokio::test]
    async fn remote_answer_wins_when_fast() {
        let svc = service(Fixed(Ok("Title: \"Budget Review\""), Duration::ZERO), 1000);
        let title = svc.suggest_title(&[event("x")], TimeContext::Morning, None).await;
        assert_eq!(title, "Budget Review");
    }

    #[tokio::test]
    async fn slow_remote_loses_to_deadline() {
        let svc = service(Fixed(Ok("Too Late"), Duration::from_millis(500)), 20);
        let title = svc
            .suggest_title(&[event("Coffee with Sam")], TimeContext::Afternoon, None)
            .await;
        assert_eq!(title, "Afternoon Break");
    }

    #[tokio::test]
    async fn remote_error_and_empty_answer_fall_back() {
        let svc = service(Fixed(Err(()), Duration::ZERO), 1000);
        assert_eq!(svc.suggest_title(&[], TimeContext::Anytime, None).await, "Event");

        let svc = service(Fixed(Ok("   "), Duration::ZERO), 1000);
        assert_eq!(svc.suggest_title(&[], TimeContext::Night, None).await, "Night Event");
    }

    #[tokio::test]
    async fn disabled_config_never_calls_remote() {
        let config = SuggestionsConfig {
            enabled: false,
            ..SuggestionsConfig::default()
        };
        let svc = SuggestionService::new(
            Some(Arc::new(Fixed(Ok("Remote"), Duration::ZERO))),
            config,
        );
        assert_eq!(svc.suggest_title(&[], TimeContext::Anytime, None).await, "Event");
    }
}
