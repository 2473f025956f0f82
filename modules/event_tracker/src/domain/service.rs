use std::path::Path;
use std::sync::Arc;

use chrono::{Local, NaiveDate, Utc};
use dashmap::DashMap;
use tracing::{debug, info, instrument, warn};

use crate::config::EventTrackerConfig;
use crate::contract::model::{
    Category, CategoryCount, CategoryId, ConflictPolicy, Event, EventId, EventRequest, NewCategory,
    SortOrder, UserId,
};
use crate::domain::conflict::ConflictChecker;
use crate::domain::error::DomainError;
use crate::domain::events::EventDomainEvent;
use crate::domain::datetime;
use crate::domain::export;
use crate::domain::index::EventIndex;
use crate::domain::ports::{EventPublisher, NotificationSender};
use crate::domain::repo::{CategoriesRepository, EventsRepository, UsersRepository};
use crate::domain::validation;

pub const DEFAULT_CATEGORY_COLOR: &str = "#2196F3";

/// Repositories the service reads and writes through.
#[derive(Clone)]
pub struct Repositories {
    pub events: Arc<dyn EventsRepository>,
    pub categories: Arc<dyn CategoriesRepository>,
    pub users: Arc<dyn UsersRepository>,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub upcoming_horizon_days: u32,
    pub conflict_window_minutes: u32,
    pub max_event_name_length: usize,
    /// Permission to text the user; nothing is sent without it.
    pub notifications_enabled: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            upcoming_horizon_days: 7,
            conflict_window_minutes: 120,
            max_event_name_length: validation::MAX_EVENT_NAME_LENGTH,
            notifications_enabled: false,
        }
    }
}

impl From<&EventTrackerConfig> for ServiceConfig {
    fn from(cfg: &EventTrackerConfig) -> Self {
        Self {
            upcoming_horizon_days: cfg.upcoming_horizon_days,
            conflict_window_minutes: cfg.conflict_window_minutes,
            max_event_name_length: cfg.max_event_name_length,
            notifications_enabled: cfg.notifications.enabled,
        }
    }
}

/// Event flows and queries for every user.
///
/// Each user's [`EventIndex`] is rebuilt from the store after every mutation
/// and swapped in whole, so readers see either the old or the new snapshot.
pub struct Service {
    repos: Repositories,
    events: Arc<dyn EventPublisher<EventDomainEvent>>,
    notifier: Arc<dyn NotificationSender>,
    checker: ConflictChecker,
    config: ServiceConfig,
    indices: DashMap<UserId, Arc<EventIndex>>,
}

impl Service {
    pub fn new(
        repos: Repositories,
        events: Arc<dyn EventPublisher<EventDomainEvent>>,
        notifier: Arc<dyn NotificationSender>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            repos,
            events,
            notifier,
            checker: ConflictChecker::new(config.conflict_window_minutes),
            config,
            indices: DashMap::new(),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    // --- index lifecycle ---

    /// Reload the user's events from the store and replace their index.
    #[instrument(name = "event_tracker.service.load_events", skip(self))]
    pub async fn load_events(&self, user_id: UserId) -> Result<Arc<EventIndex>, DomainError> {
        let events = self
            .repos
            .events
            .events_for_user(user_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        let index = Arc::new(EventIndex::build(user_id, events));
        self.indices.insert(user_id, index.clone());
        debug!(count = index.len(), "index rebuilt");
        Ok(index)
    }

    /// Current index, loading it on first use.
    pub async fn index(&self, user_id: UserId) -> Result<Arc<EventIndex>, DomainError> {
        if let Some(index) = self.indices.get(&user_id) {
            return Ok(index.clone());
        }
        self.load_events(user_id).await
    }

    /// Drop a user's cached index, e.g. on logout.
    pub fn forget(&self, user_id: UserId) {
        self.indices.remove(&user_id);
    }

    // --- mutations ---

    #[instrument(
        name = "event_tracker.service.add_event",
        skip(self, req),
        fields(user_id = req.user_id(), name = %req.name(), date = %req.date())
    )]
    pub async fn add_event(
        &self,
        req: EventRequest,
        policy: ConflictPolicy,
    ) -> Result<Event, DomainError> {
        info!("Adding event");
        validation::validate_event_request(&req, self.config.max_event_name_length)?;
        self.ensure_category(&req).await?;

        let index = self.index(req.user_id()).await?;
        if index.contains_name_and_date(req.name(), req.date()) {
            return Err(DomainError::duplicate_event(req.name(), req.date()));
        }
        self.guard_conflicts(&index, &req, None, policy)?;

        let id = self
            .repos
            .events
            .insert_event(&req)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        let event = self.reload_and_get(req.user_id(), id).await?;
        self.events.publish(&EventDomainEvent::Created {
            id,
            user_id: req.user_id(),
            at: Utc::now(),
        });
        self.notify(
            req.user_id(),
            &format!("Your event '{}' on {} has been added.", event.name, event.date),
        )
        .await;

        info!(event_id = id, "Successfully added event");
        Ok(event)
    }

    /// Same-name-same-date is not rejected here; only add checks it.
    #[instrument(
        name = "event_tracker.service.update_event",
        skip(self, req),
        fields(user_id = req.user_id(), event_id = id)
    )]
    pub async fn update_event(
        &self,
        id: EventId,
        req: EventRequest,
        policy: ConflictPolicy,
    ) -> Result<Event, DomainError> {
        info!("Updating event");
        validation::validate_event_request(&req, self.config.max_event_name_length)?;

        let index = self.index(req.user_id()).await?;
        if index.get(id).is_none() {
            return Err(DomainError::event_not_found(id));
        }
        self.ensure_category(&req).await?;
        self.guard_conflicts(&index, &req, Some(id), policy)?;

        let updated = self
            .repos
            .events
            .update_event(id, &req)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if !updated {
            return Err(DomainError::event_not_found(id));
        }

        let event = self.reload_and_get(req.user_id(), id).await?;
        self.events.publish(&EventDomainEvent::Updated {
            id,
            user_id: req.user_id(),
            at: Utc::now(),
        });
        self.notify(
            req.user_id(),
            &format!("Your event '{}' on {} has been updated.", event.name, event.date),
        )
        .await;

        info!("Successfully updated event");
        Ok(event)
    }

    #[instrument(name = "event_tracker.service.delete_event", skip(self))]
    pub async fn delete_event(&self, user_id: UserId, id: EventId) -> Result<(), DomainError> {
        info!("Deleting event");
        let name = self
            .index(user_id)
            .await?
            .get(id)
            .map(|e| e.name.clone());

        let deleted = self
            .repos
            .events
            .delete_event(user_id, id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if !deleted {
            return Err(DomainError::event_not_found(id));
        }

        self.load_events(user_id).await?;
        self.events.publish(&EventDomainEvent::Deleted {
            id,
            user_id,
            at: Utc::now(),
        });
        if let Some(name) = name {
            self.notify(user_id, &format!("Your event '{name}' has been deleted."))
                .await;
        }

        info!("Successfully deleted event");
        Ok(())
    }

    // --- queries ---

    pub async fn list_events(
        &self,
        user_id: UserId,
        order: SortOrder,
    ) -> Result<Vec<Event>, DomainError> {
        Ok(self.index(user_id).await?.sorted(order))
    }

    /// Events narrowed by category and an inclusive `M/d/yyyy` date range,
    /// earliest first. Blank bounds are ignored.
    pub async fn filter_events(
        &self,
        user_id: UserId,
        category_id: Option<CategoryId>,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Vec<Event>, DomainError> {
        let from = parse_bound(from)?;
        let to = parse_bound(to)?;
        Ok(self.index(user_id).await?.filtered(category_id, from, to))
    }

    pub async fn next_event(&self, user_id: UserId) -> Result<Option<Event>, DomainError> {
        Ok(self.index(user_id).await?.peek_next().cloned())
    }

    /// Events within the configured horizon from today's local date.
    pub async fn upcoming_events(&self, user_id: UserId) -> Result<Vec<Event>, DomainError> {
        self.upcoming_events_from(user_id, Local::now().date_naive())
            .await
    }

    pub async fn upcoming_events_from(
        &self,
        user_id: UserId,
        today: NaiveDate,
    ) -> Result<Vec<Event>, DomainError> {
        Ok(self
            .index(user_id)
            .await?
            .upcoming(today, self.config.upcoming_horizon_days))
    }

    pub async fn find_by_name(
        &self,
        user_id: UserId,
        name: &str,
    ) -> Result<Option<Event>, DomainError> {
        Ok(self.index(user_id).await?.by_name(name).cloned())
    }

    pub async fn events_on_date(
        &self,
        user_id: UserId,
        date: &str,
    ) -> Result<Vec<Event>, DomainError> {
        Ok(self.index(user_id).await?.by_date(date.trim()))
    }

    pub async fn find_by_name_and_date(
        &self,
        user_id: UserId,
        name: &str,
        date: &str,
    ) -> Result<Option<Event>, DomainError> {
        Ok(self
            .index(user_id)
            .await?
            .by_name_and_date(name.trim(), date.trim())
            .cloned())
    }

    /// Existing events on the request's date that overlap its time.
    pub async fn check_conflicts(
        &self,
        req: &EventRequest,
        exclude: Option<EventId>,
    ) -> Result<Vec<Event>, DomainError> {
        let index = self.index(req.user_id()).await?;
        Ok(self.conflicts_in(&index, req, exclude))
    }

    pub async fn complete_name(
        &self,
        user_id: UserId,
        input: &str,
    ) -> Result<Vec<String>, DomainError> {
        Ok(self.index(user_id).await?.complete_name(input))
    }

    /// Latest-dated events first, for suggestion context.
    pub async fn recent_events(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<Event>, DomainError> {
        let mut events = self.index(user_id).await?.sorted(SortOrder::DateDesc);
        events.truncate(limit);
        Ok(events)
    }

    // --- categories ---

    pub async fn categories(&self, user_id: UserId) -> Result<Vec<Category>, DomainError> {
        self.repos
            .categories
            .categories_for_user(user_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))
    }

    #[instrument(
        name = "event_tracker.service.add_category",
        skip(self, new),
        fields(user_id = new.user_id, name = %new.name)
    )]
    pub async fn add_category(&self, new: NewCategory) -> Result<Category, DomainError> {
        let name = new.name.trim();
        validation::validate_category_name(name)?;
        let color = new
            .color
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY_COLOR);
        validation::validate_color(color)?;

        self.repos
            .categories
            .insert_category(new.user_id, name, color)
            .await
            .map_err(|e| DomainError::database(e.to_string()))
    }

    pub async fn category_counts(&self, user_id: UserId) -> Result<Vec<CategoryCount>, DomainError> {
        self.repos
            .categories
            .category_counts(user_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))
    }

    // --- export ---

    /// Write the user's events as CSV; returns the number of event rows.
    #[instrument(name = "event_tracker.service.export_csv", skip(self, path), fields(path = %path.display()))]
    pub async fn export_csv(&self, user_id: UserId, path: &Path) -> Result<usize, DomainError> {
        let index = self.load_events(user_id).await?;
        write_file(path, export::render_csv(index.events())).await?;
        info!(rows = index.len(), "exported events");
        Ok(index.len())
    }

    pub async fn events_summary(&self, user_id: UserId) -> Result<String, DomainError> {
        let index = self.load_events(user_id).await?;
        let counts = self.category_counts(user_id).await?;
        Ok(export::render_summary(user_id, index.events(), &counts))
    }

    #[instrument(name = "event_tracker.service.export_summary", skip(self, path), fields(path = %path.display()))]
    pub async fn export_summary(&self, user_id: UserId, path: &Path) -> Result<(), DomainError> {
        let summary = self.events_summary(user_id).await?;
        write_file(path, summary).await
    }

    // --- helpers ---

    async fn ensure_category(&self, req: &EventRequest) -> Result<(), DomainError> {
        let Some(category_id) = req.category_id() else {
            return Ok(());
        };
        self.repos
            .categories
            .find_category(req.user_id(), category_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .map(|_| ())
            .ok_or_else(|| DomainError::category_not_found(category_id))
    }

    fn conflicts_in(
        &self,
        index: &EventIndex,
        req: &EventRequest,
        exclude: Option<EventId>,
    ) -> Vec<Event> {
        self.checker
            .find_conflicts(req.time(), &index.by_date(req.date()), exclude)
    }

    fn guard_conflicts(
        &self,
        index: &EventIndex,
        req: &EventRequest,
        exclude: Option<EventId>,
        policy: ConflictPolicy,
    ) -> Result<(), DomainError> {
        let conflicts = self.conflicts_in(index, req, exclude);
        if conflicts.is_empty() {
            return Ok(());
        }
        match policy {
            ConflictPolicy::Warn => {
                debug!(count = conflicts.len(), "time conflict detected");
                Err(DomainError::TimeConflict { conflicts })
            }
            ConflictPolicy::Proceed => {
                info!(count = conflicts.len(), "saving despite time conflict");
                Ok(())
            }
        }
    }

    async fn reload_and_get(&self, user_id: UserId, id: EventId) -> Result<Event, DomainError> {
        self.load_events(user_id)
            .await?
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::event_not_found(id))
    }

    /// Best-effort text to the user's phone. Failures are logged only.
    async fn notify(&self, user_id: UserId, message: &str) {
        if !self.config.notifications_enabled {
            return;
        }
        let phone = match self.repos.users.find_user(user_id).await {
            Ok(Some(user)) => user.phone,
            Ok(None) => None,
            Err(e) => {
                warn!(user_id, error = %e, "cannot load phone number for notification");
                return;
            }
        };
        let Some(phone) = phone else {
            debug!(user_id, "no phone number on file; skipping notification");
            return;
        };
        if let Err(e) = self.notifier.send(&phone, message).await {
            warn!(user_id, error = %e, "notification failed (continuing)");
        }
    }
}

fn parse_bound(bound: Option<&str>) -> Result<Option<NaiveDate>, DomainError> {
    let Some(bound) = bound.map(str::trim).filter(|b| !b.is_empty()) else {
        return Ok(None);
    };
    validation::validate_date(bound)?;
    Ok(datetime::parse_date(bound))
}

async fn write_file(path: &Path, contents: String) -> Result<(), DomainError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DomainError::export(format!("{}: {e}", parent.display())))?;
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| DomainError::export(format!("{}: {e}", path.display())))
}
