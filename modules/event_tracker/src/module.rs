use std::sync::Arc;

use anyhow::Context;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::EventTrackerConfig;
use crate::contract::client::EventTrackerApi;
use crate::domain::accounts::Accounts;
use crate::domain::events::EventDomainEvent;
use crate::domain::ports::{NotificationSender, TitleSuggester};
use crate::domain::service::{Repositories, Service, ServiceConfig};
use crate::domain::suggestion::SuggestionService;
use crate::gateways::local::EventTrackerLocalClient;
use crate::infra::events::BroadcastPublisher;
use crate::infra::notify::{HttpSmsSender, LogOnlySender};
use crate::infra::storage::{migrations::Migrator, SeaOrmRepository};
use crate::infra::suggest::GeminiSuggester;

/// Name of this module's section under `modules:` in the app config.
pub const MODULE_NAME: &str = "event_tracker";

/// Wired module: the public client plus the domain-event stream.
#[derive(Clone)]
pub struct EventTrackerModule {
    client: Arc<dyn EventTrackerApi>,
    service: Arc<Service>,
    publisher: BroadcastPublisher,
}

impl EventTrackerModule {
    pub fn client(&self) -> Arc<dyn EventTrackerApi> {
        self.client.clone()
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    /// Receives every Created/Updated/Deleted event published after the call.
    pub fn subscribe(&self) -> broadcast::Receiver<EventDomainEvent> {
        self.publisher.subscribe()
    }
}

/// Migrates the schema and wires storage, notifications and suggestions.
pub async fn bootstrap(
    db: DatabaseConnection,
    cfg: EventTrackerConfig,
) -> anyhow::Result<EventTrackerModule> {
    Migrator::up(&db, None)
        .await
        .context("event_tracker migrations failed")?;
    debug!("event_tracker schema is up to date");

    let notifier = build_notifier(&cfg)?;
    let remote = build_suggester(&cfg)?;
    Ok(assemble(db, &cfg, notifier, remote))
}

/// Same wiring as [`bootstrap`] with caller-supplied adapters.
/// Expects an already migrated connection.
pub fn assemble(
    db: DatabaseConnection,
    cfg: &EventTrackerConfig,
    notifier: Arc<dyn NotificationSender>,
    remote: Option<Arc<dyn TitleSuggester>>,
) -> EventTrackerModule {
    let repo = Arc::new(SeaOrmRepository::new(db));
    let repos = Repositories {
        events: repo.clone(),
        categories: repo.clone(),
        users: repo.clone(),
    };

    let publisher = BroadcastPublisher::new(cfg.event_channel_capacity);
    let service = Arc::new(Service::new(
        repos,
        Arc::new(publisher.clone()),
        notifier,
        ServiceConfig::from(cfg),
    ));
    let accounts = Arc::new(Accounts::new(repo));
    let suggestions = Arc::new(SuggestionService::new(remote, cfg.suggestions.clone()));

    let client: Arc<dyn EventTrackerApi> = Arc::new(EventTrackerLocalClient::new(
        service.clone(),
        accounts,
        suggestions,
    ));

    info!(
        notifications = cfg.notifications.enabled,
        remote_suggestions = cfg.suggestions.remote_enabled(),
        "event_tracker module initialized"
    );
    EventTrackerModule {
        client,
        service,
        publisher,
    }
}

fn build_notifier(cfg: &EventTrackerConfig) -> anyhow::Result<Arc<dyn NotificationSender>> {
    let n = &cfg.notifications;
    match n.gateway_url.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => {
            let url = Url::parse(raw).with_context(|| format!("invalid gateway_url '{raw}'"))?;
            Ok(Arc::new(HttpSmsSender::new(url, n.sender.clone())?))
        }
        _ => {
            if n.enabled {
                warn!("notifications enabled without gateway_url; messages will only be logged");
            }
            Ok(Arc::new(LogOnlySender))
        }
    }
}

fn build_suggester(cfg: &EventTrackerConfig) -> anyhow::Result<Option<Arc<dyn TitleSuggester>>> {
    let s = &cfg.suggestions;
    if !s.remote_enabled() {
        return Ok(None);
    }
    let base = Url::parse(&s.base_url)
        .with_context(|| format!("invalid suggestions base_url '{}'", s.base_url))?;
    let api_key = s.api_key.clone().unwrap_or_default();
    Ok(Some(Arc::new(GeminiSuggester::new(
        base,
        s.model.clone(),
        api_key,
        s.max_context_events,
    ))))
}
