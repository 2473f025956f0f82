pub mod notify;
pub mod suggest;

pub use notify::NotificationSender;
pub use suggest::TitleSuggester;

/// Output port: publish domain events (no knowledge of transport).
pub trait EventPublisher<E>: Send + Sync + 'static {
    fn publish(&self, event: &E);
}
