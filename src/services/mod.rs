//! Platform services consumed by the engine

pub mod notifier;

pub use notifier::{
    notify_best_effort, LoggingNotifier, NotificationTemplate, Notifier, RecordingNotifier,
};
