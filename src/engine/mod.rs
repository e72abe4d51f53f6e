mod messages;
mod watcher;

pub use {messages::TrackingUpdate, watcher::TrackingWatcher};
