//! File persistence configuration

/// The Master Persistence Configuration
pub struct PersistenceConfig {
    /// Default SQLite database path
    pub db_path: &'static str,
    /// Default JSON document store path (the local-storage style backend)
    pub json_path: &'static str,
    /// Capacity of the change-notification broadcast channel
    pub change_feed_capacity: usize,
    /// Connection pool size for the SQLite backend
    pub max_connections: u32,
    /// Busy timeout for the SQLite backend
    pub busy_timeout_secs: u64,
}

pub const PERSISTENCE: PersistenceConfig = PersistenceConfig {
    db_path: "shipments.sqlite",
    json_path: "shipments.json",
    change_feed_capacity: 64,
    max_connections: 2, // Low connection count, this is low throughput
    busy_timeout_secs: 10,
};
