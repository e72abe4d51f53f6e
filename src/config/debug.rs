//! Debugging feature flags.

#[allow(dead_code)]
pub struct LogFlags {
    /// Log every projection produced by `compute_progress`.
    pub log_progress: bool,

    /// Log repository writes (inserts, status appends, deletes).
    pub log_repository: bool,

    /// Log change-feed traffic seen by the tracking watcher.
    pub log_watcher: bool,

    pub log_admin: bool,
}

pub const DF: LogFlags = LogFlags {
    log_admin: true,

    log_progress: false,
    log_repository: false,
    log_watcher: false,
};
