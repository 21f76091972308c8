use chrono::NaiveDateTime;
use serde::Serialize;

/// A closed, immutable interval of application usage. Created only when a
/// focused or background session ends and never mutated afterwards. The
/// category is stamped at close time; aggregation queries may later report a
/// different category if the override table moved on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityRecord {
    pub app_name: String,
    pub window_title: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration_secs: i64,
    pub category: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SystemEventKind {
    Startup,
    Shutdown,
}

impl SystemEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemEventKind::Startup => "startup",
            SystemEventKind::Shutdown => "shutdown",
        }
    }
}

impl std::fmt::Display for SystemEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-app usage total over an aggregation window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppUsage {
    pub app_name: String,
    pub total_secs: i64,
}

/// Per-category usage total over an aggregation window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryUsage {
    pub category: String,
    pub total_secs: i64,
}

/// Per-app usage row including the last seen window title and the category
/// as currently resolved, not necessarily as stamped on the records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppUsageDetails {
    pub app_name: String,
    pub window_title: String,
    pub total_secs: i64,
    pub category: String,
}

/// One activity record in an app's timeline. `is_foreground` marks only the
/// single most-recently-closed record for the app; the flag is computed at
/// query time and can flip as new records are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub app_name: String,
    pub window_title: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration_secs: i64,
    pub is_foreground: bool,
}
