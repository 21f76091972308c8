//! State machine tracking the focused application and the set of background
//! applications. It is pure: callers feed it observations with timestamps and
//! it answers with the events those observations produced, which keeps the
//! whole thing testable without a window system.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::{
    storage::entities::{ActivityRecord, SystemEventKind},
    window_api::ForegroundWindow,
};

/// A finished stretch of activity, ready to be stamped with a category and
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedInterval {
    pub app_name: String,
    pub window_label: String,
    pub started_at: NaiveDateTime,
    pub ended_at: NaiveDateTime,
    pub duration_secs: i64,
}

impl ClosedInterval {
    pub fn into_record(self, category: String) -> ActivityRecord {
        ActivityRecord {
            app_name: self.app_name,
            window_title: self.window_label,
            start_time: self.started_at,
            end_time: self.ended_at,
            duration_secs: self.duration_secs,
            category,
        }
    }
}

/// What the session concluded from an observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Lifecycle {
        kind: SystemEventKind,
        at: NaiveDateTime,
    },
    FocusChanged {
        app_name: String,
        window_title: String,
    },
    BackgroundStarted {
        app_name: String,
    },
    IntervalClosed(ClosedInterval),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FocusedApp {
    app_name: String,
    window_title: String,
    started_at: NaiveDateTime,
}

/// Labels for background intervals carry a marker prefix so reports can tell
/// them apart from focused time.
pub fn background_label(app_name: &str) -> String {
    format!("Background: {app_name}")
}

#[derive(Debug, Default)]
pub struct ActivitySession {
    focused: Option<FocusedApp>,
    background: HashMap<String, NaiveDateTime>,
}

impl ActivitySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused_app(&self) -> Option<(&str, &str)> {
        self.focused
            .as_ref()
            .map(|f| (f.app_name.as_str(), f.window_title.as_str()))
    }

    pub fn background_apps(&self) -> impl Iterator<Item = &str> + '_ {
        self.background.keys().map(|k| k.as_str())
    }

    pub fn begin(&mut self, now: NaiveDateTime) -> Vec<SessionEvent> {
        vec![SessionEvent::Lifecycle {
            kind: SystemEventKind::Startup,
            at: now,
        }]
    }

    /// Feed one foreground poll. A change of the (app, window) pair closes
    /// the open interval and opens a new one. Blank observations are probe
    /// noise and leave the open interval untouched.
    pub fn observe_foreground(
        &mut self,
        now: NaiveDateTime,
        window: ForegroundWindow,
    ) -> Vec<SessionEvent> {
        if window.is_blank() {
            return Vec::new();
        }

        let unchanged = self.focused.as_ref().is_some_and(|f| {
            f.app_name == window.app_name && f.window_title == window.window_title
        });
        if unchanged {
            return Vec::new();
        }

        let mut events = Vec::new();
        if let Some(previous) = self.focused.take() {
            if let Some(interval) =
                close_interval(previous.app_name, previous.window_title, previous.started_at, now)
            {
                events.push(SessionEvent::IntervalClosed(interval));
            }
        }

        // The focused app is never also tracked as background. If it was
        // running in the background until now, the promotion absorbs that
        // stretch without a record.
        self.background.remove(&window.app_name);

        events.push(SessionEvent::FocusChanged {
            app_name: window.app_name.clone(),
            window_title: window.window_title.clone(),
        });
        self.focused = Some(FocusedApp {
            app_name: window.app_name,
            window_title: window.window_title,
            started_at: now,
        });
        events
    }

    /// Feed one running-application scan. Newly seen apps start a background
    /// interval; apps gone from the scan close theirs.
    pub fn observe_background(
        &mut self,
        now: NaiveDateTime,
        running: &HashMap<String, String>,
    ) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        let gone: Vec<String> = self
            .background
            .keys()
            .filter(|app| !running.contains_key(*app))
            .cloned()
            .collect();
        for app in gone {
            let Some(started_at) = self.background.remove(&app) else {
                continue;
            };
            if let Some(interval) = close_interval(app.clone(), background_label(&app), started_at, now)
            {
                events.push(SessionEvent::IntervalClosed(interval));
            }
        }

        for app in running.keys() {
            if app.trim().is_empty() {
                continue;
            }
            if self.focused.as_ref().is_some_and(|f| &f.app_name == app) {
                continue;
            }
            if self.background.contains_key(app) {
                continue;
            }
            self.background.insert(app.clone(), now);
            events.push(SessionEvent::BackgroundStarted {
                app_name: app.clone(),
            });
        }

        events
    }

    /// Flush every open interval and report the shutdown. The session is
    /// empty afterwards and can be reused.
    pub fn shutdown(&mut self, now: NaiveDateTime) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        if let Some(focused) = self.focused.take() {
            if let Some(interval) =
                close_interval(focused.app_name, focused.window_title, focused.started_at, now)
            {
                events.push(SessionEvent::IntervalClosed(interval));
            }
        }

        // Drain in name order so the flush is deterministic.
        let mut tracked: Vec<(String, NaiveDateTime)> = self.background.drain().collect();
        tracked.sort_by(|a, b| a.0.cmp(&b.0));
        for (app, started_at) in tracked {
            if let Some(interval) = close_interval(app.clone(), background_label(&app), started_at, now)
            {
                events.push(SessionEvent::IntervalClosed(interval));
            }
        }

        events.push(SessionEvent::Lifecycle {
            kind: SystemEventKind::Shutdown,
            at: now,
        });
        events
    }
}

/// Intervals shorter than a full second carry no usable signal and are
/// dropped here rather than at the store.
fn close_interval(
    app_name: String,
    window_label: String,
    started_at: NaiveDateTime,
    ended_at: NaiveDateTime,
) -> Option<ClosedInterval> {
    let duration_secs = (ended_at - started_at).num_seconds();
    if duration_secs <= 0 {
        return None;
    }
    Some(ClosedInterval {
        app_name,
        window_label,
        started_at,
        ended_at,
        duration_secs,
    })
}
