use std::{
    path::Path,
    sync::{Mutex, MutexGuard},
};

use anyhow::{bail, Context, Result};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, Row};
use tracing::debug;

use crate::{
    categorize,
    utils::time::{format_timestamp, parse_timestamp},
};

use super::entities::{
    ActivityRecord, AppUsage, AppUsageDetails, CategoryUsage, SystemEventKind, TimelineEntry,
};

/// Aggregation window for per-app usage totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageWindow {
    /// A single calendar day.
    Day(NaiveDate),
    /// The trailing N days up to now, 7 for weekly and 30 for monthly views.
    LastDays(u32),
}

/// The embedded store. One SQLite connection guarded by a mutex: every write
/// goes through a single logical writer, so partial multi-statement updates
/// can never interleave even when the monitor loop and a CLI invocation hit
/// the same file.
pub struct ActivityStore {
    conn: Mutex<Connection>,
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS activities (
        id INTEGER PRIMARY KEY,
        app_name TEXT NOT NULL,
        window_title TEXT NOT NULL,
        start_time TEXT NOT NULL,
        end_time TEXT NOT NULL,
        duration INTEGER NOT NULL,
        category TEXT DEFAULT 'Unknown'
    );

    CREATE TABLE IF NOT EXISTS system_events (
        id INTEGER PRIMARY KEY,
        event_type TEXT NOT NULL,
        timestamp TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS app_categories (
        id INTEGER PRIMARY KEY,
        app_name TEXT UNIQUE COLLATE NOCASE NOT NULL,
        category TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_activities_app ON activities(app_name);
    CREATE INDEX IF NOT EXISTS idx_activities_start ON activities(start_time);
";

impl ActivityStore {
    /// Opens or creates the store file. Failure here is fatal to the caller,
    /// there is no monitoring without storage.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open activity store at {path:?}"))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize store schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock only means another caller panicked mid-query. The
        // connection itself is still usable.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Appends a closed activity interval. The record's category is upserted
    /// into the override table first, so every observed app accumulates a
    /// sticky category over time. Non-positive durations are dropped, never
    /// stored as zero rows.
    pub fn record_activity(&self, record: &ActivityRecord) -> Result<()> {
        if record.duration_secs <= 0 {
            debug!("Dropping zero-duration interval for {}", record.app_name);
            return Ok(());
        }
        self.set_category(&record.app_name, &record.category)?;
        self.conn()
            .execute(
                "INSERT INTO activities
                 (app_name, window_title, start_time, end_time, duration, category)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.app_name,
                    record.window_title,
                    format_timestamp(record.start_time),
                    format_timestamp(record.end_time),
                    record.duration_secs,
                    record.category,
                ],
            )
            .context("Failed to save activity record")?;
        Ok(())
    }

    pub fn record_system_event(&self, kind: SystemEventKind, at: NaiveDateTime) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO system_events (event_type, timestamp) VALUES (?1, ?2)",
                params![kind.as_str(), format_timestamp(at)],
            )
            .context("Failed to log system event")?;
        Ok(())
    }

    /// The most recent lifecycle events, newest first.
    pub fn system_events(&self, limit: u32) -> Result<Vec<(String, NaiveDateTime)>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT event_type, timestamp FROM system_events ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(kind, at)| Ok((kind, parse_timestamp(&at)?)))
            .collect()
    }

    /// Upserts the category override for an app. Latest write wins; the key
    /// is matched case-insensitively but stored with the case supplied here.
    pub fn set_category(&self, app_name: &str, category: &str) -> Result<()> {
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO app_categories (app_name, category) VALUES (?1, ?2)",
                params![app_name, category],
            )
            .context("Failed to set app category")?;
        Ok(())
    }

    pub fn get_category(&self, app_name: &str) -> Result<Option<String>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT category FROM app_categories WHERE app_name = ?1 COLLATE NOCASE")?;
        let mut rows = stmt.query_map(params![app_name], |row| row.get::<_, String>(0))?;
        Ok(rows.next().transpose()?)
    }

    /// Applies a batch of overrides in one transaction. All-or-nothing: any
    /// failure rolls the whole batch back, including entries already applied.
    pub fn bulk_set_categories(&self, entries: &[(String, String)]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        for (app_name, category) in entries {
            if app_name.trim().is_empty() {
                // Returning drops the transaction, rolling back the batch.
                bail!("App name can't be blank");
            }
            tx.execute(
                "INSERT OR REPLACE INTO app_categories (app_name, category) VALUES (?1, ?2)",
                params![app_name, category],
            )?;
        }
        tx.commit().context("Failed to commit category batch")?;
        Ok(())
    }

    pub fn all_overrides(&self) -> Result<Vec<(String, String)>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT app_name, category FROM app_categories ORDER BY app_name")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn list_categories(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT DISTINCT category FROM app_categories ORDER BY category")?;
        let rows = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn apps_in_category(&self, category: &str) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT app_name FROM app_categories WHERE category = ?1 ORDER BY app_name")?;
        let rows = stmt
            .query_map(params![category], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Per-app totals over a window, summed and sorted descending.
    pub fn usage(&self, window: UsageWindow) -> Result<Vec<AppUsage>> {
        let cutoff = match window {
            UsageWindow::Day(date) => date,
            UsageWindow::LastDays(days) => {
                (Local::now() - Duration::days(days as i64)).date_naive()
            }
        };
        let comparison = match window {
            UsageWindow::Day(_) => "date(start_time) = ?1",
            UsageWindow::LastDays(_) => "date(start_time) >= ?1",
        };
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT app_name, SUM(duration) as total_duration
             FROM activities
             WHERE {comparison}
             GROUP BY app_name
             ORDER BY total_duration DESC"
        ))?;
        let rows = stmt
            .query_map(params![cutoff.format("%Y-%m-%d").to_string()], |row| {
                Ok(AppUsage {
                    app_name: row.get(0)?,
                    total_secs: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Per-category totals. Records join to the override table at read time,
    /// so a record's reported category follows the current override, not the
    /// category stamped when it was written. Apps without an override count
    /// as Unknown.
    pub fn usage_by_category(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<CategoryUsage>> {
        let mut query = String::from(
            "SELECT COALESCE(c.category, 'Unknown') as category,
                    SUM(a.duration) as total_duration
             FROM activities a
             LEFT JOIN app_categories c ON a.app_name = c.app_name COLLATE NOCASE",
        );
        let mut params_vec: Vec<String> = Vec::new();
        if let Some(start) = start {
            query.push_str(" WHERE date(a.start_time) >= ?1");
            params_vec.push(start.format("%Y-%m-%d").to_string());
            if let Some(end) = end {
                query.push_str(" AND date(a.start_time) <= ?2");
                params_vec.push(end.format("%Y-%m-%d").to_string());
            }
        } else if let Some(end) = end {
            query.push_str(" WHERE date(a.start_time) <= ?1");
            params_vec.push(end.format("%Y-%m-%d").to_string());
        }
        query.push_str(" GROUP BY COALESCE(c.category, 'Unknown') ORDER BY total_duration DESC");

        let conn = self.conn();
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(params_vec), |row| {
                Ok(CategoryUsage {
                    category: row.get(0)?,
                    total_secs: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Per-app rows with the last seen window title and resolved category.
    /// Defaults to the trailing 7 days when no date is given. Rows that still
    /// resolve to Unknown get one more pass through the heuristics and, when
    /// that succeeds, the override table is backfilled on the spot.
    pub fn usage_by_app_with_category(
        &self,
        date: Option<NaiveDate>,
    ) -> Result<Vec<AppUsageDetails>> {
        let (comparison, cutoff) = match date {
            Some(date) => ("date(a.start_time) = ?1", date),
            None => (
                "date(a.start_time) >= ?1",
                (Local::now() - Duration::days(7)).date_naive(),
            ),
        };
        let mut rows = {
            let conn = self.conn();
            let mut stmt = conn.prepare(&format!(
                "SELECT a.app_name,
                        (SELECT a2.window_title FROM activities a2
                         WHERE a2.app_name = a.app_name
                         ORDER BY a2.end_time DESC LIMIT 1) as window_title,
                        SUM(a.duration) as total_duration,
                        COALESCE(c.category, a.category, 'Unknown') as category
                 FROM activities a
                 LEFT JOIN app_categories c ON a.app_name = c.app_name COLLATE NOCASE
                 WHERE {comparison}
                 GROUP BY a.app_name
                 ORDER BY total_duration DESC"
            ))?;
            let rows = stmt
                .query_map(params![cutoff.format("%Y-%m-%d").to_string()], |row| {
                    Ok(AppUsageDetails {
                        app_name: row.get(0)?,
                        window_title: row.get(1)?,
                        total_secs: row.get(2)?,
                        category: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        // Second chance for apps nothing has categorized yet. The lock is
        // released above; set_category takes it again per row.
        let overrides = self.all_overrides()?;
        for row in &mut rows {
            if row.category == categorize::UNKNOWN {
                let resolved = categorize::resolve_with(&overrides, &row.app_name);
                if resolved != categorize::UNKNOWN {
                    self.set_category(&row.app_name, &resolved)?;
                    row.category = resolved;
                }
            }
        }
        Ok(rows)
    }

    /// Timeline of records for one app, most recent first. The foreground
    /// flag marks only the latest record and is recomputed per query.
    pub fn timeline(&self, app_name: &str, days: u32) -> Result<Vec<TimelineEntry>> {
        let cutoff = (Local::now() - Duration::days(days as i64)).date_naive();
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT app_name, window_title, start_time, end_time, duration,
                    CASE WHEN id = (
                        SELECT id FROM activities a2
                        WHERE a2.app_name = ?1 COLLATE NOCASE
                        ORDER BY a2.end_time DESC
                        LIMIT 1
                    ) THEN 1 ELSE 0 END as is_foreground
             FROM activities
             WHERE app_name = ?1 COLLATE NOCASE
               AND date(start_time) >= ?2
             ORDER BY start_time DESC",
        )?;
        let rows = stmt
            .query_map(
                params![app_name, cutoff.format("%Y-%m-%d").to_string()],
                timeline_entry_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(entry, start, end)| {
                Ok(TimelineEntry {
                    start_time: parse_timestamp(&start)?,
                    end_time: parse_timestamp(&end)?,
                    ..entry
                })
            })
            .collect()
    }

    /// The most recently closed record plus other apps seen within the last
    /// hour, most recent first, capped at 20.
    pub fn current_status(&self) -> Result<(Option<AppUsageDetails>, Vec<AppUsageDetails>)> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT a.app_name, a.window_title, a.duration,
                    COALESCE(c.category, a.category, 'Unknown') as category
             FROM activities a
             LEFT JOIN app_categories c ON a.app_name = c.app_name COLLATE NOCASE
             ORDER BY a.end_time DESC
             LIMIT 1",
        )?;
        let focused = stmt
            .query_map([], usage_details_from_row)?
            .next()
            .transpose()?;

        let one_hour_ago = Local::now().naive_local() - Duration::hours(1);
        let mut stmt = conn.prepare(
            "SELECT a.app_name, a.window_title, SUM(a.duration) as total_duration,
                    COALESCE(c.category, a.category, 'Unknown') as category
             FROM activities a
             LEFT JOIN app_categories c ON a.app_name = c.app_name COLLATE NOCASE
             WHERE a.app_name <> ?1
               AND a.end_time >= ?2
             GROUP BY a.app_name
             ORDER BY MAX(a.end_time) DESC
             LIMIT 20",
        )?;
        let focused_name = focused.as_ref().map(|v| v.app_name.clone()).unwrap_or_default();
        let recent = stmt
            .query_map(
                params![focused_name, format_timestamp(one_hour_ago)],
                usage_details_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok((focused, recent))
    }
}

fn usage_details_from_row(row: &Row<'_>) -> rusqlite::Result<AppUsageDetails> {
    Ok(AppUsageDetails {
        app_name: row.get(0)?,
        window_title: row.get(1)?,
        total_secs: row.get(2)?,
        category: row.get(3)?,
    })
}

type RawTimelineRow = (TimelineEntry, String, String);

fn timeline_entry_from_row(row: &Row<'_>) -> rusqlite::Result<RawTimelineRow> {
    // Timestamps come out as text; parsing happens outside so chrono errors
    // can surface through anyhow instead of being shoehorned into rusqlite's.
    Ok((
        TimelineEntry {
            app_name: row.get(0)?,
            window_title: row.get(1)?,
            start_time: NaiveDateTime::default(),
            end_time: NaiveDateTime::default(),
            duration_secs: row.get(4)?,
            is_foreground: row.get::<_, i64>(5)? == 1,
        },
        row.get(2)?,
        row.get(3)?,
    ))
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Duration, Local, NaiveDateTime};

    use crate::storage::entities::{ActivityRecord, SystemEventKind};

    use super::{ActivityStore, UsageWindow};

    fn record(app: &str, title: &str, start: NaiveDateTime, secs: i64, category: &str) -> ActivityRecord {
        ActivityRecord {
            app_name: app.into(),
            window_title: title.into(),
            start_time: start,
            end_time: start + Duration::seconds(secs),
            duration_secs: secs,
            category: category.into(),
        }
    }

    fn now() -> NaiveDateTime {
        Local::now().naive_local()
    }

    #[test]
    fn records_and_aggregates_daily_usage() -> Result<()> {
        let store = ActivityStore::open_in_memory()?;
        let start = now() - Duration::minutes(30);

        store.record_activity(&record("chrome.exe", "GitHub", start, 120, "Browser"))?;
        store.record_activity(&record("chrome.exe", "Docs", start + Duration::minutes(5), 60, "Browser"))?;
        store.record_activity(&record("code.exe", "main.rs", start + Duration::minutes(10), 90, "Development"))?;

        let usage = store.usage(UsageWindow::Day(start.date()))?;
        assert_eq!(usage.len(), 2);
        assert_eq!(usage[0].app_name, "chrome.exe");
        assert_eq!(usage[0].total_secs, 180);
        assert_eq!(usage[1].app_name, "code.exe");
        assert_eq!(usage[1].total_secs, 90);
        Ok(())
    }

    #[test]
    fn usage_window_excludes_older_records() -> Result<()> {
        let store = ActivityStore::open_in_memory()?;
        let recent = now() - Duration::days(3);
        let old = now() - Duration::days(10);

        store.record_activity(&record("a.exe", "w", recent, 10, "Utility"))?;
        store.record_activity(&record("b.exe", "w", old, 10, "Utility"))?;

        let weekly = store.usage(UsageWindow::LastDays(7))?;
        assert_eq!(weekly.len(), 1);
        assert_eq!(weekly[0].app_name, "a.exe");

        let monthly = store.usage(UsageWindow::LastDays(30))?;
        assert_eq!(monthly.len(), 2);
        Ok(())
    }

    #[test]
    fn zero_duration_records_are_dropped() -> Result<()> {
        let store = ActivityStore::open_in_memory()?;
        store.record_activity(&record("a.exe", "w", now(), 0, "Utility"))?;
        store.record_activity(&record("a.exe", "w", now(), -5, "Utility"))?;
        assert!(store.usage(UsageWindow::LastDays(30))?.is_empty());
        Ok(())
    }

    #[test]
    fn set_category_is_an_idempotent_upsert() -> Result<()> {
        let store = ActivityStore::open_in_memory()?;
        store.set_category("notepad.exe", "Utility")?;
        store.set_category("notepad.exe", "Utility")?;
        assert_eq!(store.all_overrides()?.len(), 1);

        // Latest write wins, matched case-insensitively.
        store.set_category("Notepad.EXE", "Development")?;
        let overrides = store.all_overrides()?;
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides[0].1, "Development");
        assert_eq!(
            store.get_category("NOTEPAD.exe")?.as_deref(),
            Some("Development")
        );
        Ok(())
    }

    #[test]
    fn category_override_wins_over_stamped_category() -> Result<()> {
        let store = ActivityStore::open_in_memory()?;
        let start = now() - Duration::minutes(10);
        store.record_activity(&record("slack.exe", "general", start, 300, "Productivity"))?;

        store.set_category("slack.exe", "Communication")?;

        let by_category = store.usage_by_category(None, None)?;
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].category, "Communication");
        assert_eq!(by_category[0].total_secs, 300);

        let by_app = store.usage_by_app_with_category(None)?;
        assert_eq!(by_app[0].category, "Communication");
        Ok(())
    }

    #[test]
    fn unknown_apps_get_a_heuristic_second_chance() -> Result<()> {
        let store = ActivityStore::open_in_memory()?;
        let start = now() - Duration::minutes(5);
        store.record_activity(&record("spotify.exe", "Daily Mix", start, 60, "Unknown"))?;

        let rows = store.usage_by_app_with_category(None)?;
        assert_eq!(rows[0].category, "Entertainment");
        // The resolution was written back as an override.
        assert_eq!(
            store.get_category("spotify.exe")?.as_deref(),
            Some("Entertainment")
        );
        Ok(())
    }

    #[test]
    fn bulk_set_categories_applies_whole_batch() -> Result<()> {
        let store = ActivityStore::open_in_memory()?;
        store.bulk_set_categories(&[
            ("a.exe".into(), "Utility".into()),
            ("b.exe".into(), "Browser".into()),
            ("a.exe".into(), "Development".into()),
        ])?;
        assert_eq!(store.get_category("a.exe")?.as_deref(), Some("Development"));
        assert_eq!(store.get_category("b.exe")?.as_deref(), Some("Browser"));
        assert_eq!(store.all_overrides()?.len(), 2);
        Ok(())
    }

    #[test]
    fn failing_batch_rolls_back_already_applied_entries() -> Result<()> {
        let store = ActivityStore::open_in_memory()?;
        let result = store.bulk_set_categories(&[
            ("a.exe".into(), "Utility".into()),
            ("   ".into(), "Browser".into()),
            ("b.exe".into(), "Development".into()),
        ]);
        assert!(result.is_err());
        // The first entry was applied inside the transaction and must be gone.
        assert!(store.all_overrides()?.is_empty());

        // The store stays usable afterwards.
        store.set_category("a.exe", "Utility")?;
        assert_eq!(store.get_category("a.exe")?.as_deref(), Some("Utility"));
        Ok(())
    }

    #[test]
    fn category_listings_follow_the_override_table() -> Result<()> {
        let store = ActivityStore::open_in_memory()?;
        store.bulk_set_categories(&[
            ("chrome.exe".into(), "Browser".into()),
            ("firefox.exe".into(), "Browser".into()),
            ("code.exe".into(), "Development".into()),
        ])?;

        assert_eq!(store.list_categories()?, vec!["Browser", "Development"]);
        assert_eq!(
            store.apps_in_category("Browser")?,
            vec!["chrome.exe", "firefox.exe"]
        );
        assert!(store.apps_in_category("Entertainment")?.is_empty());
        Ok(())
    }

    #[test]
    fn timeline_flags_only_the_latest_record() -> Result<()> {
        let store = ActivityStore::open_in_memory()?;
        let start = now() - Duration::hours(2);
        store.record_activity(&record("code.exe", "lib.rs", start, 60, "Development"))?;
        store.record_activity(&record("code.exe", "main.rs", start + Duration::hours(1), 120, "Development"))?;
        store.record_activity(&record("chrome.exe", "GitHub", start, 60, "Browser"))?;

        let timeline = store.timeline("code.exe", 7)?;
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0].window_title, "main.rs");
        assert!(timeline[0].is_foreground);
        assert!(!timeline[1].is_foreground);
        assert_eq!(timeline[0].duration_secs, 120);
        Ok(())
    }

    #[test]
    fn timeline_foreground_flag_moves_with_new_records() -> Result<()> {
        let store = ActivityStore::open_in_memory()?;
        let start = now() - Duration::hours(1);
        store.record_activity(&record("code.exe", "old", start, 60, "Development"))?;
        assert!(store.timeline("code.exe", 7)?[0].is_foreground);

        store.record_activity(&record("code.exe", "new", start + Duration::minutes(30), 60, "Development"))?;
        let timeline = store.timeline("code.exe", 7)?;
        assert!(timeline[0].is_foreground);
        assert_eq!(timeline[0].window_title, "new");
        assert!(!timeline[1].is_foreground);
        Ok(())
    }

    #[test]
    fn current_status_reports_focused_and_recent_apps() -> Result<()> {
        let store = ActivityStore::open_in_memory()?;
        let base = now();
        store.record_activity(&record("stale.exe", "w", base - Duration::hours(3), 60, "Utility"))?;
        store.record_activity(&record("chrome.exe", "GitHub", base - Duration::minutes(20), 60, "Browser"))?;
        store.record_activity(&record("code.exe", "main.rs", base - Duration::minutes(5), 120, "Development"))?;

        let (focused, recent) = store.current_status()?;
        let focused = focused.unwrap();
        assert_eq!(focused.app_name, "code.exe");
        assert_eq!(focused.category, "Development");

        // Only apps seen within the last hour, focused app excluded.
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].app_name, "chrome.exe");
        Ok(())
    }

    #[test]
    fn current_status_caps_recent_apps_at_twenty() -> Result<()> {
        let store = ActivityStore::open_in_memory()?;
        let base = now();
        for i in 0..25i64 {
            store.record_activity(&record(
                &format!("app{i}.exe"),
                "w",
                base - Duration::minutes(i + 1),
                30,
                "Utility",
            ))?;
        }
        let (_, recent) = store.current_status()?;
        assert_eq!(recent.len(), 20);
        Ok(())
    }

    #[test]
    fn reopening_the_store_keeps_existing_data() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("activity.db");
        let start = now() - Duration::minutes(10);

        {
            let store = ActivityStore::open(&path)?;
            store.record_activity(&record("chrome.exe", "GitHub", start, 60, "Browser"))?;
            store.set_category("mytool.exe", "Development")?;
        }

        let store = ActivityStore::open(&path)?;
        let usage = store.usage(UsageWindow::Day(start.date()))?;
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].total_secs, 60);
        assert_eq!(
            store.get_category("mytool.exe")?.as_deref(),
            Some("Development")
        );
        Ok(())
    }

    #[test]
    fn system_events_are_appended() -> Result<()> {
        let store = ActivityStore::open_in_memory()?;
        store.record_system_event(SystemEventKind::Startup, now())?;
        store.record_system_event(SystemEventKind::Shutdown, now())?;

        let conn = store.conn();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM system_events", [], |row| row.get(0))?;
        assert_eq!(count, 2);
        let kinds: Vec<String> = conn
            .prepare("SELECT event_type FROM system_events ORDER BY id")?
            .query_map([], |row| row.get(0))?
            .collect::<Result<_, _>>()?;
        assert_eq!(kinds, vec!["startup", "shutdown"]);
        Ok(())
    }
}
