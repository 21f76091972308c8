use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use monitor::{MonitorModule, MonitorSnapshot};
use processing::{store_save::StoreSaver, ProcessingModule};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::{
    categorize::Categorizer,
    daemon::monitor::session::SessionEvent,
    storage::store::ActivityStore,
    utils::{
        clock::{Clock, DefaultClock},
        dir::STORE_FILE_NAME,
    },
    window_api::{GenericWindowObserver, WindowObserver},
};

pub mod args;
pub mod monitor;
pub mod processing;
pub mod shutdown;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_BACKGROUND_CADENCE: u32 = 5;

/// Represents the starting point for the daemon. A store that can't be opened
/// is fatal; there is no monitoring without storage.
pub async fn start_daemon(
    dir: PathBuf,
    poll_interval: Duration,
    background_cadence: u32,
) -> Result<()> {
    std::env::set_current_dir("/")?;

    let store = Arc::new(ActivityStore::open(&dir.join(STORE_FILE_NAME))?);
    let categorizer = Categorizer::new(store.clone());
    categorizer.ensure_seeded()?;

    let observer = GenericWindowObserver::new()?;
    let (sender, receiver) = mpsc::channel::<SessionEvent>(64);
    let (snapshot, _) = watch::channel(MonitorSnapshot::default());
    let shutdown_token = CancellationToken::new();

    let monitor = create_monitor(
        sender,
        observer,
        &shutdown_token,
        categorizer.clone(),
        snapshot,
        poll_interval,
        background_cadence,
        DefaultClock,
    );
    let processor = ProcessingModule::new(receiver, StoreSaver::new(store, categorizer));

    let (_, monitor_result, processing_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token),
        monitor.run(),
        processor.run(),
    );

    if let Err(monitor_result) = monitor_result {
        error!("Monitor module got an error {:?}", monitor_result);
    }

    if let Err(processing_result) = processing_result {
        error!("Processing module got an error {:?}", processing_result);
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn create_monitor(
    sender: mpsc::Sender<SessionEvent>,
    observer: impl WindowObserver + 'static,
    shutdown_token: &CancellationToken,
    categorizer: Categorizer,
    snapshot: watch::Sender<MonitorSnapshot>,
    poll_interval: Duration,
    background_cadence: u32,
    clock: impl Clock,
) -> MonitorModule {
    MonitorModule::new(
        sender,
        Box::new(observer),
        shutdown_token.clone(),
        categorizer,
        snapshot,
        poll_interval,
        background_cadence,
        Box::new(clock),
    )
}

#[cfg(test)]
mod daemon_tests {
    use std::{collections::HashMap, sync::Arc, time::Duration};

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
    use tokio::{
        sync::{mpsc, watch},
        time::Instant,
    };
    use tokio_util::sync::CancellationToken;

    use crate::{
        categorize::Categorizer,
        daemon::{
            create_monitor, monitor::MonitorSnapshot, processing::store_save::StoreSaver,
            processing::ProcessingModule,
        },
        storage::store::{ActivityStore, UsageWindow},
        utils::{clock::Clock, logging::TEST_LOGGING},
        window_api::{ForegroundWindow, MockWindowObserver},
    };

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    #[derive(Clone)]
    struct TestClock {
        start_time: NaiveDateTime,
        reference: Instant,
    }

    #[async_trait]
    impl Clock for TestClock {
        fn time(&self) -> NaiveDateTime {
            self.start_time + self.reference.elapsed()
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }

        async fn sleep(&self, duration: Duration) {
            tokio::time::sleep(duration).await;
        }

        async fn sleep_until(&self, instant: tokio::time::Instant) {
            tokio::time::sleep_until(instant).await;
        }
    }

    /// Very simple smoke test to check if the whole pipeline works. It can be improved by warping
    /// time so that it takes 10 times less time, but for now we have what we have.
    #[tokio::test]
    async fn smoke_test_daemon() -> Result<()> {
        *TEST_LOGGING;
        let mut observer = MockWindowObserver::new();
        let mut focus = [
            ForegroundWindow {
                app_name: "chrome.exe".into(),
                window_title: "Docs".into(),
            },
            ForegroundWindow {
                app_name: "code.exe".into(),
                window_title: "main.rs".into(),
            },
        ]
        .into_iter()
        .cycle();
        let mut polls = 0u32;
        observer.expect_foreground().returning(move || {
            polls += 1;
            // Hold each window for two polls so every interval has a duration.
            if polls % 2 == 1 {
                focus.next();
            }
            Ok(focus.clone().next().unwrap())
        });
        observer
            .expect_running_apps()
            .returning(|| Ok(HashMap::new()));

        let store = Arc::new(ActivityStore::open_in_memory()?);
        let categorizer = Categorizer::new(store.clone());
        categorizer.ensure_seeded()?;

        let shutdown_token = CancellationToken::new();
        let (sender, receiver) = mpsc::channel(64);
        let (snapshot, snapshot_reader) = watch::channel(MonitorSnapshot::default());
        let test_clock = TestClock {
            start_time: TEST_START_DATE,
            reference: Instant::now(),
        };

        let monitor = create_monitor(
            sender,
            observer,
            &shutdown_token,
            categorizer.clone(),
            snapshot,
            Duration::from_millis(500),
            0,
            test_clock.clone(),
        );
        let processor = ProcessingModule::new(receiver, StoreSaver::new(store.clone(), categorizer));

        let (_, monitor_result, processing_result) = tokio::join!(
            async {
                tokio::time::sleep(Duration::from_millis(5500)).await;
                shutdown_token.cancel()
            },
            monitor.run(),
            processor.run(),
        );

        monitor_result?;
        processing_result?;

        // The watch channel ends on the flushed, empty state.
        assert_eq!(snapshot_reader.borrow().focused, None);

        let usage = store.usage(UsageWindow::Day(TEST_START_DATE.date()))?;
        assert!(!usage.is_empty());
        let total: i64 = usage.iter().map(|u| u.total_secs).sum();
        assert!(total >= 3, "expected a few seconds of recorded usage, got {total}");

        let events = store.system_events(10)?;
        let kinds: Vec<&str> = events.iter().map(|(k, _)| k.as_str()).collect();
        assert!(kinds.contains(&"shutdown"));
        assert!(kinds.contains(&"startup"));
        Ok(())
    }

    /// A failed probe skips the cycle and must leave the open interval
    /// running. Two polls fail in the middle of the run; the shutdown flush
    /// still writes a single record spanning the whole stretch.
    #[tokio::test]
    async fn observer_failures_do_not_reset_the_open_interval() -> Result<()> {
        *TEST_LOGGING;
        let mut observer = MockWindowObserver::new();
        let mut polls = 0u32;
        observer.expect_foreground().returning(move || {
            polls += 1;
            if polls == 2 || polls == 3 {
                return Err(anyhow!("probe offline"));
            }
            Ok(ForegroundWindow {
                app_name: "chrome.exe".into(),
                window_title: "Docs".into(),
            })
        });
        observer
            .expect_running_apps()
            .returning(|| Ok(HashMap::new()));

        let store = Arc::new(ActivityStore::open_in_memory()?);
        let categorizer = Categorizer::new(store.clone());
        categorizer.ensure_seeded()?;

        let shutdown_token = CancellationToken::new();
        let (sender, receiver) = mpsc::channel(64);
        let (snapshot, _snapshot_reader) = watch::channel(MonitorSnapshot::default());
        let test_clock = TestClock {
            start_time: Local::now().naive_local(),
            reference: Instant::now(),
        };

        let monitor = create_monitor(
            sender,
            observer,
            &shutdown_token,
            categorizer.clone(),
            snapshot,
            Duration::from_millis(500),
            0,
            test_clock.clone(),
        );
        let processor = ProcessingModule::new(receiver, StoreSaver::new(store.clone(), categorizer));

        let (_, monitor_result, processing_result) = tokio::join!(
            async {
                tokio::time::sleep(Duration::from_millis(2750)).await;
                shutdown_token.cancel()
            },
            monitor.run(),
            processor.run(),
        );

        monitor_result?;
        processing_result?;

        let timeline = store.timeline("chrome.exe", 1)?;
        assert_eq!(timeline.len(), 1, "failed polls must not close the interval");
        assert!(
            timeline[0].duration_secs >= 2,
            "expected one interval spanning the failed polls, got {}s",
            timeline[0].duration_secs
        );
        Ok(())
    }

    /// Steady polls with no state change publish nothing on the snapshot
    /// channel; only focus changes and the shutdown flush do.
    #[tokio::test]
    async fn steady_polls_do_not_republish_the_snapshot() -> Result<()> {
        *TEST_LOGGING;
        let mut observer = MockWindowObserver::new();
        observer.expect_foreground().returning(|| {
            Ok(ForegroundWindow {
                app_name: "chrome.exe".into(),
                window_title: "Docs".into(),
            })
        });
        observer
            .expect_running_apps()
            .returning(|| Ok(HashMap::new()));

        let store = Arc::new(ActivityStore::open_in_memory()?);
        let categorizer = Categorizer::new(store.clone());
        categorizer.ensure_seeded()?;

        let shutdown_token = CancellationToken::new();
        let (sender, receiver) = mpsc::channel(64);
        let (snapshot, mut snapshot_reader) = watch::channel(MonitorSnapshot::default());
        let test_clock = TestClock {
            start_time: Local::now().naive_local(),
            reference: Instant::now(),
        };

        let monitor = create_monitor(
            sender,
            observer,
            &shutdown_token,
            categorizer.clone(),
            snapshot,
            Duration::from_millis(200),
            0,
            test_clock.clone(),
        );
        let processor = ProcessingModule::new(receiver, StoreSaver::new(store.clone(), categorizer));

        let (_, monitor_result, processing_result) = tokio::join!(
            async {
                // Let the focus settle, then watch a stretch of steady polls.
                tokio::time::sleep(Duration::from_millis(700)).await;
                assert!(snapshot_reader.borrow_and_update().focused.is_some());
                tokio::time::sleep(Duration::from_millis(700)).await;
                assert!(
                    !snapshot_reader.has_changed().unwrap(),
                    "steady polls republished the snapshot"
                );
                shutdown_token.cancel()
            },
            monitor.run(),
            processor.run(),
        );

        monitor_result?;
        processing_result?;
        Ok(())
    }
}
