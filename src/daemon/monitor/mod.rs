use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::{
    categorize::Categorizer, utils::clock::Clock, window_api::WindowObserver,
};

pub mod session;

use session::{ActivitySession, SessionEvent};

/// Point-in-time view of what the monitor currently sees, published over a
/// watch channel so observers always read the latest value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorSnapshot {
    pub focused: Option<FocusedSnapshot>,
    pub background: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusedSnapshot {
    pub app_name: String,
    pub window_title: String,
    pub category: String,
}

pub struct MonitorModule {
    next: mpsc::Sender<SessionEvent>,
    observer: Box<dyn WindowObserver>,
    shutdown: CancellationToken,
    session: ActivitySession,
    categorizer: Categorizer,
    snapshot: watch::Sender<MonitorSnapshot>,
    poll_interval: Duration,
    background_cadence: u32,
    clock: Box<dyn Clock>,
}

impl MonitorModule {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        next: mpsc::Sender<SessionEvent>,
        observer: Box<dyn WindowObserver>,
        shutdown: CancellationToken,
        categorizer: Categorizer,
        snapshot: watch::Sender<MonitorSnapshot>,
        poll_interval: Duration,
        background_cadence: u32,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            next,
            observer,
            shutdown,
            session: ActivitySession::new(),
            categorizer,
            snapshot,
            poll_interval,
            background_cadence,
            clock,
        }
    }

    fn poll(&mut self, scan_background: bool) -> Vec<SessionEvent> {
        let now = self.clock.time();
        let mut events = Vec::new();

        match self.observer.foreground() {
            Ok(window) => {
                events.extend(self.session.observe_foreground(now, window));
            }
            Err(e) => {
                // A failed probe skips the cycle. The open interval keeps
                // running and the next poll retries.
                warn!("Failed to observe the foreground window {e:?}");
            }
        }

        if scan_background {
            match self.observer.running_apps() {
                Ok(running) => {
                    events.extend(self.session.observe_background(now, &running));
                }
                Err(e) => {
                    warn!("Failed to scan running applications {e:?}");
                }
            }
        }

        events
    }

    fn publish_snapshot(&self) {
        let focused = self.session.focused_app().map(|(app, title)| FocusedSnapshot {
            app_name: app.to_string(),
            window_title: title.to_string(),
            category: self.categorizer.resolve(app),
        });
        let mut background: Vec<String> =
            self.session.background_apps().map(|s| s.to_string()).collect();
        background.sort();
        self.snapshot.send_replace(MonitorSnapshot { focused, background });
    }

    async fn dispatch(&mut self, events: Vec<SessionEvent>) -> Result<()> {
        for event in events {
            let span = info_span!("Dispatching session event");
            debug!("Sending event {:?}", event);
            self.next
                .send(event)
                .instrument(span)
                .await
                .inspect_err(|e| error!("Unexpected error during sending {e:?}"))?;
        }
        Ok(())
    }

    /// Executes the monitor event loop.
    pub async fn run(mut self) -> Result<()> {
        let mut poll_point = self.clock.instant();
        let mut polls: u64 = 0;

        let startup = self.session.begin(self.clock.time());
        self.dispatch(startup).await?;
        self.publish_snapshot();

        loop {
            poll_point += self.poll_interval;

            let scan_background =
                self.background_cadence > 0 && polls % self.background_cadence as u64 == 0;
            let events = self.poll(scan_background);
            polls += 1;

            // Steady-state polls produce no events and publish nothing; the
            // watch channel only ever carries the latest state anyway.
            if !events.is_empty() {
                self.publish_snapshot();
            }
            self.dispatch(events).await?;

            tokio::select! {
                // Cancellation stops the loop. Open intervals get flushed
                // below, then dropping the sender stops the processing module.
                _ = self.shutdown.cancelled() => {
                    break;
                }
                _ = self.clock.sleep_until(poll_point) => ()
            }
        }

        let remaining = self.session.shutdown(self.clock.time());
        self.publish_snapshot();
        self.dispatch(remaining).await?;
        info!("Monitor loop finished");
        Ok(())
    }
}
