use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::{
    categorize::{self, Categorizer},
    daemon::monitor::session::SessionEvent,
    storage::store::ActivityStore,
};

use super::module::EventProcessor;

/// Bridges the event pipeline and [ActivityStore]. Every closed interval is
/// stamped with its category at write time; apps seen for the first time get
/// their resolved category persisted so later reports stay stable.
pub struct StoreSaver {
    store: Arc<ActivityStore>,
    categorizer: Categorizer,
}

impl StoreSaver {
    pub fn new(store: Arc<ActivityStore>, categorizer: Categorizer) -> Self {
        Self { store, categorizer }
    }

    fn remember_category(&self, app_name: &str) -> Result<()> {
        if self.store.get_category(app_name)?.is_some() {
            return Ok(());
        }
        let category = self.categorizer.resolve(app_name);
        if category != categorize::UNKNOWN {
            debug!("Remembering category {category} for {app_name}");
            self.store.set_category(app_name, &category)?;
        }
        Ok(())
    }
}

impl EventProcessor for StoreSaver {
    async fn process_next(&mut self, event: SessionEvent) -> Result<()> {
        match event {
            SessionEvent::Lifecycle { kind, at } => {
                self.store.record_system_event(kind, at)?;
            }
            SessionEvent::FocusChanged { app_name, .. } => {
                self.remember_category(&app_name)?;
            }
            SessionEvent::BackgroundStarted { app_name } => {
                self.remember_category(&app_name)?;
            }
            SessionEvent::IntervalClosed(interval) => {
                let category = self.categorizer.resolve(&interval.app_name);
                self.store.record_activity(&interval.into_record(category))?;
            }
        }
        Ok(())
    }

    async fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}
