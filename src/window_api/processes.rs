//! Portable running-application probe built on process enumeration. It can't
//! see window titles, so the executable name doubles as the label, and it
//! over-approximates compared to a native window list; the builtin system
//! process table keeps OS plumbing out of the result.

use std::collections::HashMap;

use anyhow::Result;
use sysinfo::{ProcessesToUpdate, System};

use crate::categorize;

use super::{ForegroundWindow, WindowObserver};

pub fn scan_running_apps(system: &mut System) -> HashMap<String, String> {
    system.refresh_processes(ProcessesToUpdate::All, true);
    let mut apps = HashMap::new();
    for process in system.processes().values() {
        let name = process.name().to_string_lossy().to_string();
        if name.trim().is_empty() || categorize::is_system_app(&name) {
            continue;
        }
        apps.entry(name.clone()).or_insert(name);
    }
    apps
}

/// Fallback observer for platforms without a native probe: no foreground
/// information, running apps from the process list.
pub struct ProcessListObserver {
    system: System,
}

impl ProcessListObserver {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for ProcessListObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowObserver for ProcessListObserver {
    fn foreground(&mut self) -> Result<ForegroundWindow> {
        Ok(ForegroundWindow::default())
    }

    fn running_apps(&mut self) -> Result<HashMap<String, String>> {
        Ok(scan_running_apps(&mut self.system))
    }
}
