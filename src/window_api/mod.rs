//! Probes for the foreground window and the running application set.
//! [GenericWindowObserver] is the main artifact of this module: it picks the
//! best probe available for the platform at startup, so the monitor never
//! branches on the OS itself.

#[cfg(feature = "win")]
pub mod win;
#[cfg(feature = "x11")]
pub mod x11;

pub mod processes;

use std::{collections::HashMap, path::Path};

use anyhow::Result;

/// The application currently holding focus. Both fields are empty when the
/// probe couldn't tell, which callers treat as "skip this poll".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ForegroundWindow {
    /// Executable name, e.g. 'chrome.exe' or 'nvim'.
    pub app_name: String,
    /// Title of the focused window, e.g. 'Vibing in YouTube - Chrome'.
    pub window_title: String,
}

impl ForegroundWindow {
    pub fn is_blank(&self) -> bool {
        self.app_name.trim().is_empty()
    }
}

/// Contract every platform probe implements. Failures are expected and
/// non-fatal; the monitor skips the cycle and retries on the next poll.
#[cfg_attr(test, mockall::automock)]
pub trait WindowObserver: Send {
    fn foreground(&mut self) -> Result<ForegroundWindow>;

    /// Applications currently running, keyed by executable name with the
    /// best window label the probe can produce as the value.
    fn running_apps(&mut self) -> Result<HashMap<String, String>>;
}

/// Cross-platform observer selecting a concrete probe at startup.
pub struct GenericWindowObserver {
    inner: Box<dyn WindowObserver>,
}

impl GenericWindowObserver {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "win")] {
                Ok(Self {
                    inner: Box::new(win::WindowsObserver::new()),
                })
            }
            else if #[cfg(feature = "x11")] {
                Ok(Self {
                    inner: Box::new(x11::X11Observer::new()?),
                })
            }
            else {
                // Without a native probe the foreground stays unknown and
                // only the running-app set gets observed.
                Ok(Self {
                    inner: Box::new(processes::ProcessListObserver::new()),
                })
            }
        }
    }
}

impl WindowObserver for GenericWindowObserver {
    fn foreground(&mut self) -> Result<ForegroundWindow> {
        self.inner.foreground()
    }

    fn running_apps(&mut self) -> Result<HashMap<String, String>> {
        self.inner.running_apps()
    }
}

/// Reduces a full executable path to its base name, the identity apps are
/// keyed by everywhere downstream.
pub fn executable_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::executable_name;

    #[test]
    fn executable_name_strips_directories() {
        assert_eq!(executable_name("/usr/bin/nvim"), "nvim");
        assert_eq!(executable_name("bare-name"), "bare-name");
    }
}
