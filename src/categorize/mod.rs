//! Classifies application identifiers into category labels. The persisted
//! override table is the single source of truth; a fixed set of heuristic
//! pattern groups covers everything the table doesn't know yet.

use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::{info, warn};

use crate::storage::store::ActivityStore;

pub const SYSTEM: &str = "System";
pub const BROWSER: &str = "Browser";
pub const DEVELOPMENT: &str = "Development";
pub const PRODUCTIVITY: &str = "Productivity";
pub const ENTERTAINMENT: &str = "Entertainment";
pub const COMMUNICATION: &str = "Communication";
pub const UTILITY: &str = "Utility";
pub const UNKNOWN: &str = "Unknown";

/// Heuristic pattern groups, tested in this order. The first group with a
/// matching substring wins, so an app matching both "studio" and "player"
/// lands in Development.
const BROWSER_PATTERNS: &[&str] = &["chrome", "firefox", "edge", "opera", "safari", "brave"];
const DEVELOPMENT_PATTERNS: &[&str] = &[
    "code", "studio", "edit", "ide", "notepad", "vim", "emacs", "compiler", "terminal", "python",
    "java", "node", "npm",
];
const PRODUCTIVITY_PATTERNS: &[&str] = &[
    "word", "excel", "powerpoint", "ppt", "doc", "spreadsheet", "calc", "write", "office", "libre",
    "outlook", "mail", "acrobat", "pdf",
];
const ENTERTAINMENT_PATTERNS: &[&str] = &[
    "play", "media", "vlc", "netflix", "spotify", "music", "video", "audio", "game", "steam",
    "player", "movie", "tv",
];
const COMMUNICATION_PATTERNS: &[&str] = &[
    "chat", "talk", "meet", "zoom", "teams", "skype", "discord", "slack", "messenger", "whatsapp",
    "telegram", "signal", "claude",
];

/// Curated seed table written to the store on first run. Later entries win
/// on duplicate keys, matching the bucket precedence of the original list
/// (communication overrides the office bucket for slack/zoom/outlook).
pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    // System processes, also used to filter process scans.
    ("svchost.exe", SYSTEM),
    ("system", SYSTEM),
    ("registry", SYSTEM),
    ("smss.exe", SYSTEM),
    ("csrss.exe", SYSTEM),
    ("wininit.exe", SYSTEM),
    ("services.exe", SYSTEM),
    ("lsass.exe", SYSTEM),
    ("fontdrvhost.exe", SYSTEM),
    ("dwm.exe", SYSTEM),
    ("taskhost.exe", SYSTEM),
    ("explorer.exe", SYSTEM),
    ("taskhostw.exe", SYSTEM),
    ("conhost.exe", SYSTEM),
    ("searchapp.exe", SYSTEM),
    ("shellexperiencehost.exe", SYSTEM),
    ("runtimebroker.exe", SYSTEM),
    ("backgroundtaskhost.exe", SYSTEM),
    ("startmenuexperiencehost.exe", SYSTEM),
    ("sihost.exe", SYSTEM),
    ("ctfmon.exe", SYSTEM),
    ("securityhealthservice.exe", SYSTEM),
    ("sppsvc.exe", SYSTEM),
    ("searchindexer.exe", SYSTEM),
    ("systemsettings.exe", SYSTEM),
    ("winstore.app.exe", SYSTEM),
    ("applicationframehost.exe", SYSTEM),
    ("lockapp.exe", SYSTEM),
    ("dataexchangehost.exe", SYSTEM),
    ("chrome.exe", BROWSER),
    ("firefox.exe", BROWSER),
    ("msedge.exe", BROWSER),
    ("opera.exe", BROWSER),
    ("brave.exe", BROWSER),
    ("vivaldi.exe", BROWSER),
    ("safari.exe", BROWSER),
    ("iexplore.exe", BROWSER),
    ("code.exe", DEVELOPMENT),
    ("devenv.exe", DEVELOPMENT),
    ("pycharm64.exe", DEVELOPMENT),
    ("idea64.exe", DEVELOPMENT),
    ("eclipse.exe", DEVELOPMENT),
    ("studio64.exe", DEVELOPMENT),
    ("webstorm64.exe", DEVELOPMENT),
    ("phpstorm64.exe", DEVELOPMENT),
    ("rider64.exe", DEVELOPMENT),
    ("notepad++.exe", DEVELOPMENT),
    ("sublime_text.exe", DEVELOPMENT),
    ("cmd.exe", DEVELOPMENT),
    ("powershell.exe", DEVELOPMENT),
    ("windowsterminal.exe", DEVELOPMENT),
    ("git-bash.exe", DEVELOPMENT),
    ("python.exe", DEVELOPMENT),
    ("java.exe", DEVELOPMENT),
    ("javaw.exe", DEVELOPMENT),
    ("winword.exe", PRODUCTIVITY),
    ("excel.exe", PRODUCTIVITY),
    ("powerpnt.exe", PRODUCTIVITY),
    ("onenote.exe", PRODUCTIVITY),
    ("access.exe", PRODUCTIVITY),
    ("publisher.exe", PRODUCTIVITY),
    ("acrord32.exe", PRODUCTIVITY),
    ("acrobat.exe", PRODUCTIVITY),
    ("libreoffice.exe", PRODUCTIVITY),
    ("soffice.exe", PRODUCTIVITY),
    ("writer.exe", PRODUCTIVITY),
    ("evernote.exe", PRODUCTIVITY),
    ("notion.exe", PRODUCTIVITY),
    ("msteams.exe", PRODUCTIVITY),
    ("obs64.exe", PRODUCTIVITY),
    ("anydesk.exe", PRODUCTIVITY),
    ("teamviewer.exe", PRODUCTIVITY),
    ("spotify.exe", ENTERTAINMENT),
    ("itunes.exe", ENTERTAINMENT),
    ("vlc.exe", ENTERTAINMENT),
    ("wmplayer.exe", ENTERTAINMENT),
    ("music.ui.exe", ENTERTAINMENT),
    ("netflix.exe", ENTERTAINMENT),
    ("steam.exe", ENTERTAINMENT),
    ("epicgameslauncher.exe", ENTERTAINMENT),
    ("origin.exe", ENTERTAINMENT),
    ("battle.net.exe", ENTERTAINMENT),
    ("mpc-hc.exe", ENTERTAINMENT),
    ("mpc-hc64.exe", ENTERTAINMENT),
    ("foobar2000.exe", ENTERTAINMENT),
    ("aimp.exe", ENTERTAINMENT),
    ("mpv.exe", ENTERTAINMENT),
    ("winamp.exe", ENTERTAINMENT),
    ("groove.exe", ENTERTAINMENT),
    ("skype.exe", COMMUNICATION),
    ("telegram.exe", COMMUNICATION),
    ("whatsapp.exe", COMMUNICATION),
    ("discord.exe", COMMUNICATION),
    ("signal.exe", COMMUNICATION),
    ("teams.exe", COMMUNICATION),
    ("slack.exe", COMMUNICATION),
    ("zoom.exe", COMMUNICATION),
    ("viber.exe", COMMUNICATION),
    ("wechat.exe", COMMUNICATION),
    ("mail.exe", COMMUNICATION),
    ("thunderbird.exe", COMMUNICATION),
    ("outlook.exe", COMMUNICATION),
    ("yammer.exe", COMMUNICATION),
    ("googlechat.exe", COMMUNICATION),
    ("messenger.exe", COMMUNICATION),
    ("rocketchat.exe", COMMUNICATION),
    ("claude.exe", COMMUNICATION),
    ("notepad.exe", UTILITY),
    ("calc.exe", UTILITY),
    ("mspaint.exe", UTILITY),
    ("snippingtool.exe", UTILITY),
    ("stikynot.exe", UTILITY),
    ("magnify.exe", UTILITY),
    ("narrator.exe", UTILITY),
    ("photos.exe", UTILITY),
    ("7zfm.exe", UTILITY),
    ("winrar.exe", UTILITY),
    ("winzip.exe", UTILITY),
    ("ccleaner.exe", UTILITY),
    ("cleanmgr.exe", UTILITY),
    ("mstsc.exe", UTILITY),
    ("wordpad.exe", UTILITY),
    ("calculator.exe", UTILITY),
    ("paint.exe", UTILITY),
    ("paint3d.exe", UTILITY),
];

/// Resolves a category from an explicit override list. Total and
/// deterministic: any input maps to some category, blank input to Unknown.
///
/// Resolution order: exact override match, bidirectional substring match
/// against override keys, heuristic pattern groups, desktop-shell special
/// case, the bare `.exe` fallback, then Unknown.
pub fn resolve_with(overrides: &[(String, String)], app_name: &str) -> String {
    let app = app_name.trim().to_lowercase();
    if app.is_empty() {
        return UNKNOWN.to_string();
    }

    for (known, category) in overrides {
        if known.to_lowercase() == app {
            return category.clone();
        }
    }

    // Known entries beat generic heuristics even for variant file names.
    for (known, category) in overrides {
        let known = known.to_lowercase();
        if app.contains(&known) || known.contains(&app) {
            return category.clone();
        }
    }

    if let Some(category) = heuristic_category(&app) {
        return category.to_string();
    }

    if app == "explorer.exe" || app.contains("finder") {
        return UTILITY.to_string();
    }

    // Uncategorized native executables default to Utility.
    if app.ends_with(".exe") {
        return UTILITY.to_string();
    }

    UNKNOWN.to_string()
}

fn heuristic_category(app: &str) -> Option<&'static str> {
    let groups: [(&[&str], &str); 5] = [
        (BROWSER_PATTERNS, BROWSER),
        (DEVELOPMENT_PATTERNS, DEVELOPMENT),
        (PRODUCTIVITY_PATTERNS, PRODUCTIVITY),
        (ENTERTAINMENT_PATTERNS, ENTERTAINMENT),
        (COMMUNICATION_PATTERNS, COMMUNICATION),
    ];
    groups
        .into_iter()
        .find(|(patterns, _)| patterns.iter().any(|p| app.contains(p)))
        .map(|(_, category)| category)
}

/// Whether the executable name is one of the builtin system processes.
/// Used by process scans to keep OS plumbing out of the running-app set.
pub fn is_system_app(app_name: &str) -> bool {
    let app = app_name.trim().to_lowercase();
    DEFAULT_CATEGORIES
        .iter()
        .any(|(known, category)| *category == SYSTEM && *known == app)
}

/// Category resolution backed by the store's override table.
#[derive(Clone)]
pub struct Categorizer {
    store: Arc<ActivityStore>,
}

impl Categorizer {
    pub fn new(store: Arc<ActivityStore>) -> Self {
        Self { store }
    }

    /// Seeds the builtin table on first run. A store that already has any
    /// override is left alone.
    pub fn ensure_seeded(&self) -> Result<()> {
        if self.store.all_overrides()?.is_empty() {
            info!(
                "Seeding {} builtin app categories",
                DEFAULT_CATEGORIES.len()
            );
            let entries: Vec<(String, String)> = DEFAULT_CATEGORIES
                .iter()
                .map(|(app, category)| (app.to_string(), category.to_string()))
                .collect();
            self.store.bulk_set_categories(&entries)?;
        }
        Ok(())
    }

    /// Total: a failed override read degrades to heuristics-only resolution.
    pub fn resolve(&self, app_name: &str) -> String {
        let overrides = match self.store.all_overrides() {
            Ok(overrides) => overrides,
            Err(e) => {
                warn!("Couldn't read category overrides, falling back to heuristics: {e:?}");
                Vec::new()
            }
        };
        resolve_with(&overrides, app_name)
    }

    pub fn add_override(&self, app_name: &str, category: &str) -> Result<()> {
        if app_name.trim().is_empty() {
            bail!("App name can't be blank");
        }
        self.store.set_category(app_name, category)
    }
}
