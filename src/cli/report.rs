//! Plain-text and JSON rendering for the query commands. Tabular output goes
//! straight to stdout; `--json` swaps every printer for a pretty-printed
//! serde_json document so the output stays scriptable.

use ansi_term::Style;
use anyhow::Result;
use serde::Serialize;
use serde_json::json;

use crate::storage::entities::{
    AppUsage, AppUsageDetails, CategoryUsage, TimelineEntry,
};

pub fn format_duration(secs: i64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn heading(text: &str) {
    println!("{}", Style::new().bold().paint(text));
}

pub fn print_usage(title: &str, usage: &[AppUsage], json: bool) -> Result<()> {
    if json {
        return print_json(&usage);
    }
    heading(title);
    if usage.is_empty() {
        println!("No activity recorded");
        return Ok(());
    }
    for entry in usage {
        println!(
            "{}\t{}",
            format_duration(entry.total_secs),
            entry.app_name
        );
    }
    Ok(())
}

pub fn print_categories(usage: &[CategoryUsage], json: bool) -> Result<()> {
    if json {
        return print_json(&usage);
    }
    heading("Usage by category");
    if usage.is_empty() {
        println!("No activity recorded");
        return Ok(());
    }
    let total: i64 = usage.iter().map(|v| v.total_secs).sum();
    for entry in usage {
        let percentage = if total > 0 {
            entry.total_secs * 100 / total
        } else {
            0
        };
        println!(
            "{}%\t{}\t{}",
            percentage,
            format_duration(entry.total_secs),
            entry.category
        );
    }
    Ok(())
}

pub fn print_apps(apps: &[AppUsageDetails], json: bool) -> Result<()> {
    if json {
        return print_json(&apps);
    }
    heading("Usage by application");
    if apps.is_empty() {
        println!("No activity recorded");
        return Ok(());
    }
    for entry in apps {
        println!(
            "{}\t{}\t{}\t{}",
            format_duration(entry.total_secs),
            entry.category,
            entry.app_name,
            entry.window_title
        );
    }
    Ok(())
}

pub fn print_timeline(app_name: &str, entries: &[TimelineEntry], json: bool) -> Result<()> {
    if json {
        return print_json(&entries);
    }
    heading(&format!("Timeline for {app_name}"));
    if entries.is_empty() {
        println!("No activity recorded");
        return Ok(());
    }
    for entry in entries {
        println!(
            "{} - {}\t{}\t{}{}",
            entry.start_time.format("%x %H:%M:%S"),
            entry.end_time.format("%H:%M:%S"),
            format_duration(entry.duration_secs),
            entry.window_title,
            if entry.is_foreground { "\t(latest)" } else { "" }
        );
    }
    Ok(())
}

pub fn print_status(
    focused: &Option<AppUsageDetails>,
    recent: &[AppUsageDetails],
    json: bool,
) -> Result<()> {
    if json {
        return print_json(&json!({ "focused": focused, "recent": recent }));
    }
    heading("Current focus");
    match focused {
        Some(entry) => println!(
            "{}\t{}\t{}",
            entry.app_name, entry.category, entry.window_title
        ),
        None => println!("No activity recorded"),
    }
    if !recent.is_empty() {
        heading("Seen in the last hour");
        for entry in recent {
            println!(
                "{}\t{}\t{}",
                format_duration(entry.total_secs),
                entry.category,
                entry.app_name
            );
        }
    }
    Ok(())
}
