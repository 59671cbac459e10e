use colored::{ColoredString, Colorize};
use dupe_triage_core::storage::models::{DirRecord, FileRecord};
use dupe_triage_core::Status;

/// Color a status for terminal display. Presentation only; color is derived
/// from the status here and nowhere else.
pub fn paint(text: &str, status: Status) -> ColoredString {
    match status {
        Status::Unknown => text.dimmed(),
        Status::Good => text.green(),
        Status::Nuke => text.red().bold(),
        Status::Check => text.yellow(),
        Status::NotSure => text.magenta(),
        Status::Blessed => text.bright_green(),
        Status::Cursed => text.bright_red(),
    }
}

pub fn paint_status(status: Status) -> ColoredString {
    paint(status.as_str(), status)
}

pub fn render_file(record: &FileRecord) -> String {
    let score = record
        .score
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    let status = format!("{:>8}", record.status.as_str());
    format!(
        "{} {:>6}  {}",
        paint(&status, record.status),
        score,
        record.abs_path
    )
}

pub fn render_dir(record: &DirRecord) -> String {
    format!("{:>8} {:>6}  {}", "dir".blue(), "", record.abs_path)
}
