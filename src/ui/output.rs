use crate::output::is_quiet;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}", Icons::ROCKET, text.style(theme().heading.clone()));
}

pub fn status(icon: &str, label: &str, value: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}: {}", icon, label.style(theme().label.clone()), value);
}

pub fn success(label: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}", Icons::CHECK, label.style(theme().committed.clone()));
}

/// Errors are printed even in quiet mode
pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().failure.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warning.clone()));
}

pub fn section(title: &str) {
    if is_quiet() {
        return;
    }
    println!();
    println!("━{}━", title.style(theme().heading.clone()));
}

pub fn muted(text: &str) -> String {
    text.style(theme().faded.clone()).to_string()
}

pub fn file_loaded_line(name: &str, rows: usize, committed: bool) -> String {
    let suffix = if committed { ", committed." } else { "" };
    format!(
        "{} {} {}",
        Icons::FILE.style(theme().file.clone()),
        name,
        muted(&format!("({} rows){}", rows, suffix))
    )
}

pub fn file_skipped_line(name: &str, reason: &str) -> String {
    format!("{} {}", Icons::SKIP, muted(&format!("{} ({})", name, reason)))
}

pub fn directory_committed_line(path: &str) -> String {
    format!(
        "{} {}",
        Icons::CHECK,
        format!("Committed {}", path).style(theme().committed.clone())
    )
}

pub fn timing(elapsed: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}", Icons::CLOCK.style(theme().label.clone()), elapsed);
}

pub fn summary_row(label: &str, value: &str) {
    if is_quiet() {
        return;
    }
    println!("  {} {}", label.style(theme().label.clone()), value);
}
