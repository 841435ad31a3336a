//! Terminal output for CLI handlers.
//!
//! Every printer routes through [`emit`], which turns the line into a
//! `{"type", "payload"}` JSON event under `--json`, drops it under `--quiet`
//! (warnings excepted) and otherwise renders it with colors. Command results
//! meant for scripts go through [`json_output`] instead.

use std::fmt::Display;

use owo_colors::OwoColorize;
use parking_lot::{const_rwlock, RwLock};
use serde_json::{json, Value};

/// Output mode chosen by the global flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    pub json: bool,
    pub quiet: bool,
}

impl OutputConfig {
    #[must_use]
    pub const fn new(json: bool, quiet: bool) -> Self {
        Self { json, quiet }
    }
}

static OUTPUT: RwLock<OutputConfig> = const_rwlock(OutputConfig::new(false, false));

/// Apply output settings from global CLI flags.
pub fn configure(config: OutputConfig) {
    *OUTPUT.write() = config;
}

#[must_use]
pub fn is_json() -> bool {
    OUTPUT.read().json
}

#[must_use]
pub fn is_quiet() -> bool {
    OUTPUT.read().quiet
}

/// Print one line of human output, or its JSON event.
fn emit(kind: &str, payload: Value, always: bool, render: impl FnOnce()) {
    let config = *OUTPUT.read();
    if config.json {
        println!("{}", json!({ "type": kind, "payload": payload }));
    } else if always || !config.quiet {
        render();
    }
}

/// Color `value` unless output is JSON.
fn paint(value: impl Display, style: impl FnOnce(&str) -> String) -> String {
    let value = value.to_string();
    if is_json() {
        value
    } else {
        style(&value)
    }
}

/// Print the `taodiv <version>` banner.
pub fn header(version: &str) {
    emit("header", json!({ "version": version }), false, || {
        println!("{} {}\n", "taodiv".bold(), version.dimmed());
    });
}

/// Print a labeled value.
pub fn field(label: &str, value: impl Display) {
    let value = value.to_string();
    emit(
        "field",
        json!({ "label": label, "value": value }),
        false,
        || println!("  {:<12} {}", label.dimmed(), value),
    );
}

pub fn success(message: &str) {
    emit("success", json!({ "message": message }), false, || {
        println!("  {} {}", "✓".green(), message);
    });
}

/// Print a warning. Shown even with `--quiet`.
pub fn warning(message: &str) {
    emit("warning", json!({ "message": message }), true, || {
        println!("  {} {}", "⚠".yellow(), message);
    });
}

/// Print an error to stderr, as JSON under `--json`.
pub fn error(message: &str) {
    if is_json() {
        eprintln!("{}", json!({ "type": "error", "payload": { "message": message } }));
    } else {
        eprintln!("  {} {}", "×".red(), message);
    }
}

pub fn section(title: &str) {
    emit("section", json!({ "title": title }), false, || {
        println!("\n{}", title.bold());
    });
}

pub fn hint(message: &str) {
    emit("hint", json!({ "message": message }), false, || {
        println!("  {}: {}", "hint".cyan().dimmed(), message.dimmed());
    });
}

/// Print a pre-rendered block (such as a table), indented.
pub fn lines(content: &str) {
    emit("lines", json!({ "content": content }), false, || {
        for line in content.lines() {
            println!("  {line}");
        }
    });
}

pub fn positive(value: impl Display) -> String {
    paint(value, |v| v.green().to_string())
}

pub fn negative(value: impl Display) -> String {
    paint(value, |v| v.red().to_string())
}

pub fn highlight(value: impl Display) -> String {
    paint(value, |v| v.cyan().to_string())
}

pub fn muted(value: impl Display) -> String {
    paint(value, |v| v.dimmed().to_string())
}

/// Print a command's JSON result on its own line.
pub fn json_output(value: Value) {
    println!("{value}");
}
