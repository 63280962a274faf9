use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

static ACTIVE: Mutex<Option<ProgressBar>> = Mutex::new(None);

const TICK_STRINGS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
];

fn active() -> Option<ProgressBar> {
    ACTIVE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Shows a spinner until [`finish`] is called.
pub fn start(message: impl Into<String>) {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(TICK_STRINGS);
    pb.set_style(style);
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));

    let previous = ACTIVE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(pb);
    if let Some(previous) = previous {
        previous.finish_and_clear();
    }
}

pub fn finish() {
    let current = ACTIVE.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(pb) = current {
        pb.finish_and_clear();
    }
}

pub fn report_discovery_progress(count: usize) {
    if let Some(pb) = active() {
        pb.set_message(format!(
            "Identified {} hosts so far...",
            count.to_string().green().bold()
        ));
    }
}

/// Runs `f` with the spinner cleared from the terminal.
pub fn suspend<F: FnOnce() -> R, R>(f: F) -> R {
    match active() {
        Some(pb) => pb.suspend(f),
        None => f(),
    }
}
