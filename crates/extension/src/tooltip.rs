//! Style entry tooltips, rendered lazily on hover

use chrono::{DateTime, Utc};
use scheduler::{Callback, Scheduler};
use std::time::Duration;

/// Hover delay before a tooltip is rendered
pub const DEFAULT_TITLE_DELAY: Duration = Duration::from_millis(50);

const MISSING_DATE: &str = "\u{2014}";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleMeta {
    pub install_date: Option<DateTime<Utc>>,
    pub update_date: Option<DateTime<Utc>>,
    pub usercss_version: Option<String>,
}

/// Tooltip text for a style entry
pub fn entry_title(meta: &StyleMeta, now: DateTime<Utc>) -> String {
    let format_date = |date: Option<DateTime<Utc>>| {
        date.map_or_else(
            || MISSING_DATE.to_string(),
            |d| d.format("%Y-%m-%d %H:%M").to_string(),
        )
    };

    let lines = [
        meta.update_date
            .or(meta.install_date)
            .map(|date| format_relative_age(date, now))
            .unwrap_or_default(),
        format!("Installed: {}", format_date(meta.install_date)),
        format!("Updated: {}", format_date(meta.update_date)),
        meta.usercss_version
            .as_deref()
            .map(|v| format!("UserCSS, v.{v}"))
            .unwrap_or_default(),
    ];
    lines
        .into_iter()
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format the age of `date` ("3 days ago")
pub fn format_relative_age(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let Ok(elapsed) = (now - date).to_std() else {
        return "in the future".to_string();
    };
    let seconds = elapsed.as_secs();

    if seconds < 60 {
        format!("{} seconds ago", seconds)
    } else if seconds < 3600 {
        format!("{} minutes ago", seconds / 60)
    } else if seconds < 86400 {
        format!("{} hours ago", seconds / 3600)
    } else if seconds < 604800 {
        format!("{} days ago", seconds / 86400)
    } else {
        format!("{} weeks ago", seconds / 604800)
    }
}

/// Pointer transitions over a style entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Over,
    Out,
}

/// Debounced tooltip rendering for entries identified by `E`
pub struct LazyTitles<E> {
    scheduler: Scheduler<E>,
    render: Callback<E>,
    delay: Duration,
}

impl<E> LazyTitles<E>
where
    E: PartialEq + Send + Sync + 'static,
{
    pub fn new<F>(delay: Duration, render: F) -> Self
    where
        F: Fn(E) + Send + Sync + 'static,
    {
        Self {
            scheduler: Scheduler::new(),
            render: Callback::new(move |mut args: Vec<E>| {
                if let Some(entry) = args.pop() {
                    render(entry);
                }
            }),
            delay,
        }
    }

    /// Schedule rendering when the pointer rests on an entry without a
    /// title; any other event cancels the pending render
    pub fn on_pointer(&self, event: PointerEvent, entry: E, has_title: bool) {
        if event == PointerEvent::Over && !has_title {
            self.scheduler.schedule(&self.render, self.delay, vec![entry]);
        } else {
            self.scheduler.cancel(&self.render);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.scheduler.is_pending(&self.render)
    }
}
