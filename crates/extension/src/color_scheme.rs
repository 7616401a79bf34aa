//! Dark mode tracking and the night time schedule
//!
//! A [`ColorScheme`] resolves the effective dark flag from the selected
//! [`SchemeMode`]. The `system` and `time` modes read flags updated at
//! runtime; the others are fixed. [`SchemeSwitcher`] keeps the scheme in
//! sync with the preference store.

use crate::error::SchemeError;
use chrono::{DateTime, FixedOffset, Local, NaiveTime, TimeZone, Timelike};
use parking_lot::{Mutex, RwLock};
use scheduler::{Callback, Scheduler};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Weak};
use std::time::Duration;
use storage::{Prefs, SubscriptionId};
use tracing::{debug, warn};

pub const PREF_MODE: &str = "schemeSwitcher.enabled";
pub const PREF_NIGHT_START: &str = "schemeSwitcher.nightStart";
pub const PREF_NIGHT_END: &str = "schemeSwitcher.nightEnd";

/// Night alarms repeat daily
pub const ALARM_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemeMode {
    #[default]
    Never,
    Dark,
    Light,
    System,
    Time,
}

impl SchemeMode {
    pub const ALL: [SchemeMode; 5] = [
        Self::Never,
        Self::Dark,
        Self::Light,
        Self::System,
        Self::Time,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::Dark => "dark",
            Self::Light => "light",
            Self::System => "system",
            Self::Time => "time",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SchemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemeMode {
    type Err = SchemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| SchemeError::UnknownMode(s.to_string()))
    }
}

/// Time of day with minute precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    /// Parse `H:MM` or `HH:MM`
    pub fn parse(s: &str) -> Result<Self, SchemeError> {
        let invalid = || SchemeError::InvalidClockTime(s.to_string());
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour = hour.parse().map_err(|_| invalid())?;
        let minute = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).ok_or_else(invalid)
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }

    fn seconds(self) -> u32 {
        u32::from(self.hour) * 3600 + u32::from(self.minute) * 60
    }

    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour.into(), self.minute.into(), 0).unwrap_or_default()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Daily interval during which the `time` mode is dark
///
/// A start later than the end wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NightWindow {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl NightWindow {
    pub fn new(start: ClockTime, end: ClockTime) -> Self {
        Self { start, end }
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, SchemeError> {
        Ok(Self::new(ClockTime::parse(start)?, ClockTime::parse(end)?))
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        let now = time.num_seconds_from_midnight();
        let (start, end) = (self.start.seconds(), self.end.seconds());
        if start > end {
            now >= start || now < end
        } else {
            now >= start && now < end
        }
    }
}

/// Next occurrence of `at`: today unless already past, else tomorrow
///
/// Returns `None` when the local time does not exist on either day.
pub fn next_alarm<Tz: TimeZone>(now: &DateTime<Tz>, at: ClockTime) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let today = now.date_naive();
    let time = at.to_naive_time();

    if let Some(candidate) = tz.from_local_datetime(&today.and_time(time)).earliest() {
        if candidate >= *now {
            return Some(candidate);
        }
    }
    let tomorrow = today.succ_opt()?;
    tz.from_local_datetime(&tomorrow.and_time(time)).earliest()
}

/// Listener invoked with the new dark flag
pub type SchemeListener = Arc<dyn Fn(bool) + Send + Sync>;

#[derive(Debug, Clone, Copy)]
struct SchemeState {
    mode: SchemeMode,
    flags: [bool; 5],
    is_dark: bool,
}

impl SchemeState {
    /// Recompute `is_dark`, returning whether it flipped
    fn resolve(&mut self) -> bool {
        let dark = self.flags[self.mode.index()];
        let flipped = dark != self.is_dark;
        self.is_dark = dark;
        flipped
    }
}

/// Effective color scheme
pub struct ColorScheme {
    state: Mutex<SchemeState>,
    listeners: RwLock<Vec<SchemeListener>>,
}

impl ColorScheme {
    pub fn new(mode: SchemeMode) -> Self {
        let mut state = SchemeState {
            mode,
            flags: [false, true, false, false, false],
            is_dark: false,
        };
        state.resolve();
        Self {
            state: Mutex::new(state),
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn mode(&self) -> SchemeMode {
        self.state.lock().mode
    }

    pub fn is_dark(&self) -> bool {
        self.state.lock().is_dark
    }

    /// Select a mode; returns whether any state changed
    pub fn set_mode(&self, mode: SchemeMode) -> bool {
        self.apply(|state| {
            let changed = state.mode != mode;
            state.mode = mode;
            changed
        })
    }

    /// Record the system preference used by the `system` mode
    pub fn set_system_dark(&self, dark: bool) -> bool {
        self.set_flag(SchemeMode::System, dark)
    }

    /// Recompute the `time` mode flag for the given time of day
    pub fn update_time(&self, now: NaiveTime, window: &NightWindow) -> bool {
        self.set_flag(SchemeMode::Time, window.contains(now))
    }

    fn set_flag(&self, mode: SchemeMode, value: bool) -> bool {
        self.apply(|state| {
            let flag = &mut state.flags[mode.index()];
            let changed = *flag != value;
            *flag = value;
            changed
        })
    }

    fn apply(&self, update: impl FnOnce(&mut SchemeState) -> bool) -> bool {
        let (changed, flipped, is_dark) = {
            let mut state = self.state.lock();
            let changed = update(&mut state);
            let flipped = state.resolve();
            (changed || flipped, flipped, state.is_dark)
        };
        if flipped {
            debug!(is_dark, "color scheme flipped");
            let listeners = self.listeners.read().clone();
            for listener in listeners {
                listener(is_dark);
            }
        }
        changed
    }

    /// Register a listener for dark flag flips
    pub fn on_change<F>(&self, listener: F, run_now: bool)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let listener: SchemeListener = Arc::new(listener);
        self.listeners.write().push(listener.clone());
        if run_now {
            listener(self.is_dark());
        }
    }

    /// Whether a style declaring `prefer_scheme` applies right now
    pub fn should_include_style(&self, prefer_scheme: Option<&str>) -> bool {
        let state = self.state.lock();
        state.mode == SchemeMode::Never
            || !matches!(prefer_scheme, Some("dark" | "light"))
            || (prefer_scheme == Some("dark")) == state.is_dark
    }

    /// Decimal digits of `is_dark` followed by the mode flags
    pub fn session_state(&self) -> u32 {
        let state = self.state.lock();
        state
            .flags
            .iter()
            .fold(u32::from(state.is_dark), |acc, &flag| acc * 10 + u32::from(flag))
    }

    /// Restore the runtime flags saved by [`session_state`](Self::session_state)
    ///
    /// Fixed mode flags keep their values. No listeners are notified.
    pub fn restore_session(&self, mut data: u32) {
        let mut state = self.state.lock();
        for mode in SchemeMode::ALL.into_iter().rev() {
            let flag = data % 10 != 0;
            data /= 10;
            if matches!(mode, SchemeMode::System | SchemeMode::Time) {
                state.flags[mode.index()] = flag;
            }
        }
        state.is_dark = data % 10 != 0;
    }
}

impl fmt::Debug for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = *self.state.lock();
        f.debug_struct("ColorScheme")
            .field("mode", &state.mode)
            .field("is_dark", &state.is_dark)
            .finish_non_exhaustive()
    }
}

/// Source of the current wall clock time
pub type Clock = Arc<dyn Fn() -> DateTime<FixedOffset> + Send + Sync>;

/// Local wall clock
pub fn system_clock() -> Clock {
    Arc::new(|| {
        let now = Local::now();
        now.with_timezone(now.offset())
    })
}

/// Daily alarm the host should arm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alarm {
    pub name: &'static str,
    pub when: DateTime<FixedOffset>,
    pub period: Duration,
}

/// Keeps a [`ColorScheme`] in sync with the scheme preferences
///
/// Must be attached and driven inside a Tokio runtime: night window
/// edits are coalesced through a zero delay timer.
pub struct SchemeSwitcher {
    this: Weak<SchemeSwitcher>,
    scheme: Arc<ColorScheme>,
    prefs: Arc<Prefs>,
    clock: Clock,
    scheduler: Scheduler<()>,
    night_changed: Callback<()>,
    mode_sub: Mutex<Option<SubscriptionId>>,
    night_sub: Mutex<Option<SubscriptionId>>,
    alarms: Mutex<Vec<Alarm>>,
}

impl SchemeSwitcher {
    /// Subscribe to the scheme preferences and apply them immediately
    pub fn attach(scheme: Arc<ColorScheme>, prefs: Arc<Prefs>, clock: Clock) -> Arc<Self> {
        let switcher = Arc::new_cyclic(|this: &Weak<Self>| {
            let weak = this.clone();
            Self {
                this: this.clone(),
                scheme,
                prefs,
                clock,
                scheduler: Scheduler::new(),
                night_changed: Callback::new(move |_| {
                    if let Some(switcher) = weak.upgrade() {
                        switcher.refresh_time();
                    }
                }),
                mode_sub: Mutex::new(None),
                night_sub: Mutex::new(None),
                alarms: Mutex::new(Vec::new()),
            }
        });

        let weak = switcher.this.clone();
        let id = switcher.prefs.subscribe(
            &[PREF_MODE],
            move |_, value| {
                if let Some(switcher) = weak.upgrade() {
                    switcher.apply_mode(value);
                }
            },
            true,
        );
        *switcher.mode_sub.lock() = Some(id);
        switcher
    }

    pub fn scheme(&self) -> &Arc<ColorScheme> {
        &self.scheme
    }

    /// Alarms for the current night window; empty outside `time` mode
    pub fn alarms(&self) -> Vec<Alarm> {
        self.alarms.lock().clone()
    }

    /// Handle a fired alarm; unrelated names are ignored
    pub fn on_alarm(&self, name: &str) {
        if name == PREF_NIGHT_START || name == PREF_NIGHT_END {
            self.refresh_time();
        }
    }

    fn apply_mode(&self, value: &Value) {
        let mode = match value.as_str().map(SchemeMode::from_str) {
            Some(Ok(mode)) => mode,
            _ => {
                warn!(%value, "unknown scheme mode, falling back to never");
                SchemeMode::Never
            }
        };

        if mode == SchemeMode::Time {
            let mut night_sub = self.night_sub.lock();
            if night_sub.is_none() {
                let weak = self.this.clone();
                *night_sub = Some(self.prefs.subscribe(
                    &[PREF_NIGHT_START, PREF_NIGHT_END],
                    move |_, _| {
                        if let Some(switcher) = weak.upgrade() {
                            switcher.schedule_refresh();
                        }
                    },
                    true,
                ));
            }
        } else {
            if let Some(id) = self.night_sub.lock().take() {
                self.prefs.unsubscribe(id);
            }
            self.scheduler.cancel(&self.night_changed);
            self.alarms.lock().clear();
        }

        self.scheme.set_mode(mode);
    }

    fn schedule_refresh(&self) {
        self.scheduler
            .schedule(&self.night_changed, Duration::ZERO, Vec::new());
    }

    /// Recompute the `time` flag and the alarms from the night window prefs
    pub fn refresh_time(&self) {
        let start = self.prefs.get_str(PREF_NIGHT_START).unwrap_or_default();
        let end = self.prefs.get_str(PREF_NIGHT_END).unwrap_or_default();
        let window = match NightWindow::parse(&start, &end) {
            Ok(window) => window,
            Err(e) => {
                warn!(error = %e, "ignoring invalid night window");
                return;
            }
        };

        let now = (self.clock)();
        self.scheme.update_time(now.time(), &window);

        let alarms = [
            (PREF_NIGHT_START, window.start),
            (PREF_NIGHT_END, window.end),
        ]
        .into_iter()
        .filter_map(|(name, at)| {
            next_alarm(&now, at).map(|when| Alarm {
                name,
                when,
                period: ALARM_PERIOD,
            })
        })
        .collect();
        *self.alarms.lock() = alarms;
    }
}

impl Drop for SchemeSwitcher {
    fn drop(&mut self) {
        for id in [self.mode_sub.get_mut().take(), self.night_sub.get_mut().take()]
            .into_iter()
            .flatten()
        {
            self.prefs.unsubscribe(id);
        }
    }
}
