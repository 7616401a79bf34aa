//! Browser extension glue for Stylus
//!
//! Platform detection, userstyle service URLs, the dark mode schedule,
//! manager page options, lazy tooltips and the config file. Anything
//! debounced goes through the `scheduler` crate.

pub mod color_scheme;
pub mod config;
pub mod error;
pub mod new_ui;
pub mod tooltip;
pub mod ua;
pub mod urls;

pub use color_scheme::{
    next_alarm, system_clock, Alarm, Clock, ClockTime, ColorScheme, NightWindow, SchemeMode,
    SchemeSwitcher,
};
pub use config::Config;
pub use error::{ConfigError, SchemeError, UrlError};
pub use new_ui::{NewUi, RenderState, UiAction, UiUpdate};
pub use tooltip::{entry_title, LazyTitles, PointerEvent, StyleMeta};
pub use ua::UserAgent;
pub use urls::{DownloadRequest, PreparedRequest, Service, StyleSource};
