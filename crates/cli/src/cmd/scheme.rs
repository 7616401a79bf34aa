//! Show the effective color scheme

use crate::util;
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Local, TimeZone};
use extension::{Clock, ClockTime, ColorScheme, SchemeMode, SchemeSwitcher};
use owo_colors::OwoColorize;
use std::path::Path;
use std::sync::Arc;
use storage::Prefs;

pub async fn run(
    config_path: Option<&Path>,
    mode: Option<&str>,
    at: Option<&str>,
    system_dark: bool,
) -> Result<()> {
    let mut config = util::load_config(config_path)?;
    if let Some(mode) = mode {
        config.scheme.mode = mode.parse().context("Invalid --mode")?;
    }
    let now = evaluation_time(at)?;

    let prefs = Arc::new(Prefs::new(config.default_prefs()));
    let scheme = Arc::new(ColorScheme::new(config.scheme.mode));
    scheme.set_system_dark(system_dark);

    let clock: Clock = Arc::new(move || now);
    let switcher = SchemeSwitcher::attach(scheme.clone(), prefs, clock);
    if config.scheme.mode == SchemeMode::Time {
        switcher.refresh_time();
    }

    println!("{}", "Color Scheme".bold());
    println!("Mode:          {}", scheme.mode().cyan());
    if scheme.mode() == SchemeMode::Time {
        println!(
            "Night:         {} - {}",
            config.scheme.night_start, config.scheme.night_end
        );
    }
    println!("Evaluated at:  {}", now.format("%Y-%m-%d %H:%M"));
    print!("Dark:          ");
    if scheme.is_dark() {
        println!("{}", "yes".green());
    } else {
        println!("{}", "no".yellow());
    }

    let alarms = switcher.alarms();
    if !alarms.is_empty() {
        println!();
        println!("{}", "Alarms".bold());
        for alarm in alarms {
            println!(
                "  {:<28} {} {}",
                alarm.name.cyan(),
                alarm.when.format("%Y-%m-%d %H:%M"),
                format!("(every {}h)", alarm.period.as_secs() / 3600).dimmed()
            );
        }
    }

    Ok(())
}

/// Now, or today at `at` in the local offset
fn evaluation_time(at: Option<&str>) -> Result<DateTime<FixedOffset>> {
    let now = Local::now();
    let now = now.with_timezone(now.offset());
    let Some(at) = at else {
        return Ok(now);
    };

    let time = ClockTime::parse(at).context("Invalid --at")?;
    now.timezone()
        .from_local_datetime(&now.date_naive().and_time(time.to_naive_time()))
        .single()
        .context("Local time does not exist")
}
