//! Browser detection

use anyhow::Result;
use extension::UserAgent;
use owo_colors::OwoColorize;

pub async fn run(brands: &str, platform: Option<&str>, mobile: bool) -> Result<()> {
    let ua = UserAgent::parse(brands, platform.unwrap_or(brands), mobile.then_some(true));

    println!("{}", serde_json::to_string_pretty(&ua)?);
    if ua.chrome_popup_border_bug() {
        println!("{}", "Popup border bug: affected".yellow());
    }
    Ok(())
}
