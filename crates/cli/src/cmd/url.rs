//! Userstyle service URL commands

use anyhow::{Context, Result};
use extension::urls::{make_install_url, make_update_url};
use extension::{DownloadRequest, StyleSource};
use owo_colors::OwoColorize;

pub async fn run_install(url: &str) -> Result<()> {
    let install = make_install_url(StyleSource::Url(url))
        .with_context(|| format!("Not a known userstyle service URL: {}", url))?;
    println!("{}", install);
    Ok(())
}

pub async fn run_update(url: &str) -> Result<()> {
    let update = make_update_url(StyleSource::Url(url))
        .with_context(|| format!("No update URL for: {}", url))?;
    println!("{}", update);
    Ok(())
}

pub async fn run_prepare(url: &str) -> Result<()> {
    let request = DownloadRequest::new(url)
        .prepare()
        .context("Failed to prepare request")?;

    println!("{} {}", request.method.as_str().bold(), request.url);
    for (name, value) in &request.headers {
        println!("{}: {}", name.cyan(), value);
    }
    if let Some(body) = &request.body {
        println!();
        println!("{}", body);
    }
    if !request.vars.is_empty() {
        println!(
            "{}",
            format!("({} long query values collapsed)", request.vars.len()).dimmed()
        );
    }
    Ok(())
}
