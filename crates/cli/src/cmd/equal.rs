//! Structural comparison of two JSON documents

use crate::util;
use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::Path;
use stylus_core::deep_equal;

/// Returns whether the documents are equal
pub async fn run(a: &Path, b: &Path, ignore: &[String]) -> Result<bool> {
    let left = util::read_json(a)?;
    let right = util::read_json(b)?;
    let ignored: Vec<&str> = ignore.iter().map(String::as_str).collect();

    let equal = deep_equal(&left, &right, &ignored);
    if equal {
        println!("{}", "equal".green());
    } else {
        println!("{}", "different".red());
    }
    Ok(equal)
}
