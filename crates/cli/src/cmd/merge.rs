//! Deep-merge two JSON documents

use crate::util;
use anyhow::Result;
use std::path::Path;
use stylus_core::deep_merge;

pub async fn run(source: &Path, destination: Option<&Path>, arrays: bool) -> Result<()> {
    let source = util::read_json(source)?;
    let destination = destination.map(util::read_json).transpose()?;

    let merged = deep_merge(&source, destination, arrays);
    util::print_json(&merged)
}
