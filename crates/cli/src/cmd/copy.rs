//! Print a deep copy of a JSON document

use crate::util;
use anyhow::Result;
use std::path::Path;
use stylus_core::deep_copy;

pub async fn run(file: &Path) -> Result<()> {
    let value = util::read_json(file)?;
    util::print_json(&deep_copy(&value))
}
