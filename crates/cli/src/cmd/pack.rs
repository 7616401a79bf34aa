//! Packed value encoding

use crate::util;
use anyhow::{Context, Result};
use std::path::Path;

pub async fn run_pack(file: &Path) -> Result<()> {
    let value = util::read_json(file)?;
    let packed = storage::pack_value(&value).context("Failed to pack value")?;
    println!("{}", packed);
    Ok(())
}

pub async fn run_unpack(packed: &str) -> Result<()> {
    let value = storage::unpack_value(packed.trim()).context("Failed to unpack value")?;
    util::print_json(&value)
}
