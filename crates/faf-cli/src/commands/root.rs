use anyhow::{Context, Result};
use faf_core::top_dir;

pub fn handle() -> Result<()> {
    let root = top_dir().context("locating repository root")?;
    println!("{}", root.display());
    Ok(())
}
