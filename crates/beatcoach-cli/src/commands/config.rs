//! Print the default engine configuration.

use std::path::Path;

use anyhow::{Context, Result};
use beatcoach_core::EngineConfig;
use beatcoach_core::export::to_json;

pub fn run(output: Option<&Path>) -> Result<()> {
    let content = to_json(&EngineConfig::default())?;
    match output {
        Some(path) => {
            std::fs::write(path, &content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote default config to: {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}
