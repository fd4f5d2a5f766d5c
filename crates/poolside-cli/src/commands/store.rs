use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::Value;

use crate::StoreCommands;
use poolside::PoolsideConfig;

pub fn execute(config: &PoolsideConfig, command: StoreCommands) -> Result<()> {
    let hub = config.storage.open()?;
    let context = hub.context();

    match command {
        StoreCommands::Get { key } => match context.get_item(&key)? {
            Some(value) => println!("{}", value),
            None => eprintln!("{} {} is not set", "!".yellow(), key),
        },
        StoreCommands::Set { key, value } => {
            // Cells decode stored values as JSON
            serde_json::from_str::<Value>(&value)
                .with_context(|| format!("Value for {} is not valid JSON: {}", key, value))?;
            context.set_item(&key, &value)?;
            eprintln!("{} {} set", "✓".green(), key);
        }
        StoreCommands::Remove { key } => {
            context.remove_item(&key)?;
            eprintln!("{} {} removed", "✓".green(), key);
        }
        StoreCommands::List => {
            let mut keys = context.keys()?;
            keys.sort();
            for key in keys {
                println!("{}", key);
            }
        }
    }

    Ok(())
}
