//! Config inspection command.

use anyhow::{bail, Result};
use quire_core::Config;

/// Keys answered when no key is given
const KEYS: [&str; 6] = [
    "sites_dir",
    "blocks.max_items",
    "pagination.page_size",
    "html.include_drafts",
    "publish.branch",
    "publish.remote_url",
];

/// Print one dotted config value, or every known value
pub fn show_config(config: &Config, key: Option<&str>, json: bool) -> Result<()> {
    let entries: Vec<(&str, Option<String>)> = match key {
        Some(key) => match config.get(key) {
            Some(value) => vec![(key, Some(value))],
            None if KEYS.contains(&key) => vec![(key, None)],
            None => bail!("Unknown config key: {}", key),
        },
        None => KEYS.iter().map(|k| (*k, config.get(k))).collect(),
    };

    if json {
        let map: serde_json::Map<String, serde_json::Value> = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.map_or(serde_json::Value::Null, Into::into)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    match (key, entries.as_slice()) {
        (Some(_), [(_, value)]) => println!("{}", value.as_deref().unwrap_or("")),
        _ => {
            for (k, v) in &entries {
                println!("{} = {}", k, v.as_deref().unwrap_or("(unset)"));
            }
        }
    }
    Ok(())
}
