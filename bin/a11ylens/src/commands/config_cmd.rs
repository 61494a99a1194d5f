use a11ylens_core::{Config, Paths};
use serde_json::Value;

pub async fn show() -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;
    let json = serde_json::to_value(&config)?;

    println!();
    println!("📋 Current Configuration");
    println!("  File: {}", paths.config_file().display());
    println!();
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

/// Get a config value by dot-separated key path.
pub async fn get(key: &str) -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;
    let json = serde_json::to_value(&config)?;

    match resolve_json_path(&json, key) {
        Some(Value::String(s)) => println!("{}", s),
        Some(v) => println!("{}", serde_json::to_string_pretty(&v)?),
        None => anyhow::bail!("Key '{}' not found in config.", key),
    }
    Ok(())
}

/// Set a config value by dot-separated key path. The result must still be a valid config.
pub async fn set(key: &str, value: &str) -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;
    let new_config = apply_setting(&config, key, value)?;
    new_config.save(&paths.config_file())?;
    println!("✓ Set {} = {}", key, value);
    Ok(())
}

pub async fn reset(force: bool) -> anyhow::Result<()> {
    let paths = Paths::new();

    if !force {
        print!("⚠ Reset config to defaults? Current config will be lost. [y/N] ");
        use std::io::Write;
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    Config::default().save(&paths.config_file())?;
    println!("✓ Config reset to defaults: {}", paths.config_file().display());
    Ok(())
}

fn apply_setting(config: &Config, key: &str, value: &str) -> anyhow::Result<Config> {
    let mut json = serde_json::to_value(config)?;
    if resolve_json_path(&json, key).is_none() {
        anyhow::bail!("Unknown config key '{}'", key);
    }
    // JSON first so numbers, booleans and arrays keep their type.
    let parsed: Value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    set_json_path(&mut json, key, parsed);
    serde_json::from_value(json)
        .map_err(|e| anyhow::anyhow!("Invalid value for '{}': {}", key, e))
}

/// Navigate a JSON value by dot-separated path.
fn resolve_json_path(json: &Value, path: &str) -> Option<Value> {
    let mut current = json;
    for part in path.split('.') {
        let camel = to_camel_case(part);
        current = current.get(&camel).or_else(|| current.get(part))?;
    }
    Some(current.clone())
}

fn set_json_path(json: &mut Value, path: &str, value: Value) {
    let parts: Vec<&str> = path.split('.').collect();
    let mut current = json;
    for (i, part) in parts.iter().enumerate() {
        let camel = to_camel_case(part);
        let key = if current.get(&camel).is_some() {
            camel
        } else {
            part.to_string()
        };

        if i == parts.len() - 1 {
            current[&key] = value;
            return;
        }

        if current.get(&key).map_or(true, |v| !v.is_object()) {
            current[&key] = serde_json::json!({});
        }
        current = &mut current[&key];
    }
}

/// snake_case to camelCase.
fn to_camel_case(s: &str) -> String {
    let mut result = String::new();
    let mut capitalize_next = false;
    for ch in s.chars() {
        if ch == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(ch.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(ch);
        }
    }
    result
}
