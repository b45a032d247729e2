use colored::Colorize;
use nsdeploy_config::{DEFAULT_CACHE_FILE, Environment};
use nsdeploy_core::DeployCache;
use std::path::PathBuf;

/// `--cache-file`, else the config file's `cache_file`, else the default
fn cache_path(flag: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path);
    }
    Ok(super::load_config(None)?
        .map(|config| config.cache_file)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_FILE)))
}

fn parse_environment(environment: Option<&str>) -> anyhow::Result<Option<Environment>> {
    Ok(environment.map(str::parse::<Environment>).transpose()?)
}

pub async fn handle_show(environment: Option<&str>, cache_file: Option<PathBuf>) -> anyhow::Result<()> {
    let filter = parse_environment(environment)?;
    let path = cache_path(cache_file)?;
    let cache = DeployCache::open(&path).await?;

    let updated = std::fs::metadata(&path)
        .and_then(|meta| meta.modified())
        .map(|time| {
            chrono::DateTime::<chrono::Local>::from(time)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|_| "never".to_string());
    println!(
        "{} {} (updated: {})",
        "Deploy cache:".bold(),
        path.display(),
        updated
    );

    let environments: Vec<&str> = cache
        .environments()
        .into_iter()
        .filter(|env| filter.is_none_or(|wanted| wanted.as_str() == *env))
        .collect();

    if environments.is_empty() {
        println!("{}", "Cache is empty".dimmed());
        return Ok(());
    }

    for env in environments {
        println!();
        println!("{}", env.cyan().bold());
        for (key, value) in cache.entries(env) {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            println!("  {} = {}", key, value);
        }
    }
    Ok(())
}

pub async fn handle_clear(environment: Option<&str>, cache_file: Option<PathBuf>) -> anyhow::Result<()> {
    let filter = parse_environment(environment)?;
    let path = cache_path(cache_file)?;
    let mut cache = DeployCache::open(&path).await?;

    match filter {
        Some(env) => {
            if !cache.clear_environment(env.as_str()) {
                println!("Nothing cached for {}", env);
                return Ok(());
            }
            cache.flush().await?;
            println!("{} {}", "Cleared cache for".green(), env);
        }
        None => {
            cache.clear();
            cache.flush().await?;
            println!("{} {}", "Cleared".green(), path.display());
        }
    }
    Ok(())
}
