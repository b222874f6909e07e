//! Command handlers

use crate::{CacheAction, Command};
use aide_api::{ApiManager, Method, RequestOptions};
use aide_foundation::{AideConfig, AuthMode, CacheKey, CacheManager, ServicesConfig};
use anyhow::{anyhow, Context};
use serde_json::Value;
use std::time::Duration;

/// `KEY=VALUE` argument
pub fn parse_pair(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

pub async fn run(command: Command, config: &AideConfig) -> anyhow::Result<()> {
    match command {
        Command::Services => list_services(),
        Command::Request {
            service,
            endpoint,
            method,
            data,
            params,
            headers,
            cache_ttl,
        } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .map_err(|_| anyhow!("invalid HTTP method '{}'", method))?;
            let json = data
                .as_deref()
                .map(|body| serde_json::from_str::<Value>(body))
                .transpose()
                .context("--data is not valid JSON")?;

            let mut options = RequestOptions::new().params(params).headers(headers);
            if let Some(json) = json {
                options = options.json(json);
            }

            let api = ApiManager::load()?;
            let result = match cache_ttl {
                Some(secs) => {
                    let cache = CacheManager::open(config.cache.clone())?;
                    let key = CacheKey::for_operation(
                        "request",
                        &(
                            &service,
                            method.as_str(),
                            &endpoint,
                            &options.json,
                            &options.params,
                            &options.headers,
                        ),
                    )?;
                    let result = cache
                        .get_or_try_insert_async(key.as_str(), Duration::from_secs(secs), || {
                            api.request(&service, method.clone(), &endpoint, options)
                        })
                        .await;
                    cache.shutdown();
                    result
                }
                None => api.request(&service, method, &endpoint, options).await,
            };
            api.shutdown();

            let body = result?;
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        Command::Token { service } => {
            let api = ApiManager::load()?;
            let token = api.get_token(&service).await;
            api.shutdown();

            match token? {
                Some(token) => println!("{}: {}", service, mask(&token)),
                None => println!("{}: anonymous (no token)", service),
            }
            Ok(())
        }
        Command::Cache { action } => run_cache(action, config),
    }
}

fn list_services() -> anyhow::Result<()> {
    let services = ServicesConfig::load()?;
    if services.services.is_empty() {
        println!("No services configured. Add them to services.json.");
        return Ok(());
    }

    let mut names: Vec<&String> = services.services.keys().collect();
    names.sort();

    println!(
        "{:<16} {:<40} {:<20} {:<12} {:<8}",
        "Name", "Base URL", "Auth", "Rate", "Enabled"
    );
    println!("{}", "-".repeat(100));

    for name in names {
        let service = &services.services[name];
        let auth = match service.auth_mode() {
            AuthMode::ClientCredentials { .. } => "oauth2",
            AuthMode::ApiKey(_) => "api key",
            AuthMode::Anonymous => "none",
        };
        println!(
            "{:<16} {:<40} {:<20} {:<12} {:<8}",
            name,
            service.base_url,
            auth,
            format!("{}/{}s", service.rate_limit, service.rate_period_secs),
            if service.enabled { "yes" } else { "no" }
        );
    }
    Ok(())
}

fn run_cache(action: CacheAction, config: &AideConfig) -> anyhow::Result<()> {
    let cache = CacheManager::open(config.cache.clone())?;

    match action {
        CacheAction::Get { key } => match cache.get(&key) {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => println!("(miss)"),
        },
        CacheAction::Set { key, value, ttl } => {
            let value: Value = serde_json::from_str(&value).context("value is not valid JSON")?;
            match ttl {
                Some(secs) => cache.set_with_ttl(&key, value, Duration::from_secs(secs)),
                None => cache.set(&key, value),
            }
            println!("stored {}", key);
        }
        CacheAction::Delete { key } => {
            if cache.delete(&key) {
                println!("deleted {}", key);
            } else {
                println!("{} was not cached", key);
            }
        }
        CacheAction::Clear => {
            cache.clear();
            println!("cache cleared");
        }
        CacheAction::Cleanup => {
            let report = cache.cleanup();
            println!(
                "removed {} expired in memory, {} expired on disk, {} unreadable",
                report.memory_expired, report.disk_expired, report.disk_corrupt
            );
        }
        CacheAction::Stats => {
            println!("dir:          {}", cache.dir().display());
            println!("disk entries: {}", cache.disk_len());
            println!("default ttl:  {}s", cache.config().default_ttl_secs);
            println!("threshold:    {}", cache.config().cleanup_threshold);
        }
    }

    cache.shutdown();
    Ok(())
}

/// First and last four characters only
fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
