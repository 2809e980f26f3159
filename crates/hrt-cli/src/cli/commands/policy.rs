//! `hrt policy` – show the effective transfer and retry settings.

use anyhow::Result;
use hrt_core::config::{self, HrtConfig};

pub fn run_policy(cfg: &HrtConfig) -> Result<()> {
    if let Ok(path) = config::config_path() {
        println!("config: {}", path.display());
    }
    let curl = cfg.curl_options();
    println!("connect timeout: {:?}", curl.connect_timeout);
    println!("timeout:         {:?}", curl.timeout);
    println!("follow redirects: {}", curl.follow_redirects);

    let policy = cfg.retry_options()?.resolve();
    let methods: Vec<&str> = policy.allowed_methods.iter().map(|m| m.as_str()).collect();
    println!("max retries:     {}", policy.max_attempts);
    println!("max duration:    {:?}", policy.max_duration);
    println!("retry methods:   {}", methods.join(", "));
    match cfg.retry.as_ref().and_then(|r| r.classifier) {
        Some(kind) => println!("classifier:      {:?}", kind),
        None => println!("classifier:      any-error (default)"),
    }
    match cfg.retry.as_ref().and_then(|r| r.backoff.as_ref()) {
        Some(b) => println!("backoff:         {:?}", b),
        None => println!("backoff:         exponential-jitter 100ms..30s x2 (default)"),
    }
    Ok(())
}
