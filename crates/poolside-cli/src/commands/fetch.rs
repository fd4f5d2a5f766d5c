use anyhow::{bail, Result};
use colored::Colorize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use poolside::fetch::{RequestController, RequestError};
use poolside::PoolsideConfig;

pub async fn execute(
    config: &PoolsideConfig,
    url: &str,
    retries: Option<u32>,
    delay_ms: Option<u64>,
    retry_all: bool,
) -> Result<()> {
    let transport = Arc::new(config.request.transport()?);
    let controller = RequestController::<Value>::new(
        transport,
        config.request.target(url),
        config.request.to_options(),
    );

    let mut policy = config.retry.to_policy();
    if let Some(retries) = retries {
        policy.max_attempts = retries;
    }
    if let Some(delay_ms) = delay_ms {
        policy.delay = Duration::from_millis(delay_ms);
    }

    eprintln!(
        "{} {} {}",
        "→".cyan(),
        controller.target().method.as_str().bold(),
        url
    );

    let result = policy
        .retry_if(
            || controller.execute(None, None),
            |error: &RequestError| retry_all || error.is_transient(),
        )
        .await;

    let state = controller.state();
    match result {
        Ok(data) => {
            if let Some(status) = state.status_code {
                eprintln!("{} {}", "✓".green(), status);
            }
            println!("{}", serde_json::to_string_pretty(&data)?);
            Ok(())
        }
        Err(error) => {
            tracing::error!(%error, url, "fetch failed");
            eprintln!("{} {}", "✗".red().bold(), error);
            if let Some(body) = state.error.and_then(|info| info.body) {
                eprintln!("{}", serde_json::to_string_pretty(&body)?);
            }
            bail!("request to {} failed", url)
        }
    }
}
