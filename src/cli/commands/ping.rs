use serde_json::Value;
use std::time::Duration;

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;

pub async fn handle(base_url: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let url = format!("{}/health", base_url.trim_end_matches('/'));
    let client = reqwest::Client::builder().timeout(Duration::from_secs(5)).build()?;

    let response = match client.get(&url).send().await {
        Ok(response) => response,
        Err(e) => {
            output_error(output_format, &format!("{} unreachable: {}", url, e))?;
            anyhow::bail!("health check failed");
        }
    };

    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    let database = body["data"]["database"].as_str().unwrap_or("unknown").to_string();

    if status.is_success() {
        output_success(output_format, &format!("{} is healthy (database: {})", base_url, database))
    } else {
        output_error(output_format, &format!("{} returned {} (database: {})", base_url, status, database))?;
        anyhow::bail!("health check failed")
    }
}
