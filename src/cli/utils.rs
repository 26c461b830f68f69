use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::app::AppState;
use crate::cli::OutputFormat;
use crate::database::PgStore;

/// Connect to `DATABASE_URL` and build the same service graph the server uses
pub async fn connect_state() -> anyhow::Result<AppState> {
    let store = PgStore::connect().await?;
    Ok(AppState::new(Arc::new(store)))
}

/// Print `data` as a success envelope in JSON mode, or run `text` otherwise
pub fn output_data<T, F>(output_format: OutputFormat, data: &T, text: F) -> anyhow::Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce(&T),
{
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "success": true, "data": data }))?
            );
        }
        OutputFormat::Text => text(data),
    }
    Ok(())
}

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "success": true, "message": message }))?
            );
        }
        OutputFormat::Text => println!("✓ {}", message),
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: OutputFormat, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "success": false, "error": message }))?
            );
        }
        OutputFormat::Text => eprintln!("Error: {}", message),
    }
    Ok(())
}
