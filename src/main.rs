use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use resume_parser::core::service::CoreService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let event_json = match std::env::args().nth(1) {
        Some(path) if path != "-" => tokio::fs::read_to_string(&path).await?,
        _ => {
            let mut buffer = String::new();
            tokio::io::stdin().read_to_string(&mut buffer).await?;
            buffer
        }
    };

    let core = CoreService::new().await?;
    match core.handle_event_json(&event_json).await {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(err) => {
            tracing::error!("event failed: {err:#}");
            std::process::exit(1);
        }
    }
}
