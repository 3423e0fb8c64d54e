use std::path::Path;

use tracing_subscriber::EnvFilter;

use resume_parser::core::service::CoreService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: parse_resume <path-to-resume.pdf|docx|png|txt>");
        std::process::exit(1);
    }

    let path = &args[1];
    if !Path::new(path).exists() {
        eprintln!("File not found: {path}");
        std::process::exit(2);
    }

    let file_name = Path::new(path)
        .file_name()
        .and_then(|v| v.to_str())
        .unwrap_or("resume.pdf")
        .to_string();

    let bytes = tokio::fs::read(path).await?;

    let core = CoreService::new().await?;
    let parsed = core.parse_single(&file_name, &bytes).await?;

    println!("{}", serde_json::to_string_pretty(&parsed)?);
    Ok(())
}
