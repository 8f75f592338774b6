use anyhow::Result;
use clap::{Arg, Command};
use std::sync::Arc;
use tracing::{info, warn};

use dynamocards_rust::analyzer::VideoAnalyzer;
use dynamocards_rust::api::ApiServer;
use dynamocards_rust::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("DynamoCards")
        .version("0.1.0")
        .about("Extract key concepts from YouTube video transcripts with an LLM")
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Port for the API server"),
        )
        .arg(
            Arg::new("url")
                .short('u')
                .long("url")
                .value_name("URL")
                .help("Analyze a single video, print the result as JSON and exit"),
        )
        .arg(
            Arg::new("sample-count")
                .short('s')
                .long("sample-count")
                .value_name("NUM")
                .help("Target batch count (0 = automatic)"),
        )
        .arg(
            Arg::new("summary")
                .long("summary")
                .help("Also generate a document summary")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    // Initialize logging
    let filter = if matches.get_flag("verbose") {
        "dynamocards_rust=debug,info"
    } else {
        "dynamocards_rust=info,warn"
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Load configuration
    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });

    // CLI overrides
    if let Some(port) = matches.get_one::<String>("port") {
        config.server.port = port.parse()?;
    }
    if let Some(sample_count) = matches.get_one::<String>("sample-count") {
        config.extraction.sample_count = sample_count.parse()?;
    }
    if matches.get_flag("summary") {
        config.extraction.enable_summary = true;
    }

    config.validate()?;

    info!("🚀 DynamoCards starting...");
    info!("📋 {}", config.summary());

    let analyzer = Arc::new(VideoAnalyzer::new(config)?);

    if analyzer.llm_available().await {
        info!("🧠 LLM endpoint is reachable");
    } else {
        warn!("⚠️ LLM endpoint is not reachable; analysis requests will fail");
    }

    match matches.get_one::<String>("url") {
        Some(url) => {
            // One-shot mode: analyze and print
            let result = analyzer.analyze(url).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        None => {
            let host = analyzer.config().server.host.clone();
            let port = analyzer.config().server.port;
            ApiServer::new(analyzer, host, port).start().await?;
        }
    }

    Ok(())
}
