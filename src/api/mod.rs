//! API module for the concept extraction service
//!
//! Provides the REST endpoint frontends and external integrations call.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::analyzer::VideoAnalyzer;

pub mod handlers;
pub mod models;
pub mod server;

/// API server for handling REST requests
pub struct ApiServer {
    analyzer: Arc<VideoAnalyzer>,
    host: String,
    port: u16,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(analyzer: Arc<VideoAnalyzer>, host: String, port: u16) -> Self {
        Self {
            analyzer,
            host,
            port,
        }
    }

    /// Start the API server
    pub async fn start(self) -> Result<()> {
        info!("🚀 Starting API server on port {}", self.port);

        server::start_http_server(self.analyzer, &self.host, self.port).await
    }
}
