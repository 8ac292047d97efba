//! Toolgate HTTP server - main entry point.
//!
//! Loads configuration (JSON file, then CLI/env overrides), wires the backend
//! collaborators into the built-in tool table, and serves until Ctrl-C.

use clap::Parser;
use std::path::PathBuf;

use toolgate::backends::Backends;
use toolgate::tools::builtin::builtin_tools;
use toolgate::tools::ToolRegistry;
use toolgate::{Config, GatewayServer};

#[derive(Debug, Parser)]
#[command(name = "toolgate", version, about = "Guarded tool gateway")]
struct Args {
    /// JSON configuration file; defaults apply when omitted.
    #[arg(long, env = "TOOLGATE_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "TOOLGATE_LISTEN_ADDR")]
    listen_addr: Option<String>,

    /// Accepted API keys, comma separated.
    #[arg(long, env = "TOOLGATE_API_KEYS", value_delimiter = ',')]
    api_keys: Vec<String>,

    /// Allowed Origin values, comma separated. Requests without an Origin header always pass.
    #[arg(long, env = "TOOLGATE_ALLOWED_ORIGINS", value_delimiter = ',')]
    allowed_origins: Vec<String>,

    /// Accept requests not marked `x-forwarded-proto: https` (local development).
    #[arg(long, env = "TOOLGATE_INSECURE_TRANSPORT")]
    insecure_transport: bool,

    #[arg(long, env = "TOOLGATE_DOCUMENT_STORE_URL")]
    document_store_url: Option<String>,

    #[arg(long, env = "TOOLGATE_FILE_STORE_URL")]
    file_store_url: Option<String>,

    #[arg(long, env = "TOOLGATE_CODE_HOST_URL")]
    code_host_url: Option<String>,

    #[arg(long, env = "TOOLGATE_WEB_SEARCH_URL")]
    web_search_url: Option<String>,
}

impl Args {
    fn into_config(self) -> toolgate::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };

        if let Some(addr) = self.listen_addr {
            config.server.listen_addr = addr;
        }
        if !self.api_keys.is_empty() {
            config.guard.api_keys = self.api_keys;
        }
        if !self.allowed_origins.is_empty() {
            config.guard.allowed_origins = self.allowed_origins;
        }
        if self.insecure_transport {
            config.guard.require_secure_transport = false;
        }

        let backends = &mut config.backends;
        for (slot, url) in [
            (&mut backends.document_store, self.document_store_url),
            (&mut backends.file_store, self.file_store_url),
            (&mut backends.code_host, self.code_host_url),
            (&mut backends.web_search, self.web_search_url),
        ] {
            if url.is_some() {
                *slot = url;
            }
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Args::parse().into_config()?;

    toolgate::observability::init_tracing(&config.observability);

    if !config.guard.require_secure_transport {
        tracing::warn!("secure transport check disabled; do not run like this in production");
    }

    let backends = Backends::from_config(&config.backends)?;
    let registry = ToolRegistry::from_definitions(builtin_tools(&backends))?;
    let server = GatewayServer::new(&config, registry)?;

    let cancel = server.cancel_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("shutdown signal received");
                cancel.cancel();
            }
            Err(e) => tracing::error!("failed to listen for ctrl-c: {}", e),
        }
    });

    server.serve().await?;
    Ok(())
}
