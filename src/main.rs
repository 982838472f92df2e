mod api;
mod auth;
mod config;
mod error;
mod provider;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};

use crate::provider::cloudflare::CloudflareClient;

#[derive(Parser, Debug)]
#[command(name = "ddns-edge")]
#[command(about = "Authenticated Cloudflare DNS update proxy and who-am-i IP echo service")]
struct Args {
    /// Path to the configuration file (built-in defaults when omitted)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    service: Service,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Service {
    /// Forward authenticated DNS record updates to Cloudflare
    DnsProxy,
    /// Echo the caller's public IP address
    Whoiam,
}

impl Service {
    fn default_port(self) -> u16 {
        match self {
            Service::DnsProxy => 12322,
            Service::Whoiam => 12321,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration first (before logger init)
    let config = match &args.config {
        Some(path) => config::Config::load(path)?,
        None => config::Config::default(),
    }
    .with_env_overrides();

    // Initialize logger with config log level (env var takes precedence)
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.server.log_level)
    ).init();

    info!(
        "Loading configuration from: {}",
        args.config.as_deref().unwrap_or("built-in defaults")
    );
    if config.client_keys.is_empty() {
        warn!("No client keys configured; every authenticated request will be rejected");
    } else {
        info!("Loaded {} client key(s)", config.client_keys.len());
    }

    // Create router
    let app = match args.service {
        Service::DnsProxy => {
            let upstream = CloudflareClient::new(&config.upstream)?;
            info!("Upstream API: {}", config.upstream.api_base);
            api::dns_proxy::create_router(config.client_keys.clone(), upstream)
        }
        Service::Whoiam => {
            info!("Trusted IP headers: {:?}", config.whoiam.ip_headers);
            api::whoiam::create_router(config.client_keys.clone(), config.whoiam.ip_headers.clone())
        }
    };

    // Start server
    let addr = config.server.bind_addr(args.service.default_port());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Server listening on http://{}", addr);
    match args.service {
        Service::DnsProxy => info!("DNS update endpoint: POST /update-dns?client_id=..&client_key=.."),
        Service::Whoiam => info!("Who-am-i endpoint: GET /?id=..&key=.."),
    }

    axum::serve(listener, app).await?;

    Ok(())
}
