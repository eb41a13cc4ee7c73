mod cli;

use introskip::{
    config, probe,
    proxy::{ManifestCache, SkipProxy},
    server,
};
use introskip_core::{ManifestResult, SourceProber};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;

fn build_proxy(config: &config::Config) -> Result<Arc<SkipProxy>> {
    let cache = Arc::new(ManifestCache::from_config(&config.proxy));
    Ok(Arc::new(SkipProxy::from_config(config, cache)?))
}

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // CLI overrides win over the config file
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting introskip server");
    tracing::info!(
        "Manifests declare {}s and reserve a {} byte header",
        config.proxy.declared_duration_secs,
        config.proxy.header_budget_bytes
    );

    let proxy = build_proxy(&config)?;
    server::start_server(config, proxy).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "introskip=trace,introskip_av=trace,introskip_hls=debug,tower_http=debug".to_string()
        } else {
            "introskip=debug,introskip_av=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Resolve { url, start, end } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(resolve(&url, start, end, cli.config.as_deref()))
        }
        Commands::Probe { url } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(probe_url(&url, cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("introskip {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn resolve(url: &str, start: f64, end: f64, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let proxy = build_proxy(&config)?;

    match proxy.resolve(url, start, end).await {
        ManifestResult::Manifest { body, .. } => print!("{}", body),
        ManifestResult::Fallback { redirect_to } => println!("redirect: {}", redirect_to),
    }

    Ok(())
}

async fn probe_url(url: &str, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let prober = probe::HttpSourceProber::new(config.proxy.probe_timeout())?;

    let descriptor = prober.probe(url).await;
    println!("{}", serde_json::to_string_pretty(&descriptor)?);

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    println!("Checking external tools...\n");

    let tool = introskip_av::check_ffprobe(&config.tools);
    let status = if tool.available { "✓" } else { "✗" };
    print!("{} {}", status, tool.name);

    if let Some(ref version) = tool.version {
        print!(" ({})", version);
    }

    if let Some(ref path) = tool.path {
        print!(" - {}", path.display());
    }

    println!("\n");
    if tool.available {
        println!("All required tools are available!");
    } else {
        println!("ffprobe is missing. Every request will be redirected to its source.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!(
                "  Declared duration: {}s",
                config.proxy.declared_duration_secs
            );
            println!("  Header budget: {} bytes", config.proxy.header_budget_bytes);
            println!(
                "  Cache: {} entries, ttl {}s",
                config.proxy.cache_max_entries, config.proxy.cache_ttl_secs
            );
            match config.tools.ffprobe_path {
                Some(ref p) => println!("  ffprobe: {}", p.display()),
                None => println!("  ffprobe: from PATH"),
            }
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
        }
    }

    Ok(())
}
