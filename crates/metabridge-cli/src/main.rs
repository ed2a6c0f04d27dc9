//! metabridge: import ontologies from a SPARQL endpoint into the warehouse.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use metabridge_core::ChildRef;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "metabridge")]
#[command(author, version, about = "Ontology importer for the clinical metadata warehouse")]
#[command(propagate_version = true)]
struct Cli {
    /// YAML configuration file (default: $METABRIDGE_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, project and load one source
    Import {
        /// Source id from the configuration
        #[arg(short, long)]
        source: String,

        /// Root as `<uri>=<type>`; repeatable. Defaults to the configured
        /// roots, then to every top element.
        #[arg(short, long, value_parser = parse_root)]
        root: Vec<ChildRef>,
    },

    /// Fetch and project one source into staging files
    Fetch {
        #[arg(short, long)]
        source: String,

        #[arg(short, long, value_parser = parse_root)]
        root: Vec<ChildRef>,
    },

    /// Load the staging files of one source
    Load {
        #[arg(short, long)]
        source: String,
    },

    /// Delete every warehouse row of one source
    Flush {
        #[arg(short, long)]
        source: String,
    },
}

fn parse_root(raw: &str) -> Result<ChildRef, String> {
    match raw.rsplit_once('=') {
        Some((uri, node_type)) if !uri.is_empty() && !node_type.is_empty() => {
            Ok(ChildRef::new(uri, node_type))
        }
        _ => Err(format!("expected <uri>=<type>, got '{}'", raw)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, daily rotation)
    //   LOG_ANSI    - "true"/"false" override ANSI colors
    //   RUST_LOG    - env filter (default: "metabridge=info")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "metabridge=info,metabridge_core=info,metabridge_db=info,metabridge_sparql=info".into()
    });
    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let path = std::path::Path::new(path);
        let file_dir = path.parent().unwrap_or(std::path::Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("metabridge.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Reports go to stdout, so console logs go to stderr.
        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        subsystem = "cli",
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stderr)"),
        "Logging initialized"
    );

    let config = metabridge_core::AppConfig::load(cli.config.as_deref())?;

    let report = match cli.command {
        Commands::Import { source, root } => commands::import(&config, &source, root).await?,
        Commands::Fetch { source, root } => commands::fetch(&config, &source, root).await?,
        Commands::Load { source } => commands::load(&config, &source).await?,
        Commands::Flush { source } => commands::flush(&config, &source).await?,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_root() {
        let root = parse_root("http://data.dzl.de/ont/dwh#Vitals=concept").unwrap();
        assert_eq!(root.uri, "http://data.dzl.de/ont/dwh#Vitals");
        assert_eq!(root.node_type.as_deref(), Some("concept"));

        let with_query = parse_root("http://x.org/a?b=c=modifier").unwrap();
        assert_eq!(with_query.uri, "http://x.org/a?b=c");
        assert!(parse_root("urn:x").is_err());
        assert!(parse_root("urn:x=").is_err());
    }

    #[test]
    fn test_cli_parses_repeated_roots() {
        let cli = Cli::try_parse_from([
            "metabridge",
            "--config",
            "meta.yml",
            "import",
            "--source",
            "dzl",
            "--root",
            "urn:a=concept",
            "--root",
            "urn:b=collection",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("meta.yml")));
        match cli.command {
            Commands::Import { source, root } => {
                assert_eq!(source, "dzl");
                assert_eq!(root.len(), 2);
            }
            _ => panic!("expected import"),
        }
    }
}
