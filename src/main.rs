//! CLI entry point for sanity-blog

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sanity-blog")]
#[command(version)]
#[command(about = "Render blog posts fetched from a Sanity content store", long_about = None)]
struct Cli {
    /// Path to the site configuration
    #[arg(short, long, global = true, default_value = "_config.yml")]
    config: PathBuf,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,
    },

    /// Render the page for a path and print the HTML
    #[command(alias = "r")]
    Render {
        /// Request path, e.g. /hello-world
        path: String,
    },

    /// Print the raw post document for a slug
    Query {
        /// Post slug
        slug: String,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "sanity_blog=debug,info"
    } else {
        "sanity_blog=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Serve { port, ip } => {
            let blog = sanity_blog::Blog::load(&cli.config)?;
            tracing::info!(
                "Serving posts from {}/{} at http://{}:{}",
                blog.config.sanity.project_id,
                blog.config.sanity.dataset,
                ip,
                port
            );
            blog.serve(&ip, port).await?;
        }

        Commands::Render { path } => {
            let blog = sanity_blog::Blog::load(&cli.config)?;
            tracing::debug!("Rendering {}", path);
            println!("{}", blog.render(&path).await?);
        }

        Commands::Query { slug } => {
            let blog = sanity_blog::Blog::load(&cli.config)?;
            match blog.query(&slug).await? {
                Some(doc) => println!("{}", serde_json::to_string_pretty(&doc)?),
                None => println!("null"),
            }
        }

        Commands::Version => {
            println!("sanity-blog version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
