use clap::Parser;
use std::net::SocketAddr;

/// Backend server fronted by the hashring load balancer.
#[derive(Debug, Parser)]
#[command(name = "backend")]
struct BackendArgs {
    /// Identifier reported on /home.
    #[arg(long, env = "SERVER_ID")]
    id: String,

    #[arg(long, default_value = "0.0.0.0:5000")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = BackendArgs::parse();

    tracing::info!("Server {} listening on {}", args.id, args.bind);

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    axum::serve(listener, hashring_lb::backend::app(&args.id)).await?;

    Ok(())
}
