use std::path::PathBuf;

use clap::Parser;

use gitdir::{
    config::ServerConfig,
    protocol::http::{AppState, router},
};

/// Serve a directory as a read-only Git repository over smart HTTP.
#[derive(Parser, Debug)]
#[command(name = "gitdir", version, about)]
struct Args {
    /// Directory to serve (default: current directory)
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Port to run the server on
    #[arg(short, long, default_value_t = 5000)]
    port: u16,

    /// Host to run the server on
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        directory: args.dir,
    };

    let directory = config
        .directory
        .canonicalize()
        .expect("served directory must exist and be readable");

    let state = AppState::new(directory.clone());
    let app = router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    tracing::info!(
        "Serving directory {} at http://{}",
        directory.display(),
        addr
    );
    axum::serve(listener, app).await.unwrap();
}
