use std::net::SocketAddr;
use std::sync::Arc;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use atelier_core::{AppConfig, Error};

mod cli;
mod context;
mod routes;

use cli::{Args, Command};
use context::ServerContext;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("atelier=info,tower_http=info"));
    // A second init (e.g. from tests) is harmless.
    let _ = fmt().with_env_filter(filter).try_init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();

    let config = AppConfig::from_env_with(|key| args.override_for(key))?;
    let ctx = ServerContext::new(config).await?;

    let result = match args.command.clone() {
        Command::Serve { .. } => run_server(Arc::new(ctx)).await,
        Command::Coupon(cmd) => cli::run_coupon_command(&ctx, args.acting_as, cmd).await,
    };

    if let Err(e) = result {
        error!("atelier error: {}", e);
        return Err(Box::new(e) as Box<dyn std::error::Error>);
    }
    Ok(())
}

async fn run_server(ctx: Arc<ServerContext>) -> Result<(), Error> {
    let addr: SocketAddr = ctx
        .config
        .bind_addr
        .parse()
        .map_err(|e| Error::Config(format!("invalid bind address '{}': {e}", ctx.config.bind_addr)))?;

    let app = routes::router(ctx);

    let handle = axum_server::Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("Ctrl-C received; shutting down.");
        shutdown.graceful_shutdown(Some(std::time::Duration::from_secs(5)));
    });

    info!("Coupon API listening on http://{}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;
    info!("Server stopped. Goodbye!");
    Ok(())
}
