//! The products service.
//!
//! Listens on `PRODUCTS_ADDR` (default `0.0.0.0:50151`).

use std::net::SocketAddr;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tonic::transport::Server;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use dapr_inventory::dapr::server;
use dapr_inventory::products::InMemoryProducts;
use dapr_inventory::runtime::{Group, RunError};

#[derive(Debug, Parser)]
#[command(name = "products", version, about = "In-memory products gRPC service")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "PRODUCTS_ADDR", default_value = "0.0.0.0:50151")]
    addr: SocketAddr,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("could not install logger: {err}");
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let message = format!("{err:#}");
            tracing::error!(error = %message, "products stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let listener = TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("could not bind {}", args.addr))?;
    tracing::info!(addr = %args.addr, "server listening");

    let mut group = Group::new();
    let shutdown = group.shutdown();
    let router = Server::builder().add_service(InMemoryProducts::new().into_server());
    group.add("products", server::grpc::serve(listener, router, shutdown));
    group.add_signal_handler();

    match group.run().await {
        Ok(()) | Err(RunError::Signal(_)) => Ok(()),
        Err(err) => Err(err.into()),
    }
}
