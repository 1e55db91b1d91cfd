//! The inventory process: feature modules on a Dapr sidecar.
//!
//! ```text
//! inventory [http|grpc|sdk]
//! ```
//!
//! The argument selects the client used for state and secrets; anything
//! other than `http` or `grpc` selects the SDK client.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tonic::transport::Server;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use dapr_inventory::config::{ClientKind, ListenConfig, SidecarConfig};
use dapr_inventory::dapr::client::Client;
use dapr_inventory::dapr::dispatch::{self, EventRegistrar};
use dapr_inventory::dapr::server;
use dapr_inventory::dapr::subscription::{subscribe, Subscriber};
use dapr_inventory::database::postgres;
use dapr_inventory::features::gadgets::GadgetRepository;
use dapr_inventory::features::products::ProductRepository;
use dapr_inventory::features::widgets::{self, WidgetRepository};
use dapr_inventory::features::ResourceService;
use dapr_inventory::runtime::{Group, RunError};
use dapr_inventory::sdk::{self, register_all, SdkRegistrar};

const SECRET_STORE: &str = "secrets";
const DATABASE_SECRET: &str = "postgres";

#[derive(Debug, Parser)]
#[command(name = "inventory", version, about = "Inventory service on a Dapr sidecar")]
struct Args {
    /// Sidecar client: `http`, `grpc`, or anything else for the SDK client.
    client: Option<String>,
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
            tracing::error!(error = %message, "inventory stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let sidecar = SidecarConfig::from_env().context("invalid sidecar configuration")?;
    let kind = ClientKind::from_arg(args.client.as_deref());
    let client = Client::connect(kind, &sidecar)
        .await
        .context("could not create connection to Dapr")?;
    let client = Arc::new(client);

    let db = postgres::connect(
        client.as_ref(),
        SECRET_STORE,
        DATABASE_SECRET,
        widgets::STATEMENTS,
    )
    .await
    .context("could not connect to the widgets database")?;
    let products = ProductRepository::connect(&sidecar)
        .await
        .context("could not connect to the products service")?;

    let widgets = ResourceService::new(WidgetRepository::new(db));
    let gadgets = ResourceService::new(GadgetRepository::new(Arc::clone(&client)));
    let products = ResourceService::new(products);

    let subscribers: [&dyn Subscriber; 3] = [&widgets, &gadgets, &products];
    let subscriptions = Arc::new(subscribe(&subscribers));

    let registrars: [&dyn EventRegistrar; 3] = [&widgets, &gadgets, &products];
    let http_table = Arc::new(dispatch::table(&registrars));
    let grpc_table = Arc::new(dispatch::table(&registrars));

    let sdk_registrars: [&dyn SdkRegistrar; 3] = [&widgets, &gadgets, &products];
    let mut sdk_http = sdk::HttpService::new();
    register_all(&mut sdk_http, &sdk_registrars).context("could not register SDK HTTP handlers")?;
    let mut sdk_grpc = sdk::GrpcService::new();
    register_all(&mut sdk_grpc, &sdk_registrars).context("could not register SDK gRPC handlers")?;

    let public = widgets
        .routes()
        .merge(gadgets.routes())
        .merge(products.routes());

    let listen = ListenConfig::default();
    let mut group = Group::new();
    let shutdown = group.shutdown();

    group.add(
        "public API",
        server::http::serve(bind(listen.public, "public API").await?, public, shutdown.clone()),
    );
    group.add(
        "HTTP callbacks",
        server::http::serve(
            bind(listen.events_http, "HTTP callbacks").await?,
            server::http::router(Arc::clone(&subscriptions), http_table),
            shutdown.clone(),
        ),
    );
    group.add(
        "gRPC callbacks",
        server::grpc::serve(
            bind(listen.events_grpc, "gRPC callbacks").await?,
            Server::builder().add_service(server::grpc::server(subscriptions, grpc_table)),
            shutdown.clone(),
        ),
    );
    group.add(
        "SDK HTTP",
        sdk_http.serve(bind(listen.sdk_http, "SDK HTTP").await?, shutdown.clone()),
    );
    group.add(
        "SDK gRPC",
        sdk_grpc.serve(bind(listen.sdk_grpc, "SDK gRPC").await?, shutdown),
    );
    group.add_signal_handler();

    match group.run().await {
        Ok(()) | Err(RunError::Signal(_)) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

async fn bind(addr: SocketAddr, name: &str) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("could not bind {name} to {addr}"))?;
    tracing::info!(%addr, "{name} listening");
    Ok(listener)
}
