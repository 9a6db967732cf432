use panel_services::{
    config::Config, database, database::SqliteStore, routes, server, table::RequestContext,
    tables, telemetry,
};
use std::net::{IpAddr, SocketAddr};
use tracing::info;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

const BUILD_DATE: &str = env!("BUILD_DATE");
const BUILD_COMMIT: &str = env!("BUILD_COMMIT");
const BUILD_BRANCH: &str = env!("BUILD_BRANCH");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config: Config = Config::init()?;
    telemetry::init_tracing(&config)?;

    print_build_info();
    info!(
        environment = %config.environment(),
        server_addr = %config.server_addr(),
        port = %config.port(),
        url_prefix = %config.url_prefix(),
        "Configuration loaded"
    );

    // Every descriptor must build before the server accepts requests
    let registry = tables::default_registry()?;
    registry.validate_all(&RequestContext::startup())?;
    info!(tables = ?registry.names(), "Tables registered");

    let pool = database::create_pool(&config).await?;
    let app = routes(SqliteStore::new(pool), registry, config.clone());

    let addr = SocketAddr::from((config.server_addr().parse::<IpAddr>()?, config.port()));
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::serve(
        listener,
        app,
        config.shutdown_timeout(),
        server::shutdown_signal(),
    )
    .await?;

    info!("Server exited");
    Ok(())
}

fn print_build_info() {
    info!("===========================================");
    info!("  Admin Panel Services");
    info!("===========================================");
    info!("Build Date:   {}", BUILD_DATE);
    info!("Build Commit: {}", BUILD_COMMIT);
    info!("Build Branch: {}", BUILD_BRANCH);
    info!("===========================================");
}
