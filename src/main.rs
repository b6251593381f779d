use brasskey::{Registry, config, init_tracing, net::http};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info,brasskey=debug");

    let cfg = Arc::new(config::Config::from_env()?);
    let registry = Arc::new(Registry::load(cfg.clone())?);
    tracing::info!(
        rooms = registry.rooms.len(),
        default_room = %registry.rooms.default_room(),
        dir = %cfg.rooms_dir.display(),
        "rooms loaded"
    );

    let addr: SocketAddr = cfg.http_addr().parse()?;
    if let Err(e) = http::serve(addr, registry).await {
        tracing::error!(error = %e, "dev persistence server failed");
        return Err(e.into());
    }

    Ok(())
}
