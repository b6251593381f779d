pub mod config;
pub mod driver;
pub mod error;
pub mod hardening;
pub mod import;
pub mod input;
pub mod models;
pub mod net;
pub mod scripting;
pub mod services;
pub mod state;
pub mod util;

// Convenient re-exports (so call sites can do `brasskey::Registry`, etc.)
pub use driver::GameDriver;
pub use services::InteractionResolver;
pub use state::{
    machine::{GameEvent, GameMachine, MachineState},
    registry::{Registry, RoomRegistry},
};

/// Install error reporting and the tracing subscriber used by the binaries.
/// `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::{EnvFilter, prelude::*};

    if let Err(e) = color_eyre::install() {
        eprintln!("color-eyre already installed: {e}");
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_timer(tracing_subscriber::fmt::time::uptime()),
        )
        .with(tracing_error::ErrorLayer::default())
        .init();
}
