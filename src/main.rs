use clap::Parser;
use nexstar_alpaca::capabilities;
use nexstar_alpaca::driver::{CelestronDriver, TelescopeDriver};
use nexstar_alpaca::nexstar::serial::SerialTransport;
use nexstar_alpaca::nexstar::simulator::SimulatorTransport;
use nexstar_alpaca::nexstar::Transport;
use nexstar_alpaca::operations::TelescopeResource;
use nexstar_alpaca::server;
use nexstar_alpaca::telescope::{StaticMetadata, Telescope};

/// ASCOM Alpaca bridge for a Celestron NexStar hand controller.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Serial device the hand controller is attached to.
    #[arg(short, long, default_value = "/dev/ttyUSB0")]
    device: String,

    /// Serial baud rate.
    #[arg(short, long, default_value_t = 9600)]
    baud: u32,

    /// TCP port the Alpaca HTTP server listens on.
    #[arg(short, long, default_value_t = 11111)]
    port: u16,

    /// Use the built-in kinematic simulator instead of a real serial port.
    #[arg(short = 'c', long)]
    conform: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn nexstar_capabilities() -> capabilities::Capabilities {
    use capabilities::Capabilities;
    Capabilities::CAN_FIND_HOME
        | Capabilities::CAN_PARK
        | Capabilities::CAN_SET_PARK
        | Capabilities::CAN_UNPARK
        | Capabilities::CAN_SET_TRACKING
        | Capabilities::CAN_SLEW
        | Capabilities::CAN_SLEW_ASYNC
        | Capabilities::CAN_SLEW_ALTAZ
        | Capabilities::CAN_SLEW_ALTAZ_ASYNC
        | Capabilities::CAN_SYNC
        | Capabilities::CAN_SYNC_ALTAZ
        | Capabilities::CAN_MOVE_AXIS_0
        | Capabilities::CAN_MOVE_AXIS_1
}

fn build_driver(args: &Args) -> eyre::Result<CelestronDriver> {
    let transport: Box<dyn Transport> = if args.conform {
        tracing::info!("using simulator transport (--conform)");
        Box::new(SimulatorTransport::new())
    } else {
        tracing::info!(device = %args.device, baud = args.baud, "opening serial transport");
        Box::new(SerialTransport::open(&args.device, args.baud)?)
    };
    Ok(CelestronDriver::new(transport))
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting nexstar-alpaca");

    let driver = build_driver(&args)?;
    let model_name = driver.model_name().unwrap_or("Unknown Celestron mount");
    let firmware = driver.firmware_version().unwrap_or((0, 0));
    let metadata = StaticMetadata::for_celestron(model_name, firmware);
    let telescope = Telescope::new(nexstar_capabilities(), metadata, Box::new(driver));
    let resource = TelescopeResource::new(vec![telescope]);

    let router = server::build_router(resource);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port)).await?;
    tracing::info!(port = args.port, "Alpaca server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("received ctrl-c, shutting down");
}
