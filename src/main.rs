//! Ledmirror binary: mirrors a remote boolean flag onto a GPIO LED.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use log::info;

use ledmirror::app::{EnablePolicy, LedMirror, Settings};
use ledmirror::errors::Error;
use ledmirror::hardware::{DEFAULT_LED_PIN, Gpio};
use ledmirror::store::{DocPath, FileStore};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OnEnable {
    Steady,
    Blink,
}

impl From<OnEnable> for EnablePolicy {
    fn from(value: OnEnable) -> Self {
        match value {
            OnEnable::Steady => EnablePolicy::Steady,
            OnEnable::Blink => EnablePolicy::Blink,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "ledmirror",
    version,
    about = "Mirrors a remote boolean flag onto a GPIO LED"
)]
struct Args {
    /// LED pin (BCM numbering)
    #[arg(long, default_value_t = DEFAULT_LED_PIN)]
    pin: u16,

    /// Root directory of the file-backed document store
    #[arg(long, default_value = "./store")]
    store: PathBuf,

    /// Watched document path (<collection>/<id>)
    #[arg(long, default_value = "LED/status")]
    document: DocPath,

    /// Watched boolean field
    #[arg(long, default_value = "isEnabled")]
    field: String,

    /// Blink half-period in milliseconds
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,

    /// Store poll interval in milliseconds
    #[arg(long, default_value_t = 500)]
    poll_ms: u64,

    /// LED behaviour while the flag is enabled
    #[arg(long, value_enum, default_value = "steady")]
    on_enable: OnEnable,
}

fn default_driver() -> Box<dyn Gpio> {
    #[cfg(all(target_os = "linux", feature = "rpi"))]
    {
        Box::new(ledmirror::hardware::RpiGpio::new())
    }
    #[cfg(not(all(target_os = "linux", feature = "rpi")))]
    {
        log::warn!("No GPIO backend available, using the simulated driver");
        Box::new(ledmirror::hardware::SimGpio::new())
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let store =
        FileStore::new(args.store).with_poll_interval(Duration::from_millis(args.poll_ms));
    let settings = Settings {
        pin: args.pin,
        document: args.document,
        field: args.field,
        blink_interval_ms: args.interval_ms,
        on_enable: args.on_enable.into(),
    };

    let mirror = LedMirror::start(default_driver(), &store, settings)?;

    info!("Press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;
    mirror.shutdown().await;
    Ok(())
}
