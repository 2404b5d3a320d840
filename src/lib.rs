//! <h1 align="center">LEDMIRROR - Remote flag to GPIO LED mirror</h1>
//! <div style="text-align:center;font-style:italic;">Ledmirror keeps a physical LED in sync with a single remote boolean flag.</div>
//!
//! # Features
//!
//! **Ledmirror** subscribes to one document in a document store (by default
//! `LED/status`), decodes one boolean field (`isEnabled`) and drives a GPIO
//! LED accordingly: steady ON/OFF, or an optional blink loop while enabled.
//!
//! - Watch a remote flag through a [`DocumentStore`](store::DocumentStore)
//!   ([`FileStore`](store::FileStore) for JSON files on disk,
//!   [`MemoryStore`](store::MemoryStore) in-process)
//! - Drive the LED through a [`Gpio`](hardware::Gpio) driver
//!   ([`RpiGpio`](hardware::RpiGpio) on a Raspberry Pi,
//!   [`SimGpio`](hardware::SimGpio) everywhere else)
//! - Degrade-and-log everywhere: a missing pin, a failed write or a malformed
//!   document never takes the application down
//!
//! # Getting Started
//!
//! ```rust,no_run
//! use ledmirror::app::{LedMirror, Settings};
//! use ledmirror::errors::Error;
//! use ledmirror::hardware::SimGpio;
//! use ledmirror::store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let store = MemoryStore::new();
//!
//!     // Mirror the `isEnabled` field of `LED/status` onto pin 6.
//!     let mirror = LedMirror::start(Box::new(SimGpio::new()), &store, Settings::default())?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     mirror.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Feature flags
//!
//! - **rpi** -- (enabled by default) Activates the rppal-backed Raspberry Pi
//!   GPIO driver (Linux only).
//! - **mocks** -- Provides mocked entities of all kinds (useful for tests mostly).

pub mod app;
pub mod devices;
pub mod errors;
pub mod hardware;
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
pub mod store;
pub mod utils;
