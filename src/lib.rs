//! Blocking and async front ends for an interrupt-driven QSPI flash driver.
//!
//! The vendor driver starts a transfer and later reports its completion from
//! interrupt context. [`Coordinator`] turns that into a call that returns
//! once the transfer is done; [`AsyncCoordinator`] into a future. Both share
//! their pending-operation state with the driver through a [`QspiContext`]
//! and report every transfer to the application as a `*Requested` event
//! followed by its `*Done` event.
//!
//! ```ignore
//! static CONTEXT: QspiContext = QspiContext::new();
//!
//! fn on_flash_event(event: Event) {
//!     defmt::info!("flash: {}", event);
//! }
//!
//! let mut flash = Coordinator::init(qspi, delay, &CONTEXT, Config::new(0x0, on_flash_event))?;
//! flash.erase(0)?;
//! flash.write(&data, 0)?;
//! flash.read(&mut buf, 0)?;
//! ```
#![cfg_attr(not(test), no_std)]

// Must come first so the other modules see the logging macros.
mod fmt;

mod async_coordinator;
mod config;
mod context;
mod coordinator;
pub mod driver;
mod error;
mod event;
mod memory;
mod transfer;

#[cfg(test)]
mod mock;

pub use async_coordinator::AsyncCoordinator;
pub use config::{Config, DEFAULT_CHIP_ERASE_TIMEOUT_MS, DEFAULT_TIMEOUT_MS};
pub use context::QspiContext;
pub use coordinator::Coordinator;
pub use driver::{CompletionClient, QspiDriver};
pub use error::Error;
pub use event::{Event, EventHandler, Operation, OperationState};

/// Largest single transfer, and the erase granularity.
pub const PAGE_BLOCK_SIZE: usize = 4096;
