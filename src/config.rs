use crate::driver::DriverConfig;
use crate::event::EventHandler;

/// Longest wait for a completion before a transfer is declared lost.
///
/// A 4 KB sector erase takes up to 400 ms on common QSPI NOR parts.
pub const DEFAULT_TIMEOUT_MS: u32 = 2000;

/// Deadline for a whole-chip erase, which takes tens of seconds on 128 Mbit
/// parts and up to a few minutes on larger ones.
pub const DEFAULT_CHIP_ERASE_TIMEOUT_MS: u32 = 200_000;

#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Added to every base-relative address before dispatch.
    pub base_address: u32,
    pub handler: EventHandler,
    /// `None` waits forever.
    pub timeout_ms: Option<u32>,
    /// Applies to `erase_chip` instead of `timeout_ms`. `None` waits forever.
    pub chip_erase_timeout_ms: Option<u32>,
    pub driver: DriverConfig,
}

impl Config {
    pub fn new(base_address: u32, handler: EventHandler) -> Self {
        Self {
            base_address,
            handler,
            timeout_ms: Some(DEFAULT_TIMEOUT_MS),
            chip_erase_timeout_ms: Some(DEFAULT_CHIP_ERASE_TIMEOUT_MS),
            driver: DriverConfig::default(),
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_chip_erase_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.chip_erase_timeout_ms = Some(timeout_ms);
        self
    }

    /// Drops both deadlines.
    pub fn without_timeout(mut self) -> Self {
        self.timeout_ms = None;
        self.chip_erase_timeout_ms = None;
        self
    }

    pub fn with_driver_config(mut self, driver: DriverConfig) -> Self {
        self.driver = driver;
        self
    }
}
