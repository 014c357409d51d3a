//! Contract of the vendor QSPI peripheral driver.
//!
//! Transfers (`read`, `write`, `erase`) are asynchronous: the driver starts
//! them and returns, and later reports completion by calling
//! [`CompletionClient::transfer_done`] from whatever context it runs in.
//! Custom instructions are synchronous.

/// Receiver of the driver's completion signal.
pub trait CompletionClient: Sync {
    /// Called once per finished `read`, `write` or `erase`.
    fn transfer_done(&self);
}

pub trait QspiDriver<'d> {
    type Error;

    /// Brings up the peripheral. `client` must be signalled on every
    /// transfer completion until `uninit`.
    fn init(
        &mut self,
        config: &DriverConfig,
        client: &'d dyn CompletionClient,
    ) -> Result<(), Self::Error>;

    fn uninit(&mut self);

    /// Starts reading `dst.len()` bytes at `address`.
    fn read(&mut self, dst: &mut [u8], address: u32) -> Result<(), Self::Error>;

    /// Starts programming `src` at `address`.
    fn write(&mut self, src: &[u8], address: u32) -> Result<(), Self::Error>;

    /// Starts erasing `length` worth of memory at `address`.
    fn erase(&mut self, length: EraseLength, address: u32) -> Result<(), Self::Error>;

    /// Sends a raw instruction and blocks until the peripheral has shifted it out.
    fn custom_instruction(
        &mut self,
        instruction: &CustomInstruction,
        payload: Option<&[u8]>,
    ) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EraseLength {
    Kb4,
    Kb64,
    /// Whole chip.
    All,
}

/// Total length of a custom instruction frame, opcode included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InstructionLength {
    B1 = 1,
    B2,
    B3,
    B4,
    B5,
    B6,
    B7,
    B8,
    B9,
}

impl InstructionLength {
    /// Number of data bytes following the opcode.
    pub fn payload_len(self) -> usize {
        self as usize - 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CustomInstruction {
    pub opcode: u8,
    pub length: InstructionLength,
    /// Level driven on IO2 while the instruction is sent.
    pub io2_level: bool,
    /// Level driven on IO3 while the instruction is sent.
    pub io3_level: bool,
    /// Wait for the device's write-in-progress bit to clear first.
    pub wait_in_progress: bool,
    /// Send Write Enable before the instruction.
    pub write_enable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadMode {
    FastRead,
    Read2O,
    Read2Io,
    Read4O,
    Read4Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteMode {
    Pp,
    Pp2O,
    Pp4O,
    Pp4Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressMode {
    Bits24,
    Bits32,
}

/// Peripheral configuration handed to [`QspiDriver::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriverConfig {
    pub read_mode: ReadMode,
    pub write_mode: WriteMode,
    pub address_mode: AddressMode,
    /// SCK = 32 MHz / `frequency_divider`, 1..=16.
    pub frequency_divider: u8,
    /// Minimum CSN high time, in SCK cycles.
    pub sck_delay: u8,
    pub deep_power_down: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            read_mode: ReadMode::Read4Io,
            write_mode: WriteMode::Pp4Io,
            address_mode: AddressMode::Bits24,
            frequency_divider: 2,
            sck_delay: 1,
            deep_power_down: false,
        }
    }
}
