use core::fmt::Debug;

use embedded_hal::delay::DelayNs;
use hardware_traits::HardwareFlashDevice;

use crate::config::Config;
use crate::context::QspiContext;
use crate::driver::{EraseLength, QspiDriver};
use crate::error::Error;
use crate::event::{Operation, OperationState};
use crate::transfer::{page_address, page_of, transfer_address};
use crate::{memory, PAGE_BLOCK_SIZE};

/// Pause between two looks at the shared state while waiting.
pub(crate) const POLL_INTERVAL_US: u32 = 10;

/// Size of the pattern written and read back by [`Coordinator::self_test`].
pub(crate) const SELF_TEST_LEN: usize = 16;

/// Binds `context` to the driver and runs the memory configuration.
///
/// On failure the context is released again so it can back a later attempt.
pub(crate) fn bring_up<'d, D>(
    driver: &mut D,
    context: &'d QspiContext,
    config: &Config,
) -> Result<(), Error<D::Error>>
where
    D: QspiDriver<'d>,
{
    context.install::<D::Error>(config.handler)?;

    if let Err(e) = driver.init(&config.driver, context) {
        error!("QSPI driver init failed");
        context.release();
        return Err(Error::Init(e));
    }
    info!("QSPI initialized, base {=u32:#x}", config.base_address);

    if let Err(e) = memory::configure(driver) {
        error!("QSPI memory configuration failed");
        driver.uninit();
        context.release();
        return Err(e);
    }
    Ok(())
}

/// Blocking front end to an asynchronous QSPI driver.
///
/// Each transfer is dispatched to the driver and the call then sleeps in
/// `delay`-sized steps until the driver's completion reaches the shared
/// [`QspiContext`]. The application handler sees a `*Requested` event before
/// dispatch and the matching `*Done` event from the completion.
pub struct Coordinator<'d, D, DL> {
    driver: D,
    delay: DL,
    context: &'d QspiContext,
    base_address: u32,
    timeout_ms: Option<u32>,
    chip_erase_timeout_ms: Option<u32>,
}

impl<D, DL> Debug for Coordinator<'_, D, DL> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Coordinator")
            .field("base_address", &self.base_address)
            .field("state", &self.context.state())
            .finish()
    }
}

impl<'d, D, DL> Coordinator<'d, D, DL>
where
    D: QspiDriver<'d>,
    DL: DelayNs,
{
    /// Brings up the driver with `context` as its completion client, then
    /// resets the flash device and switches it to quad I/O.
    pub fn init(
        mut driver: D,
        delay: DL,
        context: &'d QspiContext,
        config: Config,
    ) -> Result<Self, Error<D::Error>> {
        bring_up(&mut driver, context, &config)?;
        Ok(Self {
            driver,
            delay,
            context,
            base_address: config.base_address,
            timeout_ms: config.timeout_ms,
            chip_erase_timeout_ms: config.chip_erase_timeout_ms,
        })
    }

    /// Tears down the driver and reports `Event::Uninitialized`.
    pub fn uninit(mut self) -> (D, DL) {
        self.driver.uninit();
        self.context.shutdown();
        info!("QSPI uninitialized");
        (self.driver, self.delay)
    }

    pub fn base_address(&self) -> u32 {
        self.base_address
    }

    pub fn state(&self) -> OperationState {
        self.context.state()
    }

    /// Reads `dst.len()` bytes, at most one page block, from base-relative
    /// `src_address`.
    pub fn read(&mut self, dst: &mut [u8], src_address: u32) -> Result<(), Error<D::Error>> {
        let address = transfer_address::<D::Error>(self.base_address, src_address, dst.len())?;

        let previous = self.context.begin::<D::Error>(Operation::Read)?;
        if let Err(e) = self.driver.read(dst, address) {
            self.context.abort(Operation::Read, previous);
            return Err(Error::Dispatch(e));
        }
        self.wait_for(Operation::Read, self.timeout_ms)?;

        info!("Read {=usize} bytes at {=u32:#x}", dst.len(), address);
        Ok(())
    }

    /// Programs `src`, at most one page block, at base-relative `dst_address`.
    pub fn write(&mut self, src: &[u8], dst_address: u32) -> Result<(), Error<D::Error>> {
        let address = transfer_address::<D::Error>(self.base_address, dst_address, src.len())?;

        let previous = self.context.begin::<D::Error>(Operation::Write)?;
        if let Err(e) = self.driver.write(src, address) {
            self.context.abort(Operation::Write, previous);
            return Err(Error::Dispatch(e));
        }
        self.wait_for(Operation::Write, self.timeout_ms)?;

        info!("Wrote {=usize} bytes at {=u32:#x}", src.len(), address);
        Ok(())
    }

    /// Erases the 4 KB page block `page_number`.
    pub fn erase(&mut self, page_number: u32) -> Result<(), Error<D::Error>> {
        let address = page_address::<D::Error>(self.base_address, page_number)?;
        info!("Erasing page {=u32} at {=u32:#x}", page_number, address);
        self.erase_at(EraseLength::Kb4, address, self.timeout_ms)
    }

    /// Erases the whole device.
    pub fn erase_chip(&mut self) -> Result<(), Error<D::Error>> {
        info!("Erasing chip");
        self.erase_at(EraseLength::All, self.base_address, self.chip_erase_timeout_ms)
    }

    /// Erases `page_number`, writes a short pattern to its start and reads
    /// it back.
    pub fn self_test(&mut self, page_number: u32) -> Result<(), Error<D::Error>> {
        let offset = page_number
            .checked_mul(PAGE_BLOCK_SIZE as u32)
            .ok_or(Error::<D::Error>::InvalidAddress)?;

        let mut tx = [0u8; SELF_TEST_LEN];
        for (i, byte) in tx.iter_mut().enumerate() {
            *byte = i as u8;
        }
        let mut rx = [0u8; SELF_TEST_LEN];

        self.erase(page_number)?;
        self.write(&tx, offset)?;
        self.read(&mut rx, offset)?;

        if rx != tx {
            warn!("Self-test mismatch on page {=u32}", page_number);
            return Err(Error::Verify);
        }
        Ok(())
    }

    fn erase_at(
        &mut self,
        length: EraseLength,
        address: u32,
        timeout_ms: Option<u32>,
    ) -> Result<(), Error<D::Error>> {
        let previous = self.context.begin::<D::Error>(Operation::Erase)?;
        if let Err(e) = self.driver.erase(length, address) {
            self.context.abort(Operation::Erase, previous);
            return Err(Error::Dispatch(e));
        }
        self.wait_for(Operation::Erase, timeout_ms)
    }

    /// Block until the completion of `op` has been signalled
    fn wait_for(
        &mut self,
        op: Operation,
        timeout_ms: Option<u32>,
    ) -> Result<(), Error<D::Error>> {
        let limit_us = timeout_ms.map(|ms| u64::from(ms) * 1000);
        let mut waited_us: u64 = 0;

        while !self.context.take_done(op) {
            if limit_us.is_some_and(|limit| waited_us >= limit) {
                warn!("No completion for {} after {=u64} us", op, waited_us);
                return Err(Error::Timeout);
            }
            self.delay.delay_us(POLL_INTERVAL_US);
            waited_us += u64::from(POLL_INTERVAL_US);
        }
        Ok(())
    }
}

impl<'d, D, DL> HardwareFlashDevice for Coordinator<'d, D, DL>
where
    D: QspiDriver<'d>,
    DL: DelayNs,
{
    type Error = Error<D::Error>;

    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), Self::Error> {
        Coordinator::read(self, buf, addr)
    }

    /// `addr` is base-relative and must sit on a page block boundary.
    fn sector_erase(&mut self, addr: u32) -> Result<(), Self::Error> {
        let page = page_of::<D::Error>(addr)?;
        self.erase(page)
    }

    fn page_program(&mut self, addr: u32, data: &[u8]) -> Result<(), Self::Error> {
        Coordinator::write(self, data, addr)
    }

    fn chip_erase(&mut self) -> Result<(), Self::Error> {
        self.erase_chip()
    }
}
