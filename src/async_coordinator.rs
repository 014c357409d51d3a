use core::fmt::Debug;
use core::future::poll_fn;
use core::task::Poll;

use embassy_futures::select::{select, Either};
use embedded_hal_async::delay::DelayNs;
use hardware_traits::AsyncHardwareFlashDevice;

use crate::config::Config;
use crate::context::QspiContext;
use crate::coordinator::{bring_up, SELF_TEST_LEN};
use crate::driver::{EraseLength, QspiDriver};
use crate::error::Error;
use crate::event::{Operation, OperationState};
use crate::transfer::{page_address, page_of, transfer_address};
use crate::PAGE_BLOCK_SIZE;

/// Async front end to an asynchronous QSPI driver.
///
/// Same operations and event sequence as [`Coordinator`](crate::Coordinator),
/// but a transfer parks the task until the driver's completion wakes it
/// instead of polling.
///
/// Dropping a transfer future after dispatch does not stop the hardware. The
/// operation stays pending and further requests fail with
/// [`Error::Busy`] until the driver reports completion.
pub struct AsyncCoordinator<'d, D, DL> {
    driver: D,
    delay: DL,
    context: &'d QspiContext,
    base_address: u32,
    timeout_ms: Option<u32>,
    chip_erase_timeout_ms: Option<u32>,
}

impl<D, DL> Debug for AsyncCoordinator<'_, D, DL> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AsyncCoordinator")
            .field("base_address", &self.base_address)
            .field("state", &self.context.state())
            .finish()
    }
}

impl<'d, D, DL> AsyncCoordinator<'d, D, DL>
where
    D: QspiDriver<'d>,
    DL: DelayNs,
{
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

    pub async fn read(&mut self, dst: &mut [u8], src_address: u32) -> Result<(), Error<D::Error>> {
        let address = transfer_address::<D::Error>(self.base_address, src_address, dst.len())?;

        let previous = self.context.begin::<D::Error>(Operation::Read)?;
        if let Err(e) = self.driver.read(dst, address) {
            self.context.abort(Operation::Read, previous);
            return Err(Error::Dispatch(e));
        }
        self.wait_for(Operation::Read, self.timeout_ms).await?;

        info!("Read {=usize} bytes at {=u32:#x}", dst.len(), address);
        Ok(())
    }

    pub async fn write(&mut self, src: &[u8], dst_address: u32) -> Result<(), Error<D::Error>> {
        let address = transfer_address::<D::Error>(self.base_address, dst_address, src.len())?;

        let previous = self.context.begin::<D::Error>(Operation::Write)?;
        if let Err(e) = self.driver.write(src, address) {
            self.context.abort(Operation::Write, previous);
            return Err(Error::Dispatch(e));
        }
        self.wait_for(Operation::Write, self.timeout_ms).await?;

        info!("Wrote {=usize} bytes at {=u32:#x}", src.len(), address);
        Ok(())
    }

    pub async fn erase(&mut self, page_number: u32) -> Result<(), Error<D::Error>> {
        let address = page_address::<D::Error>(self.base_address, page_number)?;
        info!("Erasing page {=u32} at {=u32:#x}", page_number, address);
        self.erase_at(EraseLength::Kb4, address, self.timeout_ms).await
    }

    pub async fn erase_chip(&mut self) -> Result<(), Error<D::Error>> {
        info!("Erasing chip");
        self.erase_at(EraseLength::All, self.base_address, self.chip_erase_timeout_ms).await
    }

    pub async fn self_test(&mut self, page_number: u32) -> Result<(), Error<D::Error>> {
        let offset = page_number
            .checked_mul(PAGE_BLOCK_SIZE as u32)
            .ok_or(Error::<D::Error>::InvalidAddress)?;

        let mut tx = [0u8; SELF_TEST_LEN];
        for (i, byte) in tx.iter_mut().enumerate() {
            *byte = i as u8;
        }
        let mut rx = [0u8; SELF_TEST_LEN];

        self.erase(page_number).await?;
        self.write(&tx, offset).await?;
        self.read(&mut rx, offset).await?;

        if rx != tx {
            warn!("Self-test mismatch on page {=u32}", page_number);
            return Err(Error::Verify);
        }
        Ok(())
    }

    async fn erase_at(
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
        self.wait_for(Operation::Erase, timeout_ms).await
    }

    async fn wait_for(
        &mut self,
        op: Operation,
        timeout_ms: Option<u32>,
    ) -> Result<(), Error<D::Error>> {
        let context = self.context;
        // Register before checking, so a completion landing in between still wakes us.
        let done = poll_fn(|cx| {
            context.register_waker(cx.waker());
            if context.take_done(op) {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        });

        let Some(timeout_ms) = timeout_ms else {
            done.await;
            return Ok(());
        };
        match select(done, self.delay.delay_ms(timeout_ms)).await {
            Either::First(()) => Ok(()),
            Either::Second(()) => {
                warn!("No completion for {} after {=u32} ms", op, timeout_ms);
                Err(Error::Timeout)
            }
        }
    }
}

impl<'d, D, DL> AsyncHardwareFlashDevice for AsyncCoordinator<'d, D, DL>
where
    D: QspiDriver<'d>,
    DL: DelayNs,
{
    type Error = Error<D::Error>;

    async fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), Self::Error> {
        AsyncCoordinator::read(self, buf, addr).await
    }

    async fn sector_erase(&mut self, addr: u32) -> Result<(), Self::Error> {
        let page = page_of::<D::Error>(addr)?;
        self.erase(page).await
    }

    async fn page_program(&mut self, addr: u32, data: &[u8]) -> Result<(), Self::Error> {
        AsyncCoordinator::write(self, data, addr).await
    }

    async fn chip_erase(&mut self) -> Result<(), Self::Error> {
        self.erase_chip().await
    }
}
