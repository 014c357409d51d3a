/// The error type used by this library.
///
/// `E` is the error type of the underlying [`QspiDriver`](crate::driver::QspiDriver).
///
/// Variants split into two tiers. Validation and sequencing errors are
/// returned before the driver or the shared state are touched, and the
/// caller may simply correct the request. Driver failures and timeouts are
/// *fatal*: they mean the flash device or its driver is in an unknown state,
/// and callers must not keep issuing transfers unless they own an explicit
/// recovery policy (typically `uninit` followed by a fresh `init`). See
/// [`Error::is_fatal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Transfer longer than a page block, or the absolute address does not
    /// fit in 32 bits.
    InvalidAddress,
    /// Zero-length read or write.
    EmptyTransfer,
    /// Sector erase address is not on a page block boundary.
    Unaligned,
    /// Another operation is still waiting for its completion.
    Busy,
    /// The context has no registered event handler.
    NotInitialized,
    /// The context is already bound to a coordinator.
    AlreadyInitialized,
    /// Self-test read back different data than it wrote.
    Verify,
    /// The driver refused to initialize.
    Init(E),
    /// A memory configuration instruction failed.
    Configure(E),
    /// The driver refused to start a transfer.
    ///
    /// The pending state is rolled back, so nothing stays in flight and the
    /// handler sees a `*Requested` event with no matching `*Done`. A further
    /// request is accepted, but whether the driver can serve it is up to the
    /// caller's recovery policy.
    Dispatch(E),
    /// The completion callback did not arrive before the deadline.
    Timeout,
}

impl<E> Error<E> {
    /// Whether this error leaves the device in an unknown state.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Init(_) | Error::Configure(_) | Error::Dispatch(_) | Error::Timeout
        )
    }
}
