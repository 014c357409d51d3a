use core::cell::RefCell;
use core::task::Waker;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::AtomicWaker;

use crate::driver::CompletionClient;
use crate::error::Error;
use crate::event::{Event, EventHandler, Operation, OperationState};

/// State shared between the issuing caller and the driver's completion
/// context.
///
/// The caller moves the state to `XRequested` before dispatching a transfer;
/// the driver's completion moves it to `XDone`. At most one operation is in
/// flight: a new request is refused while any `XRequested` state is pending.
///
/// `new` is `const`, so a context can live in a `static` when the driver
/// needs a `'static` completion client.
pub struct QspiContext {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Inner>>,
    waker: AtomicWaker,
}

struct Inner {
    state: OperationState,
    /// Set by the completion, cleared by the waiter that consumes it.
    finished: bool,
    handler: Option<EventHandler>,
}

impl QspiContext {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                state: OperationState::Idle,
                finished: false,
                handler: None,
            })),
            waker: AtomicWaker::new(),
        }
    }

    pub fn state(&self) -> OperationState {
        self.with_inner(|inner| inner.state)
    }

    /// Binds `handler` and resets the state machine to `Idle`.
    pub(crate) fn install<E>(&self, handler: EventHandler) -> Result<(), Error<E>> {
        self.with_inner(|inner| {
            if inner.handler.is_some() {
                return Err(Error::AlreadyInitialized);
            }
            inner.handler = Some(handler);
            inner.state = OperationState::Idle;
            inner.finished = false;
            Ok(())
        })
    }

    /// Undoes `install` after a failed bring-up. No event is emitted.
    pub(crate) fn release(&self) {
        self.with_inner(|inner| {
            inner.handler = None;
            inner.state = OperationState::Idle;
            inner.finished = false;
        });
    }

    /// Drops the handler after telling it about the teardown.
    pub(crate) fn shutdown(&self) {
        let handler = self.with_inner(|inner| {
            inner.state = OperationState::Uninitialized;
            inner.finished = false;
            inner.handler.take()
        });
        if let Some(handler) = handler {
            handler(Event::Uninitialized);
        }
    }

    /// Emits the request event and marks `op` as in flight. Returns the state
    /// it replaced, for [`QspiContext::abort`].
    ///
    /// Must be called before the driver dispatch so that a completion that
    /// fires during dispatch finds the request already pending.
    pub(crate) fn begin<E>(&self, op: Operation) -> Result<OperationState, Error<E>> {
        let handler = self.with_inner(|inner| match (inner.handler, inner.state.pending()) {
            (None, _) => Err(Error::NotInitialized),
            (Some(_), Some(_)) => Err(Error::Busy),
            (Some(handler), None) => Ok(handler),
        })?;

        handler(op.request_event());

        Ok(self.with_inner(|inner| {
            inner.finished = false;
            core::mem::replace(&mut inner.state, op.requested())
        }))
    }

    /// Puts back `previous` after the driver refused to start `op`.
    ///
    /// The driver never started the transfer, so no completion will follow.
    pub(crate) fn abort(&self, op: Operation, previous: OperationState) {
        self.with_inner(|inner| {
            if inner.state == op.requested() {
                inner.state = previous;
            }
        });
    }

    /// Consumes the completion of `op` if it has arrived.
    pub(crate) fn take_done(&self, op: Operation) -> bool {
        self.with_inner(|inner| {
            if inner.finished && inner.state == op.done() {
                inner.finished = false;
                true
            } else {
                false
            }
        })
    }

    pub(crate) fn register_waker(&self, waker: &Waker) {
        self.waker.register(waker);
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        self.inner.lock(|inner| f(&mut inner.borrow_mut()))
    }
}

impl Default for QspiContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionClient for QspiContext {
    /// Advances the pending `XRequested` to `XDone`.
    ///
    /// The done event reaches the handler before the state flips, so the
    /// unblocked caller can never issue its next request ahead of it. With
    /// nothing pending this is a no-op.
    fn transfer_done(&self) {
        let pending = self.with_inner(|inner| inner.handler.zip(inner.state.pending()));
        let Some((handler, op)) = pending else {
            warn!("completion with nothing pending ignored");
            return;
        };

        handler(op.done_event());

        self.with_inner(|inner| {
            inner.state = op.done();
            inner.finished = true;
        });
        self.waker.wake();
    }
}
