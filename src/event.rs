/// Notification delivered to the application's [`EventHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    ReadRequested,
    ReadDone,
    WriteRequested,
    WriteDone,
    EraseRequested,
    EraseDone,
    /// The driver was torn down.
    Uninitialized,
}

/// Application callback. Called from the caller's context for `*Requested`
/// and `Uninitialized`, and from the driver's completion context (usually an
/// interrupt) for `*Done`, so it must be short and must not block.
pub type EventHandler = fn(Event);

/// The three kinds of transfer that go through the completion path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Operation {
    Read,
    Write,
    Erase,
}

impl Operation {
    pub fn requested(self) -> OperationState {
        match self {
            Operation::Read => OperationState::ReadRequested,
            Operation::Write => OperationState::WriteRequested,
            Operation::Erase => OperationState::EraseRequested,
        }
    }

    pub fn done(self) -> OperationState {
        match self {
            Operation::Read => OperationState::ReadDone,
            Operation::Write => OperationState::WriteDone,
            Operation::Erase => OperationState::EraseDone,
        }
    }

    pub(crate) fn request_event(self) -> Event {
        match self {
            Operation::Read => Event::ReadRequested,
            Operation::Write => Event::WriteRequested,
            Operation::Erase => Event::EraseRequested,
        }
    }

    pub(crate) fn done_event(self) -> Event {
        match self {
            Operation::Read => Event::ReadDone,
            Operation::Write => Event::WriteDone,
            Operation::Erase => Event::EraseDone,
        }
    }
}

/// Pending-operation tag shared by the caller and the completion callback.
///
/// Legal transitions are `Idle | *Done -> XRequested` (on a call) and
/// `XRequested -> XDone` (on the driver's completion only). `Uninitialized`
/// is entered on teardown and left only by a new init.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperationState {
    Idle,
    ReadRequested,
    ReadDone,
    WriteRequested,
    WriteDone,
    EraseRequested,
    EraseDone,
    Uninitialized,
}

impl OperationState {
    /// The operation waiting for completion, if any.
    pub fn pending(self) -> Option<Operation> {
        match self {
            OperationState::ReadRequested => Some(Operation::Read),
            OperationState::WriteRequested => Some(Operation::Write),
            OperationState::EraseRequested => Some(Operation::Erase),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_done_pairs() {
        for op in [Operation::Read, Operation::Write, Operation::Erase] {
            assert_eq!(op.requested().pending(), Some(op));
            assert_eq!(op.done().pending(), None);
        }
        assert_eq!(OperationState::Idle.pending(), None);
        assert_eq!(OperationState::Uninitialized.pending(), None);
    }
}
