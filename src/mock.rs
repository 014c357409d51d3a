//! Test doubles for the driver and delay seams.

use std::collections::HashMap;
use std::vec::Vec;

use crate::driver::{CompletionClient, CustomInstruction, DriverConfig, EraseLength, QspiDriver};
use crate::PAGE_BLOCK_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Init(DriverConfig),
    Uninit,
    Read { address: u32, len: usize },
    Write { address: u32, len: usize },
    Erase { length: EraseLength, address: u32 },
    Instruction {
        instruction: CustomInstruction,
        payload: Vec<u8>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Signal the client from inside the dispatch call.
    Immediate,
    /// Leave signalling to the test.
    Never,
}

/// Records every call and keeps a sparse image of the flash contents.
pub struct MockDriver<'d> {
    pub calls: Vec<Call>,
    pub completion: Completion,
    pub fail_init: bool,
    pub fail_dispatch: bool,
    /// Fail the custom instruction carrying this opcode.
    pub fail_instruction: Option<u8>,
    /// Flip the first byte of every read.
    pub corrupt_reads: bool,
    client: Option<&'d dyn CompletionClient>,
    memory: HashMap<u32, u8>,
}

impl<'d> MockDriver<'d> {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            completion: Completion::Immediate,
            fail_init: false,
            fail_dispatch: false,
            fail_instruction: None,
            corrupt_reads: false,
            client: None,
            memory: HashMap::new(),
        }
    }

    pub fn with_completion(mut self, completion: Completion) -> Self {
        self.completion = completion;
        self
    }

    /// Calls that went through the asynchronous transfer path.
    pub fn transfers(&self) -> Vec<Call> {
        self.calls
            .iter()
            .filter(|call| {
                matches!(
                    call,
                    Call::Read { .. } | Call::Write { .. } | Call::Erase { .. }
                )
            })
            .cloned()
            .collect()
    }

    fn dispatch(&mut self, call: Call) -> Result<(), MockError> {
        self.calls.push(call);
        if self.fail_dispatch {
            return Err(MockError);
        }
        if self.completion == Completion::Immediate {
            if let Some(client) = self.client {
                client.transfer_done();
            }
        }
        Ok(())
    }
}

impl<'d> QspiDriver<'d> for MockDriver<'d> {
    type Error = MockError;

    fn init(
        &mut self,
        config: &DriverConfig,
        client: &'d dyn CompletionClient,
    ) -> Result<(), MockError> {
        self.calls.push(Call::Init(*config));
        if self.fail_init {
            return Err(MockError);
        }
        self.client = Some(client);
        Ok(())
    }

    fn uninit(&mut self) {
        self.calls.push(Call::Uninit);
        self.client = None;
    }

    fn read(&mut self, dst: &mut [u8], address: u32) -> Result<(), MockError> {
        for (i, byte) in dst.iter_mut().enumerate() {
            *byte = *self.memory.get(&(address + i as u32)).unwrap_or(&0xFF);
        }
        if self.corrupt_reads {
            dst[0] ^= 0xFF;
        }
        self.dispatch(Call::Read {
            address,
            len: dst.len(),
        })
    }

    fn write(&mut self, src: &[u8], address: u32) -> Result<(), MockError> {
        for (i, byte) in src.iter().enumerate() {
            // NOR programming only clears bits.
            let cell = self.memory.entry(address + i as u32).or_insert(0xFF);
            *cell &= *byte;
        }
        self.dispatch(Call::Write {
            address,
            len: src.len(),
        })
    }

    fn erase(&mut self, length: EraseLength, address: u32) -> Result<(), MockError> {
        match length {
            EraseLength::All => self.memory.clear(),
            EraseLength::Kb4 | EraseLength::Kb64 => {
                let size = match length {
                    EraseLength::Kb4 => PAGE_BLOCK_SIZE as u32,
                    _ => 16 * PAGE_BLOCK_SIZE as u32,
                };
                self.memory
                    .retain(|cell, _| *cell < address || *cell >= address + size);
            }
        }
        self.dispatch(Call::Erase { length, address })
    }

    fn custom_instruction(
        &mut self,
        instruction: &CustomInstruction,
        payload: Option<&[u8]>,
    ) -> Result<(), MockError> {
        self.calls.push(Call::Instruction {
            instruction: *instruction,
            payload: payload.map(<[u8]>::to_vec).unwrap_or_default(),
        });
        if self.fail_instruction == Some(instruction.opcode) {
            return Err(MockError);
        }
        Ok(())
    }
}

/// Blocking delay that returns at once and counts how often it was asked
/// to wait.
#[derive(Debug, Default)]
pub struct MockDelay {
    pub calls: usize,
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, _ns: u32) {
        self.calls += 1;
    }
}

impl embedded_hal_async::delay::DelayNs for MockDelay {
    async fn delay_ns(&mut self, _ns: u32) {
        self.calls += 1;
    }
}

/// Blocking delay that plays the interrupt: signals `client` on its
/// `after`-th call.
pub struct CompletingDelay<'a> {
    pub client: &'a dyn CompletionClient,
    pub after: usize,
    pub calls: usize,
}

impl embedded_hal::delay::DelayNs for CompletingDelay<'_> {
    fn delay_ns(&mut self, _ns: u32) {
        self.calls += 1;
        if self.calls == self.after {
            self.client.transfer_done();
        }
    }
}

/// Async delay that never elapses.
pub struct NeverDelay;

impl embedded_hal_async::delay::DelayNs for NeverDelay {
    async fn delay_ns(&mut self, _ns: u32) {
        core::future::pending::<()>().await
    }
}

/// Blocking delay backed by the OS clock.
pub struct StdDelay;

impl embedded_hal::delay::DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(ns as u64));
    }
}
