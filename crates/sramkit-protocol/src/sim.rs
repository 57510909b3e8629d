use sramkit_transport::{Result, Transport, TransportError};
use tracing::trace;

use crate::codec::{decode_command, Address, DeviceConfig, HEADER_SIZE, PAGE_SIZE};
use crate::opcode::{Opcode, TransferMode};

/// Power-on status: sequential mode.
const POWER_ON_STATUS: u8 = 0x40;

/// An in-memory 23LCxxx device answering SPI bursts.
///
/// Models what the driver relies on: opcode decoding, the 3-byte address
/// phase, the status register, and byte/page/sequential address counting.
/// Every completed burst (the bytes clocked out between select and
/// deselect) is logged for inspection.
#[derive(Debug)]
pub struct SimulatedSram {
    memory: Vec<u8>,
    status: u8,
    selected: bool,
    phase: Phase,
    header: Vec<u8>,
    current: Vec<u8>,
    bursts: Vec<Vec<u8>>,
    selects: usize,
    transfers: usize,
    fail_at: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Opcode,
    Address,
    Data { op: Opcode, address: Address, moved: usize },
    Status(Opcode),
    Ignore,
}

impl SimulatedSram {
    /// A zero-filled device of `capacity` bytes in sequential mode.
    pub fn new(capacity: u32) -> Self {
        Self {
            memory: vec![0; capacity as usize],
            status: POWER_ON_STATUS,
            selected: false,
            phase: Phase::Opcode,
            header: Vec::with_capacity(HEADER_SIZE),
            current: Vec::new(),
            bursts: Vec::new(),
            selects: 0,
            transfers: 0,
            fail_at: None,
        }
    }

    /// A device sized for `config`.
    pub fn from_config(config: &DeviceConfig) -> Self {
        Self::new(config.capacity)
    }

    /// Start with an explicit status register value.
    pub fn with_status(mut self, status: u8) -> Self {
        self.status = status;
        self
    }

    /// Fail every transfer after the next `transfers` succeed.
    pub fn fail_after(&mut self, transfers: usize) {
        self.fail_at = Some(self.transfers + transfers);
    }

    /// Stop injecting faults.
    pub fn clear_fault(&mut self) {
        self.fail_at = None;
    }

    /// Device contents.
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Current status register value.
    pub fn status(&self) -> u8 {
        self.status
    }

    /// Active transfer mode; the reserved pattern behaves as byte mode.
    pub fn mode(&self) -> TransferMode {
        TransferMode::from_status(self.status).unwrap_or(TransferMode::Byte)
    }

    /// Bytes clocked out in each completed burst, oldest first.
    pub fn bursts(&self) -> &[Vec<u8>] {
        &self.bursts
    }

    /// Drop the burst log.
    pub fn clear_bursts(&mut self) {
        self.bursts.clear();
    }

    /// Number of chip-select assertions so far.
    pub fn selects(&self) -> usize {
        self.selects
    }

    /// Whether chip-select is currently asserted.
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Simulate a power cycle: contents and mode are lost.
    pub fn power_cycle(&mut self) {
        self.memory.fill(0);
        self.status = POWER_ON_STATUS;
        self.selected = false;
        self.phase = Phase::Opcode;
        self.current.clear();
    }

    fn capacity(&self) -> Address {
        self.memory.len() as Address
    }

    fn next_address(&self, address: Address) -> Address {
        match self.mode() {
            TransferMode::Byte => address,
            TransferMode::Page => (address & !(PAGE_SIZE - 1)) | ((address + 1) & (PAGE_SIZE - 1)),
            TransferMode::Sequential => (address + 1) % self.capacity(),
        }
    }

    fn clock(&mut self, word: u8) -> u8 {
        match self.phase {
            Phase::Opcode => {
                self.phase = match Opcode::from_byte(word) {
                    Some(op) if op.is_addressed() => {
                        self.header.clear();
                        self.header.push(word);
                        Phase::Address
                    }
                    Some(op @ (Opcode::ReadStatus | Opcode::WriteStatus)) => Phase::Status(op),
                    _ => Phase::Ignore,
                };
                0
            }
            Phase::Address => {
                self.header.push(word);
                if self.header.len() == HEADER_SIZE {
                    self.phase = match decode_command(&mut self.header.as_slice()) {
                        Ok(Some((op, address))) => Phase::Data {
                            op,
                            address: address % self.capacity(),
                            moved: 0,
                        },
                        _ => Phase::Ignore,
                    };
                }
                0
            }
            Phase::Data { op, address, moved } => {
                if self.mode() == TransferMode::Byte && moved > 0 {
                    return 0;
                }
                let slot = &mut self.memory[address as usize];
                let reply = match op {
                    Opcode::Write => {
                        *slot = word;
                        0
                    }
                    _ => *slot,
                };
                self.phase = Phase::Data {
                    op,
                    address: self.next_address(address),
                    moved: moved + 1,
                };
                reply
            }
            Phase::Status(Opcode::WriteStatus) => {
                self.status = word;
                trace!(status = word, "simulated status written");
                self.phase = Phase::Ignore;
                0
            }
            Phase::Status(_) => self.status,
            Phase::Ignore => 0,
        }
    }
}

impl Transport for SimulatedSram {
    fn transfer(&mut self, word: u8) -> Result<u8> {
        if !self.selected {
            return Err(TransportError::NotSelected);
        }
        if self.fail_at.is_some_and(|at| self.transfers >= at) {
            return Err(TransportError::Bus("injected fault".to_string()));
        }
        self.transfers += 1;
        self.current.push(word);
        Ok(self.clock(word))
    }

    fn select(&mut self) -> Result<()> {
        self.selected = true;
        self.selects += 1;
        self.phase = Phase::Opcode;
        self.current.clear();
        Ok(())
    }

    fn deselect(&mut self) -> Result<()> {
        if self.selected {
            self.bursts.push(std::mem::take(&mut self.current));
        }
        self.selected = false;
        self.phase = Phase::Opcode;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "simulated-sram"
    }
}
