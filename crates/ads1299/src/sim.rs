//! Simulated ADS1299 behind an [`SpiDevice`] for host-side tests.
//!
//! Decodes opcodes the way the device does, keeps a register file, serves
//! queued conversion frames in continuous-read mode, and counts protocol
//! violations: register access while in continuous-read mode, and
//! transactions that are not bracketed by settle delays.

use crate::registers::{Register, REGISTER_COUNT};
use crate::MAX_FRAME_LEN;
use embedded_hal::spi::{ErrorKind, ErrorType, Operation};
use embedded_hal_async::spi::SpiDevice;
use heapless::{Deque, Vec};

const FRAME_QUEUE: usize = 64;
const OPCODE_LOG: usize = 256;

/// Injected bus failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SimError;

impl embedded_hal::spi::Error for SimError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

enum Decode {
    Opcode,
    Count { write: bool, addr: u8 },
    Payload { write: bool, addr: u8, remaining: u16 },
    Frame { frame: [u8; MAX_FRAME_LEN], pos: usize },
    Ignore,
}

pub struct SimAds {
    id: u8,
    regs: [u8; REGISTER_COUNT],
    continuous: bool,
    converting: bool,
    standby: bool,
    frames: Deque<[u8; MAX_FRAME_LEN], FRAME_QUEUE>,
    opcodes: Vec<u8, OPCODE_LOG>,
    violations: u32,
    fail_next: bool,
}

impl SimAds {
    /// Powered-up device reporting `id`, in continuous-read mode as after
    /// power-on.
    pub fn new(id: u8) -> Self {
        let mut sim = Self {
            id,
            regs: [0; REGISTER_COUNT],
            continuous: true,
            converting: false,
            standby: false,
            frames: Deque::new(),
            opcodes: Vec::new(),
            violations: 0,
            fail_next: false,
        };
        sim.power_on_registers();
        sim
    }

    fn power_on_registers(&mut self) {
        for addr in 0..REGISTER_COUNT as u8 {
            if let Ok(reg) = Register::try_from(addr) {
                self.regs[addr as usize] = reg.reset_value();
            }
        }
        self.regs[Register::ID as usize] = self.id;
    }

    /// Queues a frame for the next read. Returns `false` when full.
    pub fn push_frame(&mut self, frame: [u8; MAX_FRAME_LEN]) -> bool {
        self.frames.push_back(frame).is_ok()
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn register(&self, reg: Register) -> u8 {
        self.regs[reg as usize]
    }

    pub fn set_register(&mut self, reg: Register, value: u8) {
        self.regs[reg as usize] = value;
    }

    pub fn is_continuous(&self) -> bool {
        self.continuous
    }

    pub fn is_converting(&self) -> bool {
        self.converting
    }

    pub fn is_standby(&self) -> bool {
        self.standby
    }

    /// First byte of every opcode received, in order.
    pub fn opcodes(&self) -> &[u8] {
        &self.opcodes
    }

    pub fn clear_opcodes(&mut self) {
        self.opcodes.clear();
    }

    pub fn violations(&self) -> u32 {
        self.violations
    }

    /// Makes the next transaction fail without touching the device.
    pub fn fail_next_transaction(&mut self) {
        self.fail_next = true;
    }

    fn write_byte(&mut self, state: &mut Decode, byte: u8) {
        match state {
            Decode::Opcode => *state = self.opcode(byte),
            Decode::Count { write, addr } => {
                *state = Decode::Payload {
                    write: *write,
                    addr: *addr,
                    remaining: byte as u16 + 1,
                };
            }
            Decode::Payload { write: true, addr, remaining } => {
                if let Ok(reg) = Register::try_from(*addr) {
                    if !reg.is_read_only() {
                        self.regs[*addr as usize] = byte;
                    }
                }
                *addr = addr.wrapping_add(1);
                *remaining -= 1;
                if *remaining == 0 {
                    *state = Decode::Ignore;
                }
            }
            _ => {}
        }
    }

    fn read_byte(&mut self, state: &mut Decode) -> u8 {
        match state {
            Decode::Opcode => {
                let mut frame = [0u8; MAX_FRAME_LEN];
                frame[0] = 0xC0;
                let frame = self.frames.pop_front().unwrap_or(frame);
                *state = Decode::Frame { frame, pos: 1 };
                frame[0]
            }
            Decode::Frame { frame, pos } => {
                let byte = frame.get(*pos).copied().unwrap_or(0);
                *pos += 1;
                byte
            }
            Decode::Payload { write: false, addr, remaining } => {
                let byte = self.regs.get(*addr as usize).copied().unwrap_or(0);
                *addr = addr.wrapping_add(1);
                *remaining -= 1;
                if *remaining == 0 {
                    *state = Decode::Ignore;
                }
                byte
            }
            _ => 0,
        }
    }

    fn opcode(&mut self, op: u8) -> Decode {
        let _ = self.opcodes.push(op);
        match op {
            0x02 => self.standby = false,
            0x04 => self.standby = true,
            0x06 => {
                self.power_on_registers();
                self.continuous = true;
                self.converting = false;
            }
            0x08 => self.converting = true,
            0x0A => self.converting = false,
            0x10 => self.continuous = true,
            0x11 => self.continuous = false,
            0x20..=0x5F => {
                if self.continuous {
                    // The device ignores register opcodes in this mode.
                    self.violations += 1;
                    return Decode::Ignore;
                }
                return Decode::Count { write: op & 0x40 != 0, addr: op & 0x1F };
            }
            _ => {}
        }
        Decode::Ignore
    }
}

impl ErrorType for SimAds {
    type Error = SimError;
}

impl SpiDevice for SimAds {
    async fn transaction(
        &mut self,
        operations: &mut [Operation<'_, u8>],
    ) -> Result<(), SimError> {
        if core::mem::take(&mut self.fail_next) {
            return Err(SimError);
        }
        let bracketed = matches!(operations.first(), Some(Operation::DelayNs(_)))
            && matches!(operations.last(), Some(Operation::DelayNs(_)));
        if !bracketed {
            self.violations += 1;
        }

        let mut state = Decode::Opcode;
        for op in operations.iter_mut() {
            match op {
                Operation::DelayNs(_) => {}
                Operation::Write(bytes) => {
                    for &b in bytes.iter() {
                        self.write_byte(&mut state, b);
                    }
                }
                Operation::Read(buf) | Operation::TransferInPlace(buf) => {
                    for b in buf.iter_mut() {
                        *b = self.read_byte(&mut state);
                    }
                }
                Operation::Transfer(read, write) => {
                    for &b in write.iter() {
                        self.write_byte(&mut state, b);
                    }
                    for b in read.iter_mut() {
                        *b = self.read_byte(&mut state);
                    }
                }
            }
        }
        Ok(())
    }
}
