use core::fmt::Debug;

use byteorder::{BigEndian, ByteOrder};
use embedded_hal::blocking::spi;
use embedded_hal::digital::v2::OutputPin;

use crate::adapters::*;

const FILL_CHUNK: usize = 32;
const STATUS_WIP: u8 = 0b0000_0001;

pub enum Command {
    WriteStatusRegister = 0x01,
    Write = 0x02,
    Read = 0x03,
    ReadStatusRegister = 0x05,
    WriteEnable = 0x06,
}

pub enum Error<SPI: spi::Transfer<u8> + spi::Write<u8>, CS: OutputPin> {
    ChipSelectError(CS::Error),
    TransferError(<SPI as spi::Transfer<u8>>::Error),
    WriteError(<SPI as spi::Write<u8>>::Error),
}

impl<SPI: spi::Transfer<u8> + spi::Write<u8>, CS: OutputPin> Debug for Error<SPI, CS> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ChipSelectError(_) => write!(f, "ChipSelect Error"),
            Self::TransferError(_) => write!(f, "SPI Transfer Error"),
            Self::WriteError(_) => write!(f, "SPI Write Error"),
        }
    }
}

/// 25-series SPI EEPROM or FRAM chip.
///
/// `ADDR_BYTES` is the width of the address sent after each memory opcode.
/// Writes never cross a `page_size` boundary; a `page_size` of zero means the
/// chip has no pages (FRAM).
#[derive(Debug)]
pub struct SpiChip<SPI: spi::Transfer<u8> + spi::Write<u8>, CS: OutputPin, const ADDR_BYTES: usize>
{
    spi: SPI,
    cs: CS,
    capacity: Address,
    page_size: Address,
}

impl<SPI: spi::Transfer<u8> + spi::Write<u8>, CS: OutputPin, const ADDR_BYTES: usize>
    SpiChip<SPI, CS, ADDR_BYTES>
{
    pub fn new(spi: SPI, cs: CS, capacity: Address, page_size: Address) -> Self {
        Self {
            spi,
            cs,
            capacity,
            page_size,
        }
    }

    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }

    pub fn read_status_register(&mut self) -> Result<u8, Error<SPI, CS>> {
        self.transaction(|spi| {
            spi.transfer(&mut [Command::ReadStatusRegister as u8, 0])
                .map(|buf| buf[1])
                .map_err(Error::TransferError)
        })
    }

    pub fn write_status_register(&mut self, status: u8) -> Result<(), Error<SPI, CS>> {
        self.write_enable()?;
        self.transaction(|spi| {
            spi.transfer(&mut [Command::WriteStatusRegister as u8, status])
                .map_err(Error::TransferError)?;
            Ok(())
        })?;
        self.wait_ready()
    }

    pub fn transaction<RES, TX: FnOnce(&mut SPI) -> Result<RES, Error<SPI, CS>>>(
        &mut self,
        tx: TX,
    ) -> Result<RES, Error<SPI, CS>> {
        self.cs.set_low().map_err(Error::ChipSelectError)?;
        let res = tx(&mut self.spi);
        self.cs.set_high().map_err(Error::ChipSelectError).and(res)
    }

    /// Spins until the write-in-progress bit clears. FRAM reports ready at once.
    pub fn wait_ready(&mut self) -> Result<(), Error<SPI, CS>> {
        while self.read_status_register()? & STATUS_WIP != 0 {}
        Ok(())
    }

    fn write_enable(&mut self) -> Result<(), Error<SPI, CS>> {
        self.transaction(|spi| {
            spi.write(&[Command::WriteEnable as u8])
                .map_err(Error::WriteError)
        })
    }

    fn mem_cmd(cmd: Command, addr: Address) -> [u8; 5] {
        assert!(ADDR_BYTES > 0 && ADDR_BYTES <= 4);

        let mut buf = [0; 5];
        buf[0] = cmd as u8;
        match ADDR_BYTES {
            1 => buf[1] = addr as u8,
            2 => BigEndian::write_u16(&mut buf[1..], addr as u16),
            3 => BigEndian::write_u24(&mut buf[1..], addr),
            4 => BigEndian::write_u32(&mut buf[1..], addr),
            _ => unreachable!(),
        };
        buf
    }

    fn fill(&mut self, addr: Address, len: Address, value: u8) -> Result<(), Error<SPI, CS>> {
        self.write_enable()?;
        self.transaction(|spi| {
            let cmd_buf = Self::mem_cmd(Command::Write, addr);
            spi.write(&cmd_buf[..ADDR_BYTES + 1])
                .map_err(Error::WriteError)?;

            let chunk = [value; FILL_CHUNK];
            let mut left = len as usize;
            while left > 0 {
                let batch = usize::min(left, FILL_CHUNK);
                spi.write(&chunk[..batch]).map_err(Error::WriteError)?;
                left -= batch;
            }
            Ok(())
        })?;
        self.wait_ready()
    }
}

impl<SPI: spi::Transfer<u8> + spi::Write<u8>, CS: OutputPin, const ADDR_BYTES: usize> Chip
    for SpiChip<SPI, CS, ADDR_BYTES>
{
    type Error = Error<SPI, CS>;

    fn capacity(&self) -> Address {
        self.capacity
    }

    fn read_byte(&mut self, addr: Address) -> Result<u8, Self::Error> {
        debug_assert!(addr < self.capacity);

        self.transaction(|spi| {
            let mut cmd_buf = Self::mem_cmd(Command::Read, addr);
            spi.transfer(&mut cmd_buf[..ADDR_BYTES + 1])
                .map_err(Error::TransferError)?;
            spi.transfer(&mut [0])
                .map(|buf| buf[0])
                .map_err(Error::TransferError)
        })
    }

    fn write_byte(&mut self, addr: Address, value: u8) -> Result<(), Self::Error> {
        debug_assert!(addr < self.capacity);

        self.write_enable()?;
        self.transaction(|spi| {
            let cmd_buf = Self::mem_cmd(Command::Write, addr);
            spi.write(&cmd_buf[..ADDR_BYTES + 1])
                .and_then(|_| spi.write(&[value]))
                .map_err(Error::WriteError)
        })?;
        self.wait_ready()
    }

    fn clear(&mut self, value: u8) -> Result<(), Self::Error> {
        let page = if self.page_size == 0 {
            self.capacity
        } else {
            self.page_size
        };

        let mut addr = 0;
        while addr < self.capacity {
            let len = Address::min(page - addr % page, self.capacity - addr);
            self.fill(addr, len, value)?;
            addr += len;
        }
        Ok(())
    }
}
