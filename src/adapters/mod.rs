use crate::Address;

pub mod ram;
pub mod spi;

/// Byte-level capability of one physical memory chip.
///
/// Addresses passed to a chip are local to it and start at zero. The store
/// queries `capacity` once, when the chip is added.
pub trait Chip {
    type Error;

    fn capacity(&self) -> Address;
    fn read_byte(&mut self, addr: Address) -> Result<u8, Self::Error>;
    fn write_byte(&mut self, addr: Address, value: u8) -> Result<(), Self::Error>;
    fn clear(&mut self, value: u8) -> Result<(), Self::Error>;
}
