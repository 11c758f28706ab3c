use crate::adapters::*;

pub struct MemoryChip<const SIZE: usize> {
    pub memory: [u8; SIZE],
}

impl<const SIZE: usize> Default for MemoryChip<SIZE> {
    fn default() -> Self {
        Self::new([0; SIZE])
    }
}

impl<const SIZE: usize> MemoryChip<SIZE> {
    pub fn new(memory: [u8; SIZE]) -> Self {
        Self { memory }
    }

    pub fn release(self) -> [u8; SIZE] {
        self.memory
    }
}

impl<const SIZE: usize> Chip for MemoryChip<SIZE> {
    type Error = ();

    fn capacity(&self) -> Address {
        SIZE as Address
    }

    fn read_byte(&mut self, addr: Address) -> Result<u8, Self::Error> {
        self.memory.get(addr as usize).copied().ok_or(())
    }

    fn write_byte(&mut self, addr: Address, value: u8) -> Result<(), Self::Error> {
        let cell = self.memory.get_mut(addr as usize).ok_or(())?;
        *cell = value;
        Ok(())
    }

    fn clear(&mut self, value: u8) -> Result<(), Self::Error> {
        self.memory.fill(value);
        Ok(())
    }
}

pub struct RefMemoryChip<'a> {
    pub memory: &'a mut [u8],
}

impl<'a> RefMemoryChip<'a> {
    pub fn new(memory: &'a mut [u8]) -> Self {
        Self { memory }
    }

    pub fn release(self) -> &'a mut [u8] {
        self.memory
    }
}

impl<'a> Chip for RefMemoryChip<'a> {
    type Error = ();

    fn capacity(&self) -> Address {
        self.memory.len() as Address
    }

    fn read_byte(&mut self, addr: Address) -> Result<u8, Self::Error> {
        self.memory.get(addr as usize).copied().ok_or(())
    }

    fn write_byte(&mut self, addr: Address, value: u8) -> Result<(), Self::Error> {
        let cell = self.memory.get_mut(addr as usize).ok_or(())?;
        *cell = value;
        Ok(())
    }

    fn clear(&mut self, value: u8) -> Result<(), Self::Error> {
        self.memory.fill(value);
        Ok(())
    }
}
