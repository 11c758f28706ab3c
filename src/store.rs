use core::cell::{RefCell, RefMut};

use crate::segment::{Segment, SegmentTable};
use crate::{Address, Chip, Error, MAX_CHIPS};

/// Linear byte store spanning up to [`MAX_CHIPS`] chips.
///
/// Chips are borrowed, mapped back to back in the order they were added, and
/// addressed through one logical address space starting at zero. Every
/// logical byte costs exactly one chip call; nothing is cached.
#[derive(Debug)]
pub struct SpanStore<'a, C: ?Sized> {
    table: SegmentTable<'a, C>,
}

impl<'a, C: ?Sized> Default for SpanStore<'a, C> {
    fn default() -> Self {
        Self {
            table: SegmentTable::new(),
        }
    }
}

impl<'a, C, E> SpanStore<'a, C>
where
    C: Chip<Error = E> + ?Sized,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chips(chips: &[&'a RefCell<C>]) -> Result<Self, Error<E>> {
        if chips.len() > MAX_CHIPS {
            return Err(Error::CapacityExceeded);
        }
        let mut store = Self::new();
        store.add_chips(chips)?;
        Ok(store)
    }

    /// Appends chips after the current end of the store, skipping chips that
    /// are already mapped. Returns the number of chips appended.
    pub fn add_chips(&mut self, chips: &[&'a RefCell<C>]) -> Result<usize, Error<E>> {
        self.table.add(chips)
    }

    pub fn chip_count(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Exclusive upper bound of the logical address space.
    pub fn max_address(&self) -> Address {
        self.table.capacity()
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment<'a, C>> {
        self.table.iter()
    }

    pub fn segment(&self, index: usize) -> Option<&Segment<'a, C>> {
        self.table.get(index)
    }

    pub fn locate(&self, addr: Address) -> Result<(usize, Address), Error<E>> {
        self.table.locate(addr).ok_or(Error::OutOfRange)
    }

    pub fn segment_for_address(&self, addr: Address) -> Result<&'a RefCell<C>, Error<E>> {
        let (idx, _) = self.locate(addr)?;
        self.segment_for_index(idx)
    }

    pub fn segment_for_index(&self, index: usize) -> Result<&'a RefCell<C>, Error<E>> {
        self.table
            .get(index)
            .map(|seg| seg.chip())
            .ok_or(Error::IndexOutOfRange)
    }

    pub fn read_byte(&mut self, addr: Address) -> Result<u8, Error<E>> {
        let (idx, local) = self.locate(addr)?;
        self.borrow_chip(idx)?
            .read_byte(local)
            .map_err(Error::ChipError)
    }

    pub fn write_byte(&mut self, addr: Address, value: u8) -> Result<(), Error<E>> {
        let (idx, local) = self.locate(addr)?;
        self.borrow_chip(idx)?
            .write_byte(local, value)
            .map_err(Error::ChipError)
    }

    /// Fills every chip with `value`.
    pub fn clear(&mut self, value: u8) -> Result<(), Error<E>> {
        for idx in 0..self.table.len() {
            self.borrow_chip(idx)?
                .clear(value)
                .map_err(Error::ChipError)?;
        }
        Ok(())
    }

    /// Reads up to `buf.len()` bytes starting at `addr` and returns how many
    /// were read.
    ///
    /// Reading stops early at the end of the store or at the first failing
    /// chip call. An error is returned only when not a single byte was read.
    pub fn read_block(&mut self, addr: Address, buf: &mut [u8]) -> Result<usize, Error<E>> {
        self.read_run(addr, buf.len(), |idx, byte| {
            buf[idx] = byte;
            true
        })
    }

    /// Writes `data` starting at `addr`.
    ///
    /// Bytes that do not fit before the end of the store are dropped, unless
    /// `wrap` is set, in which case they continue from address zero. A block
    /// wraps at most once.
    pub fn write_block(&mut self, addr: Address, data: &[u8], wrap: bool) -> Result<(), Error<E>> {
        self.write_run(addr, data.len(), data.iter().copied(), wrap)
    }

    /// Reads up to `count` characters, one byte each, starting at `addr`.
    ///
    /// Bytes are taken as Latin-1 code points. Truncation follows
    /// [`read_block`](Self::read_block); reading also stops once the returned
    /// string is full. `N` counts UTF-8 bytes, so characters above U+007F
    /// take two bytes each. A first character that does not fit at all is
    /// reported as `InvalidCount`.
    pub fn read_string<const N: usize>(
        &mut self,
        addr: Address,
        count: usize,
    ) -> Result<heapless::String<N>, Error<E>> {
        let mut text = heapless::String::new();
        self.read_run(addr, count, |_, byte| text.push(char::from(byte)).is_ok())?;
        Ok(text)
    }

    /// Writes `text` one byte per character, with the wrap policy of
    /// [`write_block`](Self::write_block).
    ///
    /// Characters above U+00FF have no single-byte form; such text is
    /// rejected before anything is written.
    pub fn write_string(&mut self, addr: Address, text: &str, wrap: bool) -> Result<(), Error<E>> {
        self.locate(addr)?;
        if text.chars().any(|ch| u32::from(ch) > 0xff) {
            return Err(Error::ValueOutOfRange);
        }
        let len = text.chars().count();
        self.write_run(addr, len, text.chars().map(|ch| ch as u8), wrap)
    }

    fn borrow_chip(&self, idx: usize) -> Result<RefMut<'a, C>, Error<E>> {
        self.segment_for_index(idx)?
            .try_borrow_mut()
            .map_err(|_| Error::ChipBusy)
    }

    fn read_run<F>(&mut self, addr: Address, count: usize, mut sink: F) -> Result<usize, Error<E>>
    where
        F: FnMut(usize, u8) -> bool,
    {
        self.locate(addr)?;
        if count == 0 {
            return Err(Error::InvalidCount);
        }

        let mut read = 0;
        let mut cursor = addr;
        while read < count {
            match self.read_byte(cursor) {
                Ok(byte) => {
                    if !sink(read, byte) {
                        if read == 0 {
                            return Err(Error::InvalidCount);
                        }
                        break;
                    }
                    read += 1;
                }
                Err(err) if read == 0 => return Err(err),
                Err(_) => break,
            }
            // cursor < max_address, so this never overflows
            cursor += 1;
        }

        if read < count {
            log::trace!("read at 0x{:08x} truncated to {}/{} bytes", addr, read, count);
        }
        Ok(read)
    }

    fn write_run<I>(
        &mut self,
        addr: Address,
        len: usize,
        mut data: I,
        wrap: bool,
    ) -> Result<(), Error<E>>
    where
        I: Iterator<Item = u8>,
    {
        self.locate(addr)?;
        if len == 0 {
            return Err(Error::EmptyInput);
        }

        let room = (self.max_address() - addr) as usize;
        let head = usize::min(len, room);
        for (offset, byte) in (&mut data).take(head).enumerate() {
            self.write_byte(addr + offset as Address, byte)?;
        }

        let overflow = len - head;
        if overflow == 0 {
            return Ok(());
        }
        if !wrap {
            log::trace!("dropped {} bytes past the end of the store", overflow);
            return Ok(());
        }

        let tail = usize::min(overflow, self.max_address() as usize);
        for (offset, byte) in data.take(tail).enumerate() {
            self.write_byte(offset as Address, byte)?;
        }
        if tail < overflow {
            log::trace!("dropped {} bytes after wrapping", overflow - tail);
        }
        Ok(())
    }
}
