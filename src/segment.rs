use core::cell::RefCell;
use core::ptr;

use crate::{Address, Chip, Error, MAX_CHIPS};

/// Logical address range backed by one chip.
#[derive(Debug)]
pub struct Segment<'a, C: ?Sized> {
    start: Address,
    end: Address,
    chip: &'a RefCell<C>,
}

impl<'a, C: ?Sized> Clone for Segment<'a, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, C: ?Sized> Copy for Segment<'a, C> {}

impl<'a, C: ?Sized> Segment<'a, C> {
    /// First logical address of the segment.
    pub fn start(&self) -> Address {
        self.start
    }

    /// Last logical address of the segment, inclusive.
    pub fn end(&self) -> Address {
        self.end
    }

    pub fn len(&self) -> Address {
        self.end - self.start + 1
    }

    /// Always false; a segment covers at least one byte.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn chip(&self) -> &'a RefCell<C> {
        self.chip
    }

    pub fn contains(&self, addr: Address) -> bool {
        self.start <= addr && addr <= self.end
    }
}

/// Ordered, gap-free list of segments.
///
/// Segment `i` starts right after segment `i - 1` ends, and segment 0 starts
/// at address zero. Segments are only ever appended.
#[derive(Debug)]
pub struct SegmentTable<'a, C: ?Sized> {
    segments: heapless::Vec<Segment<'a, C>, MAX_CHIPS>,
    capacity: Address,
}

impl<'a, C: ?Sized> Default for SegmentTable<'a, C> {
    fn default() -> Self {
        Self {
            segments: heapless::Vec::new(),
            capacity: 0,
        }
    }
}

impl<'a, C, E> SegmentTable<'a, C>
where
    C: Chip<Error = E> + ?Sized,
{
    /// Appends every chip that is not already part of the table and returns
    /// the number of chips appended.
    pub fn add(&mut self, chips: &[&'a RefCell<C>]) -> Result<usize, Error<E>> {
        if chips.is_empty() {
            return Err(Error::EmptyInput);
        }
        if chips.len() > MAX_CHIPS - self.segments.len() {
            return Err(Error::CapacityExceeded);
        }

        let mut added = 0;
        for &chip in chips {
            if self.position(chip).is_some() {
                log::debug!("chip already mapped, skipping");
                continue;
            }

            let len = chip.try_borrow().map_err(|_| Error::ChipBusy)?.capacity();
            if len == 0 {
                return Err(Error::InvalidCapacity);
            }
            let next = self
                .capacity
                .checked_add(len)
                .ok_or(Error::InvalidCapacity)?;

            let segment = Segment {
                start: self.capacity,
                end: next - 1,
                chip,
            };
            self.segments
                .push(segment)
                .map_err(|_| Error::CapacityExceeded)?;
            self.capacity = next;
            added += 1;

            log::debug!(
                "mapped chip #{} at 0x{:08x}..=0x{:08x}",
                self.segments.len() - 1,
                segment.start,
                segment.end
            );
        }

        if added == 0 {
            return Err(Error::NoneAdded);
        }
        Ok(added)
    }
}

impl<'a, C: ?Sized> SegmentTable<'a, C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// One past the highest valid logical address.
    pub fn capacity(&self) -> Address {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Segment<'a, C>> {
        self.segments.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment<'a, C>> {
        self.segments.iter()
    }

    /// Index of the segment backed by `chip`, compared by identity.
    pub fn position(&self, chip: &RefCell<C>) -> Option<usize> {
        self.segments
            .iter()
            .position(|seg| same_chip(seg.chip, chip))
    }

    /// Maps a logical address to a segment index and a chip-local address.
    pub fn locate(&self, addr: Address) -> Option<(usize, Address)> {
        if addr >= self.capacity {
            return None;
        }
        self.segments
            .iter()
            .position(|seg| seg.contains(addr))
            .map(|idx| (idx, addr - self.segments[idx].start))
    }
}

// Compares data pointers only; the same chip may be reached through different vtables.
fn same_chip<C: ?Sized>(a: &RefCell<C>, b: &RefCell<C>) -> bool {
    ptr::eq(
        (a as *const RefCell<C>).cast::<u8>(),
        (b as *const RefCell<C>).cast::<u8>(),
    )
}
