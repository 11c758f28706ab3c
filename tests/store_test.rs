use core::cell::RefCell;

use nvspan::adapters::ram::{MemoryChip, RefMemoryChip};
use nvspan::{Address, Chip, Error, SpanStore, MAX_CHIPS};

mod tiny {
    use crate::*;

    pub const CHIP_SIZE: usize = 256;

    pub type Chip256 = MemoryChip<CHIP_SIZE>;
    pub type Store<'a> = SpanStore<'a, Chip256>;

    pub fn chips<const N: usize>() -> [RefCell<Chip256>; N] {
        core::array::from_fn(|_| RefCell::new(Chip256::default()))
    }
}

#[test]
fn test_empty_store() {
    let store = tiny::Store::new();
    assert!(store.is_empty());
    assert_eq!(store.chip_count(), 0);
    assert_eq!(store.max_address(), 0);
    assert_eq!(store.locate(0), Err(Error::OutOfRange));
}

#[test]
fn test_two_chip_layout() {
    let chips = tiny::chips::<2>();
    let store = tiny::Store::with_chips(&[&chips[0], &chips[1]]).unwrap();

    assert_eq!(store.chip_count(), 2);
    assert_eq!(store.max_address(), 512);
    assert_eq!(store.locate(0), Ok((0, 0)));
    assert_eq!(store.locate(255), Ok((0, 255)));
    assert_eq!(store.locate(256), Ok((1, 0)));
    assert_eq!(store.locate(511), Ok((1, 255)));
    assert_eq!(store.locate(512), Err(Error::OutOfRange));

    let seg = store.segment(1).unwrap();
    assert_eq!(seg.start(), 256);
    assert_eq!(seg.end(), 511);
    assert_eq!(seg.len(), 256);
    assert!(!seg.is_empty());
}

#[test]
fn test_mixed_capacities() {
    let mut small = [0u8; 16];
    let mut large = [0u8; 100];
    let a: RefCell<RefMemoryChip> = RefCell::new(RefMemoryChip::new(&mut small));
    let b = RefCell::new(RefMemoryChip::new(&mut large));

    let store = SpanStore::with_chips(&[&a, &b]).unwrap();
    assert_eq!(store.max_address(), 116);
    assert_eq!(store.locate(15), Ok((0, 15)));
    assert_eq!(store.locate(16), Ok((1, 0)));
    assert_eq!(store.locate(115), Ok((1, 99)));
    assert_eq!(store.locate(116), Err(Error::OutOfRange));
}

#[test]
fn test_add_chips_incrementally() {
    let chips = tiny::chips::<3>();
    let mut store = tiny::Store::new();

    assert_eq!(store.add_chips(&[&chips[0]]), Ok(1));
    assert_eq!(store.max_address(), 256);
    assert_eq!(store.add_chips(&[&chips[1], &chips[2]]), Ok(2));
    assert_eq!(store.max_address(), 768);
    assert_eq!(store.segment(2).unwrap().start(), 512);
}

#[test]
fn test_add_no_chips() {
    let mut store = tiny::Store::new();
    assert_eq!(store.add_chips(&[]), Err(Error::EmptyInput));
}

#[test]
fn test_duplicates_are_skipped() {
    let chips = tiny::chips::<2>();
    let mut store = tiny::Store::new();

    assert_eq!(store.add_chips(&[&chips[0], &chips[0], &chips[1]]), Ok(2));
    assert_eq!(store.chip_count(), 2);
    assert_eq!(store.max_address(), 512);
}

#[test]
fn test_only_duplicates() {
    let chips = tiny::chips::<1>();
    let mut store = tiny::Store::with_chips(&[&chips[0]]).unwrap();

    assert_eq!(store.add_chips(&[&chips[0]]), Err(Error::NoneAdded));
    assert_eq!(store.chip_count(), 1);
}

#[test]
fn test_full_store_rejects_ninth_chip() {
    let chips = tiny::chips::<9>();
    let first: Vec<_> = chips[..MAX_CHIPS].iter().collect();
    let mut store = tiny::Store::with_chips(&first).unwrap();
    assert_eq!(store.chip_count(), MAX_CHIPS);

    assert_eq!(store.add_chips(&[&chips[8]]), Err(Error::CapacityExceeded));
    assert_eq!(store.chip_count(), MAX_CHIPS);
    assert_eq!(store.max_address(), 8 * 256);
}

#[test]
fn test_too_many_chips_at_once() {
    let chips = tiny::chips::<9>();
    let mut store = tiny::Store::with_chips(&[&chips[0], &chips[1]]).unwrap();

    let rest: Vec<_> = chips[2..].iter().collect();
    assert_eq!(store.add_chips(&rest), Err(Error::CapacityExceeded));
    assert_eq!(store.chip_count(), 2);

    let all: Vec<_> = chips.iter().collect();
    assert!(matches!(
        tiny::Store::with_chips(&all),
        Err(Error::CapacityExceeded)
    ));
}

#[test]
fn test_zero_capacity_chip() {
    let mut empty: [u8; 0] = [];
    let mut data = [0u8; 8];
    let good = RefCell::new(RefMemoryChip::new(&mut data));
    let bad = RefCell::new(RefMemoryChip::new(&mut empty));

    let mut store = SpanStore::new();
    assert_eq!(store.add_chips(&[&good, &bad]), Err(Error::InvalidCapacity));
    assert_eq!(store.chip_count(), 1);
    assert_eq!(store.max_address(), 8);
}

/// Chip claiming the whole `u32` address space.
struct HugeChip;

impl Chip for HugeChip {
    type Error = ();

    fn capacity(&self) -> Address {
        Address::MAX
    }

    fn read_byte(&mut self, _addr: Address) -> Result<u8, Self::Error> {
        Err(())
    }

    fn write_byte(&mut self, _addr: Address, _value: u8) -> Result<(), Self::Error> {
        Err(())
    }

    fn clear(&mut self, _value: u8) -> Result<(), Self::Error> {
        Err(())
    }
}

#[test]
fn test_capacity_overflow() {
    let small: RefCell<MemoryChip<16>> = RefCell::new(MemoryChip::default());
    let huge = RefCell::new(HugeChip);

    let a: &RefCell<dyn Chip<Error = ()>> = &small;
    let b: &RefCell<dyn Chip<Error = ()>> = &huge;
    let mut store = SpanStore::new();

    assert_eq!(store.add_chips(&[a, b]), Err(Error::InvalidCapacity));
    assert_eq!(store.chip_count(), 1);
    assert_eq!(store.max_address(), 16);
    assert_eq!(store.locate(15), Ok((0, 15)));
}

#[test]
fn test_busy_chip_on_add() {
    let chips = tiny::chips::<2>();
    let mut store = tiny::Store::with_chips(&[&chips[0]]).unwrap();

    let guard = chips[1].borrow_mut();
    assert_eq!(store.add_chips(&[&chips[1]]), Err(Error::ChipBusy));
    assert_eq!(store.chip_count(), 1);
    drop(guard);

    assert_eq!(store.add_chips(&[&chips[1]]), Ok(1));
    assert_eq!(store.max_address(), 512);
}

#[test]
fn test_segment_accessors() {
    let chips = tiny::chips::<2>();
    let store = tiny::Store::with_chips(&[&chips[0], &chips[1]]).unwrap();

    assert!(core::ptr::eq(store.segment_for_address(300).unwrap(), &chips[1]));
    assert!(core::ptr::eq(store.segment_for_address(0).unwrap(), &chips[0]));
    assert!(core::ptr::eq(store.segment_for_index(1).unwrap(), &chips[1]));
    assert!(matches!(store.segment_for_address(512), Err(Error::OutOfRange)));
    assert!(matches!(store.segment_for_index(2), Err(Error::IndexOutOfRange)));
}

#[test]
fn test_byte_io_crosses_chips() {
    let chips = tiny::chips::<2>();
    let mut store = tiny::Store::with_chips(&[&chips[0], &chips[1]]).unwrap();

    store.write_byte(255, 0xaa).unwrap();
    store.write_byte(256, 0xbb).unwrap();
    assert_eq!(store.read_byte(255), Ok(0xaa));
    assert_eq!(store.read_byte(256), Ok(0xbb));
    assert_eq!(store.write_byte(512, 1), Err(Error::OutOfRange));
    assert_eq!(store.read_byte(512), Err(Error::OutOfRange));

    drop(store);
    assert_eq!(chips[0].borrow().memory[255], 0xaa);
    assert_eq!(chips[1].borrow().memory[0], 0xbb);
}

#[test]
fn test_clear() {
    let chips = tiny::chips::<2>();
    let mut store = tiny::Store::with_chips(&[&chips[0], &chips[1]]).unwrap();

    store.clear(0xff).unwrap();
    assert_eq!(store.read_byte(0), Ok(0xff));
    assert_eq!(store.read_byte(511), Ok(0xff));

    store.clear(0).unwrap();
    assert_eq!(store.read_byte(300), Ok(0));
}

#[test]
fn test_borrowed_chip_is_busy() {
    let chips = tiny::chips::<1>();
    let mut store = tiny::Store::with_chips(&[&chips[0]]).unwrap();

    let guard = chips[0].borrow_mut();
    assert_eq!(store.read_byte(0), Err(Error::ChipBusy));
    drop(guard);
    assert_eq!(store.read_byte(0), Ok(0));
}

#[test]
fn test_heterogeneous_chips() {
    let large: RefCell<MemoryChip<64>> = RefCell::new(MemoryChip::default());
    let small: RefCell<MemoryChip<32>> = RefCell::new(MemoryChip::default());

    let a: &RefCell<dyn Chip<Error = ()>> = &large;
    let b: &RefCell<dyn Chip<Error = ()>> = &small;
    let mut store = SpanStore::with_chips(&[a, b]).unwrap();

    assert_eq!(store.max_address(), 96);
    assert_eq!(store.add_chips(&[a]), Err(Error::NoneAdded));

    store.write_byte(64, 7).unwrap();
    drop(store);
    assert_eq!(small.into_inner().release()[0], 7);
}

#[test]
fn test_error_display() {
    let err: Error<()> = Error::CapacityExceeded;
    assert_eq!(err.to_string(), "store cannot hold more than 8 chips");
    assert_eq!(Error::ChipError(3u8).to_string(), "chip error: 3");
}
