extern crate nvspan;

use core::cell::RefCell;
use std::io::*;

use nvspan::adapters::ram::MemoryChip;
use nvspan::*;

const CHIP_SIZE: usize = 64;

type Chip64 = MemoryChip<CHIP_SIZE>;

fn main() {
    let chips = [
        RefCell::new(Chip64::default()),
        RefCell::new(Chip64::default()),
    ];

    {
        let mut store = SpanStore::with_chips(&[&chips[0], &chips[1]]).unwrap();
        store.clear(b'.').unwrap();

        let line = "boot ok; sensor calibration loaded; entering low power mode";
        let cursor = store.max_address() - 16;
        store.write_string(cursor, line, true).unwrap();

        let head: heapless::String<32> = store.read_string(0, 32).unwrap();
        eprintln!("head: {}", head);
    }

    for chip in chips {
        stdout().write_all(&chip.into_inner().release()).ok();
    }
}
