#![no_std]

use core::fmt;

mod segment;
mod store;

pub mod adapters;

pub use adapters::Chip;
pub use segment::*;
pub use store::*;

/// Maximum number of chips a single store can span.
pub const MAX_CHIPS: usize = 8;

pub type Address = u32;

#[derive(Debug, PartialEq)]
pub enum Error<E> {
    ChipError(E),
    ChipBusy,
    CapacityExceeded,
    EmptyInput,
    IndexOutOfRange,
    InvalidCapacity,
    InvalidCount,
    NoneAdded,
    OutOfRange,
    ValueOutOfRange,
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChipError(err) => write!(f, "chip error: {:?}", err),
            Self::ChipBusy => write!(f, "chip is borrowed elsewhere"),
            Self::CapacityExceeded => write!(f, "store cannot hold more than {} chips", MAX_CHIPS),
            Self::EmptyInput => write!(f, "empty input"),
            Self::IndexOutOfRange => write!(f, "segment index out of range"),
            Self::InvalidCapacity => write!(f, "invalid chip capacity"),
            Self::InvalidCount => write!(f, "invalid byte count"),
            Self::NoneAdded => write!(f, "no new chips added"),
            Self::OutOfRange => write!(f, "address out of range"),
            Self::ValueOutOfRange => write!(f, "value does not fit in a byte"),
        }
    }
}
