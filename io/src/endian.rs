//! Byte order detection and swap primitives.
//!
//! The byte order tag itself is [`Endianness`] from `byteordered`,
//! which is also what the sources and targets of this crate use
//! to bind their primitive readers and writers.

pub use byteordered::Endianness;

/// Retrieve the byte order of the running machine.
#[inline]
pub fn native() -> Endianness {
    if cfg!(target_endian = "big") {
        Endianness::Big
    } else {
        Endianness::Little
    }
}

/// Whether the given byte order differs from the machine's.
#[inline]
pub fn is_foreign(endianness: Endianness) -> bool {
    endianness != native()
}

/// A value whose byte representation can be reversed.
pub trait SwapBytes: Copy {
    /// Return the value with the order of its bytes reversed.
    fn swap_bytes(self) -> Self;
}

macro_rules! impl_swap_int {
    ($($t: ty),*) => {
        $(
            impl SwapBytes for $t {
                #[inline]
                fn swap_bytes(self) -> Self {
                    <$t>::swap_bytes(self)
                }
            }
        )*
    };
}

impl_swap_int!(u16, i16, u32, i32, u64, i64);

impl SwapBytes for f32 {
    #[inline]
    fn swap_bytes(self) -> Self {
        f32::from_bits(self.to_bits().swap_bytes())
    }
}

impl SwapBytes for f64 {
    #[inline]
    fn swap_bytes(self) -> Self {
        f64::from_bits(self.to_bits().swap_bytes())
    }
}

/// Reverse the bytes of every value in the slice.
pub fn swap_slice<T: SwapBytes>(values: &mut [T]) {
    for v in values {
        *v = v.swap_bytes();
    }
}

/// Reverse the byte order of each `unit`-sized chunk of `bytes` in place.
///
/// Only whole units are swapped:
/// a trailing chunk shorter than `unit` is left untouched.
/// Units of 0 or 1 byte leave the data unchanged.
pub fn swap_bytes_in_place(unit: usize, bytes: &mut [u8]) {
    if unit < 2 {
        return;
    }
    for chunk in bytes.chunks_exact_mut(unit) {
        chunk.reverse();
    }
}
