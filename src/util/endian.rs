//! Byte-order handling for archive fields.
//!
//! Level II archives store every integer and float big-endian. Fields are
//! decoded with an explicit conversion so the host byte order never leaks
//! into decoded values.

use byteorder::{BigEndian, ByteOrder};

/// Fixed-width integer that can be decoded from big-endian archive bytes.
pub trait Integral: Copy + Sized {
    /// Width of the field in bytes.
    const SIZE: usize;

    /// Decode from the first `SIZE` bytes of `bytes` (big-endian).
    fn from_be_slice(bytes: &[u8]) -> Self;

    /// Reverse the byte order of the value.
    fn reverse_endian(self) -> Self;
}

impl Integral for u8 {
    const SIZE: usize = 1;

    #[inline]
    fn from_be_slice(bytes: &[u8]) -> Self {
        bytes[0]
    }

    #[inline]
    fn reverse_endian(self) -> Self {
        self
    }
}

impl Integral for i8 {
    const SIZE: usize = 1;

    #[inline]
    fn from_be_slice(bytes: &[u8]) -> Self {
        bytes[0] as i8
    }

    #[inline]
    fn reverse_endian(self) -> Self {
        self
    }
}

macro_rules! impl_integral {
    ($($ty:ty => $read:ident),* $(,)?) => {
        $(
            impl Integral for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn from_be_slice(bytes: &[u8]) -> Self {
                    BigEndian::$read(bytes)
                }

                #[inline]
                fn reverse_endian(self) -> Self {
                    self.swap_bytes()
                }
            }
        )*
    };
}

impl_integral! {
    u16 => read_u16,
    i16 => read_i16,
    u32 => read_u32,
    i32 => read_i32,
    u64 => read_u64,
    i64 => read_i64,
}

/// Reverse the byte order of `value`. One-byte values are returned as-is.
#[inline]
pub fn reverse_endian<T: Integral>(value: T) -> T {
    value.reverse_endian()
}

/// Decode a big-endian IEEE-754 single from the first 4 bytes of `bytes`.
#[inline]
pub fn f32_from_be_slice(bytes: &[u8]) -> f32 {
    BigEndian::read_f32(bytes)
}
