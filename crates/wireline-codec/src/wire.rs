//! Fixed-width scalar and tuple codecs.
//!
//! [`Wire`] covers a single scalar; [`WireEncode`] and [`WireDecode`] extend
//! the same encoding to tuples so that a whole back-to-back value sequence can
//! be written or read in one call.

use std::mem;

use byteorder::{BigEndian, ByteOrder};

/// A fixed-width scalar that travels big-endian.
pub trait Wire: Copy {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Appends the big-endian encoding of `self` to `out`.
    fn put(self, out: &mut Vec<u8>);

    /// Decodes a value from the first `WIDTH` bytes of `bytes`.
    ///
    /// Callers must check the slice length first; short input panics.
    fn take(bytes: &[u8]) -> Self;
}

/// A scalar or tuple decodable from a byte slice.
pub trait WireDecode: Sized {
    /// Total encoded width in bytes.
    const WIDTH: usize;

    /// Decodes a value from the first `WIDTH` bytes of `bytes`.
    ///
    /// Callers must check the slice length first; short input panics.
    fn decode(bytes: &[u8]) -> Self;
}

/// A scalar or tuple encodable onto the wire.
pub trait WireEncode {
    /// Appends the big-endian encoding of every element to `out`.
    fn put_all(self, out: &mut Vec<u8>);
}

macro_rules! impl_wire_int {
    ($($ty:ty => $write:ident, $read:ident;)*) => {
        $(
            impl Wire for $ty {
                const WIDTH: usize = mem::size_of::<$ty>();

                #[inline]
                fn put(self, out: &mut Vec<u8>) {
                    let mut raw = [0u8; mem::size_of::<$ty>()];
                    BigEndian::$write(&mut raw, self);
                    out.extend_from_slice(&raw);
                }

                #[inline]
                fn take(bytes: &[u8]) -> Self {
                    BigEndian::$read(bytes)
                }
            }
        )*
    };
}

impl_wire_int! {
    u16 => write_u16, read_u16;
    i16 => write_i16, read_i16;
    u32 => write_u32, read_u32;
    i32 => write_i32, read_i32;
    u64 => write_u64, read_u64;
    i64 => write_i64, read_i64;
    u128 => write_u128, read_u128;
    i128 => write_i128, read_i128;
}

impl Wire for u8 {
    const WIDTH: usize = 1;

    #[inline]
    fn put(self, out: &mut Vec<u8>) {
        out.push(self);
    }

    #[inline]
    fn take(bytes: &[u8]) -> Self {
        bytes[0]
    }
}

impl Wire for i8 {
    const WIDTH: usize = 1;

    #[inline]
    fn put(self, out: &mut Vec<u8>) {
        out.push(self as u8);
    }

    #[inline]
    fn take(bytes: &[u8]) -> Self {
        bytes[0] as i8
    }
}

/// Booleans occupy a single byte; any non-zero byte decodes as `true`.
impl Wire for bool {
    const WIDTH: usize = 1;

    #[inline]
    fn put(self, out: &mut Vec<u8>) {
        out.push(self as u8);
    }

    #[inline]
    fn take(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

macro_rules! impl_wire_scalar_codec {
    ($($ty:ty),* $(,)?) => {
        $(
            impl WireDecode for $ty {
                const WIDTH: usize = <$ty as Wire>::WIDTH;

                #[inline]
                fn decode(bytes: &[u8]) -> Self {
                    <$ty as Wire>::take(bytes)
                }
            }

            impl WireEncode for $ty {
                #[inline]
                fn put_all(self, out: &mut Vec<u8>) {
                    self.put(out);
                }
            }
        )*
    };
}

impl_wire_scalar_codec!(u8, i8, u16, i16, u32, i32, u64, i64, u128, i128, bool);

macro_rules! impl_wire_tuple {
    ($($name:ident),+) => {
        impl<$($name: Wire),+> WireDecode for ($($name,)+) {
            const WIDTH: usize = 0 $(+ $name::WIDTH)+;

            fn decode(bytes: &[u8]) -> Self {
                let mut offset = 0;
                let decoded = ($(
                    {
                        let value = $name::take(&bytes[offset..]);
                        offset += $name::WIDTH;
                        value
                    },
                )+);
                debug_assert_eq!(offset, Self::WIDTH);
                decoded
            }
        }

        impl<$($name: Wire),+> WireEncode for ($($name,)+) {
            fn put_all(self, out: &mut Vec<u8>) {
                #[allow(non_snake_case)]
                let ($($name,)+) = self;
                $($name.put(out);)+
            }
        }
    };
}

impl_wire_tuple!(A);
impl_wire_tuple!(A, B);
impl_wire_tuple!(A, B, C);
impl_wire_tuple!(A, B, C, D);
impl_wire_tuple!(A, B, C, D, E);
impl_wire_tuple!(A, B, C, D, E, F);
impl_wire_tuple!(A, B, C, D, E, F, G);
impl_wire_tuple!(A, B, C, D, E, F, G, H);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_encode_big_endian() {
        let mut out = Vec::new();
        0x0102u16.put(&mut out);
        0x030405_06u32.put(&mut out);
        assert_eq!(out, [0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
    }

    #[test]
    fn scalars_round_trip() {
        let mut out = Vec::new();
        (-1234i32).put(&mut out);
        assert_eq!(i32::take(&out), -1234);

        let mut out = Vec::new();
        true.put(&mut out);
        assert!(bool::take(&out));
    }

    #[test]
    fn tuples_concatenate_elements() {
        let mut out = Vec::new();
        (0x01u8, 0x0203u16, 0x0405_0607u32).put_all(&mut out);
        assert_eq!(out, [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07]);

        type Triple = (u8, u16, u32);
        assert_eq!(Triple::WIDTH, 7);
        let decoded: Triple = WireDecode::decode(&out);
        assert_eq!(decoded, (0x01, 0x0203, 0x0405_0607));
    }

    #[test]
    fn mixed_tuple_round_trip() {
        let values = (124_234i32, 97_234i64, 97u8, true, 13i16, 1_356_469_817u64);
        let mut out = Vec::new();
        values.put_all(&mut out);

        type Mixed = (i32, i64, u8, bool, i16, u64);
        assert_eq!(out.len(), Mixed::WIDTH);
        let decoded: Mixed = WireDecode::decode(&out);
        assert_eq!(decoded, values);
    }
}
