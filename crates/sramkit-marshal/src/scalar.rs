use bytes::{Buf, BufMut, BytesMut};

/// A fixed-width value with a big-endian wire form.
///
/// One codec covers every scalar kind; arrays are just `WIDTH`-byte
/// encodings laid end to end.
pub trait Scalar: Copy {
    /// Encoded size in bytes.
    const WIDTH: usize;

    /// Append the big-endian encoding of `self`.
    fn put_be<B: BufMut>(self, dst: &mut B);

    /// Consume `WIDTH` bytes and decode them.
    fn get_be<B: Buf>(src: &mut B) -> Self;
}

macro_rules! int_scalar {
    ($($ty:ty => $put:ident, $get:ident;)*) => {
        $(
            impl Scalar for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                fn put_be<B: BufMut>(self, dst: &mut B) {
                    dst.$put(self);
                }

                fn get_be<B: Buf>(src: &mut B) -> Self {
                    src.$get()
                }
            }
        )*
    };
}

int_scalar! {
    u8 => put_u8, get_u8;
    i8 => put_i8, get_i8;
    u16 => put_u16, get_u16;
    i16 => put_i16, get_i16;
    u32 => put_u32, get_u32;
    i32 => put_i32, get_i32;
}

/// IEEE-754 single precision, stored as its raw bit pattern.
impl Scalar for f32 {
    const WIDTH: usize = 4;

    fn put_be<B: BufMut>(self, dst: &mut B) {
        dst.put_u32(self.to_bits());
    }

    fn get_be<B: Buf>(src: &mut B) -> Self {
        f32::from_bits(src.get_u32())
    }
}

/// Append the packed encoding of `values` to `dst`.
pub fn encode_slice<S: Scalar>(values: &[S], dst: &mut BytesMut) {
    dst.reserve(values.len() * S::WIDTH);
    for &value in values {
        value.put_be(dst);
    }
}

/// Decode packed values from `src`; a trailing partial value is ignored.
pub fn decode_slice<S: Scalar>(mut src: &[u8]) -> Vec<S> {
    let count = src.len() / S::WIDTH;
    (0..count).map(|_| S::get_be(&mut src)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode<S: Scalar>(value: S) -> Vec<u8> {
        let mut buf = BytesMut::new();
        value.put_be(&mut buf);
        buf.to_vec()
    }

    #[test]
    fn widths() {
        assert_eq!(u8::WIDTH, 1);
        assert_eq!(i16::WIDTH, 2);
        assert_eq!(u32::WIDTH, 4);
        assert_eq!(f32::WIDTH, 4);
    }

    #[test]
    fn integers_are_big_endian() {
        assert_eq!(encode(0x0102_0304u32), vec![0x01, 0x02, 0x03, 0x04]);
        assert_eq!(encode(0xABCDu16), vec![0xAB, 0xCD]);
        assert_eq!(encode(-2i16), vec![0xFF, 0xFE]);
        assert_eq!(encode(-1i32), vec![0xFF; 4]);
        assert_eq!(encode(0x7Fu8), vec![0x7F]);
    }

    #[test]
    fn float_uses_bit_pattern() {
        assert_eq!(encode(3.5f32), vec![0x40, 0x60, 0x00, 0x00]);

        let nan = f32::from_bits(0x7FC0_1234);
        let bytes = encode(nan);
        assert_eq!(bytes, vec![0x7F, 0xC0, 0x12, 0x34]);
        assert_eq!(f32::get_be(&mut bytes.as_slice()).to_bits(), 0x7FC0_1234);
    }

    #[test]
    fn slices_pack_back_to_back() {
        let mut buf = BytesMut::new();
        encode_slice(&[1i16, -1, 0x1234], &mut buf);
        assert_eq!(buf.as_ref(), &[0x00, 0x01, 0xFF, 0xFF, 0x12, 0x34]);

        let decoded: Vec<i16> = decode_slice(&buf);
        assert_eq!(decoded, vec![1, -1, 0x1234]);
    }

    #[test]
    fn decode_ignores_trailing_partial_value() {
        let decoded: Vec<u32> = decode_slice(&[0, 0, 0, 7, 0xAA]);
        assert_eq!(decoded, vec![7]);
    }
}
