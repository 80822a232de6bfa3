//! Order-preserving byte encodings for numeric slot values.
//!
//! Sort keys and numeric range bounds are stored in value slots as byte
//! strings and compared bytewise by [`SortOrder`](crate::hit::SortOrder).
//! For that comparison to agree with numeric order, numbers must be
//! serialized so that the lexicographic order of the encodings matches the
//! numeric order of the values. The transform here is the usual sign-flip
//! trick over the IEEE-754 bit pattern, written big-endian.

use byteorder::{BigEndian, ByteOrder};

/// Encode an `f64` so that bytewise comparison matches numeric comparison.
///
/// Total over finite values and infinities; `-0.0` encodes below `+0.0`.
pub fn encode_sortable_f64(value: f64) -> [u8; 8] {
    let bits = value.to_bits();
    let flipped = if bits & (1 << 63) != 0 {
        // Negative: flip every bit so more-negative sorts lower.
        !bits
    } else {
        // Non-negative: set the sign bit so positives sort above negatives.
        bits | (1 << 63)
    };
    let mut buf = [0u8; 8];
    BigEndian::write_u64(&mut buf, flipped);
    buf
}

/// Decode an encoding produced by [`encode_sortable_f64`].
pub fn decode_sortable_f64(buf: &[u8; 8]) -> f64 {
    let flipped = BigEndian::read_u64(buf);
    let bits = if flipped & (1 << 63) != 0 {
        flipped & !(1 << 63)
    } else {
        !flipped
    };
    f64::from_bits(bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for v in [
            0.0,
            -0.0,
            1.5,
            -1.5,
            f64::MAX,
            f64::MIN,
            f64::INFINITY,
            f64::NEG_INFINITY,
            1e-300,
        ] {
            let encoded = encode_sortable_f64(v);
            assert_eq!(decode_sortable_f64(&encoded).to_bits(), v.to_bits());
        }
    }

    #[test]
    fn test_encoding_preserves_order() {
        let values = [
            f64::NEG_INFINITY,
            -1e12,
            -3.25,
            -1.0,
            -1e-30,
            0.0,
            1e-30,
            0.5,
            1.0,
            3.25,
            1e12,
            f64::INFINITY,
        ];

        for pair in values.windows(2) {
            let lo = encode_sortable_f64(pair[0]);
            let hi = encode_sortable_f64(pair[1]);
            assert!(lo < hi, "{} should encode below {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_negative_zero_sorts_below_positive_zero() {
        assert!(encode_sortable_f64(-0.0) < encode_sortable_f64(0.0));
    }
}
