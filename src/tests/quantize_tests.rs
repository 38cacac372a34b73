// SPDX-License-Identifier: Apache-2.0

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::dispatch::vec_dot_int1_int4;
    use crate::quantize::{pack_as_binary, packed_len, transpose_half_byte};

    #[test]
    fn test_pack_is_msb_first() {
        assert_eq!(pack_as_binary(&[1, 0, 0, 0, 0, 0, 0, 0, 1]), vec![0x80, 0x80]);
        assert_eq!(pack_as_binary(&[0, 1, 0, 1, 0, 1, 0, 1]), vec![0x55]);
        assert_eq!(pack_as_binary(&[7, 0, 255]), vec![0xa0]);
        assert!(pack_as_binary(&[]).is_empty());
    }

    #[test]
    fn test_transpose_planes() {
        // Value i has only bit i set, so plane i holds only dimension i.
        let planes = transpose_half_byte(&[1, 2, 4, 8]);
        assert_eq!(planes, vec![0b1000_0000, 0b0100_0000, 0b0010_0000, 0b0001_0000]);

        let planes = transpose_half_byte(&[15; 9]);
        assert_eq!(planes.len(), 4 * packed_len(9));
        assert_eq!(planes, vec![0xff, 0x80, 0xff, 0x80, 0xff, 0x80, 0xff, 0x80]);
    }

    #[test]
    fn test_packed_len() {
        assert_eq!(packed_len(0), 0);
        assert_eq!(packed_len(1), 1);
        assert_eq!(packed_len(8), 1);
        assert_eq!(packed_len(9), 2);
    }

    proptest! {
        #[test]
        fn prop_packed_layouts_reproduce_the_dot_product(
            values in prop::collection::vec((0u8..2, 0u8..16), 0..300)
        ) {
            let (a, q): (Vec<u8>, Vec<u8>) = values.into_iter().unzip();
            let expected: i64 = a.iter().zip(&q).map(|(&x, &y)| x as i64 * y as i64).sum();
            let got = vec_dot_int1_int4(&pack_as_binary(&a), &transpose_half_byte(&q)).unwrap();
            prop_assert_eq!(got, expected);
        }
    }
}
