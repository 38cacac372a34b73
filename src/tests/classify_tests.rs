// SPDX-License-Identifier: Apache-2.0

#[cfg(test)]
mod tests {
    use crate::classify::classify_value_start;
    use crate::types::Token;

    #[test]
    fn test_value_start_bytes() {
        assert_eq!(classify_value_start(b'"'), Some(Token::ValueString));
        assert_eq!(classify_value_start(b'-'), Some(Token::ValueNumber));
        for d in b'0'..=b'9' {
            assert_eq!(classify_value_start(d), Some(Token::ValueNumber), "digit {}", d as char);
        }
        assert_eq!(classify_value_start(b'{'), Some(Token::StartObject));
        assert_eq!(classify_value_start(b'['), Some(Token::StartArray));
        assert_eq!(classify_value_start(b't'), Some(Token::ValueBoolean));
        assert_eq!(classify_value_start(b'f'), Some(Token::ValueBoolean));
        assert_eq!(classify_value_start(b'n'), Some(Token::ValueNull));
    }

    #[test]
    fn test_everything_else_is_unrecognized() {
        let starts = b"\"-0123456789{[tfn";
        for b in 0..=255u8 {
            if !starts.contains(&b) {
                assert_eq!(classify_value_start(b), None, "byte {:#04x}", b);
            }
        }
    }

    #[test]
    fn test_closers_and_separators_do_not_start_values() {
        for &b in b"}],: +.eNT" {
            assert_eq!(classify_value_start(b), None, "byte {}", b as char);
        }
    }
}
