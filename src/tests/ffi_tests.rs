// SPDX-License-Identifier: Apache-2.0

#[cfg(test)]
mod tests {
    use std::ptr;
    use std::slice;

    use crate::constants::{JSON_PADDING, QUERY_BIT_PLANES};
    use crate::dispatch;
    use crate::ffi::*;
    use crate::test_utils::fixture_bytes;
    use crate::types::Token;

    fn padded(json: &str) -> Vec<u8> {
        let mut buf = json.as_bytes().to_vec();
        buf.resize(json.len() + JSON_PADDING, 0);
        buf
    }

    unsafe fn text(p: *const u8, len: usize) -> String {
        assert!(!p.is_null());
        String::from_utf8(slice::from_raw_parts(p, len).to_vec()).unwrap()
    }

    #[test]
    fn test_tokenizer_round_trip() {
        let json = r#"{"name":"a\tb","n":-7,"x":2.5,"ok":true,"nil":null}"#;
        let buf = padded(json);
        unsafe {
            let factory = create_parser_factory();
            let parser = create_parser(factory, buf.as_ptr(), json.len(), buf.len());
            assert!(!parser.is_null());

            let mut size = 0usize;
            assert_eq!(next_token(parser), Token::StartObject.code());
            assert_eq!(next_token(parser), Token::FieldName.code());
            assert_eq!(text(current_name(parser, &mut size), size), "name");
            assert_eq!(next_token(parser), Token::ValueString.code());
            assert_eq!(text(string_value(parser, &mut size), size), "a\tb");

            assert_eq!(next_token(parser), Token::FieldName.code());
            assert_eq!(next_token(parser), Token::ValueNumber.code());
            assert_eq!(long_value(parser), -7);

            assert_eq!(next_token(parser), Token::FieldName.code());
            assert_eq!(next_token(parser), Token::ValueNumber.code());
            assert_eq!(double_value(parser), 2.5);

            assert_eq!(next_token(parser), Token::FieldName.code());
            assert_eq!(next_token(parser), Token::ValueBoolean.code());
            assert_eq!(boolean_value(parser), 1);

            assert_eq!(next_token(parser), Token::FieldName.code());
            assert_eq!(text(current_name(parser, &mut size), size), "nil");
            assert_eq!(next_token(parser), Token::ValueNull.code());
            assert_eq!(next_token(parser), Token::EndObject.code());
            assert_eq!(next_token(parser), Token::End.code());
            assert_eq!(next_token(parser), Token::End.code());
            assert!(parser_last_error(parser, &mut size).is_null());
            assert_eq!(size, 0);

            delete_parser(parser);
            delete_parser_factory(factory);
        }
    }

    #[test]
    fn test_parser_errors() {
        let json = "[1 2]";
        let buf = padded(json);
        unsafe {
            let factory = create_parser_factory();
            let parser = create_parser(factory, buf.as_ptr(), json.len(), buf.len());
            assert_eq!(next_token(parser), Token::StartArray.code());
            assert_eq!(next_token(parser), Token::ValueNumber.code());
            assert_eq!(next_token(parser), Token::Error.code());
            let mut size = 0usize;
            let msg = parser_last_error(parser, &mut size);
            assert_eq!(text(msg, size), "Missing comma between array values");
            delete_parser(parser);
            delete_parser_factory(factory);
        }
    }

    #[test]
    fn test_create_parser_without_padding() {
        let json = "[1]";
        let buf = json.as_bytes().to_vec();
        unsafe {
            let factory = create_parser_factory();
            let mut size = 0usize;
            assert!(factory_last_error(factory, &mut size).is_null());

            let parser = create_parser(factory, buf.as_ptr(), json.len(), buf.len());
            assert!(parser.is_null());
            let msg = text(factory_last_error(factory, &mut size), size);
            assert!(msg.contains("padding"), "{}", msg);

            // A later success clears the message.
            let good = padded(json);
            let parser = create_parser(factory, good.as_ptr(), json.len(), good.len());
            assert!(!parser.is_null());
            assert!(factory_last_error(factory, &mut size).is_null());
            delete_parser(parser);
            delete_parser_factory(factory);
        }
    }

    #[test]
    fn test_null_handles() {
        unsafe {
            let mut size = 5usize;
            assert!(create_parser(ptr::null_mut(), ptr::null(), 0, 0).is_null());
            assert_eq!(next_token(ptr::null_mut()), Token::Error.code());
            assert!(current_name(ptr::null_mut(), &mut size).is_null());
            assert_eq!(size, 0);
            assert_eq!(long_value(ptr::null_mut()), 0);
            assert_eq!(boolean_value(ptr::null_mut()), 0);
            delete_parser(ptr::null_mut());
            delete_parser_factory(ptr::null_mut());
        }
    }

    #[test]
    fn test_vector_abi_matches_safe_api() {
        assert_eq!(vec_caps(), dispatch::vec_caps());
        assert_eq!(dot8s_stride() as usize, dispatch::dot8s_stride());
        assert_eq!(sqr8s_stride() as usize, dispatch::sqr8s_stride());

        let dims = 77;
        let a: Vec<i8> = fixture_bytes(1, dims).into_iter().map(|b| b as i8).collect();
        let b: Vec<i8> = fixture_bytes(2, dims).into_iter().map(|b| b as i8).collect();
        unsafe {
            assert_eq!(
                dot8s(a.as_ptr(), b.as_ptr(), dims as i32),
                dispatch::dot8s(&a, &b).unwrap()
            );
            assert_eq!(
                sqr8s(a.as_ptr(), b.as_ptr(), dims as i32),
                dispatch::sqr8s(&a, &b).unwrap()
            );
            assert_eq!(dot8s(ptr::null(), ptr::null(), 0), 0);
        }

        let length = 45;
        let count = 6;
        let arena = fixture_bytes(3, length * count);
        let query = fixture_bytes(4, QUERY_BIT_PLANES * length);
        unsafe {
            assert_eq!(
                vec_dot_int1_int4(arena.as_ptr(), query.as_ptr(), length as i32),
                dispatch::vec_dot_int1_int4(&arena[..length], &query).unwrap()
            );

            let mut ffi_results = vec![0.0f32; count];
            let mut safe_results = vec![0.0f32; count];
            vec_dot_int1_int4_bulk(
                arena.as_ptr(),
                query.as_ptr(),
                length as i32,
                count as i32,
                ffi_results.as_mut_ptr(),
            );
            dispatch::vec_dot_int1_int4_bulk(&arena, &query, length, &mut safe_results).unwrap();
            assert_eq!(ffi_results, safe_results);

            let offsets = [5i32, 2, 2, 0, 4];
            let mut ffi_results = vec![0.0f32; offsets.len()];
            let mut safe_results = vec![0.0f32; offsets.len()];
            vec_dot_int1_int4_bulk_offsets(
                arena.as_ptr(),
                query.as_ptr(),
                length as i32,
                length as i32,
                offsets.as_ptr(),
                offsets.len() as i32,
                ffi_results.as_mut_ptr(),
            );
            dispatch::vec_dot_int1_int4_bulk_offsets(
                &arena,
                &query,
                length,
                length,
                &offsets,
                &mut safe_results,
            )
            .unwrap();
            assert_eq!(ffi_results, safe_results);
        }
    }
}
