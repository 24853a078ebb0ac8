use token::{decode_stream, encode_value, Token, TokenResult, Value};

fn single_token(bytes: &[u8]) -> Token<'_> {
    let tokens = decode_stream(bytes)
        .collect::<TokenResult<Vec<_>>>()
        .unwrap();
    assert_eq!(tokens.len(), 1, "expected exactly one token in {bytes:02X?}");
    tokens[0]
}

#[test]
fn integer_boundaries_roundtrip() {
    let cases = [
        (0u64, 1usize),
        (63, 1),
        (64, 2),
        (0xFFFF, 3),
        (0xFFFF_FFFF, 5),
        (u64::MAX, 9),
    ];
    for (value, encoded_len) in cases {
        let bytes = encode_value(&Value::Uint(value)).unwrap();
        assert_eq!(bytes.len(), encoded_len, "encoded length of {value}");
        assert_eq!(single_token(&bytes), Token::Uint(value));
    }
}

#[test]
fn byte_string_boundaries_roundtrip() {
    for (len, header_len) in [(0usize, 1usize), (1, 1), (15, 1), (16, 2), (256, 2), (4096, 4)] {
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let bytes = encode_value(&Value::Bytes(data.clone())).unwrap();
        assert_eq!(bytes.len(), len + header_len, "encoded length for {len} bytes");
        assert_eq!(single_token(&bytes), Token::Bytes(&data));
    }
}

#[test]
fn boolean_roundtrip() {
    for flag in [false, true] {
        let bytes = encode_value(&Value::from(flag)).unwrap();
        assert_eq!(single_token(&bytes), Token::Uint(u64::from(flag)));
    }
}

#[test]
fn uid_atom_roundtrip() {
    let uid = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF];
    let bytes = encode_value(&Value::from(uid)).unwrap();
    assert_eq!(bytes[0], 0xA8);
    assert_eq!(single_token(&bytes), Token::Bytes(&uid));
}

#[test]
fn nested_tree_roundtrip() {
    let value = Value::List(vec![
        Value::named(1u8, Value::List(vec![Value::named(3u8, b"secret".to_vec())])),
        Value::List(vec![]),
        Value::Uint(0x06_0000),
    ]);
    let bytes = encode_value(&value).unwrap();
    let mut reader = decode_stream(&bytes);
    assert_eq!(reader.read_value().unwrap(), value);
    assert!(reader.is_empty());
}
