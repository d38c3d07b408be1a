/**
 * The portable codec, backed by serde_json. It is used on every platform where simd-json
 * cannot be.
 */
use crate::codec::{JsonCodec, SerializerType};
use crate::errors::{DecodeError, EncodeError, LibraryError};
use crate::json::{self, DecodeSettings, EncodeSettings};
use crate::settings::{Config, SerdeJsonConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::error::Category;
use std::io::{Read, Write};

pub fn new() -> SerdeJsonCodec {
    new_with_config(&Config::default())
}

pub fn new_with_config(config: &Config) -> SerdeJsonCodec {
    SerdeJsonCodec::from_config(&config.serde_json)
}

pub fn serializer_type() -> SerializerType {
    SerializerType::SerdeJson
}

/**
 * SerdeJsonCodec implements JSON encoding using serde_json
 */
#[derive(Clone, Debug, Default)]
pub struct SerdeJsonCodec {
    encode: EncodeSettings,
    decode: DecodeSettings,
}

impl SerdeJsonCodec {
    pub fn from_config(config: &SerdeJsonConfig) -> Self {
        SerdeJsonCodec {
            encode: config.encode_settings(),
            decode: config.decode_settings(),
        }
    }

    /**
     * Decode the first value of the buffer, or the whole buffer when trailing data is not
     * allowed
     */
    fn decode<T: DeserializeOwned>(&self, buffer: &[u8]) -> Result<T, serde_json::Error> {
        if !self.decode.disallow_trailing_data {
            let mut stream = serde_json::Deserializer::from_slice(buffer).into_iter::<T>();
            if let Some(result) = stream.next() {
                return result;
            }
        }
        // an empty body lands here too, where serde_json reports it as EOF
        serde_json::from_slice::<T>(buffer)
    }
}

impl JsonCodec for SerdeJsonCodec {
    fn serialize<W, T>(&self, writer: W, value: &T, indent: &str) -> Result<(), EncodeError>
    where
        W: Write,
        T: Serialize + ?Sized,
    {
        json::encode(writer, value, indent, &self.encode)?;
        Ok(())
    }

    fn deserialize<R, T>(&self, mut reader: R) -> Result<T, DecodeError>
    where
        R: Read,
        T: DeserializeOwned,
    {
        let mut buffer = vec![];
        reader
            .read_to_end(&mut buffer)
            .map_err(|e| DecodeError::Other(LibraryError::Io(e)))?;

        self.decode(&buffer).map_err(|err| classify(&buffer, err))
    }

    fn kind(&self) -> SerializerType {
        SerializerType::SerdeJson
    }
}

/**
 * Turn a serde_json failure into the matching DecodeError
 */
fn classify(buffer: &[u8], err: serde_json::Error) -> DecodeError {
    match err.classify() {
        Category::Syntax => DecodeError::Syntax {
            offset: json::offset_of(buffer, err.line(), err.column()),
            source: err.into(),
        },
        Category::Data => match json::mismatch_from_serde_json(buffer, &err) {
            Some(mismatch) => DecodeError::TypeMismatch {
                expected: mismatch.expected,
                got: mismatch.got,
                field: mismatch.field,
                offset: mismatch.offset,
                source: err.into(),
            },
            None => DecodeError::Other(err.into()),
        },
        Category::Io | Category::Eof => DecodeError::Other(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{DecodeOption, EncodeOption};
    use std::collections::BTreeMap;

    #[derive(Debug, Deserialize, PartialEq, Serialize)]
    struct User {
        name: String,
        age: u32,
        tags: Vec<String>,
    }

    fn encode<T: Serialize>(codec: &SerdeJsonCodec, value: &T, indent: &str) -> String {
        let mut buffer = vec![];
        codec
            .serialize(&mut buffer, value, indent)
            .expect("Failed to serialize");
        String::from_utf8(buffer).expect("Output was not UTF-8")
    }

    #[test]
    fn test_kind() {
        assert_eq!(SerializerType::SerdeJson, new().kind());
        assert_eq!(SerializerType::SerdeJson, serializer_type());
    }

    #[test]
    fn test_serialize_compact_matches_serde_json() {
        let user = User {
            name: "bob".into(),
            age: 42,
            tags: vec!["admin".into()],
        };
        assert_eq!(
            serde_json::to_string(&user).unwrap(),
            encode(&new(), &user, "")
        );
    }

    #[test]
    fn test_serialize_indented() {
        let mut map = BTreeMap::new();
        map.insert("a", 1);
        assert_eq!("{\n  \"a\": 1\n}", encode(&new(), &map, "  "));
    }

    #[test]
    fn test_serialize_with_options() {
        let config = Config {
            serde_json: SerdeJsonConfig {
                encode_options: vec![EncodeOption::EscapeHtml, EncodeOption::TrailingNewline],
                decode_options: vec![],
            },
            ..Default::default()
        };
        let codec = new_with_config(&config);
        assert_eq!("\"\\u003cp\\u003e\"\n", encode(&codec, &"<p>", ""));
    }

    #[test]
    fn test_round_trip() {
        let codec = new();
        let user = User {
            name: "alice".into(),
            age: 7,
            tags: vec!["a".into(), "b".into()],
        };
        let mut buffer = vec![];
        codec.serialize(&mut buffer, &user, "\t").unwrap();
        let decoded: User = codec.deserialize(buffer.as_slice()).unwrap();
        assert_eq!(user, decoded);
    }

    #[test]
    fn test_syntax_error_offset() {
        let err = new()
            .deserialize::<_, serde_json::Value>(&br#"{"a": }"#[..])
            .unwrap_err();
        match &err {
            DecodeError::Syntax { offset, .. } => assert_eq!(7, *offset),
            other => panic!("Expected a syntax error, got {:?}", other),
        }
        assert!(err.to_string().starts_with("Syntax error: offset=7, error="));
    }

    #[test]
    fn test_type_mismatch() {
        let body = br#"{"name":"bob","age":"x","tags":[]}"#;
        let err = new().deserialize::<_, User>(&body[..]).unwrap_err();
        match &err {
            DecodeError::TypeMismatch {
                expected,
                got,
                field,
                ..
            } => {
                assert_eq!("u32", expected);
                assert_eq!("string \"x\"", got);
                assert_eq!("age", field);
            }
            other => panic!("Expected a type mismatch, got {:?}", other),
        }
        assert!(err.to_string().contains("field=age"));
    }

    #[test]
    fn test_type_mismatch_in_array() {
        let body = br#"{"name":"bob","age":1,"tags":["ok",false]}"#;
        let err = new().deserialize::<_, User>(&body[..]).unwrap_err();
        match err {
            DecodeError::TypeMismatch { field, got, .. } => {
                assert_eq!("tags[1]", field);
                assert_eq!("boolean `false`", got);
            }
            other => panic!("Expected a type mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_body_passes_through() {
        let err = new().deserialize::<_, User>(&b""[..]).unwrap_err();
        assert!(matches!(err, DecodeError::Other(LibraryError::SerdeJson(_))));
    }

    #[test]
    fn test_truncated_body_passes_through() {
        let err = new()
            .deserialize::<_, serde_json::Value>(&br#"{"a":"#[..])
            .unwrap_err();
        assert!(!err.is_reclassified());
    }

    #[test]
    fn test_missing_field_passes_through() {
        let err = new()
            .deserialize::<_, User>(&br#"{"name":"bob"}"#[..])
            .unwrap_err();
        assert!(!err.is_reclassified());
        assert!(err.to_string().contains("missing field"));
    }

    #[test]
    fn test_trailing_data_is_ignored() {
        let value: serde_json::Value = new()
            .deserialize(&br#"{"a":1} {"b":2}"#[..])
            .expect("Failed to decode the first value");
        assert_eq!(serde_json::json!({"a": 1}), value);
    }

    #[test]
    fn test_trailing_data_disallowed() {
        let config = Config {
            serde_json: SerdeJsonConfig {
                encode_options: vec![],
                decode_options: vec![DecodeOption::DisallowTrailingData],
            },
            ..Default::default()
        };
        let codec = new_with_config(&config);
        let err = codec
            .deserialize::<_, serde_json::Value>(&br#"{"a":1} {"b":2}"#[..])
            .unwrap_err();
        assert!(matches!(err, DecodeError::Syntax { .. }));

        let value: serde_json::Value = codec
            .deserialize(&b"{\"a\":1}\n"[..])
            .expect("Trailing whitespace is not data");
        assert_eq!(serde_json::json!({"a": 1}), value);
    }

    #[test]
    fn test_whitespace_then_garbage() {
        let err = new()
            .deserialize::<_, serde_json::Value>(&b"  x"[..])
            .unwrap_err();
        assert_eq!(Some(3), err.offset());
    }

    #[test]
    fn test_instances_are_independent() {
        let first = new();
        let second = new();
        assert_eq!(encode(&first, &vec![1, 2], ""), encode(&second, &vec![1, 2], ""));
    }
}
