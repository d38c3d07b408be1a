/**
 * The accelerated codec, backed by simd-json. It is only compiled in on x86_64 for linux,
 * windows and macos.
 */
use crate::codec::{JsonCodec, SerializerType};
use crate::errors::{DecodeError, EncodeError, LibraryError};
use crate::json;
use crate::settings::{Config, Profile};
use serde::de::DeserializeOwned;
use serde::Serialize;
use simd_json::ErrorType;
use std::io::{self, Read, Write};

pub fn new() -> SimdJsonCodec {
    new_with_config(&Config::default())
}

pub fn new_with_config(config: &Config) -> SimdJsonCodec {
    SimdJsonCodec {
        profile: config.simd_json.freeze(),
    }
}

pub fn serializer_type() -> SerializerType {
    SerializerType::SimdJson
}

/**
 * SimdJsonCodec implements JSON encoding using simd-json, with its behavior fixed by the
 * profile it was built with
 */
#[derive(Clone, Debug, Default)]
pub struct SimdJsonCodec {
    profile: Profile,
}

impl SimdJsonCodec {
    pub fn with_profile(profile: Profile) -> Self {
        SimdJsonCodec { profile }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }
}

impl JsonCodec for SimdJsonCodec {
    fn serialize<W, T>(&self, mut writer: W, value: &T, indent: &str) -> Result<(), EncodeError>
    where
        W: Write,
        T: Serialize + ?Sized,
    {
        let settings = self.profile.encode_settings();

        /*
         * simd-json only knows one way to pretty print, so anything beyond its plain compact
         * output is written through serde_json's formatters
         */
        if !indent.is_empty() || !settings.is_plain() {
            json::encode(writer, value, indent, settings)?;
            return Ok(());
        }

        simd_json::serde::to_writer(&mut writer, value)?;
        json::finish(writer, settings).map_err(LibraryError::Io)?;
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

        if buffer.iter().all(|byte| byte.is_ascii_whitespace()) {
            return Err(DecodeError::Other(LibraryError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "EOF while parsing a value",
            ))));
        }

        /*
         * Only the first value is handed to simd-json unless trailing data is disallowed. An
         * incomplete value goes through whole so the library can say what is missing.
         */
        let end = if self.profile.decode_settings().disallow_trailing_data {
            buffer.len()
        } else {
            json::first_value_end(&buffer).unwrap_or(buffer.len())
        };
        let body = &buffer[..end];

        // simd-json rewrites its input, the original is needed for error reporting
        let mut scratch = body.to_vec();
        simd_json::serde::from_slice::<T>(&mut scratch).map_err(|err| classify::<T>(body, err))
    }

    fn kind(&self) -> SerializerType {
        SerializerType::SimdJson
    }
}

/**
 * Turn a simd-json failure into the matching DecodeError
 */
fn classify<T: DeserializeOwned>(buffer: &[u8], err: simd_json::Error) -> DecodeError {
    if matches!(err.error(), ErrorType::Eof) {
        return DecodeError::Other(err.into());
    }

    /*
     * simd-json does not track where a serde visitor rejected a value, so serde_json is asked
     * to find the same failure in the untouched input. This only ever runs on the error path.
     */
    if let Err(located) = serde_json::from_slice::<T>(buffer) {
        // simd-json reports a truncated body as a syntax error at the last byte it saw
        if located.is_eof() {
            return DecodeError::Other(err.into());
        }
        if let Some(mismatch) = json::mismatch_from_serde_json(buffer, &located) {
            return DecodeError::TypeMismatch {
                expected: mismatch.expected,
                got: mismatch.got,
                field: mismatch.field,
                offset: mismatch.offset,
                source: err.into(),
            };
        }
        if located.is_syntax() {
            return DecodeError::Syntax {
                offset: json::offset_of(buffer, located.line(), located.column()),
                source: err.into(),
            };
        }
    }

    let message = match err.error() {
        ErrorType::Serde(message) => Some(message.clone()),
        _ => None,
    };
    let offset = err.index();

    match message {
        Some(message) => match json::split_invalid(&message) {
            Some((got, expected)) => DecodeError::TypeMismatch {
                expected,
                got,
                field: json::field_at(buffer, offset),
                offset,
                source: err.into(),
            },
            None => DecodeError::Other(err.into()),
        },
        None => DecodeError::Syntax {
            offset,
            source: err.into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SimdJsonConfig;
    use std::collections::BTreeMap;

    #[derive(Debug, Deserialize, PartialEq, Serialize)]
    struct User {
        name: String,
        age: u32,
        tags: Vec<String>,
    }

    fn encode<T: Serialize>(codec: &SimdJsonCodec, value: &T, indent: &str) -> String {
        let mut buffer = vec![];
        codec
            .serialize(&mut buffer, value, indent)
            .expect("Failed to serialize");
        String::from_utf8(buffer).expect("Output was not UTF-8")
    }

    #[test]
    fn test_kind() {
        assert_eq!(SerializerType::SimdJson, new().kind());
        assert_eq!(SerializerType::SimdJson, serializer_type());
    }

    #[test]
    fn test_serialize_compact() {
        let mut map = BTreeMap::new();
        map.insert("a", 1);
        assert_eq!(r#"{"a":1}"#, encode(&new(), &map, ""));
    }

    #[test]
    fn test_serialize_indented() {
        let mut map = BTreeMap::new();
        map.insert("a", 1);
        assert_eq!("{\n  \"a\": 1\n}", encode(&new(), &map, "  "));
    }

    #[test]
    fn test_profile_is_applied() {
        let config = Config {
            simd_json: SimdJsonConfig::default()
                .escape_html(true)
                .trailing_newline(true),
            ..Default::default()
        };
        let codec = new_with_config(&config);
        assert_eq!(&config.simd_json.freeze(), codec.profile());
        assert_eq!("\"\\u0026\"\n", encode(&codec, &"&", ""));
    }

    #[test]
    fn test_trailing_newline_on_plain_output() {
        let profile = SimdJsonConfig::default().trailing_newline(true).freeze();
        let codec = SimdJsonCodec::with_profile(profile);
        assert_eq!("[1,2]\n", encode(&codec, &vec![1, 2], ""));
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
        codec.serialize(&mut buffer, &user, "").unwrap();
        let decoded: User = codec.deserialize(buffer.as_slice()).unwrap();
        assert_eq!(user, decoded);
    }

    #[test]
    fn test_syntax_error() {
        let err = new()
            .deserialize::<_, serde_json::Value>(&br#"{"a": }"#[..])
            .unwrap_err();
        assert!(matches!(err, DecodeError::Syntax { .. }));
        assert_eq!(Some(7), err.offset());
        assert!(err.to_string().starts_with("Syntax error: offset=7, error="));
    }

    #[test]
    fn test_truncated_body_passes_through() {
        let err = new()
            .deserialize::<_, serde_json::Value>(&br#"{"a":"#[..])
            .unwrap_err();
        assert!(!err.is_reclassified());
        assert!(matches!(err, DecodeError::Other(LibraryError::SimdJson(_))));
    }

    #[test]
    fn test_whitespace_then_garbage() {
        let err = new()
            .deserialize::<_, serde_json::Value>(&b"  x"[..])
            .unwrap_err();
        assert!(matches!(err, DecodeError::Syntax { .. }));
        assert_eq!(Some(3), err.offset());
    }

    #[test]
    fn test_trailing_data_is_ignored() {
        let value: serde_json::Value = new()
            .deserialize(&br#"{"a":1} {"b":2}"#[..])
            .expect("Failed to decode the first value");
        assert_eq!(serde_json::json!({"a": 1}), value);

        let number: u32 = new()
            .deserialize(&b" 42 garbage"[..])
            .expect("Failed to decode the first value");
        assert_eq!(42, number);
    }

    #[test]
    fn test_trailing_data_disallowed() {
        let profile = SimdJsonConfig::default()
            .disallow_trailing_data(true)
            .freeze();
        let codec = SimdJsonCodec::with_profile(profile);
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
    fn test_type_mismatch() {
        let body = br#"{"name":"bob","age":"x","tags":[]}"#;
        let err = new().deserialize::<_, User>(&body[..]).unwrap_err();
        match &err {
            DecodeError::TypeMismatch {
                expected, field, ..
            } => {
                assert_eq!("u32", expected);
                assert_eq!("age", field);
            }
            other => panic!("Expected a type mismatch, got {:?}", other),
        }
        assert!(matches!(
            err,
            DecodeError::TypeMismatch {
                source: LibraryError::SimdJson(_),
                ..
            }
        ));
    }

    #[test]
    fn test_empty_body_passes_through() {
        let err = new().deserialize::<_, User>(&b"  "[..]).unwrap_err();
        assert!(matches!(err, DecodeError::Other(LibraryError::Io(_))));
    }
}
