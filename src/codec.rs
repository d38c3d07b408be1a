/**
 * The codec module describes the contract every JSON codec in fj4tide satisfies
 */
use crate::errors::{DecodeError, EncodeError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{Read, Write};

/**
 * Identifies which JSON library does the work behind a codec
 */
#[derive(Clone, Copy, Debug, Display, Hash, PartialEq, Eq)]
pub enum SerializerType {
    #[strum(serialize = "serde_json")]
    SerdeJson,
    #[strum(serialize = "simd_json")]
    SimdJson,
}

/**
 * JsonCodec is implemented by each of the interchangeable JSON backends.
 *
 * Implementations are immutable once built, so a single codec can be shared by every request
 * handler without any locking.
 */
pub trait JsonCodec: Clone + Send + Sync + 'static {
    /**
     * Write the value as JSON to the writer.
     *
     * An empty `indent` produces the library's compact output, anything else pretty prints
     * with `indent` repeated once per nesting level.
     */
    fn serialize<W, T>(&self, writer: W, value: &T, indent: &str) -> Result<(), EncodeError>
    where
        W: Write,
        T: Serialize + ?Sized;

    /**
     * Read a JSON document from the reader and convert it into `T`
     */
    fn deserialize<R, T>(&self, reader: R) -> Result<T, DecodeError>
    where
        R: Read,
        T: DeserializeOwned;

    fn kind(&self) -> SerializerType;
}
