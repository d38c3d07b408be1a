/*!
 * fj4tide provides fast JSON codecs for request and response bodies in tide.
 *
 * Exactly one codec is compiled in: simd-json on x86_64 linux, windows and macos when the
 * `simd` feature is enabled, serde_json everywhere else. Both expose the same functions, so
 * calling code never needs to know which one it got:
 *
 * ```ignore
 * use fj4tide::JsonCodec;
 *
 * let codec = fj4tide::new();
 * let mut out = vec![];
 * codec.serialize(&mut out, &vec![1, 2, 3], "  ")?;
 * println!("encoded with {}", fj4tide::serializer_type());
 * ```
 */
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate strum_macros;

pub mod codec;
pub mod errors;
pub mod http;
mod json;
pub mod settings;

// compiled into test builds everywhere so its tests run on simd-json targets too
#[cfg(any(test, not(simd_codec)))]
#[cfg_attr(all(test, simd_codec), allow(dead_code))]
mod serde_codec;
#[cfg(simd_codec)]
mod simd_codec;

pub use codec::{JsonCodec, SerializerType};
pub use errors::{DecodeError, EncodeError, LibraryError};
pub use settings::{Config, DecodeOption, EncodeOption, Profile, SerdeJsonConfig, SimdJsonConfig};

#[cfg(not(simd_codec))]
pub use serde_codec::{new, new_with_config, serializer_type, SerdeJsonCodec};
#[cfg(not(simd_codec))]
pub type Codec = SerdeJsonCodec;

#[cfg(simd_codec)]
pub use simd_codec::{new, new_with_config, serializer_type, SimdJsonCodec};
#[cfg(simd_codec)]
pub type Codec = SimdJsonCodec;
