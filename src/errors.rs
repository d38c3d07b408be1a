/**
 * This module only contains the expected errors emitted from the fj4tide codecs
 */
use thiserror::Error;

/**
 * The untouched error from whichever JSON library did the work
 */
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    #[cfg(simd_codec)]
    #[error(transparent)]
    SimdJson(#[from] simd_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/**
 * Encoding failures are never the client's fault, so they are handed back exactly as the
 * library produced them
 */
#[derive(Debug, Error)]
#[error(transparent)]
pub struct EncodeError(#[from] pub LibraryError);

impl From<serde_json::Error> for EncodeError {
    fn from(err: serde_json::Error) -> EncodeError {
        EncodeError(LibraryError::SerdeJson(err))
    }
}

#[cfg(simd_codec)]
impl From<simd_json::Error> for EncodeError {
    fn from(err: simd_json::Error) -> EncodeError {
        EncodeError(LibraryError::SimdJson(err))
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    /**
     * The body was valid JSON, but a value did not fit the type it was decoded into
     */
    #[error("Unmarshal type error: expected={expected}, got={got}, field={field}, offset={offset}")]
    TypeMismatch {
        expected: String,
        got: String,
        /// Dotted path to the offending value, e.g. `items[2].id`. Empty at the root.
        field: String,
        offset: usize,
        #[source]
        source: LibraryError,
    },
    /**
     * The body was not valid JSON
     */
    #[error("Syntax error: offset={offset}, error={source}")]
    Syntax {
        offset: usize,
        #[source]
        source: LibraryError,
    },
    /**
     * Anything the codecs do not recognize, including an empty body, is passed along as is
     */
    #[error(transparent)]
    Other(#[from] LibraryError),
}

impl DecodeError {
    /**
     * Returns the byte offset of the failure for the reclassified errors
     */
    pub fn offset(&self) -> Option<usize> {
        match self {
            DecodeError::TypeMismatch { offset, .. } | DecodeError::Syntax { offset, .. } => {
                Some(*offset)
            }
            DecodeError::Other(_) => None,
        }
    }

    /**
     * True when the library error was rewritten into a diagnostic, false when it is passed
     * along untouched
     */
    pub fn is_reclassified(&self) -> bool {
        !matches!(self, DecodeError::Other(_))
    }
}
