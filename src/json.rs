/**
 * This module holds the pieces shared by both codecs: the serde_json encoding path with its
 * formatter options, and the helpers which turn a decode failure into something a client can
 * act on (byte offsets, field paths, expected/got pairs).
 */
use serde::Serialize;
use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter};
use serde_json::Serializer;
use std::io;

/**
 * Knobs that change what the encoder writes, resolved once when a codec is built
 */
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct EncodeSettings {
    pub sort_map_keys: bool,
    pub escape_html: bool,
    pub trailing_newline: bool,
}

#[cfg(any(test, simd_codec))]
impl EncodeSettings {
    /**
     * True when no option alters the library's default compact output
     */
    pub fn is_plain(&self) -> bool {
        !self.sort_map_keys && !self.escape_html
    }
}

/**
 * Knobs that change how much of a body the decoder reads. By default only the first value is
 * decoded and anything after it is ignored, the way a streaming decoder behaves.
 */
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct DecodeSettings {
    pub disallow_trailing_data: bool,
}

/**
 * Encode the value with serde_json, pretty printing with `indent` when it is not empty
 */
pub(crate) fn encode<W, T>(
    mut writer: W,
    value: &T,
    indent: &str,
    settings: &EncodeSettings,
) -> Result<(), serde_json::Error>
where
    W: io::Write,
    T: Serialize + ?Sized,
{
    if settings.sort_map_keys {
        /*
         * serde_json::Value keeps its objects in a BTreeMap, so round tripping through it
         * puts every key in order
         */
        let sorted = serde_json::to_value(value)?;
        let settings = EncodeSettings {
            sort_map_keys: false,
            ..*settings
        };
        return encode(writer, &sorted, indent, &settings);
    }

    match (indent.is_empty(), settings.escape_html) {
        (true, false) => value.serialize(&mut Serializer::new(&mut writer))?,
        (true, true) => value.serialize(&mut Serializer::with_formatter(
            &mut writer,
            HtmlSafe(CompactFormatter),
        ))?,
        (false, false) => value.serialize(&mut Serializer::with_formatter(
            &mut writer,
            PrettyFormatter::with_indent(indent.as_bytes()),
        ))?,
        (false, true) => value.serialize(&mut Serializer::with_formatter(
            &mut writer,
            HtmlSafe(PrettyFormatter::with_indent(indent.as_bytes())),
        ))?,
    }

    finish(writer, settings).map_err(serde_json::Error::io)
}

/**
 * Write whatever has to follow a complete document
 */
pub(crate) fn finish<W: io::Write>(mut writer: W, settings: &EncodeSettings) -> io::Result<()> {
    if settings.trailing_newline {
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/**
 * Formatter wrapper which keeps `<`, `>` and `&` out of encoded strings so the output can be
 * embedded in HTML safely
 */
struct HtmlSafe<F>(F);

impl<F: Formatter> Formatter for HtmlSafe<F> {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (index, byte) in fragment.bytes().enumerate() {
            let escaped: &[u8] = match byte {
                b'<' => b"\\u003c",
                b'>' => b"\\u003e",
                b'&' => b"\\u0026",
                _ => continue,
            };
            // ASCII bytes are always on a char boundary
            writer.write_all(fragment[start..index].as_bytes())?;
            writer.write_all(escaped)?;
            start = index + 1;
        }
        writer.write_all(fragment[start..].as_bytes())
    }

    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.0.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.0.begin_object_key(writer, first)
    }

    fn end_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object_key(writer)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object_value(writer)
    }
}

/**
 * The details of a value which did not fit its target type
 */
#[derive(Debug, PartialEq)]
pub(crate) struct Mismatch {
    pub expected: String,
    pub got: String,
    pub field: String,
    pub offset: usize,
}

/**
 * Pull a Mismatch out of a serde_json data error, if that is what it describes
 */
pub(crate) fn mismatch_from_serde_json(buffer: &[u8], err: &serde_json::Error) -> Option<Mismatch> {
    if !err.is_data() {
        return None;
    }
    let (got, expected) = split_invalid(&err.to_string())?;
    let offset = offset_of(buffer, err.line(), err.column());

    Some(Mismatch {
        expected,
        got,
        field: field_at(buffer, offset),
        offset,
    })
}

/**
 * Split serde's "invalid type: X, expected Y" (or "invalid value: ...") message into (X, Y)
 */
pub(crate) fn split_invalid(message: &str) -> Option<(String, String)> {
    let message = strip_position(message);
    let rest = message
        .strip_prefix("invalid type: ")
        .or_else(|| message.strip_prefix("invalid value: "))?;
    let (got, expected) = rest.split_once(", expected ")?;
    Some((got.to_string(), expected.to_string()))
}

/**
 * serde_json appends " at line N column M" to its messages
 */
fn strip_position(message: &str) -> &str {
    match message.rfind(" at line ") {
        Some(index) => &message[..index],
        None => message,
    }
}

/**
 * Convert serde_json's one-based line and column into the number of bytes read before the
 * failure
 */
pub(crate) fn offset_of(buffer: &[u8], line: usize, column: usize) -> usize {
    if line == 0 {
        return 0;
    }

    let line_start = if line == 1 {
        0
    } else {
        buffer
            .iter()
            .enumerate()
            .filter(|(_, byte)| **byte == b'\n')
            .nth(line - 2)
            .map(|(index, _)| index + 1)
            .unwrap_or(buffer.len())
    };

    (line_start + column).min(buffer.len())
}

enum Frame {
    Object { key: Option<String>, awaiting_key: bool },
    Array { index: usize },
}

/**
 * Walk the raw JSON up to `offset` and return the path of the value being read at that point,
 * e.g. `user.age` or `items[2].id`. The root has an empty path.
 */
pub(crate) fn field_at(buffer: &[u8], offset: usize) -> String {
    let end = offset.min(buffer.len());
    let mut stack: Vec<Frame> = vec![];
    let mut position = 0;

    while position < end {
        match buffer[position] {
            b'{' => stack.push(Frame::Object {
                key: None,
                awaiting_key: true,
            }),
            b'[' => stack.push(Frame::Array { index: 0 }),
            b'}' | b']' => {
                stack.pop();
            }
            b',' => match stack.last_mut() {
                Some(Frame::Object { key, awaiting_key }) => {
                    *key = None;
                    *awaiting_key = true;
                }
                Some(Frame::Array { index }) => *index += 1,
                None => {}
            },
            b'"' => {
                let (string, next) = read_string(buffer, position + 1, end);
                if let Some(Frame::Object { key, awaiting_key }) = stack.last_mut() {
                    if *awaiting_key {
                        *key = Some(string);
                        *awaiting_key = false;
                    }
                }
                position = next;
                continue;
            }
            _ => {}
        }
        position += 1;
    }

    let mut path = String::new();
    for frame in stack.iter() {
        match frame {
            Frame::Object { key: Some(key), .. } => {
                if !path.is_empty() {
                    path.push('.');
                }
                path.push_str(key);
            }
            Frame::Object { key: None, .. } => {}
            Frame::Array { index } => path.push_str(&format!("[{}]", index)),
        }
    }
    path
}

/**
 * Read a string body starting just after its opening quote, returning its raw contents and
 * the position just past the closing quote
 */
fn read_string(buffer: &[u8], start: usize, end: usize) -> (String, usize) {
    let mut position = start;
    while position < end {
        match buffer[position] {
            b'\\' => position += 2,
            b'"' => {
                let raw = String::from_utf8_lossy(&buffer[start..position]).into_owned();
                return (raw, position + 1);
            }
            _ => position += 1,
        }
    }
    let raw = String::from_utf8_lossy(&buffer[start..end.min(buffer.len())]).into_owned();
    (raw, end)
}

/**
 * Find where the first top-level value of the buffer ends, including any leading whitespace.
 *
 * Returns None when the buffer holds no complete value, so the caller can hand the whole
 * buffer to the library and let it report what is wrong.
 */
#[cfg(any(test, simd_codec))]
pub(crate) fn first_value_end(buffer: &[u8]) -> Option<usize> {
    let start = buffer.iter().position(|byte| !byte.is_ascii_whitespace())?;
    let mut depth = 0usize;
    let mut position = start;

    while position < buffer.len() {
        match buffer[position] {
            b'"' => {
                position = string_end(buffer, position + 1)?;
                if depth == 0 {
                    return Some(position);
                }
                continue;
            }
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(position + 1);
                }
            }
            b',' | b':' if depth == 0 => {
                return Some(position.max(start + 1));
            }
            byte if depth == 0 && byte.is_ascii_whitespace() => return Some(position),
            _ => {}
        }
        position += 1;
    }

    // a bare scalar may run up to the end of the body, a container may not
    if depth == 0 {
        Some(buffer.len())
    } else {
        None
    }
}

/**
 * Return the position just past the closing quote of a string starting at `start`, or None
 * when the string never closes
 */
#[cfg(any(test, simd_codec))]
fn string_end(buffer: &[u8], start: usize) -> Option<usize> {
    let mut position = start;
    while position < buffer.len() {
        match buffer[position] {
            b'\\' => position += 2,
            b'"' => return Some(position + 1),
            _ => position += 1,
        }
    }
    None
}
