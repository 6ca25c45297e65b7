use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{FurError, FurResult};

use super::{
    list_len_guard, wrong_direction, Codec, Direction, ExternalFileStore, TagWidth, TypeTag,
    ValidationMode,
};

/// Key-addressed codec over an in-memory JSON value tree.
///
/// Objects are string-keyed maps; lists are arrays whose elements are
/// consumed and appended positionally with keys ignored, which makes the
/// array frames the order-addressed companion of the object frames.
///
/// Deliberate divergences from the binary wire that decoders must mirror:
/// closed-set tags and type tags are symbolic names; empty strings are
/// never written and read back as "" on absence; byte blobs inline as
/// lowercase hex unless an [`ExternalFileStore`] claims them; an all-zero
/// identifier serializes as `null` when the null-id escape is enabled.
pub struct TreeCodec {
    frames: Vec<Frame>,
    direction: Direction,
    version: u8,
    validation: ValidationMode,
    null_ids: bool,
    externals: Option<Box<dyn ExternalFileStore>>,
}

enum Frame {
    Object {
        key: String,
        map: Map<String, Value>,
    },
    Array {
        key: String,
        items: Vec<Value>,
        cursor: usize,
    },
}

impl TreeCodec {
    pub fn for_writing(version: u8, validation: ValidationMode) -> Self {
        Self {
            frames: vec![Frame::Object {
                key: String::new(),
                map: Map::new(),
            }],
            direction: Direction::Write,
            version,
            validation,
            null_ids: false,
            externals: None,
        }
    }

    /// Starts reading from `root`, which must be a JSON object.
    pub fn for_reading(root: Value, version: u8, validation: ValidationMode) -> FurResult<Self> {
        let Value::Object(map) = root else {
            return Err(FurError::Malformed(
                "structured document root is not an object".to_string(),
            ));
        };
        Ok(Self {
            frames: vec![Frame::Object {
                key: String::new(),
                map,
            }],
            direction: Direction::Read,
            version,
            validation,
            null_ids: false,
            externals: None,
        })
    }

    /// Enables the escape that serializes the all-zero identifier as an
    /// explicit `null` marker instead of its string form.
    pub fn with_null_ids(mut self, enabled: bool) -> Self {
        self.null_ids = enabled;
        self
    }

    pub fn with_external_store(mut self, store: Box<dyn ExternalFileStore>) -> Self {
        self.externals = Some(store);
        self
    }

    /// Finishes a write and returns the document root. Fails if any
    /// nested frame was left open.
    pub fn into_value(mut self) -> FurResult<Value> {
        if self.frames.len() != 1 {
            return Err(FurError::Usage(
                "structured write finished with unclosed nested frames".to_string(),
            ));
        }
        match self.frames.pop() {
            Some(Frame::Object { map, .. }) => Ok(Value::Object(map)),
            _ => Err(FurError::Usage(
                "structured write finished without a root object".to_string(),
            )),
        }
    }

    fn writer(&self) -> FurResult<()> {
        if self.direction == Direction::Write {
            Ok(())
        } else {
            Err(wrong_direction(self.direction))
        }
    }

    fn reader(&self) -> FurResult<()> {
        if self.direction == Direction::Read {
            Ok(())
        } else {
            Err(wrong_direction(self.direction))
        }
    }

    fn top(&mut self) -> FurResult<&mut Frame> {
        self.frames
            .last_mut()
            .ok_or_else(|| FurError::Usage("codec frame stack is empty".to_string()))
    }

    /// Stores `value` under `key` in an object frame, or appends it to an
    /// array frame (keys carry no meaning inside arrays).
    fn put(&mut self, key: &str, value: Value) -> FurResult<()> {
        self.writer()?;
        match self.top()? {
            Frame::Object { map, .. } => {
                map.insert(key.to_string(), value);
            }
            Frame::Array { items, .. } => items.push(value),
        }
        Ok(())
    }

    /// Takes the value for `key` from an object frame (`None` when the
    /// key is absent), or consumes the next array element.
    fn take(&mut self, key: &str) -> FurResult<Option<Value>> {
        self.reader()?;
        match self.top()? {
            Frame::Object { map, .. } => Ok(map.remove(key)),
            Frame::Array { items, cursor, .. } => {
                let Some(slot) = items.get_mut(*cursor) else {
                    return Err(FurError::Malformed(format!(
                        "array exhausted while reading '{key}'"
                    )));
                };
                *cursor += 1;
                Ok(Some(slot.take()))
            }
        }
    }

    fn require(&mut self, key: &str) -> FurResult<Value> {
        self.take(key)?.ok_or_else(|| missing_key(key))
    }

    fn require_i64(&mut self, key: &str) -> FurResult<i64> {
        match self.require(key)? {
            Value::Number(number) => number
                .as_i64()
                .ok_or_else(|| type_mismatch(key, "an integer")),
            _ => Err(type_mismatch(key, "an integer")),
        }
    }

    fn require_f64(&mut self, key: &str) -> FurResult<f64> {
        match self.require(key)? {
            Value::Number(number) => number
                .as_f64()
                .ok_or_else(|| type_mismatch(key, "a number")),
            _ => Err(type_mismatch(key, "a number")),
        }
    }

    fn require_string(&mut self, key: &str) -> FurResult<String> {
        match self.require(key)? {
            Value::String(text) => Ok(text),
            _ => Err(type_mismatch(key, "a string")),
        }
    }
}

impl Codec for TreeCodec {
    fn direction(&self) -> Direction {
        self.direction
    }

    fn format_version(&self) -> u8 {
        self.version
    }

    fn validation(&self) -> ValidationMode {
        self.validation
    }

    fn write_bool(&mut self, key: &str, value: bool) -> FurResult<()> {
        self.put(key, Value::Bool(value))
    }

    fn write_u8(&mut self, key: &str, value: u8) -> FurResult<()> {
        self.put(key, Value::from(value))
    }

    fn write_i16(&mut self, key: &str, value: i16) -> FurResult<()> {
        self.put(key, Value::from(value))
    }

    fn write_i32(&mut self, key: &str, value: i32) -> FurResult<()> {
        self.put(key, Value::from(value))
    }

    fn write_u32(&mut self, key: &str, value: u32) -> FurResult<()> {
        self.put(key, Value::from(value))
    }

    fn write_i64(&mut self, key: &str, value: i64) -> FurResult<()> {
        self.put(key, Value::from(value))
    }

    fn write_f32(&mut self, key: &str, value: f32) -> FurResult<()> {
        self.put(key, Value::from(f64::from(value)))
    }

    fn write_f64(&mut self, key: &str, value: f64) -> FurResult<()> {
        self.put(key, Value::from(value))
    }

    fn write_id(&mut self, key: &str, value: Uuid) -> FurResult<()> {
        if self.null_ids && value.is_nil() {
            self.put(key, Value::Null)
        } else {
            self.put(key, Value::String(value.to_string()))
        }
    }

    fn write_string(&mut self, key: &str, value: &str) -> FurResult<()> {
        self.writer()?;
        // Empty strings are omitted from object frames and read back as
        // "" on absence; array positions cannot be omitted.
        if value.is_empty() {
            if let Frame::Object { .. } = self.top()? {
                return Ok(());
            }
        }
        self.put(key, Value::String(value.to_string()))
    }

    fn write_bytes(&mut self, key: &str, value: &[u8]) -> FurResult<()> {
        self.put(key, Value::String(hex_encode(value)))
    }

    fn write_optional_bytes(&mut self, key: &str, value: Option<&[u8]>) -> FurResult<()> {
        match value {
            Some(data) => self.write_bytes(key, data),
            None => self.put(key, Value::Null),
        }
    }

    fn write_external_bytes(&mut self, key: &str, name: &str, value: &[u8]) -> FurResult<()> {
        self.writer()?;
        if let Some(store) = &self.externals {
            if store.handles(name) {
                return store.write_bytes(name, value);
            }
        }
        self.write_bytes(key, value)
    }

    fn write_packed_u32(&mut self, key: &str, value: u32) -> FurResult<()> {
        self.put(key, Value::from(value))
    }

    fn write_tag_ordinal(
        &mut self,
        key: &str,
        _ordinal: u32,
        _width: TagWidth,
        tag: &'static str,
    ) -> FurResult<()> {
        self.put(key, Value::String(tag.to_string()))
    }

    fn write_type_tag(&mut self, key: &str, _id: u32, name: &str) -> FurResult<()> {
        self.put(key, Value::String(name.to_string()))
    }

    fn write_presence(&mut self, key: &str, present: bool) -> FurResult<()> {
        self.writer()?;
        if !present {
            return self.put(key, Value::Null);
        }
        // A present value follows under the same key; nothing to store.
        Ok(())
    }

    fn begin_write_list(&mut self, key: &str, count: usize) -> FurResult<()> {
        self.writer()?;
        list_len_guard(count)?;
        self.frames.push(Frame::Array {
            key: key.to_string(),
            items: Vec::with_capacity(count),
            cursor: 0,
        });
        Ok(())
    }

    fn end_write_list(&mut self) -> FurResult<()> {
        self.writer()?;
        if self.frames.len() < 2 {
            return Err(unbalanced_frame("list"));
        }
        match self.frames.pop() {
            Some(Frame::Array { key, items, .. }) => self.put(&key, Value::Array(items)),
            _ => Err(unbalanced_frame("list")),
        }
    }

    fn begin_write_object(&mut self, key: &str) -> FurResult<()> {
        self.writer()?;
        self.frames.push(Frame::Object {
            key: key.to_string(),
            map: Map::new(),
        });
        Ok(())
    }

    fn end_write_object(&mut self) -> FurResult<()> {
        self.writer()?;
        if self.frames.len() < 2 {
            return Err(unbalanced_frame("object"));
        }
        match self.frames.pop() {
            Some(Frame::Object { key, map }) => self.put(&key, Value::Object(map)),
            _ => Err(unbalanced_frame("object")),
        }
    }

    fn read_bool(&mut self, key: &str) -> FurResult<bool> {
        match self.require(key)? {
            Value::Bool(value) => Ok(value),
            _ => Err(type_mismatch(key, "a boolean")),
        }
    }

    fn read_u8(&mut self, key: &str) -> FurResult<u8> {
        let value = self.require_i64(key)?;
        u8::try_from(value).map_err(|_| out_of_range(key, value))
    }

    fn read_i16(&mut self, key: &str) -> FurResult<i16> {
        let value = self.require_i64(key)?;
        i16::try_from(value).map_err(|_| out_of_range(key, value))
    }

    fn read_i32(&mut self, key: &str) -> FurResult<i32> {
        let value = self.require_i64(key)?;
        i32::try_from(value).map_err(|_| out_of_range(key, value))
    }

    fn read_u32(&mut self, key: &str) -> FurResult<u32> {
        let value = self.require_i64(key)?;
        u32::try_from(value).map_err(|_| out_of_range(key, value))
    }

    fn read_i64(&mut self, key: &str) -> FurResult<i64> {
        self.require_i64(key)
    }

    fn read_f32(&mut self, key: &str) -> FurResult<f32> {
        Ok(self.require_f64(key)? as f32)
    }

    fn read_f64(&mut self, key: &str) -> FurResult<f64> {
        self.require_f64(key)
    }

    fn read_id(&mut self, key: &str) -> FurResult<Uuid> {
        match self.require(key)? {
            Value::Null => Ok(Uuid::nil()),
            Value::String(text) => Uuid::parse_str(&text)
                .map_err(|err| FurError::Malformed(format!("invalid identifier '{text}': {err}"))),
            _ => Err(type_mismatch(key, "an identifier string")),
        }
    }

    fn read_string(&mut self, key: &str) -> FurResult<String> {
        match self.take(key)? {
            // Absent string fields decode as empty; the writer never
            // stores them.
            None => Ok(String::new()),
            Some(Value::String(text)) => Ok(text),
            Some(_) => Err(type_mismatch(key, "a string")),
        }
    }

    fn read_bytes(&mut self, key: &str) -> FurResult<Vec<u8>> {
        let text = self.require_string(key)?;
        hex_decode(key, &text)
    }

    fn read_optional_bytes(&mut self, key: &str) -> FurResult<Option<Vec<u8>>> {
        match self.take(key)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(text)) => Ok(Some(hex_decode(key, &text)?)),
            Some(_) => Err(type_mismatch(key, "a hex string")),
        }
    }

    fn read_external_bytes(&mut self, key: &str, name: &str) -> FurResult<Vec<u8>> {
        self.reader()?;
        if let Some(store) = &self.externals {
            if store.handles(name) {
                return store.read_bytes(name);
            }
        }
        // Inline fallback: an absent field means the bytes were empty or
        // redirected by a store this reader does not have.
        match self.take(key)? {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::String(text)) => hex_decode(key, &text),
            Some(_) => Err(type_mismatch(key, "a hex string")),
        }
    }

    fn read_packed_u32(&mut self, key: &str) -> FurResult<u32> {
        self.read_u32(key)
    }

    fn read_tag_ordinal(
        &mut self,
        key: &str,
        _width: TagWidth,
        resolve: &dyn Fn(&str) -> Option<u32>,
    ) -> FurResult<u32> {
        let tag = self.require_string(key)?;
        resolve(&tag)
            .ok_or_else(|| FurError::Malformed(format!("unknown tag '{tag}' for '{key}'")))
    }

    fn read_type_tag(&mut self, key: &str) -> FurResult<TypeTag> {
        Ok(TypeTag::Name(self.require_string(key)?))
    }

    fn read_presence(&mut self, key: &str) -> FurResult<bool> {
        self.reader()?;
        match self.top()? {
            Frame::Object { map, .. } => {
                if !map.contains_key(key) {
                    return Ok(false);
                }
                if matches!(map.get(key), Some(Value::Null)) {
                    map.remove(key);
                    return Ok(false);
                }
                Ok(true)
            }
            Frame::Array { items, cursor, .. } => {
                let is_null = match items.get(*cursor) {
                    None => {
                        return Err(FurError::Malformed(format!(
                            "array exhausted while reading '{key}'"
                        )))
                    }
                    Some(value) => value.is_null(),
                };
                if is_null {
                    *cursor += 1;
                    return Ok(false);
                }
                Ok(true)
            }
        }
    }

    fn begin_read_list(&mut self, key: &str) -> FurResult<usize> {
        match self.require(key)? {
            Value::Array(items) => {
                list_len_guard(items.len())?;
                let count = items.len();
                self.frames.push(Frame::Array {
                    key: key.to_string(),
                    items,
                    cursor: 0,
                });
                Ok(count)
            }
            _ => Err(type_mismatch(key, "an array")),
        }
    }

    fn end_read_list(&mut self) -> FurResult<()> {
        self.reader()?;
        if self.frames.len() < 2 {
            return Err(unbalanced_frame("list"));
        }
        match self.frames.pop() {
            Some(Frame::Array { .. }) => Ok(()),
            _ => Err(unbalanced_frame("list")),
        }
    }

    fn begin_read_object(&mut self, key: &str) -> FurResult<()> {
        match self.require(key)? {
            Value::Object(map) => {
                self.frames.push(Frame::Object {
                    key: key.to_string(),
                    map,
                });
                Ok(())
            }
            _ => Err(type_mismatch(key, "an object")),
        }
    }

    fn end_read_object(&mut self) -> FurResult<()> {
        self.reader()?;
        if self.frames.len() < 2 {
            return Err(unbalanced_frame("object"));
        }
        match self.frames.pop() {
            // Unknown leftover keys are tolerated; structured documents
            // may carry fields from newer tools.
            Some(Frame::Object { .. }) => Ok(()),
            _ => Err(unbalanced_frame("object")),
        }
    }
}

fn hex_encode(data: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut output = String::with_capacity(data.len() * 2);
    for byte in data {
        let _ = write!(&mut output, "{byte:02x}");
    }
    output
}

fn hex_decode(key: &str, text: &str) -> FurResult<Vec<u8>> {
    if !text.is_ascii() || text.len() % 2 != 0 {
        return Err(type_mismatch(key, "a hex string"));
    }
    let mut output = Vec::with_capacity(text.len() / 2);
    let bytes = text.as_bytes();
    for pair in bytes.chunks_exact(2) {
        let high = hex_nibble(pair[0]).ok_or_else(|| type_mismatch(key, "a hex string"))?;
        let low = hex_nibble(pair[1]).ok_or_else(|| type_mismatch(key, "a hex string"))?;
        output.push((high << 4) | low);
    }
    Ok(output)
}

fn hex_nibble(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

#[cold]
#[inline(never)]
fn missing_key(key: &str) -> FurError {
    FurError::Usage(format!("required key '{key}' is missing"))
}

#[cold]
#[inline(never)]
fn type_mismatch(key: &str, expected: &str) -> FurError {
    FurError::Malformed(format!("value for '{key}' is not {expected}"))
}

#[cold]
#[inline(never)]
fn unbalanced_frame(kind: &str) -> FurError {
    FurError::Usage(format!("unbalanced {kind} frame end"))
}

#[cold]
#[inline(never)]
fn out_of_range(key: &str, value: i64) -> FurError {
    FurError::Malformed(format!("value {value} for '{key}' is out of range"))
}

#[cfg(test)]
#[path = "tests/tree_tests.rs"]
mod tests;
