use uuid::Uuid;

use crate::error::{FurError, FurResult};

use super::buffer::ByteBuffer;
use super::{
    list_len_guard, wrong_direction, Codec, Direction, Endian, TagWidth, TypeTag, ValidationMode,
};

/// Order-addressed codec over a byte cursor.
///
/// Encodes the canonical furball wire layout: fixed-width numbers in the
/// buffer's byte order, 7-bit packed length prefixes for strings, and the
/// foreign four-group identifier layout. Keys are accepted and ignored so
/// payload code written against the key-addressed contract works
/// unchanged.
///
/// This raw codec always uses the legacy fixed-width encodings for
/// length-like integers and the negative-length absent sentinel;
/// [`super::VersionedCodec`] layers the version-gated switches on top.
#[derive(Debug)]
pub struct BinaryCodec {
    buffer: ByteBuffer,
    direction: Direction,
    version: u8,
    validation: ValidationMode,
    endian: Endian,
}

impl BinaryCodec {
    pub fn for_writing(version: u8, validation: ValidationMode) -> Self {
        Self {
            buffer: ByteBuffer::new(),
            direction: Direction::Write,
            version,
            validation,
            endian: Endian::Little,
        }
    }

    pub fn for_reading(data: Vec<u8>, version: u8, validation: ValidationMode) -> Self {
        Self {
            buffer: ByteBuffer::from_vec(data),
            direction: Direction::Read,
            version,
            validation,
            endian: Endian::Little,
        }
    }

    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Bytes left to read; zero for a writer that has not been handed off.
    pub fn remaining(&self) -> usize {
        self.buffer.remaining()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.into_vec()
    }

    /// Writes a 32-bit value in the 7-bit packed form: seven bits per
    /// byte, low group first, high bit as the continuation flag.
    pub fn write_varint_u32(&mut self, value: u32) -> FurResult<()> {
        self.writer()?;
        let mut rest = value;
        loop {
            let group = (rest & 0x7F) as u8;
            rest >>= 7;
            if rest == 0 {
                self.buffer.write_byte(group);
                return Ok(());
            }
            self.buffer.write_byte(group | 0x80);
        }
    }

    /// Reads a 7-bit packed 32-bit value. The encoding is capped at five
    /// bytes; a continuation flag on the fifth byte is a parse error.
    pub fn read_varint_u32(&mut self) -> FurResult<u32> {
        self.reader()?;
        let mut value: u32 = 0;
        for shift in 0..5u32 {
            let byte = self.buffer.read_byte()?;
            value |= u32::from(byte & 0x7F) << (7 * shift);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(FurError::Malformed(
            "7-bit packed integer continues past its 5-byte cap".to_string(),
        ))
    }

    /// Appends bytes with no prefix; the decorating codec owns the
    /// framing.
    pub(crate) fn write_raw(&mut self, bytes: &[u8]) -> FurResult<()> {
        self.writer()?;
        self.buffer.write(bytes);
        Ok(())
    }

    pub(crate) fn read_raw(&mut self, len: usize) -> FurResult<Vec<u8>> {
        self.reader()?;
        Ok(self.buffer.read(len)?.to_vec())
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

    fn put_u16(&mut self, value: u16) {
        let bytes = match self.endian {
            Endian::Little => value.to_le_bytes(),
            Endian::Big => value.to_be_bytes(),
        };
        self.buffer.write(&bytes);
    }

    fn put_u32(&mut self, value: u32) {
        let bytes = match self.endian {
            Endian::Little => value.to_le_bytes(),
            Endian::Big => value.to_be_bytes(),
        };
        self.buffer.write(&bytes);
    }

    fn put_u64(&mut self, value: u64) {
        let bytes = match self.endian {
            Endian::Little => value.to_le_bytes(),
            Endian::Big => value.to_be_bytes(),
        };
        self.buffer.write(&bytes);
    }

    fn take_u16(&mut self) -> FurResult<u16> {
        let raw = self.buffer.read(2)?;
        let bytes = [raw[0], raw[1]];
        Ok(match self.endian {
            Endian::Little => u16::from_le_bytes(bytes),
            Endian::Big => u16::from_be_bytes(bytes),
        })
    }

    fn take_u32(&mut self) -> FurResult<u32> {
        let raw = self.buffer.read(4)?;
        let bytes = [raw[0], raw[1], raw[2], raw[3]];
        Ok(match self.endian {
            Endian::Little => u32::from_le_bytes(bytes),
            Endian::Big => u32::from_be_bytes(bytes),
        })
    }

    fn take_u64(&mut self) -> FurResult<u64> {
        let raw = self.buffer.read(8)?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(raw);
        Ok(match self.endian {
            Endian::Little => u64::from_le_bytes(bytes),
            Endian::Big => u64::from_be_bytes(bytes),
        })
    }

    fn put_len_i32(&mut self, len: usize) -> FurResult<()> {
        let len = i32::try_from(len)
            .map_err(|_| FurError::Usage(format!("byte blob of {len} bytes exceeds i32::MAX")))?;
        self.put_u32(len as u32);
        Ok(())
    }

    fn take_len_i32(&mut self) -> FurResult<usize> {
        let len = self.take_u32()? as i32;
        usize::try_from(len)
            .map_err(|_| FurError::Malformed(format!("negative length prefix {len}")))
    }
}

impl Codec for BinaryCodec {
    fn direction(&self) -> Direction {
        self.direction
    }

    fn format_version(&self) -> u8 {
        self.version
    }

    fn validation(&self) -> ValidationMode {
        self.validation
    }

    fn write_bool(&mut self, _key: &str, value: bool) -> FurResult<()> {
        self.writer()?;
        self.buffer.write_byte(u8::from(value));
        Ok(())
    }

    fn write_u8(&mut self, _key: &str, value: u8) -> FurResult<()> {
        self.writer()?;
        self.buffer.write_byte(value);
        Ok(())
    }

    fn write_i16(&mut self, _key: &str, value: i16) -> FurResult<()> {
        self.writer()?;
        self.put_u16(value as u16);
        Ok(())
    }

    fn write_i32(&mut self, _key: &str, value: i32) -> FurResult<()> {
        self.writer()?;
        self.put_u32(value as u32);
        Ok(())
    }

    fn write_u32(&mut self, _key: &str, value: u32) -> FurResult<()> {
        self.writer()?;
        self.put_u32(value);
        Ok(())
    }

    fn write_i64(&mut self, _key: &str, value: i64) -> FurResult<()> {
        self.writer()?;
        self.put_u64(value as u64);
        Ok(())
    }

    fn write_f32(&mut self, _key: &str, value: f32) -> FurResult<()> {
        self.writer()?;
        self.put_u32(value.to_bits());
        Ok(())
    }

    fn write_f64(&mut self, _key: &str, value: f64) -> FurResult<()> {
        self.writer()?;
        self.put_u64(value.to_bits());
        Ok(())
    }

    /// Writes the identifier in the foreign four-group layout: the 4-byte
    /// and two 2-byte groups in the buffer's byte order, then the 8-byte
    /// group reversed relative to the buffer's order unless the buffer is
    /// big-endian. A one-bit deviation here silently corrupts every
    /// identifier exchanged with the external toolchain.
    fn write_id(&mut self, _key: &str, value: Uuid) -> FurResult<()> {
        self.writer()?;
        let (group1, group2, group3, tail) = value.as_fields();
        self.put_u32(group1);
        self.put_u16(group2);
        self.put_u16(group3);
        match self.endian {
            Endian::Little => {
                let mut reversed = *tail;
                reversed.reverse();
                self.buffer.write(&reversed);
            }
            Endian::Big => self.buffer.write(tail),
        }
        Ok(())
    }

    fn write_string(&mut self, _key: &str, value: &str) -> FurResult<()> {
        self.writer()?;
        let len = u32::try_from(value.len()).map_err(|_| {
            FurError::Usage(format!("string of {} bytes exceeds u32::MAX", value.len()))
        })?;
        self.write_varint_u32(len)?;
        self.buffer.write(value.as_bytes());
        Ok(())
    }

    fn write_bytes(&mut self, _key: &str, value: &[u8]) -> FurResult<()> {
        self.writer()?;
        self.put_len_i32(value.len())?;
        self.buffer.write(value);
        Ok(())
    }

    fn write_optional_bytes(&mut self, key: &str, value: Option<&[u8]>) -> FurResult<()> {
        self.writer()?;
        match value {
            Some(data) => self.write_bytes(key, data),
            None => {
                self.put_u32((-1i32) as u32);
                Ok(())
            }
        }
    }

    fn write_external_bytes(&mut self, key: &str, _name: &str, value: &[u8]) -> FurResult<()> {
        // The binary container always inlines external values.
        self.write_bytes(key, value)
    }

    fn write_packed_u32(&mut self, _key: &str, value: u32) -> FurResult<()> {
        self.writer()?;
        self.put_u32(value);
        Ok(())
    }

    fn write_tag_ordinal(
        &mut self,
        key: &str,
        ordinal: u32,
        width: TagWidth,
        _tag: &'static str,
    ) -> FurResult<()> {
        self.writer()?;
        match width {
            TagWidth::Byte => {
                let ordinal = u8::try_from(ordinal)
                    .map_err(|_| tag_width_error(key, ordinal, "a byte"))?;
                self.buffer.write_byte(ordinal);
            }
            TagWidth::Short => {
                let ordinal = u16::try_from(ordinal)
                    .map_err(|_| tag_width_error(key, ordinal, "a short"))?;
                self.put_u16(ordinal);
            }
            TagWidth::Int => self.put_u32(ordinal),
        }
        Ok(())
    }

    fn write_type_tag(&mut self, _key: &str, id: u32, _name: &str) -> FurResult<()> {
        self.writer()?;
        self.put_u32(id);
        Ok(())
    }

    fn write_presence(&mut self, key: &str, present: bool) -> FurResult<()> {
        self.write_bool(key, present)
    }

    fn begin_write_list(&mut self, _key: &str, count: usize) -> FurResult<()> {
        self.writer()?;
        list_len_guard(count)?;
        self.put_len_i32(count)?;
        Ok(())
    }

    fn end_write_list(&mut self) -> FurResult<()> {
        Ok(())
    }

    fn begin_write_object(&mut self, _key: &str) -> FurResult<()> {
        // Fields are positional and contiguous; there is no frame to open.
        self.writer()
    }

    fn end_write_object(&mut self) -> FurResult<()> {
        Ok(())
    }

    fn read_bool(&mut self, _key: &str) -> FurResult<bool> {
        self.reader()?;
        match self.buffer.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(FurError::Malformed(format!(
                "invalid boolean byte 0x{other:02x}"
            ))),
        }
    }

    fn read_u8(&mut self, _key: &str) -> FurResult<u8> {
        self.reader()?;
        self.buffer.read_byte()
    }

    fn read_i16(&mut self, _key: &str) -> FurResult<i16> {
        self.reader()?;
        Ok(self.take_u16()? as i16)
    }

    fn read_i32(&mut self, _key: &str) -> FurResult<i32> {
        self.reader()?;
        Ok(self.take_u32()? as i32)
    }

    fn read_u32(&mut self, _key: &str) -> FurResult<u32> {
        self.reader()?;
        self.take_u32()
    }

    fn read_i64(&mut self, _key: &str) -> FurResult<i64> {
        self.reader()?;
        Ok(self.take_u64()? as i64)
    }

    fn read_f32(&mut self, _key: &str) -> FurResult<f32> {
        self.reader()?;
        Ok(f32::from_bits(self.take_u32()?))
    }

    fn read_f64(&mut self, _key: &str) -> FurResult<f64> {
        self.reader()?;
        Ok(f64::from_bits(self.take_u64()?))
    }

    fn read_id(&mut self, _key: &str) -> FurResult<Uuid> {
        self.reader()?;
        let group1 = self.take_u32()?;
        let group2 = self.take_u16()?;
        let group3 = self.take_u16()?;
        let mut tail = [0u8; 8];
        tail.copy_from_slice(self.buffer.read(8)?);
        if self.endian == Endian::Little {
            tail.reverse();
        }
        Ok(Uuid::from_fields(group1, group2, group3, &tail))
    }

    fn read_string(&mut self, _key: &str) -> FurResult<String> {
        self.reader()?;
        let len = self.read_varint_u32()? as usize;
        let bytes = self.buffer.read(len)?.to_vec();
        String::from_utf8(bytes)
            .map_err(|err| FurError::Malformed(format!("invalid UTF-8 in string: {err}")))
    }

    fn read_bytes(&mut self, _key: &str) -> FurResult<Vec<u8>> {
        self.reader()?;
        let len = self.take_len_i32()?;
        Ok(self.buffer.read(len)?.to_vec())
    }

    fn read_optional_bytes(&mut self, _key: &str) -> FurResult<Option<Vec<u8>>> {
        self.reader()?;
        let len = self.take_u32()? as i32;
        if len == -1 {
            return Ok(None);
        }
        let len = usize::try_from(len)
            .map_err(|_| FurError::Malformed(format!("negative length prefix {len}")))?;
        Ok(Some(self.buffer.read(len)?.to_vec()))
    }

    fn read_external_bytes(&mut self, key: &str, _name: &str) -> FurResult<Vec<u8>> {
        self.read_bytes(key)
    }

    fn read_packed_u32(&mut self, _key: &str) -> FurResult<u32> {
        self.reader()?;
        self.take_u32()
    }

    fn read_tag_ordinal(
        &mut self,
        _key: &str,
        width: TagWidth,
        _resolve: &dyn Fn(&str) -> Option<u32>,
    ) -> FurResult<u32> {
        self.reader()?;
        match width {
            TagWidth::Byte => Ok(u32::from(self.buffer.read_byte()?)),
            TagWidth::Short => Ok(u32::from(self.take_u16()?)),
            TagWidth::Int => self.take_u32(),
        }
    }

    fn read_type_tag(&mut self, _key: &str) -> FurResult<TypeTag> {
        self.reader()?;
        Ok(TypeTag::Id(self.take_u32()?))
    }

    fn read_presence(&mut self, key: &str) -> FurResult<bool> {
        self.read_bool(key)
    }

    fn begin_read_list(&mut self, _key: &str) -> FurResult<usize> {
        self.reader()?;
        let count = self.take_len_i32()?;
        list_len_guard(count)?;
        Ok(count)
    }

    fn end_read_list(&mut self) -> FurResult<()> {
        Ok(())
    }

    fn begin_read_object(&mut self, _key: &str) -> FurResult<()> {
        self.reader()
    }

    fn end_read_object(&mut self) -> FurResult<()> {
        Ok(())
    }
}

#[cold]
#[inline(never)]
fn tag_width_error(key: &str, ordinal: u32, width: &str) -> FurError {
    FurError::Usage(format!(
        "tag ordinal {ordinal} for '{key}' does not fit {width}"
    ))
}

#[cfg(test)]
#[path = "tests/binary_tests.rs"]
mod tests;
