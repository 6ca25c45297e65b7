use uuid::Uuid;

use crate::error::{FurError, FurResult};
use crate::version::{
    is_supported, LATEST_VERSION, MINIMUM_VERSION, VERSION_COMPRESSED_PAYLOAD,
    VERSION_PACKED_NUMBERS,
};

use super::binary::BinaryCodec;
use super::{list_len_guard, Codec, Direction, TagWidth, TypeTag, ValidationMode};

/// Format-version compatibility decorator over the binary codec.
///
/// Delegates the whole contract to the wrapped codec and intercepts
/// exactly three behaviors:
///
/// * length-like integers use the 7-bit packed encoding from
///   [`VERSION_PACKED_NUMBERS`] and fixed-width ints below it;
/// * optional byte blobs flip their absent sentinel from negative-length
///   to zero-length at the same threshold;
/// * the whole payload is compressed as a single block from
///   [`VERSION_COMPRESSED_PAYLOAD`] — [`VersionedCodec::open`]
///   decompresses before any decoding, [`VersionedCodec::seal`]
///   compresses after the last write. The container header stays on the
///   outer, uncompressed stream.
#[derive(Debug)]
pub struct VersionedCodec {
    inner: BinaryCodec,
}

impl VersionedCodec {
    /// Starts a writer for the container body. Rejects versions outside
    /// the supported window before any payload bytes are touched.
    pub fn for_writing(version: u8, validation: ValidationMode) -> FurResult<Self> {
        check_window(version)?;
        Ok(Self {
            inner: BinaryCodec::for_writing(version, validation),
        })
    }

    /// Opens a container body for reading, reversing the single-block
    /// compression first when the version calls for it.
    pub fn open(body: &[u8], version: u8, validation: ValidationMode) -> FurResult<Self> {
        check_window(version)?;
        let data = if version >= VERSION_COMPRESSED_PAYLOAD {
            lz4_flex::decompress_size_prepended(body).map_err(|err| {
                FurError::Malformed(format!("payload decompression failed: {err}"))
            })?
        } else {
            body.to_vec()
        };
        Ok(Self {
            inner: BinaryCodec::for_reading(data, version, validation),
        })
    }

    /// Finishes a write and returns the body bytes ready to append after
    /// the container header, compressed when the version calls for it.
    pub fn seal(self) -> Vec<u8> {
        let version = self.inner.format_version();
        let raw = self.inner.into_bytes();
        if version >= VERSION_COMPRESSED_PAYLOAD {
            lz4_flex::compress_prepend_size(&raw)
        } else {
            raw
        }
    }

    pub fn remaining(&self) -> usize {
        self.inner.remaining()
    }

    fn packs_numbers(&self) -> bool {
        self.inner.format_version() >= VERSION_PACKED_NUMBERS
    }
}

fn check_window(version: u8) -> FurResult<()> {
    if is_supported(version) {
        Ok(())
    } else {
        Err(FurError::UnsupportedVersion {
            found: version,
            minimum: MINIMUM_VERSION,
            latest: LATEST_VERSION,
        })
    }
}

impl Codec for VersionedCodec {
    fn direction(&self) -> Direction {
        self.inner.direction()
    }

    fn format_version(&self) -> u8 {
        self.inner.format_version()
    }

    fn validation(&self) -> ValidationMode {
        self.inner.validation()
    }

    fn write_bool(&mut self, key: &str, value: bool) -> FurResult<()> {
        self.inner.write_bool(key, value)
    }

    fn write_u8(&mut self, key: &str, value: u8) -> FurResult<()> {
        self.inner.write_u8(key, value)
    }

    fn write_i16(&mut self, key: &str, value: i16) -> FurResult<()> {
        self.inner.write_i16(key, value)
    }

    fn write_i32(&mut self, key: &str, value: i32) -> FurResult<()> {
        self.inner.write_i32(key, value)
    }

    fn write_u32(&mut self, key: &str, value: u32) -> FurResult<()> {
        self.inner.write_u32(key, value)
    }

    fn write_i64(&mut self, key: &str, value: i64) -> FurResult<()> {
        self.inner.write_i64(key, value)
    }

    fn write_f32(&mut self, key: &str, value: f32) -> FurResult<()> {
        self.inner.write_f32(key, value)
    }

    fn write_f64(&mut self, key: &str, value: f64) -> FurResult<()> {
        self.inner.write_f64(key, value)
    }

    fn write_id(&mut self, key: &str, value: Uuid) -> FurResult<()> {
        self.inner.write_id(key, value)
    }

    fn write_string(&mut self, key: &str, value: &str) -> FurResult<()> {
        self.inner.write_string(key, value)
    }

    fn write_bytes(&mut self, key: &str, value: &[u8]) -> FurResult<()> {
        if self.packs_numbers() {
            let len = blob_len(value.len())?;
            self.write_packed_u32(key, len)?;
            self.inner.write_raw(value)
        } else {
            self.inner.write_bytes(key, value)
        }
    }

    fn write_optional_bytes(&mut self, key: &str, value: Option<&[u8]>) -> FurResult<()> {
        if self.packs_numbers() {
            // Zero-length doubles as the absent sentinel from the packed
            // threshold on; an empty blob and a missing one are the same
            // thing at this version.
            match value {
                Some(data) => self.write_bytes(key, data),
                None => self.write_packed_u32(key, 0),
            }
        } else {
            self.inner.write_optional_bytes(key, value)
        }
    }

    fn write_external_bytes(&mut self, key: &str, _name: &str, value: &[u8]) -> FurResult<()> {
        self.write_bytes(key, value)
    }

    fn write_packed_u32(&mut self, key: &str, value: u32) -> FurResult<()> {
        if self.packs_numbers() {
            self.inner.write_varint_u32(value)
        } else {
            self.inner.write_packed_u32(key, value)
        }
    }

    fn write_tag_ordinal(
        &mut self,
        key: &str,
        ordinal: u32,
        width: TagWidth,
        tag: &'static str,
    ) -> FurResult<()> {
        self.inner.write_tag_ordinal(key, ordinal, width, tag)
    }

    fn write_type_tag(&mut self, key: &str, id: u32, name: &str) -> FurResult<()> {
        self.inner.write_type_tag(key, id, name)
    }

    fn write_presence(&mut self, key: &str, present: bool) -> FurResult<()> {
        self.inner.write_presence(key, present)
    }

    fn begin_write_list(&mut self, key: &str, count: usize) -> FurResult<()> {
        if self.packs_numbers() {
            list_len_guard(count)?;
            self.inner.write_varint_u32(count as u32)
        } else {
            self.inner.begin_write_list(key, count)
        }
    }

    fn end_write_list(&mut self) -> FurResult<()> {
        self.inner.end_write_list()
    }

    fn begin_write_object(&mut self, key: &str) -> FurResult<()> {
        self.inner.begin_write_object(key)
    }

    fn end_write_object(&mut self) -> FurResult<()> {
        self.inner.end_write_object()
    }

    fn read_bool(&mut self, key: &str) -> FurResult<bool> {
        self.inner.read_bool(key)
    }

    fn read_u8(&mut self, key: &str) -> FurResult<u8> {
        self.inner.read_u8(key)
    }

    fn read_i16(&mut self, key: &str) -> FurResult<i16> {
        self.inner.read_i16(key)
    }

    fn read_i32(&mut self, key: &str) -> FurResult<i32> {
        self.inner.read_i32(key)
    }

    fn read_u32(&mut self, key: &str) -> FurResult<u32> {
        self.inner.read_u32(key)
    }

    fn read_i64(&mut self, key: &str) -> FurResult<i64> {
        self.inner.read_i64(key)
    }

    fn read_f32(&mut self, key: &str) -> FurResult<f32> {
        self.inner.read_f32(key)
    }

    fn read_f64(&mut self, key: &str) -> FurResult<f64> {
        self.inner.read_f64(key)
    }

    fn read_id(&mut self, key: &str) -> FurResult<Uuid> {
        self.inner.read_id(key)
    }

    fn read_string(&mut self, key: &str) -> FurResult<String> {
        self.inner.read_string(key)
    }

    fn read_bytes(&mut self, key: &str) -> FurResult<Vec<u8>> {
        if self.packs_numbers() {
            let len = self.read_packed_u32(key)? as usize;
            self.inner.read_raw(len)
        } else {
            self.inner.read_bytes(key)
        }
    }

    fn read_optional_bytes(&mut self, key: &str) -> FurResult<Option<Vec<u8>>> {
        if self.packs_numbers() {
            let len = self.read_packed_u32(key)? as usize;
            if len == 0 {
                Ok(None)
            } else {
                Ok(Some(self.inner.read_raw(len)?))
            }
        } else {
            self.inner.read_optional_bytes(key)
        }
    }

    fn read_external_bytes(&mut self, key: &str, _name: &str) -> FurResult<Vec<u8>> {
        self.read_bytes(key)
    }

    fn read_packed_u32(&mut self, key: &str) -> FurResult<u32> {
        if self.packs_numbers() {
            self.inner.read_varint_u32()
        } else {
            self.inner.read_packed_u32(key)
        }
    }

    fn read_tag_ordinal(
        &mut self,
        key: &str,
        width: TagWidth,
        resolve: &dyn Fn(&str) -> Option<u32>,
    ) -> FurResult<u32> {
        self.inner.read_tag_ordinal(key, width, resolve)
    }

    fn read_type_tag(&mut self, key: &str) -> FurResult<TypeTag> {
        self.inner.read_type_tag(key)
    }

    fn read_presence(&mut self, key: &str) -> FurResult<bool> {
        self.inner.read_presence(key)
    }

    fn begin_read_list(&mut self, key: &str) -> FurResult<usize> {
        if self.packs_numbers() {
            let count = self.inner.read_varint_u32()? as usize;
            list_len_guard(count)?;
            Ok(count)
        } else {
            self.inner.begin_read_list(key)
        }
    }

    fn end_read_list(&mut self) -> FurResult<()> {
        self.inner.end_read_list()
    }

    fn begin_read_object(&mut self, key: &str) -> FurResult<()> {
        self.inner.begin_read_object(key)
    }

    fn end_read_object(&mut self) -> FurResult<()> {
        self.inner.end_read_object()
    }
}

fn blob_len(len: usize) -> FurResult<u32> {
    u32::try_from(len)
        .map_err(|_| FurError::Usage(format!("byte blob of {len} bytes exceeds u32::MAX")))
}
