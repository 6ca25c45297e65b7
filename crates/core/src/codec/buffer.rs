use crate::error::{FurError, FurResult};

/// Growable byte buffer with a read cursor.
///
/// Writes append at the end; reads advance the cursor and bounds-check
/// against the data actually present. The buffer grows by the larger of
/// the exact deficit and its current length, bounding the number of
/// reallocations, and never shrinks. Callers must not retain views of the
/// backing storage across a write.
#[derive(Debug, Default)]
pub struct ByteBuffer {
    data: Vec<u8>,
    cursor: usize,
}

impl ByteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left between the read cursor and the end of the data.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Appends `bytes`, growing the backing storage first if needed.
    pub fn write(&mut self, bytes: &[u8]) {
        self.reserve_for(bytes.len());
        self.data.extend_from_slice(bytes);
    }

    pub fn write_byte(&mut self, byte: u8) {
        self.reserve_for(1);
        self.data.push(byte);
    }

    /// Consumes and returns the next `count` bytes.
    pub fn read(&mut self, count: usize) -> FurResult<&[u8]> {
        if count > self.remaining() {
            return Err(end_of_data(count, self.remaining(), self.cursor));
        }
        let start = self.cursor;
        self.cursor += count;
        Ok(&self.data[start..self.cursor])
    }

    pub fn read_byte(&mut self) -> FurResult<u8> {
        if self.remaining() == 0 {
            return Err(end_of_data(1, 0, self.cursor));
        }
        let byte = self.data[self.cursor];
        self.cursor += 1;
        Ok(byte)
    }

    fn reserve_for(&mut self, additional: usize) {
        let free = self.data.capacity() - self.data.len();
        if free < additional {
            // Grow by the exact need or the current length, whichever is
            // larger, to bound the number of reallocations.
            self.data.reserve_exact(additional.max(self.data.len()));
        }
    }
}

#[cold]
#[inline(never)]
fn end_of_data(wanted: usize, available: usize, offset: usize) -> FurError {
    FurError::Malformed(format!(
        "unexpected end of data: wanted {wanted} bytes at offset {offset}, {available} available"
    ))
}
