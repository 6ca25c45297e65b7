//! Format versioning constants for the furball container.
//!
//! The format version is a single byte that gates every wire-level and
//! structural behavior switch. The constants below pin the window this
//! implementation accepts and the thresholds where encodings change.

/// Magic bytes opening every binary furball.
pub const FURBALL_MAGIC: [u8; 7] = *b"FURBALL";

/// Oldest container format version this implementation reads or writes.
pub const MINIMUM_VERSION: u8 = 19;

/// Newest container format version this implementation reads or writes.
pub const LATEST_VERSION: u8 = 21;

/// First version where length-like integers use the 7-bit packed encoding
/// instead of fixed-width ints, and where optional byte blobs switch their
/// absent sentinel from negative-length to zero-length.
pub const VERSION_PACKED_NUMBERS: u8 = 21;

/// First version where the entire payload after the magic bytes and the
/// version byte is compressed as a single block.
pub const VERSION_COMPRESSED_PAYLOAD: u8 = 21;

/// Returns whether `version` is inside the supported container window.
pub fn is_supported(version: u8) -> bool {
    (MINIMUM_VERSION..=LATEST_VERSION).contains(&version)
}
