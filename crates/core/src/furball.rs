//! Top-level furball container orchestration.
//!
//! Reading and writing are the same linear state machine with no
//! branching back: magic bytes, version byte, version check, the
//! (possibly compressed) body codec, metadata, dependencies, assets.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::codec::{Codec, Saveable, ValidationMode, VersionedCodec};
use crate::error::{FurError, FurResult};
use crate::registry::{Polymorphic, TypeRegistry};
use crate::version::{is_supported, FURBALL_MAGIC, LATEST_VERSION, MINIMUM_VERSION};

/// Container metadata. The format version doubles as the version every
/// nested structure is encoded under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FurballMetadata {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub format_version: u8,
}

impl FurballMetadata {
    pub fn write_into<C: Codec + ?Sized>(&self, output: &mut C) -> FurResult<()> {
        output.write_id("ID", self.id)?;
        output.write_string("Title", &self.title)?;
        output.write_string("Author", &self.author)
    }

    /// Reads the metadata fields; the format version is carried outside
    /// the body (header byte or root-document field) and supplied here.
    pub fn read_from<C: Codec + ?Sized>(input: &mut C, format_version: u8) -> FurResult<Self> {
        Ok(Self {
            id: input.read_id("ID")?,
            title: input.read_string("Title")?,
            author: input.read_string("Author")?,
            format_version,
        })
    }
}

/// Reference to another furball the assets in this one depend on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FurballDependency {
    pub id: Uuid,
    pub filename_hint: String,
}

impl Saveable for FurballDependency {
    fn write_into<C: Codec + ?Sized>(&self, output: &mut C) -> FurResult<()> {
        output.write_id("ID", self.id)?;
        output.write_string("FileNameHint", &self.filename_hint)
    }

    fn read_from<C: Codec + ?Sized>(input: &mut C) -> FurResult<Self> {
        Ok(Self {
            id: input.read_id("ID")?,
            filename_hint: input.read_string("FileNameHint")?,
        })
    }
}

/// The root aggregate: metadata, dependencies, and an ordered list of
/// polymorphic assets. Generic over the asset family so the codec core
/// stays independent of the concrete catalog.
#[derive(Clone, Debug)]
pub struct Furball<A> {
    pub metadata: FurballMetadata,
    pub dependencies: Vec<FurballDependency>,
    pub assets: Vec<A>,
}

/// One failed asset slot from the partial-recovery read path.
#[derive(Debug)]
pub struct AssetFailure {
    /// Index the asset would have occupied in the list.
    pub index: usize,
    pub error: FurError,
}

/// Result of reading a furball: the container with every asset decoded
/// before the first failure, plus that failure when one occurred.
#[derive(Debug)]
pub struct FurballReadOutcome<A> {
    pub furball: Furball<A>,
    pub failure: Option<AssetFailure>,
}

impl<A> Furball<A> {
    pub fn new(metadata: FurballMetadata) -> Self {
        Self {
            metadata,
            dependencies: Vec::new(),
            assets: Vec::new(),
        }
    }
}

impl<A: Polymorphic> Furball<A> {
    /// Serializes the whole container to its binary form.
    pub fn to_bytes(&self, registry: &TypeRegistry<A>) -> FurResult<Vec<u8>> {
        let version = self.metadata.format_version;
        let mut body = VersionedCodec::for_writing(version, ValidationMode::Strict)?;
        self.metadata.write_into(&mut body)?;

        // The dependency count predates the packed-number switch and is
        // frozen as a fixed-width int at every version.
        let count = i32::try_from(self.dependencies.len())
            .map_err(|_| FurError::Usage("dependency list exceeds i32::MAX".to_string()))?;
        body.write_i32("DependencyCount", count)?;
        for dependency in &self.dependencies {
            dependency.write_into(&mut body)?;
        }

        let count = u32::try_from(self.assets.len())
            .map_err(|_| FurError::Usage("asset list exceeds u32::MAX".to_string()))?;
        body.write_packed_u32("AssetCount", count)?;
        for asset in &self.assets {
            registry.write(&mut body, "Asset", asset)?;
        }

        let body = body.seal();
        let mut output = Vec::with_capacity(FURBALL_MAGIC.len() + 1 + body.len());
        output.extend_from_slice(&FURBALL_MAGIC);
        output.push(version);
        output.extend_from_slice(&body);
        debug!(
            version,
            assets = self.assets.len(),
            bytes = output.len(),
            "furball serialized"
        );
        Ok(output)
    }

    /// Deserializes a container from its binary form.
    ///
    /// This is the one deliberately degrading path in the system: when a
    /// single asset fails to decode, the failure is logged and returned,
    /// the remaining assets are abandoned unparsed, and everything
    /// decoded before the failure is kept. Every other error is fatal.
    pub fn from_bytes(bytes: &[u8], registry: &TypeRegistry<A>) -> FurResult<FurballReadOutcome<A>> {
        let header_len = FURBALL_MAGIC.len() + 1;
        if bytes.len() < header_len {
            return Err(FurError::Malformed(
                "furball data is shorter than its header".to_string(),
            ));
        }
        if bytes[..FURBALL_MAGIC.len()] != FURBALL_MAGIC {
            return Err(FurError::Malformed(
                "missing furball magic bytes".to_string(),
            ));
        }
        let version = bytes[FURBALL_MAGIC.len()];
        if !is_supported(version) {
            return Err(FurError::UnsupportedVersion {
                found: version,
                minimum: MINIMUM_VERSION,
                latest: LATEST_VERSION,
            });
        }

        let mut body = VersionedCodec::open(&bytes[header_len..], version, ValidationMode::Strict)?;
        let metadata = FurballMetadata::read_from(&mut body, version)?;
        let mut furball = Furball::new(metadata);

        let count = body.read_i32("DependencyCount")?;
        let count = usize::try_from(count)
            .map_err(|_| FurError::Malformed(format!("negative dependency count {count}")))?;
        crate::codec::list_len_guard(count)?;
        furball.dependencies.reserve(count);
        for _ in 0..count {
            furball.dependencies.push(FurballDependency::read_from(&mut body)?);
        }

        let count = body.read_packed_u32("AssetCount")? as usize;
        crate::codec::list_len_guard(count)?;
        let mut failure = None;
        for index in 0..count {
            match registry.read(&mut body, "Asset") {
                Ok(asset) => furball.assets.push(asset),
                Err(error) => {
                    warn!(
                        index,
                        %error,
                        "asset failed to decode; keeping the {} decoded before it",
                        furball.assets.len()
                    );
                    failure = Some(AssetFailure { index, error });
                    break;
                }
            }
        }

        Ok(FurballReadOutcome { furball, failure })
    }
}
