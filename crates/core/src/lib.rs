//! Codec core for the furball game-asset container format.
//!
//! The furball is a versioned binary container another engine also reads
//! and writes; the same logical data round-trips through a structured
//! JSON tree for editing. This crate holds the codec contract, the two
//! wire back ends, the format-version compatibility layer, the
//! polymorphic type registry, the container reader/writer, and the scene
//! node tree. Concrete asset payloads live outside the core and talk to
//! it exclusively through [`Codec`] and [`TypeRegistry`].

mod codec;
mod error;
mod furball;
mod registry;
mod scene;
pub mod version;

pub use codec::{
    BinaryCodec, ByteBuffer, Codec, CodecExt, Direction, Endian, ExternalFileStore, Saveable,
    TagSet, TagWidth, TreeCodec, TypeTag, ValidationMode, VersionedCodec, MAX_LIST_LEN,
};
pub use error::{FurError, FurResult};
pub use furball::{
    AssetFailure, Furball, FurballDependency, FurballMetadata, FurballReadOutcome,
};
pub use registry::{
    type_id_for, DecodeFn, Polymorphic, TypeDescriptor, TypeRegistry, TYPE_TAG_KEY,
};
pub use scene::{CompassDirection, SceneNode, SceneNodeKind};
