//! Concrete asset catalog and project-directory store.
//!
//! The payload types here are plain data records that serialize
//! field-by-field through the codec core; nothing in this crate knows
//! which back end it is talking to. The registries are built once and
//! shared read-only afterwards.

mod catalog;
mod merge;
mod project;
mod scripts;

pub use catalog::{
    asset_registry, Asset, AssetBase, CreatureAsset, ItemAsset, ItemKind, JournalAsset,
    JournalStage, SceneAsset, ScriptAsset, SizeClass, StringTableAsset, StringTableEntry,
    UsableProps,
};
pub use merge::merge_furballs;
pub use project::{DirectoryFileStore, ProjectError, ProjectStore};
pub use scripts::{scene_script_registry, ExternalScript, InlineScript, SceneScript};
