//! The human-editable project-directory form of a furball.
//!
//! One root document (`<title>.furproj`) holds the metadata and the
//! dependency list; every asset lives in its own self-describing JSON
//! document next to it, with byte blobs redirected to sibling files by
//! filename convention. Unlike the binary container path, reading a
//! project is fully fatal on the first malformed document.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use furball_engine::version::is_supported;
use furball_engine::{
    Codec, CodecExt, ExternalFileStore, FurError, FurResult, Furball, FurballMetadata,
    TreeCodec, ValidationMode,
};

use crate::catalog::{asset_registry, Asset};

pub const PROJECT_EXTENSION: &str = "furproj";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Engine(#[from] FurError),
    #[error("no project root document (*.{PROJECT_EXTENSION}) under {0}")]
    MissingRoot(PathBuf),
    #[error("invalid JSON in {path}: {message}")]
    Document { path: PathBuf, message: String },
    #[error("asset name '{0}' cannot be used as a file name")]
    UnsafeName(String),
}

/// Directory-backed external file store: blobs become sibling files of
/// the asset documents. Only plain, traversal-safe file names are
/// claimed.
pub struct DirectoryFileStore {
    root: PathBuf,
}

impl DirectoryFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ExternalFileStore for DirectoryFileStore {
    fn handles(&self, name: &str) -> bool {
        is_safe_file_name(name)
    }

    fn read_bytes(&self, name: &str) -> FurResult<Vec<u8>> {
        Ok(fs::read(self.root.join(name))?)
    }

    fn write_bytes(&self, name: &str, data: &[u8]) -> FurResult<()> {
        Ok(fs::write(self.root.join(name), data)?)
    }
}

/// Reads and writes whole furballs as project directories.
pub struct ProjectStore {
    root: PathBuf,
}

impl ProjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the whole furball as a project directory, one document per
    /// asset plus the root document.
    pub fn save(&self, furball: &Furball<Asset>) -> Result<(), ProjectError> {
        let version = furball.metadata.format_version;
        if !is_supported(version) {
            return Err(unsupported(version).into());
        }
        fs::create_dir_all(&self.root)?;

        let mut codec = TreeCodec::for_writing(version, ValidationMode::Strict);
        codec.write_u8("FormatVersion", version)?;
        furball.metadata.write_into(&mut codec)?;
        codec.write_list("Dependencies", &furball.dependencies)?;
        let stem = safe_stem(&furball.metadata.title);
        self.write_document(&format!("{stem}.{PROJECT_EXTENSION}"), codec.into_value()?)?;

        for asset in &furball.assets {
            let name = &asset.base().name;
            if !is_safe_file_name(name) {
                return Err(ProjectError::UnsafeName(name.clone()));
            }
            let mut codec = TreeCodec::for_writing(version, ValidationMode::Strict)
                .with_null_ids(true)
                .with_external_store(Box::new(DirectoryFileStore::new(&self.root)));
            asset_registry().write_root(&mut codec, asset)?;
            self.write_document(&format!("{name}.json"), codec.into_value()?)?;
        }
        debug!(
            assets = furball.assets.len(),
            root = %self.root.display(),
            "project saved"
        );
        Ok(())
    }

    /// Reads a project directory back into a furball. Assets come back
    /// ordered by file name, which keeps the round trip deterministic.
    pub fn load(&self) -> Result<Furball<Asset>, ProjectError> {
        let root_doc = self
            .find_root_document()?
            .ok_or_else(|| ProjectError::MissingRoot(self.root.clone()))?;
        let value = self.read_document(&root_doc)?;
        let version = value
            .get("FormatVersion")
            .and_then(Value::as_u64)
            .and_then(|raw| u8::try_from(raw).ok())
            .ok_or_else(|| ProjectError::Document {
                path: root_doc.clone(),
                message: "missing or invalid FormatVersion".to_string(),
            })?;
        if !is_supported(version) {
            return Err(unsupported(version).into());
        }

        let mut codec = TreeCodec::for_reading(value, version, ValidationMode::Strict)?;
        codec.read_u8("FormatVersion")?;
        let metadata = FurballMetadata::read_from(&mut codec, version)?;
        let mut furball = Furball::new(metadata);
        furball.dependencies = codec.read_list("Dependencies")?;

        for path in self.asset_documents()? {
            let value = self.read_document(&path)?;
            let mut codec = TreeCodec::for_reading(value, version, ValidationMode::Strict)?
                .with_null_ids(true)
                .with_external_store(Box::new(DirectoryFileStore::new(&self.root)));
            let asset = asset_registry().read_root(&mut codec)?;
            furball.assets.push(asset);
        }
        Ok(furball)
    }

    fn find_root_document(&self) -> Result<Option<PathBuf>, ProjectError> {
        for entry in WalkDir::new(&self.root)
            .max_depth(1)
            .into_iter()
            .filter_map(Result::ok)
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(PROJECT_EXTENSION) {
                return Ok(Some(path.to_path_buf()));
            }
        }
        Ok(None)
    }

    fn asset_documents(&self) -> Result<Vec<PathBuf>, ProjectError> {
        let mut documents = Vec::new();
        for entry in WalkDir::new(&self.root)
            .max_depth(1)
            .into_iter()
            .filter_map(Result::ok)
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                documents.push(path.to_path_buf());
            }
        }
        documents.sort();
        Ok(documents)
    }

    fn read_document(&self, path: &Path) -> Result<Value, ProjectError> {
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|err| ProjectError::Document {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    fn write_document(&self, file_name: &str, value: Value) -> Result<(), ProjectError> {
        let raw = serde_json::to_vec_pretty(&value).map_err(|err| ProjectError::Document {
            path: self.root.join(file_name),
            message: err.to_string(),
        })?;
        fs::write(self.root.join(file_name), raw)?;
        Ok(())
    }
}

fn unsupported(version: u8) -> FurError {
    FurError::UnsupportedVersion {
        found: version,
        minimum: furball_engine::version::MINIMUM_VERSION,
        latest: furball_engine::version::LATEST_VERSION,
    }
}

/// A name is safe when it stays a plain sibling file: no separators, no
/// parent references, no hidden-file prefix.
fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains("..")
        && name.chars().all(|c| !c.is_control())
}

fn safe_stem(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = stem.trim().to_string();
    if trimmed.is_empty() {
        "project".to_string()
    } else {
        trimmed
    }
}
