//! Polymorphic type dispatch for asset and script payloads.
//!
//! The registry is populated once at startup and read-only afterwards,
//! which is what makes it safe to share across concurrent pipeline
//! invocations. Each entry maps a symbolic type name and its derived
//! numeric id to a decode function, bounded by the format-version window
//! the type exists in.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::codec::{Codec, TypeTag};
use crate::error::{FurError, FurResult};

/// Key under which a value's type discriminant is stored: the numeric id
/// on binary back ends, the symbolic name on structured ones.
pub const TYPE_TAG_KEY: &str = "!Type";

/// A value that belongs to a polymorphic family the registry can
/// dispatch on.
pub trait Polymorphic {
    /// Symbolic type name; must match the name the type was registered
    /// under.
    fn type_name(&self) -> &'static str;

    /// Writes the value's own fields, excluding the type discriminant.
    fn write_payload(&self, output: &mut dyn Codec) -> FurResult<()>;
}

/// Decoder for one registered type. Reads the fields the matching
/// [`Polymorphic::write_payload`] wrote.
pub type DecodeFn<T> = fn(&mut dyn Codec) -> FurResult<T>;

/// Descriptor of one serializable type: identity plus the format-version
/// window it exists in. Computed once at registration and immutable.
pub struct TypeDescriptor<T> {
    pub id: u32,
    pub name: &'static str,
    /// Inclusive minimum format version.
    pub min_version: u8,
    /// Inclusive maximum format version; 0 means unbounded.
    pub max_version: u8,
    decode: DecodeFn<T>,
}

/// Append-only table of [`TypeDescriptor`]s with id and name lookups.
pub struct TypeRegistry<T> {
    entries: Vec<TypeDescriptor<T>>,
    by_id: HashMap<u32, usize>,
    by_name: HashMap<&'static str, usize>,
}

/// Derives the stable numeric id for a symbolic type name: the first four
/// bytes of SHA-256 over the name, little-endian. The binary container
/// stores this id instead of a name table.
pub fn type_id_for(name: &str) -> u32 {
    let digest = Sha256::digest(name.as_bytes());
    u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
}

impl<T> Default for TypeRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TypeRegistry<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            by_id: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Registers a type. Fails on duplicate names and on id collisions,
    /// which would make the binary form ambiguous.
    pub fn register(
        &mut self,
        name: &'static str,
        min_version: u8,
        max_version: u8,
        decode: DecodeFn<T>,
    ) -> FurResult<()> {
        let id = type_id_for(name);
        if self.by_name.contains_key(name) {
            return Err(FurError::Usage(format!(
                "type '{name}' is already registered"
            )));
        }
        if let Some(&existing) = self.by_id.get(&id) {
            return Err(FurError::Usage(format!(
                "type id 0x{id:08x} of '{name}' collides with '{}'",
                self.entries[existing].name
            )));
        }
        let index = self.entries.len();
        self.entries.push(TypeDescriptor {
            id,
            name,
            min_version,
            max_version,
            decode,
        });
        self.by_id.insert(id, index);
        self.by_name.insert(name, index);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &TypeDescriptor<T>> {
        self.entries.iter()
    }

    pub fn descriptor_by_name(&self, name: &str) -> Option<&TypeDescriptor<T>> {
        self.by_name.get(name).map(|&index| &self.entries[index])
    }

    pub fn descriptor_by_id(&self, id: u32) -> Option<&TypeDescriptor<T>> {
        self.by_id.get(&id).map(|&index| &self.entries[index])
    }
}

impl<T: Polymorphic> TypeRegistry<T> {
    /// Writes `value` under `key` with its type discriminant, enforcing
    /// the descriptor's version window against the codec's format
    /// version.
    pub fn write(&self, output: &mut dyn Codec, key: &str, value: &T) -> FurResult<()> {
        output.begin_write_object(key)?;
        self.write_root(output, value)?;
        output.end_write_object()
    }

    /// Reads a value of an unknown concrete type from under `key`.
    pub fn read(&self, input: &mut dyn Codec, key: &str) -> FurResult<T> {
        input.begin_read_object(key)?;
        let value = self.read_root(input)?;
        input.end_read_object()?;
        Ok(value)
    }

    /// As [`TypeRegistry::write`], but into the codec's current frame.
    /// Used where the value IS the document, e.g. one project file per
    /// asset.
    pub fn write_root(&self, output: &mut dyn Codec, value: &T) -> FurResult<()> {
        let name = value.type_name();
        let descriptor = self
            .descriptor_by_name(name)
            .ok_or_else(|| FurError::UnknownType(format!("name '{name}'")))?;
        check_window(descriptor, output.format_version())?;
        output.write_type_tag(TYPE_TAG_KEY, descriptor.id, descriptor.name)?;
        value.write_payload(output)
    }

    /// As [`TypeRegistry::read`], but from the codec's current frame.
    pub fn read_root(&self, input: &mut dyn Codec) -> FurResult<T> {
        let descriptor = match input.read_type_tag(TYPE_TAG_KEY)? {
            TypeTag::Id(id) => self
                .descriptor_by_id(id)
                .ok_or_else(|| FurError::UnknownType(format!("id 0x{id:08x}")))?,
            TypeTag::Name(name) => self
                .descriptor_by_name(&name)
                .ok_or_else(|| FurError::UnknownType(format!("name '{name}'")))?,
        };
        check_window(descriptor, input.format_version())?;
        (descriptor.decode)(input)
    }
}

fn check_window<T>(descriptor: &TypeDescriptor<T>, provided: u8) -> FurResult<()> {
    let below = provided < descriptor.min_version;
    let above = descriptor.max_version != 0 && provided > descriptor.max_version;
    if below || above {
        return Err(FurError::VersionIncompatible {
            type_name: descriptor.name.to_string(),
            provided,
            minimum: descriptor.min_version,
            maximum: descriptor.max_version,
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
