//! The concrete asset payload catalog.
//!
//! Every asset is a plain record that reads and writes its fields in a
//! fixed order through the codec contract. The registry built here is
//! the single dispatch point the container reader uses to decode assets
//! it has not seen the concrete type of.

use std::sync::OnceLock;

use furball_engine::{
    Codec, CodecExt, FurError, FurResult, Polymorphic, Saveable, SceneNode, TagSet, TypeRegistry,
};
use uuid::Uuid;

use crate::scripts::{scene_script_registry, SceneScript};

/// Identity shared by every asset: a stable id and a human-facing name.
/// The name doubles as the file stem in the project-directory form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetBase {
    pub id: Uuid,
    pub name: String,
}

impl AssetBase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }

    fn write_into<C: Codec + ?Sized>(&self, output: &mut C) -> FurResult<()> {
        output.write_id("AssetID", self.id)?;
        output.write_string("AssetName", &self.name)
    }

    fn read_from<C: Codec + ?Sized>(input: &mut C) -> FurResult<Self> {
        Ok(Self {
            id: input.read_id("AssetID")?,
            name: input.read_string("AssetName")?,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemKind {
    Generic,
    Usable,
    Equipable,
}

impl TagSet for ItemKind {
    const VALUES: &'static [Self] = &[ItemKind::Generic, ItemKind::Usable, ItemKind::Equipable];

    fn tag(self) -> &'static str {
        match self {
            ItemKind::Generic => "Generic",
            ItemKind::Usable => "Usable",
            ItemKind::Equipable => "Equipable",
        }
    }
}

impl Default for ItemKind {
    fn default() -> Self {
        ItemKind::Generic
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeClass {
    Tiny,
    Small,
    Medium,
    Large,
    Huge,
}

impl TagSet for SizeClass {
    const VALUES: &'static [Self] = &[
        SizeClass::Tiny,
        SizeClass::Small,
        SizeClass::Medium,
        SizeClass::Large,
        SizeClass::Huge,
    ];

    fn tag(self) -> &'static str {
        match self {
            SizeClass::Tiny => "Tiny",
            SizeClass::Small => "Small",
            SizeClass::Medium => "Medium",
            SizeClass::Large => "Large",
            SizeClass::Huge => "Huge",
        }
    }
}

impl Default for SizeClass {
    fn default() -> Self {
        SizeClass::Medium
    }
}

/// Extra fields carried only by usable items.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UsableProps {
    pub use_description: String,
    pub consumable: bool,
}

impl Saveable for UsableProps {
    fn write_into<C: Codec + ?Sized>(&self, output: &mut C) -> FurResult<()> {
        output.write_string("UseDescription", &self.use_description)?;
        output.write_bool("Consumable", self.consumable)
    }

    fn read_from<C: Codec + ?Sized>(input: &mut C) -> FurResult<Self> {
        Ok(Self {
            use_description: input.read_string("UseDescription")?,
            consumable: input.read_bool("Consumable")?,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemAsset {
    pub base: AssetBase,
    pub object_name: String,
    pub object_alias: String,
    pub flavor_text: String,
    pub kind: ItemKind,
    /// Purchase value in coins; zero marks the item unsellable.
    pub value: i32,
    pub is_quest_item: bool,
    pub usable: Option<UsableProps>,
    /// Icon bytes; redirected to a `<name>.png` sibling file in the
    /// project-directory form.
    pub icon: Vec<u8>,
}

impl ItemAsset {
    fn icon_file_name(&self) -> String {
        format!("{}.png", self.base.name)
    }

    fn write_payload<C: Codec + ?Sized>(&self, output: &mut C) -> FurResult<()> {
        if output.validation().is_strict() && self.usable.is_some() != (self.kind == ItemKind::Usable)
        {
            return Err(FurError::Validation(format!(
                "item '{}' must carry usable properties exactly when its kind is Usable",
                self.base.name
            )));
        }
        self.base.write_into(output)?;
        output.write_string("ObjectName", &self.object_name)?;
        output.write_string("ObjectAlias", &self.object_alias)?;
        output.write_string("FlavorText", &self.flavor_text)?;
        output.write_tag("ItemKind", self.kind)?;
        output.write_i32("PurchaseValue", self.value)?;
        output.write_bool("IsQuestItem", self.is_quest_item)?;
        output.write_optional_object("Usable", self.usable.as_ref())?;
        output.write_external_bytes("Icon", &self.icon_file_name(), &self.icon)
    }

    fn read_payload<C: Codec + ?Sized>(input: &mut C) -> FurResult<Self> {
        let base = AssetBase::read_from(input)?;
        let mut item = ItemAsset {
            base,
            object_name: input.read_string("ObjectName")?,
            object_alias: input.read_string("ObjectAlias")?,
            flavor_text: input.read_string("FlavorText")?,
            kind: input.read_tag("ItemKind")?,
            value: input.read_i32("PurchaseValue")?,
            is_quest_item: input.read_bool("IsQuestItem")?,
            usable: input.read_optional_object("Usable")?,
            icon: Vec::new(),
        };
        item.icon = input.read_external_bytes("Icon", &item.icon_file_name())?;
        Ok(item)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreatureAsset {
    pub base: AssetBase,
    pub object_name: String,
    pub object_alias: String,
    pub flavor_text: String,
    pub strength: i32,
    pub agility: i32,
    pub body: i32,
    pub wits: i32,
    pub size: SizeClass,
    pub is_predator: bool,
    pub portrait: Option<Vec<u8>>,
}

impl CreatureAsset {
    fn write_payload<C: Codec + ?Sized>(&self, output: &mut C) -> FurResult<()> {
        self.base.write_into(output)?;
        output.write_string("ObjectName", &self.object_name)?;
        output.write_string("ObjectAlias", &self.object_alias)?;
        output.write_string("FlavorText", &self.flavor_text)?;
        output.write_i32("Strength", self.strength)?;
        output.write_i32("Agility", self.agility)?;
        output.write_i32("Body", self.body)?;
        output.write_i32("Wits", self.wits)?;
        output.write_tag("Size", self.size)?;
        output.write_bool("IsPredator", self.is_predator)?;
        output.write_optional_bytes("Portrait", self.portrait.as_deref())
    }

    fn read_payload<C: Codec + ?Sized>(input: &mut C) -> FurResult<Self> {
        Ok(Self {
            base: AssetBase::read_from(input)?,
            object_name: input.read_string("ObjectName")?,
            object_alias: input.read_string("ObjectAlias")?,
            flavor_text: input.read_string("FlavorText")?,
            strength: input.read_i32("Strength")?,
            agility: input.read_i32("Agility")?,
            body: input.read_i32("Body")?,
            wits: input.read_i32("Wits")?,
            size: input.read_tag("Size")?,
            is_predator: input.read_bool("IsPredator")?,
            portrait: input.read_optional_bytes("Portrait")?,
        })
    }
}

/// A scene: one rooted node tree plus its polymorphic scripts.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneAsset {
    pub base: AssetBase,
    pub root: SceneNode<SceneScript>,
}

impl SceneAsset {
    fn write_payload(&self, output: &mut dyn Codec) -> FurResult<()> {
        self.base.write_into(output)?;
        output.begin_write_object("Root")?;
        self.root.write_into(output, scene_script_registry())?;
        output.end_write_object()
    }

    fn read_payload(input: &mut dyn Codec) -> FurResult<Self> {
        let base = AssetBase::read_from(input)?;
        input.begin_read_object("Root")?;
        let root = SceneNode::read_from(input, scene_script_registry())?;
        input.end_read_object()?;
        Ok(SceneAsset { base, root })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JournalStage {
    pub key: i32,
    pub text: String,
}

impl Saveable for JournalStage {
    fn write_into<C: Codec + ?Sized>(&self, output: &mut C) -> FurResult<()> {
        output.write_i32("Key", self.key)?;
        output.write_string("Text", &self.text)
    }

    fn read_from<C: Codec + ?Sized>(input: &mut C) -> FurResult<Self> {
        Ok(Self {
            key: input.read_i32("Key")?,
            text: input.read_string("Text")?,
        })
    }
}

/// A quest journal: a title and its ordered stages.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JournalAsset {
    pub base: AssetBase,
    pub title: String,
    pub stages: Vec<JournalStage>,
}

impl JournalAsset {
    fn write_payload<C: Codec + ?Sized>(&self, output: &mut C) -> FurResult<()> {
        self.base.write_into(output)?;
        output.write_string("Title", &self.title)?;
        output.write_list("Stages", &self.stages)
    }

    fn read_payload<C: Codec + ?Sized>(input: &mut C) -> FurResult<Self> {
        Ok(Self {
            base: AssetBase::read_from(input)?,
            title: input.read_string("Title")?,
            stages: input.read_list("Stages")?,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringTableEntry {
    pub key: String,
    pub texts: Vec<String>,
}

impl Saveable for StringTableEntry {
    fn write_into<C: Codec + ?Sized>(&self, output: &mut C) -> FurResult<()> {
        output.write_string("Key", &self.key)?;
        output.write_string_list("Texts", &self.texts)
    }

    fn read_from<C: Codec + ?Sized>(input: &mut C) -> FurResult<Self> {
        Ok(Self {
            key: input.read_string("Key")?,
            texts: input.read_string_list("Texts")?,
        })
    }
}

/// Randomizable text lines, several alternatives per key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringTableAsset {
    pub base: AssetBase,
    pub entries: Vec<StringTableEntry>,
}

impl StringTableAsset {
    fn write_payload<C: Codec + ?Sized>(&self, output: &mut C) -> FurResult<()> {
        self.base.write_into(output)?;
        output.write_list("Entries", &self.entries)
    }

    fn read_payload<C: Codec + ?Sized>(input: &mut C) -> FurResult<Self> {
        Ok(Self {
            base: AssetBase::read_from(input)?,
            entries: input.read_list("Entries")?,
        })
    }
}

/// A named top-level script module. Introduced with format version 20;
/// older containers cannot carry it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScriptAsset {
    pub base: AssetBase,
    pub body: String,
}

impl ScriptAsset {
    fn write_payload<C: Codec + ?Sized>(&self, output: &mut C) -> FurResult<()> {
        self.base.write_into(output)?;
        output.write_string("Body", &self.body)
    }

    fn read_payload<C: Codec + ?Sized>(input: &mut C) -> FurResult<Self> {
        Ok(Self {
            base: AssetBase::read_from(input)?,
            body: input.read_string("Body")?,
        })
    }
}

/// The polymorphic asset family stored in a furball.
#[derive(Clone, Debug, PartialEq)]
pub enum Asset {
    Item(ItemAsset),
    Creature(CreatureAsset),
    Scene(SceneAsset),
    Journal(JournalAsset),
    StringTable(StringTableAsset),
    Script(ScriptAsset),
}

impl Asset {
    pub fn base(&self) -> &AssetBase {
        match self {
            Asset::Item(asset) => &asset.base,
            Asset::Creature(asset) => &asset.base,
            Asset::Scene(asset) => &asset.base,
            Asset::Journal(asset) => &asset.base,
            Asset::StringTable(asset) => &asset.base,
            Asset::Script(asset) => &asset.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut AssetBase {
        match self {
            Asset::Item(asset) => &mut asset.base,
            Asset::Creature(asset) => &mut asset.base,
            Asset::Scene(asset) => &mut asset.base,
            Asset::Journal(asset) => &mut asset.base,
            Asset::StringTable(asset) => &mut asset.base,
            Asset::Script(asset) => &mut asset.base,
        }
    }
}

impl Polymorphic for Asset {
    fn type_name(&self) -> &'static str {
        match self {
            Asset::Item(_) => "AssetItem",
            Asset::Creature(_) => "AssetCreature",
            Asset::Scene(_) => "AssetScene",
            Asset::Journal(_) => "AssetJournal",
            Asset::StringTable(_) => "AssetStringTable",
            Asset::Script(_) => "AssetScript",
        }
    }

    fn write_payload(&self, output: &mut dyn Codec) -> FurResult<()> {
        match self {
            Asset::Item(asset) => asset.write_payload(output),
            Asset::Creature(asset) => asset.write_payload(output),
            Asset::Scene(asset) => asset.write_payload(output),
            Asset::Journal(asset) => asset.write_payload(output),
            Asset::StringTable(asset) => asset.write_payload(output),
            Asset::Script(asset) => asset.write_payload(output),
        }
    }
}

fn decode_item(input: &mut dyn Codec) -> FurResult<Asset> {
    Ok(Asset::Item(ItemAsset::read_payload(input)?))
}

fn decode_creature(input: &mut dyn Codec) -> FurResult<Asset> {
    Ok(Asset::Creature(CreatureAsset::read_payload(input)?))
}

fn decode_scene(input: &mut dyn Codec) -> FurResult<Asset> {
    Ok(Asset::Scene(SceneAsset::read_payload(input)?))
}

fn decode_journal(input: &mut dyn Codec) -> FurResult<Asset> {
    Ok(Asset::Journal(JournalAsset::read_payload(input)?))
}

fn decode_string_table(input: &mut dyn Codec) -> FurResult<Asset> {
    Ok(Asset::StringTable(StringTableAsset::read_payload(input)?))
}

fn decode_script(input: &mut dyn Codec) -> FurResult<Asset> {
    Ok(Asset::Script(ScriptAsset::read_payload(input)?))
}

/// The asset dispatch table, built once before any concurrent use.
pub fn asset_registry() -> &'static TypeRegistry<Asset> {
    static REGISTRY: OnceLock<TypeRegistry<Asset>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut registry = TypeRegistry::new();
        registry
            .register("AssetItem", 19, 0, decode_item)
            .expect("item registers once");
        registry
            .register("AssetCreature", 19, 0, decode_creature)
            .expect("creature registers once");
        registry
            .register("AssetScene", 19, 0, decode_scene)
            .expect("scene registers once");
        registry
            .register("AssetJournal", 19, 0, decode_journal)
            .expect("journal registers once");
        registry
            .register("AssetStringTable", 19, 0, decode_string_table)
            .expect("string table registers once");
        registry
            .register("AssetScript", 20, 0, decode_script)
            .expect("script registers once");
        registry
    })
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
