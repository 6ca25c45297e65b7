//! Shared test fixtures: a tiny polymorphic asset family.
#![allow(dead_code)]

use furball_engine::{
    Codec, FurError, FurResult, Furball, FurballDependency, FurballMetadata, Polymorphic,
    TypeRegistry,
};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq)]
pub enum Relic {
    Trinket { name: String, charge: i32 },
    Gem { facets: i32 },
    /// Decoding a cursed relic always fails; used to exercise the
    /// partial-recovery read path.
    Cursed,
}

impl Polymorphic for Relic {
    fn type_name(&self) -> &'static str {
        match self {
            Relic::Trinket { .. } => "RelicTrinket",
            Relic::Gem { .. } => "RelicGem",
            Relic::Cursed => "RelicCursed",
        }
    }

    fn write_payload(&self, output: &mut dyn Codec) -> FurResult<()> {
        match self {
            Relic::Trinket { name, charge } => {
                output.write_string("Name", name)?;
                output.write_i32("Charge", *charge)
            }
            Relic::Gem { facets } => output.write_i32("Facets", *facets),
            Relic::Cursed => Ok(()),
        }
    }
}

fn decode_trinket(input: &mut dyn Codec) -> FurResult<Relic> {
    Ok(Relic::Trinket {
        name: input.read_string("Name")?,
        charge: input.read_i32("Charge")?,
    })
}

fn decode_gem(input: &mut dyn Codec) -> FurResult<Relic> {
    Ok(Relic::Gem {
        facets: input.read_i32("Facets")?,
    })
}

fn decode_cursed(_input: &mut dyn Codec) -> FurResult<Relic> {
    Err(FurError::Malformed("the curse bites back".to_string()))
}

pub fn full_registry() -> TypeRegistry<Relic> {
    let mut registry = TypeRegistry::new();
    registry
        .register("RelicTrinket", 19, 0, decode_trinket)
        .expect("trinket registers");
    registry
        .register("RelicGem", 19, 0, decode_gem)
        .expect("gem registers");
    registry
        .register("RelicCursed", 19, 0, decode_cursed)
        .expect("cursed registers");
    registry
}

/// A registry that has never heard of gems.
pub fn narrow_registry() -> TypeRegistry<Relic> {
    let mut registry = TypeRegistry::new();
    registry
        .register("RelicTrinket", 19, 0, decode_trinket)
        .expect("trinket registers");
    registry
        .register("RelicCursed", 19, 0, decode_cursed)
        .expect("cursed registers");
    registry
}

pub fn sample_furball(format_version: u8) -> Furball<Relic> {
    let mut furball = Furball::new(FurballMetadata {
        id: Uuid::parse_str("7d444840-9dc0-11d1-b245-5ffdce74fad2").expect("fixed id"),
        title: "Hollow of Whispers".to_string(),
        author: "A. Badger".to_string(),
        format_version,
    });
    furball.dependencies.push(FurballDependency {
        id: Uuid::parse_str("11111111-2222-3333-4444-555555555555").expect("fixed id"),
        filename_hint: "base.furball".to_string(),
    });
    furball.assets.push(Relic::Trinket {
        name: "Warding bell, tarnished but serviceable".to_string(),
        charge: 3,
    });
    furball.assets.push(Relic::Gem { facets: 12 });
    furball.assets.push(Relic::Trinket {
        name: "Warding bell, tarnished but serviceable".to_string(),
        charge: -1,
    });
    furball
}
