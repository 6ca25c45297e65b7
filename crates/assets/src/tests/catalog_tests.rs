use furball_engine::{
    BinaryCodec, Furball, FurballDependency, FurballMetadata, FurError, Polymorphic, SceneNode,
    SceneNodeKind, TreeCodec, ValidationMode,
};
use uuid::Uuid;

use crate::scripts::{InlineScript, SceneScript};

use super::*;

fn fixed_id(last: u8) -> Uuid {
    Uuid::from_fields(0x1000_0000, 0x20, 0x30, &[0, 0, 0, 0, 0, 0, 0, last])
}

fn sample_item() -> Asset {
    Asset::Item(ItemAsset {
        base: AssetBase {
            id: fixed_id(1),
            name: "item_warding_bell".to_string(),
        },
        object_name: "Warding Bell".to_string(),
        object_alias: "bell".to_string(),
        flavor_text: "It hums faintly when shaken.".to_string(),
        kind: ItemKind::Usable,
        value: 120,
        is_quest_item: false,
        usable: Some(UsableProps {
            use_description: "Ring it.".to_string(),
            consumable: false,
        }),
        icon: vec![0x89, 0x50, 0x4E, 0x47],
    })
}

fn sample_creature() -> Asset {
    Asset::Creature(CreatureAsset {
        base: AssetBase {
            id: fixed_id(2),
            name: "cr_marsh_wolf".to_string(),
        },
        object_name: "Marsh Wolf".to_string(),
        object_alias: "wolf".to_string(),
        flavor_text: "Lean and patient.".to_string(),
        strength: 7,
        agility: 9,
        body: 6,
        wits: 4,
        size: SizeClass::Large,
        is_predator: true,
        portrait: None,
    })
}

fn sample_scene() -> Asset {
    let mut root = SceneNode::new(SceneNodeKind::Root, "Root");
    let mut gate = SceneNode::new(SceneNodeKind::State, "gate");
    gate.trigger_script = Some(SceneScript::Inline(InlineScript {
        name: "OnGate".to_string(),
        body: "log('creak')".to_string(),
    }));
    root.children.push(gate);
    Asset::Scene(SceneAsset {
        base: AssetBase {
            id: fixed_id(3),
            name: "scene_gatehouse".to_string(),
        },
        root,
    })
}

fn sample_journal() -> Asset {
    Asset::Journal(JournalAsset {
        base: AssetBase {
            id: fixed_id(4),
            name: "journal_bell".to_string(),
        },
        title: "The Cracked Bell".to_string(),
        stages: vec![
            JournalStage {
                key: 10,
                text: "Find the bell.".to_string(),
            },
            JournalStage {
                key: 20,
                text: "Ring it at the gate.".to_string(),
            },
        ],
    })
}

fn sample_string_table() -> Asset {
    Asset::StringTable(StringTableAsset {
        base: AssetBase {
            id: fixed_id(5),
            name: "strings_gate".to_string(),
        },
        entries: vec![StringTableEntry {
            key: "GATE_CREAK".to_string(),
            texts: vec!["The gate creaks.".to_string(), "A dry groan of iron.".to_string()],
        }],
    })
}

fn sample_script() -> Asset {
    Asset::Script(ScriptAsset {
        base: AssetBase {
            id: fixed_id(6),
            name: "script_shared".to_string(),
        },
        body: "function fade() end".to_string(),
    })
}

fn sample_furball(format_version: u8) -> Furball<Asset> {
    let mut furball = Furball::new(FurballMetadata {
        id: fixed_id(0xAA),
        title: "Gatehouse Module".to_string(),
        author: "tester".to_string(),
        format_version,
    });
    furball.dependencies.push(FurballDependency {
        id: fixed_id(0xBB),
        filename_hint: "core.furball".to_string(),
    });
    furball.assets = vec![
        sample_item(),
        sample_creature(),
        sample_scene(),
        sample_journal(),
        sample_string_table(),
        sample_script(),
    ];
    furball
}

#[test]
fn every_catalog_type_roundtrips_in_a_container() {
    for version in [20u8, 21] {
        let furball = sample_furball(version);
        let bytes = furball.to_bytes(asset_registry()).expect("serialize");
        let outcome = Furball::from_bytes(&bytes, asset_registry()).expect("deserialize");
        assert!(outcome.failure.is_none(), "no asset may fail at v{version}");
        assert_eq!(outcome.furball.assets, furball.assets);
        assert_eq!(outcome.furball.dependencies, furball.dependencies);
    }
}

#[test]
fn every_catalog_type_roundtrips_through_the_tree() {
    let registry = asset_registry();
    for asset in sample_furball(21).assets {
        let mut out = TreeCodec::for_writing(21, ValidationMode::Strict);
        registry.write(&mut out, "Asset", &asset).expect("write");
        let root = out.into_value().expect("root");
        let mut input =
            TreeCodec::for_reading(root, 21, ValidationMode::Strict).expect("object root");
        let decoded = registry.read(&mut input, "Asset").expect("read");
        assert_eq!(decoded, asset);
    }
}

#[test]
fn script_assets_cannot_enter_version_19_containers() {
    let mut furball = sample_furball(19);
    furball.assets = vec![sample_script()];
    let err = furball
        .to_bytes(asset_registry())
        .expect_err("scripts arrived with version 20");
    assert!(matches!(
        err,
        FurError::VersionIncompatible {
            provided: 19,
            minimum: 20,
            ..
        }
    ));

    furball.metadata.format_version = 20;
    furball
        .to_bytes(asset_registry())
        .expect("the same asset serializes at version 20");
}

#[test]
fn usable_props_must_match_the_item_kind() {
    let Asset::Item(mut item) = sample_item() else {
        panic!("sample is an item");
    };
    item.usable = None;

    let mut out = BinaryCodec::for_writing(20, ValidationMode::Strict);
    let err = Asset::Item(item.clone())
        .write_payload(&mut out)
        .expect_err("usable kind without usable props");
    assert!(matches!(err, FurError::Validation(_)));

    // Relaxed mode lets the mismatch through.
    let mut out = BinaryCodec::for_writing(20, ValidationMode::Relaxed);
    Asset::Item(item)
        .write_payload(&mut out)
        .expect("relaxed mode skips the invariant");
}
