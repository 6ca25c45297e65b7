use crate::codec::{BinaryCodec, Codec, TreeCodec, ValidationMode};
use crate::error::{FurError, FurResult};
use crate::registry::{Polymorphic, TypeRegistry};

use super::{CompassDirection, SceneNode, SceneNodeKind};

#[derive(Clone, Debug, PartialEq)]
struct Note {
    text: String,
}

impl Polymorphic for Note {
    fn type_name(&self) -> &'static str {
        "ScriptNote"
    }

    fn write_payload(&self, output: &mut dyn Codec) -> FurResult<()> {
        output.write_string("Text", &self.text)
    }
}

fn decode_note(input: &mut dyn Codec) -> FurResult<Note> {
    Ok(Note {
        text: input.read_string("Text")?,
    })
}

fn scripts() -> TypeRegistry<Note> {
    let mut registry = TypeRegistry::new();
    registry
        .register("ScriptNote", 19, 0, decode_note)
        .expect("note registers");
    registry
}

fn sample_tree() -> SceneNode<Note> {
    let mut root = SceneNode::new(SceneNodeKind::Root, "entry");
    let mut hall = SceneNode::new(SceneNodeKind::State, "hall");
    let mut veil = SceneNode::new(SceneNodeKind::Choice, "veil");
    veil.title = "Part the veil".to_string();
    veil.tooltip = "It shimmers".to_string();
    veil.highlight = true;
    veil.button_width = 1.5;
    veil.trigger_script = Some(Note {
        text: "push aside".to_string(),
    });
    let mut door = SceneNode::new(SceneNodeKind::Compass, "door");
    door.compass_direction = CompassDirection::West;
    door.compass_target = "cellar".to_string();
    let mut alias = SceneNode::new(SceneNodeKind::Link, "alias");
    alias.link_target = "veil".to_string();

    hall.children.push(veil);
    root.children.push(hall);
    root.children.push(SceneNode::new(SceneNodeKind::State, "yard"));
    // Compass and link nodes hang off states.
    root.children[1].children.push(door);
    root.children[1].children.push(alias);
    root
}

#[test]
fn tree_roundtrips_through_binary() {
    let registry = scripts();
    let tree = sample_tree();

    let mut out = BinaryCodec::for_writing(20, ValidationMode::Strict);
    tree.write_into(&mut out, &registry).expect("write");
    let mut input = BinaryCodec::for_reading(out.into_bytes(), 20, ValidationMode::Strict);
    let decoded = SceneNode::read_from(&mut input, &registry).expect("read");

    assert_eq!(decoded, tree);
    assert_eq!(decoded.subtree_len(), 6);
}

#[test]
fn tree_roundtrips_through_structured() {
    let registry = scripts();
    let tree = sample_tree();

    let mut out = TreeCodec::for_writing(21, ValidationMode::Strict);
    tree.write_into(&mut out, &registry).expect("write");
    let root = out.into_value().expect("root");

    let mut input =
        TreeCodec::for_reading(root, 21, ValidationMode::Strict).expect("root is an object");
    let decoded = SceneNode::read_from(&mut input, &registry).expect("read");
    assert_eq!(decoded, tree);
}

#[test]
fn link_with_children_fails_strict_validation() {
    let registry = scripts();
    let mut link = SceneNode::new(SceneNodeKind::Link, "shortcut");
    link.link_target = "hall".to_string();
    link.children.push(SceneNode::new(SceneNodeKind::State, "stray"));

    let mut out = BinaryCodec::for_writing(20, ValidationMode::Strict);
    let err = link
        .write_into(&mut out, &registry)
        .expect_err("children are illegal on a link");
    match err {
        FurError::ScenePath { path, source } => {
            assert_eq!(path, "shortcut");
            assert!(matches!(*source, FurError::Validation(_)));
        }
        other => panic!("expected a path-wrapped validation error, got {other:?}"),
    }
}

#[test]
fn relaxed_link_writes_only_base_fields() {
    let registry = scripts();
    let mut with_children = SceneNode::new(SceneNodeKind::Link, "shortcut");
    with_children.link_target = "hall".to_string();
    with_children
        .children
        .push(SceneNode::new(SceneNodeKind::State, "stray"));
    let mut bare = SceneNode::new(SceneNodeKind::Link, "shortcut");
    bare.link_target = "hall".to_string();

    let mut out = BinaryCodec::for_writing(20, ValidationMode::Relaxed);
    with_children.write_into(&mut out, &registry).expect("write");
    let relaxed_bytes = out.into_bytes();

    let mut out = BinaryCodec::for_writing(20, ValidationMode::Relaxed);
    bare.write_into(&mut out, &registry).expect("write");
    assert_eq!(relaxed_bytes, out.into_bytes());
}

#[test]
fn compass_cannot_carry_children_but_keeps_scripts() {
    let registry = scripts();
    let mut door = SceneNode::new(SceneNodeKind::Compass, "door");
    door.compass_target = "cellar".to_string();
    door.trigger_script = Some(Note {
        text: "creak".to_string(),
    });
    door.children.push(SceneNode::new(SceneNodeKind::State, "stray"));

    let mut out = BinaryCodec::for_writing(20, ValidationMode::Strict);
    let err = door
        .write_into(&mut out, &registry)
        .expect_err("children are illegal on a compass");
    assert!(matches!(err, FurError::ScenePath { .. }));

    door.children.clear();
    let mut out = BinaryCodec::for_writing(20, ValidationMode::Strict);
    door.write_into(&mut out, &registry).expect("scripts are fine");
}

#[test]
fn deep_failures_surface_a_root_to_node_path() {
    let registry = scripts();
    let document = serde_json::json!({
        "Kind": "Root",
        "Key": "entry",
        "Children": [
            {
                "Kind": "State",
                "Key": "hall",
                "Children": [
                    {
                        "Kind": "Choice",
                        "Key": "veil",
                        "Highlight": "yes"
                    }
                ]
            }
        ]
    });

    let mut input = TreeCodec::for_reading(document, 21, ValidationMode::Strict)
        .expect("root is an object");
    let err = SceneNode::<Note>::read_from(&mut input, &registry)
        .expect_err("the deep boolean is a string");
    match err {
        FurError::ScenePath { path, source } => {
            assert_eq!(path, "entry/hall/veil");
            assert!(matches!(*source, FurError::Malformed(_)));
        }
        other => panic!("expected a path-wrapped error, got {other:?}"),
    }
}
