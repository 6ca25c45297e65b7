//! The recursive, kind-tagged scene node tree.
//!
//! A node's kind statically determines which optional fields are legal;
//! kinds that cannot carry scripts or children assert their absence
//! under strict validation. Errors from recursive decoding accumulate
//! the node keys they passed through, so a deep failure reads as a
//! root-to-node path.

use crate::codec::{Codec, CodecExt, TagSet};
use crate::error::{FurError, FurResult};
use crate::registry::{Polymorphic, TypeRegistry};

/// Kind tag of one scene node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneNodeKind {
    Root,
    State,
    Choice,
    Link,
    Compass,
}

impl TagSet for SceneNodeKind {
    const VALUES: &'static [Self] = &[
        SceneNodeKind::Root,
        SceneNodeKind::State,
        SceneNodeKind::Choice,
        SceneNodeKind::Link,
        SceneNodeKind::Compass,
    ];

    fn tag(self) -> &'static str {
        match self {
            SceneNodeKind::Root => "Root",
            SceneNodeKind::State => "State",
            SceneNodeKind::Choice => "Choice",
            SceneNodeKind::Link => "Link",
            SceneNodeKind::Compass => "Compass",
        }
    }
}

impl SceneNodeKind {
    /// Whether nodes of this kind may carry a child list.
    pub fn allows_children(self) -> bool {
        matches!(
            self,
            SceneNodeKind::Root | SceneNodeKind::State | SceneNodeKind::Choice
        )
    }

    /// Whether nodes of this kind may carry trigger/appearance scripts.
    pub fn allows_scripts(self) -> bool {
        !matches!(self, SceneNodeKind::Link)
    }
}

/// Direction of a compass link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompassDirection {
    North,
    West,
    South,
    East,
}

impl TagSet for CompassDirection {
    const VALUES: &'static [Self] = &[
        CompassDirection::North,
        CompassDirection::West,
        CompassDirection::South,
        CompassDirection::East,
    ];

    fn tag(self) -> &'static str {
        match self {
            CompassDirection::North => "North",
            CompassDirection::West => "West",
            CompassDirection::South => "South",
            CompassDirection::East => "East",
        }
    }
}

/// One node of the scene tree, generic over the polymorphic script
/// payload family. A node has no identity beyond its key; link and
/// compass targets are resolved by name outside the codec core.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode<S> {
    pub kind: SceneNodeKind,
    pub key: String,
    /// Choice only: button caption.
    pub title: String,
    /// Choice only: hover tooltip.
    pub tooltip: String,
    /// Choice only: draw the button highlighted.
    pub highlight: bool,
    /// Choice only: relative button width.
    pub button_width: f32,
    /// Link only: key of the node this link aliases.
    pub link_target: String,
    /// Compass only.
    pub compass_direction: CompassDirection,
    /// Compass only: key of the scene the compass leads to.
    pub compass_target: String,
    /// Script run when the node is taken. Never on link nodes.
    pub trigger_script: Option<S>,
    /// Script deciding whether the node is shown. Never on link nodes.
    pub appearance_script: Option<S>,
    pub children: Vec<SceneNode<S>>,
}

impl<S> SceneNode<S> {
    pub fn new(kind: SceneNodeKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
            title: String::new(),
            tooltip: String::new(),
            highlight: false,
            button_width: 1.0,
            link_target: String::new(),
            compass_direction: CompassDirection::North,
            compass_target: String::new(),
            trigger_script: None,
            appearance_script: None,
            children: Vec::new(),
        }
    }

    /// Total node count of the subtree rooted here, self included.
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(SceneNode::subtree_len)
            .sum::<usize>()
    }
}

impl<S: Polymorphic> SceneNode<S> {
    pub fn write_into(
        &self,
        output: &mut dyn Codec,
        scripts: &TypeRegistry<S>,
    ) -> FurResult<()> {
        self.write_fields(output, scripts)
            .map_err(|err| err.at_node(&self.key))
    }

    fn write_fields(&self, output: &mut dyn Codec, scripts: &TypeRegistry<S>) -> FurResult<()> {
        if output.validation().is_strict() {
            self.check_shape()?;
        }
        output.write_tag("Kind", self.kind)?;
        output.write_string("Key", &self.key)?;
        match self.kind {
            SceneNodeKind::Choice => {
                output.write_string("Title", &self.title)?;
                output.write_string("Tooltip", &self.tooltip)?;
                output.write_bool("Highlight", self.highlight)?;
                output.write_f32("ButtonWidth", self.button_width)?;
            }
            SceneNodeKind::Link => {
                output.write_string("LinkTarget", &self.link_target)?;
            }
            SceneNodeKind::Compass => {
                output.write_tag("Direction", self.compass_direction)?;
                output.write_string("CompassTarget", &self.compass_target)?;
            }
            SceneNodeKind::Root | SceneNodeKind::State => {}
        }
        if self.kind.allows_scripts() {
            write_script_slot(output, scripts, "TriggerScript", self.trigger_script.as_ref())?;
            write_script_slot(
                output,
                scripts,
                "AppearanceScript",
                self.appearance_script.as_ref(),
            )?;
        }
        if self.kind.allows_children() {
            output.begin_write_list("Children", self.children.len())?;
            for child in &self.children {
                output.begin_write_object("Item")?;
                child.write_into(output, scripts)?;
                output.end_write_object()?;
            }
            output.end_write_list()?;
        }
        Ok(())
    }

    pub fn read_from(input: &mut dyn Codec, scripts: &TypeRegistry<S>) -> FurResult<Self> {
        let kind: SceneNodeKind = input.read_tag("Kind")?;
        let key = input.read_string("Key")?;
        let mut node = SceneNode::new(kind, key);
        node.read_fields(input, scripts)
            .map_err(|err| err.at_node(&node.key))?;
        Ok(node)
    }

    fn read_fields(&mut self, input: &mut dyn Codec, scripts: &TypeRegistry<S>) -> FurResult<()> {
        match self.kind {
            SceneNodeKind::Choice => {
                self.title = input.read_string("Title")?;
                self.tooltip = input.read_string("Tooltip")?;
                self.highlight = input.read_bool("Highlight")?;
                self.button_width = input.read_f32("ButtonWidth")?;
            }
            SceneNodeKind::Link => {
                self.link_target = input.read_string("LinkTarget")?;
            }
            SceneNodeKind::Compass => {
                self.compass_direction = input.read_tag("Direction")?;
                self.compass_target = input.read_string("CompassTarget")?;
            }
            SceneNodeKind::Root | SceneNodeKind::State => {}
        }
        if self.kind.allows_scripts() {
            self.trigger_script = read_script_slot(input, scripts, "TriggerScript")?;
            self.appearance_script = read_script_slot(input, scripts, "AppearanceScript")?;
        }
        if self.kind.allows_children() {
            let count = input.begin_read_list("Children")?;
            self.children.reserve(count);
            for _ in 0..count {
                input.begin_read_object("Item")?;
                let child = SceneNode::read_from(input, scripts)?;
                input.end_read_object()?;
                self.children.push(child);
            }
            input.end_read_list()?;
        }
        Ok(())
    }

    fn check_shape(&self) -> FurResult<()> {
        let kind = self.kind.tag();
        if !self.kind.allows_children() && !self.children.is_empty() {
            return Err(FurError::Validation(format!(
                "{kind} node '{}' cannot carry children",
                self.key
            )));
        }
        if !self.kind.allows_scripts()
            && (self.trigger_script.is_some() || self.appearance_script.is_some())
        {
            return Err(FurError::Validation(format!(
                "{kind} node '{}' cannot carry scripts",
                self.key
            )));
        }
        Ok(())
    }
}

fn write_script_slot<S: Polymorphic>(
    output: &mut dyn Codec,
    scripts: &TypeRegistry<S>,
    key: &str,
    slot: Option<&S>,
) -> FurResult<()> {
    output.write_presence(key, slot.is_some())?;
    match slot {
        Some(script) => scripts.write(output, key, script),
        None => Ok(()),
    }
}

fn read_script_slot<S: Polymorphic>(
    input: &mut dyn Codec,
    scripts: &TypeRegistry<S>,
    key: &str,
) -> FurResult<Option<S>> {
    if input.read_presence(key)? {
        Ok(Some(scripts.read(input, key)?))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
#[path = "tests/scene_tests.rs"]
mod tests;
