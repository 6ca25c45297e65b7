//! The polymorphic script payload family referenced by scene nodes.

use std::sync::OnceLock;

use furball_engine::{Codec, FurResult, Polymorphic, TypeRegistry};

/// A script whose source lives inside the container.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineScript {
    pub name: String,
    pub body: String,
}

/// A script resolved by name from a shared module elsewhere in the
/// project; only the reference is stored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExternalScript {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SceneScript {
    Inline(InlineScript),
    External(ExternalScript),
}

impl Polymorphic for SceneScript {
    fn type_name(&self) -> &'static str {
        match self {
            SceneScript::Inline(_) => "ScriptInline",
            SceneScript::External(_) => "ScriptExternal",
        }
    }

    fn write_payload(&self, output: &mut dyn Codec) -> FurResult<()> {
        match self {
            SceneScript::Inline(script) => {
                output.write_string("Name", &script.name)?;
                output.write_string("Body", &script.body)
            }
            SceneScript::External(script) => output.write_string("Name", &script.name),
        }
    }
}

fn decode_inline(input: &mut dyn Codec) -> FurResult<SceneScript> {
    Ok(SceneScript::Inline(InlineScript {
        name: input.read_string("Name")?,
        body: input.read_string("Body")?,
    }))
}

fn decode_external(input: &mut dyn Codec) -> FurResult<SceneScript> {
    Ok(SceneScript::External(ExternalScript {
        name: input.read_string("Name")?,
    }))
}

/// The script dispatch table, built once before any concurrent use.
pub fn scene_script_registry() -> &'static TypeRegistry<SceneScript> {
    static REGISTRY: OnceLock<TypeRegistry<SceneScript>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut registry = TypeRegistry::new();
        registry
            .register("ScriptInline", 19, 0, decode_inline)
            .expect("inline script registers once");
        registry
            .register("ScriptExternal", 19, 0, decode_external)
            .expect("external script registers once");
        registry
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use furball_engine::{BinaryCodec, TreeCodec, ValidationMode};

    #[test]
    fn scripts_roundtrip_through_both_back_ends() {
        let registry = scene_script_registry();
        let scripts = [
            SceneScript::Inline(InlineScript {
                name: "OnEnter".to_string(),
                body: "bell:ring()".to_string(),
            }),
            SceneScript::External(ExternalScript {
                name: "SharedFade".to_string(),
            }),
        ];

        for script in &scripts {
            let mut out = BinaryCodec::for_writing(20, ValidationMode::Strict);
            registry.write(&mut out, "Script", script).expect("write");
            let mut input =
                BinaryCodec::for_reading(out.into_bytes(), 20, ValidationMode::Strict);
            assert_eq!(&registry.read(&mut input, "Script").expect("read"), script);

            let mut out = TreeCodec::for_writing(20, ValidationMode::Strict);
            registry.write(&mut out, "Script", script).expect("write");
            let root = out.into_value().expect("root");
            let mut input =
                TreeCodec::for_reading(root, 20, ValidationMode::Strict).expect("object root");
            assert_eq!(&registry.read(&mut input, "Script").expect("read"), script);
        }
    }
}
