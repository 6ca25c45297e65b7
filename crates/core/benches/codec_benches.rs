use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use furball_engine::{
    BinaryCodec, Codec, CodecExt, Furball, FurballDependency, FurballMetadata, FurResult,
    Polymorphic, TypeRegistry, ValidationMode,
};
use uuid::Uuid;

#[derive(Clone, Debug)]
struct Pebble {
    name: String,
    weight: i32,
}

impl Polymorphic for Pebble {
    fn type_name(&self) -> &'static str {
        "Pebble"
    }

    fn write_payload(&self, output: &mut dyn Codec) -> FurResult<()> {
        output.write_string("Name", &self.name)?;
        output.write_i32("Weight", self.weight)
    }
}

fn decode_pebble(input: &mut dyn Codec) -> FurResult<Pebble> {
    Ok(Pebble {
        name: input.read_string("Name")?,
        weight: input.read_i32("Weight")?,
    })
}

fn registry() -> TypeRegistry<Pebble> {
    let mut registry = TypeRegistry::new();
    registry
        .register("Pebble", 19, 0, decode_pebble)
        .expect("pebble registers");
    registry
}

fn sample_furball(asset_count: usize, format_version: u8) -> Furball<Pebble> {
    let mut furball = Furball::new(FurballMetadata {
        id: Uuid::new_v4(),
        title: "Bench Hollow".to_string(),
        author: "criterion".to_string(),
        format_version,
    });
    furball.dependencies.push(FurballDependency {
        id: Uuid::new_v4(),
        filename_hint: "base.furball".to_string(),
    });
    for index in 0..asset_count {
        furball.assets.push(Pebble {
            name: format!("Pebble {index} from the riverbed"),
            weight: index as i32,
        });
    }
    furball
}

fn bench_binary_primitives(c: &mut Criterion) {
    c.bench_function("binary_write_mixed_fields", |b| {
        b.iter(|| {
            let mut out = BinaryCodec::for_writing(20, ValidationMode::Strict);
            for index in 0..256i32 {
                out.write_i32("Value", index).expect("write");
                out.write_string("Name", "a moderately sized field value").expect("write");
                out.write_bool("Flag", index % 2 == 0).expect("write");
            }
            out.into_bytes()
        })
    });

    c.bench_function("binary_read_string_list", |b| {
        let mut out = BinaryCodec::for_writing(20, ValidationMode::Strict);
        let names: Vec<String> = (0..500).map(|index| format!("entry {index}")).collect();
        out.write_string_list("Names", &names).expect("write");
        let bytes = out.into_bytes();
        b.iter_batched(
            || bytes.clone(),
            |bytes| {
                let mut input = BinaryCodec::for_reading(bytes, 20, ValidationMode::Strict);
                input.read_string_list("Names").expect("read")
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_container(c: &mut Criterion) {
    let registry = registry();

    for version in [20u8, 21] {
        let furball = sample_furball(200, version);
        let bytes = furball.to_bytes(&registry).expect("serialize");

        c.bench_function(&format!("furball_write_v{version}"), |b| {
            b.iter(|| furball.to_bytes(&registry).expect("serialize"))
        });
        c.bench_function(&format!("furball_read_v{version}"), |b| {
            b.iter(|| Furball::from_bytes(&bytes, &registry).expect("deserialize"))
        });
    }
}

criterion_group!(benches, bench_binary_primitives, bench_container);
criterion_main!(benches);
