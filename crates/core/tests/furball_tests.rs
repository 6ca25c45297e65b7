mod common;

use common::{full_registry, narrow_registry, sample_furball, Relic};
use furball_engine::version::{FURBALL_MAGIC, LATEST_VERSION};
use furball_engine::{FurError, Furball};

#[test]
fn container_roundtrips_at_every_supported_version() {
    let registry = full_registry();
    for version in [19u8, 20, 21] {
        let furball = sample_furball(version);
        let bytes = furball.to_bytes(&registry).expect("serialize");
        assert_eq!(&bytes[..7], &FURBALL_MAGIC);
        assert_eq!(bytes[7], version);

        let outcome = Furball::from_bytes(&bytes, &registry).expect("deserialize");
        assert!(outcome.failure.is_none());
        assert_eq!(outcome.furball.metadata, furball.metadata);
        assert_eq!(outcome.furball.dependencies, furball.dependencies);
        assert_eq!(outcome.furball.assets, furball.assets);
    }
}

#[test]
fn version_20_output_is_deterministic_and_uncompressed() {
    let registry = full_registry();
    let furball = sample_furball(20);
    let first = furball.to_bytes(&registry).expect("serialize");
    let second = furball.to_bytes(&registry).expect("serialize");
    assert_eq!(first, second);

    // The body is plain bytes: the metadata identifier follows the
    // header verbatim, which a compressed block would not.
    let id_bytes = &first[8..12];
    assert_eq!(id_bytes, &[0x40, 0x48, 0x44, 0x7D]);
}

#[test]
fn version_21_compresses_repetitive_bodies() {
    let registry = full_registry();
    let old = sample_furball(20).to_bytes(&registry).expect("serialize");
    let new = sample_furball(21).to_bytes(&registry).expect("serialize");
    // Same logical content, one compressed body: the newer wire form is
    // smaller despite identical data.
    assert!(new.len() < old.len(), "{} !< {}", new.len(), old.len());
}

#[test]
fn bad_magic_is_fatal() {
    let registry = full_registry();
    let mut bytes = sample_furball(20).to_bytes(&registry).expect("serialize");
    bytes[0] = b'X';
    let err = Furball::from_bytes(&bytes, &registry).expect_err("magic is wrong");
    assert!(matches!(err, FurError::Malformed(_)));
}

#[test]
fn unsupported_version_fails_before_the_payload() {
    let registry = full_registry();
    let mut bytes = sample_furball(20).to_bytes(&registry).expect("serialize");
    bytes[7] = 18;
    let err = Furball::from_bytes(&bytes, &registry).expect_err("version below the window");
    assert!(matches!(
        err,
        FurError::UnsupportedVersion { found: 18, .. }
    ));
}

#[test]
fn truncated_header_is_fatal() {
    let registry = full_registry();
    let err = Furball::from_bytes(b"FURB", &registry).expect_err("header cut short");
    assert!(matches!(err, FurError::Malformed(_)));
}

#[test]
fn failing_asset_keeps_the_ones_before_it() {
    let registry = full_registry();
    let mut furball = sample_furball(20);
    furball.assets.clear();
    furball.assets.push(Relic::Trinket {
        name: "first".to_string(),
        charge: 1,
    });
    furball.assets.push(Relic::Trinket {
        name: "second".to_string(),
        charge: 2,
    });
    furball.assets.push(Relic::Cursed);
    furball.assets.push(Relic::Trinket {
        name: "fourth".to_string(),
        charge: 4,
    });
    furball.assets.push(Relic::Trinket {
        name: "fifth".to_string(),
        charge: 5,
    });

    let bytes = furball.to_bytes(&registry).expect("serialize");
    let outcome = Furball::from_bytes(&bytes, &registry).expect("partial read succeeds");

    assert_eq!(outcome.furball.assets.len(), 2);
    assert_eq!(
        outcome.furball.assets[1],
        Relic::Trinket {
            name: "second".to_string(),
            charge: 2,
        }
    );
    let failure = outcome.failure.expect("third asset failed");
    assert_eq!(failure.index, 2);
    assert!(matches!(failure.error, FurError::Malformed(_)));
}

#[test]
fn unknown_asset_type_degrades_the_same_way() {
    let furball = sample_furball(LATEST_VERSION);
    let bytes = furball.to_bytes(&full_registry()).expect("serialize");

    // A reader without the gem type keeps the first asset and reports
    // the unknown id in the second slot.
    let outcome = Furball::from_bytes(&bytes, &narrow_registry()).expect("partial read succeeds");
    assert_eq!(outcome.furball.assets.len(), 1);
    let failure = outcome.failure.expect("gem is unknown");
    assert_eq!(failure.index, 1);
    assert!(matches!(failure.error, FurError::UnknownType(_)));
}
