//! Combining furballs outside the codec core.

use tracing::debug;

use furball_engine::Furball;

use crate::catalog::Asset;

/// Folds `patch` into `base`: dependencies dedupe by id (the first
/// filename hint wins), and a patch asset replaces any base asset that
/// shares its id. Everything else appends in order.
pub fn merge_furballs(base: &mut Furball<Asset>, patch: Furball<Asset>) {
    for dependency in patch.dependencies {
        if !base.dependencies.iter().any(|known| known.id == dependency.id) {
            base.dependencies.push(dependency);
        }
    }
    let mut replaced = 0usize;
    for asset in patch.assets {
        match base
            .assets
            .iter_mut()
            .find(|known| known.base().id == asset.base().id)
        {
            Some(slot) => {
                *slot = asset;
                replaced += 1;
            }
            None => base.assets.push(asset),
        }
    }
    debug!(replaced, total = base.assets.len(), "furballs merged");
}
