//! Scene-scoped memoization of material assets.

use std::collections::HashMap;
use std::sync::Arc;

use bevy::prelude::*;

use crate::derived_maps::MaterialAsset;
use crate::descriptor::SurfaceClass;

/// Identifies one painted material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureKey {
    pub class: SurfaceClass,
    /// 24-bit base color.
    pub color: u32,
    /// Square buffer dimension.
    pub resolution: usize,
}

impl TextureKey {
    pub fn new(class: SurfaceClass, color: u32, resolution: usize) -> Self {
        Self {
            class,
            color,
            resolution,
        }
    }
}

/// Material assets keyed by [`TextureKey`]. Entries live until [`dispose`].
///
/// [`dispose`]: TextureCache::dispose
#[derive(Default)]
pub struct TextureCache {
    entries: HashMap<TextureKey, Arc<MaterialAsset>>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the asset for `key`, running `factory` only on first request.
    pub fn get_or_create<F>(&mut self, key: TextureKey, factory: F) -> Arc<MaterialAsset>
    where
        F: FnOnce() -> MaterialAsset,
    {
        if let Some(asset) = self.entries.get(&key) {
            debug!("Texture cache hit for {:?}", key);
            return Arc::clone(asset);
        }
        let asset = Arc::new(factory());
        self.entries.insert(key, Arc::clone(&asset));
        asset
    }

    pub fn get(&self, key: &TextureKey) -> Option<Arc<MaterialAsset>> {
        self.entries.get(key).cloned()
    }

    pub fn contains(&self, key: &TextureKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry, releasing pixel storage for assets nobody else
    /// holds. Returns the number of entries dropped.
    pub fn dispose(&mut self) -> usize {
        let count = self.entries.len();
        for (_, asset) in self.entries.drain() {
            if let Ok(mut owned) = Arc::try_unwrap(asset) {
                owned.release();
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derived_maps::build_material_asset;
    use crate::rng::SeededRandom;

    fn make(class: SurfaceClass) -> MaterialAsset {
        let mut rng = SeededRandom::from_state(1);
        build_material_asset(class, class.default_color(), 8, &mut rng)
    }

    #[test]
    fn test_factory_runs_once_per_key() {
        let mut cache = TextureCache::new();
        let key = TextureKey::new(SurfaceClass::Rocky, 0x8B4513, 8);
        let mut calls = 0;

        let first = cache.get_or_create(key, || {
            calls += 1;
            make(SurfaceClass::Rocky)
        });
        let second = cache.get_or_create(key, || {
            calls += 1;
            make(SurfaceClass::Rocky)
        });

        assert_eq!(calls, 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_keys_get_distinct_entries() {
        let mut cache = TextureCache::new();
        cache.get_or_create(TextureKey::new(SurfaceClass::Rocky, 0x8B4513, 8), || {
            make(SurfaceClass::Rocky)
        });
        cache.get_or_create(TextureKey::new(SurfaceClass::Rocky, 0x8B4513, 16), || {
            make(SurfaceClass::Rocky)
        });
        cache.get_or_create(TextureKey::new(SurfaceClass::GasGiant, 0x8B4513, 8), || {
            make(SurfaceClass::GasGiant)
        });
        assert_eq!(cache.len(), 3);
        assert!(cache.contains(&TextureKey::new(SurfaceClass::Rocky, 0x8B4513, 16)));
    }

    #[test]
    fn test_dispose_clears_everything() {
        let mut cache = TextureCache::new();
        let key = TextureKey::new(SurfaceClass::Star, 0xFFAA00, 8);
        cache.get_or_create(key, || make(SurfaceClass::Star));
        assert_eq!(cache.dispose(), 1);
        assert!(cache.is_empty());
        assert!(cache.get(&key).is_none());

        let mut calls = 0;
        cache.get_or_create(key, || {
            calls += 1;
            make(SurfaceClass::Star)
        });
        assert_eq!(calls, 1, "a disposed cache paints again");
    }
}
