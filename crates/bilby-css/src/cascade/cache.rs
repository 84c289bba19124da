//! Style cache policy, the per-node resolution cache, and the orthogonal
//! image cache.
//!
//! Cache validity uses generation counters instead of dirty bits: every
//! reported node mutation bumps the node's generation, and a cached entry is
//! only served while its stored generation matches. Stale entries are
//! detected at read time and dropped.

use std::collections::{HashMap, VecDeque};
use std::ops::BitOr;
use std::sync::Arc;

use super::StyleInfo;

/// Cache behavior flags. Flags combine with `|`:
///
/// - [`CachePolicy::STYLE_ONCE`] — skip re-resolution while a node reports
///   no mutation since its last resolution.
/// - [`CachePolicy::SAVE_FOR_SUBTREE`] — resolve a subtree root once and
///   propagate its [`StyleInfo`] to qualifying descendants.
/// - [`CachePolicy::IMAGES`] — cache decoded assets (orthogonal to
///   declaration resolution).
///
/// When `STYLE_ONCE` and `SAVE_FOR_SUBTREE` are both set, subtree
/// propagation wins at a subtree root and `STYLE_ONCE` governs whether the
/// root's own resolution is reused on later passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CachePolicy(u8);

impl CachePolicy {
    /// No caching: every resolution recomputes.
    pub const NONE: Self = Self(0);
    /// Reuse a node's resolution until it reports a mutation.
    pub const STYLE_ONCE: Self = Self(1);
    /// Resolve subtree roots once and propagate to qualifying descendants.
    pub const SAVE_FOR_SUBTREE: Self = Self(2);
    /// Cache decoded assets.
    pub const IMAGES: Self = Self(4);
    /// All flags.
    pub const ALL: Self = Self(1 | 2 | 4);

    /// True if every flag of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if resolved styles are cached at all.
    #[must_use]
    pub const fn caches_styles(self) -> bool {
        self.0 & (Self::STYLE_ONCE.0 | Self::SAVE_FOR_SUBTREE.0) != 0
    }

    /// True if decoded assets are cached.
    #[must_use]
    pub const fn caches_images(self) -> bool {
        self.contains(Self::IMAGES)
    }
}

impl BitOr for CachePolicy {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// One cached resolution.
#[derive(Debug, Clone)]
struct CacheEntry {
    info: Arc<StyleInfo>,
    generation: u64,
}

/// The per-node style resolution cache, keyed by (node key, state).
///
/// Entry validity is tied 1:1 to its key: any reported mutation of the node
/// bumps the node's generation, which invalidates every state entry of that
/// node at the next read.
#[derive(Debug, Default)]
pub struct StyleCache {
    entries: HashMap<(u64, String), CacheEntry>,
    generations: HashMap<u64, u64>,
}

impl StyleCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current generation of a node key.
    #[must_use]
    pub fn generation(&self, key: u64) -> u64 {
        self.generations.get(&key).copied().unwrap_or(0)
    }

    /// Bump a node's generation, invalidating all of its cached states.
    pub fn bump(&mut self, key: u64) {
        let counter = self.generations.entry(key).or_insert(0);
        *counter += 1;
        // Entries are dropped eagerly so the map does not accumulate dead
        // states for frequently mutated nodes.
        self.entries.retain(|(entry_key, _), _| *entry_key != key);
    }

    /// Fetch a live entry. Stale entries (generation mismatch) are removed
    /// and reported as absent.
    pub fn get(&mut self, key: u64, state: &str) -> Option<Arc<StyleInfo>> {
        let current = self.generation(key);
        let map_key = (key, state.to_string());
        match self.entries.get(&map_key) {
            Some(entry) if entry.generation == current => Some(Arc::clone(&entry.info)),
            Some(entry) => {
                // A stored generation can lag the counter (stale) but must
                // never lead it; leading would mean an invalidation was
                // lost, which is a programming error in the cache itself.
                debug_assert!(
                    entry.generation < current,
                    "cache entry generation ahead of node generation"
                );
                let _ = self.entries.remove(&map_key);
                None
            }
            None => None,
        }
    }

    /// Store a resolution for (key, state) at the node's current generation.
    pub fn insert(&mut self, key: u64, state: &str, info: Arc<StyleInfo>) {
        let generation = self.generation(key);
        let _ = self.entries.insert(
            (key, state.to_string()),
            CacheEntry { info, generation },
        );
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries are cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry and generation.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.generations.clear();
    }
}

/// Identity of a decoded asset: source plus the decode dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey {
    /// Where the asset came from.
    pub source: String,
    /// Decoded width in pixels.
    pub width: u32,
    /// Decoded height in pixels.
    pub height: u32,
}

/// An orthogonal cache for decoded assets, keyed by [`AssetKey`].
///
/// Unrelated to declaration resolution; it only exists because re-decoding
/// background images on every restyle is wasteful. Bounded by entry count
/// and total byte size, evicting oldest-first.
#[derive(Debug)]
pub struct ImageCache {
    entries: HashMap<AssetKey, Arc<Vec<u8>>>,
    order: VecDeque<AssetKey>,
    max_entries: usize,
    max_bytes: usize,
    bytes: usize,
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new(128, 16 * 1024 * 1024)
    }
}

impl ImageCache {
    /// Create a cache bounded by entry count and total byte size.
    #[must_use]
    pub fn new(max_entries: usize, max_bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            max_entries,
            max_bytes,
            bytes: 0,
        }
    }

    /// Fetch a decoded asset.
    #[must_use]
    pub fn get(&self, key: &AssetKey) -> Option<Arc<Vec<u8>>> {
        self.entries.get(key).map(Arc::clone)
    }

    /// Store a decoded asset, evicting oldest entries while over either
    /// limit.
    pub fn insert(&mut self, key: AssetKey, data: Arc<Vec<u8>>) {
        if let Some(previous) = self.entries.remove(&key) {
            self.bytes -= previous.len();
            self.order.retain(|existing| *existing != key);
        }
        self.bytes += data.len();
        self.order.push_back(key.clone());
        let _ = self.entries.insert(key, data);

        while self.entries.len() > self.max_entries || self.bytes > self.max_bytes {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if let Some(evicted) = self.entries.remove(&oldest) {
                self.bytes -= evicted.len();
            }
        }
    }

    /// Number of cached assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cached asset.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.bytes = 0;
    }
}
