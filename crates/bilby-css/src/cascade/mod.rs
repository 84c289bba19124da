//! The matching engine: cascade ordering, declaration merging, and the
//! style resolution cache.
//!
//! [`StyleEngine`] is the explicit context every resolution goes through.
//! The active stylesheet stack lives behind an `Arc` snapshot: a resolution
//! pass clones the `Arc` on entry, so swapping stylesheets mid-flight can
//! never corrupt a pass already underway. Absence of a match is a normal,
//! total outcome — resolution has no failure mode.

mod cache;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};

use bilby_tree::{Descend, Styleable, enumerate_with_descendants};

use crate::declaration::Declaration;
use crate::selector::Specificity;
use crate::stylesheet::{MediaContext, RuleSet, Stylesheet};

pub use cache::{AssetKey, CachePolicy, ImageCache, StyleCache};

/// The outcome of resolving one node in one interaction state: the merged
/// declaration set, keyed by property name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleInfo {
    /// The interaction state this info was resolved for (`""` = default).
    pub state: String,
    declarations: BTreeMap<String, Declaration>,
    changeable: bool,
}

impl StyleInfo {
    /// The winning declaration for a property, if any rule set supplied one.
    #[must_use]
    pub fn declaration(&self, property: &str) -> Option<&Declaration> {
        self.declarations.get(property)
    }

    /// All merged declarations, ordered by property name.
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.values()
    }

    /// Number of properties with a winning declaration.
    #[must_use]
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// True when no rule set matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// True when some matching rule set was state-qualified, i.e. this
    /// node's styling changes with its interaction state.
    #[must_use]
    pub const fn changeable(&self) -> bool {
        self.changeable
    }
}

/// A matched rule set with its cascade sort key.
struct MatchedRule<'pass> {
    specificity: Specificity,
    stack_position: usize,
    source_index: usize,
    rule_set: &'pass RuleSet,
}

/// The styling context: active stylesheet stack, media context, cache
/// policy, and the resolution/image caches.
///
/// All methods take `&self`; interior synchronization makes the engine
/// shareable across threads. Lexing and parsing stay outside the engine —
/// it only consumes immutable [`Stylesheet`]s.
#[derive(Debug, Default)]
pub struct StyleEngine {
    stack: RwLock<Arc<Vec<Arc<Stylesheet>>>>,
    media: RwLock<MediaContext>,
    policy: RwLock<CachePolicy>,
    cache: Mutex<StyleCache>,
    images: Mutex<ImageCache>,
}

impl StyleEngine {
    /// Create an engine with no stylesheets and no caching.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with the given cache policy.
    #[must_use]
    pub fn with_policy(policy: CachePolicy) -> Self {
        let engine = Self::new();
        engine.set_cache_policy(policy);
        engine
    }

    /// Replace the active stylesheet stack. Stack order is low-to-high
    /// precedence among sheets of equal origin. In-flight resolutions keep
    /// the snapshot they started with; the cache is cleared because every
    /// prior resolution is now potentially wrong.
    ///
    /// # Panics
    /// Panics if an engine lock is poisoned.
    pub fn set_active_stylesheets(&self, sheets: Vec<Arc<Stylesheet>>) {
        *self.stack.write().unwrap() = Arc::new(sheets);
        self.cache.lock().unwrap().clear();
    }

    /// Snapshot the active stylesheet stack.
    ///
    /// # Panics
    /// Panics if an engine lock is poisoned.
    #[must_use]
    pub fn active_stylesheets(&self) -> Arc<Vec<Arc<Stylesheet>>> {
        Arc::clone(&self.stack.read().unwrap())
    }

    /// Update the media context queries are evaluated against. Cached
    /// resolutions are dropped since media groups may have toggled.
    ///
    /// # Panics
    /// Panics if an engine lock is poisoned.
    pub fn set_media_context(&self, media: MediaContext) {
        *self.media.write().unwrap() = media;
        self.cache.lock().unwrap().clear();
    }

    /// The current media context.
    ///
    /// # Panics
    /// Panics if an engine lock is poisoned.
    #[must_use]
    pub fn media_context(&self) -> MediaContext {
        *self.media.read().unwrap()
    }

    /// Set the cache policy.
    ///
    /// # Panics
    /// Panics if an engine lock is poisoned.
    pub fn set_cache_policy(&self, policy: CachePolicy) {
        *self.policy.write().unwrap() = policy;
    }

    /// The current cache policy.
    ///
    /// # Panics
    /// Panics if an engine lock is poisoned.
    #[must_use]
    pub fn cache_policy(&self) -> CachePolicy {
        *self.policy.read().unwrap()
    }

    /// Resolve the style of `node` in the given interaction state (`""` for
    /// the default state).
    ///
    /// Collects candidate rule sets from every active stylesheet (including
    /// media groups whose query holds), filters by structural match and
    /// state compatibility, sorts ascending by (origin, specificity, stack
    /// position, source index) and merges declarations in that order —
    /// later wins per property, with `!important` declarations forming a
    /// tier above all non-important ones.
    ///
    /// The resolution cache is consulted under [`CachePolicy::STYLE_ONCE`];
    /// the whole lookup-compute-store sequence runs under the cache lock so
    /// two passes for the same node/state key cannot interleave.
    ///
    /// # Panics
    /// Panics if an engine lock is poisoned.
    pub fn resolve_style<N: Styleable>(&self, node: &N, state: &str) -> Arc<StyleInfo> {
        let policy = self.cache_policy();
        let mut cache = self.cache.lock().unwrap();

        if policy.contains(CachePolicy::STYLE_ONCE)
            && let Some(cached) = cache.get(node.key(), state)
        {
            return cached;
        }

        let info = Arc::new(self.compute_style(node, state));
        if policy.caches_styles() {
            cache.insert(node.key(), state, Arc::clone(&info));
        }
        info
    }

    /// One full match-sort-merge pass, bypassing the cache.
    fn compute_style<N: Styleable>(&self, node: &N, state: &str) -> StyleInfo {
        let stack = self.active_stylesheets();
        let media = self.media_context();

        let mut matched: Vec<MatchedRule<'_>> = Vec::new();
        let mut changeable = false;

        for (stack_position, sheet) in stack.iter().enumerate() {
            for rule_set in sheet.active_rule_sets(&media) {
                if !rule_set.matches(node) {
                    continue;
                }
                if rule_set.is_state_dependent() {
                    changeable = true;
                }
                if rule_set.matches_with_state(node, state) {
                    matched.push(MatchedRule {
                        specificity: rule_set.specificity(),
                        stack_position,
                        source_index: rule_set.source_index(),
                        rule_set,
                    });
                }
            }
        }

        matched.sort_by(|a, b| {
            a.specificity
                .cmp(&b.specificity)
                .then(a.stack_position.cmp(&b.stack_position))
                .then(a.source_index.cmp(&b.source_index))
        });

        let mut normal: BTreeMap<String, Declaration> = BTreeMap::new();
        let mut important: BTreeMap<String, Declaration> = BTreeMap::new();
        for rule in &matched {
            for declaration in rule.rule_set.declarations() {
                let target = if declaration.important() {
                    &mut important
                } else {
                    &mut normal
                };
                let _ = target.insert(declaration.name().to_string(), declaration.clone());
            }
        }
        // The important tier sits above every non-important declaration,
        // while important declarations keep the same relative order among
        // themselves.
        normal.extend(important);

        StyleInfo {
            state: state.to_string(),
            declarations: normal,
            changeable,
        }
    }

    /// Report a mutation of `node` (class/id/attribute/state/parent
    /// change). Every cached state of the node is invalidated.
    ///
    /// # Panics
    /// Panics if an engine lock is poisoned.
    pub fn note_mutation<N: Styleable>(&self, node: &N) {
        self.cache.lock().unwrap().bump(node.key());
    }

    /// Explicitly invalidate a single node's cached styles.
    pub fn invalidate<N: Styleable>(&self, node: &N) {
        self.note_mutation(node);
    }

    /// Invalidate a node and all of its descendants. Each affected node is
    /// visited exactly once.
    ///
    /// # Panics
    /// Panics if an engine lock is poisoned.
    pub fn invalidate_subtree<N: Styleable>(&self, node: &N) {
        let mut cache = self.cache.lock().unwrap();
        let _ = enumerate_with_descendants(node, &mut |descendant: &N| {
            cache.bump(descendant.key());
            Descend::Continue
        });
    }

    /// Restyle `node` — and, when `recurse` is set, its whole subtree —
    /// visiting each node exactly once per pass.
    ///
    /// Under [`CachePolicy::SAVE_FOR_SUBTREE`] the subtree root is resolved
    /// once and its [`StyleInfo`] is propagated to qualifying descendants
    /// (nodes with no style id and no classes of their own) without
    /// re-matching them; tagged descendants resolve individually.
    /// Invalidation requested while a pass runs lands in the generation
    /// table and takes effect on the next pass.
    ///
    /// Returns the nodes styled this pass, paired with their infos.
    ///
    /// # Panics
    /// Panics if an engine lock is poisoned.
    pub fn update_styles<N: Styleable>(&self, node: &N, recurse: bool) -> Vec<(u64, Arc<StyleInfo>)> {
        let policy = self.cache_policy();
        let mut styled = Vec::new();

        if !recurse {
            let state = node.pseudo_class_state().unwrap_or_default().to_string();
            styled.push((node.key(), self.resolve_style(node, &state)));
            return styled;
        }

        let save_subtree = policy.contains(CachePolicy::SAVE_FOR_SUBTREE);
        let root_key = node.key();
        let root_info = {
            let state = node.pseudo_class_state().unwrap_or_default().to_string();
            self.resolve_style(node, &state)
        };
        styled.push((root_key, Arc::clone(&root_info)));

        let _ = enumerate_with_descendants(node, &mut |descendant: &N| {
            if descendant.key() == root_key {
                return Descend::Continue;
            }
            let state = descendant
                .pseudo_class_state()
                .unwrap_or_default()
                .to_string();
            if save_subtree && descendant.style_id().is_none() && descendant.style_classes().is_empty()
            {
                // Qualifying descendant: share the root's resolution
                // without an independent match pass.
                let mut cache = self.cache.lock().unwrap();
                cache.insert(descendant.key(), &state, Arc::clone(&root_info));
                styled.push((descendant.key(), Arc::clone(&root_info)));
            } else {
                styled.push((descendant.key(), self.resolve_style(descendant, &state)));
            }
            Descend::Continue
        });

        styled
    }

    /// Fetch a decoded asset from the image cache. Always a miss when
    /// [`CachePolicy::IMAGES`] is off.
    ///
    /// # Panics
    /// Panics if an engine lock is poisoned.
    #[must_use]
    pub fn cached_image(&self, key: &AssetKey) -> Option<Arc<Vec<u8>>> {
        if !self.cache_policy().caches_images() {
            return None;
        }
        self.images.lock().unwrap().get(key)
    }

    /// Store a decoded asset in the image cache. Ignored when
    /// [`CachePolicy::IMAGES`] is off.
    ///
    /// # Panics
    /// Panics if an engine lock is poisoned.
    pub fn cache_image(&self, key: AssetKey, data: Arc<Vec<u8>>) {
        if !self.cache_policy().caches_images() {
            return;
        }
        self.images.lock().unwrap().insert(key, data);
    }

    /// Number of live style cache entries (diagnostic).
    ///
    /// # Panics
    /// Panics if an engine lock is poisoned.
    #[must_use]
    pub fn style_cache_len(&self) -> usize {
        self.cache.lock().unwrap().len()
    }
}
