//! Named keyframe sequences from `@keyframes` blocks.
//!
//! The styling core parses and stores keyframes; playing them back over time
//! is the animation player's job.

use crate::declaration::Declaration;

/// One block inside a `@keyframes` rule: one or more offsets sharing a
/// declaration list, e.g. `0%, 100% { opacity: 0; }`.
#[derive(Debug, Clone)]
pub struct KeyframeBlock {
    /// Offsets in `[0.0, 1.0]`; `from` is 0.0 and `to` is 1.0.
    pub offsets: Vec<f64>,
    /// The declarations applied at those offsets.
    pub declarations: Vec<Declaration>,
}

impl KeyframeBlock {
    /// The smallest offset of the block, used for ordering.
    #[must_use]
    pub fn start_offset(&self) -> f64 {
        self.offsets.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

/// A named, offset-ordered sequence of keyframe blocks.
#[derive(Debug, Clone)]
pub struct Keyframe {
    /// The animation name this sequence is registered under.
    pub name: String,
    blocks: Vec<KeyframeBlock>,
}

impl Keyframe {
    /// Create an empty keyframe sequence.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blocks: Vec::new(),
        }
    }

    /// Append a block, keeping the block list ordered by start offset.
    /// Blocks with equal start offsets keep their insertion order.
    pub fn add_block(&mut self, block: KeyframeBlock) {
        let at = self
            .blocks
            .partition_point(|existing| existing.start_offset() <= block.start_offset());
        self.blocks.insert(at, block);
    }

    /// The blocks of this sequence, ordered by start offset.
    #[must_use]
    pub fn blocks(&self) -> &[KeyframeBlock] {
        &self.blocks
    }
}
