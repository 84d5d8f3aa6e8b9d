//! Attribute channels: typed side arrays kept length-synced with the node or
//! triangle array that owns them.
//!
//! A channel must always have exactly one entry per owner element. The mesh
//! drives the sync: appends push a default entry, swap-with-last triangle
//! removal calls [`Channel::remove_swap`], node merging calls
//! [`Channel::merge_with`], and node compaction calls [`Channel::renumber`]
//! with the relocation list it applied to node storage.

use std::any::Any;
use std::fmt::Debug;

use nalgebra::Vector3;

/// One storage relocation produced by node compaction: the value at `from`
/// moves to `to`, with `from >= new_len > to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    /// Source index (in the tail window being compacted away).
    pub from: u32,
    /// Destination index (a hole left by a deleted element).
    pub to: u32,
}

/// A per-node or per-triangle attribute side array.
///
/// Implementations form a closed set ([`ScalarChannel`], [`Vec3Channel`],
/// [`IntChannel`]); the mesh stores them as trait objects and callers get
/// typed access back through [`Channel::as_any`].
pub trait Channel: Debug {
    /// Current number of entries.
    fn len(&self) -> usize;

    /// True if the channel has no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resize to `new_len`, default-filling any growth.
    fn resize(&mut self, new_len: usize);

    /// Remove entry `idx` by swapping the last entry into its place and
    /// popping (the per-triangle removal policy).
    fn remove_swap(&mut self, idx: usize);

    /// Append a copy of entry `idx` (the per-triangle split policy).
    fn duplicate(&mut self, idx: usize);

    /// Blend entry `del` into entry `keep`:
    /// `keep = keep * (1 - weight) + del * weight` where interpolation is
    /// meaningful. Node merging uses a fixed weight of one half.
    fn merge_with(&mut self, keep: usize, del: usize, weight: f32);

    /// Apply a compaction remap: move each `Relocation`'s `from` entry to its
    /// `to` slot, then truncate to `new_len`.
    fn renumber(&mut self, moves: &[Relocation], new_len: usize);

    /// Downcast support for typed access.
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support for typed access.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

macro_rules! vec_channel_common {
    ($default:expr) => {
        fn len(&self) -> usize {
            self.data.len()
        }

        fn resize(&mut self, new_len: usize) {
            self.data.resize(new_len, $default);
        }

        fn remove_swap(&mut self, idx: usize) {
            self.data.swap_remove(idx);
        }

        fn duplicate(&mut self, idx: usize) {
            let v = self.data[idx];
            self.data.push(v);
        }

        fn renumber(&mut self, moves: &[Relocation], new_len: usize) {
            for m in moves {
                self.data[m.to as usize] = self.data[m.from as usize];
            }
            self.data.truncate(new_len);
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    };
}

/// A channel of `f32` values.
#[derive(Debug, Clone, Default)]
pub struct ScalarChannel {
    /// The values, one per owner element.
    pub data: Vec<f32>,
}

impl ScalarChannel {
    /// Create an empty scalar channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Channel for ScalarChannel {
    vec_channel_common!(0.0);

    fn merge_with(&mut self, keep: usize, del: usize, weight: f32) {
        self.data[keep] = self.data[keep] * (1.0 - weight) + self.data[del] * weight;
    }
}

/// A channel of 3-vectors.
#[derive(Debug, Clone, Default)]
pub struct Vec3Channel {
    /// The values, one per owner element.
    pub data: Vec<Vector3<f32>>,
}

impl Vec3Channel {
    /// Create an empty vector channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Channel for Vec3Channel {
    vec_channel_common!(Vector3::zeros());

    fn merge_with(&mut self, keep: usize, del: usize, weight: f32) {
        let merged = self.data[keep] * (1.0 - weight) + self.data[del] * weight;
        self.data[keep] = merged;
    }
}

/// A channel of `i32` values (ids, counters, flag words).
#[derive(Debug, Clone, Default)]
pub struct IntChannel {
    /// The values, one per owner element.
    pub data: Vec<i32>,
}

impl IntChannel {
    /// Create an empty integer channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Channel for IntChannel {
    vec_channel_common!(0);

    /// Integers do not interpolate; the `keep` value survives unchanged.
    fn merge_with(&mut self, _keep: usize, _del: usize, _weight: f32) {}
}
