//! Mesh triangles.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Per-triangle state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct TriFlags: u32 {
        /// Scratch mark used by traversal passes.
        const MARKED = 0b0000_0001;
        /// Triangle is mid-transition and exempt from strict validation.
        const TAINTED = 0b0000_0010;
    }
}

/// A triangle referencing three nodes by index.
///
/// Winding is counter-clockwise when viewed from outside; face normals point
/// outward by the right-hand rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tri {
    /// The three node indices, CCW.
    pub nodes: [u32; 3],
    /// State flags.
    pub flags: TriFlags,
}

impl Tri {
    /// Create a triangle from three node indices.
    #[inline]
    #[must_use]
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        Self {
            nodes: [a, b, c],
            flags: TriFlags::empty(),
        }
    }

    /// True if `node` is one of the three referenced nodes.
    #[inline]
    #[must_use]
    pub fn contains(&self, node: u32) -> bool {
        self.nodes.contains(&node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_checks_all_slots() {
        let t = Tri::new(3, 7, 11);
        assert!(t.contains(7));
        assert!(!t.contains(5));
    }
}
