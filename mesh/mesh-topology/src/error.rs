//! Error types for topology maintenance.
//!
//! Every variant is a fatal condition: the operation aborts and the mesh must
//! be considered unusable until explicitly rebuilt from scratch. There is no
//! partial-success or degraded mode.

use thiserror::Error;

/// Result type for topology operations.
pub type TopologyResult<T> = Result<T, TopologyError>;

/// Errors raised by topology maintenance and validation.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// A corner has no opposite under strict mode (boundary edge where none
    /// is allowed).
    #[error("corner {corner} of triangle {tri} has no opposite (boundary edge in strict mode)")]
    MissingOpposite {
        /// The unmatched corner index.
        corner: usize,
        /// Its owning triangle index.
        tri: usize,
    },

    /// Opposite links are not mutual.
    #[error("opposite link not mutual: corner {corner} -> {opposite} -> {back}")]
    OppositeNotMutual {
        /// The corner whose link was followed.
        corner: usize,
        /// Its claimed opposite.
        opposite: usize,
        /// Where the opposite points back to.
        back: usize,
    },

    /// A single-node fan walk hit a boundary edge.
    #[error("one-ring walk around node {node} hit an open fan (missing opposite at corner {corner})")]
    OpenFan {
        /// The node whose ring was being rebuilt.
        node: usize,
        /// The corner whose opposite was missing.
        corner: usize,
    },

    /// Corner count does not match triangle count.
    #[error("corner table out of sync: {corners} corners for {tris} triangles (expected {})", .tris * 3)]
    CornerCountMismatch {
        /// Number of corners present.
        corners: usize,
        /// Number of triangles present.
        tris: usize,
    },

    /// A corner's cached fields disagree with its owning triangle.
    #[error("corner {corner} inconsistent with triangle {tri}: {details}")]
    CornerMismatch {
        /// The offending corner index.
        corner: usize,
        /// Its owning triangle index.
        tri: usize,
        /// Which field disagreed.
        details: String,
    },

    /// Ring storage does not cover the node array.
    #[error("one-ring cache covers {rings} nodes but the mesh has {nodes}")]
    RingStorageMismatch {
        /// Number of rings present.
        rings: usize,
        /// Number of nodes present.
        nodes: usize,
    },

    /// A node's one-ring disagrees with its incident triangles.
    #[error("one-ring of node {node} inconsistent: {details}")]
    RingMismatch {
        /// The offending node index.
        node: usize,
        /// What disagreed.
        details: String,
    },

    /// A channel's length does not match its owning array.
    #[error("channel {channel} length {len} does not match owner length {expected}")]
    ChannelLengthMismatch {
        /// Registration index of the channel.
        channel: usize,
        /// The channel's length.
        len: usize,
        /// The owning array's length.
        expected: usize,
    },

    /// A node, triangle, or corner index is out of range.
    #[error("{kind} index {index} out of range (count {count})")]
    IndexOutOfRange {
        /// What kind of index: "node", "triangle", or "corner".
        kind: &'static str,
        /// The offending index.
        index: usize,
        /// The valid count.
        count: usize,
    },

    /// A triangle or corner still references a node scheduled for deletion.
    #[error("triangle {tri} still references deleted node {node}")]
    DeletedNodeReferenced {
        /// The referencing triangle.
        tri: usize,
        /// The deleted node index.
        node: usize,
    },
}
