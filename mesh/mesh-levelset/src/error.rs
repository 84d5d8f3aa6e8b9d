//! Error types for levelset rasterization.

use thiserror::Error;

/// Result type for rasterization operations.
pub type LevelsetResult<T> = Result<T, LevelsetError>;

/// Errors that can occur during levelset rasterization.
#[derive(Debug, Error)]
pub enum LevelsetError {
    /// The mesh has no triangles to rasterize.
    #[error("mesh has no triangles")]
    EmptyMesh,

    /// The target grid has a zero-sized axis.
    #[error("grid size {size:?} has a zero axis")]
    EmptyGrid {
        /// The requested grid size.
        size: [usize; 3],
    },

    /// Sigma or cutoff is not positive.
    #[error("invalid parameters: sigma {sigma}, cutoff {cutoff} (both must be positive)")]
    InvalidParams {
        /// The requested kernel width.
        sigma: f32,
        /// The requested narrow-band half-width.
        cutoff: f32,
    },
}
