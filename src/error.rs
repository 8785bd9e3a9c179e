use thiserror::Error;

/// Failures surfaced by the generator.
///
/// Cells running out of candidates or losing connectivity are handled by
/// retrying and never show up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The grid cannot fit the tunnel and the ghost box.
    #[error("Grid of {height}x{width} is too small, need at least 3 rows and 8 columns")]
    GridTooSmall {
        /// Requested rows.
        height: usize,
        /// Columns after rounding up to even.
        width: usize,
    },

    /// A delay is negative, not a number, or too long to represent.
    #[error("Delay `{kind}` must be a finite, non-negative number of seconds")]
    InvalidDelay {
        /// Which timing was rejected.
        kind: &'static str,
    },

    /// Every grid attempt ended without a connected, fully collapsed half.
    #[error("Could not generate a valid grid after {attempts} attempts")]
    Exhausted {
        /// Grid attempts made.
        attempts: usize,
    },

    /// The boundary walk did not return to its first cell.
    #[error("Outline walk did not close after {steps} steps")]
    OutlineDiverged {
        /// Cells visited before giving up.
        steps: usize,
    },
}
