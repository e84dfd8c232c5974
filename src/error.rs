use thiserror::Error;

/// Failures raised by the game simulation itself. All of them are
/// unrecoverable at the point of origin; there is no retry anywhere in the
/// core, the top level logs and exits.
#[derive(Debug, Error)]
pub enum GameError {
    /// The action vector was not a valid one-hot over the 3 legal turns.
    #[error("action {0:?} is not a one-hot over [left, straight, right]")]
    InvalidAction([f32; 3]),

    /// `step` was called after the episode terminated without a `reset`.
    #[error("step called on a terminated game; call reset first")]
    NotReset,

    /// No unoccupied cell could be found for food within the attempt bound.
    #[error("no free cell for food after {attempts} attempts")]
    FoodPlacementExhausted { attempts: u32 },
}
