use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid configuration")]
    InvalidConfiguration,
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Tile cannot be replaced")]
    InvalidReplacement,
    #[error("No valid starting point placement exists")]
    PlacementUnsatisfiable,
}

pub type Result<T> = core::result::Result<T, GameError>;
