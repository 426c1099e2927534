use crate::*;
pub use random::*;

mod random;

/// Builds a fully-populated board (tiles plus the single starting point)
/// from a game configuration.
pub trait BoardGenerator {
    fn generate(self, config: &GameConfig) -> Result<Grid>;
}
