use crate::*;

/// Whether water leaving `from` through `dir` can enter `to`. True iff
/// `from` is open on that edge and `to` is open on the opposite edge.
/// Purely a function of its inputs; the flags are independent, so this is
/// not symmetric in general.
pub const fn can_connect(from: DirSet, to: DirSet, dir: Direction) -> bool {
    from.contains(dir.flag()) && to.contains(dir.opposite().flag())
}
