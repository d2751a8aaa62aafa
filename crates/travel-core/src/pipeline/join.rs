//! Two-branch join with a deadline

use std::future::IntoFuture;
use std::time::Duration;

use super::PipelineItem;

/// Outcome of a deadline-bounded rendezvous of two branches
#[derive(Debug)]
pub enum JoinResult<A, B> {
    /// Both branches reported before the deadline
    Completed(PipelineItem<A>, PipelineItem<B>),
    /// The deadline fired first; neither branch's item is available
    TimedOut(Duration),
}

impl<A, B> JoinResult<A, B> {
    pub fn is_timed_out(&self) -> bool {
        matches!(self, JoinResult::TimedOut(_))
    }
}

/// Start both branches concurrently and wait for both, up to `deadline`
///
/// On timeout both branch futures are dropped, so a branch stops at its next
/// suspension point. Anything a branch already committed before that point
/// stays committed.
pub async fn join_with_deadline<A, B, L, R>(left: L, right: R, deadline: Duration) -> JoinResult<A, B>
where
    L: IntoFuture<Output = PipelineItem<A>>,
    R: IntoFuture<Output = PipelineItem<B>>,
{
    let both = futures::future::join(left.into_future(), right.into_future());
    match tokio::time::timeout(deadline, both).await {
        Ok((left, right)) => JoinResult::Completed(left, right),
        Err(_) => JoinResult::TimedOut(deadline),
    }
}
