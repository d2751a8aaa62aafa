//! Create-if-absent pipelines for resources with a natural key
//!
//! The existence probe and the candidate branch run concurrently under a
//! deadline. A missing resource is the go-ahead to insert; an existing one is
//! a conflict. The probe and the insert are not atomic, so concurrent creators
//! can both pass the probe; the store's unique index rejects the loser, which
//! then surfaces as a conflict as well.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::debug;

use crate::error::{ErrorKind, PipelineError};
use crate::pipeline::{Pipeline, PipelineItem};

/// A resource identified by a natural key rather than its ID
#[async_trait]
pub trait NaturalKeyResource: Send + Sync {
    /// Fields of a resource that does not exist yet
    type Candidate: Clone + Send + Sync + 'static;
    /// Stored form returned by a successful probe
    type Existing: Send + 'static;

    fn describe(candidate: &Self::Candidate) -> String;

    /// Look the candidate's natural key up, failing with `NotFound` if absent
    async fn probe(&self, candidate: &Self::Candidate) -> PipelineItem<Self::Existing>;

    async fn insert(&self, candidate: &Self::Candidate) -> PipelineItem<i64>;
}

/// A candidate together with the moment it entered the pipeline
#[derive(Debug, Clone)]
pub struct Stamped<C> {
    pub value: C,
    pub at: DateTime<Utc>,
}

/// Build the pipeline that inserts `candidate` unless its natural key is taken
///
/// Fails with `Conflict` if the resource exists, `Timeout` if the probe does
/// not report within `deadline`, and passes any other probe or insert error
/// through.
pub fn create_if_absent<R>(resource: &R, candidate: R::Candidate, deadline: Duration) -> Pipeline<'_, i64>
where
    R: NaturalKeyResource + ?Sized,
{
    let key = candidate.clone();
    let probe = Pipeline::from_future(async move { resource.probe(&key).await });
    let stamp = Pipeline::from_future(async move {
        Ok(Stamped {
            value: candidate,
            at: Utc::now(),
        })
    });

    probe
        .join(stamp, deadline, |existing, stamped| {
            let stamped = stamped?;
            match existing {
                Ok(_) => Err(PipelineError::Conflict(format!(
                    "{} already exists",
                    R::describe(&stamped.value)
                ))),
                Err(err) if err.is(ErrorKind::NotFound) => Ok(stamped),
                Err(err) => Err(err),
            }
        })
        .map(move |stamped| async move {
            debug!(
                "Inserting {} (probed at {})",
                R::describe(&stamped.value),
                stamped.at
            );
            resource.insert(&stamped.value).await
        })
}
