//! Staged asynchronous pipelines
//!
//! A [`Pipeline`] carries one [`PipelineItem`] through a chain of stages.
//! Once the item holds an error, `map` stages are skipped and the error flows
//! to the end unchanged; only [`Pipeline::intercept`] can turn an error of a
//! chosen kind back into a value. Two operators start concurrent work:
//! [`Pipeline::fan_out`] over a list and [`Pipeline::join`] of two branches
//! under a deadline.
//!
//! Nothing runs until the pipeline is awaited.

mod fan_out;
mod join;

pub use fan_out::fan_out;
pub use join::{JoinResult, join_with_deadline};

use futures::future::{BoxFuture, FutureExt};
use std::future::{Future, IntoFuture};
use std::time::Duration;

use crate::error::{ErrorKind, PipelineError};

/// Value or error flowing between stages
pub type PipelineItem<T> = Result<T, PipelineError>;

/// A lazily evaluated chain of fallible stages producing a `T`
#[must_use = "pipelines do nothing unless awaited"]
pub struct Pipeline<'a, T> {
    item: BoxFuture<'a, PipelineItem<T>>,
}

impl<'a, T: Send + 'a> Pipeline<'a, T> {
    /// Start a pipeline from a value
    pub fn just(value: T) -> Self {
        Self::from_item(Ok(value))
    }

    /// Start a pipeline from an item that may already be an error
    pub fn from_item(item: PipelineItem<T>) -> Self {
        Self {
            item: futures::future::ready(item).boxed(),
        }
    }

    /// Start a pipeline from a future producing an item
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = PipelineItem<T>> + Send + 'a,
    {
        Self {
            item: future.boxed(),
        }
    }

    /// Apply an asynchronous fallible stage to the value
    ///
    /// The stage does not run if the incoming item is an error.
    pub fn map<U, F, Fut>(self, stage: F) -> Pipeline<'a, U>
    where
        U: Send + 'a,
        F: FnOnce(T) -> Fut + Send + 'a,
        Fut: Future<Output = PipelineItem<U>> + Send + 'a,
    {
        Pipeline::from_future(async move {
            let value = self.item.await?;
            stage(value).await
        })
    }

    /// Apply a synchronous fallible stage to the value
    pub fn map_sync<U, F>(self, stage: F) -> Pipeline<'a, U>
    where
        U: Send + 'a,
        F: FnOnce(T) -> PipelineItem<U> + Send + 'a,
    {
        Pipeline::from_future(async move { stage(self.item.await?) })
    }

    /// Replace an error of the given kind with a recovered value
    ///
    /// Values and errors of any other kind pass through untouched.
    pub fn intercept<F>(self, kind: ErrorKind, recover: F) -> Self
    where
        F: FnOnce(PipelineError) -> T + Send + 'a,
    {
        Pipeline::from_future(async move {
            match self.item.await {
                Err(err) if err.is(kind) => Ok(recover(err)),
                item => item,
            }
        })
    }

    /// Run this pipeline and `other` concurrently and combine their items
    ///
    /// `combine` sees both items, errors included, only if both branches
    /// finish before `deadline`. Otherwise the result is a `Timeout` error and
    /// both branches are dropped.
    pub fn join<B, R, C>(self, other: Pipeline<'a, B>, deadline: Duration, combine: C) -> Pipeline<'a, R>
    where
        B: Send + 'a,
        R: Send + 'a,
        C: FnOnce(PipelineItem<T>, PipelineItem<B>) -> PipelineItem<R> + Send + 'a,
    {
        Pipeline::from_future(async move {
            let both = futures::future::join(self.item, other.item);
            match tokio::time::timeout(deadline, both).await {
                Ok((left, right)) => combine(left, right),
                Err(_) => Err(PipelineError::Timeout(deadline)),
            }
        })
    }
}

impl<'a, I: Send + 'a> Pipeline<'a, Vec<I>> {
    /// Apply a stage to every element with at most `concurrency` in flight
    ///
    /// See [`fan_out`] for ordering and failure semantics.
    pub fn fan_out<O, F, Fut>(self, concurrency: usize, stage: F) -> Pipeline<'a, Vec<O>>
    where
        O: Send + 'a,
        F: Fn(I) -> Fut + Send + 'a,
        Fut: Future<Output = PipelineItem<O>> + Send + 'a,
    {
        Pipeline::from_future(async move {
            let items = self.item.await?;
            fan_out(items, concurrency, stage).await
        })
    }
}

impl<'a, T: 'a> IntoFuture for Pipeline<'a, T> {
    type Output = PipelineItem<T>;
    type IntoFuture = BoxFuture<'a, PipelineItem<T>>;

    fn into_future(self) -> Self::IntoFuture {
        self.item
    }
}
