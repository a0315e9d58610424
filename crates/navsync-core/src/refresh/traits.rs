use std::future::Future;

use futures::future::LocalBoxFuture;

use super::errors::RefreshError;
use crate::types::ResourceKey;

/// A caller-supplied refresh for one resource.
///
/// The coordinator never calls this directly; it hands the operation back to
/// `CoordinatorHandle::refresh` once the throttler allows it, so the future
/// runs without any borrow of coordinator state.
pub trait RefreshOperation {
    fn run(&self, key: &ResourceKey) -> LocalBoxFuture<'static, Result<(), RefreshError>>;
}

impl<F, Fut> RefreshOperation for F
where
    F: Fn(&ResourceKey) -> Fut,
    Fut: Future<Output = Result<(), RefreshError>> + 'static,
{
    fn run(&self, key: &ResourceKey) -> LocalBoxFuture<'static, Result<(), RefreshError>> {
        Box::pin(self(key))
    }
}
