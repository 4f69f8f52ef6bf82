//! Listener callbacks
//!
//! A [`Listener`] is a cheaply clonable handle to a [`Handler`]. Two listeners
//! are the same listener when they share the same handler allocation, which is
//! what `remove_listener` matches on.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::SharedError;
use crate::event::Payload;

/// What a listener produces: a value, `None` for no value, or a failure
pub type ListenerResult = std::result::Result<Option<Payload>, SharedError>;

/// Trait for listener implementations
#[async_trait::async_trait]
pub trait Handler: Send + Sync {
    /// Handle one emission with its positional arguments
    async fn call(&self, args: Vec<Payload>) -> ListenerResult;
}

/// A handler that runs an async closure
struct AsyncFnHandler<F> {
    handler: F,
}

#[async_trait::async_trait]
impl<F, Fut> Handler for AsyncFnHandler<F>
where
    F: Fn(Vec<Payload>) -> Fut + Send + Sync,
    Fut: Future<Output = ListenerResult> + Send + 'static,
{
    async fn call(&self, args: Vec<Payload>) -> ListenerResult {
        (self.handler)(args).await
    }
}

/// A handler that runs a plain closure
struct SyncFnHandler<F> {
    handler: F,
}

#[async_trait::async_trait]
impl<F> Handler for SyncFnHandler<F>
where
    F: Fn(Vec<Payload>) -> ListenerResult + Send + Sync,
{
    async fn call(&self, args: Vec<Payload>) -> ListenerResult {
        (self.handler)(args)
    }
}

/// Registered callback handle with identity semantics
#[derive(Clone)]
pub struct Listener {
    handler: Arc<dyn Handler>,
}

impl Listener {
    /// Create a listener from an async closure
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(Vec<Payload>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ListenerResult> + Send + 'static,
    {
        Self::from_handler(AsyncFnHandler { handler })
    }

    /// Create a listener from a synchronous closure
    pub fn sync<F>(handler: F) -> Self
    where
        F: Fn(Vec<Payload>) -> ListenerResult + Send + Sync + 'static,
    {
        Self::from_handler(SyncFnHandler { handler })
    }

    pub fn from_handler<H: Handler + 'static>(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// Wrap an already shared handler; listeners built from clones of the
    /// same `Arc` compare equal
    pub fn from_arc(handler: Arc<dyn Handler>) -> Self {
        Self { handler }
    }

    /// Invoke the listener
    pub fn call(&self, args: Vec<Payload>) -> BoxFuture<'_, ListenerResult> {
        self.handler.call(args)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.handler, &other.handler)
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener")
            .field(&Arc::as_ptr(&self.handler).cast::<()>())
            .finish()
    }
}
