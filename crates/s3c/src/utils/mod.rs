pub(crate) mod crypto;

use std::future::Future;
use std::pin::Pin;

/// Boxed future used by generator-style streams.
pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
