//! BoxResponsesProvider -- object-safe dynamic dispatch wrapper for ResponsesProvider.
//!
//! 1. Define an object-safe `ResponsesProviderDyn` trait with boxed futures
//! 2. Blanket-impl `ResponsesProviderDyn` for all `T: ResponsesProvider`
//! 3. `BoxResponsesProvider` wraps `Box<dyn ResponsesProviderDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use parley_types::llm::{LlmError, ResponseReply, ResponseRequest};

use super::provider::ResponsesProvider;

/// Object-safe version of [`ResponsesProvider`] with boxed futures.
pub trait ResponsesProviderDyn: Send + Sync {
    fn name(&self) -> &str;

    fn respond_boxed<'a>(
        &'a self,
        request: &'a ResponseRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ResponseReply, LlmError>> + Send + 'a>>;
}

impl<T: ResponsesProvider> ResponsesProviderDyn for T {
    fn name(&self) -> &str {
        ResponsesProvider::name(self)
    }

    fn respond_boxed<'a>(
        &'a self,
        request: &'a ResponseRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ResponseReply, LlmError>> + Send + 'a>> {
        Box::pin(self.respond(request))
    }
}

/// Type-erased provider for runtime selection.
///
/// Not `Clone`; share it across user tasks behind an `Arc`.
pub struct BoxResponsesProvider {
    inner: Box<dyn ResponsesProviderDyn + Send + Sync>,
}

impl BoxResponsesProvider {
    /// Wrap a concrete `ResponsesProvider` in a type-erased box.
    pub fn new<T: ResponsesProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Send one request and wait for the full reply.
    pub async fn respond(&self, request: &ResponseRequest) -> Result<ResponseReply, LlmError> {
        self.inner.respond_boxed(request).await
    }
}

impl std::fmt::Debug for BoxResponsesProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxResponsesProvider")
            .field("name", &self.name())
            .finish()
    }
}
