//! # Configuration question relay.
//!
//! Backends occasionally need extra configuration from the user (credentials,
//! a server address). They surface a [`FormRequest`] through the engine's
//! [`QuestionRelay`], which walks its registered [`HandleQuestion`] handlers
//! in order until one consumes the request, a plain chain of responsibility.
//! The relay never interprets form contents; it is a pass-through.
//!
//! ```text
//! backend ── submit(FormRequest) ──► handler 1 ─ false ─► handler 2 ─ true ─ done
//! ```
//!
//! An unhandled request is dropped with a warning; there is nothing else the
//! engine could do with it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

/// One field of a form a backend wants the user to fill in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    /// Stable machine key the backend reads the answer back by.
    pub key: String,
    /// Human-readable label.
    pub label: String,
    /// Pre-filled value, empty if none.
    pub value: String,
}

impl FormField {
    /// Creates a field with an empty initial value.
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            value: String::new(),
        }
    }
}

/// A form a backend wants shown to the user.
///
/// Opaque to the engine: only handlers give the fields meaning.
#[derive(Debug, Clone, Default)]
pub struct FormRequest {
    /// Short title for the dialog.
    pub title: String,
    /// Longer instructions shown above the fields.
    pub instructions: String,
    /// The fields to collect.
    pub fields: Vec<FormField>,
}

/// Contract for user-interface handlers willing to present forms.
#[async_trait]
pub trait HandleQuestion: Send + Sync + 'static {
    /// Presents the request to the user, returning `true` if consumed.
    ///
    /// Returning `false` passes the request on to the next handler.
    async fn on_question(&self, request: &FormRequest) -> bool;
}

/// Ordered chain of question handlers.
///
/// Cloneable; all clones share the same handler chain.
#[derive(Clone, Default)]
pub struct QuestionRelay {
    handlers: Arc<RwLock<Vec<Arc<dyn HandleQuestion>>>>,
}

impl QuestionRelay {
    /// Creates an empty relay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler to the end of the chain.
    pub async fn add_handler(&self, handler: Arc<dyn HandleQuestion>) {
        self.handlers.write().await.push(handler);
    }

    /// Submits a request to the chain.
    ///
    /// Handlers are tried in registration order; the first returning `true`
    /// stops the walk. Returns whether anyone consumed the request.
    pub async fn submit(&self, request: FormRequest) -> bool {
        let handlers = self.handlers.read().await.clone();
        for handler in handlers {
            if handler.on_question(&request).await {
                return true;
            }
        }
        tracing::warn!(title = %request.title, "question dropped: no handler consumed it");
        false
    }
}
