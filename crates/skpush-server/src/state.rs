use std::sync::Arc;

use skpush_config::AppConfig;
use skpush_notifications::{DispatchEngine, PathExpander};
use skpush_storage::SubscriberStore;

/// Shared handler state.
///
/// `engine` is `None` when startup failed fatally (host login rejected,
/// no channel configured): the HTTP surface keeps serving but nothing is
/// dispatched.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn SubscriberStore>,
    pub engine: Option<Arc<DispatchEngine>>,
    pub expander: Arc<dyn PathExpander>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn SubscriberStore>,
        engine: Option<Arc<DispatchEngine>>,
        expander: Arc<dyn PathExpander>,
    ) -> Self {
        Self {
            config,
            store,
            engine,
            expander,
        }
    }
}
