// src/state.rs

use std::{sync::Arc, time::Duration};

use axum::extract::FromRef;
use chrono::FixedOffset;

use crate::{
    config::Config,
    services::{feedback::FeedbackProvider, streak::day_offset},
    store::Store,
};

pub type SharedStore = Arc<dyn Store>;
pub type SharedFeedback = Arc<dyn FeedbackProvider>;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub config: Config,
    pub feedback: SharedFeedback,
}

impl AppState {
    pub fn new(store: SharedStore, config: Config, feedback: SharedFeedback) -> Self {
        Self {
            store,
            config,
            feedback,
        }
    }

    pub fn feedback_timeout(&self) -> Duration {
        Duration::from_secs(self.config.ai_timeout_secs)
    }

    pub fn streak_offset(&self) -> FixedOffset {
        day_offset(&self.config)
    }
}

impl FromRef<AppState> for SharedStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
