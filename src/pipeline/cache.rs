//! Most recent result per mode.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::outcome::PipelineResult;
use super::request::Mode;

/// Last-write-wins store of one [`PipelineResult`] per [`Mode`].
///
/// Results are stored behind an `Arc` and swapped whole, so a reader gets
/// either the previous result or the new one, never a mix.
#[derive(Debug, Default)]
pub struct ResultCache {
    slots: RwLock<HashMap<Mode, Arc<PipelineResult>>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `result` for `mode`, returning the result it replaced.
    pub fn put(&self, mode: Mode, result: Arc<PipelineResult>) -> Option<Arc<PipelineResult>> {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(mode, result)
    }

    pub fn get(&self, mode: Mode) -> Option<Arc<PipelineResult>> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&mode)
            .cloned()
    }
}
