//! Application state shared across handlers

use crate::storage::EntryStore;

#[derive(Clone)]
pub struct AppState {
    pub entries: EntryStore,
}
