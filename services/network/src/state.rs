//! Application state shared across handlers

use axum::extract::FromRef;
use common::{accounts::DynUserStore, auth::JwtService};

use crate::repositories::DynNetworkStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: DynNetworkStore,
    pub users: DynUserStore,
    pub jwt: JwtService,
}

impl FromRef<AppState> for DynUserStore {
    fn from_ref(state: &AppState) -> Self {
        state.users.clone()
    }
}

impl FromRef<AppState> for JwtService {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}
