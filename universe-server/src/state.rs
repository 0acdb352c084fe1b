//! Shared application state handed to every Axum route, the teacher's
//! `AppState` pattern (the betting platform's state is a flat `Clone` struct
//! of `Arc`s passed to `with_state`).

use std::sync::Arc;

use universe_core::Engine;

use crate::config::Config;
use crate::db::Database;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub db: Arc<Database>,
    pub config: Arc<Config>,
}
