use std::sync::Arc;

use crate::{config::Config, db::DbPool, handlers::Dispatcher};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Config,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(pool: DbPool, config: Config, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            pool,
            config,
            dispatcher,
        }
    }
}
