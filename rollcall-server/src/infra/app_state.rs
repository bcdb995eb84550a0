use std::{fmt, sync::Arc};

use rollcall_core::{
    PostgresDatabase, RosterEventBus, RosterService,
    auth::AuthCrypto,
    database::ports::{StudentRepository, UserRepository},
};

use crate::auth::jwt::JwtKeys;
use crate::infra::config::Config;
use crate::infra::websocket::ConnectionManager;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub postgres: Arc<PostgresDatabase>,
    pub roster: Arc<RosterService>,
    pub students: Arc<dyn StudentRepository>,
    pub users: Arc<dyn UserRepository>,
    pub auth_crypto: Arc<AuthCrypto>,
    pub jwt_keys: Arc<JwtKeys>,
    pub event_bus: Arc<RosterEventBus>,
    pub websocket_manager: Arc<ConnectionManager>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
