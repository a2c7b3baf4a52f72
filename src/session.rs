//! Storage of the bearer token and the authentication state derived from it.
//!
//! The token is an opaque string issued by the server on login. It is kept in a
//! [TokenStore] and accessed through a [Session], which is passed explicitly to every
//! component needing it.

use crate::{common::newtypes::UserId, errors::MyResult};
use anyhow::anyhow;
use jsonwebtoken::{decode, DecodingKey, Validation};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    fmt::Debug,
    fs,
    io::ErrorKind,
    path::PathBuf,
    sync::{Arc, RwLock},
};

pub trait TokenStore: Debug + Send + Sync {
    fn save(&self, token: &str) -> std::io::Result<()>;
    fn load(&self) -> Option<String>;
    fn remove(&self) -> std::io::Result<()>;
}

/// On disk as `{"token": "<bearer>"}`.
#[derive(Deserialize, Serialize, Debug)]
struct StoredToken {
    token: String,
}

/// Keeps the token in a small json file, so that it survives restarts.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn save(&self, token: &str) -> std::io::Result<()> {
        let stored = StoredToken {
            token: token.to_string(),
        };
        fs::write(&self.path, serde_json::to_vec(&stored)?)
    }

    fn load(&self) -> Option<String> {
        let data = fs::read(&self.path).ok()?;
        match serde_json::from_slice::<StoredToken>(&data) {
            Ok(stored) => Some(stored.token),
            Err(e) => {
                debug!("Ignoring unreadable token file {}: {e}", self.path.display());
                None
            }
        }
    }

    fn remove(&self) -> std::io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            r => r,
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore(RwLock<Option<String>>);

impl TokenStore for MemoryTokenStore {
    fn save(&self, token: &str) -> std::io::Result<()> {
        *self.0.write().map_err(|_| ErrorKind::Other)? = Some(token.to_string());
        Ok(())
    }

    fn load(&self) -> Option<String> {
        self.0.read().ok()?.clone()
    }

    fn remove(&self) -> std::io::Result<()> {
        *self.0.write().map_err(|_| ErrorKind::Other)? = None;
        Ok(())
    }
}

/// Handle to the current bearer token. Clones share the same store.
#[derive(Debug, Clone)]
pub struct Session {
    store: Arc<dyn TokenStore>,
}

impl Session {
    pub fn new(store: impl TokenStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryTokenStore::default())
    }

    pub fn current_token(&self) -> Option<String> {
        self.store.load()
    }

    /// Tokens are never modified, only replaced as a whole.
    pub fn replace(&self, token: &str) -> std::io::Result<()> {
        self.store.save(token)
    }

    pub fn clear(&self) -> std::io::Result<()> {
        self.store.remove()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthenticationState {
    Anonymous,
    Authenticated { token: String, user_id: UserId },
}

#[derive(Deserialize, Debug)]
struct Claims {
    id: UserId,
}

/// Reads the user id out of the token payload. The signature is not checked, this is
/// the job of the server.
pub fn decode_user_id(token: &str) -> MyResult<UserId> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    let claims = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(claims.claims.id)
}

/// Login state of the local user, derived from the token in the [Session].
#[derive(Debug, Clone)]
pub struct Authentication {
    session: Session,
}

impl Authentication {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn state(&self) -> AuthenticationState {
        let Some(token) = self.session.current_token() else {
            return AuthenticationState::Anonymous;
        };
        match decode_user_id(&token) {
            Ok(user_id) => AuthenticationState::Authenticated { token, user_id },
            Err(e) => {
                debug!("Stored token cannot be decoded: {e}");
                AuthenticationState::Anonymous
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state(), AuthenticationState::Authenticated { .. })
    }

    pub fn authenticate(&self, token: &str) -> MyResult<UserId> {
        let user_id = decode_user_id(token)?;
        self.session.replace(token)?;
        Ok(user_id)
    }

    pub fn signout(&self) -> MyResult<()> {
        self.session.clear()?;
        Ok(())
    }

    pub fn user_id(&self) -> MyResult<UserId> {
        match self.state() {
            AuthenticationState::Authenticated { user_id, .. } => Ok(user_id),
            AuthenticationState::Anonymous => Err(anyhow!("User is not authenticated").into()),
        }
    }

    /// Where an already logged in user visiting the login page should be sent.
    pub fn login_redirect_target(&self, redirect: Option<&str>) -> Option<String> {
        if self.is_authenticated() {
            Some(redirect.unwrap_or("/").to_string())
        } else {
            None
        }
    }
}
