use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::api::{ApiClient, SessionApi};
use crate::models::{Credentials, SessionData, User};
use crate::storage::{PersistentStore, TOKEN_KEY, USER_KEY};

use super::{SessionError, SessionState};

/// Owns the signed-in session and keeps it in step with durable storage.
///
/// State changes are published on a watch channel; consumers call
/// [`subscribe`](Self::subscribe) and re-render on change. Operations take
/// `&self` and do not lock each other out: when two of them overlap, the
/// state written last wins.
pub struct SessionManager {
    store: Arc<dyn PersistentStore>,
    api: Arc<dyn SessionApi>,
    state: watch::Sender<SessionState>,
    rehydration_started: AtomicBool,
}

impl SessionManager {
    /// Create a manager in the loading state. Call [`rehydrate`](Self::rehydrate)
    /// (or use [`start`](Self::start)) to restore the saved session.
    pub fn new(store: Arc<dyn PersistentStore>, api: Arc<dyn SessionApi>) -> Arc<Self> {
        let (state, _) = watch::channel(SessionState::default());
        Arc::new(Self {
            store,
            api,
            state,
            rehydration_started: AtomicBool::new(false),
        })
    }

    /// Create a manager and restore the saved session in the background.
    ///
    /// A failed restore is logged and leaves the session signed out. Must be
    /// called from within a Tokio runtime.
    pub fn start(store: Arc<dyn PersistentStore>, api: Arc<dyn SessionApi>) -> Arc<Self> {
        let manager = Self::new(store, api);
        manager.spawn_rehydration();
        manager
    }

    // ===== State =====

    /// Latest state snapshot.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Receive every future state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// A clone of `client` that authenticates with this manager's session.
    pub fn authorized_client(&self, client: &ApiClient) -> ApiClient {
        client.with_session(self.subscribe())
    }

    /// Wait until the saved session has been looked up.
    pub async fn loaded(&self) {
        let mut rx = self.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|state| !state.loading()).await;
    }

    // ===== Operations =====

    /// Restore the saved session from storage.
    ///
    /// Only the first call does the work; later calls wait for it to finish.
    /// `loading` turns false once the lookup is over, whether it found a
    /// session, found nothing, or failed. The lookup runs on its own task,
    /// so dropping this future does not leave the manager loading.
    pub async fn rehydrate(self: &Arc<Self>) -> Result<(), SessionError> {
        match self.spawn_rehydration() {
            Some(handle) => handle.await?,
            None => {
                self.loaded().await;
                Ok(())
            }
        }
    }

    /// Spawn the one restore task, or return `None` if it already started.
    fn spawn_rehydration(self: &Arc<Self>) -> Option<JoinHandle<Result<(), SessionError>>> {
        if self.rehydration_started.swap(true, Ordering::SeqCst) {
            return None;
        }

        let manager = Arc::clone(self);
        Some(tokio::spawn(async move {
            let result = manager.restore().await;
            manager.state.send_modify(|state| state.loading = false);
            if let Err(ref e) = result {
                error!(error = %e, "Failed to restore saved session");
            }
            result
        }))
    }

    async fn restore(&self) -> Result<(), SessionError> {
        let mut values = self
            .store
            .multi_get(&[TOKEN_KEY, USER_KEY])
            .await?
            .into_iter()
            .map(|(_, value)| value.filter(|v| !v.is_empty()));
        let token = values.next().flatten();
        let user = values.next().flatten();

        let (Some(token), Some(user)) = (token, user) else {
            debug!("No saved session");
            return Ok(());
        };

        let user: User = serde_json::from_str(&user).map_err(SessionError::InvalidStoredUser)?;
        info!(user_id = %user.id, "Restored saved session");
        self.state
            .send_modify(|state| state.session = Some(SessionData { token, user }));
        Ok(())
    }

    /// Sign in with the backend, persist the new session and publish it.
    ///
    /// Backend and storage errors are returned to the caller unchanged. If
    /// storage fails after the backend accepted the credentials, nothing is
    /// published.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<(), SessionError> {
        let session = SessionData::from(self.api.create_session(credentials).await?);
        let user_json = serde_json::to_string(&session.user).map_err(SessionError::Serialize)?;

        self.store
            .multi_set(&[(TOKEN_KEY, session.token.as_str()), (USER_KEY, user_json.as_str())])
            .await?;

        info!(user_id = %session.user.id, "Signed in");
        self.state.send_modify(|state| state.session = Some(session));
        Ok(())
    }

    /// Forget the saved session and publish the signed-out state.
    pub async fn sign_out(&self) -> Result<(), SessionError> {
        self.store.multi_remove(&[TOKEN_KEY, USER_KEY]).await?;

        info!("Signed out");
        self.state.send_modify(|state| state.session = None);
        Ok(())
    }

    /// Replace the signed-in user's profile, keeping the current token.
    pub async fn update_user(&self, user: User) -> Result<(), SessionError> {
        let authenticated = self.is_authenticated();
        if !authenticated {
            return Err(SessionError::NotSignedIn);
        }

        let user_json = serde_json::to_string(&user).map_err(SessionError::Serialize)?;
        self.store.set_item(USER_KEY, &user_json).await?;

        let user_id = user.id.clone();
        let updated = self.state.send_if_modified(move |state| match state.session.as_mut() {
            Some(session) => {
                session.user = user;
                true
            }
            None => false,
        });
        if !updated {
            // Signed out while the write was in flight.
            return Err(SessionError::NotSignedIn);
        }

        info!(user_id = %user_id, "Profile updated");
        Ok(())
    }
}
