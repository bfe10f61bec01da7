use std::future::Future;
use std::sync::Arc;

use super::{SessionError, SessionManager};

tokio::task_local! {
    static CURRENT_SESSION: Arc<SessionManager>;
}

/// Makes a `SessionManager` reachable through [`use_session`] for the
/// duration of a future.
///
/// The scope covers the future itself, not tasks it spawns; hand those an
/// `Arc<SessionManager>` directly or wrap them in their own scope.
pub struct SessionProvider;

impl SessionProvider {
    pub async fn scope<F>(manager: Arc<SessionManager>, f: F) -> F::Output
    where
        F: Future,
    {
        CURRENT_SESSION.scope(manager, f).await
    }
}

/// The session manager of the enclosing [`SessionProvider`] scope.
pub fn use_session() -> Result<Arc<SessionManager>, SessionError> {
    CURRENT_SESSION
        .try_with(Arc::clone)
        .map_err(|_| SessionError::OutsideProvider)
}
