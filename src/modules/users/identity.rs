//! Maps a verified token subject to the user it names.

use std::sync::Arc;

use tracing::{instrument, warn};
use uuid::Uuid;

use aqar_core::ApiError;
use aqar_models::Actor;

use super::repository::UserRepository;

/// Resolves token subjects to [`Actor`]s and records their activity.
///
/// Resolution and the `last_active` write are separate calls: a failed
/// activity write is logged and never changes an authentication decision.
#[derive(Clone)]
pub struct IdentityResolver {
    users: Arc<dyn UserRepository>,
}

impl IdentityResolver {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Loads the actor for `user_id`.
    ///
    /// # Errors
    ///
    /// [`ApiError::UnknownActor`] when no user has this id, and
    /// [`ApiError::AuthenticationUnavailable`] when the store fails.
    #[instrument(skip(self))]
    pub async fn resolve(&self, user_id: Uuid) -> Result<Actor, ApiError> {
        match self.users.find_actor(user_id).await {
            Ok(Some(actor)) => Ok(actor),
            Ok(None) => Err(ApiError::UnknownActor),
            Err(err) => Err(ApiError::AuthenticationUnavailable(err.into())),
        }
    }

    /// Updates `last_active` in the background.
    pub fn record_activity(&self, user_id: Uuid) {
        let users = Arc::clone(&self.users);
        tokio::spawn(async move {
            if let Err(err) = users.touch_last_active(user_id).await {
                warn!(%user_id, error = %err, "failed to record user activity");
            }
        });
    }
}
