//! User persistence.
//!
//! [`UserRepository`] is the seam between request handling and the user
//! store. Production uses [`PgUserRepository`]; integration tests swap in
//! [`InMemoryUserRepository`] so the full router can run without Postgres.

use std::future::Future;
use std::pin::Pin;

use sqlx::PgPool;
use uuid::Uuid;

use aqar_core::ApiError;
use aqar_models::{Actor, NewUser, UpdateProfileDto, User, UserCredentials};

/// Boxed future returned by [`UserRepository`] methods.
pub type RepoFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

pub trait UserRepository: Send + Sync {
    /// Authorization projection of a user. Never reads the password hash.
    fn find_actor(&self, id: Uuid) -> RepoFuture<'_, Option<Actor>>;

    /// Sets `last_active` to now.
    fn touch_last_active(&self, id: Uuid) -> RepoFuture<'_, ()>;

    fn find_by_id(&self, id: Uuid) -> RepoFuture<'_, Option<User>>;

    /// User plus password hash, for login only.
    fn find_credentials<'a>(&'a self, email: &'a str) -> RepoFuture<'a, Option<UserCredentials>>;

    /// Inserts a user. Duplicate email or phone yields [`ApiError::DuplicateKey`].
    fn create(&self, user: NewUser) -> RepoFuture<'_, User>;

    /// Applies the present fields of `changes`.
    fn update_profile(&self, id: Uuid, changes: UpdateProfileDto) -> RepoFuture<'_, User>;
}

const USER_COLUMNS: &str = "id, name, email, phone, user_type, avatar, is_active, \
     is_email_verified, last_active, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

impl UserRepository for PgUserRepository {
    fn find_actor(&self, id: Uuid) -> RepoFuture<'_, Option<Actor>> {
        Box::pin(async move {
            let actor = sqlx::query_as::<_, Actor>(
                "SELECT id, user_type, is_active, is_email_verified, last_active \
                 FROM users WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
            Ok(actor)
        })
    }

    fn touch_last_active(&self, id: Uuid) -> RepoFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("UPDATE users SET last_active = NOW() WHERE id = $1")
                .bind(id)
                .execute(&self.db)
                .await?;
            Ok(())
        })
    }

    fn find_by_id(&self, id: Uuid) -> RepoFuture<'_, Option<User>> {
        Box::pin(async move {
            let user = sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
            ))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
            Ok(user)
        })
    }

    fn find_credentials<'a>(&'a self, email: &'a str) -> RepoFuture<'a, Option<UserCredentials>> {
        Box::pin(async move {
            let credentials = sqlx::query_as::<_, UserCredentials>(&format!(
                "SELECT {USER_COLUMNS}, password FROM users WHERE email = $1"
            ))
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
            Ok(credentials)
        })
    }

    fn create(&self, user: NewUser) -> RepoFuture<'_, User> {
        Box::pin(async move {
            let created = sqlx::query_as::<_, User>(&format!(
                "INSERT INTO users (name, email, phone, password, user_type) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
            ))
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.phone)
            .bind(&user.password_hash)
            .bind(user.user_type)
            .fetch_one(&self.db)
            .await?;
            Ok(created)
        })
    }

    fn update_profile(&self, id: Uuid, changes: UpdateProfileDto) -> RepoFuture<'_, User> {
        Box::pin(async move {
            let updated = sqlx::query_as::<_, User>(&format!(
                "UPDATE users SET \
                     name = COALESCE($2, name), \
                     phone = COALESCE($3, phone), \
                     user_type = COALESCE($4, user_type), \
                     avatar = COALESCE($5, avatar), \
                     updated_at = NOW() \
                 WHERE id = $1 RETURNING {USER_COLUMNS}"
            ))
            .bind(id)
            .bind(changes.name)
            .bind(changes.phone)
            .bind(changes.user_type)
            .bind(changes.avatar)
            .fetch_optional(&self.db)
            .await?;
            updated.ok_or(ApiError::ResourceNotFound)
        })
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use in_memory::InMemoryUserRepository;

#[cfg(any(test, feature = "test-utils"))]
mod in_memory {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use chrono::Utc;
    use tokio::sync::RwLock;

    use super::*;

    #[derive(Clone)]
    struct StoredUser {
        user: User,
        password_hash: String,
    }

    /// Process-local user store with the same uniqueness rules as the
    /// database schema.
    #[derive(Clone, Default)]
    pub struct InMemoryUserRepository {
        users: Arc<RwLock<HashMap<Uuid, StoredUser>>>,
        unavailable: Arc<AtomicBool>,
        activity_writes_fail: Arc<AtomicBool>,
    }

    impl InMemoryUserRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every subsequent call fail as if the store were down.
        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        /// Makes only `touch_last_active` fail; reads keep working.
        pub fn set_activity_writes_fail(&self, fail: bool) {
            self.activity_writes_fail.store(fail, Ordering::SeqCst);
        }

        /// Overwrites the stored copy of `user`, keeping its password.
        pub async fn put(&self, user: User) {
            let mut users = self.users.write().await;
            let password_hash = users
                .get(&user.id)
                .map(|u| u.password_hash.clone())
                .unwrap_or_default();
            users.insert(
                user.id,
                StoredUser {
                    user,
                    password_hash,
                },
            );
        }

        pub async fn get(&self, id: Uuid) -> Option<User> {
            self.users.read().await.get(&id).map(|u| u.user.clone())
        }

        fn check_available(&self) -> Result<(), ApiError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(ApiError::internal(anyhow::anyhow!("user store unavailable")));
            }
            Ok(())
        }
    }

    impl UserRepository for InMemoryUserRepository {
        fn find_actor(&self, id: Uuid) -> RepoFuture<'_, Option<Actor>> {
            Box::pin(async move {
                self.check_available()?;
                Ok(self.users.read().await.get(&id).map(|u| u.user.actor()))
            })
        }

        fn touch_last_active(&self, id: Uuid) -> RepoFuture<'_, ()> {
            Box::pin(async move {
                self.check_available()?;
                if self.activity_writes_fail.load(Ordering::SeqCst) {
                    return Err(ApiError::internal(anyhow::anyhow!("last_active write failed")));
                }
                if let Some(stored) = self.users.write().await.get_mut(&id) {
                    stored.user.last_active = Utc::now();
                }
                Ok(())
            })
        }

        fn find_by_id(&self, id: Uuid) -> RepoFuture<'_, Option<User>> {
            Box::pin(async move {
                self.check_available()?;
                Ok(self.get(id).await)
            })
        }

        fn find_credentials<'a>(
            &'a self,
            email: &'a str,
        ) -> RepoFuture<'a, Option<UserCredentials>> {
            Box::pin(async move {
                self.check_available()?;
                Ok(self
                    .users
                    .read()
                    .await
                    .values()
                    .find(|u| u.user.email == email)
                    .map(|u| UserCredentials {
                        user: u.user.clone(),
                        password_hash: u.password_hash.clone(),
                    }))
            })
        }

        fn create(&self, new_user: NewUser) -> RepoFuture<'_, User> {
            Box::pin(async move {
                self.check_available()?;
                let mut users = self.users.write().await;

                if users.values().any(|u| u.user.email == new_user.email) {
                    return Err(ApiError::duplicate("email"));
                }
                if users.values().any(|u| u.user.phone == new_user.phone) {
                    return Err(ApiError::duplicate("phone"));
                }

                let now = Utc::now();
                let user = User {
                    id: Uuid::new_v4(),
                    name: new_user.name,
                    email: new_user.email,
                    phone: new_user.phone,
                    user_type: new_user.user_type,
                    avatar: None,
                    is_active: true,
                    is_email_verified: false,
                    last_active: now,
                    created_at: now,
                    updated_at: now,
                };
                users.insert(
                    user.id,
                    StoredUser {
                        user: user.clone(),
                        password_hash: new_user.password_hash,
                    },
                );
                Ok(user)
            })
        }

        fn update_profile(&self, id: Uuid, changes: UpdateProfileDto) -> RepoFuture<'_, User> {
            Box::pin(async move {
                self.check_available()?;
                let mut users = self.users.write().await;

                if let Some(phone) = &changes.phone {
                    if users
                        .values()
                        .any(|u| u.user.id != id && &u.user.phone == phone)
                    {
                        return Err(ApiError::duplicate("phone"));
                    }
                }

                let stored = users.get_mut(&id).ok_or(ApiError::ResourceNotFound)?;
                let user = &mut stored.user;
                if let Some(name) = changes.name {
                    user.name = name;
                }
                if let Some(phone) = changes.phone {
                    user.phone = phone;
                }
                if let Some(user_type) = changes.user_type {
                    user.user_type = user_type;
                }
                if let Some(avatar) = changes.avatar {
                    user.avatar = Some(avatar);
                }
                user.updated_at = Utc::now();
                Ok(user.clone())
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqar_models::UserType;

    fn new_user(email: &str, phone: &str) -> NewUser {
        NewUser {
            name: "Sara".to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            password_hash: "hash".to_string(),
            user_type: UserType::Landlord,
        }
    }

    #[tokio::test]
    async fn test_in_memory_create_and_find() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(new_user("sara@example.com", "0790000001")).await.unwrap();

        let actor = repo.find_actor(user.id).await.unwrap().unwrap();
        assert_eq!(actor.user_type, UserType::Landlord);
        assert!(actor.is_active);

        let credentials = repo.find_credentials("sara@example.com").await.unwrap().unwrap();
        assert_eq!(credentials.password_hash, "hash");
        assert!(repo.find_actor(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_in_memory_uniqueness() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("a@example.com", "0790000001")).await.unwrap();

        let email = repo.create(new_user("a@example.com", "0790000002")).await.unwrap_err();
        assert!(matches!(email, ApiError::DuplicateKey { ref field } if field == "email"));

        let phone = repo.create(new_user("b@example.com", "0790000001")).await.unwrap_err();
        assert!(matches!(phone, ApiError::DuplicateKey { ref field } if field == "phone"));
    }

    #[tokio::test]
    async fn test_in_memory_update_profile() {
        let repo = InMemoryUserRepository::new();
        let a = repo.create(new_user("a@example.com", "0790000001")).await.unwrap();
        let b = repo.create(new_user("b@example.com", "0790000002")).await.unwrap();

        let updated = repo
            .update_profile(
                a.id,
                UpdateProfileDto {
                    name: Some("Sara K".to_string()),
                    user_type: Some(UserType::Tenant),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Sara K");
        assert_eq!(updated.user_type, UserType::Tenant);
        assert_eq!(updated.phone, "0790000001");

        let clash = repo
            .update_profile(
                a.id,
                UpdateProfileDto {
                    phone: Some(b.phone.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(clash, ApiError::DuplicateKey { ref field } if field == "phone"));
    }

    #[tokio::test]
    async fn test_in_memory_unavailable() {
        let repo = InMemoryUserRepository::new();
        repo.set_unavailable(true);
        assert!(matches!(
            repo.find_actor(Uuid::new_v4()).await,
            Err(ApiError::Unclassified(_))
        ));
    }
}
