use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use aqar_core::ApiError;
use aqar_models::{UpdateProfileDto, User};

use super::repository::UserRepository;

pub struct UserService;

impl UserService {
    #[instrument(skip(users))]
    pub async fn get_profile(users: &dyn UserRepository, user_id: Uuid) -> Result<User, ApiError> {
        users
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::ResourceNotFound)
    }

    /// Applies the provided fields; an empty update returns the current profile.
    ///
    /// Text fields are trimmed before they are validated.
    #[instrument(skip(users, changes))]
    pub async fn update_profile(
        users: &dyn UserRepository,
        user_id: Uuid,
        mut changes: UpdateProfileDto,
    ) -> Result<User, ApiError> {
        changes.name = changes.name.map(|n| n.trim().to_string());
        changes.phone = changes.phone.map(|p| p.trim().to_string());
        changes.validate()?;

        if changes.is_empty() {
            return Self::get_profile(users, user_id).await;
        }
        users.update_profile(user_id, changes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::users::repository::InMemoryUserRepository;
    use aqar_models::{NewUser, UserType};

    async fn seeded(repo: &InMemoryUserRepository, email: &str, phone: &str) -> User {
        repo.create(NewUser {
            name: "Hala".to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            password_hash: "hash".to_string(),
            user_type: UserType::Tenant,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_profile() {
        let repo = InMemoryUserRepository::new();
        let user = seeded(&repo, "hala@example.com", "0795550001").await;

        let profile = UserService::get_profile(&repo, user.id).await.unwrap();
        assert_eq!(profile, user);

        let err = UserService::get_profile(&repo, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ApiError::ResourceNotFound));
    }

    #[tokio::test]
    async fn test_update_profile_partial() {
        let repo = InMemoryUserRepository::new();
        let user = seeded(&repo, "hala@example.com", "0795550001").await;

        let updated = UserService::update_profile(
            &repo,
            user.id,
            UpdateProfileDto {
                name: Some(" Hala M. ".to_string()),
                user_type: Some(UserType::Both),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "Hala M.");
        assert_eq!(updated.user_type, UserType::Both);
        assert_eq!(updated.phone, user.phone);
    }

    #[tokio::test]
    async fn test_empty_update_returns_profile() {
        let repo = InMemoryUserRepository::new();
        let user = seeded(&repo, "hala@example.com", "0795550001").await;

        let same = UserService::update_profile(&repo, user.id, UpdateProfileDto::default())
            .await
            .unwrap();
        assert_eq!(same.id, user.id);
        assert_eq!(same.name, user.name);
    }

    #[tokio::test]
    async fn test_blank_name_rejected_after_trim() {
        let repo = InMemoryUserRepository::new();
        let user = seeded(&repo, "hala@example.com", "0795550001").await;

        let err = UserService::update_profile(
            &repo,
            user.id,
            UpdateProfileDto {
                name: Some("    ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::ValidationFailure { .. }));
        assert_eq!(err.message(), "Name must be between 2 and 100 characters");
        assert_eq!(repo.get(user.id).await.unwrap().name, "Hala");
    }

    #[tokio::test]
    async fn test_update_duplicate_phone() {
        let repo = InMemoryUserRepository::new();
        seeded(&repo, "first@example.com", "0795550001").await;
        let second = seeded(&repo, "second@example.com", "0795550002").await;

        let err = UserService::update_profile(
            &repo,
            second.id,
            UpdateProfileDto {
                phone: Some("0795550001".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.message(), "Phone number already registered");
    }
}
