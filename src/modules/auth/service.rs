use tracing::{info, instrument, warn};
use validator::Validate;

use aqar_auth::{TokenCodec, TokenPair, TokenType};
use aqar_core::{ApiError, hash_password, verify_password};
use aqar_models::{AuthResponse, LoginRequest, NewUser, RegisterRequest};

use crate::metrics::{track_login_failure, track_tokens_issued, track_user_registered};
use crate::modules::users::identity::IdentityResolver;
use crate::modules::users::repository::UserRepository;

pub struct AuthService;

impl AuthService {
    #[instrument(skip(users, tokens, dto), fields(email = %dto.email))]
    pub async fn register(
        users: &dyn UserRepository,
        tokens: &TokenCodec,
        mut dto: RegisterRequest,
    ) -> Result<AuthResponse, ApiError> {
        dto.name = dto.name.trim().to_string();
        dto.phone = dto.phone.trim().to_string();
        dto.validate()?;

        let user = users
            .create(NewUser {
                name: dto.name.clone(),
                email: dto.normalized_email(),
                phone: dto.phone.clone(),
                password_hash: hash_password(&dto.password)?,
                user_type: dto.user_type,
            })
            .await?;

        let pair = tokens.issue_pair(user.id)?;
        track_user_registered(user.user_type.as_str());
        track_tokens_issued("register");
        info!(user_id = %user.id, user_type = %user.user_type, "user registered");

        Ok(AuthResponse::new(pair, user))
    }

    #[instrument(skip(users, tokens, dto), fields(email = %dto.email))]
    pub async fn login(
        users: &dyn UserRepository,
        tokens: &TokenCodec,
        dto: LoginRequest,
    ) -> Result<AuthResponse, ApiError> {
        let email = dto.email.trim().to_lowercase();

        let Some(credentials) = users.find_credentials(&email).await? else {
            track_login_failure("unknown_email");
            return Err(ApiError::InvalidCredentials);
        };

        if !verify_password(&dto.password, &credentials.password_hash)? {
            track_login_failure("wrong_password");
            return Err(ApiError::InvalidCredentials);
        }

        let user = credentials.user;
        if !user.is_active {
            track_login_failure("deactivated");
            warn!(user_id = %user.id, "login attempt on deactivated account");
            return Err(ApiError::AccountDeactivated);
        }

        if let Err(err) = users.touch_last_active(user.id).await {
            warn!(user_id = %user.id, error = %err, "failed to record login activity");
        }
        let pair = tokens.issue_pair(user.id)?;
        track_tokens_issued("login");

        Ok(AuthResponse::new(pair, user))
    }

    /// Exchanges a refresh token for a new pair.
    ///
    /// Access tokens are rejected here, and the account must still exist
    /// and be active.
    #[instrument(skip_all)]
    pub async fn refresh(
        identity: &IdentityResolver,
        tokens: &TokenCodec,
        refresh_token: &str,
    ) -> Result<TokenPair, ApiError> {
        let claims = tokens.decode_as(refresh_token, TokenType::Refresh)?;
        let actor = identity.resolve(claims.subject()?).await?;
        if !actor.is_active {
            return Err(ApiError::AccountDeactivated);
        }

        let pair = tokens.issue_pair(actor.id)?;
        track_tokens_issued("refresh");
        Ok(pair)
    }
}
