/// Account service - registration, login, and profile management
use crypto_core::{hash_password, verify_password, JwtKeys};
use std::sync::Arc;

use crate::db::BlogStore;
use crate::error::{AppError, AuthFailure, Result};
use crate::metrics::access::record_auth_failure;
use crate::middleware::Principal;
use crate::models::requests::{LoginRequest, RegisterRequest, UpdateProfileRequest};
use crate::models::{AuthResponse, NewUser, PublicUser, Role, User, UserChanges, UserProfile};
use crate::validators::{check, check_with_password, normalize_email};

pub struct UserService {
    store: Arc<dyn BlogStore>,
    keys: JwtKeys,
}

impl UserService {
    pub fn new(store: Arc<dyn BlogStore>, keys: JwtKeys) -> Self {
        Self { store, keys }
    }

    /// Create an account and sign the caller in
    pub async fn register(&self, mut req: RegisterRequest) -> Result<AuthResponse> {
        req.email = normalize_email(&req.email);
        check_with_password(&req, Some(req.password.as_str()))?;

        if self.store.find_user_by_email(&req.email).await?.is_some() {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let password_hash = hash_password(&req.password)?;
        let user = self
            .store
            .create_user(NewUser {
                name: req.name,
                email: req.email,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = user.id, "user registered");
        self.auth_response(&user)
    }

    pub async fn login(&self, mut req: LoginRequest) -> Result<AuthResponse> {
        req.email = normalize_email(&req.email);
        check(&req)?;

        let user = match self.store.find_user_by_email(&req.email).await? {
            Some(user) if verify_password(&req.password, &user.password_hash)? => user,
            _ => {
                record_auth_failure(AuthFailure::InvalidCredentials.reason());
                return Err(AuthFailure::InvalidCredentials.into());
            }
        };

        tracing::info!(user_id = user.id, "user logged in");
        self.auth_response(&user)
    }

    pub async fn profile(&self, principal: &Principal) -> Result<UserProfile> {
        self.store
            .user_profile(principal.id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Partial update of the caller's own name, email, or password
    pub async fn update_profile(
        &self,
        principal: &Principal,
        mut req: UpdateProfileRequest,
    ) -> Result<PublicUser> {
        req.email = req.email.as_deref().map(normalize_email);
        check_with_password(&req, req.password.as_deref())?;

        if let Some(email) = req.email.as_deref() {
            if self.store.email_taken_by_other(email, principal.id).await? {
                return Err(AppError::Conflict("Email is already in use".to_string()));
            }
        }

        let password_hash = match req.password.as_deref() {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        let user = self
            .store
            .update_user(
                principal.id,
                UserChanges {
                    name: req.name,
                    email: req.email,
                    password_hash,
                },
            )
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        tracing::info!(user_id = user.id, "profile updated");
        Ok(PublicUser::from(&user))
    }

    /// Tokens are stateless; logout is only recorded
    pub fn logout(&self, principal: &Principal) {
        tracing::info!(user_id = principal.id, "user logged out");
    }

    /// Out-of-band role escalation
    pub async fn promote_to_admin(&self, user_id: i64) -> Result<PublicUser> {
        let user = self
            .store
            .set_user_role(user_id, Role::Admin)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        tracing::info!(user_id = user.id, "user promoted to admin");
        Ok(PublicUser::from(&user))
    }

    fn auth_response(&self, user: &User) -> Result<AuthResponse> {
        let token = self
            .keys
            .issue(user.id)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(AuthResponse {
            user: PublicUser::from(user),
            token,
        })
    }
}
