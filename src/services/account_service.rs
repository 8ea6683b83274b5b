use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::Store;
use crate::dto::auth_dto::{
    AccessResponse, LoginPayload, LoginResponse, RegisterPayload, RegisterResponse,
};
use crate::error::{Error, Result};
use crate::models::user::{normalize_email, Role, User};
use crate::policy::{self, AuthUser, Capability, Operation, Principal};
use crate::services::mail_service::{activation_message, Mailer};
use crate::services::token_service::{TokenKind, TokenService};
use crate::utils::crypto::{hash_password, verify_password};
use crate::utils::time::Clock;
use crate::utils::token::{decode_uid, encode_uid, ActivationTokens};

/// Fields for a privileged account. All three privilege markers must be set.
#[derive(Debug, Clone)]
pub struct SuperuserRequest {
    pub email: String,
    pub password: String,
    pub phone_number: String,
    pub role: Role,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl SuperuserRequest {
    pub fn new(email: &str, password: &str, phone_number: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            phone_number: phone_number.to_string(),
            role: Role::Admin,
            is_staff: true,
            is_superuser: true,
        }
    }
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    mailer: Arc<dyn Mailer>,
    tokens: TokenService,
    activation: ActivationTokens,
    clock: Arc<dyn Clock>,
    public_base_url: String,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn Store>,
        mailer: Arc<dyn Mailer>,
        tokens: TokenService,
        activation: ActivationTokens,
        clock: Arc<dyn Clock>,
        public_base_url: String,
    ) -> Self {
        Self {
            store,
            mailer,
            tokens,
            activation,
            clock,
            public_base_url,
        }
    }

    fn new_user(&self, email: String, password: &str, phone_number: String, role: Role) -> Result<User> {
        let now = self.clock.now();
        Ok(User {
            id: Uuid::new_v4(),
            email,
            password_hash: hash_password(password)?,
            phone_number,
            role,
            is_active: false,
            is_staff: false,
            is_superuser: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Creates an inactive account and mails its activation link. A mail
    /// failure leaves the account in place; the response says whether the link
    /// went out.
    pub async fn register(&self, payload: RegisterPayload) -> Result<RegisterResponse> {
        if payload.role == Role::Admin {
            return Err(Error::Validation("Invalid role.".into()));
        }
        let email = normalize_email(&payload.email);
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(Error::DuplicateEmail);
        }

        let user = self.new_user(email, &payload.password, payload.phone_number, payload.role)?;
        let user = self
            .store
            .insert_user(&user)
            .await
            .map_err(|e| Error::on_conflict(e, Error::DuplicateEmail))?;
        info!(user_id = %user.id, role = %user.role, "user registered");

        let token = self.activation.make(&user, self.clock.now())?;
        let (subject, body) = activation_message(&self.public_base_url, &encode_uid(user.id), &token);
        let activation_email_sent = match self.mailer.send(&user.email, &subject, &body).await {
            Ok(()) => true,
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "activation email not sent");
                false
            }
        };

        Ok(RegisterResponse {
            user,
            activation_email_sent,
        })
    }

    /// Every failure mode collapses into `InvalidLink`.
    pub async fn activate(&self, uidb64: &str, token: &str) -> Result<User> {
        let id = decode_uid(uidb64).ok_or(Error::InvalidLink)?;
        let user = self
            .store
            .find_user(id)
            .await?
            .ok_or(Error::InvalidLink)?;
        if !self.activation.check(&user, token, self.clock.now()) {
            warn!(user_id = %user.id, "rejected activation attempt");
            return Err(Error::InvalidLink);
        }
        let user = self.store.set_user_active(user.id, true).await?;
        info!(user_id = %user.id, "account activated");
        Ok(user)
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let email = normalize_email(email);
        let Some(user) = self.store.find_user_by_email(&email).await? else {
            return Err(Error::InvalidCredentials);
        };
        if !verify_password(password, &user.password_hash) {
            return Err(Error::InvalidCredentials);
        }
        if !user.is_active {
            return Err(Error::AccountDisabled);
        }
        Ok(user)
    }

    pub async fn login(&self, payload: LoginPayload) -> Result<LoginResponse> {
        let user = self.authenticate(&payload.email, &payload.password).await?;
        let pair = self.tokens.issue_pair(&user)?;
        info!(user_id = %user.id, "user logged in");
        Ok(LoginResponse {
            access: pair.access,
            refresh: pair.refresh,
            user,
        })
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessResponse> {
        let claims = self.tokens.verify(refresh_token, TokenKind::Refresh)?;
        let user = self.active_user(claims.sub).await?;
        Ok(AccessResponse {
            access: self.tokens.issue_access(&user)?,
        })
    }

    /// Resolves a bearer token into the principal for the request.
    pub async fn principal_from_token(&self, token: &str) -> Result<Principal> {
        let claims = self.tokens.verify(token, TokenKind::Access)?;
        let user = self.active_user(claims.sub).await?;
        Ok(Principal::User(AuthUser::from(&user)))
    }

    async fn active_user(&self, id: Uuid) -> Result<User> {
        match self.store.find_user(id).await? {
            Some(user) if user.is_active => Ok(user),
            _ => Err(Error::Unauthenticated("token is invalid or expired")),
        }
    }

    pub async fn create_superuser(&self, request: SuperuserRequest) -> Result<User> {
        if request.role != Role::Admin {
            return Err(Error::Config("Superuser must have role=admin.".into()));
        }
        if !request.is_staff {
            return Err(Error::Config("Superuser must have is_staff=True.".into()));
        }
        if !request.is_superuser {
            return Err(Error::Config("Superuser must have is_superuser=True.".into()));
        }
        if request.password.len() < 6 {
            return Err(Error::Validation("Password must be at least 6 characters.".into()));
        }

        let email = normalize_email(&request.email);
        let mut user = self.new_user(email, &request.password, request.phone_number, Role::Admin)?;
        user.is_active = true;
        user.is_staff = true;
        user.is_superuser = true;
        let user = self
            .store
            .insert_user(&user)
            .await
            .map_err(|e| Error::on_conflict(e, Error::DuplicateEmail))?;
        info!(user_id = %user.id, "superuser created");
        Ok(user)
    }

    pub async fn list_users(&self, principal: &Principal) -> Result<Vec<User>> {
        policy::require(principal, &[Capability::Admin], Operation::List)?;
        Ok(self.store.list_users().await?)
    }

    pub async fn delete_user(&self, principal: &Principal, id: Uuid) -> Result<()> {
        policy::require(principal, &[Capability::Admin], Operation::Delete)?;
        if !self.store.delete_user(id).await? {
            return Err(Error::NotFound("User"));
        }
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    pub async fn purge_inactive(&self, principal: &Principal) -> Result<u64> {
        policy::require(principal, &[Capability::Admin], Operation::Delete)?;
        self.purge_all_inactive().await
    }

    /// Every never-activated account, regardless of age. Callers gate access.
    pub async fn purge_all_inactive(&self) -> Result<u64> {
        let removed = self.store.delete_inactive_users(None).await?;
        info!(removed, "inactive users purged");
        Ok(removed)
    }

    /// Inactive accounts older than `retention` are treated as abandoned.
    pub async fn sweep_inactive(&self, retention: Duration) -> Result<u64> {
        let cutoff = self.clock.now() - retention;
        let removed = self.store.delete_inactive_users(Some(cutoff)).await?;
        if removed > 0 {
            info!(removed, %cutoff, "swept abandoned registrations");
        }
        Ok(removed)
    }
}
