use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation,
};
use rand::rngs::OsRng;
use tracing::{info, debug, warn, instrument};
use uuid::Uuid;

use models::user::{self, Role};

use super::domain::{
    AuthSession, AuthUser, Claims, LoginInput, NewAccount, Principal, RegisterInput,
};
use super::errors::AuthError;
use super::repository::AuthRepository;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub token_ttl_secs: u64,
}

impl AuthConfig {
    pub fn from_settings(s: &configs::AuthSettings) -> Self {
        Self { jwt_secret: s.jwt_secret.clone(), token_ttl_secs: s.token_ttl_secs }
    }
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Register a new account and sign a session token for it.
    ///
    /// # Examples
    /// ```
    /// use service::auth::repository::mock::MockAuthRepository;
    /// use service::auth::service::{AuthConfig, AuthService};
    /// use service::auth::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig { jwt_secret: None, token_ttl_secs: 3600 });
    /// let input = RegisterInput {
    ///     name: "Test".into(),
    ///     email: "User@Example.com".into(),
    ///     password: "secret1".into(),
    ///     role: None,
    ///     location: None,
    /// };
    /// let session = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(session.role, models::user::Role::User);
    /// assert!(session.token.is_none());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthSession, AuthError> {
        user::validate_name(&input.name)?;
        let email = user::normalize_email(&input.email)?;
        user::validate_password(&input.password)?;
        let role = input.role.unwrap_or(Role::User);
        if role == Role::Admin {
            return Err(AuthError::Validation("role must be user or technician".into()));
        }
        if let Some(existing) = self.repo.find_user_by_email(&email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(&input.password)?;
        let user = self.repo
            .create_account(NewAccount {
                name: input.name,
                email,
                password_hash,
                role,
                location: input.location,
            })
            .await?;
        info!(user_id = %user.id, email = %user.email, role = %user.role, "user_registered");
        self.session_for(&user)
    }

    /// Authenticate a user and issue a token.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    ///
    /// # Examples
    /// ```
    /// use service::auth::repository::mock::MockAuthRepository;
    /// use service::auth::service::{AuthConfig, AuthService};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let cfg = AuthConfig { jwt_secret: Some("secret".into()), token_ttl_secs: 3600 };
    /// let svc = AuthService::new(repo.clone(), cfg);
    /// let _ = tokio_test::block_on(svc.register(RegisterInput {
    ///     name: "N".into(),
    ///     email: "u@e.com".into(),
    ///     password: "Passw0rd".into(),
    ///     role: None,
    ///     location: None,
    /// }));
    /// let login = LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() };
    /// let session = tokio_test::block_on(svc.login(login)).unwrap();
    /// assert!(session.token.is_some());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let email = input.email.trim().to_lowercase();
        let user = self.repo
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let parsed = PasswordHash::new(&cred.password_hash)
            .map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            debug!(user_id = %user.id, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        info!(user_id = %user.id, role = %user.role, "user_logged_in");
        self.session_for(&user)
    }

    /// Create the configured admin account unless the email is already registered.
    #[instrument(skip(self, password))]
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let email = user::normalize_email(email)?;
        if let Some(existing) = self.repo.find_user_by_email(&email).await? {
            if existing.role != Role::Admin {
                warn!(
                    user_id = %existing.id,
                    role = %existing.role,
                    "admin seed email belongs to a non-admin account"
                );
                return Err(AuthError::SeedConflict(existing.email));
            }
            return Ok(existing);
        }
        user::validate_password(password)?;
        let password_hash = hash_password(password)?;
        let admin = self.repo
            .create_account(NewAccount {
                name: "Administrator".into(),
                email,
                password_hash,
                role: Role::Admin,
                location: None,
            })
            .await?;
        info!(user_id = %admin.id, "admin_seeded");
        Ok(admin)
    }

    /// Sign a token for `(user_id, role)`; `None` without a configured secret.
    pub fn issue_token(&self, user_id: Uuid, role: Role) -> Result<Option<String>, AuthError> {
        let Some(secret) = &self.cfg.jwt_secret else { return Ok(None) };
        let now = chrono::Utc::now().timestamp() as usize;
        let exp = now + self.cfg.token_ttl_secs as usize;
        let claims = Claims { sub: user_id.to_string(), role, iat: now, exp };
        let key = EncodingKey::from_secret(secret.as_bytes());
        let token = encode(&JwtHeader::new(Algorithm::HS256), &claims, &key)
            .map_err(|e| AuthError::TokenError(e.to_string()))?;
        Ok(Some(token))
    }

    /// Verify signature and expiry and decode the caller.
    ///
    /// Always fails when no secret is configured.
    pub fn verify_token(&self, token: &str) -> Result<Principal, AuthError> {
        let Some(secret) = &self.cfg.jwt_secret else {
            debug!("token rejected: no signing secret configured");
            return Err(AuthError::Unauthenticated);
        };
        let key = DecodingKey::from_secret(secret.as_bytes());
        let data = decode::<Claims>(token, &key, &Validation::new(Algorithm::HS256))
            .map_err(|e| {
                debug!(error = %e, "token rejected");
                AuthError::Unauthenticated
            })?;
        let id = Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::Unauthenticated)?;
        Ok(Principal { id, role: data.claims.role })
    }

    /// Verify the token and check the account still exists.
    ///
    /// Tokens outlive account deletion; a token whose user is gone is treated
    /// like an invalid one.
    pub async fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        let principal = self.verify_token(token)?;
        if self.repo.find_user_by_id(principal.id).await?.is_none() {
            debug!(user_id = %principal.id, "token rejected: account no longer exists");
            return Err(AuthError::Unauthenticated);
        }
        Ok(principal)
    }

    fn session_for(&self, user: &AuthUser) -> Result<AuthSession, AuthError> {
        let token = self.issue_token(user.id, user.role)?;
        Ok(AuthSession { token, role: user.role, user_id: user.id })
    }
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::HashError(e.to_string()))?
        .to_string())
}
