use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{AuthUser, Credentials, NewAccount};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// `email` is already normalised.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<AuthUser>, AuthError>;

    /// Persist a new account. Technician accounts get their placeholder
    /// profile in the same unit of work.
    async fn create_account(&self, account: NewAccount) -> Result<AuthUser, AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use models::user::Role;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, AuthUser>>, // key: email
        creds: Mutex<HashMap<Uuid, Credentials>>, // key: user_id
        technician_profiles: Mutex<HashSet<Uuid>>, // owning user ids
    }

    impl MockAuthRepository {
        /// Drop an account, as an admin deletion would.
        pub fn remove_user(&self, user_id: Uuid) {
            self.users.lock().unwrap().retain(|_, u| u.id != user_id);
            self.creds.lock().unwrap().remove(&user_id);
        }

        pub fn has_technician_profile(&self, user_id: Uuid) -> bool {
            self.technician_profiles.lock().unwrap().contains(&user_id)
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.get(email).cloned())
        }

        async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.values().find(|u| u.id == user_id).cloned())
        }

        async fn create_account(&self, account: NewAccount) -> Result<AuthUser, AuthError> {
            let mut users = self.users.lock().unwrap();
            if users.contains_key(&account.email) {
                return Err(AuthError::EmailTaken);
            }
            let user = AuthUser {
                id: Uuid::new_v4(),
                name: account.name,
                email: account.email.clone(),
                role: account.role,
            };
            users.insert(account.email, user.clone());
            let cred = Credentials { user_id: user.id, password_hash: account.password_hash };
            self.creds.lock().unwrap().insert(user.id, cred);
            if user.role == Role::Technician {
                self.technician_profiles.lock().unwrap().insert(user.id);
            }
            Ok(user)
        }

        async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
            let creds = self.creds.lock().unwrap();
            Ok(creds.get(&user_id).cloned())
        }
    }
}
