use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Mutex, MutexGuard};

use super::store::{Store, StoreError};
use crate::models::{NewUser, Role, RoleFields, RoleName, User, UserProfile, UserWithRole};

/// In-memory `Store` with the same uniqueness and reference rules as the
/// PostgreSQL schema.
#[derive(Default)]
pub struct MockStore {
    inner: Mutex<MockData>,
}

#[derive(Default)]
struct MockData {
    roles: Vec<Role>,
    users: Vec<User>,
    next_role_id: i32,
    next_user_id: i32,
    fail_next_insert: Option<String>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding the five built-in roles, ids 1 to 5 in rank order.
    pub fn with_seeded_roles() -> Self {
        let store = Self::new();
        if let Ok(mut data) = store.inner.lock() {
            for role in RoleName::ALL {
                let now = Utc::now();
                data.next_role_id += 1;
                let id = data.next_role_id;
                data.roles.push(Role {
                    id,
                    role_name: role,
                    role_description: role.default_description().to_string(),
                    created_at: now,
                    updated_at: now,
                });
            }
        }
        store
    }

    /// Make the next user insert fail with a unique violation, as if another
    /// request had claimed the same email or username in between.
    pub fn fail_next_insert_with_unique_violation(&self, detail: &str) {
        if let Ok(mut data) = self.inner.lock() {
            data.fail_next_insert = Some(detail.to_string());
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MockData>, StoreError> {
        self.inner
            .lock()
            .map_err(|e| StoreError::Other(anyhow::anyhow!("Lock error: {}", e)))
    }
}

impl MockData {
    fn user_mut(&mut self, id: i32) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == id)
    }
}

fn role_name_taken(data: &MockData, name: RoleName, except: Option<i32>) -> bool {
    data.roles
        .iter()
        .any(|r| r.role_name == name && Some(r.id) != except)
}

#[async_trait]
impl Store for MockStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }

    async fn insert_role(&self, fields: &RoleFields) -> Result<Role, StoreError> {
        let mut data = self.lock()?;
        if role_name_taken(&data, fields.role_name, None) {
            return Err(StoreError::UniqueViolation(format!(
                "Key (role_name)=({}) already exists.",
                fields.role_name
            )));
        }

        let now = Utc::now();
        data.next_role_id += 1;
        let role = Role {
            id: data.next_role_id,
            role_name: fields.role_name,
            role_description: fields.role_description.clone(),
            created_at: now,
            updated_at: now,
        };
        data.roles.push(role.clone());
        Ok(role)
    }

    async fn find_role(&self, id: i32) -> Result<Option<Role>, StoreError> {
        Ok(self.lock()?.roles.iter().find(|r| r.id == id).cloned())
    }

    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        Ok(self.lock()?.roles.clone())
    }

    async fn update_role(&self, id: i32, fields: &RoleFields) -> Result<Option<Role>, StoreError> {
        let mut data = self.lock()?;
        if !data.roles.iter().any(|r| r.id == id) {
            return Ok(None);
        }
        if role_name_taken(&data, fields.role_name, Some(id)) {
            return Err(StoreError::UniqueViolation(format!(
                "Key (role_name)=({}) already exists.",
                fields.role_name
            )));
        }

        Ok(data.roles.iter_mut().find(|r| r.id == id).map(|role| {
            role.role_name = fields.role_name;
            role.role_description = fields.role_description.clone();
            role.updated_at = Utc::now();
            role.clone()
        }))
    }

    async fn delete_role(&self, id: i32) -> Result<bool, StoreError> {
        let mut data = self.lock()?;
        if data.users.iter().any(|u| u.role_id == Some(id)) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "Key (id)=({}) is still referenced from table \"usr_user\".",
                id
            )));
        }

        let before = data.roles.len();
        data.roles.retain(|r| r.id != id);
        Ok(data.roles.len() < before)
    }

    async fn insert_user(&self, user: &NewUser) -> Result<User, StoreError> {
        let mut data = self.lock()?;
        if let Some(detail) = data.fail_next_insert.take() {
            return Err(StoreError::UniqueViolation(detail));
        }
        if data.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation(format!(
                "Key (email)=({}) already exists.",
                user.email
            )));
        }
        if data.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::UniqueViolation(format!(
                "Key (username)=({}) already exists.",
                user.username
            )));
        }

        let now = Utc::now();
        data.next_user_id += 1;
        let created = User {
            id: data.next_user_id,
            first_name: None,
            last_name: None,
            contact: None,
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: None,
            company_name: None,
            address: None,
            city: None,
            country: None,
            postal_code: None,
            profile_image: None,
            email_otp: Some(user.email_otp.clone()),
            email_verified: false,
            password_otp: None,
            password_verified: false,
            is_active: false,
            role_id: None,
            created_at: now,
            updated_at: now,
        };
        data.users.push(created.clone());
        Ok(created)
    }

    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .lock()?
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_user_with_role(&self, id: i32) -> Result<Option<UserWithRole>, StoreError> {
        let data = self.lock()?;
        Ok(data.users.iter().find(|u| u.id == id).map(|user| {
            let role_name = user
                .role_id
                .and_then(|rid| data.roles.iter().find(|r| r.id == rid))
                .map(|r| r.role_name);
            UserWithRole {
                user: user.clone(),
                role_name,
            }
        }))
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.lock()?.users.clone())
    }

    async fn delete_user(&self, id: i32) -> Result<bool, StoreError> {
        let mut data = self.lock()?;
        let before = data.users.len();
        data.users.retain(|u| u.id != id);
        Ok(data.users.len() < before)
    }

    async fn update_user_profile(
        &self,
        id: i32,
        profile: &UserProfile,
    ) -> Result<Option<User>, StoreError> {
        let mut data = self.lock()?;
        if data
            .users
            .iter()
            .any(|u| u.username == profile.username && u.id != id)
        {
            return Err(StoreError::UniqueViolation(format!(
                "Key (username)=({}) already exists.",
                profile.username
            )));
        }

        Ok(data.user_mut(id).map(|user| {
            user.first_name = profile.first_name.clone();
            user.last_name = profile.last_name.clone();
            user.contact = profile.contact.clone();
            user.username = profile.username.clone();
            user.company_name = profile.company_name.clone();
            user.address = profile.address.clone();
            user.city = profile.city.clone();
            user.country = profile.country.clone();
            user.postal_code = profile.postal_code.clone();
            user.profile_image = profile.profile_image.clone();
            user.is_active = true;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn set_user_role(&self, user_id: i32, role_id: i32) -> Result<bool, StoreError> {
        let mut data = self.lock()?;
        if !data.roles.iter().any(|r| r.id == role_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "Key (role_id)=({}) is not present in table \"usr_role\".",
                role_id
            )));
        }

        Ok(data
            .user_mut(user_id)
            .map(|user| {
                user.role_id = Some(role_id);
                user.updated_at = Utc::now();
            })
            .is_some())
    }

    async fn complete_email_verification(
        &self,
        id: i32,
        otp: &str,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        let mut data = self.lock()?;
        Ok(match data.user_mut(id) {
            Some(user) if !user.email_verified && user.email_otp.as_deref() == Some(otp) => {
                user.password_hash = Some(password_hash.to_string());
                user.email_otp = None;
                user.email_verified = true;
                user.updated_at = Utc::now();
                true
            }
            _ => false,
        })
    }

    async fn set_password_otp(&self, id: i32, otp: &str) -> Result<bool, StoreError> {
        let mut data = self.lock()?;
        Ok(data
            .user_mut(id)
            .map(|user| {
                user.password_otp = Some(otp.to_string());
                user.password_verified = false;
                user.updated_at = Utc::now();
            })
            .is_some())
    }

    async fn complete_password_reset(
        &self,
        id: i32,
        otp: &str,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        let mut data = self.lock()?;
        Ok(match data.user_mut(id) {
            Some(user) if !user.password_verified && user.password_otp.as_deref() == Some(otp) => {
                user.password_hash = Some(password_hash.to_string());
                user.password_otp = None;
                user.password_verified = true;
                user.updated_at = Utc::now();
                true
            }
            _ => false,
        })
    }

    async fn update_password(&self, id: i32, password_hash: &str) -> Result<bool, StoreError> {
        let mut data = self.lock()?;
        Ok(data
            .user_mut(id)
            .map(|user| {
                user.password_hash = Some(password_hash.to_string());
                user.updated_at = Utc::now();
            })
            .is_some())
    }
}
