use async_trait::async_trait;
use sqlx::postgres::{PgDatabaseError, PgPool};

use super::store::{Store, StoreError};
use crate::models::{NewUser, Role, RoleFields, User, UserProfile, UserWithRole};

/// PostgreSQL backed `Store`.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let detail = db_err
                .try_downcast_ref::<PgDatabaseError>()
                .and_then(|pg| pg.detail())
                .unwrap_or_else(|| db_err.message())
                .to_string();

            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation(detail);
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::ForeignKeyViolation(detail);
            }
        }

        StoreError::Other(anyhow::Error::new(err))
    }
}

const USER_WITH_ROLE_SELECT: &str = "SELECT u.*, r.role_name FROM usr_user u \
     LEFT JOIN usr_role r ON r.id = u.role_id";

#[async_trait]
impl Store for Database {
    async fn health_check(&self) -> Result<(), StoreError> {
        crate::db::health_check(&self.pool).await?;
        Ok(())
    }

    async fn insert_role(&self, fields: &RoleFields) -> Result<Role, StoreError> {
        let role = sqlx::query_as::<_, Role>(
            "INSERT INTO usr_role (role_name, role_description) VALUES ($1, $2) RETURNING *",
        )
        .bind(fields.role_name.as_str())
        .bind(&fields.role_description)
        .fetch_one(&self.pool)
        .await?;

        Ok(role)
    }

    async fn find_role(&self, id: i32) -> Result<Option<Role>, StoreError> {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM usr_role WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(role)
    }

    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        let roles = sqlx::query_as::<_, Role>("SELECT * FROM usr_role ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(roles)
    }

    async fn update_role(&self, id: i32, fields: &RoleFields) -> Result<Option<Role>, StoreError> {
        let role = sqlx::query_as::<_, Role>(
            "UPDATE usr_role SET role_name = $2, role_description = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(fields.role_name.as_str())
        .bind(&fields.role_description)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    async fn delete_role(&self, id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM usr_role WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_user(&self, user: &NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO usr_user (email, username, email_otp) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.email_otp)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM usr_user WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM usr_user WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM usr_user WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user_with_role(&self, id: i32) -> Result<Option<UserWithRole>, StoreError> {
        let row = sqlx::query_as::<_, UserWithRole>(&format!(
            "{} WHERE u.id = $1",
            USER_WITH_ROLE_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM usr_user ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn delete_user(&self, id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM usr_user WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_user_profile(
        &self,
        id: i32,
        profile: &UserProfile,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE usr_user SET first_name = $2, last_name = $3, contact = $4, username = $5, \
             company_name = $6, address = $7, city = $8, country = $9, postal_code = $10, \
             profile_image = $11, is_active = TRUE, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.contact)
        .bind(&profile.username)
        .bind(&profile.company_name)
        .bind(&profile.address)
        .bind(&profile.city)
        .bind(&profile.country)
        .bind(&profile.postal_code)
        .bind(&profile.profile_image)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn set_user_role(&self, user_id: i32, role_id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE usr_user SET role_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id)
        .bind(role_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn complete_email_verification(
        &self,
        id: i32,
        otp: &str,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE usr_user SET password_hash = $3, email_otp = NULL, email_verified = TRUE, \
             updated_at = NOW() \
             WHERE id = $1 AND email_verified = FALSE AND email_otp = $2",
        )
        .bind(id)
        .bind(otp)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_password_otp(&self, id: i32, otp: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE usr_user SET password_otp = $2, password_verified = FALSE, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(otp)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn complete_password_reset(
        &self,
        id: i32,
        otp: &str,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE usr_user SET password_hash = $3, password_otp = NULL, \
             password_verified = TRUE, updated_at = NOW() \
             WHERE id = $1 AND password_verified = FALSE AND password_otp = $2",
        )
        .bind(id)
        .bind(otp)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_password(&self, id: i32, password_hash: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE usr_user SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
