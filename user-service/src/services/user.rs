use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::{
    config::OnboardingConfig,
    dtos::{
        user::{
            ChangePasswordRequest, PatchUserRequest, SetPasswordRequest, SetRoleRequest,
            UpdateUserRequest,
        },
        MessageResponse,
    },
    models::{NewUser, User, UserProfile, UserResponse},
    services::{EmailMessage, EmailProvider, JwtService, ServiceError, Store},
    utils::{generate_otp, hash_password, verify_password, Password},
};

const USER_NOT_FOUND: &str = "User not found";
const EMAIL_ALREADY_VERIFIED: &str = "Email already verified";
const PASSWORD_ALREADY_VERIFIED: &str = "Password already verified";
const OTP_INCORRECT: &str = "OTP Code is incorrect";
const PASSWORD_SET: &str = "Password set successfully";

/// Which emailed link an OTP challenge belongs to.
#[derive(Debug, Clone, Copy)]
enum OtpPurpose {
    ConfirmEmail,
    ResetPassword,
}

impl OtpPurpose {
    fn path(&self) -> &'static str {
        match self {
            OtpPurpose::ConfirmEmail => "confirm_email",
            OtpPurpose::ResetPassword => "reset_password",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            OtpPurpose::ConfirmEmail => "Confirm Email",
            OtpPurpose::ResetPassword => "Reset Password",
        }
    }
}

/// Registration, the two OTP protocols, role assignment and user CRUD.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
    email: Arc<dyn EmailProvider>,
    jwt: JwtService,
    onboarding: OnboardingConfig,
}

impl UserService {
    pub fn new(
        store: Arc<dyn Store>,
        email: Arc<dyn EmailProvider>,
        jwt: JwtService,
        onboarding: OnboardingConfig,
    ) -> Self {
        Self {
            store,
            email,
            jwt,
            onboarding,
        }
    }

    /// Creates an unverified account for `email` and mails the confirmation
    /// link. The row is written only after the email went out.
    #[tracing::instrument(skip(self, email))]
    pub async fn register(&self, email: &str) -> Result<MessageResponse, ServiceError> {
        if let Some(existing) = self.store.find_user_by_email(email).await? {
            return Err(if existing.email_verified {
                ServiceError::conflict(EMAIL_ALREADY_VERIFIED)
            } else {
                ServiceError::conflict("Email already exists")
            });
        }

        let username = self.derive_username(email).await?;
        let otp = self.send_otp_email(email, OtpPurpose::ConfirmEmail).await?;

        let user = self
            .store
            .insert_user(&NewUser {
                email: email.to_string(),
                username,
                email_otp: otp,
            })
            .await?;

        tracing::info!(user_id = user.id, "User registered, awaiting email confirmation");
        Ok(MessageResponse::new("User created successfully"))
    }

    /// Completes registration: checks the emailed challenge, sets the
    /// password and marks the email verified.
    pub async fn confirm_email(
        &self,
        req: SetPasswordRequest,
    ) -> Result<MessageResponse, ServiceError> {
        let claims = self.jwt.decode_otp_token(&req.token)?;

        let user = self
            .store
            .find_user_by_email(&claims.email)
            .await?
            .ok_or_else(|| ServiceError::not_found(USER_NOT_FOUND))?;

        if user.email_verified {
            return Err(ServiceError::conflict(EMAIL_ALREADY_VERIFIED));
        }

        if user.email_otp.as_deref() != Some(claims.token.as_str()) {
            tracing::warn!(user_id = user.id, "Email confirmation with wrong OTP");
            return Err(ServiceError::Authentication(OTP_INCORRECT.to_string()));
        }

        let hash = hash_password(&Password::new(req.password))?;

        // Lost a race with another confirmation of the same challenge.
        if !self
            .store
            .complete_email_verification(user.id, &claims.token, hash.as_str())
            .await?
        {
            return Err(ServiceError::conflict(EMAIL_ALREADY_VERIFIED));
        }

        tracing::info!(user_id = user.id, "Email verified");
        Ok(MessageResponse::new(PASSWORD_SET))
    }

    pub async fn set_role(&self, req: SetRoleRequest) -> Result<MessageResponse, ServiceError> {
        if self.store.find_role(req.role_id).await?.is_none() {
            return Err(ServiceError::not_found("Role does not exist"));
        }

        if !self.store.set_user_role(req.user_id, req.role_id).await? {
            return Err(ServiceError::not_found(USER_NOT_FOUND));
        }

        tracing::info!(user_id = req.user_id, role_id = req.role_id, "Role assigned");
        Ok(MessageResponse::new("Role set successfully"))
    }

    pub async fn get(&self, id: i32) -> Result<UserResponse, ServiceError> {
        Ok(self.find(id).await?.into())
    }

    pub async fn list(&self) -> Result<Vec<UserResponse>, ServiceError> {
        let users = self.store.list_users().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    /// Full replacement of the profile. An omitted username keeps the
    /// current one.
    pub async fn update(
        &self,
        id: i32,
        req: UpdateUserRequest,
    ) -> Result<UserResponse, ServiceError> {
        let existing = self.find(id).await?;

        if let Some(username) = &req.username {
            self.ensure_username_free(id, username).await?;
        }

        let profile = UserProfile {
            first_name: Some(req.first_name),
            last_name: Some(req.last_name),
            contact: req.contact,
            username: req.username.unwrap_or(existing.username),
            company_name: req.company_name,
            address: req.address,
            city: req.city,
            country: req.country,
            postal_code: req.postal_code,
            profile_image: req.profile_image,
        };

        self.save_profile(id, &profile).await
    }

    pub async fn patch(&self, id: i32, req: PatchUserRequest) -> Result<UserResponse, ServiceError> {
        let existing = self.find(id).await?;

        if let Some(username) = &req.username {
            self.ensure_username_free(id, username).await?;
        }

        let mut profile = existing.profile();
        if let Some(v) = req.first_name {
            profile.first_name = Some(v);
        }
        if let Some(v) = req.last_name {
            profile.last_name = Some(v);
        }
        if let Some(v) = req.contact {
            profile.contact = Some(v);
        }
        if let Some(v) = req.username {
            profile.username = v;
        }
        if let Some(v) = req.company_name {
            profile.company_name = Some(v);
        }
        if let Some(v) = req.address {
            profile.address = Some(v);
        }
        if let Some(v) = req.city {
            profile.city = Some(v);
        }
        if let Some(v) = req.country {
            profile.country = Some(v);
        }
        if let Some(v) = req.postal_code {
            profile.postal_code = Some(v);
        }
        if let Some(v) = req.profile_image {
            profile.profile_image = Some(v);
        }

        self.save_profile(id, &profile).await
    }

    pub async fn delete(&self, id: i32) -> Result<MessageResponse, ServiceError> {
        if !self.store.delete_user(id).await? {
            return Err(ServiceError::not_found(USER_NOT_FOUND));
        }

        tracing::info!(user_id = id, "User deleted");
        Ok(MessageResponse::new("User deleted successfully"))
    }

    pub async fn change_password(
        &self,
        id: i32,
        req: ChangePasswordRequest,
    ) -> Result<MessageResponse, ServiceError> {
        let user = self.find(id).await?;

        let old_ok = user
            .password_hash
            .as_deref()
            .map(|hash| verify_password(&Password::new(req.old_password), hash))
            .unwrap_or(false);

        if !old_ok {
            return Err(ServiceError::Validation("Incorrect password".to_string()));
        }

        let hash = hash_password(&Password::new(req.new_password))?;
        if !self.store.update_password(id, hash.as_str()).await? {
            return Err(ServiceError::not_found(USER_NOT_FOUND));
        }

        tracing::info!(user_id = id, "Password changed");
        Ok(MessageResponse::new("Password changed successfully"))
    }

    /// Mails a reset link. OTP state is stored only after the email went out.
    #[tracing::instrument(skip(self, email))]
    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> Result<MessageResponse, ServiceError> {
        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| ServiceError::not_found(USER_NOT_FOUND))?;

        let otp = self.send_otp_email(email, OtpPurpose::ResetPassword).await?;

        if !self.store.set_password_otp(user.id, &otp).await? {
            return Err(ServiceError::not_found(USER_NOT_FOUND));
        }

        tracing::info!(user_id = user.id, "Password reset requested");
        Ok(MessageResponse::new("Email sent at given email address"))
    }

    pub async fn reset_password(
        &self,
        req: SetPasswordRequest,
    ) -> Result<MessageResponse, ServiceError> {
        let claims = self.jwt.decode_otp_token(&req.token)?;

        let user = self
            .store
            .find_user_by_email(&claims.email)
            .await?
            .ok_or_else(|| ServiceError::not_found("Email does not exist"))?;

        if user.password_verified {
            return Err(ServiceError::conflict(PASSWORD_ALREADY_VERIFIED));
        }

        if user.password_otp.as_deref() != Some(claims.token.as_str()) {
            tracing::warn!(user_id = user.id, "Password reset with wrong OTP");
            return Err(ServiceError::Authentication(OTP_INCORRECT.to_string()));
        }

        let hash = hash_password(&Password::new(req.password))?;

        if !self
            .store
            .complete_password_reset(user.id, &claims.token, hash.as_str())
            .await?
        {
            return Err(ServiceError::conflict(PASSWORD_ALREADY_VERIFIED));
        }

        tracing::info!(user_id = user.id, "Password reset completed");
        Ok(MessageResponse::new(PASSWORD_SET))
    }

    async fn find(&self, id: i32) -> Result<User, ServiceError> {
        self.store
            .find_user_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(USER_NOT_FOUND))
    }

    async fn save_profile(
        &self,
        id: i32,
        profile: &UserProfile,
    ) -> Result<UserResponse, ServiceError> {
        let user = self
            .store
            .update_user_profile(id, profile)
            .await?
            .ok_or_else(|| ServiceError::not_found(USER_NOT_FOUND))?;

        tracing::info!(user_id = id, "Profile updated");
        Ok(user.into())
    }

    async fn ensure_username_free(&self, id: i32, username: &str) -> Result<(), ServiceError> {
        match self.store.find_user_by_username(username).await? {
            Some(other) if other.id != id => Err(ServiceError::conflict("Username already exists")),
            _ => Ok(()),
        }
    }

    /// Local part of the email, suffixed with the current microsecond when
    /// already taken. The insert's unique constraint settles any race.
    async fn derive_username(&self, email: &str) -> Result<String, ServiceError> {
        let local = email.split('@').next().unwrap_or(email).to_lowercase();

        if self.store.find_user_by_username(&local).await?.is_some() {
            Ok(format!("{}_{}", local, Utc::now().timestamp_subsec_micros()))
        } else {
            Ok(local)
        }
    }

    /// Generates an OTP, wraps it in a challenge token and mails the link.
    /// Returns the OTP for the caller to persist.
    async fn send_otp_email(
        &self,
        email: &str,
        purpose: OtpPurpose,
    ) -> Result<String, ServiceError> {
        let otp = generate_otp();
        let expires_at = Utc::now() + Duration::minutes(self.onboarding.otp_expiry_minutes);
        let token = self.jwt.generate_otp_token(email, &otp, expires_at)?;

        let message = EmailMessage {
            recipients: vec![email.to_string()],
            subject: format!("Welcome to {}", self.onboarding.company_name),
            url: format!(
                "{}/{}/{}",
                self.onboarding.frontend_url,
                purpose.path(),
                token
            ),
            first_name: "User".to_string(),
            msg_purpose: purpose.label().to_string(),
            company_name: self.onboarding.company_name.clone(),
            base_url: self.onboarding.frontend_url.clone(),
        };

        self.email
            .send(&message)
            .await
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;

        Ok(otp)
    }
}
