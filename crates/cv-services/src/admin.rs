//! Staff accounts: login, registration, password changes and bearer-token
//! authentication.

use std::sync::Arc;

use cv_core::{AdminId, AdminProfile, AdminRepo, AppError, AuthProvider, NewAdmin, Result};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Successful login.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub token: String,
    pub admin: AdminProfile,
}

#[derive(Clone)]
pub struct AdminService {
    repo: Arc<dyn AdminRepo>,
    auth: Arc<dyn AuthProvider>,
}

impl AdminService {
    pub fn new(repo: Arc<dyn AdminRepo>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { repo, auth }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::ValidationError(
                "Email and password are required".to_string(),
            ));
        }

        let email = normalize_email(email);
        let admin = match self.repo.find_admin_by_email(&email).await? {
            Some(admin) if self.auth.verify_password(password, &admin.password_hash) => admin,
            _ => {
                tracing::info!("admin login rejected");
                return Err(invalid_credentials());
            }
        };

        let token = self.auth.issue_token(admin.id)?;
        tracing::info!(admin_id = admin.id, "admin logged in");
        Ok(LoginOutcome {
            token,
            admin: admin.into(),
        })
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<String>,
    ) -> Result<AdminProfile> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::ValidationError(
                "Email and password are required".to_string(),
            ));
        }
        check_password_len(password, "Password")?;

        let email = normalize_email(email);
        if self.repo.find_admin_by_email(&email).await?.is_some() {
            return Err(AppError::ValidationError(
                "Admin with this email already exists".to_string(),
            ));
        }

        let admin = self
            .repo
            .create_admin(NewAdmin {
                email,
                password_hash: self.auth.hash_password(password)?,
                name: name.filter(|n| !n.trim().is_empty()),
            })
            .await?;
        tracing::info!(admin_id = admin.id, "admin registered");
        Ok(admin.into())
    }

    /// Resolves a bearer token to a live admin. Tokens of deleted admins
    /// stop working immediately.
    pub async fn authenticate(&self, token: &str) -> Result<AdminProfile> {
        let claims = self
            .auth
            .verify_token(token)
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))?;

        self.repo
            .get_admin(claims.sub)
            .await?
            .map(AdminProfile::from)
            .ok_or_else(|| AppError::Unauthorized("Admin not found".to_string()))
    }

    pub async fn change_password(
        &self,
        admin_id: AdminId,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        if current_password.is_empty() || new_password.is_empty() {
            return Err(AppError::ValidationError(
                "Current and new password are required".to_string(),
            ));
        }
        check_password_len(new_password, "New password")?;

        let admin = self
            .repo
            .get_admin(admin_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Admin not found".to_string()))?;

        if !self.auth.verify_password(current_password, &admin.password_hash) {
            return Err(AppError::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }

        let hash = self.auth.hash_password(new_password)?;
        self.repo.update_password(admin_id, &hash).await?;
        tracing::info!(admin_id, "admin password changed");
        Ok(())
    }

    /// Creates the account unless one already uses `email`. Returns whether
    /// an account was created.
    pub async fn ensure_admin(&self, email: &str, password: &str, name: &str) -> Result<bool> {
        let email = normalize_email(email);
        if self.repo.find_admin_by_email(&email).await?.is_some() {
            return Ok(false);
        }
        self.repo
            .create_admin(NewAdmin {
                email,
                password_hash: self.auth.hash_password(password)?,
                name: Some(name.to_string()),
            })
            .await?;
        Ok(true)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_password_len(password: &str, label: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::ValidationError(format!(
            "{label} must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid email or password".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cv_core::{Admin, AdminClaims, MockAdminRepo, MockAuthProvider};
    use mockall::predicate::eq;

    fn admin() -> Admin {
        Admin {
            id: 1,
            email: "admin@example.com".to_string(),
            password_hash: "hash:admin123".to_string(),
            name: Some("Admin".to_string()),
            created_at: Utc::now(),
        }
    }

    fn fake_auth() -> MockAuthProvider {
        let mut auth = MockAuthProvider::new();
        auth.expect_verify_password()
            .returning(|pw, hash| hash == format!("hash:{pw}"));
        auth.expect_hash_password()
            .returning(|pw| Ok(format!("hash:{pw}")));
        auth.expect_issue_token()
            .returning(|id| Ok(format!("token-{id}")));
        auth
    }

    #[tokio::test]
    async fn login_lowercases_email() {
        let mut repo = MockAdminRepo::new();
        repo.expect_find_admin_by_email()
            .with(eq("admin@example.com"))
            .returning(|_| Ok(Some(admin())));
        let svc = AdminService::new(Arc::new(repo), Arc::new(fake_auth()));

        let outcome = svc.login(" Admin@Example.COM ", "admin123").await.unwrap();
        assert_eq!(outcome.token, "token-1");
        assert_eq!(outcome.admin.email, "admin@example.com");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_alike() {
        let mut repo = MockAdminRepo::new();
        repo.expect_find_admin_by_email().returning(|email| {
            Ok((email == "admin@example.com").then(admin))
        });
        let svc = AdminService::new(Arc::new(repo), Arc::new(fake_auth()));

        let a = svc.login("admin@example.com", "nope").await.unwrap_err();
        let b = svc.login("ghost@example.com", "admin123").await.unwrap_err();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn short_password_rejected_on_register() {
        let mut repo = MockAdminRepo::new();
        repo.expect_create_admin().never();
        let svc = AdminService::new(Arc::new(repo), Arc::new(fake_auth()));

        let err = svc.register("new@example.com", "12345", None).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn token_for_deleted_admin_is_refused() {
        let mut repo = MockAdminRepo::new();
        repo.expect_get_admin().returning(|_| Ok(None));
        let mut auth = MockAuthProvider::new();
        auth.expect_verify_token()
            .returning(|_| Some(AdminClaims { sub: 7, exp: i64::MAX }));
        let svc = AdminService::new(Arc::new(repo), Arc::new(auth));

        let err = svc.authenticate("t").await.unwrap_err();
        assert_eq!(err, AppError::Unauthorized("Admin not found".into()));
    }

    #[tokio::test]
    async fn change_password_checks_current() {
        let mut repo = MockAdminRepo::new();
        repo.expect_get_admin().returning(|_| Ok(Some(admin())));
        repo.expect_update_password()
            .with(eq(1_i64), eq("hash:brand-new"))
            .times(1)
            .returning(|_, _| Ok(()));
        let svc = AdminService::new(Arc::new(repo), Arc::new(fake_auth()));

        assert!(matches!(
            svc.change_password(1, "wrong", "brand-new").await,
            Err(AppError::Unauthorized(_))
        ));
        svc.change_password(1, "admin123", "brand-new").await.unwrap();
    }
}
