// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{CompanyRepository, UserRepository},
    models::{
        auth::{AuthResponse, Claims, LoginPayload, Role, SignupPayload, User},
        company::Company,
    },
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    company_repo: CompanyRepository,
    jwt_secret: String,
    token_ttl_hours: i64,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        company_repo: CompanyRepository,
        jwt_secret: String,
        token_ttl_hours: i64,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, company_repo, jwt_secret, token_ttl_hours, pool }
    }

    /// Registers a super-admin (only while none exists) or a sub-admin together with its company.
    pub async fn signup(&self, payload: SignupPayload) -> Result<AuthResponse, AppError> {
        let email = payload.email.trim().to_lowercase();
        let hashed_password = hash_password(payload.password).await?;

        let mut tx = self.pool.begin().await?;
        let superadmin = self.user_repo.find_superadmin(&mut *tx).await?;

        let (user, company) = match payload.role {
            Role::Superadmin => {
                if superadmin.is_some() {
                    return Err(AppError::SuperadminAlreadyExists);
                }
                // a concurrent signup loses on the unique index instead
                let user = self
                    .user_repo
                    .create_user(&mut *tx, payload.name.trim(), &email, &hashed_password, Role::Superadmin, None)
                    .await?;
                (user, None)
            }
            Role::Subadmin => {
                let superadmin = superadmin.ok_or(AppError::SuperadminMissing)?;
                let company_input = payload
                    .company
                    .as_ref()
                    .ok_or_else(|| AppError::BadRequest("Company details are required for a sub-admin.".into()))?;

                let user = self
                    .user_repo
                    .create_user(
                        &mut *tx,
                        payload.name.trim(),
                        &email,
                        &hashed_password,
                        Role::Subadmin,
                        Some(superadmin.id),
                    )
                    .await?;
                let company = self.company_repo.create_company(&mut *tx, user.id, company_input).await?;
                let user = self.user_repo.set_company(&mut *tx, user.id, company.id).await?;
                (user, Some(company))
            }
        };

        tx.commit().await?;
        tracing::info!(user_id = %user.id, role = ?user.role, "User signed up");

        let token = self.create_token(&user, company.as_ref())?;
        Ok(AuthResponse { token, user })
    }

    pub async fn login(&self, payload: LoginPayload) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(payload.email.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_hash = user.password_hash.clone();
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&payload.password, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("password verification task failed: {e}"))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }
        if !user.status {
            return Err(AppError::AccountInactive);
        }

        let company = match user.company_id {
            Some(company_id) => self.company_repo.find_by_id(company_id).await?,
            None => None,
        };

        let token = self.create_token(&user, company.as_ref())?;
        Ok(AuthResponse { token, user })
    }

    /// Decodes the token and reloads the user; deactivated accounts are rejected on every request.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        let user = self
            .user_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !user.status {
            return Err(AppError::AccountInactive);
        }
        Ok(user)
    }

    fn create_token(&self, user: &User, company: Option<&Company>) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(self.token_ttl_hours);

        let claims = Claims {
            sub: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            company_id: user.company_id,
            company_name: company.map(|c| c.name.clone()),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

async fn hash_password(password: String) -> Result<String, AppError> {
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("password hashing task failed: {e}"))??;
    Ok(hashed)
}
