//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use nid::Nanoid;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use access::{RegionId, RegionScope, Role};
use kernel::id::{SessionId, UserId};
use platform::password::HashedPassword;

use crate::domain::entity::{
    credential::Credential,
    session::Session,
    totp_enrollment::{StoredBackupCode, TotpEnrollment},
    user::User,
};
use crate::domain::repository::{
    CredentialRepository, SessionRepository, TotpRepository, UserRepository,
};
use crate::domain::value_object::{
    display_name::DisplayName, email::Email, public_id::PublicId, totp_secret::TotpSecret,
    user_status::UserStatus,
};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = r#"
    user_id,
    public_id,
    email,
    display_name,
    user_role,
    home_region,
    region_ids,
    user_status,
    last_login_at,
    created_at,
    updated_at
"#;

const SESSION_COLUMNS: &str = r#"
    session_id,
    user_id,
    refresh_hash,
    device_info,
    client_ip,
    expires_at_ms,
    revoked,
    created_at,
    last_activity_at
"#;

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn create_user(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                public_id,
                email,
                display_name,
                user_role,
                home_region,
                region_ids,
                user_status,
                last_login_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.public_id.as_str())
        .bind(user.email.as_str())
        .bind(user.display_name.as_str())
        .bind(user.role.id())
        .bind(user.home_region.0)
        .bind(region_ids_column(&user.regions))
        .bind(user.status.id())
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_user_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_user_by_public_id(&self, public_id: &PublicId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE public_id = $1"
        ))
        .bind(public_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_user_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(email.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn update_user(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                email = $2,
                display_name = $3,
                user_role = $4,
                home_region = $5,
                region_ids = $6,
                user_status = $7,
                last_login_at = $8,
                updated_at = $9
            WHERE user_id = $1
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_str())
        .bind(user.display_name.as_str())
        .bind(user.role.id())
        .bind(user.home_region.0)
        .bind(region_ids_column(&user.regions))
        .bind(user.status.id())
        .bind(user.last_login_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Credential Repository Implementation
// ============================================================================

impl CredentialRepository for PgAuthRepository {
    async fn create_credential(&self, credential: &Credential) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_credentials (
                user_id,
                password_hash,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(credential.user_id.as_uuid())
        .bind(credential.password_hash.as_phc_string())
        .bind(credential.created_at)
        .bind(credential.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_credential(&self, user_id: UserId) -> AuthResult<Option<Credential>> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT user_id, password_hash, created_at, updated_at
            FROM user_credentials
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_credential()).transpose()
    }

    async fn update_credential(&self, credential: &Credential) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE user_credentials SET
                password_hash = $2,
                updated_at = $3
            WHERE user_id = $1
            "#,
        )
        .bind(credential.user_id.as_uuid())
        .bind(credential.password_hash.as_phc_string())
        .bind(credential.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Session Repository Implementation
// ============================================================================

impl SessionRepository for PgAuthRepository {
    async fn create_session(&self, session: &Session) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_sessions (
                session_id,
                user_id,
                refresh_hash,
                device_info,
                client_ip,
                expires_at_ms,
                revoked,
                created_at,
                last_activity_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(session.session_id.as_uuid())
        .bind(session.user_id.as_uuid())
        .bind(&session.refresh_hash)
        .bind(&session.device_info)
        .bind(&session.ip)
        .bind(session.expires_at_ms)
        .bind(session.revoked)
        .bind(session.created_at)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_valid_session(&self, session_id: SessionId) -> AuthResult<Option<Session>> {
        let now = Utc::now();

        // Single statement so the liveness check and the activity bump
        // cannot interleave with a concurrent revoke
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            r#"
            UPDATE auth_sessions
            SET last_activity_at = $2
            WHERE session_id = $1 AND NOT revoked AND expires_at_ms > $3
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(session_id.as_uuid())
        .bind(now)
        .bind(now.timestamp_millis())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_session()))
    }

    async fn find_sessions_by_user(&self, user_id: UserId) -> AuthResult<Vec<Session>> {
        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM auth_sessions
            WHERE user_id = $1
            ORDER BY last_activity_at DESC
            "#
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_session()).collect())
    }

    async fn rotate_session_refresh(
        &self,
        session_id: SessionId,
        refresh_hash: &str,
        expires_at_ms: i64,
    ) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE auth_sessions SET
                refresh_hash = $2,
                expires_at_ms = $3,
                last_activity_at = $4
            WHERE session_id = $1
            "#,
        )
        .bind(session_id.as_uuid())
        .bind(refresh_hash)
        .bind(expires_at_ms)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn revoke_session(&self, session_id: SessionId) -> AuthResult<()> {
        sqlx::query("UPDATE auth_sessions SET revoked = TRUE WHERE session_id = $1")
            .bind(session_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn revoke_all_sessions(
        &self,
        user_id: UserId,
        except: Option<SessionId>,
    ) -> AuthResult<u64> {
        let revoked = match except {
            Some(except_id) => sqlx::query(
                r#"
                UPDATE auth_sessions SET revoked = TRUE
                WHERE user_id = $1 AND NOT revoked AND session_id != $2
                "#,
            )
            .bind(user_id.as_uuid())
            .bind(except_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected(),
            None => sqlx::query(
                "UPDATE auth_sessions SET revoked = TRUE WHERE user_id = $1 AND NOT revoked",
            )
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected(),
        };

        Ok(revoked)
    }

    async fn cleanup_expired_sessions(&self) -> AuthResult<u64> {
        let now_ms = Utc::now().timestamp_millis();

        let deleted = sqlx::query("DELETE FROM auth_sessions WHERE expires_at_ms < $1 OR revoked")
            .bind(now_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Cleaned up expired auth sessions");

        Ok(deleted)
    }
}

// ============================================================================
// TOTP Repository Implementation
// ============================================================================

impl TotpRepository for PgAuthRepository {
    async fn upsert_enrollment(&self, enrollment: &TotpEnrollment) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_totp (
                user_id,
                secret_base32,
                enabled,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE SET
                secret_base32 = EXCLUDED.secret_base32,
                enabled = EXCLUDED.enabled,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(enrollment.user_id.as_uuid())
        .bind(enrollment.secret.as_base32())
        .bind(enrollment.enabled)
        .bind(enrollment.created_at)
        .bind(enrollment.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_enrollment(&self, user_id: UserId) -> AuthResult<Option<TotpEnrollment>> {
        let row = sqlx::query_as::<_, TotpRow>(
            r#"
            SELECT user_id, secret_base32, enabled, created_at, updated_at
            FROM user_totp
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_enrollment()).transpose()
    }

    async fn enable_enrollment(&self, user_id: UserId) -> AuthResult<()> {
        sqlx::query("UPDATE user_totp SET enabled = TRUE, updated_at = $2 WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_enrollment(&self, user_id: UserId) -> AuthResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM totp_backup_codes WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM user_totp WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn replace_backup_codes(&self, user_id: UserId, hashes: &[String]) -> AuthResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM totp_backup_codes WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        for hash in hashes {
            sqlx::query(
                "INSERT INTO totp_backup_codes (user_id, code_hash, consumed) VALUES ($1, $2, FALSE)",
            )
            .bind(user_id.as_uuid())
            .bind(hash)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_backup_codes(&self, user_id: UserId) -> AuthResult<Vec<StoredBackupCode>> {
        let rows = sqlx::query_as::<_, BackupCodeRow>(
            "SELECT code_hash, consumed FROM totp_backup_codes WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| StoredBackupCode {
                code_hash: r.code_hash,
                consumed: r.consumed,
            })
            .collect())
    }

    async fn consume_backup_code(&self, user_id: UserId, code_hash: &str) -> AuthResult<bool> {
        // The consumed flag flips in the same statement that matches the
        // row, so a code can never be redeemed twice
        let consumed = sqlx::query(
            r#"
            UPDATE totp_backup_codes SET consumed = TRUE
            WHERE user_id = $1 AND code_hash = $2 AND NOT consumed
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(code_hash)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(consumed == 1)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

/// NULL region_ids means the unrestricted scope
fn region_ids_column(scope: &RegionScope) -> Option<Vec<i32>> {
    scope.region_ids().map(|ids| ids.iter().map(|r| r.0).collect())
}

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    public_id: String,
    email: String,
    display_name: String,
    user_role: i16,
    home_region: i32,
    region_ids: Option<Vec<i32>>,
    user_status: i16,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let public_id = PublicId::from_nanoid(
            Nanoid::from_str(&self.public_id)
                .map_err(|e| AuthError::Internal(format!("Invalid public_id: {}", e)))?,
        );

        let display_name = DisplayName::new(&self.display_name)
            .map_err(|e| AuthError::Internal(format!("Invalid display_name: {}", e)))?;

        let regions = match self.region_ids {
            None => RegionScope::All,
            Some(ids) => RegionScope::Regions(ids.into_iter().map(RegionId).collect()),
        };

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            public_id,
            email: Email::from_db(self.email),
            display_name,
            role: Role::from_id(self.user_role),
            home_region: RegionId(self.home_region),
            regions,
            status: UserStatus::from_id(self.user_status).unwrap_or_default(),
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    user_id: Uuid,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CredentialRow {
    fn into_credential(self) -> AuthResult<Credential> {
        let password_hash = HashedPassword::from_phc_string(self.password_hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Credential {
            user_id: UserId::from_uuid(self.user_id),
            password_hash,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    session_id: Uuid,
    user_id: Uuid,
    refresh_hash: String,
    device_info: String,
    client_ip: Option<String>,
    expires_at_ms: i64,
    revoked: bool,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> Session {
        Session {
            session_id: SessionId::from_uuid(self.session_id),
            user_id: UserId::from_uuid(self.user_id),
            refresh_hash: self.refresh_hash,
            device_info: self.device_info,
            ip: self.client_ip,
            expires_at_ms: self.expires_at_ms,
            revoked: self.revoked,
            created_at: self.created_at,
            last_activity_at: self.last_activity_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TotpRow {
    user_id: Uuid,
    secret_base32: String,
    enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TotpRow {
    fn into_enrollment(self) -> AuthResult<TotpEnrollment> {
        let secret = TotpSecret::from_base32(self.secret_base32)
            .map_err(|e| AuthError::Internal(format!("Invalid TOTP secret: {}", e)))?;

        Ok(TotpEnrollment {
            user_id: UserId::from_uuid(self.user_id),
            secret,
            enabled: self.enabled,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BackupCodeRow {
    code_hash: String,
    consumed: bool,
}
