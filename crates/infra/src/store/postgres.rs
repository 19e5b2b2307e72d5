//! Postgres-backed credential and hospital stores.
//!
//! ## Error Mapping
//!
//! | SQLx error | Postgres code | `StoreError` |
//! |---|---|---|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | any | `Unavailable` |
//! | PoolClosed / Io / other | n/a | `Unavailable` |
//!
//! Column values that do not map back into domain types are `Corrupt`.
//!
//! ## Verification consume
//!
//! `consume_verification` is a single `UPDATE ... RETURNING` whose `WHERE`
//! clause carries the token, the unverified status and the expiry cut-off,
//! so two concurrent consumers cannot both match the row.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use apexhms_auth::{AccountStatus, Credential, PendingVerification, Role, VerificationToken};
use apexhms_core::{Email, Hospital, HospitalStatus, HospitalType, PrincipalId, TenantId};

use super::{CredentialStore, HospitalStore, StoreError};

const SCHEMA: &str = include_str!("../../migrations/0001_accounts.sql");

/// Connect and make sure the schema exists.
pub async fn connect(database_url: &str) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))?;

    sqlx::raw_sql(SCHEMA)
        .execute(&pool)
        .await
        .map_err(|e| map_sqlx_error("migrate", e))?;

    Ok(pool)
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                _ => StoreError::Unavailable(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::Unavailable(format!("connection pool closed in {operation}")),
        other => StoreError::Unavailable(format!("sqlx error in {operation}: {other}")),
    }
}

fn corrupt(column: &str, detail: impl core::fmt::Display) -> StoreError {
    StoreError::Corrupt(format!("{column}: {detail}"))
}

const CREDENTIAL_COLUMNS: &str = "principal_id, email, password_hash, role, tenant_id, status, \
     verification_token, verification_issued_at, created_at";

fn credential_from_row(row: &PgRow) -> Result<Credential, StoreError> {
    let get_err = |e: sqlx::Error| StoreError::Corrupt(e.to_string());

    let email: String = row.try_get("email").map_err(get_err)?;
    let role: String = row.try_get("role").map_err(get_err)?;
    let status: String = row.try_get("status").map_err(get_err)?;
    let token: Option<String> = row.try_get("verification_token").map_err(get_err)?;
    let issued_at: Option<DateTime<Utc>> = row.try_get("verification_issued_at").map_err(get_err)?;
    let tenant: Option<Uuid> = row.try_get("tenant_id").map_err(get_err)?;

    Ok(Credential {
        principal_id: PrincipalId::from_uuid(row.try_get("principal_id").map_err(get_err)?),
        email: Email::parse(&email).map_err(|e| corrupt("email", e))?,
        password_hash: row.try_get("password_hash").map_err(get_err)?,
        role: Role::parse(&role).ok_or_else(|| corrupt("role", &role))?,
        tenant_id: tenant.map(TenantId::from_uuid),
        status: AccountStatus::parse(&status).ok_or_else(|| corrupt("status", &status))?,
        pending_verification: match (token, issued_at) {
            (Some(token), Some(issued_at)) => Some(PendingVerification {
                token: VerificationToken::from_client(token),
                issued_at,
            }),
            _ => None,
        },
        created_at: row.try_get("created_at").map_err(get_err)?,
    })
}

#[derive(Debug, Clone)]
pub struct PostgresCredentialStore {
    pool: Arc<PgPool>,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    async fn fetch_one_where(&self, op: &str, clause: &str, bind: Uuid) -> Result<Option<Credential>, StoreError> {
        let sql = format!("SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE {clause}");
        sqlx::query(&sql)
            .bind(bind)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(op, e))?
            .as_ref()
            .map(credential_from_row)
            .transpose()
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    #[instrument(skip_all, fields(principal_id = %credential.principal_id), err)]
    async fn insert(&self, credential: Credential) -> Result<(), StoreError> {
        let (token, issued_at) = match &credential.pending_verification {
            Some(p) => (Some(p.token.as_str().to_string()), Some(p.issued_at)),
            None => (None, None),
        };

        sqlx::query(
            r#"
            INSERT INTO credentials (
                principal_id, email, password_hash, role, tenant_id, status,
                verification_token, verification_issued_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(credential.principal_id.as_uuid())
        .bind(credential.email.as_str())
        .bind(&credential.password_hash)
        .bind(credential.role.as_str())
        .bind(credential.tenant_id.map(|t| *t.as_uuid()))
        .bind(credential.status.as_str())
        .bind(token)
        .bind(issued_at)
        .bind(credential.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_credential", e))?;

        Ok(())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Credential>, StoreError> {
        let sql = format!("SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE email = $1");
        sqlx::query(&sql)
            .bind(email.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_email", e))?
            .as_ref()
            .map(credential_from_row)
            .transpose()
    }

    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Credential>, StoreError> {
        self.fetch_one_where("find_by_id", "principal_id = $1", *id.as_uuid()).await
    }

    async fn find_in_tenant(&self, tenant_id: TenantId, id: PrincipalId) -> Result<Option<Credential>, StoreError> {
        let sql = format!("SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE principal_id = $1 AND tenant_id = $2");
        sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(tenant_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_in_tenant", e))?
            .as_ref()
            .map(credential_from_row)
            .transpose()
    }

    async fn list_in_tenant(&self, tenant_id: TenantId) -> Result<Vec<Credential>, StoreError> {
        let sql = format!("SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE tenant_id = $1 ORDER BY created_at");
        sqlx::query(&sql)
            .bind(tenant_id.as_uuid())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_in_tenant", e))?
            .iter()
            .map(credential_from_row)
            .collect()
    }

    #[instrument(skip_all, err)]
    async fn consume_verification(
        &self,
        token: &VerificationToken,
        now: DateTime<Utc>,
        ttl: Option<Duration>,
    ) -> Result<Option<Credential>, StoreError> {
        // Tokens issued at or before the cut-off are expired.
        let cutoff: Option<DateTime<Utc>> = ttl.map(|ttl| now - ttl);

        let sql = format!(
            r#"
            UPDATE credentials
            SET status = 'active', verification_token = NULL, verification_issued_at = NULL
            WHERE verification_token = $1
              AND status = 'unverified'
              AND ($2::timestamptz IS NULL OR verification_issued_at > $2)
            RETURNING {CREDENTIAL_COLUMNS}
            "#
        );

        sqlx::query(&sql)
            .bind(token.as_str())
            .bind(cutoff)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("consume_verification", e))?
            .as_ref()
            .map(credential_from_row)
            .transpose()
    }

    async fn set_status(
        &self,
        id: PrincipalId,
        from: AccountStatus,
        to: AccountStatus,
    ) -> Result<Option<Credential>, StoreError> {
        let sql = format!(
            r#"
            UPDATE credentials
            SET status = $3,
                verification_token = CASE WHEN $3 = 'rejected' THEN NULL ELSE verification_token END,
                verification_issued_at = CASE WHEN $3 = 'rejected' THEN NULL ELSE verification_issued_at END
            WHERE principal_id = $1 AND status = $2
            RETURNING {CREDENTIAL_COLUMNS}
            "#
        );

        sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(from.as_str())
            .bind(to.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_account_status", e))?
            .as_ref()
            .map(credential_from_row)
            .transpose()
    }

    #[instrument(skip(self), err)]
    async fn remove(&self, id: PrincipalId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM credentials WHERE principal_id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("remove_credential", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let total: i64 = sqlx::query("SELECT COUNT(*) AS total FROM credentials")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_credentials", e))?
            .try_get("total")
            .map_err(|e| corrupt("total", e))?;
        Ok(total.max(0) as usize)
    }
}

const HOSPITAL_COLUMNS: &str = "id, name, hospital_type, address, phone, email, license_number, \
     admin_name, status, created_at, approved_at";

fn hospital_from_row(row: &PgRow) -> Result<Hospital, StoreError> {
    let get_err = |e: sqlx::Error| StoreError::Corrupt(e.to_string());

    let kind: String = row.try_get("hospital_type").map_err(get_err)?;
    let status: String = row.try_get("status").map_err(get_err)?;
    let email: String = row.try_get("email").map_err(get_err)?;

    Ok(Hospital {
        id: TenantId::from_uuid(row.try_get("id").map_err(get_err)?),
        name: row.try_get("name").map_err(get_err)?,
        hospital_type: HospitalType::parse(&kind).map_err(|e| corrupt("hospital_type", e))?,
        address: row.try_get("address").map_err(get_err)?,
        phone: row.try_get("phone").map_err(get_err)?,
        email: Email::parse(&email).map_err(|e| corrupt("email", e))?,
        license_number: row.try_get("license_number").map_err(get_err)?,
        admin_name: row.try_get("admin_name").map_err(get_err)?,
        status: HospitalStatus::parse(&status).map_err(|e| corrupt("status", e))?,
        created_at: row.try_get("created_at").map_err(get_err)?,
        approved_at: row.try_get("approved_at").map_err(get_err)?,
    })
}

#[derive(Debug, Clone)]
pub struct PostgresHospitalStore {
    pool: Arc<PgPool>,
}

impl PostgresHospitalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

#[async_trait]
impl HospitalStore for PostgresHospitalStore {
    #[instrument(skip_all, fields(tenant_id = %hospital.id), err)]
    async fn insert(&self, hospital: Hospital) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO hospitals (
                id, name, hospital_type, address, phone, email, license_number,
                admin_name, status, created_at, approved_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(hospital.id.as_uuid())
        .bind(&hospital.name)
        .bind(hospital.hospital_type.as_str())
        .bind(&hospital.address)
        .bind(&hospital.phone)
        .bind(hospital.email.as_str())
        .bind(&hospital.license_number)
        .bind(&hospital.admin_name)
        .bind(hospital.status.as_str())
        .bind(hospital.created_at)
        .bind(hospital.approved_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_hospital", e))?;

        Ok(())
    }

    async fn get(&self, id: TenantId) -> Result<Option<Hospital>, StoreError> {
        let sql = format!("SELECT {HOSPITAL_COLUMNS} FROM hospitals WHERE id = $1");
        sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_hospital", e))?
            .as_ref()
            .map(hospital_from_row)
            .transpose()
    }

    async fn list(&self, status: Option<HospitalStatus>) -> Result<Vec<Hospital>, StoreError> {
        let sql = format!(
            "SELECT {HOSPITAL_COLUMNS} FROM hospitals WHERE ($1::text IS NULL OR status = $1) ORDER BY created_at DESC"
        );
        sqlx::query(&sql)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_hospitals", e))?
            .iter()
            .map(hospital_from_row)
            .collect()
    }

    #[instrument(skip(self), fields(tenant_id = %id), err)]
    async fn set_status(
        &self,
        id: TenantId,
        from: HospitalStatus,
        to: HospitalStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Hospital>, StoreError> {
        let Some(mut next) = self.get(id).await?.filter(|h| h.status == from) else {
            return Ok(None);
        };
        next.change_status(to, now).map_err(|e| StoreError::Conflict(e.to_string()))?;

        // The status guard turns a concurrent change into a miss.
        let sql = format!(
            r#"
            UPDATE hospitals
            SET status = $3, approved_at = $4
            WHERE id = $1 AND status = $2
            RETURNING {HOSPITAL_COLUMNS}
            "#
        );
        sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(from.as_str())
            .bind(next.status.as_str())
            .bind(next.approved_at)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_hospital_status", e))?
            .as_ref()
            .map(hospital_from_row)
            .transpose()
    }

    async fn update_profile(&self, hospital: &Hospital) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE hospitals SET name = $2, address = $3, phone = $4 WHERE id = $1")
            .bind(hospital.id.as_uuid())
            .bind(&hospital.name)
            .bind(&hospital.address)
            .bind(&hospital.phone)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_hospital_profile", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn count_by_status(&self, status: Option<HospitalStatus>) -> Result<usize, StoreError> {
        let total: i64 = sqlx::query("SELECT COUNT(*) AS total FROM hospitals WHERE ($1::text IS NULL OR status = $1)")
            .bind(status.map(|s| s.as_str()))
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_hospitals", e))?
            .try_get("total")
            .map_err(|e| corrupt("total", e))?;
        Ok(total.max(0) as usize)
    }
}
