// src/seller/services.rs

use super::models::Seller;
use crate::auth::models::SellerStatus;
use crate::common::{generate_seller_id, normalize_email, safe_email_log, ApiError};
use sqlx::SqlitePool;
use tracing::info;

const SELLER_COLUMNS: &str =
    "id, email, business_name, status, verified, created_at, updated_at";

pub struct SellerService {
    db: SqlitePool,
}

impl SellerService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Get seller by normalized email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Seller>, ApiError> {
        let seller = sqlx::query_as::<_, Seller>(&format!(
            "SELECT {} FROM sellers WHERE email = ?",
            SELLER_COLUMNS
        ))
        .bind(normalize_email(email))
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        Ok(seller)
    }

    /// Get seller by ID
    pub async fn find_by_id(&self, seller_id: &str) -> Result<Option<Seller>, ApiError> {
        let seller = sqlx::query_as::<_, Seller>(&format!(
            "SELECT {} FROM sellers WHERE id = ?",
            SELLER_COLUMNS
        ))
        .bind(seller_id)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        Ok(seller)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, ApiError> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    /// Create a verified seller awaiting approval
    pub async fn create(&self, email: &str, business_name: &str) -> Result<Seller, ApiError> {
        let email = normalize_email(email);
        let seller_id = generate_seller_id();

        let result = sqlx::query(
            r#"
            INSERT INTO sellers (id, email, business_name, status, verified)
            VALUES (?, ?, ?, 'pending', 1)
            "#,
        )
        .bind(&seller_id)
        .bind(&email)
        .bind(business_name.trim())
        .execute(&self.db)
        .await;

        if let Err(e) = result {
            if is_unique_violation(&e) {
                return Err(ApiError::Conflict(
                    "An account with this email already exists".to_string(),
                ));
            }
            return Err(ApiError::DatabaseError(e));
        }

        info!(
            seller_id = %seller_id,
            email = %safe_email_log(&email),
            "Seller account created"
        );

        self.find_by_id(&seller_id)
            .await?
            .ok_or_else(|| ApiError::InternalServer("seller missing after insert".to_string()))
    }

    /// List sellers, newest first, optionally filtered by status
    pub async fn list(&self, status: Option<SellerStatus>) -> Result<Vec<Seller>, ApiError> {
        let sellers = match status {
            Some(status) => {
                sqlx::query_as::<_, Seller>(&format!(
                    "SELECT {} FROM sellers WHERE status = ? ORDER BY created_at DESC, id ASC",
                    SELLER_COLUMNS
                ))
                .bind(status.as_str())
                .fetch_all(&self.db)
                .await
            }
            None => {
                sqlx::query_as::<_, Seller>(&format!(
                    "SELECT {} FROM sellers ORDER BY created_at DESC, id ASC",
                    SELLER_COLUMNS
                ))
                .fetch_all(&self.db)
                .await
            }
        }
        .map_err(ApiError::DatabaseError)?;

        Ok(sellers)
    }

    /// Set a seller's status
    pub async fn update_status(
        &self,
        seller_id: &str,
        status: SellerStatus,
    ) -> Result<Seller, ApiError> {
        let result = sqlx::query(
            r#"
            UPDATE sellers
            SET status = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(seller_id)
        .execute(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Seller not found".to_string()));
        }

        self.find_by_id(seller_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Seller not found".to_string()))
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_error) => db_error.message().contains("UNIQUE constraint failed"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::migrations::run_migrations;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn service() -> SellerService {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        SellerService::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let sellers = service().await;
        let created = sellers
            .create(" Seller@Shop.example ", "Corner Shop")
            .await
            .unwrap();

        assert!(created.id.starts_with("S_"));
        assert_eq!(created.email, "seller@shop.example");
        assert_eq!(created.status(), SellerStatus::Pending);
        assert!(created.verified);

        let found = sellers.find_by_email("SELLER@shop.example").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(sellers.email_exists("seller@shop.example").await.unwrap());
        assert!(!sellers.email_exists("other@shop.example").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let sellers = service().await;
        sellers.create("seller@shop.example", "Corner Shop").await.unwrap();

        let err = sellers
            .create("seller@shop.example", "Another Shop")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_status_updates_and_filtering() {
        let sellers = service().await;
        let a = sellers.create("a@shop.example", "A").await.unwrap();
        sellers.create("b@shop.example", "B").await.unwrap();

        let approved = sellers.update_status(&a.id, SellerStatus::Approved).await.unwrap();
        assert_eq!(approved.status(), SellerStatus::Approved);

        let pending = sellers.list(Some(SellerStatus::Pending)).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].email, "b@shop.example");
        assert_eq!(sellers.list(None).await.unwrap().len(), 2);

        let missing = sellers.update_status("S_NOPE00", SellerStatus::Approved).await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_suspended_seller_cannot_sign_in() {
        let sellers = service().await;
        let seller = sellers.create("a@shop.example", "A").await.unwrap();
        assert!(seller.can_sign_in());

        let suspended = sellers
            .update_status(&seller.id, SellerStatus::Suspended)
            .await
            .unwrap();
        assert!(!suspended.can_sign_in());
    }
}
