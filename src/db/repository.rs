//! Database repository for CRUD and curation operations.
//!
//! Uses prepared statements and transactions for data integrity.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    CategoryFacet, CreateListingRequest, Listing, Notification, RevisionInfo, UpdateListingRequest,
};

const LISTING_COLUMNS: &str = "id, name, category, description, phone, whatsapp, instagram, \
     tiktok, email, website, image, approved, suspended, deleted_at, views, owner_email, \
     created_at, updated_at";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    /// Increment the revision ID and return the new value.
    pub async fn increment_revision(&self) -> Result<i64, AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&self.pool)
            .await?;
        self.get_revision_id().await
    }

    // ==================== LISTING QUERIES ====================

    /// List active listings: approved, not suspended, not trashed.
    pub async fn list_active(&self) -> Result<Vec<Listing>, AppError> {
        let sql = format!(
            "SELECT {LISTING_COLUMNS} FROM listings \
             WHERE approved = 1 AND suspended = 0 AND deleted_at IS NULL ORDER BY name"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(listing_from_row).collect())
    }

    /// List submissions awaiting approval (not trashed).
    pub async fn list_pending(&self) -> Result<Vec<Listing>, AppError> {
        let sql = format!(
            "SELECT {LISTING_COLUMNS} FROM listings \
             WHERE approved = 0 AND deleted_at IS NULL ORDER BY created_at"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(listing_from_row).collect())
    }

    /// Count submissions awaiting approval.
    pub async fn pending_count(&self) -> Result<i64, AppError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM listings WHERE approved = 0 AND deleted_at IS NULL",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("n"))
    }

    /// List trashed listings, most recently trashed first.
    pub async fn list_trashed(&self) -> Result<Vec<Listing>, AppError> {
        let sql = format!(
            "SELECT {LISTING_COLUMNS} FROM listings \
             WHERE deleted_at IS NOT NULL ORDER BY deleted_at DESC"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(listing_from_row).collect())
    }

    /// Get a listing by ID.
    pub async fn get_listing(&self, id: &str) -> Result<Option<Listing>, AppError> {
        let sql = format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(listing_from_row))
    }

    /// Create a new listing. Submissions always start unapproved.
    pub async fn create_listing(
        &self,
        request: &CreateListingRequest,
    ) -> Result<Listing, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO listings (id, name, category, description, phone, whatsapp, instagram, \
             tiktok, email, website, image, approved, suspended, deleted_at, views, owner_email, \
             created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0, NULL, 0, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&request.name)
        .bind(&request.category)
        .bind(&request.description)
        .bind(&request.phone)
        .bind(&request.whatsapp)
        .bind(&request.instagram)
        .bind(&request.tiktok)
        .bind(&request.owner_email)
        .bind(&request.website)
        .bind(&request.image)
        .bind(&request.owner_email)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(Listing {
            id,
            name: request.name.clone(),
            category: request.category.clone(),
            description: request.description.clone(),
            phone: request.phone.clone(),
            whatsapp: request.whatsapp.clone(),
            instagram: request.instagram.clone(),
            tiktok: request.tiktok.clone(),
            email: Some(request.owner_email.clone()),
            website: request.website.clone(),
            image: request.image.clone(),
            approved: false,
            suspended: false,
            deleted_at: None,
            views: 0,
            owner_email: request.owner_email.clone(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Update a listing's content fields. Approval and trash state are
    /// untouchable here; they move only through the batch operations.
    pub async fn update_listing(
        &self,
        id: &str,
        request: &UpdateListingRequest,
    ) -> Result<Listing, AppError> {
        let existing = self
            .get_listing(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Listing {} not found", id)))?;

        let now = Utc::now().to_rfc3339();

        let name = request.name.as_ref().unwrap_or(&existing.name);
        let category = request.category.as_ref().unwrap_or(&existing.category);
        let description = request.description.clone().or(existing.description.clone());
        let phone = request.phone.clone().or(existing.phone.clone());
        let whatsapp = request.whatsapp.clone().or(existing.whatsapp.clone());
        let instagram = request.instagram.clone().or(existing.instagram.clone());
        let tiktok = request.tiktok.clone().or(existing.tiktok.clone());
        let website = request.website.clone().or(existing.website.clone());
        let image = request.image.clone().or(existing.image.clone());

        sqlx::query(
            "UPDATE listings SET name = ?, category = ?, description = ?, phone = ?, \
             whatsapp = ?, instagram = ?, tiktok = ?, website = ?, image = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(name)
        .bind(category)
        .bind(&description)
        .bind(&phone)
        .bind(&whatsapp)
        .bind(&instagram)
        .bind(&tiktok)
        .bind(&website)
        .bind(&image)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(Listing {
            name: name.clone(),
            category: category.clone(),
            description,
            phone,
            whatsapp,
            instagram,
            tiktok,
            website,
            image,
            updated_at: now,
            ..existing
        })
    }

    /// Increment the view counter. Caller is responsible for the gating
    /// rules (approved listing, viewer is neither owner nor admin).
    pub async fn increment_views(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE listings SET views = views + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ==================== BATCH CURATION ====================

    /// Approve pending listings. Already-approved or trashed ids are no-ops.
    pub async fn batch_approve(&self, ids: &[String]) -> Result<u64, AppError> {
        self.batch_curation(
            ids,
            "UPDATE listings SET approved = 1, updated_at = ? \
             WHERE id = ? AND approved = 0 AND deleted_at IS NULL",
        )
        .await
    }

    /// Reject listings into the trash. Already-trashed ids are no-ops.
    pub async fn batch_reject(&self, ids: &[String]) -> Result<u64, AppError> {
        self.batch_curation(
            ids,
            "UPDATE listings SET deleted_at = ?1, updated_at = ?1 \
             WHERE id = ?2 AND deleted_at IS NULL",
        )
        .await
    }

    /// Restore listings out of the trash. Non-trashed ids are no-ops.
    pub async fn batch_restore(&self, ids: &[String]) -> Result<u64, AppError> {
        self.batch_curation(
            ids,
            "UPDATE listings SET deleted_at = NULL, updated_at = ? \
             WHERE id = ? AND deleted_at IS NOT NULL",
        )
        .await
    }

    /// Permanently delete listings. Only legal from the trash; ids that are
    /// not trashed are no-ops, which keeps retries safe.
    pub async fn batch_delete(&self, ids: &[String]) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut affected = 0u64;

        for id in ids {
            let result = sqlx::query("DELETE FROM listings WHERE id = ? AND deleted_at IS NOT NULL")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            affected += result.rows_affected();
        }

        // One revision increment for the entire batch
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(affected)
    }

    /// Shared transaction shape for the state-transition batches. The SQL
    /// binds `(now, id)` per row and must be idempotent on re-application.
    async fn batch_curation(&self, ids: &[String], sql: &str) -> Result<u64, AppError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;
        let mut affected = 0u64;

        for id in ids {
            let result = sqlx::query(sql)
                .bind(&now)
                .bind(id)
                .execute(&mut *tx)
                .await?;
            affected += result.rows_affected();
        }

        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(affected)
    }

    // ==================== CATEGORY FACETS ====================

    /// Derived `(name, count)` facets over the active listing set.
    pub async fn category_facets(&self) -> Result<Vec<CategoryFacet>, AppError> {
        let rows = sqlx::query(
            "SELECT category, COUNT(*) AS n FROM listings \
             WHERE approved = 1 AND suspended = 0 AND deleted_at IS NULL \
             GROUP BY category ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| CategoryFacet {
                name: row.get("category"),
                count: row.get("n"),
            })
            .collect())
    }

    // ==================== NOTIFICATIONS ====================

    /// Record a notification for an account.
    pub async fn create_notification(
        &self,
        account_email: &str,
        message: &str,
    ) -> Result<Notification, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO notifications (id, account_email, message, read, created_at) \
             VALUES (?, ?, ?, 0, ?)",
        )
        .bind(&id)
        .bind(account_email)
        .bind(message)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(Notification {
            id,
            account_email: account_email.to_string(),
            message: message.to_string(),
            read: false,
            created_at: now,
        })
    }

    /// List an account's notifications, newest first.
    pub async fn list_notifications(&self, account_email: &str) -> Result<Vec<Notification>, AppError> {
        let rows = sqlx::query(
            "SELECT id, account_email, message, read, created_at FROM notifications \
             WHERE account_email = ? ORDER BY created_at DESC",
        )
        .bind(account_email)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let read: i32 = row.get("read");
                Notification {
                    id: row.get("id"),
                    account_email: row.get("account_email"),
                    message: row.get("message"),
                    read: read != 0,
                    created_at: row.get("created_at"),
                }
            })
            .collect())
    }

    /// Count an account's unread notifications.
    pub async fn unread_count(&self, account_email: &str) -> Result<i64, AppError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM notifications WHERE account_email = ? AND read = 0",
        )
        .bind(account_email)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("n"))
    }

    /// Mark all of an account's notifications as read.
    pub async fn mark_notifications_read(&self, account_email: &str) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE notifications SET read = 1 WHERE account_email = ?")
            .bind(account_email)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ==================== ACCOUNT ERASURE ====================

    /// Hard-delete all of an account's data: its listings in any state and
    /// its notifications. Returns the number of listings removed.
    pub async fn delete_account_data(&self, owner_email: &str) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let listings = sqlx::query("DELETE FROM listings WHERE owner_email = ?")
            .bind(owner_email)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM notifications WHERE account_email = ?")
            .bind(owner_email)
            .execute(&mut *tx)
            .await?;

        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(listings.rows_affected())
    }
}

// Helper functions for row conversion

fn listing_from_row(row: &sqlx::sqlite::SqliteRow) -> Listing {
    let approved: i32 = row.get("approved");
    let suspended: i32 = row.get("suspended");
    Listing {
        id: row.get("id"),
        name: row.get("name"),
        category: row.get("category"),
        description: row.get("description"),
        phone: row.get("phone"),
        whatsapp: row.get("whatsapp"),
        instagram: row.get("instagram"),
        tiktok: row.get("tiktok"),
        email: row.get("email"),
        website: row.get("website"),
        image: row.get("image"),
        approved: approved != 0,
        suspended: suspended != 0,
        deleted_at: row.get("deleted_at"),
        views: row.get("views"),
        owner_email: row.get("owner_email"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
