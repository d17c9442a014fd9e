use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::domain::{
    events::StatusEvent,
    models::{Attachments, DeliveryOutcome, NewWish, Occasion, ProviderStatus, Wish, WishStatus},
    repositories::{ClaimOutcome, StatusApplyOutcome, WishRepository},
};

pub type PgPool = Pool<Postgres>;

#[derive(Clone)]
pub struct PostgresWishRepository {
    pool: PgPool,
}

impl PostgresWishRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }

    async fn exists(&self, id: Uuid) -> anyhow::Result<bool> {
        let exists: bool = sqlx::query_scalar(r#"SELECT EXISTS(SELECT 1 FROM wishes WHERE id = $1)"#)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl WishRepository for PostgresWishRepository {
    async fn insert(&self, wish: NewWish) -> anyhow::Result<Wish> {
        let wish = Wish::from_new(wish, Utc::now());
        let row = sqlx::query(
            r#"
            INSERT INTO wishes (
                id, sender_name, recipient_name, recipient_phone, occasion, message_text,
                language, image_url, video_url, document_url, scheduled_at, status,
                created_at, updated_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14)
            RETURNING *
            "#,
        )
        .bind(wish.id)
        .bind(&wish.sender_name)
        .bind(&wish.recipient_name)
        .bind(&wish.recipient_phone)
        .bind(wish.occasion.as_str())
        .bind(&wish.message_text)
        .bind(&wish.language)
        .bind(&wish.attachments.image_url)
        .bind(&wish.attachments.video_url)
        .bind(&wish.attachments.document_url)
        .bind(wish.scheduled_at)
        .bind(wish.status.as_str())
        .bind(wish.created_at)
        .bind(wish.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Wish::try_from(row)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Wish>> {
        let row = sqlx::query(
            r#"
            SELECT *
            FROM wishes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Wish::try_from).transpose()
    }

    async fn claim_due(&self, now: DateTime<Utc>, limit: u32) -> anyhow::Result<Vec<Wish>> {
        // The outer status check keeps the update a compare-and-swap even if a
        // row changed between the subquery snapshot and the lock.
        let rows = sqlx::query(
            r#"
            UPDATE wishes
            SET status = 'sending',
                claimed_at = $1,
                updated_at = $1
            WHERE id IN (
                SELECT id
                FROM wishes
                WHERE status = 'scheduled'
                  AND scheduled_at <= $1
                ORDER BY scheduled_at
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
              AND status = 'scheduled'
            RETURNING *
            "#,
        )
        .bind(now)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut wishes = rows
            .into_iter()
            .map(Wish::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        wishes.sort_by_key(|wish| wish.scheduled_at);
        Ok(wishes)
    }

    async fn claim_by_id(&self, id: Uuid, now: DateTime<Utc>) -> anyhow::Result<ClaimOutcome> {
        let row = sqlx::query(
            r#"
            UPDATE wishes
            SET status = 'sending',
                claimed_at = $2,
                updated_at = $2
            WHERE id = $1
              AND status = 'scheduled'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(ClaimOutcome::Claimed(Wish::try_from(row)?)),
            None if self.exists(id).await? => Ok(ClaimOutcome::Conflict),
            None => Ok(ClaimOutcome::NotFound),
        }
    }

    async fn renew_claim(
        &self,
        id: Uuid,
        claimed_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<DateTime<Utc>>> {
        // The stored stamp is returned because Postgres keeps microseconds only.
        let renewed: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            UPDATE wishes
            SET claimed_at = $3,
                updated_at = $3
            WHERE id = $1
              AND status = 'sending'
              AND claimed_at = $2
            RETURNING claimed_at
            "#,
        )
        .bind(id)
        .bind(claimed_at)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(renewed)
    }

    async fn release_claim(&self, id: Uuid, claimed_at: DateTime<Utc>) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE wishes
            SET status = 'scheduled',
                claimed_at = NULL,
                updated_at = NOW()
            WHERE id = $1
              AND status = 'sending'
              AND claimed_at = $2
            "#,
        )
        .bind(id)
        .bind(claimed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn reclaim_stale(&self, claimed_before: DateTime<Utc>) -> anyhow::Result<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE wishes
            SET status = 'scheduled',
                claimed_at = NULL,
                updated_at = NOW()
            WHERE status = 'sending'
              AND (claimed_at IS NULL OR claimed_at < $1)
            RETURNING id
            "#,
        )
        .bind(claimed_before)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn record_correlation(
        &self,
        id: Uuid,
        claimed_at: DateTime<Utc>,
        provider_message_id: &str,
        at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE wishes
            SET provider_message_id = COALESCE(provider_message_id, $3),
                provider_status = COALESCE(provider_status, 'sent'),
                provider_status_updated_at = COALESCE(provider_status_updated_at, $4),
                updated_at = NOW()
            WHERE id = $1
              AND status = 'sending'
              AND claimed_at = $2
            "#,
        )
        .bind(id)
        .bind(claimed_at)
        .bind(provider_message_id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_outcome(
        &self,
        id: Uuid,
        claimed_at: DateTime<Utc>,
        outcome: &DeliveryOutcome,
    ) -> anyhow::Result<bool> {
        // A callback applied while the wish was sending sets provider_event_at;
        // its status then stands.
        let result = sqlx::query(
            r#"
            UPDATE wishes
            SET status = $3,
                delivered_at = $4,
                provider_message_id = $5,
                provider_status = CASE
                    WHEN provider_event_at IS NULL THEN $6
                    ELSE provider_status
                END,
                provider_status_updated_at = CASE
                    WHEN provider_event_at IS NULL THEN $7
                    ELSE provider_status_updated_at
                END,
                provider_error = CASE
                    WHEN provider_event_at IS NULL THEN $8
                    ELSE COALESCE($8, provider_error)
                END,
                updated_at = NOW()
            WHERE id = $1
              AND status = 'sending'
              AND claimed_at = $2
            "#,
        )
        .bind(id)
        .bind(claimed_at)
        .bind(outcome.status.as_str())
        .bind(outcome.delivered_at)
        .bind(&outcome.provider_message_id)
        .bind(outcome.provider_status.as_str())
        .bind(outcome.status_updated_at)
        .bind(outcome.error_payload())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }
        if !self.exists(id).await? {
            anyhow::bail!("wish {id} not found");
        }
        Ok(false)
    }

    async fn apply_provider_status(
        &self,
        event: &StatusEvent,
    ) -> anyhow::Result<StatusApplyOutcome> {
        let result = sqlx::query(
            r#"
            UPDATE wishes
            SET provider_status = $2,
                provider_status_updated_at = $3,
                provider_event_at = $3,
                provider_error = $4,
                updated_at = NOW()
            WHERE provider_message_id = $1
              AND (
                provider_event_at IS NULL
                OR provider_event_at < $3
                OR (
                    provider_event_at = $3
                    AND CASE provider_status
                        WHEN 'sent' THEN 1
                        WHEN 'delivered' THEN 2
                        WHEN 'read' THEN 3
                        WHEN 'failed' THEN 4
                        ELSE 0
                    END <= $5
                )
              )
            "#,
        )
        .bind(&event.provider_message_id)
        .bind(event.status.as_str())
        .bind(event.occurred_at)
        .bind(&event.errors)
        .bind(event.status.rank())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(StatusApplyOutcome::Applied);
        }

        let known: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(SELECT 1 FROM wishes WHERE provider_message_id = $1)"#,
        )
        .bind(&event.provider_message_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(if known {
            StatusApplyOutcome::Stale
        } else {
            StatusApplyOutcome::Unmatched
        })
    }
}

impl TryFrom<sqlx::postgres::PgRow> for Wish {
    type Error = anyhow::Error;

    fn try_from(row: sqlx::postgres::PgRow) -> Result<Self, Self::Error> {
        let occasion_str: String = row.try_get("occasion")?;
        let occasion = Occasion::from_str(&occasion_str)
            .ok_or_else(|| anyhow::anyhow!("unknown occasion {occasion_str}"))?;
        let status_str: String = row.try_get("status")?;
        let status = WishStatus::from_str(&status_str)
            .ok_or_else(|| anyhow::anyhow!("unknown wish status {status_str}"))?;
        let provider_status = row
            .try_get::<Option<String>, _>("provider_status")?
            .map(|value| {
                ProviderStatus::from_str(&value)
                    .ok_or_else(|| anyhow::anyhow!("unknown provider status {value}"))
            })
            .transpose()?;

        Ok(Wish {
            id: row.try_get("id")?,
            sender_name: row.try_get("sender_name")?,
            recipient_name: row.try_get("recipient_name")?,
            recipient_phone: row.try_get("recipient_phone")?,
            occasion,
            message_text: row.try_get("message_text")?,
            language: row.try_get("language")?,
            attachments: Attachments {
                image_url: row.try_get("image_url")?,
                video_url: row.try_get("video_url")?,
                document_url: row.try_get("document_url")?,
            },
            scheduled_at: row.try_get("scheduled_at")?,
            status,
            claimed_at: row.try_get("claimed_at")?,
            delivered_at: row.try_get("delivered_at")?,
            provider_message_id: row.try_get("provider_message_id")?,
            provider_status,
            provider_status_updated_at: row.try_get("provider_status_updated_at")?,
            provider_event_at: row.try_get("provider_event_at")?,
            provider_error: row.try_get("provider_error")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
