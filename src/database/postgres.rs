use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::manager::{DatabaseError, DatabaseManager};
use super::models::{
    Contact, ContactChanges, ContactFilter, NewContact, NewTag, NewUser, Tag, TagChanges, TagDeletion,
    TagSummary, User,
};
use super::store::{Store, StoreResult};

const USER_COLUMNS: &str = "id, name, email, password, created_at, updated_at";
const TAG_COLUMNS: &str = "id, name, color, created_by, usage_count, created_at, updated_at";

/// Contact rows with their tag ids aggregated in attachment order.
/// `$1` is always the owner; callers append further predicates on `c`.
const CONTACT_SELECT: &str = r#"
    SELECT c.id, c.name, c.email, c.phone, c.is_favorite, c.created_by, c.created_at, c.updated_at,
           COALESCE(
               array_agg(ct.tag_id ORDER BY ct.attached_at) FILTER (WHERE ct.tag_id IS NOT NULL),
               '{}'::uuid[]
           ) AS tags
    FROM contacts c
    LEFT JOIN contact_tags ct ON ct.contact_id = c.id
    WHERE c.created_by = $1
"#;

const CONTACT_GROUP: &str = " GROUP BY c.id ORDER BY c.created_at, c.id";

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn contact_query(predicate: &str) -> String {
        format!("{}{}{}", CONTACT_SELECT, predicate, CONTACT_GROUP)
    }

    async fn contact_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        owner: Uuid,
        id: Uuid,
    ) -> Result<Option<Contact>, DatabaseError> {
        let sql = Self::contact_query(" AND c.id = $2");
        let contact = sqlx::query_as::<_, Contact>(&sql)
            .bind(owner)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(contact)
    }

    async fn increment_usage(
        tx: &mut Transaction<'_, Postgres>,
        tag_id: Uuid,
        by: i64,
    ) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE tags SET usage_count = usage_count + $2, updated_at = now() WHERE id = $1")
            .bind(tag_id)
            .bind(by)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn decrement_usage(tx: &mut Transaction<'_, Postgres>, tag_id: Uuid) -> Result<(), DatabaseError> {
        sqlx::query(
            "UPDATE tags SET usage_count = usage_count - 1, updated_at = now() WHERE id = $1 AND usage_count > 0",
        )
        .bind(tag_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> StoreResult<()> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (id, name, email, password) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql).bind(email).fetch_optional(&self.pool).await?;
        Ok(user)
    }

    async fn update_user_password(&self, id: Uuid, password_hash: &str) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE users SET password = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_contacts(&self, owner: Uuid, filter: ContactFilter) -> StoreResult<Vec<Contact>> {
        let sql = match filter {
            ContactFilter::All => Self::contact_query(""),
            ContactFilter::Favorites => Self::contact_query(" AND c.is_favorite"),
            ContactFilter::WithTag(_) => Self::contact_query(
                " AND EXISTS (SELECT 1 FROM contact_tags x WHERE x.contact_id = c.id AND x.tag_id = $2)",
            ),
            ContactFilter::WithoutTag(_) => Self::contact_query(
                " AND NOT EXISTS (SELECT 1 FROM contact_tags x WHERE x.contact_id = c.id AND x.tag_id = $2)",
            ),
        };
        let mut query = sqlx::query_as::<_, Contact>(&sql).bind(owner);
        if let ContactFilter::WithTag(tag_id) | ContactFilter::WithoutTag(tag_id) = filter {
            query = query.bind(tag_id);
        }
        let contacts = query.fetch_all(&self.pool).await?;
        Ok(contacts)
    }

    async fn find_contact(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Contact>> {
        let sql = Self::contact_query(" AND c.id = $2");
        let contact = sqlx::query_as::<_, Contact>(&sql)
            .bind(owner)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(contact)
    }

    async fn find_contacts(&self, owner: Uuid, ids: &[Uuid]) -> StoreResult<Vec<Contact>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = Self::contact_query(" AND c.id = ANY($2)");
        let contacts = sqlx::query_as::<_, Contact>(&sql)
            .bind(owner)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(contacts)
    }

    async fn insert_contact(&self, contact: NewContact) -> StoreResult<Contact> {
        let created = sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts (id, name, email, phone, is_favorite, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, email, phone, is_favorite, created_by, created_at, updated_at,
                      '{}'::uuid[] AS tags
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(contact.is_favorite)
        .bind(contact.created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update_contact(&self, owner: Uuid, id: Uuid, changes: &ContactChanges) -> StoreResult<Option<Contact>> {
        let updated = sqlx::query(
            r#"
            UPDATE contacts SET
                name = COALESCE($3, name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                is_favorite = COALESCE($6, is_favorite),
                updated_at = now()
            WHERE id = $1 AND created_by = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(changes.name.as_deref())
        .bind(changes.email.as_deref())
        .bind(changes.phone.as_deref())
        .bind(changes.is_favorite)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_contact(owner, id).await
    }

    async fn delete_contact(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Contact>> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query("SELECT id FROM contacts WHERE id = $1 AND created_by = $2 FOR UPDATE")
            .bind(id)
            .bind(owner)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let contact = Self::contact_in_tx(&mut tx, owner, id).await?;

        sqlx::query(
            r#"
            UPDATE tags SET usage_count = usage_count - 1, updated_at = now()
            WHERE created_by = $2 AND usage_count > 0
              AND id IN (SELECT tag_id FROM contact_tags WHERE contact_id = $1)
            "#,
        )
        .bind(id)
        .bind(owner)
        .execute(&mut *tx)
        .await?;

        // contact_tags rows go with the contact (ON DELETE CASCADE)
        sqlx::query("DELETE FROM contacts WHERE id = $1 AND created_by = $2")
            .bind(id)
            .bind(owner)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(contact)
    }

    async fn list_tags(&self, owner: Uuid) -> StoreResult<Vec<Tag>> {
        let sql = format!(
            "SELECT {} FROM tags WHERE created_by = $1 ORDER BY usage_count DESC, created_at DESC, id",
            TAG_COLUMNS
        );
        let tags = sqlx::query_as::<_, Tag>(&sql).bind(owner).fetch_all(&self.pool).await?;
        Ok(tags)
    }

    async fn find_tag(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Tag>> {
        let sql = format!("SELECT {} FROM tags WHERE id = $1 AND created_by = $2", TAG_COLUMNS);
        let tag = sqlx::query_as::<_, Tag>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tag)
    }

    async fn find_tag_by_name(&self, owner: Uuid, name: &str, exclude: Option<Uuid>) -> StoreResult<Option<Tag>> {
        let sql = format!(
            "SELECT {} FROM tags WHERE created_by = $1 AND lower(name) = lower($2) \
             AND ($3::uuid IS NULL OR id <> $3) LIMIT 1",
            TAG_COLUMNS
        );
        let tag = sqlx::query_as::<_, Tag>(&sql)
            .bind(owner)
            .bind(name)
            .bind(exclude)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tag)
    }

    async fn tag_summaries(&self, owner: Uuid, ids: &[Uuid]) -> StoreResult<Vec<TagSummary>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let summaries = sqlx::query_as::<_, TagSummary>(
            "SELECT id, name, color FROM tags WHERE created_by = $1 AND id = ANY($2)",
        )
        .bind(owner)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(summaries)
    }

    async fn insert_tag(&self, tag: NewTag) -> StoreResult<Tag> {
        let sql = format!(
            "INSERT INTO tags (id, name, color, created_by) VALUES ($1, $2, $3, $4) RETURNING {}",
            TAG_COLUMNS
        );
        let created = sqlx::query_as::<_, Tag>(&sql)
            .bind(Uuid::new_v4())
            .bind(&tag.name)
            .bind(&tag.color)
            .bind(tag.created_by)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn update_tag(&self, owner: Uuid, id: Uuid, changes: &TagChanges) -> StoreResult<Option<Tag>> {
        let sql = format!(
            "UPDATE tags SET name = COALESCE($3, name), color = COALESCE($4, color), updated_at = now() \
             WHERE id = $1 AND created_by = $2 RETURNING {}",
            TAG_COLUMNS
        );
        let updated = sqlx::query_as::<_, Tag>(&sql)
            .bind(id)
            .bind(owner)
            .bind(changes.name.as_deref())
            .bind(changes.color.as_deref())
            .fetch_optional(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn delete_tag(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<TagDeletion>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {} FROM tags WHERE id = $1 AND created_by = $2 FOR UPDATE", TAG_COLUMNS);
        let Some(tag) = sqlx::query_as::<_, Tag>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&mut *tx)
            .await?
        else {
            tx.rollback().await?;
            return Ok(None);
        };

        // Phase 1: strip the tag from the owner's contacts
        let stripped = sqlx::query(
            r#"
            DELETE FROM contact_tags
            WHERE tag_id = $1
              AND contact_id IN (SELECT id FROM contacts WHERE created_by = $2)
            "#,
        )
        .bind(id)
        .bind(owner)
        .execute(&mut *tx)
        .await?;

        // Phase 2: remove the tag itself
        sqlx::query("DELETE FROM tags WHERE id = $1 AND created_by = $2")
            .bind(id)
            .bind(owner)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(TagDeletion {
            tag,
            detached_contacts: stripped.rows_affected(),
        }))
    }

    async fn attach_tag(&self, owner: Uuid, tag_id: Uuid, contact_ids: &[Uuid]) -> StoreResult<Vec<Uuid>> {
        let mut tx = self.pool.begin().await?;

        // Contacts before tags, in id order, the same order contact delete takes
        let live: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM contacts WHERE created_by = $1 AND id = ANY($2) ORDER BY id FOR UPDATE",
        )
        .bind(owner)
        .bind(contact_ids)
        .fetch_all(&mut *tx)
        .await?;

        let locked = sqlx::query("SELECT id FROM tags WHERE id = $1 AND created_by = $2 FOR UPDATE")
            .bind(tag_id)
            .bind(owner)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            tx.rollback().await?;
            return Err(DatabaseError::NotFound(format!("tag {}", tag_id)));
        }

        let mut attached = Vec::new();
        for contact_id in contact_ids.iter().filter(|id| live.contains(id)) {
            let inserted = sqlx::query(
                "INSERT INTO contact_tags (contact_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(contact_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;
            if inserted.rows_affected() == 1 {
                attached.push(*contact_id);
            }
        }

        if !attached.is_empty() {
            Self::increment_usage(&mut tx, tag_id, attached.len() as i64).await?;
        }

        tx.commit().await?;
        Ok(attached)
    }

    async fn detach_tag(&self, owner: Uuid, tag_id: Uuid, contact_id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM contacts WHERE id = $1 AND created_by = $2 FOR UPDATE")
            .bind(contact_id)
            .bind(owner)
            .fetch_optional(&mut *tx)
            .await?;

        let removed = sqlx::query(
            r#"
            DELETE FROM contact_tags ct
            USING contacts c, tags t
            WHERE ct.contact_id = c.id AND ct.tag_id = t.id
              AND c.id = $1 AND c.created_by = $3
              AND t.id = $2 AND t.created_by = $3
            "#,
        )
        .bind(contact_id)
        .bind(tag_id)
        .bind(owner)
        .execute(&mut *tx)
        .await?;

        if removed.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        Self::decrement_usage(&mut tx, tag_id).await?;
        tx.commit().await?;
        Ok(true)
    }
}
