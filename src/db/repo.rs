//! Persistence operations for users, forms and responses.
//!
//! Every mutation runs in its own transaction scoped to the calling
//! request: it either fully commits or rolls back on drop, leaving no
//! partial record.

use chrono::Utc;
use sqlx::Row;

use super::models::{Form, FormResponse, User};
use super::DbPool;

pub async fn create_user(pool: &DbPool, provider_id: &str, email: &str) -> Result<i64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let now = Utc::now().to_rfc3339();

    let result = sqlx::query(
        "INSERT INTO users (provider_id, email, created_at) VALUES (?, ?, ?)",
    )
    .bind(provider_id)
    .bind(email)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(result.last_insert_rowid())
}

pub async fn find_user_by_provider_id(
    pool: &DbPool,
    provider_id: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE provider_id = ?")
        .bind(provider_id)
        .fetch_optional(pool)
        .await
}

pub async fn create_form(
    pool: &DbPool,
    form_id: &str,
    user_id: Option<i64>,
    name: &str,
    fields_json: &str,
) -> Result<i64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let now = Utc::now().to_rfc3339();

    let result = sqlx::query(
        r#"
        INSERT INTO forms (form_id, user_id, name, fields, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(form_id)
    .bind(user_id)
    .bind(name)
    .bind(fields_json)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(result.last_insert_rowid())
}

pub async fn find_form_by_external_id(
    pool: &DbPool,
    form_id: &str,
) -> Result<Option<Form>, sqlx::Error> {
    sqlx::query_as::<_, Form>("SELECT * FROM forms WHERE form_id = ?")
        .bind(form_id)
        .fetch_optional(pool)
        .await
}

pub async fn create_response(
    pool: &DbPool,
    form_internal_id: i64,
    data_json: &str,
) -> Result<i64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let now = Utc::now().to_rfc3339();

    // Response rows must reference an existing form; re-check inside the
    // transaction so a form looked up earlier cannot vanish between the
    // check and the insert.
    let exists: i64 = sqlx::query("SELECT COUNT(*) AS n FROM forms WHERE id = ?")
        .bind(form_internal_id)
        .fetch_one(&mut *tx)
        .await?
        .get("n");
    if exists == 0 {
        return Err(sqlx::Error::RowNotFound);
    }

    let result = sqlx::query(
        "INSERT INTO responses (form_id, data, created_at) VALUES (?, ?, ?)",
    )
    .bind(form_internal_id)
    .bind(data_json)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(result.last_insert_rowid())
}

pub async fn list_responses_by_form(
    pool: &DbPool,
    form_internal_id: i64,
) -> Result<Vec<FormResponse>, sqlx::Error> {
    sqlx::query_as::<_, FormResponse>(
        "SELECT * FROM responses WHERE form_id = ? ORDER BY id",
    )
    .bind(form_internal_id)
    .fetch_all(pool)
    .await
}

pub async fn list_forms_by_owner(pool: &DbPool, user_id: i64) -> Result<Vec<Form>, sqlx::Error> {
    sqlx::query_as::<_, Form>(
        "SELECT * FROM forms WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> (tempfile::TempDir, DbPool) {
        let dir = tempfile::tempdir().unwrap();
        let pool = crate::db::init(dir.path()).await.unwrap();
        (dir, pool)
    }

    #[tokio::test]
    async fn create_and_find_user() {
        let (_dir, pool) = test_pool().await;

        let id = create_user(&pool, "provider-1", "a@example.com").await.unwrap();
        let user = find_user_by_provider_id(&pool, "provider-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.email, "a@example.com");

        assert!(find_user_by_provider_id(&pool, "provider-2")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn duplicate_provider_id_violates_unique_constraint() {
        let (_dir, pool) = test_pool().await;

        create_user(&pool, "provider-1", "a@example.com").await.unwrap();
        let err = create_user(&pool, "provider-1", "b@example.com")
            .await
            .unwrap_err();
        match err {
            sqlx::Error::Database(e) => assert!(e.message().contains("UNIQUE")),
            other => panic!("expected database error, got {other:?}"),
        }

        // First registration is intact.
        let user = find_user_by_provider_id(&pool, "provider-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.email, "a@example.com");
    }

    #[tokio::test]
    async fn duplicate_form_id_violates_unique_constraint() {
        let (_dir, pool) = test_pool().await;

        create_form(&pool, "abcde12345", None, "Survey", "[]").await.unwrap();
        let err = create_form(&pool, "abcde12345", None, "Other", "[]")
            .await
            .unwrap_err();
        match err {
            sqlx::Error::Database(e) => {
                assert!(e.message().contains("UNIQUE constraint failed: forms.form_id"))
            }
            other => panic!("expected database error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn responses_require_an_existing_form() {
        let (_dir, pool) = test_pool().await;

        let err = create_response(&pool, 999, "{}").await.unwrap_err();
        assert!(matches!(err, sqlx::Error::RowNotFound));
        assert!(list_responses_by_form(&pool, 999).await.unwrap().is_empty());

        let form_id = create_form(&pool, "abcde12345", None, "Survey", "[]")
            .await
            .unwrap();
        create_response(&pool, form_id, r#"{"Name":"Ada"}"#).await.unwrap();
        create_response(&pool, form_id, r#"{"Name":"Grace"}"#).await.unwrap();

        let rows = list_responses_by_form(&pool, form_id).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].data, r#"{"Name":"Ada"}"#);
    }

    #[tokio::test]
    async fn forms_are_listed_per_owner() {
        let (_dir, pool) = test_pool().await;

        let owner = create_user(&pool, "provider-1", "a@example.com").await.unwrap();
        create_form(&pool, "aaaaaaaaaa", Some(owner), "First", "[]").await.unwrap();
        create_form(&pool, "bbbbbbbbbb", Some(owner), "Second", "[]").await.unwrap();
        create_form(&pool, "cccccccccc", None, "Unowned", "[]").await.unwrap();

        let forms = list_forms_by_owner(&pool, owner).await.unwrap();
        assert_eq!(forms.len(), 2);
        assert!(forms.iter().all(|f| f.user_id == Some(owner)));
    }
}
