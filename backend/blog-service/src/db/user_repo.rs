use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::{constraint_error, PgStore, UserRepository};
use crate::error::Result;
use crate::models::{CommentCount, NewUser, ProfilePost, PublicUser, Role, User, UserChanges, UserProfile};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

/// Insert a new account with the default role
pub async fn create_user(pool: &PgPool, new_user: &NewUser) -> Result<User> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (name, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&new_user.name)
    .bind(&new_user.email)
    .bind(&new_user.password_hash)
    .fetch_one(pool)
    .await
    .map_err(|e| constraint_error(e, "User already exists", "User not found"))?;

    Ok(user)
}

/// Find an account by id
pub async fn find_user_by_id(pool: &PgPool, id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Find an account by (normalized) email
pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn email_taken_by_other(pool: &PgPool, email: &str, user_id: i64) -> Result<bool> {
    let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND id <> $2) AS taken")
        .bind(email)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(row.get::<bool, _>("taken"))
}

/// Apply a partial update; absent fields keep their stored value
pub async fn update_user(pool: &PgPool, id: i64, changes: &UserChanges) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET name = COALESCE($2, name),
            email = COALESCE($3, email),
            password_hash = COALESCE($4, password_hash),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(changes.name.as_deref())
    .bind(changes.email.as_deref())
    .bind(changes.password_hash.as_deref())
    .fetch_optional(pool)
    .await
    .map_err(|e| constraint_error(e, "Email is already in use", "User not found"))?;

    Ok(user)
}

pub async fn set_user_role(pool: &PgPool, id: i64, role: Role) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET role = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(role.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Account plus its posts (newest first) and authored comment count
pub async fn user_profile(pool: &PgPool, id: i64) -> Result<Option<UserProfile>> {
    let Some(user) = find_user_by_id(pool, id).await? else {
        return Ok(None);
    };

    let posts = sqlx::query_as::<_, ProfilePost>(
        r#"
        SELECT id, title, published, created_at
        FROM posts
        WHERE author_id = $1
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let row = sqlx::query("SELECT COUNT(*) AS count FROM comments WHERE author_id = $1")
        .bind(id)
        .fetch_one(pool)
        .await?;

    Ok(Some(UserProfile {
        user: PublicUser::from(&user),
        posts,
        count: CommentCount {
            comments: row.get::<i64, _>("count"),
        },
    }))
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        create_user(self.pool(), &new_user).await
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        find_user_by_id(self.pool(), id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        find_user_by_email(self.pool(), email).await
    }

    async fn email_taken_by_other(&self, email: &str, user_id: i64) -> Result<bool> {
        email_taken_by_other(self.pool(), email, user_id).await
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<Option<User>> {
        update_user(self.pool(), id, &changes).await
    }

    async fn set_user_role(&self, id: i64, role: Role) -> Result<Option<User>> {
        set_user_role(self.pool(), id, role).await
    }

    async fn user_profile(&self, id: i64) -> Result<Option<UserProfile>> {
        user_profile(self.pool(), id).await
    }
}
