use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{Board, BoardId, Comment, CommentId, CommentView, Post, PostId, PostTitle};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

/// Store operations the post page loader and action dispatcher depend on.
#[async_trait]
pub trait BoardStore: Send + Sync {
    async fn get_post(&self, post_id: PostId) -> Result<Option<Post>>;
    async fn delete_post(&self, post_id: PostId) -> Result<u64>;
    async fn list_comment_views_for_post(&self, post_id: PostId) -> Result<Vec<CommentView>>;
    async fn comment_password(&self, comment_id: CommentId) -> Result<Option<String>>;
    async fn create_comment(
        &self,
        post_id: PostId,
        writer: &str,
        content: &str,
        password: &str,
    ) -> Result<CommentId>;
    async fn update_comment(&self, comment_id: CommentId, content: &str) -> Result<u64>;
    async fn delete_comment(&self, comment_id: CommentId) -> Result<u64>;
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn create_board(&self, name: &str) -> Result<BoardId> {
        let rec = sqlx::query("INSERT INTO board (name) VALUES (?) RETURNING id")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .context("failed to insert board")?;
        Ok(BoardId(rec.get::<i64, _>(0)))
    }

    pub async fn list_boards(&self) -> Result<Vec<Board>> {
        let rows = sqlx::query("SELECT id, name FROM board ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| Board {
                id: BoardId(r.get::<i64, _>(0)),
                name: r.get::<String, _>(1),
            })
            .collect())
    }

    pub async fn board_exists(&self, board_id: BoardId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM board WHERE id = ?")
            .bind(board_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    pub async fn list_posts_for_board(&self, board_id: BoardId) -> Result<Vec<Post>> {
        let rows = sqlx::query(
            "SELECT id, title, content, board_id FROM post WHERE board_id = ? ORDER BY id ASC",
        )
        .bind(board_id.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(post_from_row).collect())
    }

    pub async fn list_post_titles_for_board(&self, board_id: BoardId) -> Result<Vec<PostTitle>> {
        let rows = sqlx::query("SELECT id, title FROM post WHERE board_id = ? ORDER BY id ASC")
            .bind(board_id.0)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| PostTitle {
                id: PostId(r.get::<i64, _>(0)),
                title: r.get::<Option<String>, _>(1),
            })
            .collect())
    }

    pub async fn get_post(&self, post_id: PostId) -> Result<Option<Post>> {
        let row = sqlx::query("SELECT id, title, content, board_id FROM post WHERE id = ? LIMIT 1")
            .bind(post_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(post_from_row))
    }

    pub async fn create_post(
        &self,
        title: Option<&str>,
        content: Option<&str>,
        board_id: BoardId,
    ) -> Result<PostId> {
        let rec = sqlx::query(
            "INSERT INTO post (title, content, board_id) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(title)
        .bind(content)
        .bind(board_id.0)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to insert post into board {board_id}"))?;
        Ok(PostId(rec.get::<i64, _>(0)))
    }

    pub async fn update_post(
        &self,
        post_id: PostId,
        title: Option<&str>,
        content: Option<&str>,
        board_id: BoardId,
    ) -> Result<u64> {
        let result =
            sqlx::query("UPDATE post SET title = ?, content = ?, board_id = ? WHERE id = ?")
                .bind(title)
                .bind(content)
                .bind(board_id.0)
                .bind(post_id.0)
                .execute(&self.pool)
                .await
                .with_context(|| format!("failed to update post {post_id}"))?;
        Ok(result.rows_affected())
    }

    pub async fn delete_post(&self, post_id: PostId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM post WHERE id = ?")
            .bind(post_id.0)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete post {post_id}"))?;
        Ok(result.rows_affected())
    }

    pub async fn list_comments_for_post(&self, post_id: PostId) -> Result<Vec<Comment>> {
        let rows = sqlx::query(
            "SELECT id, post_id, writer, content, password, created_at
             FROM comment
             WHERE post_id = ?
             ORDER BY id ASC",
        )
        .bind(post_id.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| Comment {
                id: CommentId(r.get::<i64, _>(0)),
                post_id: PostId(r.get::<i64, _>(1)),
                writer: r.get::<String, _>(2),
                content: r.get::<String, _>(3),
                password: r.get::<String, _>(4),
                created_at: r.get::<DateTime<Utc>, _>(5),
            })
            .collect())
    }

    pub async fn list_comment_views_for_post(&self, post_id: PostId) -> Result<Vec<CommentView>> {
        let rows = sqlx::query(
            "SELECT id, post_id, writer, content, created_at
             FROM comment
             WHERE post_id = ?
             ORDER BY id ASC",
        )
        .bind(post_id.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| CommentView {
                id: CommentId(r.get::<i64, _>(0)),
                post_id: PostId(r.get::<i64, _>(1)),
                writer: r.get::<String, _>(2),
                content: r.get::<String, _>(3),
                created_at: r.get::<DateTime<Utc>, _>(4),
            })
            .collect())
    }

    pub async fn get_comment(&self, comment_id: CommentId) -> Result<Option<Comment>> {
        let row = sqlx::query(
            "SELECT id, post_id, writer, content, password, created_at
             FROM comment
             WHERE id = ?
             LIMIT 1",
        )
        .bind(comment_id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| Comment {
            id: CommentId(r.get::<i64, _>(0)),
            post_id: PostId(r.get::<i64, _>(1)),
            writer: r.get::<String, _>(2),
            content: r.get::<String, _>(3),
            password: r.get::<String, _>(4),
            created_at: r.get::<DateTime<Utc>, _>(5),
        }))
    }

    pub async fn comment_password(&self, comment_id: CommentId) -> Result<Option<String>> {
        let row = sqlx::query("SELECT password FROM comment WHERE id = ? LIMIT 1")
            .bind(comment_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<String, _>(0)))
    }

    pub async fn create_comment(
        &self,
        post_id: PostId,
        writer: &str,
        content: &str,
        password: &str,
    ) -> Result<CommentId> {
        let rec = sqlx::query(
            "INSERT INTO comment (post_id, writer, content, password, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(post_id.0)
        .bind(writer)
        .bind(content)
        .bind(password)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to insert comment for post {post_id}"))?;
        Ok(CommentId(rec.get::<i64, _>(0)))
    }

    pub async fn update_comment(&self, comment_id: CommentId, content: &str) -> Result<u64> {
        let result = sqlx::query("UPDATE comment SET content = ? WHERE id = ?")
            .bind(content)
            .bind(comment_id.0)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to update comment {comment_id}"))?;
        Ok(result.rows_affected())
    }

    pub async fn delete_comment(&self, comment_id: CommentId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM comment WHERE id = ?")
            .bind(comment_id.0)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete comment {comment_id}"))?;
        Ok(result.rows_affected())
    }
}

fn post_from_row(r: &SqliteRow) -> Post {
    Post {
        id: PostId(r.get::<i64, _>(0)),
        title: r.get::<Option<String>, _>(1),
        content: r.get::<Option<String>, _>(2),
        board_id: BoardId(r.get::<i64, _>(3)),
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() || path == ":memory:" {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[async_trait]
impl BoardStore for Storage {
    async fn get_post(&self, post_id: PostId) -> Result<Option<Post>> {
        Storage::get_post(self, post_id).await
    }

    async fn delete_post(&self, post_id: PostId) -> Result<u64> {
        Storage::delete_post(self, post_id).await
    }

    async fn list_comment_views_for_post(&self, post_id: PostId) -> Result<Vec<CommentView>> {
        Storage::list_comment_views_for_post(self, post_id).await
    }

    async fn comment_password(&self, comment_id: CommentId) -> Result<Option<String>> {
        Storage::comment_password(self, comment_id).await
    }

    async fn create_comment(
        &self,
        post_id: PostId,
        writer: &str,
        content: &str,
        password: &str,
    ) -> Result<CommentId> {
        Storage::create_comment(self, post_id, writer, content, password).await
    }

    async fn update_comment(&self, comment_id: CommentId, content: &str) -> Result<u64> {
        Storage::update_comment(self, comment_id, content).await
    }

    async fn delete_comment(&self, comment_id: CommentId) -> Result<u64> {
        Storage::delete_comment(self, comment_id).await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
