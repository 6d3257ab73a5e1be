//! Token 数据访问层（DAO）
//!
//! Bearer token 持久化在本地 SQLite 的 `local_kv` 表中（表结构由 sqlx migration 管理）。

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite};
use tracing::debug;

/// token 在 `local_kv` 中的键
pub const TOKEN_KEY: &str = "twitter-api-token";

/// Token DAO（基于 sqlx）
#[derive(Clone)]
pub struct TokenDao {
    db: Pool<Sqlite>,
}

impl TokenDao {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// 读取已保存的 token
    pub async fn get_token(&self) -> Result<Option<String>> {
        let row = sqlx::query(
            r#"
            SELECT value FROM local_kv WHERE key = ?
            "#,
        )
        .bind(TOKEN_KEY)
        .fetch_optional(&self.db)
        .await
        .context("查询 token 失败")?;

        let token = row.map(|m| m.get::<String, _>("value"));
        debug!("[TokenDAO] 读取本地 token，存在: {}", token.is_some());
        Ok(token)
    }

    /// 保存 token（覆盖旧值）
    pub async fn save_token(&self, token: &str) -> Result<()> {
        let sql = r#"
            INSERT INTO local_kv (key, value, update_time) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                update_time = excluded.update_time
        "#;

        sqlx::query(sql)
            .bind(TOKEN_KEY)
            .bind(token)
            .bind(Utc::now().timestamp_millis())
            .execute(&self.db)
            .await
            .context("保存 token 失败")?;
        debug!("[TokenDAO] 已保存 token");
        Ok(())
    }

    /// 删除 token
    pub async fn remove_token(&self) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM local_kv WHERE key = ?
            "#,
        )
        .bind(TOKEN_KEY)
        .execute(&self.db)
        .await
        .context("删除 token 失败")?;
        debug!("[TokenDAO] 已删除 token");
        Ok(())
    }
}
