use crate::models::{CategoryRow, CommentRow, NewsFields, NewsRow};
use crate::{Database, inserted};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

/// News joined with its category, author and comment count. Column order is
/// what `map_news` expects.
const NEWS_SELECT: &str = "
    SELECT n.id, n.title, n.content, n.excerpt, n.image_url, n.category_id, n.author_id,
           n.status, n.priority, n.published_at, n.created_at, n.updated_at,
           c.name, c.description, c.color, c.created_at,
           u.email, u.full_name,
           (SELECT COUNT(*) FROM news_comments nc WHERE nc.news_id = n.id)
    FROM news n
    LEFT JOIN news_categories c ON c.id = n.category_id
    LEFT JOIN users u ON u.id = n.author_id";

const COMMENT_SELECT: &str = "
    SELECT nc.id, nc.news_id, nc.user_id, nc.content, nc.created_at, u.email, u.full_name
    FROM news_comments nc
    LEFT JOIN users u ON u.id = nc.user_id";

impl Database {
    // -- News --

    pub fn list_published_news(&self, limit: u32, offset: u32) -> Result<Vec<NewsRow>> {
        self.with_conn(|conn| {
            query_news(
                conn,
                &format!(
                    "{NEWS_SELECT}
                     WHERE n.status = 'published'
                     ORDER BY n.published_at DESC, n.created_at DESC
                     LIMIT ?1 OFFSET ?2"
                ),
                params![limit, offset],
            )
        })
    }

    pub fn list_news_by_category(&self, category_id: &str, limit: u32) -> Result<Vec<NewsRow>> {
        self.with_conn(|conn| {
            query_news(
                conn,
                &format!(
                    "{NEWS_SELECT}
                     WHERE n.status = 'published' AND n.category_id = ?1
                     ORDER BY n.published_at DESC, n.created_at DESC
                     LIMIT ?2"
                ),
                params![category_id, limit],
            )
        })
    }

    /// Published important/urgent items, urgent first, then newest first.
    pub fn list_important_news(&self, limit: u32) -> Result<Vec<NewsRow>> {
        self.with_conn(|conn| {
            query_news(
                conn,
                &format!(
                    "{NEWS_SELECT}
                     WHERE n.status = 'published' AND n.priority IN ('important', 'urgent')
                     ORDER BY CASE n.priority WHEN 'urgent' THEN 2 WHEN 'important' THEN 1 ELSE 0 END DESC,
                              n.published_at DESC, n.created_at DESC
                     LIMIT ?1"
                ),
                params![limit],
            )
        })
    }

    pub fn get_news(&self, id: &str) -> Result<Option<NewsRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{NEWS_SELECT} WHERE n.id = ?1"))?;
            let row = stmt.query_row([id], map_news).optional()?;
            Ok(row)
        })
    }

    pub fn insert_news(
        &self,
        id: &str,
        author_id: &str,
        fields: &NewsFields,
        now: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO news (id, title, content, excerpt, image_url, category_id, author_id,
                                   status, priority, published_at, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
                params![
                    id,
                    fields.title,
                    fields.content,
                    fields.excerpt,
                    fields.image_url,
                    fields.category_id,
                    author_id,
                    fields.status,
                    fields.priority,
                    fields.published_at,
                    now,
                ],
            )?;
            Ok(())
        })
    }

    /// Overwrite every editable column. Returns false when the item is gone.
    pub fn update_news(&self, id: &str, fields: &NewsFields, now: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE news
                 SET title = ?2, content = ?3, excerpt = ?4, image_url = ?5, category_id = ?6,
                     status = ?7, priority = ?8, published_at = ?9, updated_at = ?10
                 WHERE id = ?1",
                params![
                    id,
                    fields.title,
                    fields.content,
                    fields.excerpt,
                    fields.image_url,
                    fields.category_id,
                    fields.status,
                    fields.priority,
                    fields.published_at,
                    now,
                ],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_news(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM news WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    // -- Categories --

    pub fn list_categories(&self) -> Result<Vec<CategoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, description, color, created_at FROM news_categories ORDER BY name",
            )?;
            let rows = stmt
                .query_map([], map_category)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_category(&self, id: &str) -> Result<Option<CategoryRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, name, description, color, created_at FROM news_categories WHERE id = ?1",
                    [id],
                    map_category,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Returns false when the name is taken, ignoring case.
    pub fn insert_category(
        &self,
        id: &str,
        name: &str,
        description: &str,
        color: &str,
        created_at: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            inserted(conn.execute(
                "INSERT INTO news_categories (id, name, description, color, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, name, description, color, created_at),
            ))
        })
    }

    // -- Comments --

    /// Comments on one item, oldest first.
    pub fn list_comments(&self, news_id: &str) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{COMMENT_SELECT} WHERE nc.news_id = ?1 ORDER BY nc.created_at ASC"
            ))?;
            let rows = stmt
                .query_map([news_id], map_comment)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_comment(&self, id: &str) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{COMMENT_SELECT} WHERE nc.id = ?1"))?;
            let row = stmt.query_row([id], map_comment).optional()?;
            Ok(row)
        })
    }

    pub fn insert_comment(
        &self,
        id: &str,
        news_id: &str,
        user_id: &str,
        content: &str,
        created_at: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO news_comments (id, news_id, user_id, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, news_id, user_id, content, created_at),
            )?;
            Ok(())
        })
    }

    pub fn delete_comment(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM news_comments WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }
}

fn query_news(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<Vec<NewsRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, map_news)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn map_news(row: &Row<'_>) -> rusqlite::Result<NewsRow> {
    let category_id: Option<String> = row.get(5)?;
    let category_name: Option<String> = row.get(12)?;
    let category = match (category_id.clone(), category_name) {
        (Some(id), Some(name)) => Some(CategoryRow {
            id,
            name,
            description: row.get(13)?,
            color: row.get(14)?,
            created_at: row.get(15)?,
        }),
        _ => None,
    };

    Ok(NewsRow {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        excerpt: row.get(3)?,
        image_url: row.get(4)?,
        category_id,
        author_id: row.get(6)?,
        status: row.get(7)?,
        priority: row.get(8)?,
        published_at: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
        category,
        author_email: row.get(16)?,
        author_name: row.get(17)?,
        comments_count: row.get(18)?,
    })
}

fn map_category(row: &Row<'_>) -> rusqlite::Result<CategoryRow> {
    Ok(CategoryRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        color: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_comment(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        news_id: row.get(1)?,
        user_id: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
        user_email: row.get(5)?,
        user_name: row.get(6)?,
    })
}
