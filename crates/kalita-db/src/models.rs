/// Database row types: these map directly to SQLite rows.
/// Distinct from kalita-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: String,
    pub created_at: String,
}

/// A live session joined with the user that owns it.
pub struct SessionUserRow {
    pub session_id: String,
    pub expires_at: String,
    pub user: UserRow,
}

pub struct CategoryRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub color: String,
    pub created_at: String,
}

pub struct NewsRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub image_url: String,
    pub category_id: Option<String>,
    pub author_id: Option<String>,
    pub status: String,
    pub priority: String,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub category: Option<CategoryRow>,
    pub author_email: Option<String>,
    pub author_name: Option<String>,
    pub comments_count: u32,
}

/// Column values written by both insert and update of a news item.
#[derive(Debug, Clone)]
pub struct NewsFields {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub image_url: String,
    pub category_id: Option<String>,
    pub status: String,
    pub priority: String,
    pub published_at: Option<String>,
}

impl NewsFields {
    pub fn from_row(row: &NewsRow) -> Self {
        Self {
            title: row.title.clone(),
            content: row.content.clone(),
            excerpt: row.excerpt.clone(),
            image_url: row.image_url.clone(),
            category_id: row.category_id.clone(),
            status: row.status.clone(),
            priority: row.priority.clone(),
            published_at: row.published_at.clone(),
        }
    }
}

pub struct CommentRow {
    pub id: String,
    pub news_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: String,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
}

pub struct ResidentRow {
    pub id: String,
    pub user_id: String,
    pub full_name: String,
    pub phone: String,
    pub house_number: String,
    pub block: String,
    pub family_members: u32,
    pub occupation: String,
    pub emergency_contact: String,
    pub vehicle_info: String,
    pub notes: String,
    pub is_public: bool,
    pub created_at: String,
    pub updated_at: String,
}
