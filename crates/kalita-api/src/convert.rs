//! Row → API model conversion. Corrupt stored values are logged and replaced
//! with defaults rather than failing the whole response.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use kalita_db::models::{CategoryRow, CommentRow, NewsRow, ResidentRow, UserRow};
use kalita_types::models::{
    News, NewsCategory, NewsComment, ResidentInfo, UserProfile, UserSummary,
};

pub fn parse_timestamp(raw: &str, context: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by hand through the sqlite shell use datetime('now').
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on {}: {}", raw, context, e);
            DateTime::default()
        })
}

pub fn parse_id(raw: &str, context: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt id '{}' on {}: {}", raw, context, e);
        Uuid::default()
    })
}

fn parse_enum<T: FromStr + Default>(raw: &str, context: &str) -> T
where
    T::Err: std::fmt::Display,
{
    raw.parse().unwrap_or_else(|e| {
        warn!("{} on {}", e, context);
        T::default()
    })
}

pub fn user_profile(row: UserRow) -> UserProfile {
    UserProfile {
        id: parse_id(&row.id, "user"),
        role: parse_enum(&row.role, &row.id),
        created_at: parse_timestamp(&row.created_at, &row.id),
        email: row.email,
        full_name: row.full_name,
    }
}

fn user_summary(id: &str, email: Option<String>, full_name: Option<String>) -> Option<UserSummary> {
    // A missing email means the LEFT JOIN found no user.
    email.map(|email| UserSummary {
        id: parse_id(id, "user summary"),
        email,
        full_name: full_name.filter(|n| !n.is_empty()),
    })
}

pub fn category(row: CategoryRow) -> NewsCategory {
    NewsCategory {
        id: parse_id(&row.id, "category"),
        created_at: parse_timestamp(&row.created_at, &row.id),
        name: row.name,
        description: row.description,
        color: row.color,
    }
}

pub fn news(row: NewsRow) -> News {
    let ctx = row.id.clone();
    let author = row
        .author_id
        .as_deref()
        .and_then(|id| user_summary(id, row.author_email, row.author_name));

    News {
        id: parse_id(&row.id, "news"),
        title: row.title,
        content: row.content,
        excerpt: row.excerpt,
        image_url: row.image_url,
        category_id: row.category_id.as_deref().map(|id| parse_id(id, &ctx)),
        author_id: row.author_id.as_deref().map(|id| parse_id(id, &ctx)),
        status: parse_enum(&row.status, &ctx),
        priority: parse_enum(&row.priority, &ctx),
        published_at: row.published_at.as_deref().map(|ts| parse_timestamp(ts, &ctx)),
        created_at: parse_timestamp(&row.created_at, &ctx),
        updated_at: parse_timestamp(&row.updated_at, &ctx),
        category: row.category.map(category),
        author,
        comments_count: row.comments_count,
    }
}

pub fn comment(row: CommentRow) -> NewsComment {
    let user = user_summary(&row.user_id, row.user_email, row.user_name);
    NewsComment {
        id: parse_id(&row.id, "comment"),
        news_id: parse_id(&row.news_id, &row.id),
        user_id: parse_id(&row.user_id, &row.id),
        created_at: parse_timestamp(&row.created_at, &row.id),
        content: row.content,
        user,
    }
}

pub fn resident(row: ResidentRow) -> ResidentInfo {
    ResidentInfo {
        id: parse_id(&row.id, "resident"),
        user_id: parse_id(&row.user_id, &row.id),
        created_at: parse_timestamp(&row.created_at, &row.id),
        updated_at: parse_timestamp(&row.updated_at, &row.id),
        full_name: row.full_name,
        phone: row.phone,
        house_number: row.house_number,
        block: row.block,
        family_members: row.family_members,
        occupation: row.occupation,
        emergency_contact: row.emergency_contact,
        vehicle_info: row.vehicle_info,
        notes: row.notes,
        is_public: row.is_public,
    }
}
