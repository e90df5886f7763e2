#![allow(dead_code)]

use std::sync::Arc;

use kalita_api::auth::AppStateInner;
use kalita_client::{ClientConfig, KalitaClient};
use kalita_db::Database;
use kalita_types::api::{CreateNewsRequest, UpsertResidentRequest};
use kalita_types::models::{NewsPriority, NewsStatus};

pub const API_KEY: &str = "test-public-key";
pub const ADMIN_EMAIL: &str = "pengurus@kalita.id";
pub const PASSWORD: &str = "rahasia-123";

/// Serve the real router on an ephemeral port and return its base URL.
pub async fn spawn_server() -> String {
    let state = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        jwt_secret: "client-test-jwt-secret".into(),
        api_key: API_KEY.into(),
        session_ttl: chrono::Duration::days(30),
        admin_emails: vec![ADMIN_EMAIL.into()],
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, kalita_api::router(state)).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn client(base_url: &str) -> KalitaClient {
    KalitaClient::new(ClientConfig {
        api_url: base_url.to_string(),
        api_key: API_KEY.to_string(),
    })
    .unwrap()
}

/// A client already signed in as a fresh member.
pub async fn member(base_url: &str, email: &str) -> KalitaClient {
    let client = client(base_url);
    let auth = client.sign_up(email, PASSWORD, "Warga Baru").await.unwrap();
    client.set_token(Some(auth.token));
    client
}

pub async fn admin(base_url: &str) -> KalitaClient {
    member(base_url, ADMIN_EMAIL).await
}

pub fn published(title: &str, priority: NewsPriority) -> CreateNewsRequest {
    CreateNewsRequest {
        title: title.to_string(),
        content: format!("Isi berita {}", title),
        status: NewsStatus::Published,
        priority,
        ..Default::default()
    }
}

pub fn resident(full_name: &str, block: &str, house_number: &str) -> UpsertResidentRequest {
    UpsertResidentRequest {
        full_name: full_name.to_string(),
        phone: String::new(),
        house_number: house_number.to_string(),
        block: block.to_string(),
        family_members: 3,
        occupation: "Guru".to_string(),
        emergency_contact: String::new(),
        vehicle_info: String::new(),
        notes: String::new(),
        is_public: true,
    }
}
