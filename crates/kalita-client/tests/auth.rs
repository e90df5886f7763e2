mod common;

use kalita_client::AuthSession;
use kalita_types::events::AuthEvent;
use kalita_types::models::{NewsPriority, Role};

use common::{ADMIN_EMAIL, PASSWORD};

#[tokio::test]
async fn sign_up_emits_signed_in_and_sets_token() {
    let base = common::spawn_server().await;
    let mut session = AuthSession::new(common::client(&base));
    let mut events = session.subscribe();

    let auth = session.sign_up("sari@warga.id", PASSWORD, "Sari").await.unwrap();
    assert!(!session.loading);
    assert_eq!(session.token(), Some(auth.token));
    assert_eq!(session.user.as_ref().map(|u| u.email.as_str()), Some("sari@warga.id"));
    assert!(!session.is_admin());

    let event = events.recv().await.unwrap();
    assert!(matches!(event, AuthEvent::SignedIn { .. }));
    assert_eq!(event.user().map(|u| u.email.as_str()), Some("sari@warga.id"));
}

#[tokio::test]
async fn wrong_password_leaves_session_empty() {
    let base = common::spawn_server().await;
    let mut session = AuthSession::new(common::client(&base));
    session.sign_up("budi@warga.id", PASSWORD, "Budi").await.unwrap();
    session.sign_out().await.unwrap();

    let err = session.sign_in("budi@warga.id", "salah-sandi").await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(session.user.is_none());
    assert!(session.token().is_none());
}

#[tokio::test]
async fn sign_out_revokes_token_and_notifies() {
    let base = common::spawn_server().await;
    let client = common::client(&base);
    let mut session = AuthSession::new(client.clone());
    session.sign_up("dewi@warga.id", PASSWORD, "Dewi").await.unwrap();
    let token = session.token().unwrap();
    let mut events = session.subscribe();

    session.sign_out().await.unwrap();
    let event = events.recv().await.unwrap();
    assert_eq!(event, AuthEvent::SignedOut);
    assert!(event.user().is_none());
    assert!(session.user.is_none());

    // The old token is dead on the server too.
    client.set_token(Some(token));
    let err = client.current_user().await.unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn mount_restores_user_from_stored_token() {
    let base = common::spawn_server().await;
    let client = common::member(&base, "rina@warga.id").await;

    let mut session = AuthSession::new(client);
    assert!(session.loading);
    session.mount().await;
    assert!(!session.loading);
    assert_eq!(session.user.as_ref().map(|u| u.full_name.as_str()), Some("Warga Baru"));
}

#[tokio::test]
async fn mount_drops_revoked_token() {
    let base = common::spawn_server().await;
    let client = common::member(&base, "tono@warga.id").await;
    let token = client.token();
    client.sign_out().await.unwrap();
    client.set_token(token);

    let mut session = AuthSession::new(client);
    session.mount().await;
    assert!(session.user.is_none());
    assert!(session.token().is_none());
}

#[tokio::test]
async fn refresh_picks_up_promotion() {
    let base = common::spawn_server().await;
    let admin = common::admin(&base).await;
    let mut session = AuthSession::new(common::client(&base));
    let auth = session.sign_up("ketua@warga.id", PASSWORD, "Ketua").await.unwrap();
    assert!(!session.is_admin());

    let mut events = session.subscribe();
    admin.set_role(auth.user.id, Role::Admin).await.unwrap();
    let user = session.refresh_user().await.unwrap();

    assert_eq!(user.role, Role::Admin);
    assert!(session.is_admin());
    match events.recv().await.unwrap() {
        AuthEvent::UserUpdated { user } => assert!(user.is_admin()),
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn admin_flag_on_client_cannot_bypass_server() {
    let base = common::spawn_server().await;
    let mut session = AuthSession::new(common::client(&base));
    session.sign_up("iseng@warga.id", PASSWORD, "Iseng").await.unwrap();

    // Forge the display flag locally.
    if let Some(user) = session.user.as_mut() {
        user.role = Role::Admin;
    }
    assert!(session.is_admin());

    let client = common::client(&base);
    client.set_token(session.token());
    let err = client
        .create_news(&common::published("Palsu", NewsPriority::Normal))
        .await
        .unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(403));
}

#[tokio::test]
async fn configured_email_becomes_admin() {
    let base = common::spawn_server().await;
    let mut session = AuthSession::new(common::client(&base));
    session.sign_up(ADMIN_EMAIL, PASSWORD, "Pengurus").await.unwrap();
    assert!(session.is_admin());
}

#[tokio::test]
async fn wrong_api_key_is_rejected() {
    let base = common::spawn_server().await;
    let client = kalita_client::KalitaClient::new(kalita_client::ClientConfig {
        api_url: base,
        api_key: "wrong-key".into(),
    })
    .unwrap();
    let err = client.categories().await.unwrap_err();
    assert!(err.is_unauthorized());
}

#[test]
fn config_requires_both_values() {
    let err = kalita_client::KalitaClient::new(kalita_client::ClientConfig {
        api_url: "http://localhost:8080".into(),
        api_key: "  ".into(),
    });
    assert!(matches!(err, Err(kalita_client::ClientError::Config(_))));
}
