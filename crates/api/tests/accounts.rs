//! Registration, login and session resolution.

#![allow(clippy::unwrap_used)]

mod common;

use laceup_api::models::Address;
use laceup_api::services::auth::{AuthError, AuthService, UpdateProfile};
use laceup_api::store::{MemoryStore, Store};

#[tokio::test]
async fn register_then_login() {
    let store = MemoryStore::new();
    let auth = AuthService::new(&store);

    let registered = auth
        .register("jane@example.com", "correct horse battery")
        .await
        .unwrap();
    assert!(!registered.user.is_admin);
    assert_eq!(registered.user.display_name, "jane");

    let logged_in = auth
        .login("jane@example.com", "correct horse battery")
        .await
        .unwrap();
    assert_eq!(logged_in.user.id, registered.user.id);
    assert_ne!(logged_in.token, registered.token);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_alike() {
    let store = MemoryStore::new();
    let auth = AuthService::new(&store);
    auth.register("jane@example.com", "correct horse battery")
        .await
        .unwrap();

    let err = auth
        .login("jane@example.com", "wrong password")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));

    let err = auth
        .login("nobody@example.com", "correct horse battery")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn duplicate_registration_is_a_conflict() {
    let store = MemoryStore::new();
    let auth = AuthService::new(&store);
    auth.register("jane@example.com", "correct horse battery")
        .await
        .unwrap();

    let err = auth
        .register("jane@example.com", "another password")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::UserAlreadyExists));
}

#[tokio::test]
async fn weak_passwords_and_bad_emails_are_rejected() {
    let store = MemoryStore::new();
    let auth = AuthService::new(&store);

    let err = auth.register("jane@example.com", "short").await.unwrap_err();
    assert!(matches!(err, AuthError::WeakPassword(_)));

    let err = auth
        .register("not-an-email", "correct horse battery")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidEmail(_)));
}

#[tokio::test]
async fn profile_updates_persist() {
    let store = MemoryStore::new();
    let auth = AuthService::new(&store);
    let outcome = auth
        .register("jane@example.com", "correct horse battery")
        .await
        .unwrap();

    let updated = auth
        .update_profile(
            outcome.user.id,
            &UpdateProfile {
                display_name: Some("Jane R".to_owned()),
                address: Some(Address {
                    line1: "1 Main St".to_owned(),
                    line2: None,
                    city: "Bangkok".to_owned(),
                    postal_code: "10110".to_owned(),
                    country: "TH".to_owned(),
                }),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.display_name, "Jane R");

    // The change is visible on the next token resolution.
    let resolved = auth.authenticate(&outcome.token).await.unwrap();
    assert_eq!(resolved.display_name, "Jane R");
    let saved = store.user(outcome.user.id).await.unwrap().unwrap();
    assert_eq!(saved.address.unwrap().city, "Bangkok");

    let err = auth
        .update_profile(
            outcome.user.id,
            &UpdateProfile {
                display_name: Some("   ".to_owned()),
                ..UpdateProfile::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidProfile(_)));
}

#[tokio::test]
async fn admins_manage_accounts() {
    let store = MemoryStore::new();
    let auth = AuthService::new(&store);
    let alice = auth
        .register("alice@example.com", "correct horse battery")
        .await
        .unwrap();
    let bob = auth
        .register("bob@example.com", "correct horse battery")
        .await
        .unwrap();

    let users = auth.list_users().await.unwrap();
    assert_eq!(users.len(), 2);
    // Ordered by email.
    assert_eq!(users[0].id, alice.user.id);
    assert_eq!(users[1].id, bob.user.id);

    let fetched = auth.get_user(bob.user.id).await.unwrap();
    assert_eq!(fetched.display_name, "bob");
    assert!(!fetched.is_admin);

    let promoted = auth.set_admin(bob.user.id, true).await.unwrap();
    assert!(promoted.is_admin);
    assert!(auth.authenticate(&bob.token).await.unwrap().is_admin);
    assert!(!auth.set_admin(bob.user.id, false).await.unwrap().is_admin);

    auth.delete_user(alice.user.id).await.unwrap();
    assert_eq!(auth.list_users().await.unwrap().len(), 1);
    // The deleted account's sessions stop resolving.
    let err = auth.authenticate(&alice.token).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken));

    let err = auth.get_user(alice.user.id).await.unwrap_err();
    assert!(matches!(err, AuthError::UserNotFound));
    let err = auth.delete_user(alice.user.id).await.unwrap_err();
    assert!(matches!(err, AuthError::UserNotFound));
    let err = auth.set_admin(alice.user.id, true).await.unwrap_err();
    assert!(matches!(err, AuthError::UserNotFound));
}

#[tokio::test]
async fn tokens_resolve_until_logout() {
    let store = MemoryStore::new();
    let auth = AuthService::new(&store);
    let outcome = auth
        .register("jane@example.com", "correct horse battery")
        .await
        .unwrap();

    let user = auth.authenticate(&outcome.token).await.unwrap();
    assert_eq!(user.id, outcome.user.id);

    auth.logout(&outcome.token).await.unwrap();
    let err = auth.authenticate(&outcome.token).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken));

    let err = auth.authenticate("no-such-token").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken));
}
