//! End-to-end tests for the login/logout state machine, driven through
//! the in-memory collaborators.

use std::sync::Arc;

use chrono::{Duration, Utc};
use gatehouse_auth::{
    Auth, Identity, IdentityStore, MemorySession, MemoryStorage, MemoryTransport, PasswordHasher,
    RememberToken, SessionStore, Settings, TokenStore, TokenTransport,
};

const PASSWORD: &str = "correct horse battery staple";

const ROLE_LOGIN: u64 = 1 << 0;
const ROLE_ADMIN: u64 = 1 << 2;

/// Shared collaborators; each `auth()` call is a fresh request.
struct Harness {
    storage: MemoryStorage,
    session: MemorySession,
    transport: MemoryTransport,
    settings: Arc<Settings>,
}

impl Harness {
    async fn new() -> Self {
        let harness = Harness {
            storage: MemoryStorage::new(),
            session: MemorySession::new(),
            transport: MemoryTransport::new(),
            settings: Arc::new(Settings::default()),
        };

        let hash = PasswordHasher::default().hash(PASSWORD).unwrap();
        let mut alice = Identity::new(7, "alice", hash);
        alice.roles = ROLE_LOGIN;
        harness.storage.save(&alice).await.unwrap();

        harness
    }

    fn auth(&self) -> Auth {
        Auth::new(
            Arc::new(self.storage.clone()),
            Arc::new(self.storage.clone()),
            Arc::new(self.session.clone()),
            Arc::new(self.transport.clone()),
            self.settings.clone(),
        )
    }

    /// Simulate the browser session ending while the remember-me
    /// cookie survives.
    async fn end_browser_session(&self) {
        self.session.destroy().await.unwrap();
    }
}

#[tokio::test]
async fn login_failures_leave_no_trace() {
    let harness = Harness::new().await;
    let mut auth = harness.auth();

    assert!(!auth.login("alice", "", true).await.unwrap());
    assert!(!auth.login("alice", "wrong password", true).await.unwrap());
    assert!(!auth.login("nobody", PASSWORD, true).await.unwrap());

    // No session, no tokens, no client-side credential
    assert!(!harness.session.has_active_session().await);
    assert_eq!(harness.storage.token_count(), 0);
    assert!(harness.transport.remember_token().is_none());
    assert!(!auth.logged_in(None).await.unwrap());
}

#[tokio::test]
async fn login_normalizes_username_and_completes() {
    let harness = Harness::new().await;
    let mut auth = harness.auth();

    assert!(auth.login("ALICE", PASSWORD, false).await.unwrap());

    let user = auth.current_user(true).await.unwrap().unwrap();
    assert_eq!(user.id, 7);

    // Login completion stamped and persisted last_login
    let stored = harness.storage.find_by_id(7).await.unwrap().unwrap();
    assert!(stored.last_login.is_some());
}

#[tokio::test]
async fn remember_controls_token_issuance() {
    let harness = Harness::new().await;

    assert!(harness.auth().login("alice", PASSWORD, false).await.unwrap());
    assert_eq!(harness.storage.tokens_for(7).len(), 0);

    assert!(harness.auth().login("alice", PASSWORD, true).await.unwrap());
    let tokens = harness.storage.tokens_for(7);
    assert_eq!(tokens.len(), 1);

    // The minted token is what the client was handed
    assert_eq!(
        harness.transport.remember_token().as_deref(),
        Some(tokens[0].token.as_str())
    );
}

#[tokio::test]
async fn ineligible_identities_cannot_login() {
    let harness = Harness::new().await;

    let mut alice = harness.storage.find_by_id(7).await.unwrap().unwrap();
    alice.active = false;
    harness.storage.save(&alice).await.unwrap();

    assert!(!harness.auth().login("alice", PASSWORD, true).await.unwrap());
}

#[tokio::test]
async fn auto_login_rotates_the_token() {
    let harness = Harness::new().await;
    assert!(harness.auth().login("alice", PASSWORD, true).await.unwrap());
    let old_token = harness.transport.remember_token().unwrap();

    harness.end_browser_session().await;
    let session_id_before = harness.session.id().await;

    let mut auth = harness.auth();
    let user = auth.current_user(true).await.unwrap().unwrap();
    assert_eq!(user.id, 7);

    // Consumed token deleted, exactly one replacement issued
    let tokens = harness.storage.tokens_for(7);
    assert_eq!(tokens.len(), 1);
    assert_ne!(tokens[0].token, old_token);
    assert_eq!(
        harness.transport.remember_token().as_deref(),
        Some(tokens[0].token.as_str())
    );

    // Session id was regenerated on the privilege change
    assert_ne!(harness.session.id().await, session_id_before);
}

#[tokio::test]
async fn consumed_token_cannot_be_replayed() {
    let harness = Harness::new().await;
    assert!(harness.auth().login("alice", PASSWORD, true).await.unwrap());
    let old_token = harness.transport.remember_token().unwrap();

    // First use succeeds and rotates
    harness.end_browser_session().await;
    assert!(harness.auth().auto_login().await.unwrap().is_some());

    // Replaying the stale string fails and clears the credential
    harness.end_browser_session().await;
    harness.transport.present(&old_token);
    assert!(harness.auth().auto_login().await.unwrap().is_none());
    assert!(harness.transport.remember_token().is_none());
}

#[tokio::test]
async fn expired_or_orphaned_tokens_are_rejected() {
    let harness = Harness::new().await;

    harness
        .storage
        .insert(&RememberToken {
            user_id: 7,
            token: "stale".to_string(),
            expires: Utc::now() - Duration::hours(1),
        })
        .await
        .unwrap();
    harness.transport.present("stale");
    assert!(harness.auth().auto_login().await.unwrap().is_none());
    assert!(harness.transport.remember_token().is_none());

    // Token whose identity no longer exists
    harness
        .storage
        .insert(&RememberToken {
            user_id: 99,
            token: "orphan".to_string(),
            expires: Utc::now() + Duration::days(30),
        })
        .await
        .unwrap();
    harness.transport.present("orphan");
    assert!(harness.auth().auto_login().await.unwrap().is_none());
    assert!(harness.transport.remember_token().is_none());
}

#[tokio::test]
async fn auto_login_scenario() {
    // identity {id:7, username:"alice"}, token {"abc", user 7, now+30d}
    let harness = Harness::new().await;
    harness
        .storage
        .insert(&RememberToken {
            user_id: 7,
            token: "abc".to_string(),
            expires: Utc::now() + Duration::days(30),
        })
        .await
        .unwrap();
    harness.transport.present("abc");

    let user = harness.auth().auto_login().await.unwrap().unwrap();
    assert_eq!(user.id, 7);

    // "abc" is gone, replaced by exactly one fresh token for user 7
    assert!(harness.storage.find("abc").await.unwrap().is_none());
    let tokens = harness.storage.tokens_for(7);
    assert_eq!(tokens.len(), 1);
    assert_ne!(tokens[0].token, "abc");
}

#[tokio::test]
async fn logout_deletes_only_the_presented_token() {
    let harness = Harness::new().await;
    assert!(harness.auth().login("alice", PASSWORD, true).await.unwrap());

    // A second device holds its own token
    harness
        .storage
        .create(7, Duration::days(30))
        .await
        .unwrap();
    assert_eq!(harness.storage.tokens_for(7).len(), 2);

    let mut auth = harness.auth();
    assert!(auth.logout(false, false).await.unwrap());

    assert_eq!(harness.storage.tokens_for(7).len(), 1);
    assert!(harness.transport.remember_token().is_none());
    assert!(!auth.logged_in(None).await.unwrap());
}

#[tokio::test]
async fn logout_all_revokes_every_token() {
    let harness = Harness::new().await;
    assert!(harness.auth().login("alice", PASSWORD, true).await.unwrap());
    harness
        .storage
        .create(7, Duration::days(30))
        .await
        .unwrap();

    assert!(harness.auth().logout(false, true).await.unwrap());
    assert!(harness.storage.tokens_for(7).is_empty());
}

#[tokio::test]
async fn logout_regenerates_or_destroys_the_session() {
    let harness = Harness::new().await;

    assert!(harness.auth().login("alice", PASSWORD, true).await.unwrap());
    let id_before = harness.session.id().await;
    assert!(harness.auth().logout(false, false).await.unwrap());
    assert_ne!(harness.session.id().await, id_before);

    assert!(harness.auth().login("alice", PASSWORD, true).await.unwrap());
    assert!(harness.auth().logout(true, false).await.unwrap());
    assert!(!harness.session.has_active_session().await);
}

#[tokio::test]
async fn forced_login_bypasses_password_and_marks_session() {
    let harness = Harness::new().await;
    let alice = harness.storage.find_by_id(7).await.unwrap().unwrap();

    let mut auth = harness.auth();
    auth.force_login(alice, true).await.unwrap();

    assert!(auth.logged_in(None).await.unwrap());
    assert!(auth.is_forced().await.unwrap());
    // Forced logins also receive a persistent token
    assert_eq!(harness.storage.tokens_for(7).len(), 1);

    assert!(auth.logout(false, false).await.unwrap());
    assert!(!harness.auth().is_forced().await.unwrap());
}

#[tokio::test]
async fn check_password_reverifies_the_current_user() {
    let harness = Harness::new().await;
    let mut auth = harness.auth();

    // Nobody logged in yet
    assert!(!auth.check_password(PASSWORD).await.unwrap());

    assert!(auth.login("alice", PASSWORD, false).await.unwrap());
    assert!(auth.check_password(PASSWORD).await.unwrap());
    assert!(!auth.check_password("wrong password").await.unwrap());
}

#[tokio::test]
async fn logged_in_honors_role_filters() {
    let harness = Harness::new().await;
    let mut auth = harness.auth();
    assert!(auth.login("alice", PASSWORD, false).await.unwrap());

    assert!(auth.logged_in(None).await.unwrap());
    assert!(auth.logged_in(Some(ROLE_LOGIN)).await.unwrap());
    assert!(!auth.logged_in(Some(ROLE_ADMIN)).await.unwrap());
}

#[tokio::test]
async fn session_identity_without_an_id_is_discarded() {
    let harness = Harness::new().await;

    // A payload that deserializes but carries no usable id
    let ghost = Identity::new(0, "ghost", "");
    harness
        .session
        .set("auth_user", serde_json::to_value(&ghost).unwrap())
        .await
        .unwrap();

    let mut auth = harness.auth();
    assert!(auth.current_user(false).await.unwrap().is_none());
    assert!(harness.session.get("auth_user").await.unwrap().is_none());
}
