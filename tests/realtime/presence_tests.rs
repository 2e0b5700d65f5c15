//! Presence Tests
//!
//! Registry, broadcast snapshot and durable `is_active` must agree once the
//! dust settles.

use pretty_assertions::assert_eq;

use social_server::application::realtime::{ConnectionHandle, RegistrationPolicy};
use social_server::application::services::PresenceError;
use social_server::domain::Identity;

use crate::common::{Realtime, TestConnection};

fn names(list: &[&str]) -> Option<Vec<String>> {
    Some(list.iter().map(|s| s.to_string()).collect())
}

#[tokio::test]
async fn test_registration_reaches_every_attached_connection() {
    let rt = Realtime::single_slot();
    let mut watcher = rt.connect(9, "zed");

    let mut alice = rt.connect_registered(1, "alice").await;

    assert_eq!(watcher.last_snapshot(), names(&["alice"]));
    assert_eq!(alice.last_snapshot(), names(&["alice"]));
    assert_eq!(rt.users.is_active(1), Some(true));
}

#[tokio::test]
async fn test_snapshot_after_disconnect_excludes_departed_user() {
    let rt = Realtime::single_slot();
    let alice = rt.connect_registered(1, "alice").await;
    let mut bob = rt.connect_registered(2, "bob").await;
    assert_eq!(bob.last_snapshot(), names(&["alice", "bob"]));

    rt.close(&alice).await;

    assert_eq!(bob.last_snapshot(), names(&["bob"]));
    assert_eq!(rt.users.is_active(1), Some(false));
    assert_eq!(rt.users.is_active(2), Some(true));
}

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let rt = Realtime::single_slot();
    let alice = rt.connect_registered(1, "alice").await;

    let first = rt.presence.disconnect(&alice.identity, alice.handle.id()).await;
    let writes = rt.users.write_count(1);
    let second = rt.presence.disconnect(&alice.identity, alice.handle.id()).await;

    assert_eq!(first.user_id, Some(1));
    assert_eq!(second.user_id, None);
    assert_eq!(rt.users.write_count(1), writes);
    assert_eq!(rt.users.is_active(1), Some(false));
    assert_eq!(rt.registry.connection_count(), 0);
}

#[tokio::test]
async fn test_superseded_connection_closing_keeps_user_online() {
    let rt = Realtime::single_slot();
    let first = rt.connect_registered(1, "alice").await;
    let second = rt.connect_registered(1, "alice").await;

    let outcome = rt.presence.disconnect(&first.identity, first.handle.id()).await;

    assert_eq!(outcome.user_id, None);
    assert!(rt.registry.is_online(1));
    assert_eq!(
        rt.registry.lookup(1).map(|c| c.id()),
        Some(second.handle.id())
    );
    assert_eq!(rt.users.is_active(1), Some(true));
}

#[tokio::test]
async fn test_multi_device_user_stays_online_until_last_connection() {
    let rt = Realtime::new(RegistrationPolicy::MultiDevice);
    let phone = rt.connect_registered(1, "alice").await;
    let laptop = rt.connect_registered(1, "alice").await;
    assert_eq!(rt.registry.connections_for(1).len(), 2);

    rt.close(&phone).await;
    assert!(rt.registry.is_online(1));
    assert_eq!(rt.users.is_active(1), Some(true));

    rt.close(&laptop).await;
    assert!(!rt.registry.is_online(1));
    assert_eq!(rt.users.is_active(1), Some(false));
}

#[tokio::test]
async fn test_foreign_handle_is_not_registered() {
    let rt = Realtime::single_slot();
    let conn = rt.connect(1, "alice");

    let result = rt
        .presence
        .register_handle(&conn.identity, "mallory", conn.handle.clone())
        .await;

    assert!(matches!(result, Err(PresenceError::HandleMismatch { .. })));
    assert!(!rt.registry.is_online(1));
    assert_eq!(rt.users.write_count(1), 0);
}

#[tokio::test]
async fn test_failed_presence_write_keeps_live_registration() {
    let rt = Realtime::single_slot();
    let mut watcher = rt.connect(9, "zed");
    rt.users.fail_writes(true);
    let conn = rt.connect(1, "alice");

    let result = rt.presence.register(&conn.identity, conn.handle.clone()).await;

    assert!(matches!(result, Err(PresenceError::Persistence(_))));
    assert!(rt.registry.is_online(1));
    assert_eq!(watcher.last_snapshot(), names(&["alice"]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_churn_leaves_durable_state_matching_registry() {
    let rt = Realtime::single_slot();
    let identity = Identity::new(1, "alice");

    let mut tasks = Vec::new();
    for i in 0..32 {
        let presence = rt.presence.clone();
        let identity = identity.clone();
        tasks.push(tokio::spawn(async move {
            let (handle, _outbound) = ConnectionHandle::channel();
            presence.attach(handle.clone());
            presence
                .register(&identity, handle.clone())
                .await
                .expect("register");
            if i % 3 != 0 {
                presence.disconnect(&identity, handle.id()).await;
            }
        }));
    }
    for task in tasks {
        task.await.expect("task panicked");
    }

    assert_eq!(rt.users.is_active(1), Some(rt.registry.is_online(1)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_watchers_attached_during_registrations_end_on_current_snapshot() {
    for _ in 0..50 {
        let rt = Realtime::single_slot();
        let mut watchers = Vec::new();
        let mut tasks = Vec::new();

        for i in 0..8_i64 {
            let (handle, outbound) = ConnectionHandle::channel();
            watchers.push(TestConnection {
                identity: Identity::new(100 + i, format!("w{i}")),
                handle: handle.clone(),
                outbound,
            });
            let presence = rt.presence.clone();
            tasks.push(tokio::spawn(async move {
                presence.attach(handle);
            }));

            let presence = rt.presence.clone();
            tasks.push(tokio::spawn(async move {
                let (handle, _outbound) = ConnectionHandle::channel();
                presence.attach(handle.clone());
                presence
                    .register(&Identity::new(i, format!("u{i}")), handle)
                    .await
                    .expect("register");
            }));
        }
        for task in tasks {
            task.await.expect("task panicked");
        }

        let expected: Vec<String> = rt
            .registry
            .snapshot()
            .users
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(expected.len(), 8);
        for watcher in &mut watchers {
            assert_eq!(watcher.last_snapshot(), Some(expected.clone()));
        }
    }
}
