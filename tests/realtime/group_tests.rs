//! Group Overlay Tests

use pretty_assertions::assert_eq;

use social_server::application::realtime::ServerEvent;
use social_server::application::services::GroupError;

use crate::common::{Realtime, TestConnection};

const GROUP: i64 = 10;

fn group_messages(conn: &mut TestConnection) -> Vec<String> {
    conn.drain()
        .into_iter()
        .filter_map(|event| match event {
            ServerEvent::MessageReceived(msg) => Some(msg.content),
            _ => None,
        })
        .collect()
}

fn notices(conn: &mut TestConnection) -> Vec<String> {
    conn.drain()
        .into_iter()
        .filter_map(|event| match event {
            ServerEvent::UserJoined(n) | ServerEvent::UserLeft(n) => Some(n.message),
            _ => None,
        })
        .collect()
}

async fn setup() -> (Realtime, TestConnection, TestConnection, TestConnection) {
    let rt = Realtime::single_slot();
    rt.group_members.add_member(GROUP, 1);
    rt.group_members.add_member(GROUP, 2);
    rt.group_members.add_member(GROUP, 3);
    let alice = rt.connect_registered(1, "alice").await;
    let bob = rt.connect_registered(2, "bob").await;
    let carol = rt.connect_registered(3, "carol").await;
    (rt, alice, bob, carol)
}

#[tokio::test]
async fn test_non_member_cannot_join() {
    let rt = Realtime::single_slot();
    let mallory = rt.connect_registered(66, "mallory").await;

    let result = rt
        .groups
        .join(&mallory.identity, GROUP, mallory.handle.clone())
        .await;

    assert!(matches!(result, Err(GroupError::NotMember(GROUP))));
    assert!(!rt.overlay.is_subscribed(GROUP, mallory.handle.id()));
}

#[tokio::test]
async fn test_join_is_announced_and_idempotent() {
    let (rt, mut alice, bob, _carol) = setup().await;
    rt.groups
        .join(&alice.identity, GROUP, alice.handle.clone())
        .await
        .expect("join");
    alice.drain();

    assert!(rt
        .groups
        .join(&bob.identity, GROUP, bob.handle.clone())
        .await
        .expect("join"));
    assert!(!rt
        .groups
        .join(&bob.identity, GROUP, bob.handle.clone())
        .await
        .expect("rejoin"));

    assert_eq!(notices(&mut alice), vec!["bob joined the group".to_string()]);
}

#[tokio::test]
async fn test_group_message_reaches_only_watching_connections() {
    let (rt, mut alice, mut bob, mut carol) = setup().await;
    for conn in [&alice, &bob] {
        rt.groups
            .join(&conn.identity, GROUP, conn.handle.clone())
            .await
            .expect("join");
    }

    rt.groups
        .ensure_member(&alice.identity, GROUP)
        .await
        .expect("member");
    let delivery = rt
        .router
        .route_group(&alice.identity, GROUP, "hello group".into(), vec![])
        .await
        .expect("route");

    assert_eq!(delivery.connections, 2);
    assert!(rt.messages.contains(delivery.message.id));
    assert_eq!(group_messages(&mut alice), vec!["hello group".to_string()]);
    assert_eq!(group_messages(&mut bob), vec!["hello group".to_string()]);
    // Carol is a member but never joined on this connection
    assert!(group_messages(&mut carol).is_empty());
}

#[tokio::test]
async fn test_leave_stops_delivery() {
    let (rt, mut alice, bob, _carol) = setup().await;
    for conn in [&alice, &bob] {
        rt.groups
            .join(&conn.identity, GROUP, conn.handle.clone())
            .await
            .expect("join");
    }

    assert!(rt.groups.leave(&alice.identity, GROUP, alice.handle.id()));
    assert!(!rt.groups.leave(&alice.identity, GROUP, alice.handle.id()));
    alice.drain();

    rt.router
        .route_group(&bob.identity, GROUP, "still here?".into(), vec![])
        .await
        .expect("route");

    assert!(group_messages(&mut alice).is_empty());
}

#[tokio::test]
async fn test_disconnect_leaves_watched_groups() {
    let (rt, alice, mut bob, _carol) = setup().await;
    for conn in [&alice, &bob] {
        rt.groups
            .join(&conn.identity, GROUP, conn.handle.clone())
            .await
            .expect("join");
    }
    bob.drain();

    let outcome = rt
        .presence
        .disconnect(&alice.identity, alice.handle.id())
        .await;

    assert_eq!(outcome.left_groups, vec![GROUP]);
    assert_eq!(rt.overlay.subscribers(GROUP), vec![bob.handle.id()]);
    assert_eq!(notices(&mut bob), vec!["alice left the group".to_string()]);
}
