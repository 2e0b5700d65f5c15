//! Message Routing Tests

use pretty_assertions::assert_eq;

use social_server::application::realtime::ServerEvent;
use social_server::application::services::{DeliveryOutcome, RouterError};

use crate::common::{Realtime, TestConnection};

fn direct_messages(conn: &mut TestConnection) -> Vec<(String, String)> {
    conn.drain()
        .into_iter()
        .filter_map(|event| match event {
            ServerEvent::DirectMessage(dm) => Some((dm.message_id, dm.content)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_direct_message_reaches_only_the_recipient() {
    let rt = Realtime::single_slot();
    let mut alice = rt.connect_registered(1, "alice").await;
    let mut bob = rt.connect_registered(2, "bob").await;
    let mut carol = rt.connect_registered(3, "carol").await;
    let mut lurker = rt.connect(4, "dave");

    let delivery = rt
        .router
        .route_direct(&alice.identity, 2, "hi bob".into(), vec![])
        .await
        .expect("route");

    assert_eq!(delivery.outcome, DeliveryOutcome::Delivered { connections: 1 });
    assert_eq!(
        direct_messages(&mut bob),
        vec![(delivery.message.id.to_string(), "hi bob".to_string())]
    );
    assert!(direct_messages(&mut alice).is_empty());
    assert!(direct_messages(&mut carol).is_empty());
    assert!(direct_messages(&mut lurker).is_empty());
}

#[tokio::test]
async fn test_delivered_message_is_already_stored() {
    let rt = Realtime::single_slot();
    let alice = rt.connect_registered(1, "alice").await;
    let mut bob = rt.connect_registered(2, "bob").await;

    rt.router
        .route_direct(&alice.identity, 2, "persist me".into(), vec![])
        .await
        .expect("route");

    let received = direct_messages(&mut bob);
    assert_eq!(received.len(), 1);
    let id: i64 = received[0].0.parse().expect("numeric id");
    assert!(rt.messages.contains(id));
}

#[tokio::test]
async fn test_failed_store_delivers_nothing() {
    let rt = Realtime::single_slot();
    let alice = rt.connect_registered(1, "alice").await;
    let mut bob = rt.connect_registered(2, "bob").await;
    rt.device_tokens.add(2, "bob-phone");
    rt.messages.fail_writes(true);

    let result = rt
        .router
        .route_direct(&alice.identity, 2, "lost".into(), vec![])
        .await;

    assert!(matches!(result, Err(RouterError::Persistence(_))));
    assert!(direct_messages(&mut bob).is_empty());
    assert!(rt.push.sent().is_empty());
}

#[tokio::test]
async fn test_offline_recipient_with_token_is_pushed() {
    let rt = Realtime::single_slot();
    let alice = rt.connect_registered(1, "alice").await;
    rt.device_tokens.add(2, "bob-phone");

    let delivery = rt
        .router
        .route_direct(&alice.identity, 2, "you there?".into(), vec![])
        .await
        .expect("route");

    assert_eq!(delivery.outcome, DeliveryOutcome::Pushed);
    assert!(rt.messages.contains(delivery.message.id));
    let sent = rt.push.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "bob-phone");
    assert_eq!(sent[0].1.title, "alice");
    assert_eq!(sent[0].1.body, "you there?");
}

#[tokio::test]
async fn test_offline_recipient_without_token_is_still_stored() {
    let rt = Realtime::single_slot();
    let alice = rt.connect_registered(1, "alice").await;

    let delivery = rt
        .router
        .route_direct(&alice.identity, 2, "later".into(), vec![])
        .await
        .expect("route");

    assert_eq!(delivery.outcome, DeliveryOutcome::NotNotified);
    assert_eq!(rt.messages.len(), 1);
}

#[tokio::test]
async fn test_push_failure_does_not_fail_the_send() {
    let rt = Realtime::single_slot();
    let alice = rt.connect_registered(1, "alice").await;
    rt.device_tokens.add(2, "bob-phone");
    rt.push.fail_sends(true);

    let delivery = rt
        .router
        .route_direct(&alice.identity, 2, "ping".into(), vec![])
        .await
        .expect("route");

    assert_eq!(delivery.outcome, DeliveryOutcome::NotNotified);
    assert!(rt.messages.contains(delivery.message.id));
}

#[tokio::test]
async fn test_recipient_that_left_gets_push_instead() {
    let rt = Realtime::single_slot();
    let alice = rt.connect_registered(1, "alice").await;
    let bob = rt.connect_registered(2, "bob").await;
    rt.device_tokens.add(2, "bob-phone");
    rt.close(&bob).await;

    let delivery = rt
        .router
        .route_direct(&alice.identity, 2, "gone?".into(), vec![])
        .await
        .expect("route");

    assert_eq!(delivery.outcome, DeliveryOutcome::Pushed);
}
