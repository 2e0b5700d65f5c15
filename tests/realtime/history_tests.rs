//! Message History Tests
//!
//! Reads over messages stored by the router.

use pretty_assertions::assert_eq;

use social_server::application::services::HistoryPage;
use social_server::domain::{Identity, Message};

use crate::common::Realtime;

async fn send(rt: &Realtime, from: &Identity, to: i64, content: &str) -> i64 {
    rt.router
        .route_direct(from, to, content.into(), vec![])
        .await
        .expect("route")
        .message
        .id
}

fn contents(messages: &[Message]) -> Vec<&str> {
    messages.iter().map(|m| m.content.as_str()).collect()
}

#[tokio::test]
async fn test_conversation_holds_both_directions_oldest_first() {
    let rt = Realtime::single_slot();
    let alice = Identity::new(1, "alice");
    let bob = Identity::new(2, "bob");
    let carol = Identity::new(3, "carol");

    send(&rt, &alice, 2, "hi bob").await;
    send(&rt, &carol, 2, "hi from carol").await;
    send(&rt, &bob, 1, "hi alice").await;
    rt.router
        .route_group(&alice, 50, "group hello".into(), vec![])
        .await
        .expect("route group");
    send(&rt, &alice, 2, "how are you").await;

    let from_alice = rt
        .history
        .conversation(&alice, 2, HistoryPage::default())
        .await
        .expect("conversation");
    let from_bob = rt
        .history
        .conversation(&bob, 1, HistoryPage::default())
        .await
        .expect("conversation");

    assert_eq!(contents(&from_alice), vec!["hi bob", "hi alice", "how are you"]);
    assert_eq!(from_alice, from_bob);
}

#[tokio::test]
async fn test_conversation_pages_backwards_from_cursor() {
    let rt = Realtime::single_slot();
    let alice = Identity::new(1, "alice");

    let mut ids = Vec::new();
    for i in 0..5 {
        ids.push(send(&rt, &alice, 2, &format!("m{i}")).await);
    }

    let page = rt
        .history
        .conversation(
            &alice,
            2,
            HistoryPage {
                before: Some(ids[4]),
                limit: Some(2),
            },
        )
        .await
        .expect("conversation");

    assert_eq!(contents(&page), vec!["m2", "m3"]);
}

#[tokio::test]
async fn test_inbox_lists_only_callers_messages_newest_first() {
    let rt = Realtime::single_slot();
    let alice = Identity::new(1, "alice");
    let bob = Identity::new(2, "bob");
    let carol = Identity::new(3, "carol");

    send(&rt, &alice, 2, "first").await;
    send(&rt, &bob, 1, "to alice").await;
    send(&rt, &carol, 2, "second").await;
    rt.router
        .route_group(&carol, 50, "group hello".into(), vec![])
        .await
        .expect("route group");

    let inbox = rt
        .history
        .inbox(&bob, HistoryPage::default())
        .await
        .expect("inbox");

    assert_eq!(contents(&inbox), vec!["second", "first"]);
    assert!(inbox
        .iter()
        .all(|m| m.target.recipient_id() == Some(bob.user_id)));
}
