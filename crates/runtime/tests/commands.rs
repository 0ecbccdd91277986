mod common;

use std::sync::Arc;

use chrono::TimeDelta;
use common::{Fixture, player};
use rank_core::SubjectId;
use rank_runtime::{CommandSurface, ReassignPolicy};

fn surface(fx: &Fixture) -> CommandSurface {
    CommandSurface::new(Arc::clone(&fx.service))
}

#[tokio::test]
async fn test_grant_replies_and_notifies_subject() {
    let fx = Fixture::new(&[player("P1", "PlayerOne")]);

    let response = surface(&fx).grant("admin", "playerone", " vip ", 3).await;

    assert!(response.ok);
    assert_eq!(response.message, "Assigned rank 'vip' to PlayerOne for 3 day(s).");
    assert_eq!(
        fx.directory.notices(),
        vec![(
            SubjectId::new("P1"),
            "You received VIP rank vip for 3 days!".to_string()
        )]
    );
}

#[tokio::test]
async fn test_grant_errors_become_messages() {
    let fx = Fixture::with_policy(&[player("P1", "PlayerOne")], ReassignPolicy::Reject);
    let commands = surface(&fx);

    let cases = [
        ("nobody", "vip", 1, "Player not found."),
        ("P1", "   ", 1, "Rank cannot be empty."),
        ("P1", "vip", 0, "Days must be between 1 and 3650."),
    ];
    for (query, rank, days, expected) in cases {
        let response = commands.grant("admin", query, rank, days).await;
        assert!(!response.ok);
        assert_eq!(response.message, expected);
    }

    assert!(commands.grant("admin", "P1", "vip", 1).await.ok);
    let conflict = commands.grant("admin", "P1", "mvp", 1).await;
    assert!(!conflict.ok);
    assert!(conflict.message.contains("already has VIP 'vip'"));
    assert!(fx.directory.notices().len() == 1);
}

#[tokio::test]
async fn test_remove_replies() {
    let fx = Fixture::new(&[player("P1", "PlayerOne"), player("P2", "PlayerTwo")]);
    let commands = surface(&fx);
    commands.grant("admin", "P1", "vip", 1).await;

    let removed = commands.remove("admin", "P1").await;
    assert!(removed.ok);
    assert_eq!(removed.message, "Removed VIP from PlayerOne.");

    let missing = commands.remove("admin", "PlayerTwo").await;
    assert!(!missing.ok);
    assert_eq!(missing.message, "Player does not have an active VIP assignment.");

    let unknown = commands.remove("admin", "ghost").await;
    assert!(!unknown.ok);
    assert_eq!(unknown.message, "Player not found.");
}

#[tokio::test]
async fn test_status_replies_with_remaining_time() {
    let fx = Fixture::new(&[player("P1", "PlayerOne"), player("P2", "PlayerTwo")]);
    let commands = surface(&fx);
    commands.grant("admin", "P1", "vip", 2).await;

    fx.clock.advance(TimeDelta::hours(3) + TimeDelta::minutes(15));

    let active = commands.status("P1");
    assert!(active.ok);
    assert_eq!(active.message, "VIP 'vip' active. Remaining: 1d 20h 45m");

    let none = commands.status("P2");
    assert!(none.ok);
    assert_eq!(none.message, "No active VIP assignment.");

    let unknown = commands.status("ghost");
    assert!(!unknown.ok);
}
