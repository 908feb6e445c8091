//! Integration tests for the match request workflow.
//!
//! Runs against the in-memory store with a recording dispatcher.

mod common;

use chrono::Duration;
use common::TestWorld;
use kickoff_core::common::AppError;
use kickoff_core::domains::matches::activities;
use kickoff_core::domains::matches::{MatchEvent, MatchRequestStatus, MatchStatus};
use kickoff_core::domains::notifications::NotificationKind;
use kickoff_core::kernel::store::MatchRepository;

fn request_id(event: &MatchEvent) -> kickoff_core::common::MatchRequestId {
    event.request().map(|r| r.id).expect("event carries a request")
}

#[tokio::test]
async fn request_then_accept_confirms_match() {
    let world = TestWorld::new();
    let lions = world.team("Lions").await;
    let tigers = world.team("Tigers").await;
    let fixture = world.open_match(&lions, world.now + Duration::days(3)).await;
    assert_eq!(fixture.status, MatchStatus::Available);

    let created = activities::create_request(
        fixture.id,
        tigers.id(),
        Some("We can bring a ref".into()),
        &world.ctx(&tigers.captain),
        &world.deps,
    )
    .await
    .unwrap();
    assert_eq!(created.fixture().status, MatchStatus::Pending);
    assert!(created.fixture().away_team_id.is_none());

    let accepted = activities::accept_request(request_id(&created), &world.ctx(&lions.captain), &world.deps)
        .await
        .unwrap();

    let stored = world.store.find_match(fixture.id).await.unwrap().unwrap();
    assert_eq!(stored.status, MatchStatus::Confirmed);
    assert_eq!(stored.away_team_id, Some(tigers.id()));
    assert_eq!(stored.confirmed_at, Some(world.now));
    assert_eq!(stored.lock_version, accepted.fixture().lock_version);

    let request = world.store.find_request(request_id(&created)).await.unwrap().unwrap();
    assert_eq!(request.status, MatchRequestStatus::Accepted);
    assert_eq!(request.reviewed_by, Some(lions.captain.id));
    assert_eq!(request.message.as_deref(), Some("We can bring a ref"));

    assert_eq!(
        world.dispatcher.recipients_of(NotificationKind::MatchRequestReceived),
        vec![lions.captain.id]
    );
    assert_eq!(
        world.dispatcher.recipients_of(NotificationKind::MatchRequestAccepted),
        vec![tigers.captain.id]
    );
}

#[tokio::test]
async fn accept_rejects_every_other_pending_request() {
    let world = TestWorld::new();
    let home = world.team("Home").await;
    let first = world.team("First").await;
    let second = world.team("Second").await;
    let fixture = world.open_match(&home, world.now + Duration::days(2)).await;

    let r1 = activities::create_request(fixture.id, first.id(), None, &world.ctx(&first.captain), &world.deps)
        .await
        .unwrap();
    let r2 = activities::create_request(fixture.id, second.id(), None, &world.ctx(&second.captain), &world.deps)
        .await
        .unwrap();

    let accepted = activities::accept_request(request_id(&r2), &world.ctx(&home.captain), &world.deps)
        .await
        .unwrap();
    match &accepted {
        MatchEvent::RequestAccepted { auto_rejected, .. } => {
            assert_eq!(auto_rejected.len(), 1);
            assert_eq!(auto_rejected[0].id, request_id(&r1));
        }
        other => panic!("unexpected event: {:?}", other),
    }

    let requests = world.store.requests_for_match(fixture.id).await.unwrap();
    let accepted_count = requests
        .iter()
        .filter(|r| r.status == MatchRequestStatus::Accepted)
        .count();
    assert_eq!(accepted_count, 1);
    assert!(requests.iter().all(|r| r.status != MatchRequestStatus::Pending));

    let stored = world.store.find_match(fixture.id).await.unwrap().unwrap();
    assert_eq!(stored.away_team_id, Some(second.id()));
    assert_eq!(
        world.dispatcher.recipients_of(NotificationKind::MatchRequestRejected),
        vec![first.captain.id]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_accepts_confirm_exactly_one_request() {
    let world = TestWorld::new();
    let home = world.team("Home").await;
    let a = world.team("Team A").await;
    let b = world.team("Team B").await;
    let fixture = world.open_match(&home, world.now + Duration::days(2)).await;

    let ra = activities::create_request(fixture.id, a.id(), None, &world.ctx(&a.captain), &world.deps)
        .await
        .unwrap();
    let rb = activities::create_request(fixture.id, b.id(), None, &world.ctx(&b.captain), &world.deps)
        .await
        .unwrap();

    let ctx = world.ctx(&home.captain);
    let (deps_a, deps_b) = (world.deps.clone(), world.deps.clone());
    let (id_a, id_b) = (request_id(&ra), request_id(&rb));
    let first = tokio::spawn(async move { activities::accept_request(id_a, &ctx, &deps_a).await });
    let second = tokio::spawn(async move { activities::accept_request(id_b, &ctx, &deps_b).await });
    let results = [first.await.unwrap(), second.await.unwrap()];

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one accept must win");
    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert!(matches!(loser, AppError::Conflict(_)), "loser saw {:?}", loser);

    let requests = world.store.requests_for_match(fixture.id).await.unwrap();
    let accepted: Vec<_> = requests
        .iter()
        .filter(|r| r.status == MatchRequestStatus::Accepted)
        .collect();
    assert_eq!(accepted.len(), 1);
    assert!(requests
        .iter()
        .all(|r| r.status == MatchRequestStatus::Accepted || r.status == MatchRequestStatus::Rejected));

    let stored = world.store.find_match(fixture.id).await.unwrap().unwrap();
    assert_eq!(stored.status, MatchStatus::Confirmed);
    assert_eq!(stored.away_team_id, Some(accepted[0].requesting_team_id));
}

#[tokio::test]
async fn rejecting_the_last_pending_request_reopens_the_match() {
    let world = TestWorld::new();
    let home = world.team("Home").await;
    let away = world.team("Away").await;
    let fixture = world.open_match(&home, world.now + Duration::days(4)).await;

    let created = activities::create_request(fixture.id, away.id(), None, &world.ctx(&away.captain), &world.deps)
        .await
        .unwrap();
    let rejected = activities::reject_request(request_id(&created), &world.ctx(&home.captain), &world.deps)
        .await
        .unwrap();

    assert_eq!(rejected.fixture().status, MatchStatus::Available);
    assert!(rejected.fixture().away_team_id.is_none());
    assert_eq!(rejected.request().unwrap().status, MatchRequestStatus::Rejected);
    assert_eq!(
        world.dispatcher.recipients_of(NotificationKind::MatchRequestRejected),
        vec![away.captain.id]
    );

    // A fresh request is welcome again
    let again = activities::create_request(fixture.id, away.id(), None, &world.ctx(&away.captain), &world.deps)
        .await
        .unwrap();
    assert_eq!(again.fixture().status, MatchStatus::Pending);
}

#[tokio::test]
async fn rejecting_one_of_two_requests_keeps_match_pending() {
    let world = TestWorld::new();
    let home = world.team("Home").await;
    let a = world.team("A").await;
    let b = world.team("B").await;
    let fixture = world.open_match(&home, world.now + Duration::days(4)).await;

    let ra = activities::create_request(fixture.id, a.id(), None, &world.ctx(&a.captain), &world.deps)
        .await
        .unwrap();
    activities::create_request(fixture.id, b.id(), None, &world.ctx(&b.captain), &world.deps)
        .await
        .unwrap();

    let rejected = activities::reject_request(request_id(&ra), &world.ctx(&home.captain), &world.deps)
        .await
        .unwrap();
    assert_eq!(rejected.fixture().status, MatchStatus::Pending);
}

#[tokio::test]
async fn withdrawn_request_notifies_home_captains() {
    let world = TestWorld::new();
    let home = world.team("Home").await;
    let vice = world.co_captain(&home, "Vice").await;
    let away = world.team("Away").await;
    let fixture = world.open_match(&home, world.now + Duration::days(4)).await;

    let created = activities::create_request(fixture.id, away.id(), None, &world.ctx(&away.captain), &world.deps)
        .await
        .unwrap();

    // Only the requesting team may withdraw
    let err = activities::withdraw_request(request_id(&created), &world.ctx(&home.captain), &world.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));

    let withdrawn = activities::withdraw_request(request_id(&created), &world.ctx(&away.captain), &world.deps)
        .await
        .unwrap();
    assert_eq!(withdrawn.request().unwrap().status, MatchRequestStatus::Withdrawn);
    assert_eq!(withdrawn.fixture().status, MatchStatus::Available);

    let mut notified = world.dispatcher.recipients_of(NotificationKind::MatchRequestWithdrawn);
    notified.sort();
    let mut expected = vec![home.captain.id, vice.id];
    expected.sort();
    assert_eq!(notified, expected);
}

#[tokio::test]
async fn reviewing_a_closed_request_is_a_conflict() {
    let world = TestWorld::new();
    let home = world.team("Home").await;
    let away = world.team("Away").await;
    let fixture = world.open_match(&home, world.now + Duration::days(4)).await;

    let created = activities::create_request(fixture.id, away.id(), None, &world.ctx(&away.captain), &world.deps)
        .await
        .unwrap();
    activities::reject_request(request_id(&created), &world.ctx(&home.captain), &world.deps)
        .await
        .unwrap();

    let err = activities::accept_request(request_id(&created), &world.ctx(&home.captain), &world.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = activities::withdraw_request(request_id(&created), &world.ctx(&away.captain), &world.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn duplicate_pending_request_from_same_team_is_refused() {
    let world = TestWorld::new();
    let home = world.team("Home").await;
    let away = world.team("Away").await;
    let fixture = world.open_match(&home, world.now + Duration::days(4)).await;

    activities::create_request(fixture.id, away.id(), None, &world.ctx(&away.captain), &world.deps)
        .await
        .unwrap();
    let err = activities::create_request(fixture.id, away.id(), None, &world.ctx(&away.captain), &world.deps)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(world.store.requests_for_match(fixture.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn home_team_cannot_request_its_own_match() {
    let world = TestWorld::new();
    let home = world.team("Home").await;
    let fixture = world.open_match(&home, world.now + Duration::days(4)).await;

    let err = activities::create_request(fixture.id, home.id(), None, &world.ctx(&home.captain), &world.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn confirmed_match_takes_no_new_requests() {
    let world = TestWorld::new();
    let home = world.team("Home").await;
    let away = world.team("Away").await;
    let late = world.team("Late").await;
    let fixture = world
        .confirmed_match(&home, &away, world.now + Duration::days(4))
        .await;

    let err = activities::create_request(fixture.id, late.id(), None, &world.ctx(&late.captain), &world.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn players_cannot_request_or_review() {
    let world = TestWorld::new();
    let home = world.team("Home").await;
    let home_player = world.player(&home, "Home Player").await;
    let away = world.team("Away").await;
    let away_player = world.player(&away, "Away Player").await;
    let fixture = world.open_match(&home, world.now + Duration::days(4)).await;

    let err = activities::create_request(fixture.id, away.id(), None, &world.ctx(&away_player), &world.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));

    let created = activities::create_request(fixture.id, away.id(), None, &world.ctx(&away.captain), &world.deps)
        .await
        .unwrap();

    let err = activities::accept_request(request_id(&created), &world.ctx(&home_player), &world.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));

    // The requesting captain cannot accept their own request either
    let err = activities::accept_request(request_id(&created), &world.ctx(&away.captain), &world.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));

    let stored = world.store.find_match(fixture.id).await.unwrap().unwrap();
    assert_eq!(stored.status, MatchStatus::Pending);
}

#[tokio::test]
async fn overlong_message_is_rejected() {
    let world = TestWorld::new();
    let home = world.team("Home").await;
    let away = world.team("Away").await;
    let fixture = world.open_match(&home, world.now + Duration::days(4)).await;

    let err = activities::create_request(
        fixture.id,
        away.id(),
        Some("x".repeat(1001)),
        &world.ctx(&away.captain),
        &world.deps,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn request_lists_are_scoped_to_the_viewer() {
    let world = TestWorld::new();
    let home = world.team("Home").await;
    let a = world.team("A").await;
    let b = world.team("B").await;
    let fixture = world.open_match(&home, world.now + Duration::days(4)).await;

    activities::create_request(fixture.id, a.id(), None, &world.ctx(&a.captain), &world.deps)
        .await
        .unwrap();
    activities::create_request(fixture.id, b.id(), None, &world.ctx(&b.captain), &world.deps)
        .await
        .unwrap();

    let all = activities::list_match_requests(fixture.id, &world.ctx(&home.captain), &world.deps)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let own = activities::list_match_requests(fixture.id, &world.ctx(&a.captain), &world.deps)
        .await
        .unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].requesting_team_id, a.id());

    let stranger = world.outsider("Stranger").await;
    let err = activities::list_match_requests(fixture.id, &world.ctx(&stranger), &world.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));
}

#[tokio::test]
async fn failed_notification_does_not_undo_the_accept() {
    let world = TestWorld::new();
    let home = world.team("Home").await;
    let away = world.team("Away").await;
    let fixture = world.open_match(&home, world.now + Duration::days(4)).await;

    let created = activities::create_request(fixture.id, away.id(), None, &world.ctx(&away.captain), &world.deps)
        .await
        .unwrap();
    world.dispatcher.fail_for(away.captain.id);

    activities::accept_request(request_id(&created), &world.ctx(&home.captain), &world.deps)
        .await
        .unwrap();

    let stored = world.store.find_match(fixture.id).await.unwrap().unwrap();
    assert_eq!(stored.status, MatchStatus::Confirmed);
    assert_eq!(world.dispatcher.count_of(NotificationKind::MatchRequestAccepted), 0);
}
