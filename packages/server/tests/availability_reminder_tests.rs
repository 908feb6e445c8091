//! Integration tests for player availability and the 48-hour reminder run.

mod common;

use std::sync::Arc;

use chrono::Duration;
use common::TestWorld;
use kickoff_core::common::AppError;
use kickoff_core::domains::availability::activities::{
    match_availability_summary, respond_to_match, run_availability_reminders,
};
use kickoff_core::domains::availability::AvailabilityStatus;
use kickoff_core::domains::matches::activities;
use kickoff_core::domains::notifications::NotificationKind;
use kickoff_core::domains::teams::models::{TeamMember, TeamRole};
use kickoff_core::kernel::store::{AvailabilityRepository, TeamDirectory};
use kickoff_core::kernel::ReminderScheduler;

#[tokio::test]
async fn reminder_run_covers_every_member_of_both_teams() {
    let world = TestWorld::new();
    let home = world.team("Home").await;
    let home_players = [
        world.player(&home, "H1").await,
        world.player(&home, "H2").await,
    ];
    let away = world.team("Away").await;
    let away_player = world.player(&away, "A1").await;
    let fixture = world
        .confirmed_match(&home, &away, world.now + Duration::hours(48))
        .await;
    world.dispatcher.clear();

    let report = run_availability_reminders(world.now, &world.deps).await.unwrap();

    assert_eq!(report.matches_scanned, 1);
    assert_eq!(report.records_created, 5);
    assert_eq!(report.reminders_sent, 5);
    assert_eq!(report.failures, 0);

    let mut reminded = world.dispatcher.recipients_of(NotificationKind::AvailabilityReminder);
    reminded.sort();
    let mut expected = vec![
        home.captain.id,
        home_players[0].id,
        home_players[1].id,
        away.captain.id,
        away_player.id,
    ];
    expected.sort();
    assert_eq!(reminded, expected);

    let records = world.store.availability_for_match(fixture.id).await.unwrap();
    assert_eq!(records.len(), 5);
    for record in &records {
        assert_eq!(record.status, AvailabilityStatus::Pending);
        assert_eq!(record.reminded_at, Some(world.now));
    }
}

#[tokio::test]
async fn member_of_both_teams_is_reminded_once_per_match() {
    let world = TestWorld::new();
    let home = world.team("Home").await;
    let away = world.team("Away").await;
    let ringer = world.player(&home, "Ringer").await;
    world
        .store
        .upsert_member(&TeamMember::active(away.id(), ringer.id, TeamRole::Player))
        .await
        .unwrap();
    let fixture = world
        .confirmed_match(&home, &away, world.now + Duration::hours(48))
        .await;
    world.dispatcher.clear();

    let report = run_availability_reminders(world.now, &world.deps).await.unwrap();
    run_availability_reminders(world.now + Duration::minutes(1), &world.deps)
        .await
        .unwrap();

    let reminded = world.dispatcher.recipients_of(NotificationKind::AvailabilityReminder);
    assert_eq!(reminded.iter().filter(|id| **id == ringer.id).count(), 1);
    assert_eq!(reminded.len(), 3);
    assert_eq!(report.reminders_sent, 3);

    // One record per team, both stamped by the single send
    let records: Vec<_> = world
        .store
        .availability_for_match(fixture.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.user_id == ringer.id)
        .collect();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.reminded_at == Some(world.now)));
}

#[tokio::test]
async fn second_run_sends_nothing_new() {
    let world = TestWorld::new();
    let home = world.team("Home").await;
    world.player(&home, "H1").await;
    let away = world.team("Away").await;
    let fixture = world
        .confirmed_match(&home, &away, world.now + Duration::hours(48))
        .await;
    world.dispatcher.clear();

    run_availability_reminders(world.now, &world.deps).await.unwrap();
    let sent = world.dispatcher.dispatch_count();
    let before = world.store.availability_for_match(fixture.id).await.unwrap();

    let later = world.now + Duration::minutes(1);
    let report = run_availability_reminders(later, &world.deps).await.unwrap();

    assert_eq!(report.reminders_sent, 0);
    assert_eq!(report.records_created, 0);
    assert_eq!(world.dispatcher.dispatch_count(), sent);
    let after = world.store.availability_for_match(fixture.id).await.unwrap();
    assert_eq!(after.len(), before.len());
    for record in &after {
        assert_eq!(record.reminded_at, Some(world.now));
    }
}

#[tokio::test]
async fn one_failing_recipient_does_not_stop_the_run() {
    let world = TestWorld::new();
    let home = world.team("Home").await;
    let unreachable = world.player(&home, "Offline").await;
    let reachable = world.player(&home, "Online").await;
    let away = world.team("Away").await;
    world
        .confirmed_match(&home, &away, world.now + Duration::hours(48))
        .await;
    world.dispatcher.clear();
    world.dispatcher.fail_for(unreachable.id);

    let report = run_availability_reminders(world.now, &world.deps).await.unwrap();

    assert_eq!(report.failures, 1);
    assert_eq!(report.reminders_sent, 3);
    let reminded = world.dispatcher.recipients_of(NotificationKind::AvailabilityReminder);
    assert!(reminded.contains(&reachable.id));
    assert!(!reminded.contains(&unreachable.id));

    // The failed reminder is retried on the next run, and only that one
    world.dispatcher.recover(unreachable.id);
    world.dispatcher.clear();
    let retry = run_availability_reminders(world.now + Duration::minutes(10), &world.deps)
        .await
        .unwrap();
    assert_eq!(retry.reminders_sent, 1);
    assert_eq!(
        world.dispatcher.recipients_of(NotificationKind::AvailabilityReminder),
        vec![unreachable.id]
    );
}

#[tokio::test]
async fn window_edges_are_inclusive() {
    let world = TestWorld::new();
    let home = world.team("Home").await;
    let early = world
        .open_match(&home, world.now + Duration::hours(48) - Duration::minutes(15))
        .await;
    let late = world
        .open_match(&home, world.now + Duration::hours(48) + Duration::minutes(15))
        .await;
    world
        .open_match(&home, world.now + Duration::hours(48) + Duration::minutes(16))
        .await;
    world.open_match(&home, world.now + Duration::hours(24)).await;

    let report = run_availability_reminders(world.now, &world.deps).await.unwrap();

    assert_eq!(report.matches_scanned, 2);
    assert_eq!(report.reminders_sent, 2);
    assert_eq!(world.store.availability_for_match(early.id).await.unwrap().len(), 1);
    assert_eq!(world.store.availability_for_match(late.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn pending_and_cancelled_matches_are_skipped() {
    let world = TestWorld::new();
    let home = world.team("Home").await;
    let away = world.team("Away").await;
    let kickoff = world.now + Duration::hours(48);

    let pending = world.open_match(&home, kickoff).await;
    activities::create_request(pending.id, away.id(), None, &world.ctx(&away.captain), &world.deps)
        .await
        .unwrap();

    let cancelled = world.open_match(&home, kickoff).await;
    activities::cancel_match(cancelled.id, &world.ctx(&home.captain), &world.deps)
        .await
        .unwrap();
    world.dispatcher.clear();

    let report = run_availability_reminders(world.now, &world.deps).await.unwrap();

    assert_eq!(report.matches_scanned, 0);
    assert_eq!(world.dispatcher.dispatch_count(), 0);
    assert_eq!(world.store.availability_count(), 0);
}

#[tokio::test]
async fn players_who_already_answered_are_not_reminded() {
    let world = TestWorld::new();
    let home = world.team("Home").await;
    let keen = world.player(&home, "Keen").await;
    let away = world.team("Away").await;
    let fixture = world
        .confirmed_match(&home, &away, world.now + Duration::hours(48))
        .await;
    world.dispatcher.clear();

    respond_to_match(fixture.id, home.id(), AvailabilityStatus::Available, &world.ctx(&keen), &world.deps)
        .await
        .unwrap();

    let report = run_availability_reminders(world.now, &world.deps).await.unwrap();

    assert_eq!(report.reminders_sent, 2);
    assert!(!world
        .dispatcher
        .recipients_of(NotificationKind::AvailabilityReminder)
        .contains(&keen.id));
    let record = world
        .store
        .find_availability(fixture.id, keen.id, home.id())
        .await
        .unwrap()
        .unwrap();
    assert!(record.reminded_at.is_none());
}

#[tokio::test]
async fn responding_updates_a_single_record() {
    let world = TestWorld::new();
    let home = world.team("Home").await;
    let player = world.player(&home, "Midfielder").await;
    let fixture = world.open_match(&home, world.now + Duration::days(5)).await;
    let ctx = world.ctx(&player);

    let first = respond_to_match(fixture.id, home.id(), AvailabilityStatus::Maybe, &ctx, &world.deps)
        .await
        .unwrap();
    assert_eq!(first.confirmed_at, Some(world.now));

    let later = world.ctx_at(&player, world.now + Duration::hours(2));
    let second = respond_to_match(fixture.id, home.id(), AvailabilityStatus::Unavailable, &later, &world.deps)
        .await
        .unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.status, AvailabilityStatus::Unavailable);
    assert_eq!(second.confirmed_at, Some(world.now));
    assert_eq!(world.store.availability_count(), 1);

    let err = respond_to_match(fixture.id, home.id(), AvailabilityStatus::Pending, &ctx, &world.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn responding_requires_membership_of_a_playing_team() {
    let world = TestWorld::new();
    let home = world.team("Home").await;
    let other = world.team("Other").await;
    let other_player = world.player(&other, "Visitor").await;
    let fixture = world.open_match(&home, world.now + Duration::days(5)).await;

    let err = respond_to_match(
        fixture.id,
        other.id(),
        AvailabilityStatus::Available,
        &world.ctx(&other_player),
        &world.deps,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = respond_to_match(
        fixture.id,
        home.id(),
        AvailabilityStatus::Available,
        &world.ctx(&other_player),
        &world.deps,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));
}

#[tokio::test]
async fn responding_to_a_cancelled_match_is_refused() {
    let world = TestWorld::new();
    let home = world.team("Home").await;
    let player = world.player(&home, "Striker").await;
    let fixture = world.open_match(&home, world.now + Duration::days(5)).await;
    activities::cancel_match(fixture.id, &world.ctx(&home.captain), &world.deps)
        .await
        .unwrap();

    let err = respond_to_match(fixture.id, home.id(), AvailabilityStatus::Available, &world.ctx(&player), &world.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn summary_counts_answers_per_team() {
    let world = TestWorld::new();
    let home = world.team("Home").await;
    let h1 = world.player(&home, "H1").await;
    let h2 = world.player(&home, "H2").await;
    world.player(&home, "H3").await;
    let away = world.team("Away").await;
    let a1 = world.player(&away, "A1").await;
    let fixture = world
        .confirmed_match(&home, &away, world.now + Duration::days(5))
        .await;

    for (user, team, status) in [
        (&h1, home.id(), AvailabilityStatus::Available),
        (&h2, home.id(), AvailabilityStatus::Maybe),
        (&a1, away.id(), AvailabilityStatus::Unavailable),
    ] {
        respond_to_match(fixture.id, team, status, &world.ctx(user), &world.deps)
            .await
            .unwrap();
    }

    let summary = match_availability_summary(fixture.id, &world.ctx(&a1), &world.deps)
        .await
        .unwrap();

    assert_eq!(summary.teams.len(), 2);
    let home_counts = &summary.teams[0];
    assert_eq!(home_counts.team_id, home.id());
    assert_eq!((home_counts.available, home_counts.maybe, home_counts.unavailable), (1, 1, 0));
    // Captain and H3 never answered
    assert_eq!(home_counts.no_response, 2);

    let away_counts = &summary.teams[1];
    assert_eq!(away_counts.unavailable, 1);
    assert_eq!(away_counts.no_response, 1);
    assert_eq!(summary.responses.len(), 3);

    let outsider = world.outsider("Scout").await;
    let err = match_availability_summary(fixture.id, &world.ctx(&outsider), &world.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));
}

#[tokio::test]
async fn scheduler_runs_report_like_direct_runs() {
    let world = TestWorld::new();
    let home = world.team("Home").await;
    world.open_match(&home, world.now + Duration::hours(48)).await;

    let scheduler = ReminderScheduler::new(Arc::new(world.deps.clone()));
    let report = scheduler.run_once(world.now).await.unwrap();

    assert!(!report.skipped);
    assert_eq!(report.reminders_sent, 1);
    assert!(!scheduler.is_running());
}
