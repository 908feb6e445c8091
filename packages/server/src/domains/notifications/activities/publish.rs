use tracing::{debug, info, warn};

use super::deliver::{notify_users, DeliveryReport};
use crate::common::{ActorContext, AppResult, TeamId, UserId};
use crate::domains::matches::events::MatchEvent;
use crate::domains::notifications::templates;
use crate::kernel::ServerDeps;

/// Send the notifications a committed match event calls for.
///
/// Runs after the commit. Every failure is logged here; nothing is returned
/// to the caller because the workflow change already happened. The acting
/// user is never notified of their own action.
pub async fn publish_match_event(event: &MatchEvent, ctx: &ActorContext, deps: &ServerDeps) -> DeliveryReport {
    match fan_out(event, ctx, deps).await {
        Ok(report) => {
            if report.delivered + report.failed > 0 {
                info!(
                    match_id = %event.fixture().id,
                    delivered = report.delivered,
                    failed = report.failed,
                    "Match event notifications sent"
                );
            }
            report
        }
        Err(e) => {
            warn!(match_id = %event.fixture().id, error = %e, "Could not resolve notification recipients");
            DeliveryReport::default()
        }
    }
}

async fn fan_out(event: &MatchEvent, ctx: &ActorContext, deps: &ServerDeps) -> AppResult<DeliveryReport> {
    let base = deps.app_base_url.as_str();
    let now = ctx.now;
    let actor = ctx.actor_id;
    let mut total = DeliveryReport::default();

    match event {
        MatchEvent::RequestCreated { fixture, request } => {
            let requester = team_name(request.requesting_team_id, deps).await;
            let payload = templates::request_received(fixture, request, &requester, base, now);
            let recipients = captains(fixture.home_team_id, actor, deps).await?;
            add(&mut total, notify_users(&recipients, &payload, deps).await);
        }

        MatchEvent::RequestAccepted {
            fixture,
            request,
            auto_rejected,
        } => {
            let home = team_name(fixture.home_team_id, deps).await;

            let payload = templates::request_accepted(fixture, request, &home, base, now);
            let recipients = captains(request.requesting_team_id, actor, deps).await?;
            add(&mut total, notify_users(&recipients, &payload, deps).await);

            for other in auto_rejected {
                let payload = templates::request_rejected(fixture, other, &home, base, now);
                let recipients = captains(other.requesting_team_id, actor, deps).await?;
                add(&mut total, notify_users(&recipients, &payload, deps).await);
            }
        }

        MatchEvent::RequestRejected { fixture, request } => {
            let home = team_name(fixture.home_team_id, deps).await;
            let payload = templates::request_rejected(fixture, request, &home, base, now);
            let recipients = captains(request.requesting_team_id, actor, deps).await?;
            add(&mut total, notify_users(&recipients, &payload, deps).await);
        }

        MatchEvent::RequestWithdrawn { fixture, request } => {
            let requester = team_name(request.requesting_team_id, deps).await;
            let payload = templates::request_withdrawn(fixture, request, &requester, base, now);
            let recipients = captains(fixture.home_team_id, actor, deps).await?;
            add(&mut total, notify_users(&recipients, &payload, deps).await);
        }

        MatchEvent::MatchCancelled {
            fixture,
            cancelled_by_team,
            auto_rejected,
        } => {
            let canceller = team_name(*cancelled_by_team, deps).await;
            let payload = templates::match_cancelled(fixture, &canceller, base, now);

            if let Some(counterpart) = fixture.opponent_of(*cancelled_by_team) {
                let recipients = members(counterpart, actor, deps).await?;
                add(&mut total, notify_users(&recipients, &payload, deps).await);
            }
            for request in auto_rejected {
                let recipients = captains(request.requesting_team_id, actor, deps).await?;
                add(&mut total, notify_users(&recipients, &payload, deps).await);
            }
        }

        MatchEvent::MatchCreated { .. }
        | MatchEvent::MatchStarted { .. }
        | MatchEvent::MatchCompleted { .. }
        | MatchEvent::ScoreCorrected { .. } => {
            debug!(match_id = %event.fixture().id, "No notifications for event");
        }
    }

    Ok(total)
}

fn add(total: &mut DeliveryReport, report: DeliveryReport) {
    total.delivered += report.delivered;
    total.failed += report.failed;
}

async fn captains(team_id: TeamId, actor: UserId, deps: &ServerDeps) -> AppResult<Vec<UserId>> {
    Ok(deps
        .store
        .captains(team_id)
        .await?
        .into_iter()
        .map(|m| m.user_id)
        .filter(|user_id| *user_id != actor)
        .collect())
}

async fn members(team_id: TeamId, actor: UserId, deps: &ServerDeps) -> AppResult<Vec<UserId>> {
    Ok(deps
        .store
        .active_members(team_id)
        .await?
        .into_iter()
        .map(|m| m.user_id)
        .filter(|user_id| *user_id != actor)
        .collect())
}

/// Display name for messages; falls back when the team cannot be loaded.
pub(crate) async fn team_name(team_id: TeamId, deps: &ServerDeps) -> String {
    match deps.store.find_team(team_id).await {
        Ok(Some(team)) => team.name,
        Ok(None) => "Another team".to_string(),
        Err(e) => {
            warn!(team_id = %team_id, error = %e, "Failed to load team name");
            "Another team".to_string()
        }
    }
}
