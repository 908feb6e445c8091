//! Test fixtures for creating test data.
//!
//! The seeding helpers take any `Store`, so the same fixtures back the
//! in-memory workflow tests and the Postgres store tests.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, DurationRound, Utc};
use kickoff_core::common::{ActorContext, TeamId};
use kickoff_core::domains::matches::activities;
use kickoff_core::domains::matches::models::{Match, MatchVariant, NewMatch};
use kickoff_core::domains::teams::models::{Team, TeamMember, TeamRole, User};
use kickoff_core::kernel::test_dependencies::{MockNotificationDispatcher, TestDependencies};
use kickoff_core::kernel::{MemoryStore, ServerDeps, Store};
use uuid::Uuid;

/// A team together with the captain who created it
#[derive(Debug, Clone)]
pub struct TestTeam {
    pub team: Team,
    pub captain: User,
}

impl TestTeam {
    pub fn id(&self) -> TeamId {
        self.team.id
    }
}

pub async fn create_user(store: &dyn Store, name: &str) -> Result<User> {
    let email = format!(
        "{}-{}@kickoff.test",
        name.to_lowercase().replace(' ', "."),
        Uuid::new_v4().simple()
    );
    Ok(store.insert_user(&User::new(name, email)).await?)
}

/// Create a team whose captain is a fresh user named "<team> Captain"
pub async fn create_team(store: &dyn Store, name: &str) -> Result<TestTeam> {
    let captain = create_user(store, &format!("{} Captain", name)).await?;
    let team = store.insert_team(&Team::new(name, Some(captain.id))).await?;
    store
        .upsert_member(&TeamMember::active(team.id, captain.id, TeamRole::Captain))
        .await?;
    Ok(TestTeam { team, captain })
}

pub async fn add_member(store: &dyn Store, team: &TestTeam, name: &str, role: TeamRole) -> Result<User> {
    let user = create_user(store, name).await?;
    store
        .upsert_member(&TeamMember::active(team.id(), user.id, role))
        .await?;
    Ok(user)
}

/// An in-memory world with a recording dispatcher and a fixed clock.
///
/// `now` is truncated to the second so timestamps compare exactly after a
/// round trip through any store.
pub struct TestWorld {
    pub deps: ServerDeps,
    pub store: Arc<MemoryStore>,
    pub dispatcher: Arc<MockNotificationDispatcher>,
    pub now: DateTime<Utc>,
}

impl TestWorld {
    pub fn new() -> Self {
        Self::from_dependencies(TestDependencies::new())
    }

    pub fn from_dependencies(test_deps: TestDependencies) -> Self {
        super::init_tracing();
        let store = test_deps.store.clone();
        let dispatcher = test_deps.dispatcher.clone();
        let now = Utc::now()
            .duration_trunc(Duration::seconds(1))
            .unwrap_or_else(|_| Utc::now());
        Self {
            deps: test_deps.into_deps(),
            store,
            dispatcher,
            now,
        }
    }

    /// `user` acting at the world's clock
    pub fn ctx(&self, user: &User) -> ActorContext {
        ActorContext::new(user.id, self.now)
    }

    pub fn ctx_at(&self, user: &User, now: DateTime<Utc>) -> ActorContext {
        ActorContext::new(user.id, now)
    }

    pub async fn team(&self, name: &str) -> TestTeam {
        create_team(self.store.as_ref(), name)
            .await
            .expect("Failed to create team")
    }

    pub async fn player(&self, team: &TestTeam, name: &str) -> User {
        add_member(self.store.as_ref(), team, name, TeamRole::Player)
            .await
            .expect("Failed to add player")
    }

    pub async fn co_captain(&self, team: &TestTeam, name: &str) -> User {
        add_member(self.store.as_ref(), team, name, TeamRole::CoCaptain)
            .await
            .expect("Failed to add co-captain")
    }

    pub async fn outsider(&self, name: &str) -> User {
        create_user(self.store.as_ref(), name)
            .await
            .expect("Failed to create user")
    }

    /// An open 7-a-side match hosted by `home`, kicking off at `kickoff`
    pub async fn open_match(&self, home: &TestTeam, kickoff: DateTime<Utc>) -> Match {
        let input = NewMatch::builder()
            .home_team_id(home.id())
            .variant(MatchVariant::SevenASide)
            .scheduled_at(kickoff)
            .location("Hackney Marshes, pitch 4")
            .build();
        activities::create_match(input, &self.ctx(&home.captain), &self.deps)
            .await
            .expect("Failed to create match")
            .into_fixture()
    }

    /// A match between `home` and `away`, already confirmed
    pub async fn confirmed_match(&self, home: &TestTeam, away: &TestTeam, kickoff: DateTime<Utc>) -> Match {
        let fixture = self.open_match(home, kickoff).await;
        let request = activities::create_request(fixture.id, away.id(), None, &self.ctx(&away.captain), &self.deps)
            .await
            .expect("Failed to create request");
        let request_id = request.request().map(|r| r.id).expect("request event");
        activities::accept_request(request_id, &self.ctx(&home.captain), &self.deps)
            .await
            .expect("Failed to accept request")
            .into_fixture()
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}
