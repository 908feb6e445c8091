pub mod team;
pub mod team_member;
pub mod user;

pub use team::Team;
pub use team_member::{MembershipStatus, TeamMember, TeamRole};
pub use user::User;
