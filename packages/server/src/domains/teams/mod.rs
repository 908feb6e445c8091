//! Teams domain - the membership and role facts that gate match actions
//!
//! Team and profile management is handled elsewhere; this domain only reads
//! who belongs to a team and in which role.

pub mod models;

pub use models::{MembershipStatus, Team, TeamMember, TeamRole, User};
