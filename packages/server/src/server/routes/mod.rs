// HTTP routes
pub mod availability;
pub mod health;
pub mod matches;
pub mod notifications;
pub mod requests;

pub use availability::*;
pub use health::*;
pub use matches::*;
pub use notifications::*;
pub use requests::*;
