//! Shared items related to user account control

mod permissions;
mod responses;
mod role;
mod user;

pub use permissions::{Permission, Permissions};
pub use responses::LoginResult;
pub use role::{AssignedRole, RoleKey, Roles};
pub use user::{DisplayName, UserId, UserProfile, UserStatus, Username};
