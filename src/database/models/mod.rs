pub mod application;
pub mod lifecycle;
pub mod location;
pub mod role;
pub mod user;

pub use application::{Application, NewApplication};
pub use lifecycle::Lifecycle;
pub use location::{Location, LocationPatch, LocationQuery, NewLocation};
pub use role::Role;
pub use user::{NewUser, User};

pub type LocationId = i32;
pub type ApplicationId = i32;
pub type RoleId = i32;
pub type UserId = i32;
pub type CompanyId = i32;
