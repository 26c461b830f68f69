pub mod location;
pub mod ping;
pub mod seed;
pub mod user;
