pub mod location_service;
pub mod location_tree;
pub mod menu;
pub mod seeder;
pub mod user_service;

pub use location_service::{LocationDetail, LocationError, LocationService};
pub use location_tree::{LocationNode, LocationTree};
pub use menu::{build_menu, MenuItem, MAX_MENU_DEPTH};
pub use seeder::{SeedReport, Seeder};
pub use user_service::{UserError, UserService};
