pub mod geo;
pub mod mission;
pub mod waypoint;

pub use mission::{MissionController, MissionHandle, NavigationMode};
pub use waypoint::{CircleDirection, MissionCompletedAction, MissionPlan, Waypoint};
