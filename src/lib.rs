pub mod bus;
pub mod control;
pub mod io;
pub mod nav;
pub mod sched;
pub mod signal;

// Flat re-exports for the common wiring path
pub mod types {
    pub use crate::bus::{FlightData, GainSignals};
    pub use crate::control::attitude::{MotionController, StabilizationSwitch};
    pub use crate::control::pid::Pid;
    pub use crate::nav::mission::{MissionController, MissionHandle, NavigationMode};
    pub use crate::nav::waypoint::{
        CircleDirection, MissionCompletedAction, MissionPlan, Waypoint,
    };
    pub use crate::sched::{Scheduler, Task, TaskHandle};
    pub use crate::signal::{Signal, SignalNet, TwoWaySwitch};
}
