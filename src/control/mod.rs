pub mod attitude;
pub mod pid;

pub use attitude::{MotionController, StabilizationSwitch};
pub use pid::Pid;
