//! Hands the aileron channel over between a pilot stick and the
//! stabilizer using a two-way switch, with the motion controller running
//! on its own scheduler thread.

use std::thread;
use std::time::Duration;

use uav_autopilot::types::{
    FlightData, MotionController, Scheduler, SignalNet, TwoWaySwitch,
};

fn main() {
    let net = SignalNet::new();
    let bus = FlightData::new(&net);
    bus.roll_gains.set(2.0, 0.0, 0.5, -10.0, 10.0);
    bus.pitch_gains.set(2.0, 0.0, 0.5, -10.0, 10.0);

    // the stick only reaches the bus while the switch selects output 1
    let switch = TwoWaySwitch::new(&net);
    let stick = switch.input();
    switch.output1().subscribe(&bus.aileron_input);

    let motion = MotionController::new(&bus);
    let stabilizer = motion.switch();

    let mut scheduler = Scheduler::new();
    let task = scheduler.spawn(motion, 50.0);
    println!("spawned '{}' at 50 Hz", task.name());

    // manual flight: stick deflections pass straight through
    stick.set(0.7);
    thread::sleep(Duration::from_millis(100));
    println!(
        "manual    stick {:>5.2}  ->  aileron out {:>5.2}",
        stick.get(),
        bus.aileron_output.get()
    );

    // hand over: disconnect the stick, center the input, stabilize a bank
    switch.toggle();
    bus.aileron_input.set(0.0);
    bus.roll_angle.set(15.0);
    stabilizer.start_stabilizing();
    thread::sleep(Duration::from_millis(200));
    println!(
        "autopilot bank {:>5.1} deg  ->  aileron out {:>5.2}",
        bus.roll_angle.get(),
        bus.aileron_output.get()
    );

    // stick wiggles now go to the disconnected channel only
    stick.set(-1.0);
    thread::sleep(Duration::from_millis(100));
    println!(
        "ignored   stick {:>5.2}  ->  aileron in {:>5.2} (switch open)",
        stick.get(),
        bus.aileron_input.get()
    );

    scheduler.shutdown();
    println!("scheduler stopped");
}
