//! Flies a two-waypoint patrol with the restart policy and writes the
//! flight log to `flight_log.csv`.
//!
//! The vehicle here is deliberately crude — it turns directly at the rate
//! the roll-angle preset asks for — so the run shows the navigation loop
//! in isolation from attitude dynamics.

use uav_autopilot::io::csv::{write_log_file, LogRecord};
use uav_autopilot::nav::geo;
use uav_autopilot::sched::Task;
use uav_autopilot::types::{
    CircleDirection, FlightData, MissionCompletedAction, MissionController, MissionPlan,
    SignalNet, Waypoint,
};

fn main() {
    let home = Waypoint::new(46.5197, 6.6323);
    let north = geo::destination_point(home, 0.0, 1500.0);
    let east = geo::destination_point(home, 90.0, 1500.0);

    let plan = MissionPlan::builder()
        .home(home.latitude, home.longitude)
        .waypoint(north.latitude, north.longitude)
        .waypoint(east.latitude, east.longitude)
        .circling_direction(CircleDirection::Anticlockwise)
        .completed_action(MissionCompletedAction::RestartMission)
        .build();

    let net = SignalNet::new();
    let bus = FlightData::new(&net);
    bus.course_gains.set(1.0, 0.0, 0.2, -10.0, 10.0);

    let mut mission = MissionController::new(&bus, plan);
    let autopilot = mission.handle();

    // toy vehicle: constant speed, turns at the rate the preset commands
    let speed = 54.0; // km/h
    let mut position = home;
    let mut course = 0.0_f64;

    bus.speed_over_ground.set(speed);
    autopilot.start_mission();

    let dt = 0.2;
    let mut records = Vec::new();
    let mut laps = 0;
    let mut last_waypoint = 0.0;

    for step in 0..9000 {
        let time = step as f64 * dt;
        bus.latitude.set(position.latitude);
        bus.longitude.set(position.longitude);
        bus.course_over_ground.set(course);

        mission.tick(dt);

        // undo the preset negation: a positive tilt banks into a right turn
        let turn_rate = -bus.roll_angle_preset.get() * 0.5; // deg/s
        course = (course + turn_rate * dt).rem_euclid(360.0);
        position = geo::destination_point(position, course, speed / 3.6 * dt);

        let waypoint = bus.current_waypoint_index.get();
        if waypoint == 1.0 && last_waypoint != 1.0 && time > 0.0 {
            laps += 1;
            println!("t={:>6.1}s  route restarted ({laps})", time);
            if laps == 3 {
                break;
            }
        }
        last_waypoint = waypoint;

        if step % 5 == 0 {
            records.push(LogRecord::sample(time, &bus));
        }
    }

    autopilot.stop_mission();

    match write_log_file("flight_log.csv", &records) {
        Ok(()) => println!("{} samples written to flight_log.csv", records.len()),
        Err(e) => eprintln!("could not write flight_log.csv: {e}"),
    }
}
