use nalgebra::Vector2;

use uav_autopilot::nav::geo;
use uav_autopilot::sched::Task;
use uav_autopilot::types::{
    FlightData, MissionController, MissionPlan, MotionController, NavigationMode, SignalNet,
    Waypoint,
};

// ---------------------------------------------------------------------------
// Kinematic plane model
// ---------------------------------------------------------------------------
// Just enough dynamics to close the loop for the demo: bank follows the
// aileron command, course rate follows bank (coordinated turn), position
// integrates the ground speed along the course on a local east/north plane.

const ROLL_AUTHORITY: f64 = 60.0; // deg/s at full aileron
const PITCH_AUTHORITY: f64 = 40.0; // deg/s at full elevator
const PITCH_DRIFT: f64 = 0.6; // deg/s nose-up tendency the stabilizer fights
const CRUISE_SPEED: f64 = 60.0; // km/h
const ACCELERATION: f64 = 3.0; // km/h per second
const METERS_PER_DEGREE: f64 = 111_320.0;

struct SimPlane {
    origin: Waypoint,
    position: Vector2<f64>, // meters east/north of the origin
    course: f64,            // degrees, 0 = north
    speed: f64,             // km/h
    roll: f64,              // degrees, positive = right bank
    pitch: f64,             // degrees, positive = nose up
}

impl SimPlane {
    fn new(origin: Waypoint) -> Self {
        Self {
            origin,
            position: Vector2::zeros(),
            course: 0.0,
            speed: 0.0,
            roll: 0.0,
            pitch: 0.0,
        }
    }

    fn step(&mut self, dt: f64, aileron: f64, elevator: f64) {
        self.roll = (self.roll + aileron * ROLL_AUTHORITY * dt).clamp(-60.0, 60.0);
        self.pitch =
            (self.pitch + (-elevator * PITCH_AUTHORITY + PITCH_DRIFT) * dt).clamp(-30.0, 30.0);

        self.speed = (self.speed + ACCELERATION * dt).min(CRUISE_SPEED);

        let v = self.speed / 3.6;
        if v > 1.0 {
            let turn_rate = (9.81 / v) * self.roll.to_radians().tan(); // rad/s
            self.course = (self.course + turn_rate.to_degrees() * dt).rem_euclid(360.0);
        }

        let heading = self.course.to_radians();
        self.position += Vector2::new(heading.sin(), heading.cos()) * (v * dt);
    }

    fn latitude(&self) -> f64 {
        self.origin.latitude + self.position.y / METERS_PER_DEGREE
    }

    fn longitude(&self) -> f64 {
        self.origin.longitude
            + self.position.x / (METERS_PER_DEGREE * self.origin.latitude.to_radians().cos())
    }

    fn publish(&self, bus: &FlightData) {
        bus.latitude.set(self.latitude());
        bus.longitude.set(self.longitude());
        bus.course_over_ground.set(self.course);
        bus.speed_over_ground.set(self.speed);
        bus.roll_angle.set(self.roll);
        bus.pitch_angle.set(self.pitch);
    }
}

// ---------------------------------------------------------------------------
// Mission flight demo
// ---------------------------------------------------------------------------

fn main() {
    let home = Waypoint::new(47.3769, 8.5417);
    let wp1 = geo::destination_point(home, 0.0, 2000.0);
    let wp2 = geo::destination_point(home, 90.0, 2500.0);
    let wp3 = geo::destination_point(home, 225.0, 1500.0);

    let plan = MissionPlan::builder()
        .home(home.latitude, home.longitude)
        .waypoint(wp1.latitude, wp1.longitude)
        .waypoint(wp2.latitude, wp2.longitude)
        .waypoint(wp3.latitude, wp3.longitude)
        .build();
    let route = plan.waypoints.clone();

    // -----------------------------------------------------------------------
    // Wiring
    // -----------------------------------------------------------------------
    let net = SignalNet::new();
    let bus = FlightData::new(&net);

    bus.roll_gains.set(2.0, 0.05, 1.0, -20.0, 20.0);
    bus.pitch_gains.set(2.0, 0.1, 1.0, -20.0, 20.0);
    bus.course_gains.set(1.0, 0.002, 0.5, -10.0, 10.0);

    let mut motion = MotionController::new(&bus);
    let mut mission = MissionController::new(&bus, plan);
    let stabilizer = motion.switch();
    let autopilot = mission.handle();

    let mut plane = SimPlane::new(home);
    plane.publish(&bus);

    stabilizer.start_stabilizing();
    autopilot.start_mission();

    // -----------------------------------------------------------------------
    // Print mission briefing
    // -----------------------------------------------------------------------
    println!();
    println!("====================================================================");
    println!("  UAV AUTOPILOT — MISSION FLIGHT");
    println!("====================================================================");
    println!();
    println!("  Route");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  HOME      {:>10.5}  {:>10.5}", home.latitude, home.longitude);
    let mut from = home;
    let mut route_km = 0.0;
    for (i, wp) in route.iter().enumerate() {
        let leg = geo::distance_km(from.latitude, from.longitude, wp.latitude, wp.longitude);
        route_km += leg;
        println!(
            "  WP {}      {:>10.5}  {:>10.5}   leg {:>5.2} km",
            i + 1,
            wp.latitude,
            wp.longitude,
            leg
        );
        from = *wp;
    }
    println!();

    // -----------------------------------------------------------------------
    // Fly
    // -----------------------------------------------------------------------
    let dt = 0.1;
    let max_time = 1200.0;
    let mut time = 0.0;
    let mut step: u64 = 0;
    let mut flown_km = 0.0;
    let mut max_bank = 0.0_f64;
    let mut holding_since = None;
    let mut samples = Vec::new();
    let mut last_waypoint = bus.current_waypoint_index.get();

    println!("  Flight Events");
    println!("  ──────────────────────────────────────────────────────────────────");

    while time < max_time {
        plane.publish(&bus);
        mission.tick(dt);
        motion.tick(dt);

        let aileron = bus.aileron_output.get();
        let elevator = bus.elevator_output.get();
        plane.step(dt, aileron, elevator);

        time += dt;
        step += 1;
        flown_km += plane.speed / 3.6 * dt / 1000.0;
        max_bank = max_bank.max(plane.roll.abs());

        let waypoint = bus.current_waypoint_index.get();
        if waypoint != last_waypoint && autopilot.mode() == NavigationMode::Navigate {
            println!(
                "  WAYPOINT  t={:>6.1}s   flying to WP {}   flown {:>5.2} km",
                time, waypoint as i64, flown_km
            );
            last_waypoint = waypoint;
        }
        if holding_since.is_none() && autopilot.mode() == NavigationMode::CircleHome {
            println!(
                "  HOLDING   t={:>6.1}s   route complete, circling home   flown {:>5.2} km",
                time, flown_km
            );
            holding_since = Some(time);
        }

        if step % 150 == 0 {
            samples.push((
                time,
                plane.latitude(),
                plane.longitude(),
                plane.course,
                bus.target_course.get(),
                plane.roll,
                waypoint as i64,
            ));
        }

        // let the holding pattern run for two minutes, then call it a day
        if let Some(entered) = holding_since {
            if time - entered > 120.0 {
                break;
            }
        }
    }
    println!();

    // -----------------------------------------------------------------------
    // Trajectory table (sampled)
    // -----------------------------------------------------------------------
    println!("  Trajectory");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:>7}  {:>10}  {:>10}  {:>7}  {:>7}  {:>7}  {:>3}",
        "t (s)", "lat", "lon", "course", "target", "roll", "wp"
    );
    println!("  {}", "─".repeat(62));
    for (t, lat, lon, course, target, roll, wp) in &samples {
        println!(
            "  {:>7.1}  {:>10.5}  {:>10.5}  {:>7.1}  {:>7.1}  {:>7.1}  {:>3}",
            t, lat, lon, course, target, roll, wp
        );
    }
    println!();

    // -----------------------------------------------------------------------
    // Summary
    // -----------------------------------------------------------------------
    let home_distance =
        geo::distance_meters(plane.latitude(), plane.longitude(), home.latitude, home.longitude);
    println!("  Summary");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  Route length:    {:>7.2} km", route_km);
    println!("  Distance flown:  {:>7.2} km", flown_km);
    match holding_since {
        Some(t) => println!("  Route complete:  {:>7.1} s", t),
        None => println!("  Route complete:        — (time limit hit)"),
    }
    println!("  Max bank angle:  {:>7.1} deg", max_bank);
    println!("  Distance home:   {:>7.0} m", home_distance);
    println!("  Ticks: {} at dt={} s", step, dt);
    println!("====================================================================");
    println!();
}
