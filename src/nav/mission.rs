use std::f64::consts::PI;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::bus::{FlightData, GainSignals};
use crate::control::pid::Pid;
use crate::sched::Task;
use crate::signal::Signal;

use super::geo;
use super::waypoint::{CircleDirection, MissionCompletedAction, MissionPlan};

// ---------------------------------------------------------------------------
// Navigation state machine
// ---------------------------------------------------------------------------

/// Default tick rate of the mission controller, Hz.
pub const DEFAULT_UPDATE_FREQUENCY: f64 = 10.0;

/// How far ahead the holding-circle target point is projected, seconds.
const LOOKAHEAD_SECONDS: f64 = 1.0;

/// Mode of the navigation loop.
///
/// `RestartMission` is transient: the next navigation tick consumes it at
/// the top — reset the waypoint index, re-enter `Navigate` — and then
/// navigates in that same tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMode {
    Idle,
    Navigate,
    CircleHome,
    RestartMission,
}

struct NavState {
    mode: NavigationMode,
    current_waypoint_index: usize,
}

struct Shared {
    plan: Mutex<MissionPlan>,
    state: Mutex<NavState>,
}

impl Shared {
    fn plan(&self) -> MutexGuard<'_, MissionPlan> {
        self.plan.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn state(&self) -> MutexGuard<'_, NavState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Mission handle
// ---------------------------------------------------------------------------

/// Cloneable control surface of the mission controller: mode switching and
/// live plan edits while the scheduler owns the loop.
#[derive(Clone)]
pub struct MissionHandle {
    shared: Arc<Shared>,
    pitch_angle_preset: Signal,
    roll_angle_preset: Signal,
    current_waypoint_index: Signal,
}

impl MissionHandle {
    /// Begin the mission at the first waypoint.
    pub fn start_mission(&self) {
        let mut state = self.shared.state();
        state.current_waypoint_index = 0;
        state.mode = NavigationMode::Navigate;
        self.current_waypoint_index.set(1.0);
    }

    /// Stop navigating and release the attitude presets.
    pub fn stop_mission(&self) {
        let mut state = self.shared.state();
        state.current_waypoint_index = 0;
        state.mode = NavigationMode::Idle;
        self.pitch_angle_preset.set(0.0);
        self.roll_angle_preset.set(0.0);
        self.current_waypoint_index.set(0.0);
    }

    /// Abandon the route and hold over the home point.
    pub fn go_home(&self) {
        let mut state = self.shared.state();
        state.current_waypoint_index = 0;
        state.mode = NavigationMode::CircleHome;
        self.current_waypoint_index.set(0.0);
    }

    /// Append a waypoint to the route. Waypoints themselves are immutable.
    pub fn add_waypoint(&self, latitude: f64, longitude: f64) {
        self.shared
            .plan()
            .waypoints
            .push(super::waypoint::Waypoint::new(latitude, longitude));
    }

    pub fn set_home(&self, latitude: f64, longitude: f64) {
        self.shared.plan().home = super::waypoint::Waypoint::new(latitude, longitude);
    }

    pub fn set_target_radius(&self, meters: f64) {
        self.shared.plan().target_radius = meters;
    }

    pub fn set_circling_radius(&self, meters: f64) {
        self.shared.plan().circling_radius = meters;
    }

    pub fn set_circling_direction(&self, direction: CircleDirection) {
        self.shared.plan().circling_direction = direction;
    }

    pub fn set_maximum_roll_angle(&self, degrees: f64) {
        self.shared.plan().maximum_roll_angle = degrees;
    }

    pub fn set_minimum_speed(&self, kmh: f64) {
        self.shared.plan().minimum_speed = kmh;
    }

    pub fn set_completed_action(&self, action: MissionCompletedAction) {
        self.shared.plan().completed_action = action;
    }

    pub fn mode(&self) -> NavigationMode {
        self.shared.state().mode
    }

    /// 0-based index of the waypoint currently being flown to.
    pub fn current_waypoint(&self) -> usize {
        self.shared.state().current_waypoint_index
    }
}

// ---------------------------------------------------------------------------
// Mission controller
// ---------------------------------------------------------------------------

/// Periodic task guiding the vehicle along the waypoint route, or around
/// the home point, by turning course error into a roll-angle preset for
/// the attitude stabilizer.
pub struct MissionController {
    shared: Arc<Shared>,
    pid_course: Pid,

    latitude: Signal,
    longitude: Signal,
    course_over_ground: Signal,
    speed_over_ground: Signal,
    target_course: Signal,
    pitch_angle_preset: Signal,
    roll_angle_preset: Signal,
    current_waypoint_index: Signal,
    course_gains: GainSignals,
}

impl MissionController {
    /// Bind a controller to the bus with the given plan. Starts idle.
    pub fn new(bus: &FlightData, plan: MissionPlan) -> Self {
        Self {
            shared: Arc::new(Shared {
                plan: Mutex::new(plan),
                state: Mutex::new(NavState {
                    mode: NavigationMode::Idle,
                    current_waypoint_index: 0,
                }),
            }),
            pid_course: Pid::default(),

            latitude: bus.latitude.clone(),
            longitude: bus.longitude.clone(),
            course_over_ground: bus.course_over_ground.clone(),
            speed_over_ground: bus.speed_over_ground.clone(),
            target_course: bus.target_course.clone(),
            pitch_angle_preset: bus.pitch_angle_preset.clone(),
            roll_angle_preset: bus.roll_angle_preset.clone(),
            current_waypoint_index: bus.current_waypoint_index.clone(),
            course_gains: bus.course_gains.clone(),
        }
    }

    /// Handle for driving the mission from other threads.
    pub fn handle(&self) -> MissionHandle {
        MissionHandle {
            shared: Arc::clone(&self.shared),
            pitch_angle_preset: self.pitch_angle_preset.clone(),
            roll_angle_preset: self.roll_angle_preset.clone(),
            current_waypoint_index: self.current_waypoint_index.clone(),
        }
    }

    /// Navigation phase: pick the target course for this tick.
    fn update_navigation(&mut self) {
        let mut state = self.shared.state();
        if state.mode == NavigationMode::RestartMission {
            state.current_waypoint_index = 0;
            state.mode = NavigationMode::Navigate;
        }

        let plan = self.shared.plan().clone();
        let latitude = self.latitude.get();
        let longitude = self.longitude.get();

        // by default the target course is the current course
        let mut course = self.course_over_ground.get();

        match state.mode {
            NavigationMode::Navigate => {
                if !plan.waypoints.is_empty() {
                    let waypoint = plan.waypoints[state.current_waypoint_index];
                    let distance = geo::distance_meters(
                        latitude,
                        longitude,
                        waypoint.latitude,
                        waypoint.longitude,
                    );
                    if distance <= plan.target_radius {
                        state.current_waypoint_index += 1;
                    }
                    if state.current_waypoint_index < plan.waypoints.len() {
                        let waypoint = plan.waypoints[state.current_waypoint_index];
                        course = geo::course_degrees(
                            latitude,
                            longitude,
                            waypoint.latitude,
                            waypoint.longitude,
                        );
                    } else {
                        // route consumed
                        state.mode = match plan.completed_action {
                            MissionCompletedAction::CircleAtHome => NavigationMode::CircleHome,
                            MissionCompletedAction::RestartMission => {
                                NavigationMode::RestartMission
                            }
                        };
                    }
                    self.current_waypoint_index
                        .set((state.current_waypoint_index + 1) as f64);
                }
                // an empty route holds the current course; not an error
            }
            NavigationMode::CircleHome => {
                // steer toward a point one second ahead on the holding
                // circle: bearing from home to the vehicle, advanced by the
                // angular velocity the current ground speed produces
                if plan.circling_radius > 0.0 {
                    let angular_velocity =
                        self.speed_over_ground.get() / plan.circling_radius;
                    let alpha = geo::course_radians(
                        latitude,
                        longitude,
                        plan.home.latitude,
                        plan.home.longitude,
                    ) + PI;
                    let ahead = alpha
                        + angular_velocity * LOOKAHEAD_SECONDS * plan.circling_direction.sign();
                    let destination =
                        geo::destination_point(plan.home, ahead.to_degrees(), plan.circling_radius);
                    course = geo::course_degrees(
                        latitude,
                        longitude,
                        destination.latitude,
                        destination.longitude,
                    );
                }
            }
            NavigationMode::Idle | NavigationMode::RestartMission => {}
        }

        self.target_course.set(course);
    }

    /// Guidance phase: turn course error into a roll-angle preset.
    fn update_guidance(&mut self) {
        if self.shared.state().mode == NavigationMode::Idle {
            return;
        }
        let plan = self.shared.plan().clone();

        // below the minimum speed the course data is too noisy to act on
        if self.speed_over_ground.get() > plan.minimum_speed {
            self.course_gains.load_into(&mut self.pid_course);

            let course_error = geo::course_error_degrees(
                self.target_course.get(),
                self.course_over_ground.get(),
            );

            // map the error linearly onto the allowed bank range, then
            // refine through the course PID
            let tilt = plan.maximum_roll_angle * course_error / 180.0;
            let tilt = self
                .pid_course
                .update(tilt)
                .max(-plan.maximum_roll_angle)
                .min(plan.maximum_roll_angle);
            self.roll_angle_preset.set(-tilt);
        }
    }
}

impl Task for MissionController {
    fn name(&self) -> &str {
        "mission-controller"
    }

    fn tick(&mut self, _dt: f64) {
        self.update_navigation();
        self.update_guidance();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::waypoint::Waypoint;
    use crate::signal::SignalNet;

    const HOME: Waypoint = Waypoint {
        latitude: 47.0,
        longitude: 8.0,
    };

    /// A waypoint a given distance north of home.
    fn north_of_home(meters: f64) -> Waypoint {
        geo::destination_point(HOME, 0.0, meters)
    }

    fn setup(plan: MissionPlan) -> (FlightData, MissionController, MissionHandle) {
        let net = SignalNet::new();
        let bus = FlightData::new(&net);
        bus.latitude.set(HOME.latitude);
        bus.longitude.set(HOME.longitude);
        let controller = MissionController::new(&bus, plan);
        let handle = controller.handle();
        (bus, controller, handle)
    }

    #[test]
    fn waypoint_advances_inside_target_radius() {
        let near = north_of_home(150.0);
        let far = north_of_home(5000.0);
        let plan = MissionPlan::builder()
            .home(HOME.latitude, HOME.longitude)
            .waypoint(near.latitude, near.longitude)
            .waypoint(far.latitude, far.longitude)
            .build();
        let (bus, mut controller, handle) = setup(plan);

        handle.start_mission();
        assert_eq!(bus.current_waypoint_index.get(), 1.0);
        controller.tick(0.1);

        assert_eq!(handle.current_waypoint(), 1, "150 m < 200 m radius: advance");
        assert_eq!(bus.current_waypoint_index.get(), 2.0);
        // new target course points at the far waypoint, due north
        assert!(bus.target_course.get() < 1.0 || bus.target_course.get() > 359.0);
    }

    #[test]
    fn waypoint_holds_outside_target_radius() {
        let wp = north_of_home(250.0);
        let plan = MissionPlan::builder()
            .home(HOME.latitude, HOME.longitude)
            .waypoint(wp.latitude, wp.longitude)
            .build();
        let (bus, mut controller, handle) = setup(plan);

        handle.start_mission();
        controller.tick(0.1);

        assert_eq!(handle.current_waypoint(), 0, "250 m > 200 m radius: hold");
        assert_eq!(bus.current_waypoint_index.get(), 1.0);
    }

    #[test]
    fn completed_mission_circles_at_home() {
        let wp = north_of_home(50.0);
        let plan = MissionPlan::builder()
            .home(HOME.latitude, HOME.longitude)
            .waypoint(wp.latitude, wp.longitude)
            .completed_action(MissionCompletedAction::CircleAtHome)
            .build();
        let (_bus, mut controller, handle) = setup(plan);

        handle.start_mission();
        controller.tick(0.1);

        assert_eq!(handle.mode(), NavigationMode::CircleHome);
    }

    #[test]
    fn completed_mission_restarts_and_reenters_navigate() {
        let wp = north_of_home(50.0);
        let far = north_of_home(5000.0);
        let plan = MissionPlan::builder()
            .home(HOME.latitude, HOME.longitude)
            .waypoint(wp.latitude, wp.longitude)
            .completed_action(MissionCompletedAction::RestartMission)
            .build();
        let (bus, mut controller, handle) = setup(plan);

        handle.start_mission();
        controller.tick(0.1);
        assert_eq!(handle.mode(), NavigationMode::RestartMission);

        // move out of the target radius so the restarted route is live
        bus.latitude.set(far.latitude);
        bus.longitude.set(far.longitude);
        controller.tick(0.1);
        assert_eq!(handle.mode(), NavigationMode::Navigate);
        assert_eq!(handle.current_waypoint(), 0);
        // restarted and navigating again in the same tick, due south now
        assert!((bus.target_course.get() - 180.0).abs() < 1.0);
    }

    #[test]
    fn empty_route_holds_the_current_course() {
        let plan = MissionPlan::builder()
            .home(HOME.latitude, HOME.longitude)
            .build();
        let (bus, mut controller, handle) = setup(plan);

        bus.course_over_ground.set(123.0);
        handle.start_mission();
        controller.tick(0.1);

        assert_eq!(handle.mode(), NavigationMode::Navigate);
        assert_eq!(bus.target_course.get(), 123.0);
    }

    #[test]
    fn idle_mirrors_the_current_course_and_skips_guidance() {
        let plan = MissionPlan::default();
        let (bus, mut controller, _handle) = setup(plan);

        bus.course_over_ground.set(77.0);
        bus.speed_over_ground.set(50.0);
        bus.course_gains.set(1.0, 0.0, 0.0, -5.0, 5.0);
        controller.tick(0.1);

        assert_eq!(bus.target_course.get(), 77.0);
        assert_eq!(bus.roll_angle_preset.get(), 0.0);
    }

    #[test]
    fn guidance_requires_minimum_speed() {
        let far = north_of_home(5000.0);
        let plan = MissionPlan::builder()
            .home(HOME.latitude, HOME.longitude)
            .waypoint(far.latitude, far.longitude)
            .build();
        let (bus, mut controller, handle) = setup(plan);

        bus.course_gains.set(1.0, 0.0, 0.0, -5.0, 5.0);
        bus.course_over_ground.set(90.0);
        bus.speed_over_ground.set(0.5); // below the 1 km/h default
        handle.start_mission();
        controller.tick(0.1);
        assert_eq!(bus.roll_angle_preset.get(), 0.0, "too slow, no correction");

        bus.speed_over_ground.set(25.0);
        controller.tick(0.1);
        assert!(bus.roll_angle_preset.get() != 0.0);
    }

    #[test]
    fn guidance_banks_against_the_course_error() {
        let far = north_of_home(5000.0);
        let plan = MissionPlan::builder()
            .home(HOME.latitude, HOME.longitude)
            .waypoint(far.latitude, far.longitude)
            .build();
        let (bus, mut controller, handle) = setup(plan);

        bus.course_gains.set(1.0, 0.0, 0.0, -5.0, 5.0);
        bus.speed_over_ground.set(25.0);
        bus.course_over_ground.set(90.0); // target is ~0 (due north)
        handle.start_mission();
        controller.tick(0.1);

        // error -90 deg -> tilt = 40 * -90 / 180 = -20 -> preset = +20
        assert!((bus.roll_angle_preset.get() - 20.0).abs() < 0.2);
    }

    #[test]
    fn guidance_wraps_course_error_to_the_shorter_turn() {
        let plan = MissionPlan::default();
        let (bus, mut controller, handle) = setup(plan);

        bus.course_gains.set(1.0, 0.0, 0.0, -5.0, 5.0);
        bus.speed_over_ground.set(25.0);
        bus.course_over_ground.set(10.0);
        handle.go_home();
        // pin the target across the 360 boundary
        bus.target_course.set(350.0);
        bus.course_over_ground.set(10.0);
        controller.update_guidance();

        // wrapped error -20 -> tilt = 40 * -20 / 180 = -4.444 -> preset +4.444
        assert!((bus.roll_angle_preset.get() - 4.444).abs() < 0.01);
    }

    #[test]
    fn circling_clockwise_heads_around_the_circle() {
        let plan = MissionPlan::builder()
            .home(HOME.latitude, HOME.longitude)
            .build();
        let (bus, mut controller, handle) = setup(plan);

        // vehicle sits on the circle, due north of home
        let on_circle = north_of_home(300.0);
        bus.latitude.set(on_circle.latitude);
        bus.longitude.set(on_circle.longitude);
        bus.speed_over_ground.set(30.0);
        handle.go_home();
        controller.tick(0.1);

        // clockwise holding north of home means flying roughly east
        let course = bus.target_course.get();
        assert!((60.0..120.0).contains(&course), "got {course}");
    }

    #[test]
    fn circling_anticlockwise_reverses_the_direction() {
        let plan = MissionPlan::builder()
            .home(HOME.latitude, HOME.longitude)
            .circling_direction(CircleDirection::Anticlockwise)
            .build();
        let (bus, mut controller, handle) = setup(plan);

        let on_circle = north_of_home(300.0);
        bus.latitude.set(on_circle.latitude);
        bus.longitude.set(on_circle.longitude);
        bus.speed_over_ground.set(30.0);
        handle.go_home();
        controller.tick(0.1);

        let course = bus.target_course.get();
        assert!((240.0..300.0).contains(&course), "got {course}");
    }

    #[test]
    fn zero_circling_radius_holds_the_course() {
        let plan = MissionPlan::builder()
            .home(HOME.latitude, HOME.longitude)
            .circling_radius(0.0)
            .build();
        let (bus, mut controller, handle) = setup(plan);

        bus.course_over_ground.set(42.0);
        handle.go_home();
        controller.tick(0.1);

        assert_eq!(bus.target_course.get(), 42.0, "no circle geometry, no turn");
    }

    #[test]
    fn stop_mission_releases_the_presets() {
        let wp = north_of_home(5000.0);
        let plan = MissionPlan::builder()
            .home(HOME.latitude, HOME.longitude)
            .waypoint(wp.latitude, wp.longitude)
            .build();
        let (bus, mut controller, handle) = setup(plan);

        bus.course_gains.set(1.0, 0.0, 0.0, -5.0, 5.0);
        bus.speed_over_ground.set(25.0);
        bus.course_over_ground.set(90.0);
        handle.start_mission();
        controller.tick(0.1);
        assert!(bus.roll_angle_preset.get() != 0.0);

        handle.stop_mission();
        assert_eq!(handle.mode(), NavigationMode::Idle);
        assert_eq!(bus.roll_angle_preset.get(), 0.0);
        assert_eq!(bus.pitch_angle_preset.get(), 0.0);
        assert_eq!(bus.current_waypoint_index.get(), 0.0);
    }

    #[test]
    fn waypoints_can_be_added_while_running() {
        let plan = MissionPlan::builder()
            .home(HOME.latitude, HOME.longitude)
            .build();
        let (bus, mut controller, handle) = setup(plan);

        handle.start_mission();
        controller.tick(0.1);
        assert_eq!(bus.target_course.get(), 0.0, "empty route, course holds");

        let wp = north_of_home(5000.0);
        handle.add_waypoint(wp.latitude, wp.longitude);
        controller.tick(0.1);
        assert!(bus.target_course.get() < 1.0 || bus.target_course.get() > 359.0);
    }
}
