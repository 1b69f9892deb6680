// ---------------------------------------------------------------------------
// Mission data model
// ---------------------------------------------------------------------------

/// A navigation fix: latitude/longitude in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl Waypoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Turn direction while holding over a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircleDirection {
    Clockwise,
    Anticlockwise,
}

impl CircleDirection {
    /// Sign applied to the angular advance along the holding circle.
    pub fn sign(self) -> f64 {
        match self {
            CircleDirection::Clockwise => 1.0,
            CircleDirection::Anticlockwise => -1.0,
        }
    }
}

/// What the navigation loop does once every waypoint has been consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionCompletedAction {
    /// Enter a holding circle around the home point.
    CircleAtHome,
    /// Reset the waypoint index and fly the route again.
    RestartMission,
}

// ---------------------------------------------------------------------------
// Mission plan
// ---------------------------------------------------------------------------

/// Route and guidance parameters for one mission.
///
/// Waypoints are immutable once added; everything else may be adjusted
/// while the mission runs. A target radius of 0 means a waypoint only
/// counts as reached on an exact hit; a negative one never advances.
/// Neither is an error.
#[derive(Debug, Clone)]
pub struct MissionPlan {
    pub waypoints: Vec<Waypoint>,
    pub home: Waypoint,
    /// Distance within which a waypoint counts as reached, meters.
    pub target_radius: f64,
    /// Radius of the holding circle around home, meters.
    pub circling_radius: f64,
    pub circling_direction: CircleDirection,
    /// Bank angle limit used when converting course error, degrees.
    pub maximum_roll_angle: f64,
    /// Below this ground speed the guidance output is frozen, km/h.
    pub minimum_speed: f64,
    pub completed_action: MissionCompletedAction,
}

impl Default for MissionPlan {
    fn default() -> Self {
        Self {
            waypoints: Vec::new(),
            home: Waypoint::new(0.0, 0.0),
            target_radius: 200.0,
            circling_radius: 300.0,
            circling_direction: CircleDirection::Clockwise,
            maximum_roll_angle: 40.0,
            minimum_speed: 1.0,
            completed_action: MissionCompletedAction::CircleAtHome,
        }
    }
}

impl MissionPlan {
    pub fn builder() -> MissionPlanBuilder {
        MissionPlanBuilder {
            plan: MissionPlan::default(),
        }
    }
}

/// Builder for [`MissionPlan`].
pub struct MissionPlanBuilder {
    plan: MissionPlan,
}

impl MissionPlanBuilder {
    pub fn home(mut self, latitude: f64, longitude: f64) -> Self {
        self.plan.home = Waypoint::new(latitude, longitude);
        self
    }

    pub fn waypoint(mut self, latitude: f64, longitude: f64) -> Self {
        self.plan.waypoints.push(Waypoint::new(latitude, longitude));
        self
    }

    pub fn target_radius(mut self, meters: f64) -> Self {
        self.plan.target_radius = meters;
        self
    }

    pub fn circling_radius(mut self, meters: f64) -> Self {
        self.plan.circling_radius = meters;
        self
    }

    pub fn circling_direction(mut self, direction: CircleDirection) -> Self {
        self.plan.circling_direction = direction;
        self
    }

    pub fn maximum_roll_angle(mut self, degrees: f64) -> Self {
        self.plan.maximum_roll_angle = degrees;
        self
    }

    pub fn minimum_speed(mut self, kmh: f64) -> Self {
        self.plan.minimum_speed = kmh;
        self
    }

    pub fn completed_action(mut self, action: MissionCompletedAction) -> Self {
        self.plan.completed_action = action;
        self
    }

    pub fn build(self) -> MissionPlan {
        self.plan
    }
}
