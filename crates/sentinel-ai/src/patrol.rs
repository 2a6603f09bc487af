//! Waypoint patrols for passive agents.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use sentinel_common::{horizontal_distance, ring_point};
use tracing::{debug, warn};

use crate::agent::{AgentState, BehaviorState};
use crate::movement::MoveIntent;

/// What happens after the last waypoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatrolBehavior {
    /// Wrap back to the first waypoint
    #[default]
    Loop,
    /// Stop at the last waypoint
    Once,
    /// Advances like [`PatrolBehavior::Loop`]; no reversal
    PingPong,
}

/// One waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatrolPoint {
    /// World position
    pub position: Vec3,
    /// Per-point dwell from a 4-element record; stored, not used for timing
    pub dwell: Option<f32>,
}

impl PatrolPoint {
    /// Creates a point without its own dwell.
    #[must_use]
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            dwell: None,
        }
    }

    /// Parses an `[x, y, z]` or `[x, y, z, wait]` record.
    ///
    /// A bad `wait` is discarded; the position is kept.
    #[must_use]
    pub fn from_record(record: &[f32]) -> Option<Self> {
        let (&[x, y, z], wait) = (record.get(..3)?, record.get(3..)?) else {
            return None;
        };
        if ![x, y, z].iter().all(|v| v.is_finite()) {
            return None;
        }
        let dwell = match *wait {
            [] => None,
            [wait] if wait.is_finite() && wait >= 0.0 => Some(wait),
            [wait] => {
                warn!("Ignoring invalid patrol wait {wait}");
                None
            },
            _ => return None,
        };
        Some(Self {
            position: Vec3::new(x, y, z),
            dwell,
        })
    }
}

/// Parses waypoint records, dropping malformed ones.
///
/// If nothing usable remains, generates a ring of `ring_count` points with
/// `ring_radius` around `origin`.
#[must_use]
pub fn normalize_patrol_points(
    records: &[Vec<f32>],
    origin: Vec3,
    ring_radius: f32,
    ring_count: usize,
) -> Vec<PatrolPoint> {
    let mut points = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        match PatrolPoint::from_record(record) {
            Some(point) => points.push(point),
            None => warn!("Dropping malformed patrol point #{i}: {record:?}"),
        }
    }

    if points.is_empty() {
        let count = ring_count.max(2);
        debug!("No usable patrol points, generating a {count}-point ring");
        points = (0..count)
            .map(|i| PatrolPoint::new(ring_point(origin, ring_radius, i, count)))
            .collect();
    }
    points
}

/// Capability of walking a patrol route.
pub trait Patroller {
    /// Advances the patrol and returns this tick's movement.
    ///
    /// `target` is the position of a detectable target, if any.
    fn patrol(&mut self, state: &mut AgentState, position: Vec3, target: Option<Vec3>) -> MoveIntent;
}

/// Idle/moving waypoint cycle.
#[derive(Debug, Clone)]
pub struct PatrolController {
    points: Vec<PatrolPoint>,
    index: usize,
    behavior: PatrolBehavior,
    dwell_time: f32,
    arrival_threshold: f32,
    finished: bool,
    notice_range: Option<f32>,
    noticing: bool,
}

impl PatrolController {
    /// Creates a controller. `points` must not be empty; see [`normalize_patrol_points`].
    #[must_use]
    pub fn new(
        points: Vec<PatrolPoint>,
        behavior: PatrolBehavior,
        dwell_time: f32,
        arrival_threshold: f32,
    ) -> Self {
        Self {
            points,
            index: 0,
            behavior,
            dwell_time: dwell_time.max(0.0),
            arrival_threshold: arrival_threshold.max(0.0),
            finished: false,
            notice_range: None,
            noticing: false,
        }
    }

    /// Halts and watches targets within `range`.
    #[must_use]
    pub fn with_notice_range(mut self, range: Option<f32>) -> Self {
        self.notice_range = range.filter(|r| *r > 0.0);
        self
    }

    /// Current waypoint index.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Waypoints.
    #[must_use]
    pub fn points(&self) -> &[PatrolPoint] {
        &self.points
    }

    /// Seconds spent at each waypoint.
    #[must_use]
    pub fn dwell_time(&self) -> f32 {
        self.dwell_time
    }

    /// Whether a `once` patrol has reached its last point.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether the agent is currently halted watching a target.
    #[must_use]
    pub fn is_noticing(&self) -> bool {
        self.noticing
    }

    /// Current waypoint position.
    #[must_use]
    pub fn current_point(&self) -> Option<Vec3> {
        if self.points.is_empty() {
            return None;
        }
        Some(self.points[self.index % self.points.len()].position)
    }

    fn advance(&mut self) {
        let len = self.points.len();
        if len == 0 {
            return;
        }
        match self.behavior {
            PatrolBehavior::Loop | PatrolBehavior::PingPong => {
                self.index = (self.index + 1) % len;
            },
            PatrolBehavior::Once => {
                if self.index + 1 >= len {
                    self.finished = true;
                } else {
                    self.index += 1;
                }
            },
        }
    }

    fn walk(&self, state: &AgentState, position: Vec3) -> MoveIntent {
        match self.current_point() {
            Some(point) => MoveIntent::toward(position, point, state.tunables.move_speed),
            None => MoveIntent::STOP,
        }
    }
}

impl Patroller for PatrolController {
    fn patrol(&mut self, state: &mut AgentState, position: Vec3, target: Option<Vec3>) -> MoveIntent {
        if let Some(range) = self.notice_range {
            let seen = target.filter(|t| horizontal_distance(position, *t) <= range);
            match (seen, self.noticing) {
                (Some(t), _) => {
                    if !self.noticing {
                        self.noticing = true;
                        state.set_behavior(BehaviorState::Idle);
                        debug!("{} noticed the target", state.id);
                    }
                    return MoveIntent::face_toward(position, t);
                },
                (None, true) => {
                    self.noticing = false;
                    if !self.finished {
                        state.set_behavior(BehaviorState::Moving);
                    }
                },
                (None, false) => {},
            }
        }

        if self.finished || self.points.is_empty() {
            state.set_behavior(BehaviorState::Idle);
            return MoveIntent::STOP;
        }

        match state.behavior {
            BehaviorState::Idle => {
                if state.state_timer < self.dwell_time {
                    return MoveIntent::STOP;
                }
                self.advance();
                if self.finished {
                    return MoveIntent::STOP;
                }
                state.set_behavior(BehaviorState::Moving);
                self.walk(state, position)
            },
            BehaviorState::Moving => {
                let Some(point) = self.current_point() else {
                    return MoveIntent::STOP;
                };
                if horizontal_distance(position, point) <= self.arrival_threshold {
                    state.set_behavior(BehaviorState::Idle);
                    MoveIntent::STOP
                } else {
                    self.walk(state, position)
                }
            },
            BehaviorState::Dead => MoveIntent::STOP,
            BehaviorState::Chase | BehaviorState::PreAttack | BehaviorState::Attack => {
                state.set_behavior(BehaviorState::Moving);
                self.walk(state, position)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tests::passive_state;

    fn triangle() -> Vec<PatrolPoint> {
        vec![
            PatrolPoint::new(Vec3::new(0.0, 0.0, 0.0)),
            PatrolPoint::new(Vec3::new(4.0, 0.0, 0.0)),
            PatrolPoint::new(Vec3::new(0.0, 0.0, 4.0)),
        ]
    }

    /// Teleports between waypoints and records every index the patrol heads to.
    fn visit_sequence(behavior: PatrolBehavior, visits: usize) -> Vec<usize> {
        let mut patrol = PatrolController::new(triangle(), behavior, 0.5, 0.5);
        let mut state = passive_state();
        let mut seen = vec![patrol.index()];
        let dt = 0.25;

        while seen.len() < visits {
            let position = patrol.current_point().expect("points");
            state.advance_clock(dt);
            let before = patrol.index();
            patrol.patrol(&mut state, position, None);
            if patrol.is_finished() {
                break;
            }
            if patrol.index() != before {
                seen.push(patrol.index());
            }
        }
        seen
    }

    #[test]
    fn test_from_record() {
        assert_eq!(
            PatrolPoint::from_record(&[1.0, 2.0, 3.0]),
            Some(PatrolPoint::new(Vec3::new(1.0, 2.0, 3.0)))
        );
        assert_eq!(
            PatrolPoint::from_record(&[1.0, 2.0, 3.0, 1.5]).and_then(|p| p.dwell),
            Some(1.5)
        );
        assert!(PatrolPoint::from_record(&[1.0, 2.0]).is_none());
        assert!(PatrolPoint::from_record(&[1.0, f32::NAN, 3.0]).is_none());
        assert!(PatrolPoint::from_record(&[1.0, 2.0, 3.0, 4.0, 5.0]).is_none());

        let negative = PatrolPoint::from_record(&[1.0, 2.0, 3.0, -1.0]).expect("position kept");
        assert_eq!(negative.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(negative.dwell, None);
        let nan_wait = PatrolPoint::from_record(&[1.0, 2.0, 3.0, f32::NAN]).expect("position kept");
        assert_eq!(nan_wait.dwell, None);
    }

    #[test]
    fn test_normalize_drops_malformed() {
        let records = vec![vec![1.0, 0.0, 1.0], vec![2.0], vec![3.0, 0.0, 3.0, 0.5]];
        let points = normalize_patrol_points(&records, Vec3::ZERO, 3.0, 4);
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].position, Vec3::new(3.0, 0.0, 3.0));
    }

    #[test]
    fn test_normalize_generates_ring() {
        let origin = Vec3::new(10.0, 1.0, 10.0);
        let points = normalize_patrol_points(&[vec![f32::INFINITY, 0.0, 0.0]], origin, 3.0, 4);
        assert_eq!(points.len(), 4);
        for point in &points {
            assert!((horizontal_distance(origin, point.position) - 3.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_loop_cycles() {
        assert_eq!(visit_sequence(PatrolBehavior::Loop, 7), vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_pingpong_matches_loop() {
        assert_eq!(
            visit_sequence(PatrolBehavior::PingPong, 7),
            visit_sequence(PatrolBehavior::Loop, 7)
        );
    }

    #[test]
    fn test_once_stops_at_last_point() {
        assert_eq!(visit_sequence(PatrolBehavior::Once, 7), vec![0, 1, 2]);
    }

    #[test]
    fn test_dwell_before_advancing() {
        let mut patrol = PatrolController::new(triangle(), PatrolBehavior::Loop, 0.5, 0.5);
        let mut state = passive_state();

        state.advance_clock(0.25);
        patrol.patrol(&mut state, Vec3::ZERO, None);
        assert_eq!(state.behavior, BehaviorState::Idle);

        state.advance_clock(0.25);
        patrol.patrol(&mut state, Vec3::ZERO, None);
        assert_eq!(patrol.index(), 0);

        state.advance_clock(0.25);
        let intent = patrol.patrol(&mut state, Vec3::ZERO, None);
        assert_eq!(patrol.index(), 1);
        assert_eq!(state.behavior, BehaviorState::Moving);
        assert_eq!(intent.direction, Vec3::X);
        assert_eq!(intent.speed, state.tunables.move_speed);
    }

    #[test]
    fn test_notice_range_halts_and_resumes() {
        let mut patrol = PatrolController::new(triangle(), PatrolBehavior::Loop, 0.5, 0.5)
            .with_notice_range(Some(4.0));
        let mut state = passive_state();
        let position = Vec3::new(2.0, 0.0, 2.0);

        let intent = patrol.patrol(&mut state, position, Some(Vec3::new(2.0, 0.0, 5.0)));
        assert!(patrol.is_noticing());
        assert!(!intent.is_moving());
        assert_eq!(intent.facing(), Some(Vec3::Z));
        assert_eq!(state.behavior, BehaviorState::Idle);

        let intent = patrol.patrol(&mut state, position, Some(Vec3::new(2.0, 0.0, 20.0)));
        assert!(!patrol.is_noticing());
        assert_eq!(state.behavior, BehaviorState::Moving);
        assert!(intent.is_moving());
    }
}
