//! Hostile-agent combat state machine.
//!
//! Flow: `Idle → Chase → PreAttack → Attack → Chase`.
//!
//! - Idle agents start chasing once the target is within detection range and
//!   give up when it escapes beyond `chase_range × CHASE_ESCAPE_FACTOR`.
//! - The first time an agent reaches attack range it telegraphs for the grace
//!   period before striking. After the first executed attack the telegraph is
//!   gone for good and attacks fire as soon as the cooldown allows.
//! - Enraged agents chain several attacks on a shorter cooldown.
//!
//! Attacks resolve instantly: the distance at the moment of the strike
//! decides whether it hits.

use glam::Vec3;
use sentinel_common::horizontal_distance;
use tracing::debug;

use crate::agent::{AgentState, BehaviorState};
use crate::movement::MoveIntent;
use crate::target::Target;

/// Chase is abandoned beyond `chase_range` times this factor.
pub const CHASE_ESCAPE_FACTOR: f32 = 1.5;

/// A telegraph is abandoned beyond `attack_range` times this factor.
pub const ATTACK_ESCAPE_FACTOR: f32 = 1.2;

/// A resolved attack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strike {
    /// Damage dealt (or that would have been dealt on a miss)
    pub damage: f32,
    /// Whether the target was within attack range at impact
    pub hit: bool,
    /// Distance at impact
    pub distance: f32,
    /// Whether this attack was chained from the previous one
    pub chained: bool,
}

/// Result of one combat tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatOutcome {
    /// Movement for this tick
    pub intent: MoveIntent,
    /// Attack executed this tick, if any
    pub strike: Option<Strike>,
}

impl CombatOutcome {
    fn moving(intent: MoveIntent) -> Self {
        Self {
            intent,
            strike: None,
        }
    }
}

/// Capability of fighting a target.
pub trait Attacker {
    /// Runs one tick of the combat state machine against `target`.
    fn engage<T: Target + ?Sized>(
        &mut self,
        state: &mut AgentState,
        position: Vec3,
        target: &mut T,
    ) -> CombatOutcome;
}

/// Timers and counters behind the hostile state machine.
#[derive(Debug, Clone, Default)]
pub struct CombatController {
    grace_enabled: bool,
    grace_started_at: Option<f32>,
    last_attack_at: Option<f32>,
    attack_count: u32,
    chaining: bool,
}

impl CombatController {
    /// Creates a controller; a zero grace period skips the telegraph.
    #[must_use]
    pub fn new(grace_period: f32) -> Self {
        Self {
            grace_enabled: grace_period > 0.0,
            ..Self::default()
        }
    }

    /// Whether the first-attack telegraph is still pending.
    #[must_use]
    pub fn grace_enabled(&self) -> bool {
        self.grace_enabled
    }

    /// Attacks executed in the current sequence.
    #[must_use]
    pub fn attack_count(&self) -> u32 {
        self.attack_count
    }

    /// Whether the shorter chained cooldown is in effect.
    #[must_use]
    pub fn is_chaining(&self) -> bool {
        self.chaining
    }

    /// Clock time of the last executed attack.
    #[must_use]
    pub fn last_attack_at(&self) -> Option<f32> {
        self.last_attack_at
    }

    fn cooldown(&self, state: &AgentState) -> f32 {
        if self.chaining {
            state.tunables.chain_cooldown
        } else {
            state.tunables.attack_cooldown
        }
    }

    fn cooldown_elapsed(&self, state: &AgentState) -> bool {
        match self.last_attack_at {
            Some(at) => state.clock - at >= self.cooldown(state),
            None => true,
        }
    }

    fn grace_elapsed(&self, state: &AgentState) -> bool {
        match self.grace_started_at {
            Some(at) => state.clock - at >= state.tunables.attack_grace_period,
            None => false,
        }
    }

    fn execute<T: Target + ?Sized>(
        &mut self,
        state: &mut AgentState,
        distance: f32,
        target: &mut T,
    ) -> Strike {
        let chained = self.attack_count > 0;
        self.attack_count += 1;
        self.last_attack_at = Some(state.clock);
        self.grace_enabled = false;
        self.grace_started_at = None;
        state.set_behavior(BehaviorState::Attack);

        let damage = if state.enraged {
            state.tunables.enraged_damage
        } else {
            state.tunables.attack_damage
        };
        let hit = distance <= state.tunables.attack_range;
        if hit {
            target.receive_damage(damage, state.id);
        }
        debug!(
            "{} attack #{} {} at {distance:.2} for {damage}",
            state.id,
            self.attack_count,
            if hit { "hit" } else { "missed" }
        );

        Strike {
            damage,
            hit,
            distance,
            chained,
        }
    }

    fn end_sequence(&mut self, state: &mut AgentState) {
        self.attack_count = 0;
        self.chaining = false;
        state.set_behavior(BehaviorState::Chase);
    }

    fn chase<T: Target + ?Sized>(
        &mut self,
        state: &mut AgentState,
        position: Vec3,
        target_position: Vec3,
        distance: f32,
        target: &mut T,
    ) -> CombatOutcome {
        let t = &state.tunables;

        if distance > t.chase_range * CHASE_ESCAPE_FACTOR {
            self.grace_started_at = None;
            state.set_behavior(BehaviorState::Idle);
            return CombatOutcome::moving(MoveIntent::STOP);
        }

        if distance > t.attack_range {
            return CombatOutcome::moving(MoveIntent::toward(position, target_position, t.chase_speed));
        }

        let face = MoveIntent::face_toward(position, target_position);
        if self.grace_enabled {
            if self.grace_started_at.is_none() {
                self.grace_started_at = Some(state.clock);
                state.set_behavior(BehaviorState::PreAttack);
                return CombatOutcome::moving(face);
            }
            if !(self.grace_elapsed(state) && self.cooldown_elapsed(state)) {
                return CombatOutcome::moving(face);
            }
        } else if !self.cooldown_elapsed(state) {
            return CombatOutcome::moving(face);
        }

        let strike = self.execute(state, distance, target);
        CombatOutcome {
            intent: face,
            strike: Some(strike),
        }
    }
}

impl Attacker for CombatController {
    fn engage<T: Target + ?Sized>(
        &mut self,
        state: &mut AgentState,
        position: Vec3,
        target: &mut T,
    ) -> CombatOutcome {
        let target_position = target.position();
        let distance = if target.is_detectable() {
            horizontal_distance(position, target_position)
        } else {
            f32::INFINITY
        };
        let face = MoveIntent::face_toward(position, target_position);

        match state.behavior {
            BehaviorState::Dead => CombatOutcome::moving(MoveIntent::STOP),
            BehaviorState::Idle | BehaviorState::Moving => {
                if distance <= state.tunables.detection_range {
                    state.set_behavior(BehaviorState::Chase);
                    CombatOutcome::moving(MoveIntent::toward(
                        position,
                        target_position,
                        state.tunables.chase_speed,
                    ))
                } else {
                    if state.behavior == BehaviorState::Moving {
                        state.set_behavior(BehaviorState::Idle);
                    }
                    CombatOutcome::moving(MoveIntent::STOP)
                }
            },
            BehaviorState::Chase => self.chase(state, position, target_position, distance, target),
            BehaviorState::PreAttack => {
                if distance > state.tunables.attack_range * ATTACK_ESCAPE_FACTOR {
                    self.grace_started_at = None;
                    state.set_behavior(BehaviorState::Chase);
                    return CombatOutcome::moving(MoveIntent::toward(
                        position,
                        target_position,
                        state.tunables.chase_speed,
                    ));
                }
                if !self.grace_elapsed(state) {
                    return CombatOutcome::moving(face);
                }
                if self.cooldown_elapsed(state) {
                    let strike = self.execute(state, distance, target);
                    return CombatOutcome {
                        intent: face,
                        strike: Some(strike),
                    };
                }
                // Grace is spent; chase resumes and strikes once the cooldown allows
                state.set_behavior(BehaviorState::Chase);
                CombatOutcome::moving(face)
            },
            BehaviorState::Attack => {
                let swing_started = self.last_attack_at.unwrap_or(state.clock);
                if state.clock - swing_started < state.tunables.attack_duration {
                    return CombatOutcome::moving(face);
                }

                let can_chain =
                    state.enraged && self.attack_count < state.tunables.max_chain_attacks;
                if !can_chain || distance > state.tunables.attack_range * ATTACK_ESCAPE_FACTOR {
                    self.end_sequence(state);
                    return CombatOutcome::moving(face);
                }

                self.chaining = true;
                if !self.cooldown_elapsed(state) {
                    return CombatOutcome::moving(face);
                }
                let strike = self.execute(state, distance, target);
                CombatOutcome {
                    intent: face,
                    strike: Some(strike),
                }
            },
        }
    }
}
