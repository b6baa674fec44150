use serde::Serialize;

use crate::dynamics::state::RigidBodyState;

use super::runner::Sample;

// ---------------------------------------------------------------------------
// Simulation events
// ---------------------------------------------------------------------------

/// Kinds of simulation events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EventKind {
    /// Contact with the ground at the given speed, m/s.
    GroundContact { speed: f64 },
    Altitude { altitude: f64, ascending: bool },
    /// Load factor went above the threshold; carries the reading, g.
    OverG { g: f64 },
    /// Angle of attack went past the critical value; carries the reading, deg.
    Stall { angle_of_attack: f64 },
    Custom(String),
}

/// A discrete event that occurred during simulation.
#[derive(Debug, Clone, Serialize)]
pub struct SimEvent {
    pub time: f64,
    pub kind: EventKind,
    pub state: RigidBodyState,
}

/// Trait for passive event detectors.
/// Implementations inspect consecutive samples and report events.
pub trait EventDetector {
    fn check(&mut self, prev: &Sample, current: &Sample) -> Option<EventKind>;
}

/// Fires once when the ground probe goes from clear air to touching (or
/// passing through) the ground.
#[derive(Debug, Default)]
pub struct GroundContactDetector {
    fired: bool,
}

impl GroundContactDetector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventDetector for GroundContactDetector {
    fn check(&mut self, prev: &Sample, current: &Sample) -> Option<EventKind> {
        if self.fired {
            return None;
        }
        let was_clear = prev.height.map_or(false, |h| h > 0.0);
        let touching = current.height.map_or(true, |h| h <= 0.0);
        if was_clear && touching {
            self.fired = true;
            Some(EventKind::GroundContact { speed: current.state.speed() })
        } else {
            None
        }
    }
}

/// Detects when altitude crosses a threshold (ascending or descending).
#[derive(Debug)]
pub struct AltitudeDetector {
    pub altitude: f64,
    pub ascending: bool,
    fired: bool,
}

impl AltitudeDetector {
    pub fn new(altitude: f64, ascending: bool) -> Self {
        Self { altitude, ascending, fired: false }
    }
}

impl EventDetector for AltitudeDetector {
    fn check(&mut self, prev: &Sample, current: &Sample) -> Option<EventKind> {
        if self.fired {
            return None;
        }
        let (before, after) = (prev.state.position.y, current.state.position.y);
        let crossed = if self.ascending {
            before < self.altitude && after >= self.altitude
        } else {
            before > self.altitude && after <= self.altitude
        };
        if crossed {
            self.fired = true;
            Some(EventKind::Altitude { altitude: self.altitude, ascending: self.ascending })
        } else {
            None
        }
    }
}

/// Fires when the load factor exceeds `threshold`, then stays quiet until it
/// drops back below.
#[derive(Debug)]
pub struct OverGDetector {
    pub threshold: f64,
    active: bool,
}

impl OverGDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold, active: false }
    }
}

impl EventDetector for OverGDetector {
    fn check(&mut self, _prev: &Sample, current: &Sample) -> Option<EventKind> {
        let g = current.telemetry.g_force;
        if g <= self.threshold {
            self.active = false;
            return None;
        }
        if self.active {
            return None;
        }
        self.active = true;
        Some(EventKind::OverG { g })
    }
}

/// Same hysteresis as [`OverGDetector`] on |angle of attack| in degrees.
#[derive(Debug)]
pub struct StallDetector {
    pub critical_aoa: f64,
    stalled: bool,
}

impl StallDetector {
    pub fn new(critical_aoa: f64) -> Self {
        Self { critical_aoa, stalled: false }
    }
}

impl EventDetector for StallDetector {
    fn check(&mut self, _prev: &Sample, current: &Sample) -> Option<EventKind> {
        let aoa = current.telemetry.angle_of_attack;
        if aoa.abs() <= self.critical_aoa {
            self.stalled = false;
            return None;
        }
        if self.stalled {
            return None;
        }
        self.stalled = true;
        Some(EventKind::Stall { angle_of_attack: aoa })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::flight::Telemetry;
    use crate::dynamics::state::ControlState;
    use nalgebra::Vector3;

    fn sample(alt: f64, height: Option<f64>) -> Sample {
        Sample {
            time: 0.0,
            state: RigidBodyState::level(alt, 100.0, 1000.0, Vector3::new(1.0, 1.0, 1.0)),
            controls: ControlState::default(),
            telemetry: Telemetry::default(),
            thrust: 0.0,
            height,
        }
    }

    fn with_telemetry(g: f64, aoa: f64) -> Sample {
        let mut s = sample(1000.0, Some(1000.0));
        s.telemetry.g_force = g;
        s.telemetry.angle_of_attack = aoa;
        s
    }

    #[test]
    fn ground_contact_once() {
        let mut det = GroundContactDetector::new();
        let air = sample(2.0, Some(2.0));
        let below = sample(-0.5, None);
        assert_eq!(det.check(&air, &air), None);
        assert_eq!(det.check(&air, &below), Some(EventKind::GroundContact { speed: 100.0 }));
        assert_eq!(det.check(&air, &below), None);
    }

    #[test]
    fn no_contact_without_ground() {
        // Probe never hits anything: never "clear", never touching.
        let mut det = GroundContactDetector::new();
        assert_eq!(det.check(&sample(10.0, None), &sample(5.0, None)), None);
    }

    #[test]
    fn altitude_detector_descending() {
        let mut det = AltitudeDetector::new(500.0, false);
        let prev = sample(520.0, Some(520.0));
        let curr = sample(490.0, Some(490.0));
        assert!(det.check(&prev, &curr).is_some());
        // Should not fire again
        assert!(det.check(&prev, &curr).is_none());
        assert!(AltitudeDetector::new(500.0, true).check(&prev, &curr).is_none());
    }

    #[test]
    fn over_g_rearms_after_dropping_back() {
        let mut det = OverGDetector::new(6.0);
        let calm = with_telemetry(1.0, 0.0);
        let hard = with_telemetry(7.5, 0.0);
        assert!(det.check(&calm, &calm).is_none());
        assert_eq!(det.check(&calm, &hard), Some(EventKind::OverG { g: 7.5 }));
        assert!(det.check(&hard, &hard).is_none());
        assert!(det.check(&hard, &calm).is_none());
        assert!(det.check(&calm, &hard).is_some());
    }

    #[test]
    fn stall_on_either_sign() {
        let mut det = StallDetector::new(18.0);
        assert!(det.check(&with_telemetry(1.0, 5.0), &with_telemetry(1.0, 10.0)).is_none());
        assert!(det.check(&with_telemetry(1.0, 10.0), &with_telemetry(1.0, -22.0)).is_some());
        assert!(det.check(&with_telemetry(1.0, -22.0), &with_telemetry(1.0, -25.0)).is_none());
    }
}
