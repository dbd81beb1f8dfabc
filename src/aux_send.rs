//! Gain/mute controller for a numbered aux bus, driving an automatable
//! send-level parameter.

use crate::fader::{db_to_fader_position, fader_position_to_db};
use crate::param::AutomatableParameter;
use crate::state::AuxSendState;
use tokio::sync::mpsc::UnboundedSender;

/// Gain written when muting.
pub const MUTE_FLOOR_DB: f32 = -100.0;

/// Anything at or below this reports as muted. Kept 10 dB above the floor so
/// a manually set very-low gain is not misreported by an exact comparison.
pub const MUTE_THRESHOLD_DB: f32 = -90.0;

// Absorbs float error from round-tripping the floor through the fader curve.
const FLOOR_TOLERANCE_DB: f32 = 0.001;

#[derive(Debug, Clone)]
pub struct AuxSend {
    bus_number: usize,
    bus_name: Option<String>,
    gain: AutomatableParameter,
    last_volume_before_mute_db: f32,
    changed: bool,
}

impl AuxSend {
    pub fn new(state: AuxSendState) -> Self {
        Self {
            bus_number: state.bus_number,
            bus_name: state.bus_name,
            gain: AutomatableParameter::new(state.gain_fader_position),
            last_volume_before_mute_db: state.last_volume_before_mute_db,
            changed: false,
        }
    }

    pub fn bus_number(&self) -> usize {
        self.bus_number
    }

    pub fn set_bus_number(&mut self, bus_number: usize) {
        self.bus_number = bus_number;
    }

    pub fn set_bus_name(&mut self, name: Option<String>) {
        self.bus_name = name.filter(|n| !n.is_empty());
    }

    /// The user-assigned bus name, or the generated default.
    pub fn bus_name(&self) -> String {
        self.bus_name
            .clone()
            .unwrap_or_else(|| default_bus_name(self.bus_number))
    }

    /// Routes automation-recorder notifications for the send level.
    pub fn attach_gain_recorder(&mut self, notify: UnboundedSender<f32>) {
        self.gain.attach(notify);
    }

    pub fn detach_gain_recorder(&mut self) {
        self.gain.detach();
    }

    pub fn gain_db(&self) -> f32 {
        fader_position_to_db(self.gain.current_value())
    }

    pub fn set_gain_db(&mut self, db: f32) {
        let position = db_to_fader_position(db);
        if self.gain.set(position) {
            self.changed = true;
        }
    }

    /// Mutes by dropping the level to the floor. The level is first nudged
    /// just below its current value so a change-triggered automation
    /// recorder captures the pre-mute level and the mute as distinct events.
    pub fn set_mute(&mut self, mute: bool) {
        if mute {
            self.last_volume_before_mute_db = self.gain_db();
            self.set_gain_db(self.last_volume_before_mute_db - 0.01);
            self.set_gain_db(MUTE_FLOOR_DB);
        } else {
            if self.last_volume_before_mute_db <= MUTE_FLOOR_DB + FLOOR_TOLERANCE_DB {
                // Saved while already muted; not a usable restore target.
                self.last_volume_before_mute_db = 0.0;
            }
            self.set_gain_db(self.gain_db() + 0.01);
            self.set_gain_db(self.last_volume_before_mute_db);
        }
    }

    pub fn is_mute(&self) -> bool {
        // Compared as fader positions; converting back to dB would smear the
        // exact threshold with rounding error.
        self.gain.current_value() <= db_to_fader_position(MUTE_THRESHOLD_DB)
    }

    /// An aux send on a muted track only keeps feeding its bus when the
    /// track is not processed at all while muted.
    pub fn should_process(&self, track_muted: bool, processes_while_muted: bool) -> bool {
        if processes_while_muted {
            return !track_muted;
        }
        true
    }

    /// Consumes the pending "configuration changed" flag.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    pub fn to_state(&self) -> AuxSendState {
        AuxSendState {
            bus_number: self.bus_number,
            gain_fader_position: self.gain.current_value(),
            last_volume_before_mute_db: self.last_volume_before_mute_db,
            bus_name: self.bus_name.clone(),
        }
    }
}

pub fn default_bus_name(bus_number: usize) -> String {
    format!("Bus #{}", bus_number + 1)
}

/// Display list of the first `max_busses` buses, with assigned names in
/// parentheses after the generated ones.
pub fn bus_names(assigned: &[Option<String>], max_busses: usize) -> Vec<String> {
    (0..max_busses)
        .map(|i| {
            let name = default_bus_name(i);
            match assigned.get(i).and_then(|n| n.as_deref()) {
                Some(assigned) if !assigned.is_empty() => format!("{name} ({assigned})"),
                _ => name,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    fn send() -> AuxSend {
        AuxSend::new(AuxSendState::default())
    }

    #[test]
    fn mute_round_trip_restores_pre_mute_gain() {
        let mut aux = send();
        aux.set_gain_db(-6.0);
        aux.set_mute(true);
        assert!(aux.is_mute());
        aux.set_mute(false);
        assert!((aux.gain_db() - -6.0).abs() < 0.01);
        assert!(!aux.is_mute());
    }

    #[test]
    fn unmute_after_mute_while_muted_restores_unity() {
        let mut aux = send();
        aux.set_mute(true);
        // A second mute saves the floor itself as the pre-mute level.
        aux.set_mute(true);
        aux.set_mute(false);
        assert!(aux.gain_db().abs() < 0.01);
    }

    #[test]
    fn mute_threshold_sits_above_the_floor() {
        let mut aux = send();
        aux.set_gain_db(-89.9);
        assert!(!aux.is_mute());
        aux.set_gain_db(-90.0);
        assert!(aux.is_mute());
        aux.set_gain_db(MUTE_FLOOR_DB);
        assert!(aux.is_mute());
    }

    #[test]
    fn mute_writes_are_recorded_as_two_events() {
        let (tx, mut rx) = unbounded_channel();
        let mut aux = send();
        aux.attach_gain_recorder(tx);
        aux.set_mute(true);

        let first = rx.try_recv().expect("pre-mute nudge recorded");
        assert!((fader_position_to_db(first) - -0.01).abs() < 0.001);
        let second = rx.try_recv().expect("mute floor recorded");
        assert!(fader_position_to_db(second) <= MUTE_THRESHOLD_DB);
        assert!(rx.try_recv().is_err());

        aux.set_mute(false);
        let nudge = rx.try_recv().expect("unmute nudge recorded");
        assert!((fader_position_to_db(nudge) - (MUTE_FLOOR_DB + 0.01)).abs() < 0.01);
        let restored = rx.try_recv().expect("restored level recorded");
        assert!(fader_position_to_db(restored).abs() < 0.001);
    }

    #[test]
    fn gain_state_follows_the_parameter() {
        let mut aux = send();
        aux.set_gain_db(-12.0);
        assert!(aux.take_changed());
        assert!(!aux.take_changed());
        let state = aux.to_state();
        assert!((state.gain_fader_position - db_to_fader_position(-12.0)).abs() < 1e-6);
    }

    #[test]
    fn default_bus_naming_is_one_based() {
        let mut aux = send();
        aux.set_bus_number(2);
        assert_eq!(aux.bus_name(), "Bus #3");
        aux.set_bus_name(Some("Verb".to_string()));
        assert_eq!(aux.bus_name(), "Verb");
        aux.set_bus_name(Some(String::new()));
        assert_eq!(aux.bus_name(), "Bus #3");
    }

    #[test]
    fn bus_name_listing_appends_assigned_names() {
        let assigned = vec![None, Some("Verb".to_string())];
        assert_eq!(
            bus_names(&assigned, 3),
            vec!["Bus #1", "Bus #2 (Verb)", "Bus #3"]
        );
    }

    #[test]
    fn send_on_muted_track_is_skipped_only_when_track_still_processes() {
        let aux = send();
        assert!(aux.should_process(false, true));
        assert!(!aux.should_process(true, true));
        assert!(aux.should_process(true, false));
    }
}
