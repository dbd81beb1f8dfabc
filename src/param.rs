//! Interface seam to the host's parameter-automation engine.

use tokio::sync::mpsc::UnboundedSender;

/// A host-automatable parameter value. Every accepted write is forwarded in
/// order on the attached channel, so an automation recorder that only reacts
/// to value changes observes the exact write sequence.
#[derive(Debug, Clone, Default)]
pub struct AutomatableParameter {
    value: f32,
    notify: Option<UnboundedSender<f32>>,
}

impl AutomatableParameter {
    pub fn new(value: f32) -> Self {
        Self {
            value,
            notify: None,
        }
    }

    pub fn current_value(&self) -> f32 {
        self.value
    }

    pub fn attach(&mut self, notify: UnboundedSender<f32>) {
        self.notify = Some(notify);
    }

    pub fn detach(&mut self) {
        self.notify = None;
    }

    /// Stores the value and notifies the attached recorder. Returns whether
    /// the value actually changed.
    pub fn set(&mut self, value: f32) -> bool {
        if value == self.value {
            return false;
        }
        self.value = value;
        if let Some(notify) = &self.notify {
            // A recorder that went away just stops observing.
            let _ = notify.send(value);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn writes_are_observed_in_order() {
        let (tx, mut rx) = unbounded_channel();
        let mut param = AutomatableParameter::new(0.0);
        param.attach(tx);
        assert!(param.set(0.25));
        assert!(!param.set(0.25));
        assert!(param.set(0.5));
        assert_eq!(rx.try_recv(), Ok(0.25));
        assert_eq!(rx.try_recv(), Ok(0.5));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn detach_stops_notifications() {
        let (tx, mut rx) = unbounded_channel();
        let mut param = AutomatableParameter::new(0.0);
        param.attach(tx);
        param.detach();
        assert!(param.set(1.0));
        assert!(rx.try_recv().is_err());
        assert_eq!(param.current_value(), 1.0);
    }
}
