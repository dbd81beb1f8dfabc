use midly::live::LiveEvent;

/// One MIDI event inside a block, kept as raw wire bytes with the frame
/// offset it occurred at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiEvent {
    pub frame: u32,
    pub data: Vec<u8>,
}

impl MidiEvent {
    pub fn new(frame: u32, data: Vec<u8>) -> Self {
        Self { frame, data }
    }

    pub fn from_live(frame: u32, event: LiveEvent) -> Self {
        let mut data = Vec::with_capacity(3);
        event
            .write_std(&mut data)
            .expect("writing into a Vec cannot fail");
        Self { frame, data }
    }

    pub fn live(&self) -> Option<LiveEvent<'_>> {
        LiveEvent::parse(&self.data).ok()
    }
}

/// Moves all events from `src` to the end of `dst`, draining `src`.
pub fn merge_from_and_clear(dst: &mut Vec<MidiEvent>, src: &mut Vec<MidiEvent>) {
    dst.append(src);
}

#[cfg(test)]
mod tests {
    use super::*;
    use midly::MidiMessage;
    use midly::num::{u4, u7};

    fn note_on(frame: u32, key: u8) -> MidiEvent {
        MidiEvent::from_live(
            frame,
            LiveEvent::Midi {
                channel: u4::new(0),
                message: MidiMessage::NoteOn {
                    key: u7::new(key),
                    vel: u7::new(100),
                },
            },
        )
    }

    #[test]
    fn live_event_round_trip() {
        let event = note_on(12, 60);
        assert_eq!(event.data, vec![0x90, 60, 100]);
        match event.live() {
            Some(LiveEvent::Midi { message, .. }) => match message {
                MidiMessage::NoteOn { key, .. } => assert_eq!(key.as_int(), 60),
                other => panic!("unexpected message {other:?}"),
            },
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn merge_drains_source() {
        let mut dst = vec![note_on(0, 60)];
        let mut src = vec![note_on(3, 64), note_on(7, 67)];
        merge_from_and_clear(&mut dst, &mut src);
        assert!(src.is_empty());
        assert_eq!(dst.len(), 3);
        assert_eq!(dst[1].frame, 3);
    }
}
