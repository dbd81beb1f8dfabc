use crate::midi::MidiEvent;
use wavers::Samples;

/// Channels-by-frames staging storage for one direction of an insert.
///
/// Sized at (de)initialisation only; signal-path code never grows it.
#[derive(Debug, Default)]
pub struct AudioBlockBuffer {
    channels: Vec<Samples<f32>>,
}

impl AudioBlockBuffer {
    pub fn new(channels: usize, frames: usize) -> Self {
        let mut buffer = Self { channels: vec![] };
        buffer.resize(channels, frames);
        buffer
    }

    pub fn resize(&mut self, channels: usize, frames: usize) {
        self.channels = (0..channels)
            .map(|_| Samples::new(vec![0.0; frames].into_boxed_slice()))
            .collect();
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, |c| c.as_ref().len())
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        self.channels[index].as_ref()
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        self.channels[index].as_mut()
    }

    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.as_mut().fill(0.0);
        }
    }

    /// Zeroes `[start, start + num_frames)` on every channel, clamped to the
    /// buffer length.
    pub fn clear_range(&mut self, start: usize, num_frames: usize) {
        for channel in &mut self.channels {
            let samples = channel.as_mut();
            let from = start.min(samples.len());
            let to = (start + num_frames).min(samples.len());
            samples[from..to].fill(0.0);
        }
    }
}

/// Copies the overlapping channel/frame region from `src` (starting at frame
/// `src_from`) into `dst` (starting at frame `dst_from`).
///
/// Mismatched channel counts or lengths are reconciled by copying the
/// intersection only; there is no error path.
pub fn copy_intersection(
    dst: &mut AudioBlockBuffer,
    dst_from: usize,
    src: &AudioBlockBuffer,
    src_from: usize,
) {
    let channels = dst.channel_count().min(src.channel_count());
    for ch in 0..channels {
        let src_samples = src.channel(ch);
        let dst_samples = dst.channel_mut(ch);
        if src_from >= src_samples.len() || dst_from >= dst_samples.len() {
            continue;
        }
        let frames = (src_samples.len() - src_from).min(dst_samples.len() - dst_from);
        dst_samples[dst_from..dst_from + frames]
            .copy_from_slice(&src_samples[src_from..src_from + frames]);
    }
}

/// One direction's staging pair: the audio block plus the MIDI events
/// captured with it.
#[derive(Debug, Default)]
pub struct BlockBuffer {
    pub audio: AudioBlockBuffer,
    pub midi: Vec<MidiEvent>,
}

impl BlockBuffer {
    pub fn new(channels: usize, frames: usize) -> Self {
        Self {
            audio: AudioBlockBuffer::new(channels, frames),
            midi: vec![],
        }
    }

    /// Resizes to the current block geometry if it changed since the block
    /// was last in this actor's hands.
    pub fn ensure_size(&mut self, channels: usize, frames: usize) {
        if self.audio.channel_count() != channels || self.audio.frames() != frames {
            self.audio.resize(channels, frames);
        }
    }

    pub fn clear(&mut self) {
        self.audio.clear();
        self.midi.clear();
    }

    /// Drops the sample storage entirely, keeping the value usable after a
    /// later `ensure_size`.
    pub fn release(&mut self) {
        self.audio = AudioBlockBuffer::default();
        self.midi = vec![];
    }
}
