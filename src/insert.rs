//! The insert slot: diverts one block of audio/MIDI out to an external
//! device and folds the returned signal back into the graph.
//!
//! One insert instance is split across its three actors at creation:
//! [`InsertRouting`] for the control thread, [`InsertProcessor`] for the
//! render thread and [`InsertIo`] for the device I/O thread. The actors share
//! only a small set of atomically replaceable values; block data moves
//! through the lock-free lanes in [`crate::exchange`].

use crate::buffer::{AudioBlockBuffer, BlockBuffer, copy_intersection};
use crate::devices::{DeviceCapability, DeviceCatalog};
use crate::exchange::{LaneRx, LaneTx, lane};
use crate::midi::{MidiEvent, merge_from_and_clear};
use crate::state::InsertState;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use tracing::debug;

/// Inserts stage a fixed stereo pair towards the external device.
pub const INSERT_CHANNELS: usize = 2;

/// Values shared between the control, render and I/O actors. Each one is a
/// plain atomically replaceable scalar; reconfiguration never takes a lock
/// the render thread could contend on.
#[derive(Debug, Default)]
pub struct InsertShared {
    send: AtomicU8,
    ret: AtomicU8,
    manual_adjust_ms: AtomicU64,
}

impl InsertShared {
    fn set_send_capability(&self, capability: DeviceCapability) {
        self.send.store(capability.as_u8(), Ordering::Release);
    }

    fn set_return_capability(&self, capability: DeviceCapability) {
        self.ret.store(capability.as_u8(), Ordering::Release);
    }

    pub fn send_capability(&self) -> DeviceCapability {
        DeviceCapability::from_u8(self.send.load(Ordering::Acquire))
    }

    pub fn return_capability(&self) -> DeviceCapability {
        DeviceCapability::from_u8(self.ret.load(Ordering::Acquire))
    }

    fn set_manual_adjust_ms(&self, ms: f64) {
        self.manual_adjust_ms.store(ms.to_bits(), Ordering::Release);
    }

    pub fn manual_adjust_ms(&self) -> f64 {
        f64::from_bits(self.manual_adjust_ms.load(Ordering::Acquire))
    }
}

/// Block geometry handed down when audio processing (re)starts.
#[derive(Debug, Clone, Copy)]
pub struct InitInfo {
    pub sample_rate: f64,
    pub block_size: usize,
}

/// The render context for one block. Null views are valid and simply skip
/// the corresponding copy or merge step.
#[derive(Debug, Default)]
pub struct RenderContext<'a> {
    pub start_sample: usize,
    pub num_samples: usize,
    pub dest_audio: Option<&'a mut AudioBlockBuffer>,
    pub dest_midi: Option<&'a mut Vec<MidiEvent>>,
}

/// Splits one insert instance into its three actors.
pub fn create(state: InsertState) -> (InsertRouting, InsertProcessor, InsertIo) {
    let shared = Arc::new(InsertShared::default());
    shared.set_manual_adjust_ms(state.manual_adjust_ms);
    let (send_tx, send_rx) = lane();
    let (ret_tx, ret_rx) = lane();
    (
        InsertRouting {
            name: state.name,
            input_device: state.input_device,
            output_device: state.output_device,
            shared: shared.clone(),
        },
        InsertProcessor {
            shared: shared.clone(),
            send: send_tx,
            ret: ret_rx,
            sample_rate: 0.0,
            block_size: 0,
            latency_seconds: 0.0,
        },
        InsertIo {
            shared,
            send: send_rx,
            ret: ret_tx,
            staged: BlockBuffer::default(),
            block_size: 0,
        },
    )
}

/// Control-thread half: the configured device binding and its resolved
/// capability tags.
#[derive(Debug, Clone)]
pub struct InsertRouting {
    name: String,
    input_device: String,
    output_device: String,
    shared: Arc<InsertShared>,
}

impl InsertRouting {
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            "Insert".to_string()
        } else {
            self.name.clone()
        }
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn input_device(&self) -> &str {
        &self.input_device
    }

    pub fn output_device(&self) -> &str {
        &self.output_device
    }

    /// Rebinds the return side and re-resolves both directions.
    pub fn set_input_device(&mut self, name: String, inputs: &DeviceCatalog, outputs: &DeviceCatalog) {
        self.input_device = name;
        self.update_device_types(inputs, outputs);
    }

    /// Rebinds the send side and re-resolves both directions.
    pub fn set_output_device(&mut self, name: String, inputs: &DeviceCatalog, outputs: &DeviceCatalog) {
        self.output_device = name;
        self.update_device_types(inputs, outputs);
    }

    pub fn manual_adjust_ms(&self) -> f64 {
        self.shared.manual_adjust_ms()
    }

    /// Takes effect on the next (re)initialisation of the processor.
    pub fn set_manual_adjust_ms(&mut self, ms: f64) {
        self.shared.set_manual_adjust_ms(ms);
    }

    /// Recomputes the capability tags from catalog snapshots: the return
    /// direction against the inputs, the send direction against the outputs.
    pub fn update_device_types(&self, inputs: &DeviceCatalog, outputs: &DeviceCatalog) {
        let ret = inputs.resolve(&self.input_device);
        let send = outputs.resolve(&self.output_device);
        self.shared.set_return_capability(ret);
        self.shared.set_send_capability(send);
        debug!(
            "insert '{}': send {send:?} ('{}'), return {ret:?} ('{}')",
            self.display_name(),
            self.output_device,
            self.input_device
        );
    }

    pub fn send_capability(&self) -> DeviceCapability {
        self.shared.send_capability()
    }

    pub fn return_capability(&self) -> DeviceCapability {
        self.shared.return_capability()
    }

    pub fn has_audio(&self) -> bool {
        self.send_capability() == DeviceCapability::Audio
            || self.return_capability() == DeviceCapability::Audio
    }

    pub fn has_midi(&self) -> bool {
        self.send_capability() == DeviceCapability::Midi
            || self.return_capability() == DeviceCapability::Midi
    }

    pub fn to_state(&self) -> InsertState {
        InsertState {
            name: self.name.clone(),
            input_device: self.input_device.clone(),
            output_device: self.output_device.clone(),
            manual_adjust_ms: self.manual_adjust_ms(),
        }
    }
}

/// Render-thread half: the per-block capture/clear/restore state machine.
#[derive(Debug)]
pub struct InsertProcessor {
    shared: Arc<InsertShared>,
    send: LaneTx,
    ret: LaneRx,
    sample_rate: f64,
    block_size: usize,
    latency_seconds: f64,
}

impl InsertProcessor {
    /// Call while audio is stopped; sizes the staging blocks and recomputes
    /// latency.
    pub fn initialise(&mut self, info: &InitInfo) {
        while let Some(mut block) = self.ret.take() {
            block.release();
            self.ret.release(block);
        }
        self.initialise_without_stopping(info);
    }

    pub fn initialise_without_stopping(&mut self, info: &InitInfo) {
        self.sample_rate = info.sample_rate;
        self.block_size = info.block_size;
        // One block of round trip to the device, plus the tuned offset.
        self.latency_seconds = self.shared.manual_adjust_ms() / 1000.0
            + info.block_size as f64 / info.sample_rate;
    }

    pub fn deinitialise(&mut self) {
        self.send.deinitialise();
        while let Some(mut block) = self.ret.take() {
            block.release();
            self.ret.release(block);
        }
        self.block_size = 0;
        self.latency_seconds = 0.0;
    }

    pub fn latency_seconds(&self) -> f64 {
        self.latency_seconds
    }

    /// Runs the block state machine: capture into the send lane, clear the
    /// live block, then restore from the return lane. With no send device
    /// bound the block's signal is dropped after the clear; an unconfigured
    /// insert mutes its slot rather than acting as a bypass.
    pub fn apply_to_block(&mut self, ctx: &mut RenderContext) {
        let send = self.shared.send_capability();

        match send {
            DeviceCapability::Audio => {
                if let Some(dest) = ctx.dest_audio.as_deref() {
                    if let Some(mut block) = self.send.acquire(INSERT_CHANNELS, self.block_size) {
                        copy_intersection(&mut block.audio, 0, dest, ctx.start_sample);
                        self.send.publish(block);
                    }
                }
            }
            DeviceCapability::Midi => {
                if let Some(midi) = ctx.dest_midi.as_mut() {
                    if let Some(mut block) = self.send.acquire(INSERT_CHANNELS, self.block_size) {
                        merge_from_and_clear(&mut block.midi, midi);
                        self.send.publish(block);
                    }
                }
            }
            DeviceCapability::None => {}
        }

        // The diverted signal must not also continue downstream undiverted.
        if let Some(midi) = ctx.dest_midi.as_mut() {
            midi.clear();
        }
        if let Some(dest) = ctx.dest_audio.as_deref_mut() {
            dest.clear_range(ctx.start_sample, ctx.num_samples);
        }

        if send == DeviceCapability::None {
            return;
        }

        match self.shared.return_capability() {
            DeviceCapability::Audio => {
                if let Some(dest) = ctx.dest_audio.as_deref_mut() {
                    if let Some(block) = self.ret.take() {
                        copy_intersection(dest, ctx.start_sample, &block.audio, 0);
                        self.ret.release(block);
                    }
                }
            }
            DeviceCapability::Midi => {
                if let Some(midi) = ctx.dest_midi.as_mut() {
                    if let Some(mut block) = self.ret.take() {
                        merge_from_and_clear(midi, &mut block.midi);
                        self.ret.release(block);
                    }
                }
            }
            DeviceCapability::None => {}
        }
    }
}

/// Device-I/O half: lets the external device output path pull what was
/// captured and the device input path push the processed signal back.
#[derive(Debug)]
pub struct InsertIo {
    shared: Arc<InsertShared>,
    send: LaneRx,
    ret: LaneTx,
    staged: BlockBuffer,
    block_size: usize,
}

impl InsertIo {
    pub fn initialise(&mut self, info: &InitInfo) {
        self.block_size = info.block_size;
        self.staged.ensure_size(INSERT_CHANNELS, info.block_size);
        self.staged.clear();
    }

    pub fn deinitialise(&mut self) {
        self.staged.release();
        self.ret.deinitialise();
        self.block_size = 0;
    }

    /// Pulls the block most recently captured by the render thread: audio by
    /// intersection copy into `dest_audio`, MIDI by merge-and-clear into
    /// `dest_midi`. Does nothing when nothing was captured or the matching
    /// view is absent.
    pub fn fill_send_buffer(
        &mut self,
        dest_audio: Option<&mut AudioBlockBuffer>,
        dest_midi: Option<&mut Vec<MidiEvent>>,
    ) {
        match self.shared.send_capability() {
            DeviceCapability::Audio => {
                if let Some(dest) = dest_audio {
                    if let Some(block) = self.send.take() {
                        copy_intersection(dest, 0, &block.audio, 0);
                        self.send.release(block);
                    }
                }
            }
            DeviceCapability::Midi => {
                if let Some(dest) = dest_midi {
                    if let Some(mut block) = self.send.take() {
                        merge_from_and_clear(dest, &mut block.midi);
                        self.send.release(block);
                    }
                }
            }
            DeviceCapability::None => {}
        }
    }

    /// Pushes freshly captured device input towards the render thread: audio
    /// by intersection copy, MIDI by merge without clearing, so return MIDI
    /// accumulates until the render thread drains it.
    pub fn fill_return_buffer(
        &mut self,
        src_audio: Option<&AudioBlockBuffer>,
        src_midi: Option<&[MidiEvent]>,
    ) {
        let mut staged_any = false;
        match self.shared.return_capability() {
            DeviceCapability::Audio => {
                if let Some(src) = src_audio {
                    self.staged.ensure_size(INSERT_CHANNELS, self.block_size);
                    copy_intersection(&mut self.staged.audio, 0, src, 0);
                    staged_any = true;
                }
            }
            DeviceCapability::Midi => {
                if let Some(src) = src_midi {
                    self.staged.midi.extend_from_slice(src);
                    staged_any = true;
                }
            }
            DeviceCapability::None => return,
        }

        if !staged_any && self.staged.midi.is_empty() {
            return;
        }
        // An undelivered block keeps the staging accumulating; the next call
        // after the render thread drains the lane flushes it.
        if self.ret.is_full() {
            return;
        }
        if let Some(mut block) = self.ret.acquire(INSERT_CHANNELS, self.block_size) {
            copy_intersection(&mut block.audio, 0, &self.staged.audio, 0);
            merge_from_and_clear(&mut block.midi, &mut self.staged.midi);
            self.ret.publish(block);
        }
    }
}
