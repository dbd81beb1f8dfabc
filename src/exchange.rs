//! Lock-free one-block exchange between the render thread and a device I/O
//! thread.
//!
//! Each direction of an insert gets a lane: a data ring one block deep plus a
//! recycle ring that returns spent blocks to the producer. The lane is seeded
//! with its full block pool up front, so the steady state moves heap
//! pointers only and neither side ever blocks on the other. When the consumer
//! stalls, the producer reuses the undelivered block and the stalled cycle's
//! signal is dropped silently.

use crate::buffer::BlockBuffer;
use rtrb::{Consumer, Producer, PushError, RingBuffer};

const LANE_BLOCKS: usize = 2;

/// Producer half of a lane.
#[derive(Debug)]
pub struct LaneTx {
    data: Producer<BlockBuffer>,
    free: Consumer<BlockBuffer>,
    stash: Vec<BlockBuffer>,
}

/// Consumer half of a lane.
#[derive(Debug)]
pub struct LaneRx {
    data: Consumer<BlockBuffer>,
    free: Producer<BlockBuffer>,
}

pub fn lane() -> (LaneTx, LaneRx) {
    let (data_tx, data_rx) = RingBuffer::new(1);
    let (mut free_tx, free_rx) = RingBuffer::new(LANE_BLOCKS);
    for _ in 0..LANE_BLOCKS {
        free_tx
            .push(BlockBuffer::default())
            .expect("seeding an empty recycle ring cannot fail");
    }
    (
        LaneTx {
            data: data_tx,
            free: free_rx,
            stash: Vec::with_capacity(LANE_BLOCKS),
        },
        LaneRx {
            data: data_rx,
            free: free_tx,
        },
    )
}

impl LaneTx {
    /// Hands out a cleared block sized to the current geometry. `None` only
    /// when the whole block pool is queued on the data ring.
    pub fn acquire(&mut self, channels: usize, frames: usize) -> Option<BlockBuffer> {
        let mut block = self.stash.pop().or_else(|| self.free.pop().ok())?;
        block.ensure_size(channels, frames);
        block.clear();
        Some(block)
    }

    /// True while an undelivered block is queued on the data ring.
    pub fn is_full(&self) -> bool {
        self.data.slots() == 0
    }

    pub fn publish(&mut self, block: BlockBuffer) {
        if let Err(PushError::Full(block)) = self.data.push(block) {
            // Consumer stalled with the data ring full; keep the block for
            // the next cycle instead of leaking it from the pool.
            self.stash.push(block);
        }
    }

    /// Drops the sample storage this half can reach. Blocks in flight shrink
    /// through `ensure_size` once they cycle back after reinitialisation.
    pub fn deinitialise(&mut self) {
        while let Ok(block) = self.free.pop() {
            self.stash.push(block);
        }
        for block in &mut self.stash {
            block.release();
        }
    }
}

impl LaneRx {
    pub fn take(&mut self) -> Option<BlockBuffer> {
        self.data.pop().ok()
    }

    /// Returns a spent block to the producer.
    pub fn release(&mut self, mut block: BlockBuffer) {
        block.midi.clear();
        // Recycle ring capacity equals the block pool, so this only fails
        // if a foreign block is fed in; dropping it is the safe answer.
        let _ = self.free.push(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_circulate_through_the_recycle_ring() {
        let (mut tx, mut rx) = lane();
        for round in 0..8 {
            let mut block = tx.acquire(2, 4).expect("block available");
            block.audio.channel_mut(0)[0] = round as f32;
            tx.publish(block);
            let got = rx.take().expect("block published");
            assert_eq!(got.audio.channel(0)[0], round as f32);
            rx.release(got);
        }
    }

    #[test]
    fn stalled_consumer_sees_only_the_oldest_block() {
        let (mut tx, mut rx) = lane();
        for round in 0..4 {
            let mut block = tx.acquire(1, 4).expect("stall never starves the producer");
            block.audio.channel_mut(0)[0] = round as f32;
            tx.publish(block);
        }
        let got = rx.take().expect("first block still queued");
        assert_eq!(got.audio.channel(0)[0], 0.0);
        rx.release(got);
        assert!(rx.take().is_none());
    }

    #[test]
    fn release_clears_midi_before_recycling() {
        let (mut tx, mut rx) = lane();
        let mut block = tx.acquire(1, 4).unwrap();
        block.midi.push(crate::midi::MidiEvent::new(0, vec![0xf8]));
        tx.publish(block);
        let got = rx.take().unwrap();
        rx.release(got);
        let block = tx.acquire(1, 4).unwrap();
        assert!(block.midi.is_empty());
    }

    #[test]
    fn deinitialise_releases_reachable_storage() {
        let (mut tx, _rx) = lane();
        let block = tx.acquire(2, 512).unwrap();
        tx.publish(block);
        tx.deinitialise();
        assert!(tx.stash.iter().all(|b| b.audio.frames() == 0));
        let block = tx.acquire(2, 256).unwrap();
        assert_eq!(block.audio.frames(), 256);
    }
}
