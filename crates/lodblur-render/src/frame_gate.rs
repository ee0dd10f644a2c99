//! Bounds the number of frames in flight.
//!
//! A bounded channel pre-filled with one token per allowed frame acts as a
//! counting semaphore. Encoding a frame takes a token; the token goes back
//! when the GPU reports that frame's work complete.

use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};

/// How long to block between device polls while waiting for a token.
const WAIT_SLICE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct FrameGate {
    tokens: Receiver<()>,
    returns: Sender<()>,
    capacity: usize,
}

impl FrameGate {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (returns, tokens) = bounded(capacity);
        for _ in 0..capacity {
            // Fresh channel with room for every token.
            let _ = returns.try_send(());
        }
        Self {
            tokens,
            returns,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tokens currently available.
    pub fn available(&self) -> usize {
        self.tokens.len()
    }

    pub fn try_acquire(&self) -> Option<FramePermit> {
        self.tokens.try_recv().ok().map(|()| self.permit())
    }

    /// Blocks until a frame slot is free.
    ///
    /// Tokens come back from queue completion callbacks, which only run while
    /// the device is polled, so the wait is a blocking poll on `device`.
    pub fn acquire(&self, device: &wgpu::Device) -> FramePermit {
        self.acquire_with(|| {
            if let Err(e) = device.poll(wgpu::PollType::wait_indefinitely()) {
                log::warn!("device poll failed while waiting for a frame slot: {e}");
            }
        })
    }

    /// Blocks until a frame slot is free, calling `wait` before each blocking
    /// interval.
    pub fn acquire_with(&self, mut wait: impl FnMut()) -> FramePermit {
        loop {
            match self.tokens.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => return self.permit(),
                Err(TryRecvError::Empty) => {}
            }
            wait();
            match self.tokens.recv_timeout(WAIT_SLICE) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => return self.permit(),
                Err(RecvTimeoutError::Timeout) => {
                    log::warn!("still waiting for an in-flight frame to complete");
                }
            }
        }
    }

    fn permit(&self) -> FramePermit {
        FramePermit {
            returns: Some(self.returns.clone()),
        }
    }
}

/// One frame slot. Dropping the permit returns the slot.
#[derive(Debug)]
pub struct FramePermit {
    returns: Option<Sender<()>>,
}

impl FramePermit {
    /// Returns the slot now.
    pub fn release(mut self) {
        self.give_back();
    }

    /// Returns the slot when all work submitted to `queue` so far completes.
    ///
    /// Call after submitting the frame's command buffer.
    pub fn release_on_completion(mut self, queue: &wgpu::Queue) {
        if let Some(returns) = self.returns.take() {
            queue.on_submitted_work_done(move || {
                let _ = returns.try_send(());
            });
        }
    }

    fn give_back(&mut self) {
        if let Some(returns) = self.returns.take() {
            let _ = returns.try_send(());
        }
    }
}

impl Drop for FramePermit {
    fn drop(&mut self) {
        self.give_back();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_hands_out_capacity_permits() {
        let gate = FrameGate::new(2);
        let a = gate.try_acquire();
        let b = gate.try_acquire();
        assert!(a.is_some() && b.is_some());
        assert!(gate.try_acquire().is_none());
        drop(a);
        assert_eq!(gate.available(), 1);
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let gate = FrameGate::new(0);
        assert_eq!(gate.capacity(), 1);
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn release_returns_token_once() {
        let gate = FrameGate::new(1);
        let permit = gate.try_acquire().unwrap();
        permit.release();
        assert_eq!(gate.available(), 1);
    }

    #[test]
    fn acquire_waits_until_slot_is_returned() {
        let gate = FrameGate::new(1);
        let held = gate.try_acquire().unwrap();
        let mut held = Some(held);
        let mut waits = 0;
        let _permit = gate.acquire_with(|| {
            waits += 1;
            held.take();
        });
        assert_eq!(waits, 1);
        assert_eq!(gate.available(), 0);
    }

    #[test]
    fn acquire_unblocks_from_another_thread() {
        let gate = FrameGate::new(1);
        let held = gate.try_acquire().unwrap();
        let worker = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            drop(held);
        });
        let _permit = gate.acquire_with(|| {});
        worker.join().unwrap();
    }
}
