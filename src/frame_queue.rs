//! Bounded hand-off between a capture thread and the pipeline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, TrySendError};
use log::{debug, warn};

/// What the capture thread does when the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backpressure {
    /// Wait for the consumer to free a slot.
    Block,
    /// Evict the oldest queued frame to make room.
    DropOldest,
}

/// One pull from a frame source.
pub enum Pull<T> {
    Item(T),
    /// A frame that could not be decoded; capture continues.
    Skip,
    End,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub captured: usize,
    pub skipped: usize,
    pub dropped: usize,
}

pub struct CaptureQueue<T> {
    receiver: Option<Receiver<T>>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<CaptureStats>>,
}

impl<T: Send + 'static> CaptureQueue<T> {
    /// Starts a thread that pulls from `source` until it ends or the queue is
    /// finished. `depth` is raised to at least one slot.
    pub fn spawn<S>(mut source: S, depth: usize, policy: Backpressure) -> Self
    where
        S: FnMut() -> Pull<T> + Send + 'static,
    {
        let (sender, receiver) = bounded(depth.max(1));
        // Only the drop-oldest producer holds a receiver, so a blocking producer
        // sees the channel disconnect once the consumer goes away.
        let evict = match policy {
            Backpressure::Block => None,
            Backpressure::DropOldest => Some(receiver.clone()),
        };
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            let mut stats = CaptureStats::default();
            'capture: while !stop_flag.load(Ordering::Acquire) {
                let mut item = match source() {
                    Pull::Item(item) => item,
                    Pull::Skip => {
                        stats.skipped += 1;
                        continue;
                    }
                    Pull::End => break,
                };
                stats.captured += 1;
                match &evict {
                    None => {
                        if sender.send(item).is_err() {
                            break;
                        }
                    }
                    Some(evict) => loop {
                        match sender.try_send(item) {
                            Ok(()) => break,
                            Err(TrySendError::Full(back)) => {
                                if evict.try_recv().is_ok() {
                                    stats.dropped += 1;
                                }
                                item = back;
                            }
                            Err(TrySendError::Disconnected(_)) => break 'capture,
                        }
                    },
                }
            }
            debug!("capture thread finished: {:?}", stats);
            stats
        });

        Self {
            receiver: Some(receiver),
            stop,
            handle: Some(handle),
        }
    }
}

impl<T> CaptureQueue<T> {
    /// Next queued frame; `None` once the source has ended and the queue is drained.
    pub fn recv(&self) -> Option<T> {
        self.receiver.as_ref()?.recv().ok()
    }

    /// Stops the capture thread and returns its counters.
    pub fn finish(mut self) -> CaptureStats {
        self.shutdown()
    }

    fn shutdown(&mut self) -> CaptureStats {
        self.stop.store(true, Ordering::Release);
        // Dropping the receiver unblocks a producer waiting on a full queue.
        self.receiver.take();
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or_else(|_| {
                warn!("capture thread panicked");
                CaptureStats::default()
            }),
            None => CaptureStats::default(),
        }
    }
}

impl<T> Drop for CaptureQueue<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn counter(limit: usize) -> impl FnMut() -> Pull<usize> + Send + 'static {
        let mut next = 0;
        move || {
            if next == limit {
                return Pull::End;
            }
            next += 1;
            Pull::Item(next)
        }
    }

    #[test]
    fn blocking_queue_delivers_everything_in_order() {
        let queue = CaptureQueue::spawn(counter(50), 2, Backpressure::Block);
        let received: Vec<usize> = std::iter::from_fn(|| queue.recv()).collect();
        assert_eq!(received, (1..=50).collect::<Vec<_>>());
        let stats = queue.finish();
        assert_eq!(stats.captured, 50);
        assert_eq!(stats.dropped, 0);
    }

    #[test]
    fn drop_oldest_keeps_order_and_accounts_for_drops() {
        let queue = CaptureQueue::spawn(counter(200), 1, Backpressure::DropOldest);
        let mut received = Vec::new();
        while let Some(item) = queue.recv() {
            thread::sleep(Duration::from_micros(200));
            received.push(item);
        }
        let stats = queue.finish();
        assert!(received.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(stats.captured, 200);
        assert_eq!(received.len() + stats.dropped, 200);
        assert_eq!(received.last(), Some(&200));
    }

    #[test]
    fn skipped_frames_are_counted_not_queued() {
        let mut n = 0;
        let source = move || {
            n += 1;
            match n {
                1 | 3 => Pull::Item(n),
                2 => Pull::Skip,
                _ => Pull::End,
            }
        };
        let queue = CaptureQueue::spawn(source, 4, Backpressure::Block);
        assert_eq!(queue.recv(), Some(1));
        assert_eq!(queue.recv(), Some(3));
        assert_eq!(queue.recv(), None);
        let stats = queue.finish();
        assert_eq!((stats.captured, stats.skipped), (2, 1));
    }

    #[test]
    fn finishing_early_stops_an_endless_source() {
        for policy in [Backpressure::Block, Backpressure::DropOldest] {
            let queue = CaptureQueue::spawn(|| Pull::Item(0u8), 3, policy);
            assert_eq!(queue.recv(), Some(0));
            let stats = queue.finish();
            assert!(stats.captured >= 1);
        }
    }
}
