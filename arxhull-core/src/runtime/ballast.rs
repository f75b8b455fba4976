//! `MemoryBallast` (spec §4.8, optional): a worker thread that holds onto
//! 64 MiB blocks while free RAM comfortably exceeds `headroom + hysteresis`,
//! releasing them as soon as it doesn't, to stabilise a system sitting right
//! at the edge of the governor's pressure threshold rather than letting it
//! oscillate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// One ballast block; touched on allocation so the OS actually backs the
/// pages (a bare `Vec::with_capacity` can be satisfied lazily).
const BLOCK_BYTES: usize = 64 * 1024 * 1024;

fn touch(block: &mut [u8]) {
    for byte in block.iter_mut().step_by(4096) {
        *byte = 0;
    }
}

/// A running ballast worker; dropping this stops the thread and frees all
/// held blocks.
pub struct MemoryBallast {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl MemoryBallast {
    /// Spawn a ballast thread. `sample_avail_bytes` is polled once per
    /// `poll_interval`; while it reports more than `headroom_bytes +
    /// hysteresis_bytes` free, one more block is grown (up to
    /// `max_blocks`), otherwise the most recently grown block is released.
    pub fn spawn(
        headroom_bytes: u64,
        hysteresis_bytes: u64,
        max_blocks: usize,
        poll_interval: Duration,
        sample_avail_bytes: impl Fn() -> u64 + Send + 'static,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_thread = Arc::clone(&stop);
        let handle = std::thread::spawn(move || {
            let mut blocks: Vec<Vec<u8>> = Vec::new();
            while !stop_thread.load(Ordering::Relaxed) {
                let avail = sample_avail_bytes();
                let threshold = headroom_bytes.saturating_add(hysteresis_bytes);
                if avail > threshold && blocks.len() < max_blocks {
                    let mut block = vec![0u8; BLOCK_BYTES];
                    touch(&mut block);
                    blocks.push(block);
                } else if avail <= headroom_bytes {
                    blocks.pop();
                }
                std::thread::sleep(poll_interval);
            }
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Signal the ballast thread to stop and wait for it to exit.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

impl Drop for MemoryBallast {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    #[test]
    fn ballast_spawns_and_stops_cleanly() {
        let avail = Arc::new(AtomicU64::new(1_000_000_000));
        let avail_reader = Arc::clone(&avail);
        let ballast = MemoryBallast::spawn(
            1000,
            500,
            1,
            Duration::from_millis(5),
            move || avail_reader.load(Ordering::Relaxed),
        );
        std::thread::sleep(Duration::from_millis(30));
        ballast.stop();
    }
}
