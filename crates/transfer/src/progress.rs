use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

/// Default speed window.
const DEFAULT_WINDOW: Duration = Duration::from_secs(5);

/// Default number of retained speed samples.
const DEFAULT_MAX_SAMPLES: usize = 100;

/// Snapshot of an upload in flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UploadProgress {
    pub total_bytes: u64,
    pub sent_bytes: u64,
    pub blocks_done: u32,
    pub block_count: u32,
    /// Bytes per second over the recent window, 0.0 until measurable.
    pub bytes_per_second: f64,
}

impl UploadProgress {
    pub fn percentage(&self) -> f64 {
        if self.total_bytes == 0 {
            return 100.0;
        }
        self.sent_bytes as f64 * 100.0 / self.total_bytes as f64
    }

    pub fn is_complete(&self) -> bool {
        self.blocks_done == self.block_count
    }
}

impl fmt::Display for UploadProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1}% done ({} sent of {})",
            self.percentage(),
            self.sent_bytes,
            self.total_bytes
        )?;
        if self.bytes_per_second > 0.0 {
            write!(f, " at {:.1} KiB/s", self.bytes_per_second / 1024.0)?;
        }
        Ok(())
    }
}

/// Accumulates acknowledged blocks of one upload.
#[derive(Debug)]
pub struct ProgressTracker {
    total_bytes: u64,
    sent_bytes: u64,
    blocks_done: u32,
    block_count: u32,
    speed: SpeedCalculator,
}

impl ProgressTracker {
    pub fn new(total_bytes: u64, block_count: u32) -> Self {
        Self {
            total_bytes,
            sent_bytes: 0,
            blocks_done: 0,
            block_count,
            speed: SpeedCalculator::new(None, None),
        }
    }

    /// Records one acknowledged block of `len` bytes.
    pub fn record(&mut self, len: u64) -> UploadProgress {
        self.record_at(len, Instant::now())
    }

    fn record_at(&mut self, len: u64, at: Instant) -> UploadProgress {
        self.sent_bytes += len;
        self.blocks_done += 1;
        self.speed.add_sample_at(len, at);
        self.snapshot()
    }

    pub fn snapshot(&self) -> UploadProgress {
        UploadProgress {
            total_bytes: self.total_bytes,
            sent_bytes: self.sent_bytes,
            blocks_done: self.blocks_done,
            block_count: self.block_count,
            bytes_per_second: self.speed.bytes_per_second(),
        }
    }

    /// Estimated time until the remaining bytes are sent.
    pub fn eta(&self) -> Option<Duration> {
        self.speed.eta(self.total_bytes.saturating_sub(self.sent_bytes))
    }
}

// ---------------------------------------------------------------------------
// SpeedCalculator
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct SpeedSample {
    bytes: u64,
    timestamp: Instant,
}

/// Transfer speed over a sliding window of samples.
#[derive(Debug)]
pub struct SpeedCalculator {
    samples: VecDeque<SpeedSample>,
    max_samples: usize,
    window: Duration,
}

impl SpeedCalculator {
    /// `window` defaults to 5 s, `max_samples` to 100.
    pub fn new(window: Option<Duration>, max_samples: Option<usize>) -> Self {
        Self {
            samples: VecDeque::new(),
            max_samples: max_samples.unwrap_or(DEFAULT_MAX_SAMPLES).max(2),
            window: window.unwrap_or(DEFAULT_WINDOW),
        }
    }

    pub fn add_sample_at(&mut self, bytes: u64, timestamp: Instant) {
        self.samples.push_back(SpeedSample { bytes, timestamp });

        if let Some(cutoff) = timestamp.checked_sub(self.window) {
            while self.samples.front().is_some_and(|s| s.timestamp < cutoff) {
                self.samples.pop_front();
            }
        }
        while self.samples.len() > self.max_samples {
            self.samples.pop_front();
        }
    }

    /// Average bytes per second within the window; 0.0 with fewer than two
    /// samples.
    pub fn bytes_per_second(&self) -> f64 {
        let (Some(first), Some(last)) = (self.samples.front(), self.samples.back()) else {
            return 0.0;
        };
        let elapsed = last.timestamp.saturating_duration_since(first.timestamp);
        if self.samples.len() < 2 || elapsed.is_zero() {
            return 0.0;
        }
        let total: u64 = self.samples.iter().map(|s| s.bytes).sum();
        total as f64 / elapsed.as_secs_f64()
    }

    /// `None` while the speed is unknown.
    pub fn eta(&self, remaining_bytes: u64) -> Option<Duration> {
        let speed = self.bytes_per_second();
        if speed <= 0.0 {
            return None;
        }
        Some(Duration::from_secs_f64(remaining_bytes as f64 / speed))
    }
}
