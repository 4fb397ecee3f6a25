use std::sync::Mutex;

use rand::Rng;
use tokio::time::{Duration, Instant};

pub const SAMPLE_SYMBOL: &str = "HPG";

/// Simulated HPG price for demo/sampling mode.
///
/// The price is redrawn uniformly from `[min, max]` once `rotate` has elapsed
/// since the last draw; readers in between see the same value.
pub struct SampleFeed {
    min: u32,
    max: u32,
    rotate: Duration,
    current: Mutex<Option<(f64, Instant)>>,
}

impl SampleFeed {
    pub fn new(min: u32, max: u32, rotate: Duration) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min,
            max,
            rotate,
            current: Mutex::new(None),
        }
    }

    pub fn price(&self) -> f64 {
        let mut guard = self.current.lock().unwrap_or_else(|e| e.into_inner());

        match *guard {
            Some((price, drawn_at)) if drawn_at.elapsed() < self.rotate => price,
            _ => {
                let price = f64::from(rand::thread_rng().gen_range(self.min..=self.max));
                *guard = Some((price, Instant::now()));
                tracing::info!("Sample {} price set to {}", SAMPLE_SYMBOL, price);
                price
            }
        }
    }
}
