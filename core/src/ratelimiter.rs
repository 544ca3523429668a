use std::sync::Arc;
use tokio::sync::Semaphore;

/// Token-bucket pacing gate: releases up to `tokens_per_sec` ticks per
/// second. Owned by whoever drives the paced loop (scanner, dispatcher),
/// never a process global.
pub struct RateLimiter {
    sem: Arc<Semaphore>,
    burst: usize,
}

impl Clone for RateLimiter {
    fn clone(&self) -> Self { RateLimiter { sem: self.sem.clone(), burst: self.burst } }
}

impl RateLimiter {
    pub fn new(tokens_per_sec: u32) -> Self {
        let rate = tokens_per_sec.max(1);
        // Unused ticks may accumulate up to one second of burst, no further.
        let burst = rate as usize;
        let sem = Arc::new(Semaphore::new(0));
        let sem_bg = sem.clone();
        let interval_ms = (1000u32 / rate).max(1) as u64;
        // Refill in a background task. The tick interval bottoms out at 1ms,
        // so rates past 1000/s release several permits per tick; fractional
        // tokens carry over between ticks so the long-run rate stays exact.
        tokio::spawn(async move {
            let mut t = tokio::time::interval(std::time::Duration::from_millis(interval_ms));
            t.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut token_millis: u64 = 0;
            loop {
                t.tick().await;
                token_millis += rate as u64 * interval_ms;
                let earned = (token_millis / 1000) as usize;
                token_millis %= 1000;
                let room = burst.saturating_sub(sem_bg.available_permits());
                sem_bg.add_permits(earned.min(room));
            }
        });
        RateLimiter { sem, burst }
    }

    pub async fn acquire(&self) {
        if let Ok(permit) = self.sem.acquire().await {
            permit.forget();
        }
    }
}
