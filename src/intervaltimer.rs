use std::thread;
use std::time::{Duration, Instant};

/// Paces the scheduler at a fixed tick rate.
///
/// Keeps an absolute deadline so short ticks do not drift the rate, and
/// drops backlog instead of bursting when a tick overruns its slot.
pub struct IntervalTimer {
    interval: Duration,
    next_tick: Instant,
    ticks: u32,
    last_report: Instant,
}

impl IntervalTimer {
    pub fn new(rate_hz: f32) -> IntervalTimer {
        let interval = Duration::from_secs_f32(1.0 / rate_hz);
        IntervalTimer {
            interval,
            next_tick: Instant::now() + interval,
            ticks: 0,
            last_report: Instant::now(),
        }
    }

    pub fn sleep_until_next_tick(&mut self) {
        self.report_rate();

        let now = Instant::now();
        if self.next_tick > now {
            thread::sleep(self.next_tick - now);
            self.next_tick += self.interval;
        } else {
            log::warn!("tick overran its {} ms slot", self.interval.as_millis());
            self.next_tick = Instant::now() + self.interval;
        }
    }

    fn report_rate(&mut self) {
        self.ticks += 1;

        let elapsed = self.last_report.elapsed();
        if elapsed > Duration::from_secs(5) {
            log::debug!(
                "tick rate: {:.1} Hz",
                self.ticks as f32 / elapsed.as_secs_f32()
            );
            self.ticks = 0;
            self.last_report = Instant::now();
        }
    }
}
