use std::sync::atomic::{AtomicBool, Ordering};

use rand::Rng;
use thiserror::Error;

use crate::color::PackedColor;
use crate::compositor;
use crate::config::Config;
use crate::driver::{DriverError, LedDriver};
use crate::effects::{self, EffectPool};
use crate::intervaltimer::IntervalTimer;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("LED driver initialization failed")]
    Init(#[source] DriverError),
    #[error("frame hand-off to the LED driver failed")]
    Render(#[source] DriverError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Initializing,
    Running,
    ShuttingDown,
}

struct Line {
    pool: EffectPool,
    frame: Vec<PackedColor>,
}

/// Owns the whole simulation: one effect pool and frame buffer per output
/// line, the spawn RNG and the driver. Drives the composite, render, spawn,
/// age cycle until a fatal driver error or an external stop request.
pub struct Scheduler<D: LedDriver, R: Rng> {
    config: Config,
    driver: D,
    rng: R,
    lines: Vec<Line>,
    timer: IntervalTimer,
    state: State,
}

impl<D: LedDriver, R: Rng> Scheduler<D, R> {
    pub fn new(config: Config, driver: D, rng: R) -> Scheduler<D, R> {
        let lines = config
            .lines
            .iter()
            .map(|_| Line {
                pool: EffectPool::new(),
                frame: vec![0; config.led_count],
            })
            .collect();
        let timer = IntervalTimer::new(config.tick_rate_hz);

        Scheduler {
            config,
            driver,
            rng,
            lines,
            timer,
            state: State::Initializing,
        }
    }

    /// Runs until the stop flag is raised or a driver call fails.
    ///
    /// Whatever the exit path, the driver is shut down exactly once before
    /// the result propagates.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<(), SchedulerError> {
        let result = match self.driver.initialize(&self.config.driver_config()) {
            Ok(()) => {
                self.state = State::Running;
                log::info!("simulation running on {} lines", self.lines.len());
                self.run_loop(stop)
            }
            Err(err) => Err(SchedulerError::Init(err)),
        };

        self.state = State::ShuttingDown;
        log::info!("releasing the LED driver");
        self.driver.shutdown();
        result
    }

    fn run_loop(&mut self, stop: &AtomicBool) -> Result<(), SchedulerError> {
        // The stop flag is observed here only, never mid-tick.
        while self.state == State::Running && !stop.load(Ordering::Relaxed) {
            self.tick()?;
            self.timer.sleep_until_next_tick();
        }
        Ok(())
    }

    /// One simulation step: for every line, composite the current pool
    /// state, hand the frame to the driver, roll the spawn dice, then age
    /// the pool.
    fn tick(&mut self) -> Result<(), SchedulerError> {
        for index in 0..self.lines.len() {
            let line = &mut self.lines[index];

            compositor::composite(&line.pool, &mut line.frame);
            self.driver
                .render(index, &line.frame)
                .map_err(SchedulerError::Render)?;

            if self.rng.gen_ratio(1, self.config.streak_spawn_odds) {
                line.pool
                    .spawn(Box::new(effects::random_streak(&mut self.rng, &self.config)));
            }
            if self.rng.gen_ratio(1, self.config.pulse_spawn_odds) {
                line.pool
                    .spawn(Box::new(effects::random_pulse(&mut self.rng, &self.config)));
            }

            line.pool.tick();
            log::trace!("line {}: {} live effects", index, line.pool.len());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::color;
    use crate::driver::DriverConfig;
    use crate::effects::{Pulse, Streak};

    #[derive(Default)]
    struct FakeDriver {
        fail_init: bool,
        fail_render_at: Option<usize>,
        init_calls: usize,
        render_calls: usize,
        shutdown_calls: usize,
        frames: Vec<(usize, Vec<PackedColor>)>,
    }

    impl LedDriver for FakeDriver {
        fn initialize(&mut self, _config: &DriverConfig) -> Result<(), DriverError> {
            self.init_calls += 1;
            if self.fail_init {
                return Err(DriverError::Encode("wired to fail".to_string()));
            }
            Ok(())
        }

        fn render(&mut self, line: usize, frame: &[PackedColor]) -> Result<(), DriverError> {
            assert_eq!(self.shutdown_calls, 0, "render after shutdown");
            let call = self.render_calls;
            self.render_calls += 1;
            if self.fail_render_at == Some(call) {
                return Err(DriverError::Encode("wired to fail".to_string()));
            }
            self.frames.push((line, frame.to_vec()));
            Ok(())
        }

        fn shutdown(&mut self) {
            self.shutdown_calls += 1;
        }
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.led_count = 10;
        config.tick_rate_hz = 1000.0;
        config
    }

    fn test_scheduler(config: Config) -> Scheduler<FakeDriver, StdRng> {
        Scheduler::new(config, FakeDriver::default(), StdRng::seed_from_u64(7))
    }

    #[test]
    fn stop_before_the_first_tick_still_releases_the_driver() {
        let stop = AtomicBool::new(true);
        let mut scheduler = test_scheduler(test_config());
        assert_eq!(scheduler.state, State::Initializing);

        assert!(scheduler.run(&stop).is_ok());
        assert_eq!(scheduler.state, State::ShuttingDown);
        assert_eq!(scheduler.driver.init_calls, 1);
        assert_eq!(scheduler.driver.render_calls, 0);
        assert_eq!(scheduler.driver.shutdown_calls, 1);
    }

    #[test]
    fn init_failure_skips_the_loop_but_not_the_shutdown() {
        let stop = AtomicBool::new(false);
        let mut scheduler = test_scheduler(test_config());
        scheduler.driver.fail_init = true;

        let result = scheduler.run(&stop);
        assert!(matches!(result, Err(SchedulerError::Init(_))));
        assert_eq!(scheduler.driver.render_calls, 0);
        assert_eq!(scheduler.driver.shutdown_calls, 1);
    }

    #[test]
    fn render_failure_stops_the_loop_and_shuts_down_once() {
        let stop = AtomicBool::new(false);
        let mut scheduler = test_scheduler(test_config());
        // Two lines per tick: the third render call is line 0 of tick two.
        scheduler.driver.fail_render_at = Some(2);

        let result = scheduler.run(&stop);
        assert!(matches!(result, Err(SchedulerError::Render(_))));
        assert_eq!(scheduler.driver.render_calls, 3);
        assert_eq!(scheduler.driver.shutdown_calls, 1);
        assert_eq!(scheduler.state, State::ShuttingDown);
    }

    #[test]
    fn frames_reach_the_driver_before_the_pool_ages() {
        let mut scheduler = test_scheduler(test_config());
        scheduler.lines[0]
            .pool
            .spawn(Box::new(Streak::new(10.0, 30, 0, 0, 5, 1.0)));

        scheduler.tick().unwrap();

        // The streak head still sat at position 10 when the frame went out.
        let (line, frame) = &scheduler.driver.frames[0];
        assert_eq!(*line, 0);
        assert_eq!(frame[0], color::pack(0, 30, 0));
        assert!(frame[1..].iter().all(|&led| led == 0));
    }

    #[test]
    fn lines_keep_independent_pools() {
        let mut config = test_config();
        // Spawn on every line every tick.
        config.streak_spawn_odds = 1;
        config.pulse_spawn_odds = 1;
        let mut scheduler = test_scheduler(config);

        scheduler.tick().unwrap();
        assert_eq!(scheduler.lines[0].pool.len(), 2);
        assert_eq!(scheduler.lines[1].pool.len(), 2);

        scheduler.lines[0].pool.spawn(Box::new(Pulse::new(3, 12, 50)));
        assert_eq!(scheduler.lines[0].pool.len(), 3);
        assert_eq!(scheduler.lines[1].pool.len(), 2);
    }
}
