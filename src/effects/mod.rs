pub(crate) mod pulse;
pub(crate) mod streak;

use rand::Rng;

use crate::color::PackedColor;
use crate::config::Config;

pub use pulse::Pulse;
pub use streak::Streak;

/// A transient visual object living on one output line.
///
/// `update` advances internal time by one tick, `is_finished` marks the
/// effect for culling, and `color_at` resolves the contribution at an
/// integer strip position. `color_at` has no side effects and is called
/// once per LED per tick.
pub trait Effect {
    fn update(&mut self);
    fn is_finished(&self) -> bool;
    fn color_at(&self, pos: i32) -> Option<PackedColor>;
}

/// All live effects of one output line.
pub struct EffectPool {
    effects: Vec<Box<dyn Effect>>,
}

impl EffectPool {
    pub fn new() -> EffectPool {
        EffectPool {
            effects: Vec::new(),
        }
    }

    pub fn spawn(&mut self, effect: Box<dyn Effect>) {
        self.effects.push(effect);
    }

    /// Advances every live effect by one tick, then culls the finished ones.
    ///
    /// The update pass completes before any membership change, so no member
    /// is skipped or advanced twice.
    pub fn tick(&mut self) {
        for effect in &mut self.effects {
            effect.update();
        }
        self.effects.retain(|effect| !effect.is_finished());
    }

    pub fn live(&self) -> impl Iterator<Item = &dyn Effect> {
        self.effects.iter().map(|effect| effect.as_ref())
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }
}

/// Rolls the parameters for a streak entering from the far end of the strip.
pub fn random_streak(rng: &mut impl Rng, config: &Config) -> Streak {
    let tail_length = rng.gen_range(config.tail_length_min..=config.tail_length_max);
    // Speeds come in tenth-of-a-position steps.
    let speed_tenths = rng.gen_range(tenths(config.speed_min)..=tenths(config.speed_max));
    Streak::new(
        config.led_count as f32,
        random_channel(rng),
        random_channel(rng),
        random_channel(rng),
        tail_length,
        speed_tenths as f32 / 10.0,
    )
}

/// Rolls the parameters for a green blip somewhere on the strip.
pub fn random_pulse(rng: &mut impl Rng, config: &Config) -> Pulse {
    Pulse::new(
        rng.gen_range(0..=config.led_count as i32),
        config.blip_size,
        rng.gen_range(16u8..=128),
    )
}

// Streak channels come in steps of 10, up to 60.
fn random_channel(rng: &mut impl Rng) -> u8 {
    rng.gen_range(0u8..=6) * 10
}

fn tenths(value: f32) -> i32 {
    (value * 10.0).round() as i32
}
