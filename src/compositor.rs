use crate::color::PackedColor;
use crate::effects::EffectPool;

/// Resolves the composited color at one simulation position by OR-folding
/// every live effect's contribution.
///
/// Bitwise OR is the blending law of the packed format, not an
/// approximation of additive light; absent contributions count as black.
pub fn resolve(pool: &EffectPool, pos: i32) -> PackedColor {
    pool.live()
        .filter_map(|effect| effect.color_at(pos))
        .fold(0, |color, contribution| color | contribution)
}

/// Fills one line's frame buffer from its pool.
///
/// The buffer is the mirror of the simulation axis: index `i` holds the
/// color at simulation position `len - i`, so effects travelling toward
/// zero appear to enter at the far end of the strip.
pub fn composite(pool: &EffectPool, frame: &mut [PackedColor]) {
    let count = frame.len() as i32;
    for (i, led) in frame.iter_mut().enumerate() {
        *led = resolve(pool, count - i as i32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::color;
    use crate::effects::{Pulse, Streak};

    #[test]
    fn composites_the_mirror_of_the_simulation_axis() {
        let mut pool = EffectPool::new();
        pool.spawn(Box::new(Streak::new(10.0, 30, 0, 0, 5, 1.0)));

        // The head sits at simulation position 10, which lands on index 0.
        let mut frame = vec![0; 10];
        composite(&pool, &mut frame);
        assert_eq!(frame[0], color::pack(0, 30, 0));
        assert!(frame[1..].iter().all(|&led| led == 0));
    }

    #[test]
    fn composition_is_idempotent() {
        let mut pool = EffectPool::new();
        pool.spawn(Box::new(Streak::new(4.0, 30, 40, 50, 5, 1.0)));
        pool.spawn(Box::new(Pulse::new(5, 12, 64)));

        let mut first = vec![0; 10];
        let mut second = vec![0; 10];
        composite(&pool, &mut first);
        composite(&pool, &mut second);
        assert_eq!(first, second);
    }

    #[test]
    fn overlapping_effects_combine_by_bitwise_or() {
        let mut pool = EffectPool::new();
        // A pure-blue streak head and a pure-green pulse on the same position
        pool.spawn(Box::new(Streak::new(5.0, 0, 0, 60, 5, 1.0)));
        pool.spawn(Box::new(Pulse::new(5, 12, 64)));

        assert_eq!(resolve(&pool, 5), color::pack(64, 0, 60));
    }

    #[test]
    fn empty_pool_overwrites_the_frame_with_black() {
        let pool = EffectPool::new();
        let mut frame = vec![0xffffff; 8];
        composite(&pool, &mut frame);
        assert!(frame.iter().all(|&led| led == 0));
    }
}
