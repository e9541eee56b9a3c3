use crate::color::{self, PackedColor};
use crate::effects::Effect;

/// A stationary blip that widens and then collapses over a short lifetime.
///
/// The visible half-width follows a cubic easing of the remaining duration:
/// it rises while the first half of the lifetime burns down and falls
/// afterwards, which gives the blip silhouette without a real Gaussian.
pub struct Pulse {
    pub position: i32,
    pub half_duration: f32,
    pub blip_size: f32,
    pub green: u8,
}

impl Pulse {
    pub fn new(position: i32, blip_size: u32, green: u8) -> Pulse {
        let blip_size = blip_size as f32;
        Pulse {
            position,
            half_duration: blip_size / 2.0,
            blip_size,
            green,
        }
    }

    /// Half-width of the lit span around `position`.
    fn radius(&self) -> f32 {
        let m = self.blip_size / 2.0;
        let s = if self.half_duration > self.blip_size / 4.0 {
            (m - self.half_duration) + 1.0
        } else {
            self.half_duration / 2.0
        };
        (s * s * s) / m
    }
}

impl Effect for Pulse {
    fn update(&mut self) {
        self.half_duration -= 1.0;
    }

    fn is_finished(&self) -> bool {
        self.half_duration <= 0.0
    }

    fn color_at(&self, pos: i32) -> Option<PackedColor> {
        let radius = self.radius();
        let center = self.position as f32;
        let pos = pos as f32;
        if center - radius < pos && pos < center + radius {
            Some(color::pack(self.green, 0, 0))
        } else {
            None
        }
    }
}
