use crate::color::{Gradient, GradientRamp, RAMP_SIZE, Rgba};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntensityConfig {
    pub gradient: Gradient,
    pub min: f64,
    pub max: f64,
    pub min_size: f64,
    pub max_size: f64,
}

impl Default for IntensityConfig {
    fn default() -> IntensityConfig {
        IntensityConfig {
            gradient: Gradient::default(),
            min: 0.0,
            max: 100.0,
            min_size: 0.0,
            max_size: 35.0,
        }
    }
}

/// Maps a scalar to a color through a 256-step ramp and to a size by clamped
/// linear interpolation. The ramp is derived from the gradient and rebuilt
/// whenever the gradient is replaced.
#[derive(Clone, Debug)]
pub struct IntensityMap {
    gradient: Gradient,
    ramp: GradientRamp,
    min: f64,
    max: f64,
    min_size: f64,
    max_size: f64,
}

impl Default for IntensityMap {
    fn default() -> IntensityMap {
        IntensityMap::new(&IntensityConfig::default())
    }
}

impl IntensityMap {
    pub fn new(config: &IntensityConfig) -> IntensityMap {
        IntensityMap {
            gradient: config.gradient.clone(),
            ramp: config.gradient.to_ramp(),
            min: config.min,
            max: config.max,
            min_size: config.min_size,
            max_size: config.max_size,
        }
    }

    pub fn configure(&mut self, config: &IntensityConfig) {
        *self = IntensityMap::new(config);
    }

    pub fn set_gradient(&mut self, gradient: Gradient) {
        self.ramp = gradient.to_ramp();
        self.gradient = gradient;
    }

    pub fn set_min(&mut self, min: f64) {
        self.min = min;
    }

    pub fn set_max(&mut self, max: f64) {
        self.max = max;
    }

    pub fn set_min_size(&mut self, min_size: f64) {
        self.min_size = min_size;
    }

    pub fn set_max_size(&mut self, max_size: f64) {
        self.max_size = max_size;
    }

    pub fn gradient(&self) -> &Gradient {
        &self.gradient
    }

    pub fn ramp(&self) -> &GradientRamp {
        &self.ramp
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Position of `value` in [0, 1]; `None` when the range is empty or a bound is NaN.
    fn normalize(&self, value: f64) -> Option<f64> {
        if !(self.max > self.min) {
            return None;
        }
        let value = if value.is_nan() { self.min } else { value.clamp(self.min, self.max) };
        Some((value - self.min) / (self.max - self.min))
    }

    pub fn color_for(&self, value: f64) -> Rgba {
        let index = match self.normalize(value) {
            Some(t) => (t * (RAMP_SIZE - 1) as f64).floor() as usize,
            None => RAMP_SIZE - 1,
        };
        self.ramp.sample(index)
    }

    pub fn size_for(&self, value: f64) -> f64 {
        match self.normalize(value) {
            Some(t) => self.min_size + t * (self.max_size - self.min_size),
            None => self.max_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(min: f64, max: f64) -> IntensityMap {
        IntensityMap::new(&IntensityConfig {
            min,
            max,
            min_size: 2.0,
            max_size: 20.0,
            ..Default::default()
        })
    }

    #[test]
    fn out_of_range_colors_are_clamped() {
        let m = map(0.0, 100.0);
        assert_eq!(m.color_for(150.0), m.color_for(100.0));
        assert_eq!(m.color_for(-3.0), m.color_for(0.0));
        assert_eq!(m.color_for(f64::NAN), m.color_for(0.0));
        assert_eq!(m.color_for(100.0), Rgba::opaque(255, 0, 0));
        assert_eq!(m.color_for(0.0), Rgba::opaque(0, 0, 255));
    }

    #[test]
    fn size_is_monotone_and_hits_both_ends() {
        let m = map(10.0, 30.0);
        assert_eq!(m.size_for(10.0), 2.0);
        assert_eq!(m.size_for(30.0), 20.0);
        assert_eq!(m.size_for(-1e9), 2.0);
        assert_eq!(m.size_for(1e9), 20.0);
        let sizes = (0..=200).map(|i| m.size_for(10.0 + i as f64 * 0.1)).collect::<Vec<_>>();
        assert!(sizes.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn empty_range_uses_max_size_and_top_color() {
        let m = map(5.0, 5.0);
        assert_eq!(m.size_for(0.0), 20.0);
        assert_eq!(m.size_for(5.0), 20.0);
        assert_eq!(m.color_for(1.0), m.ramp().sample(255));
        let inverted = map(9.0, 1.0);
        assert_eq!(inverted.size_for(3.0), 20.0);
    }

    #[test]
    fn nan_bounds_act_as_an_empty_range() {
        let m = map(0.0, f64::NAN);
        assert_eq!(m.size_for(5.0), 20.0);
        assert_eq!(m.color_for(5.0), m.ramp().sample(255));
        let m = map(f64::NAN, 10.0);
        assert_eq!(m.size_for(5.0), 20.0);
    }

    #[test]
    fn replacing_the_gradient_rebuilds_the_ramp() {
        let mut m = map(0.0, 1.0);
        let before = m.color_for(0.5);
        m.set_gradient(Gradient::new(vec![(0.0, Rgba::BLACK), (1.0, Rgba::BLACK)]).unwrap());
        assert_ne!(before, Rgba::BLACK);
        assert_eq!(m.color_for(0.5), Rgba::BLACK);
        assert_eq!(m.ramp(), &m.gradient().to_ramp());
    }

    #[test]
    fn setters_take_effect_immediately() {
        let mut m = map(0.0, 100.0);
        m.set_max(50.0);
        assert_eq!(m.color_for(50.0), m.color_for(100.0));
        m.set_min_size(0.0);
        m.set_max_size(10.0);
        assert_eq!(m.size_for(25.0), 5.0);
    }
}
