//! Placed stipple dots and their random displacement.

use crate::float_types::Real;
use crate::stipple::rng::StippleRng;
use nalgebra::{Point2, Vector2};

/// One dot of the synthesized image, in canvas coordinates (y up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StippleDot {
    pub position: Point2<Real>,
    pub size: Vector2<Real>,
    /// Index into the sprite sheet.
    pub sprite: u32,
    pub offset: Vector2<Real>,
    pub can_have_offset_applied: bool,
    /// Placed because it lies on a detected edge of the model.
    pub silhouette: bool,
}

impl StippleDot {
    pub fn new(position: Point2<Real>, size: Vector2<Real>, sprite: u32) -> Self {
        StippleDot {
            position,
            size,
            sprite,
            offset: Vector2::zeros(),
            can_have_offset_applied: true,
            silhouette: false,
        }
    }

    pub fn semi_size(&self) -> Vector2<Real> {
        self.size / 2.0
    }

    /// Position including the offset, when the dot accepts one.
    pub fn final_position(&self) -> Point2<Real> {
        if self.can_have_offset_applied {
            self.position + self.offset
        } else {
            self.position
        }
    }
}

/// Give every dot a fresh random offset of up to `dispersion / 10` pixels.
///
/// The angle is drawn in whole units and used as radians directly, and both
/// offset components are truncated toward zero.
pub fn apply_dispersion<'a>(dots: impl IntoIterator<Item = &'a mut StippleDot>, dispersion: u32, seed: u32) {
    let mut rng = StippleRng::new(seed);
    let reach = dispersion / 10;
    for dot in dots {
        let alpha = rng.below(360) as Real;
        let length = rng.below(reach + 1) as Real;
        dot.offset = if reach == 0 {
            Vector2::zeros()
        } else {
            Vector2::new((length * alpha.cos()).trunc(), (length * alpha.sin()).trunc())
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn dot_at(x: Real, y: Real) -> StippleDot {
        StippleDot::new(Point2::new(x, y), Vector2::new(4.0, 4.0), 0)
    }

    #[test]
    fn offset_only_applies_when_allowed() {
        let mut dot = dot_at(10.0, 10.0);
        dot.offset = Vector2::new(2.0, -3.0);
        assert_eq!(dot.final_position(), Point2::new(12.0, 7.0));
        dot.can_have_offset_applied = false;
        assert_eq!(dot.final_position(), Point2::new(10.0, 10.0));
    }

    #[test]
    fn dispersion_below_ten_is_zero() {
        let mut dots = vec![dot_at(0.0, 0.0); 8];
        apply_dispersion(&mut dots, 9, 1);
        assert!(dots.iter().all(|d| d.offset == Vector2::zeros()));
    }

    #[test]
    fn dispersion_is_bounded_integral_and_seeded() {
        let mut a = vec![dot_at(0.0, 0.0); 64];
        let mut b = a.clone();
        apply_dispersion(&mut a, 50, 7);
        apply_dispersion(&mut b, 50, 7);
        assert_eq!(a, b);
        for dot in &a {
            assert!(dot.offset.norm() <= 5.0 + 1e-9);
            assert_relative_eq!(dot.offset.x, dot.offset.x.trunc());
        }
        assert!(a.iter().any(|d| d.offset != Vector2::zeros()));
    }
}
