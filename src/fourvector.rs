use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Neg, Sub};

/// A Minkowski four-vector with metric (+, -, -, -).
///
/// Used for both positions (t, x) and momenta (E, p). Spatial components
/// are a `nalgebra` vector so the kinematics code can use dot/cross/norm
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FourVector {
    pub t: f64,
    pub x: Vector3<f64>,
}

impl FourVector {
    pub fn new(t: f64, x1: f64, x2: f64, x3: f64) -> Self {
        Self {
            t,
            x: Vector3::new(x1, x2, x3),
        }
    }

    pub fn from_parts(t: f64, x: Vector3<f64>) -> Self {
        Self { t, x }
    }

    /// Four-momentum of a particle at rest with the given mass.
    pub fn at_rest(mass: f64) -> Self {
        Self {
            t: mass,
            x: Vector3::zeros(),
        }
    }

    pub fn threevec(&self) -> Vector3<f64> {
        self.x
    }

    /// Minkowski square t^2 - |x|^2. Negative for spacelike vectors.
    pub fn sqr(&self) -> f64 {
        self.t * self.t - self.x.dot(&self.x)
    }

    /// Invariant mass / proper interval. Clamped at zero for vectors that
    /// are spacelike only through floating-point noise.
    pub fn abs(&self) -> f64 {
        self.sqr().max(0.0).sqrt()
    }

    /// Minkowski scalar product with another four-vector.
    pub fn dot(&self, other: &FourVector) -> f64 {
        self.t * other.t - self.x.dot(&other.x)
    }

    /// Three-velocity x/t. Only meaningful for momenta (p/E) and for
    /// positions with t != 0.
    pub fn velocity(&self) -> Vector3<f64> {
        self.x / self.t
    }

    /// Lorentz boost into the frame moving with velocity `beta`.
    ///
    /// `boost(beta)` followed by `boost(-beta)` is the identity up to
    /// floating-point roundoff.
    pub fn boost(&self, beta: Vector3<f64>) -> FourVector {
        let beta_sqr = beta.dot(&beta);
        if beta_sqr < 1.0e-30 {
            return *self;
        }
        let gamma = 1.0 / (1.0 - beta_sqr).sqrt();
        let bp = beta.dot(&self.x);
        let t = gamma * (self.t - bp);
        let x = self.x + ((gamma - 1.0) * bp / beta_sqr - gamma * self.t) * beta;
        FourVector { t, x }
    }
}

impl Add for FourVector {
    type Output = FourVector;
    fn add(self, rhs: FourVector) -> FourVector {
        FourVector {
            t: self.t + rhs.t,
            x: self.x + rhs.x,
        }
    }
}

impl AddAssign for FourVector {
    fn add_assign(&mut self, rhs: FourVector) {
        self.t += rhs.t;
        self.x += rhs.x;
    }
}

impl Sub for FourVector {
    type Output = FourVector;
    fn sub(self, rhs: FourVector) -> FourVector {
        FourVector {
            t: self.t - rhs.t,
            x: self.x - rhs.x,
        }
    }
}

impl Neg for FourVector {
    type Output = FourVector;
    fn neg(self) -> FourVector {
        FourVector {
            t: -self.t,
            x: -self.x,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_invariant_mass() {
        let p = FourVector::new(5.0, 3.0, 0.0, 4.0);
        assert_relative_eq!(p.sqr(), 0.0, epsilon = 1e-12);
        let q = FourVector::new(1.0, 0.0, 0.0, 0.6);
        assert_relative_eq!(q.abs(), 0.8, epsilon = 1e-12);
    }

    #[test]
    fn test_boost_to_rest_frame() {
        // A momentum boosted by its own velocity ends up at rest.
        let p = FourVector::new(2.0, 0.0, 0.0, 1.0);
        let rest = p.boost(p.velocity());
        assert_relative_eq!(rest.x.norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(rest.t, p.abs(), epsilon = 1e-12);
    }

    #[test]
    fn test_boost_roundtrip() {
        let p = FourVector::new(3.0, 0.3, -1.2, 0.7);
        let beta = Vector3::new(0.2, -0.1, 0.5);
        let back = p.boost(beta).boost(-beta);
        assert_relative_eq!(back.t, p.t, epsilon = 1e-12);
        assert_relative_eq!((back.x - p.x).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_boost_preserves_invariant() {
        let p = FourVector::new(3.0, 0.3, -1.2, 0.7);
        let beta = Vector3::new(0.4, 0.1, -0.3);
        assert_relative_eq!(p.boost(beta).sqr(), p.sqr(), epsilon = 1e-12);
    }
}
