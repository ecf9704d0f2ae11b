// Phase-space kinematics for final-state sampling.
//
// All sampling here is frame-explicit: quantities are produced in the
// center-of-momentum frame of the total four-momentum and boosted back to
// the computational frame before being handed to the caller.

use nalgebra::Vector3;
use rand::Rng;

use crate::errors::SamplingError;
use crate::fourvector::FourVector;
use crate::random::{canonical, uniform};

/// Momentum of either particle in the CM frame of a two-body system with
/// total energy `srts` and masses `m1`, `m2` (Kallen function form).
pub fn pcm(srts: f64, m1: f64, m2: f64) -> f64 {
    let s = srts * srts;
    let x = (s - (m1 + m2) * (m1 + m2)) * (s - (m1 - m2) * (m1 - m2));
    x.max(0.0).sqrt() / (2.0 * srts)
}

/// Isotropically distributed unit vector.
pub fn isotropic_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> Vector3<f64> {
    let mu = 2.0 * canonical(rng) - 1.0;
    let phi = 2.0 * std::f64::consts::PI * canonical(rng);
    let sin_theta = (1.0 - mu * mu).sqrt();
    Vector3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), mu)
}

/// Unit vector at polar cosine `mu` relative to `axis`, with azimuth `phi`
/// around it.
pub fn rotated_direction(axis: &Vector3<f64>, mu: f64, phi: f64) -> Vector3<f64> {
    let sin_theta = (1.0 - mu * mu).max(0.0).sqrt();
    let perp = if axis.x.abs() < 0.99 {
        Vector3::new(1.0, 0.0, 0.0).cross(axis).normalize()
    } else {
        Vector3::new(0.0, 1.0, 0.0).cross(axis).normalize()
    };
    let ortho = axis.cross(&perp);
    mu * axis + sin_theta * phi.cos() * perp + sin_theta * phi.sin() * ortho
}

/// Sample a resonance mass from a Breit-Wigner line shape truncated to
/// [min_mass, max_mass], by inversion of the Cauchy CDF.
///
/// Returns an error when the window is closed (max <= min), which callers
/// treat as this channel being kinematically unavailable.
pub fn sample_resonance_mass<R: Rng + ?Sized>(
    rng: &mut R,
    pole_mass: f64,
    width: f64,
    min_mass: f64,
    max_mass: f64,
) -> Result<f64, SamplingError> {
    if max_mass <= min_mass {
        return Err(SamplingError::NoKinematicallyAllowedChannel {
            sqrt_s: max_mass,
            lowest_threshold: min_mass,
        });
    }
    if width <= 0.0 {
        return Ok(pole_mass.clamp(min_mass, max_mass));
    }
    let t_min = (2.0 * (min_mass - pole_mass) / width).atan();
    let t_max = (2.0 * (max_mass - pole_mass) / width).atan();
    let t = uniform(rng, t_min, t_max);
    Ok(pole_mass + 0.5 * width * t.tan())
}

/// Sample back-to-back momenta for an X -> 2 process in the CM frame of
/// `total` (isotropic angle) and boost them to the computational frame.
pub fn two_body_final_momenta<R: Rng + ?Sized>(
    rng: &mut R,
    total: FourVector,
    m1: f64,
    m2: f64,
) -> Result<(FourVector, FourVector), SamplingError> {
    let srts = total.abs();
    if srts < m1 + m2 {
        return Err(SamplingError::NoKinematicallyAllowedChannel {
            sqrt_s: srts,
            lowest_threshold: m1 + m2,
        });
    }
    let p = pcm(srts, m1, m2);
    let dir = isotropic_unit_vector(rng);
    let e1 = (m1 * m1 + p * p).sqrt();
    let e2 = (m2 * m2 + p * p).sqrt();
    let beta = total.velocity();
    let p1 = FourVector::from_parts(e1, p * dir).boost(-beta);
    let p2 = FourVector::from_parts(e2, -p * dir).boost(-beta);
    Ok((p1, p2))
}

/// Sample momenta for an X -> 3 process by rejection in the Dalitz
/// energy plane, then orient the decay plane isotropically; momenta are
/// returned in the computational frame.
pub fn three_body_final_momenta<R: Rng + ?Sized>(
    rng: &mut R,
    total: FourVector,
    m1: f64,
    m2: f64,
    m3: f64,
) -> Result<(FourVector, FourVector, FourVector), SamplingError> {
    let srts = total.abs();
    if srts < m1 + m2 + m3 {
        return Err(SamplingError::NoKinematicallyAllowedChannel {
            sqrt_s: srts,
            lowest_threshold: m1 + m2 + m3,
        });
    }
    let s = srts * srts;
    let e1_max = (s + m1 * m1 - (m2 + m3) * (m2 + m3)) / (2.0 * srts);
    let e2_max = (s + m2 * m2 - (m1 + m3) * (m1 + m3)) / (2.0 * srts);
    if e1_max <= m1 || e2_max <= m2 {
        // exactly at threshold: no phase space to sample
        return Err(SamplingError::NoKinematicallyAllowedChannel {
            sqrt_s: srts,
            lowest_threshold: m1 + m2 + m3,
        });
    }

    let (q1, q2, q3, e1, e2, e3);
    loop {
        let c1 = uniform(rng, m1, e1_max);
        let c2 = uniform(rng, m2, e2_max);
        let c3 = srts - c1 - c2;
        if c3 < m3 {
            continue;
        }
        let k1 = (c1 * c1 - m1 * m1).sqrt();
        let k2 = (c2 * c2 - m2 * m2).sqrt();
        let k3 = (c3 * c3 - m3 * m3).sqrt();
        // momentum conservation is satisfiable iff the three moduli close
        // into a triangle
        if (k1 - k2).abs() <= k3 && k3 <= k1 + k2 {
            q1 = k1;
            q2 = k2;
            q3 = k3;
            e1 = c1;
            e2 = c2;
            e3 = c3;
            break;
        }
    }

    let n1 = isotropic_unit_vector(rng);
    let cos13 = (q2 * q2 - q1 * q1 - q3 * q3) / (2.0 * q1 * q3);
    let phi = 2.0 * std::f64::consts::PI * canonical(rng);
    let n3 = rotated_direction(&n1, cos13.clamp(-1.0, 1.0), phi);
    let v1 = q1 * n1;
    let v3 = q3 * n3;
    let v2 = -(v1 + v3);

    let beta = total.velocity();
    Ok((
        FourVector::from_parts(e1, v1).boost(-beta),
        FourVector::from_parts(e2, v2).boost(-beta),
        FourVector::from_parts(e3, v3).boost(-beta),
    ))
}

/// Exact elastic momentum exchange: reflect both three-momenta in the CM
/// frame. Masses and the total four-momentum are preserved to roundoff.
pub fn reflect_momenta_in_cm(p1: FourVector, p2: FourVector) -> (FourVector, FourVector) {
    let beta = (p1 + p2).velocity();
    let mut q1 = p1.boost(beta);
    let mut q2 = p2.boost(beta);
    q1.x = -q1.x;
    q2.x = -q2.x;
    (q1.boost(-beta), q2.boost(-beta))
}
