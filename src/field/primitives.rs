//! Single-precision building blocks shared by both reflectivity evaluators.
//!
//! Everything here is `f32`. Rust rounds every `f32` operation to single precision and
//! never contracts `a * b + c` into a fused multiply-add, so two evaluators that call
//! these helpers with the same arguments in the same order produce identical bits.
//! Do not introduce `mul_add` or `f64` intermediates in this module.

/// Largest `f32` strictly below 1.0.
pub const ONE_MINUS_EPSILON: f32 = 1.0 - f32::EPSILON / 2.0;

/// Fractional part in `[0, 1)`.
///
/// `x - floor(x)` rounds to exactly 1.0 for tiny negative inputs; that case folds to 0.0.
#[inline]
pub fn fract(x: f32) -> f32 {
    let f = x - x.floor();
    if f >= 1.0 { 0.0 } else { f }
}

#[inline]
pub fn clamp(x: f32, lo: f32, hi: f32) -> f32 {
    x.max(lo).min(hi)
}

#[inline]
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = clamp((x - edge0) / (edge1 - edge0), 0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Signed longitude difference `a - b` folded into `[-180, 180)`.
#[inline]
pub fn shortest_lon_delta(a: f32, b: f32) -> f32 {
    let d = (a - b + 540.0).rem_euclid(360.0);
    if d >= 360.0 { -180.0 } else { d - 180.0 }
}

/// Sine-free 2D hash in `[0, 1)`.
///
/// Multiply-and-fold on fractional parts; no transcendental calls, so the low bits do
/// not depend on the platform's libm.
#[inline]
pub fn hash12(x: f32, y: f32) -> f32 {
    let p0 = fract(x * 0.1031);
    let p1 = fract(y * 0.1031);
    let p2 = fract(x * 0.1031);
    let d = p0 * (p1 + 33.33) + p1 * (p2 + 33.33) + p2 * (p0 + 33.33);
    let q0 = p0 + d;
    let q1 = p1 + d;
    let q2 = p2 + d;
    fract((q0 + q1) * q2)
}

#[inline]
fn lattice(ix: f32, iy: f32, seed: f32) -> f32 {
    hash12(ix + seed * 57.0, iy + seed * 113.0)
}

#[inline]
fn fade(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// Bilinear value noise in `[0, 1)`.
pub fn value_noise(x: f32, y: f32, seed: f32) -> f32 {
    let ix = x.floor();
    let iy = y.floor();
    let ux = fade(x - ix);
    let uy = fade(y - iy);

    let a = lattice(ix, iy, seed);
    let b = lattice(ix + 1.0, iy, seed);
    let c = lattice(ix, iy + 1.0, seed);
    let d = lattice(ix + 1.0, iy + 1.0, seed);

    let v = mix(mix(a, b, ux), mix(c, d, ux), uy);
    clamp(v, 0.0, ONE_MINUS_EPSILON)
}

/// Value noise whose lattice repeats every `period` cells along x.
///
/// Used for longitude-driven terms that must be continuous across the date line.
pub fn value_noise_periodic(x: f32, y: f32, period: f32, seed: f32) -> f32 {
    let ix = x.floor();
    let iy = y.floor();
    let ux = fade(x - ix);
    let uy = fade(y - iy);

    let x0 = ix.rem_euclid(period);
    let x1 = (ix + 1.0).rem_euclid(period);

    let a = lattice(x0, iy, seed);
    let b = lattice(x1, iy, seed);
    let c = lattice(x0, iy + 1.0, seed);
    let d = lattice(x1, iy + 1.0, seed);

    let v = mix(mix(a, b, ux), mix(c, d, ux), uy);
    clamp(v, 0.0, ONE_MINUS_EPSILON)
}

/// Two-octave fractal sum, unrolled.
pub fn fbm2(x: f32, y: f32, seed: f32) -> f32 {
    let mut sum = value_noise(x, y, seed) * 0.5;
    sum = sum + value_noise(x * 2.0, y * 2.0, seed + 1.0) * 0.25;
    clamp(sum / 0.75, 0.0, ONE_MINUS_EPSILON)
}

/// Three-octave fractal sum, unrolled.
pub fn fbm3(x: f32, y: f32, seed: f32) -> f32 {
    let mut sum = value_noise(x, y, seed) * 0.5;
    sum = sum + value_noise(x * 2.0, y * 2.0, seed + 1.0) * 0.25;
    sum = sum + value_noise(x * 4.0, y * 4.0, seed + 2.0) * 0.125;
    clamp(sum / 0.875, 0.0, ONE_MINUS_EPSILON)
}
