//! Standard normal distribution functions.
//!
//! This module provides:
//! - `norm_cdf`: Cumulative distribution function (CDF)
//! - `norm_pdf`: Probability density function (PDF)
//! - `inverse_norm_cdf`: Quantile function (inverse CDF)
//!
//! The quantile function is pinned to Wichura's algorithm AS241 (PPND16),
//! accurate to about 1e-16 over (0, 1). Every normal variate produced by
//! this crate goes through it, so sample sequences are reproducible from
//! the stream state alone.

/// Square root of 2.
const SQRT_2: f64 = std::f64::consts::SQRT_2;

/// 1 / sqrt(2 * pi)
const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

// AS241 central region, |p - 0.5| <= 0.425.
const SPLIT_CENTRAL: f64 = 0.425;
const CONST_CENTRAL: f64 = 0.180625;
const A: [f64; 8] = [
    3.387_132_872_796_366_608_0e0,
    1.331_416_678_917_843_774_5e2,
    1.971_590_950_306_551_442_7e3,
    1.373_169_376_550_946_112_5e4,
    4.592_195_393_154_987_145_7e4,
    6.726_577_092_700_870_085_3e4,
    3.343_057_558_358_812_810_5e4,
    2.509_080_928_730_122_672_7e3,
];
const B: [f64; 8] = [
    1.0,
    4.231_333_070_160_091_125_2e1,
    6.871_870_074_920_579_083_0e2,
    5.394_196_021_424_751_107_7e3,
    2.121_379_430_158_659_586_7e4,
    3.930_789_580_009_271_061_0e4,
    2.872_908_573_572_194_267_4e4,
    5.226_495_278_852_854_561_0e3,
];

// AS241 intermediate tail, r <= 5.
const SPLIT_TAIL: f64 = 5.0;
const CONST_TAIL: f64 = 1.6;
const C: [f64; 8] = [
    1.423_437_110_749_683_577_34e0,
    4.630_337_846_156_545_295_90e0,
    5.769_497_221_460_691_405_50e0,
    3.647_848_324_763_204_605_04e0,
    1.270_458_252_452_368_382_58e0,
    2.417_807_251_774_506_117_70e-1,
    2.272_384_498_926_918_458_33e-2,
    7.745_450_142_783_414_076_40e-4,
];
const D: [f64; 8] = [
    1.0,
    2.053_191_626_637_758_821_87e0,
    1.676_384_830_183_803_849_40e0,
    6.897_673_349_851_000_045_50e-1,
    1.481_039_764_274_800_745_90e-1,
    1.519_866_656_361_645_719_66e-2,
    5.475_938_084_995_344_946_00e-4,
    1.050_750_071_644_416_843_24e-9,
];

// AS241 far tail, r > 5.
const E: [f64; 8] = [
    6.657_904_643_501_103_777_20e0,
    5.463_784_911_164_114_369_90e0,
    1.784_826_539_917_291_335_80e0,
    2.965_605_718_285_048_912_30e-1,
    2.653_218_952_657_612_309_30e-2,
    1.242_660_947_388_078_438_60e-3,
    2.711_555_568_743_487_578_15e-5,
    2.010_334_399_292_288_132_65e-7,
];
const F: [f64; 8] = [
    1.0,
    5.998_322_065_558_879_376_90e-1,
    1.369_298_809_227_358_053_10e-1,
    1.487_536_129_085_061_485_25e-2,
    7.868_691_311_456_132_591_00e-4,
    1.846_318_317_510_054_681_80e-5,
    1.421_511_758_316_445_888_70e-7,
    2.044_263_103_389_939_785_64e-15,
];

/// Horner evaluation, coefficients in ascending order.
#[inline]
fn horner(coefficients: &[f64; 8], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

// Abramowitz and Stegun, Handbook of Mathematical Functions (1964),
// formula 7.1.26: erf(x) = 1 - t * (a1 + a2 t + ... + a5 t^4) * exp(-x^2)
// with t = 1 / (1 + p x), x >= 0. Absolute error below 1.5e-7.
const ERFC_P: f64 = 0.327_591_1;
const ERFC_A: [f64; 5] = [
    0.254_829_592,
    -0.284_496_736,
    1.421_413_741,
    -1.453_152_027,
    1.061_405_429,
];

/// Complementary error function, A&S 7.1.26.
#[inline]
fn erfc_as7126(x: f64) -> f64 {
    let t = 1.0 / (1.0 + ERFC_P * x.abs());
    let poly = ERFC_A.iter().rev().fold(0.0, |acc, &a| acc * t + a);
    let tail = t * poly * (-x * x).exp();

    // erfc(-x) = 2 - erfc(x)
    if x < 0.0 {
        2.0 - tail
    } else {
        tail
    }
}

/// Standard normal cumulative distribution function.
///
/// Computes P(X <= x) for X ~ N(0, 1) as `0.5 * erfc(-x / sqrt(2))`.
/// Accurate to about 1e-7; the result always lies in `[0, 1]`.
///
/// # Examples
/// ```
/// use schedgen_core::distributions::norm_cdf;
///
/// assert!((norm_cdf(0.0) - 0.5).abs() < 1e-7);
/// assert!(norm_cdf(-3.0) < 0.01);
/// assert!(norm_cdf(3.0) > 0.99);
/// ```
#[inline]
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc_as7126(-x / SQRT_2)
}

/// Standard normal probability density function.
#[inline]
pub fn norm_pdf(x: f64) -> f64 {
    FRAC_1_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal quantile function (AS241, PPND16).
///
/// Returns `-inf` at `p = 0`, `+inf` at `p = 1` and NaN outside `[0, 1]`.
///
/// # Examples
/// ```
/// use schedgen_core::distributions::inverse_norm_cdf;
///
/// assert_eq!(inverse_norm_cdf(0.5), 0.0);
/// assert!((inverse_norm_cdf(0.975) - 1.959_963_984_540_054).abs() < 1e-12);
/// ```
pub fn inverse_norm_cdf(p: f64) -> f64 {
    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }

    let q = p - 0.5;
    if q.abs() <= SPLIT_CENTRAL {
        let r = CONST_CENTRAL - q * q;
        return q * horner(&A, r) / horner(&B, r);
    }

    let tail = if q < 0.0 { p } else { 1.0 - p };
    let mut r = (-tail.ln()).sqrt();
    let value = if r <= SPLIT_TAIL {
        r -= CONST_TAIL;
        horner(&C, r) / horner(&D, r)
    } else {
        r -= SPLIT_TAIL;
        horner(&E, r) / horner(&F, r)
    };

    if q < 0.0 {
        -value
    } else {
        value
    }
}
