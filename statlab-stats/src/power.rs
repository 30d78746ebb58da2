//! Closed-form power and sample-size solving
//!
//! Pure functions of the request parameters, no dataset involved. Power
//! for the t-tests uses the noncentral t distribution evaluated by
//! numerical integration over the chi distribution of the denominator;
//! ANOVA power uses Patnaik's two-moment approximation to the noncentral
//! F. Required sample sizes are solved by bisection on the monotone
//! power curve.

use crate::distributions::{chi_pdf, f_cdf, f_inv, norm_cdf, t_inv};
use serde::Serialize;
use statlab_core::{StatError, StatResult};

const INTEGRATION_STEPS: usize = 400;
const MAX_GROUP_N: f64 = 1e7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerTestType {
    TwoSampleT,
    PairedT,
    Anova,
}

impl PowerTestType {
    pub fn parse(s: &str) -> StatResult<Self> {
        match s {
            "two_sample_t" => Ok(PowerTestType::TwoSampleT),
            "paired_t" => Ok(PowerTestType::PairedT),
            "anova" => Ok(PowerTestType::Anova),
            other => Err(StatError::unknown_variant("test_type", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerMode {
    RequiredN,
    PostHoc,
}

impl PowerMode {
    pub fn parse(s: &str) -> StatResult<Self> {
        match s {
            "required_n" => Ok(PowerMode::RequiredN),
            "post_hoc" => Ok(PowerMode::PostHoc),
            other => Err(StatError::unknown_variant("mode", other)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PowerResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_per_group: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_n: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
}

/// Solve a power request from the raw (string-typed) form fields.
pub fn solve(
    test_type: &str,
    mode: &str,
    effect_size: &str,
    alpha: &str,
    power: &str,
    n: &str,
    groups: &str,
) -> StatResult<PowerResult> {
    let test_type = PowerTestType::parse(test_type)?;
    let mode = PowerMode::parse(mode)?;

    let effect_size = parse_f64("effect_size", effect_size)?;
    if effect_size <= 0.0 {
        return Err(StatError::InvalidInput(format!(
            "effect_size must be > 0, got {}",
            effect_size
        )));
    }
    let alpha = parse_f64("alpha", alpha)?;
    if !(0.0..1.0).contains(&alpha) || alpha == 0.0 {
        return Err(StatError::InvalidInput(format!(
            "alpha must be in (0, 1), got {}",
            alpha
        )));
    }

    let groups = if test_type == PowerTestType::Anova {
        let g = parse_f64("groups", groups)?;
        if g < 2.0 || g.fract() != 0.0 {
            return Err(StatError::InvalidInput(format!(
                "anova requires an integer number of groups >= 2, got {}",
                g
            )));
        }
        g as usize
    } else {
        2
    };

    match mode {
        PowerMode::RequiredN => {
            let target = parse_f64("power", power)?;
            if !(0.0..1.0).contains(&target) || target == 0.0 {
                return Err(StatError::InvalidInput(format!(
                    "power must be in (0, 1), got {}",
                    target
                )));
            }
            required_n(test_type, effect_size, alpha, target, groups)
        }
        PowerMode::PostHoc => {
            if n.trim().is_empty() {
                return Err(StatError::MissingParameter(
                    "post_hoc power requires a sample size".into(),
                ));
            }
            let n = parse_f64("n", n)?;
            if n < 2.0 {
                return Err(StatError::InvalidInput(format!(
                    "sample size must be >= 2, got {}",
                    n
                )));
            }
            let achieved = achieved_power(test_type, effect_size, alpha, n, groups);
            Ok(PowerResult {
                power: Some(achieved),
                ..Default::default()
            })
        }
    }
}

fn parse_f64(name: &str, value: &str) -> StatResult<f64> {
    value.trim().parse::<f64>().map_err(|_| {
        StatError::InvalidInput(format!("{} must be numeric, got '{}'", name, value.trim()))
    })
}

fn achieved_power(
    test_type: PowerTestType,
    effect_size: f64,
    alpha: f64,
    n: f64,
    groups: usize,
) -> f64 {
    match test_type {
        PowerTestType::TwoSampleT => two_sample_t_power(effect_size, n, alpha),
        PowerTestType::PairedT => paired_t_power(effect_size, n, alpha),
        PowerTestType::Anova => anova_power(effect_size, n, groups, alpha),
    }
}

fn required_n(
    test_type: PowerTestType,
    effect_size: f64,
    alpha: f64,
    target: f64,
    groups: usize,
) -> StatResult<PowerResult> {
    let power_at = |n: f64| achieved_power(test_type, effect_size, alpha, n, groups);
    let n = bisect_n(power_at, target)?;

    let result = match test_type {
        PowerTestType::TwoSampleT => PowerResult {
            n_per_group: Some(n),
            total_n: Some(2.0 * n),
            power: Some(target),
            ..Default::default()
        },
        PowerTestType::PairedT => PowerResult {
            n: Some(n),
            power: Some(target),
            ..Default::default()
        },
        PowerTestType::Anova => PowerResult {
            n_per_group: Some(n),
            total_n: Some(n * groups as f64),
            power: Some(target),
            ..Default::default()
        },
    };
    Ok(result)
}

/// Bisection for the smallest n with power(n) >= target. The power curve
/// is monotone in n.
fn bisect_n(power_at: impl Fn(f64) -> f64, target: f64) -> StatResult<f64> {
    let mut lo = 2.0;
    let mut hi = 4.0;
    while power_at(hi) < target {
        hi *= 2.0;
        if hi > MAX_GROUP_N {
            return Err(StatError::ComputationFailure(
                "required sample size exceeds the solver limit".into(),
            ));
        }
    }

    for _ in 0..200 {
        let mid = (lo + hi) / 2.0;
        if power_at(mid) < target {
            lo = mid;
        } else {
            hi = mid;
        }
        if (hi - lo) < 1e-6 {
            break;
        }
    }
    Ok((lo + hi) / 2.0)
}

/// Two-sided two-sample t-test power at n per group.
fn two_sample_t_power(d: f64, n: f64, alpha: f64) -> f64 {
    let df = 2.0 * (n - 1.0);
    let ncp = d * (n / 2.0).sqrt();
    noncentral_t_two_sided_power(ncp, df, alpha)
}

/// Two-sided paired t-test power at n pairs.
fn paired_t_power(d: f64, n: f64, alpha: f64) -> f64 {
    let df = n - 1.0;
    let ncp = d * n.sqrt();
    noncentral_t_two_sided_power(ncp, df, alpha)
}

/// P(|T'| > t_crit) for a noncentral t with the given df and
/// noncentrality, via integration over V ~ chi-squared(df):
/// T' = (Z + ncp) / sqrt(V/df).
fn noncentral_t_two_sided_power(ncp: f64, df: f64, alpha: f64) -> f64 {
    if df <= 0.0 {
        return f64::NAN;
    }
    let t_crit = t_inv(1.0 - alpha / 2.0, df);

    // Integration window covering the chi-squared mass
    let spread = 10.0 * (2.0 * df).sqrt();
    let lo = (df - spread).max(1e-9);
    let hi = df + spread;
    let h = (hi - lo) / INTEGRATION_STEPS as f64;

    // Simpson's rule over v
    let integrand = |v: f64| -> f64 {
        let scale = (v / df).sqrt();
        let upper = 1.0 - norm_cdf(t_crit * scale - ncp);
        let lower = norm_cdf(-t_crit * scale - ncp);
        chi_pdf(v, df) * (upper + lower)
    };

    let mut sum = integrand(lo) + integrand(hi);
    for i in 1..INTEGRATION_STEPS {
        let v = lo + h * i as f64;
        sum += integrand(v) * if i % 2 == 1 { 4.0 } else { 2.0 };
    }
    (sum * h / 3.0).clamp(0.0, 1.0)
}

/// One-way ANOVA power at n per group via Patnaik's approximation to the
/// noncentral F: ncF(df1, df2, lambda) ~ ((df1+lambda)/df1) F(h, df2)
/// with h = (df1+lambda)^2 / (df1+2*lambda).
fn anova_power(f_effect: f64, n_per_group: f64, groups: usize, alpha: f64) -> f64 {
    let k = groups as f64;
    let total_n = n_per_group * k;
    let df1 = k - 1.0;
    let df2 = total_n - k;
    if df2 <= 0.0 {
        return 0.0;
    }

    let lambda = f_effect * f_effect * total_n;
    let f_crit = f_inv(1.0 - alpha, df1, df2);

    let h = (df1 + lambda).powi(2) / (df1 + 2.0 * lambda);
    let scaled = f_crit * df1 / (df1 + lambda);
    (1.0 - f_cdf(scaled, h, df2)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cohen_reference_sample_size() {
        // Cohen's convention: d=0.5, alpha=0.05, power=0.8 needs about
        // 63.77 subjects per group.
        let result = solve("two_sample_t", "required_n", "0.5", "0.05", "0.8", "", "2").unwrap();
        let n = result.n_per_group.unwrap();
        assert!((n - 63.77).abs() < 0.5, "n_per_group = {}", n);
        assert!((result.total_n.unwrap() - 2.0 * n).abs() < 1e-9);
    }

    #[test]
    fn test_post_hoc_matches_required_n() {
        let required =
            solve("two_sample_t", "required_n", "0.5", "0.05", "0.8", "", "2").unwrap();
        let n = required.n_per_group.unwrap();
        let post_hoc = solve(
            "two_sample_t",
            "post_hoc",
            "0.5",
            "0.05",
            "",
            &format!("{}", n),
            "2",
        )
        .unwrap();
        assert!((post_hoc.power.unwrap() - 0.8).abs() < 0.005);
    }

    #[test]
    fn test_paired_needs_fewer_subjects() {
        let two = solve("two_sample_t", "required_n", "0.5", "0.05", "0.8", "", "2").unwrap();
        let paired = solve("paired_t", "required_n", "0.5", "0.05", "0.8", "", "2").unwrap();
        assert!(paired.n.unwrap() < two.n_per_group.unwrap());
    }

    #[test]
    fn test_anova_power_increases_with_n() {
        let small = solve("anova", "post_hoc", "0.25", "0.05", "", "10", "3").unwrap();
        let large = solve("anova", "post_hoc", "0.25", "0.05", "", "60", "3").unwrap();
        assert!(large.power.unwrap() > small.power.unwrap());
    }

    #[test]
    fn test_anova_required_n_round_trip() {
        let required = solve("anova", "required_n", "0.25", "0.05", "0.8", "", "3").unwrap();
        let n = required.n_per_group.unwrap();
        // statsmodels FTestAnovaPower gives ~52.4 per group for f=0.25, k=3
        assert!((n - 52.4).abs() < 2.0, "n_per_group = {}", n);
    }

    #[test]
    fn test_invalid_effect_size() {
        let err = solve("two_sample_t", "required_n", "0", "0.05", "0.8", "", "2").unwrap_err();
        assert!(matches!(err, StatError::InvalidInput(_)));

        let err = solve("two_sample_t", "required_n", "abc", "0.05", "0.8", "", "2").unwrap_err();
        assert!(matches!(err, StatError::InvalidInput(_)));
    }

    #[test]
    fn test_post_hoc_without_n() {
        let err = solve("two_sample_t", "post_hoc", "0.5", "0.05", "0.8", "", "2").unwrap_err();
        assert!(matches!(err, StatError::MissingParameter(_)));
    }

    #[test]
    fn test_anova_group_validation() {
        let err = solve("anova", "required_n", "0.25", "0.05", "0.8", "", "1").unwrap_err();
        assert!(matches!(err, StatError::InvalidInput(_)));
    }

    #[test]
    fn test_unknown_test_type() {
        let err = solve("z_test", "required_n", "0.5", "0.05", "0.8", "", "2").unwrap_err();
        assert!(matches!(err, StatError::UnknownVariant { .. }));
    }
}
