//! Log-probability arithmetic shared by the proposal kernels.

/// Log probability of one uniform pick among `n` options.
pub fn log_uniform_choice(n: usize) -> f64 {
    -(n as f64).ln()
}

/// `ln(after / before)` for enumeration counts.
pub fn log_count_ratio(after: usize, before: usize) -> f64 {
    (after as f64).ln() - (before as f64).ln()
}

/// `1 / (1 + e^-x)`.
pub fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Inverse of [`logistic`].
pub fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

/// `ln C(n, k)`.
pub fn ln_binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return f64::NEG_INFINITY;
    }
    let k = k.min(n - k);
    (0..k)
        .map(|i| ((n - i) as f64).ln() - ((i + 1) as f64).ln())
        .sum()
}

/// Running log proposal density, accumulated one random choice at a time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LogDensity(f64);

impl LogDensity {
    /// A uniform pick among `n` options.
    pub fn choose(self, n: usize) -> Self {
        Self(self.0 + log_uniform_choice(n))
    }

    /// A fair coin.
    pub fn coin(self) -> Self {
        self.choose(2)
    }

    /// An arbitrary log-probability term.
    pub fn add(self, log_p: f64) -> Self {
        Self(self.0 + log_p)
    }

    /// Accumulated value.
    pub fn value(self) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binomials_match_small_cases() {
        assert!((ln_binomial(5, 2) - 10f64.ln()).abs() < 1e-12);
        assert_eq!(ln_binomial(4, 0), 0.0);
        assert_eq!(ln_binomial(2, 3), f64::NEG_INFINITY);
    }

    #[test]
    fn logit_inverts_logistic() {
        for p in [0.1, 0.5, 0.8] {
            assert!((logistic(logit(p)) - p).abs() < 1e-12);
        }
        assert_eq!(logit(0.5), 0.0);
    }

    #[test]
    fn density_accumulates_choices() {
        let density = LogDensity::default().choose(3).coin().add(-1.0);
        assert!((density.value() - (-(6f64.ln()) - 1.0)).abs() < 1e-12);
        assert!((log_count_ratio(3, 2) - 1.5f64.ln()).abs() < 1e-12);
    }
}
