//! Binary entropy.

/// Shannon entropy in bits of a Bernoulli(p) variable.
///
/// Total: returns 0 at and outside the closed bounds.
pub fn binary_entropy(p: f64) -> f64 {
    if p <= 0.0 || p >= 1.0 {
        return 0.0;
    }
    -p * p.log2() - (1.0 - p) * (1.0 - p).log2()
}
