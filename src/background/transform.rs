use num_traits::Float;

use crate::arrayops::minmax;

/// The log-log-square-root operator, `ln(ln(√(y+1)+1)+1)`. Defined for `y ≥ -1`.
#[inline]
pub fn lls<F: Float>(y: F) -> F {
    let one = F::one();
    (((y + one).sqrt() + one).ln() + one).ln()
}

/// The inverse of [`lls`], `(exp(exp(v)−1)−1)² − 1`
#[inline]
pub fn lls_inverse<F: Float>(v: F) -> F {
    let one = F::one();
    let t = (v.exp() - one).exp() - one;
    t * t - one
}

/// A copy of some data mapped into the domain the SNIP clipping operates on
#[derive(Debug, Clone)]
pub(crate) struct ClippingDomain<F: Float> {
    pub values: Vec<F>,
    offset: F,
    stabilized: bool,
}

impl<F: Float> ClippingDomain<F> {
    /// Map `data` into the LLS domain when `stabilize` is set, first shifting it by its
    /// minimum if any sample is negative.
    pub fn forward(data: &[F], stabilize: bool) -> Self {
        if !stabilize {
            return Self {
                values: data.to_vec(),
                offset: F::zero(),
                stabilized: false,
            };
        }
        let (min, _max) = minmax(data);
        let offset = if min < F::zero() { min } else { F::zero() };
        let values = data.iter().map(|y| lls(*y - offset)).collect();
        Self {
            values,
            offset,
            stabilized: true,
        }
    }

    /// Map the clipped values back into the original domain
    pub fn inverse(self) -> Vec<F> {
        if !self.stabilized {
            return self.values;
        }
        let offset = self.offset;
        self.values
            .into_iter()
            .map(|v| lls_inverse(v) + offset)
            .collect()
    }
}
