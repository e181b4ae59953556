use num_traits::{Float, ToPrimitive};

/// Build an evenly spaced axis from `start` up to, but not including, `end`
pub fn gridspace<T: Float + ToPrimitive>(start: T, end: T, step: T) -> Vec<T> {
    let distance = end - start;
    let steps = (distance / step).ceil().to_usize().unwrap_or_default();
    let mut result = Vec::with_capacity(steps);
    for i in 0..steps {
        result.push(start + T::from(i).unwrap() * step);
    }
    result
}

/// Integrate `y` over `x` with the trapezoidal rule
pub fn trapz<T: Float>(x: &[T], y: &[T]) -> T {
    let half = T::from(0.5).unwrap();
    x.windows(2)
        .zip(y.windows(2))
        .fold(T::zero(), |acc, (xs, ys)| {
            acc + (xs[1] - xs[0]) * half * (ys[1] + ys[0])
        })
}

pub fn minmax<T: Float>(values: &[T]) -> (T, T) {
    let mut max = -T::infinity();
    let mut min = T::infinity();

    for v in values.iter() {
        if *v > max {
            max = *v;
        }
        if *v < min {
            min = *v
        }
    }
    (min, max)
}
