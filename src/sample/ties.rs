use ndarray::prelude::*;
use ndarray::Data;
use num_traits::Float;
use rand::distributions::uniform::SampleUniform;
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use std::cmp::Ordering;

/// Makes duplicated non-zero times distinct by adding one independent
/// uniform draw from `[epsilon_min, epsilon_max]` to each of them.
///
/// Times that are exactly zero are never perturbed, nor are times that
/// appear only once. The input is left untouched; a perturbed copy is
/// returned. Given the same input and the same random source state the
/// output is identical, which is what makes refits reproducible.
///
/// The caller is responsible for epsilon bounds small enough not to cross a
/// real gap between distinct times.
pub fn break_ties_by_adding_epsilon<F, S, R>(
    t: &ArrayBase<S, Ix1>,
    epsilon_min: F,
    epsilon_max: F,
    rng: &mut R,
) -> Array1<F>
where
    F: Float + SampleUniform,
    S: Data<Elem = F>,
    R: Rng + ?Sized,
{
    let n = t.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| t[a].partial_cmp(&t[b]).unwrap_or(Ordering::Equal));

    let epsilon = Uniform::new_inclusive(epsilon_min, epsilon_max);
    let mut out = t.to_owned();

    // Walk runs of equal values in sorted order; draws therefore happen in
    // an order fixed entirely by the input.
    let mut run_start = 0;
    while run_start < n {
        let mut run_end = run_start + 1;
        while run_end < n && t[order[run_end]] == t[order[run_start]] {
            run_end += 1;
        }
        if run_end - run_start > 1 {
            for &index in &order[run_start..run_end] {
                if out[index] != F::zero() {
                    out[index] = out[index] + epsilon.sample(rng);
                }
            }
        }
        run_start = run_end;
    }

    out
}
