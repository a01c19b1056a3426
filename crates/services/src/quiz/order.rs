use rand::Rng;
use rand::seq::SliceRandom;

/// Questions in their original pool order.
#[must_use]
pub fn pool_order(len: usize) -> Vec<usize> {
    (0..len).collect()
}

/// Uniformly random permutation of the pool indices `0..len`.
pub fn shuffled_order<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<usize> {
    let mut order = pool_order(len);
    order.as_mut_slice().shuffle(rng);
    order
}
