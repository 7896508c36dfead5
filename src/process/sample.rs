//! Stratified review sampling: cap the per-place review count while keeping
//! all rating levels represented. The RNG is seeded from the place id, so a
//! given raw store always samples the same rows.

use crate::model::ProcessedReview;

/// Deterministic per-place sampling seed.
pub fn place_seed(place_id: &str) -> u64 {
    let digest = md5::compute(place_id.as_bytes());
    u64::from_le_bytes(digest.0[..8].try_into().unwrap_or([0; 8]))
}

/// Sample down to at most `max` reviews, balanced across star buckets:
/// each of 1..=5 contributes up to `max / 5`, remaining slots are filled
/// from the overflow (including unrated reviews), and the result is
/// shuffled so ratings do not cluster.
pub fn stratified_sample(
    reviews: Vec<ProcessedReview>,
    max: usize,
    seed: u64,
) -> Vec<ProcessedReview> {
    if reviews.len() <= max {
        return reviews;
    }

    let mut rng = fastrand::Rng::with_seed(seed);
    let mut buckets: [Vec<ProcessedReview>; 6] = Default::default();
    for review in reviews {
        let slot = usize::from(review.rating.min(5));
        buckets[slot].push(review);
    }

    let target_per_star = max / 5;
    let mut sampled = Vec::with_capacity(max);
    let mut overflow = Vec::new();

    for bucket in buckets[1..=5].iter_mut() {
        rng.shuffle(bucket);
        let take = bucket.len().min(target_per_star);
        let rest = bucket.split_off(take);
        sampled.append(bucket);
        overflow.extend(rest);
    }
    // Unrated reviews only ever fill leftover slots.
    overflow.append(&mut buckets[0]);

    let shortage = max.saturating_sub(sampled.len());
    if shortage > 0 && !overflow.is_empty() {
        rng.shuffle(&mut overflow);
        sampled.extend(overflow.into_iter().take(shortage));
    }

    rng.shuffle(&mut sampled);
    sampled
}
