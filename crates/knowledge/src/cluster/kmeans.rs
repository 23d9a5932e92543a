//! Seeded K-means over embedding vectors.

use serde::{Deserialize, Serialize};

/// Upper bound on assignment/update rounds.
pub const MAX_ITERATIONS: usize = 100;

/// Cluster assignment for each input vector plus the final centroids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeansResult {
    /// Cluster id per input vector, in input order
    pub labels: Vec<usize>,

    /// One centroid per cluster
    pub centroids: Vec<Vec<f64>>,
}

/// Linear congruential generator, modulus 2^32.
///
/// The exact recurrence is part of the output contract: identical seeds must
/// give bit-identical centroids.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    const MULTIPLIER: u64 = 1_664_525;
    const INCREMENT: u64 = 1_013_904_223;
    const MODULUS: u64 = 1 << 32;

    pub fn new(seed: u64) -> Self {
        Self {
            state: seed % Self::MODULUS,
        }
    }

    /// Next draw in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        self.state = (self.state * Self::MULTIPLIER + Self::INCREMENT) % Self::MODULUS;
        self.state as f64 / Self::MODULUS as f64
    }
}

/// Standard L2 distance.
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Partition `vectors` into at most `k` clusters.
///
/// Deterministic in `(vectors, k, seed)`. Centroids start at uniform draws
/// within each dimension's data range, centroid by centroid. Each round
/// assigns every vector to its nearest centroid (lowest index wins ties) and
/// moves centroids to the mean of their members; a centroid with no members
/// stays put. Stops after a round where no assignment changed.
///
/// All vectors must share one dimension. With `k` of 0 there are no
/// centroids and every vector is labelled 0.
pub fn kmeans(vectors: &[Vec<f64>], k: usize, seed: u64) -> KMeansResult {
    if vectors.is_empty() || k == 0 {
        return KMeansResult {
            labels: vec![0; vectors.len()],
            centroids: Vec::new(),
        };
    }

    let k = k.min(vectors.len());
    let dimensions = vectors[0].len();

    let ranges: Vec<(f64, f64)> = (0..dimensions)
        .map(|d| {
            vectors.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v[d]), hi.max(v[d]))
            })
        })
        .collect();

    let mut rng = Lcg::new(seed);
    let mut centroids: Vec<Vec<f64>> = (0..k)
        .map(|_| {
            ranges
                .iter()
                .map(|(lo, hi)| lo + rng.next_f64() * (hi - lo))
                .collect()
        })
        .collect();

    let mut labels = vec![0usize; vectors.len()];

    for iteration in 0..MAX_ITERATIONS {
        let mut changed = false;

        for (label, vector) in labels.iter_mut().zip(vectors) {
            let nearest = nearest_centroid(vector, &centroids);
            if *label != nearest {
                *label = nearest;
                changed = true;
            }
        }

        update_centroids(vectors, &labels, &mut centroids);

        if !changed {
            tracing::debug!("K-means converged after {} rounds", iteration + 1);
            break;
        }
    }

    KMeansResult { labels, centroids }
}

fn nearest_centroid(vector: &[f64], centroids: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_distance = euclidean_distance(vector, &centroids[0]);
    for (j, centroid) in centroids.iter().enumerate().skip(1) {
        let distance = euclidean_distance(vector, centroid);
        if distance < best_distance {
            best_distance = distance;
            best = j;
        }
    }
    best
}

fn update_centroids(vectors: &[Vec<f64>], labels: &[usize], centroids: &mut [Vec<f64>]) {
    for (j, centroid) in centroids.iter_mut().enumerate() {
        let members: Vec<&Vec<f64>> = vectors
            .iter()
            .zip(labels)
            .filter(|(_, &label)| label == j)
            .map(|(v, _)| v)
            .collect();

        if members.is_empty() {
            continue;
        }

        let count = members.len() as f64;
        for (d, value) in centroid.iter_mut().enumerate() {
            *value = members.iter().map(|m| m[d]).sum::<f64>() / count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-9, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn test_lcg_sequence() {
        let mut rng = Lcg::new(42);
        assert_eq!(rng.next_f64(), 1_083_814_273.0 / 4_294_967_296.0);
        assert_eq!(rng.next_f64(), 378_494_188.0 / 4_294_967_296.0);
        assert_eq!(rng.next_f64(), 2_479_403_867.0 / 4_294_967_296.0);
    }

    #[test]
    fn test_empty_input() {
        let result = kmeans(&[], 3, 42);
        assert!(result.labels.is_empty());
        assert!(result.centroids.is_empty());
    }

    #[test]
    fn test_three_point_example() {
        let vectors = vec![
            vec![0.1, 0.2, 0.3],
            vec![0.2, 0.3, 0.4],
            vec![0.9, 0.8, 0.7],
        ];
        let result = kmeans(&vectors, 2, 42);

        assert_eq!(result.labels, vec![0, 0, 1]);
        assert_eq!(result.centroids.len(), 2);
        assert_close(&result.centroids[1], &[0.9, 0.8, 0.7]);
    }

    #[test]
    fn test_two_blobs() {
        let vectors = vec![
            vec![1.0, 1.0],
            vec![1.0, 2.0],
            vec![2.0, 1.0],
            vec![8.0, 8.0],
            vec![8.0, 9.0],
            vec![9.0, 8.0],
        ];
        let result = kmeans(&vectors, 2, 42);

        assert_eq!(result.labels, vec![0, 0, 0, 1, 1, 1]);
        assert_close(&result.centroids[0], &[4.0 / 3.0, 4.0 / 3.0]);
        assert_close(&result.centroids[1], &[25.0 / 3.0, 25.0 / 3.0]);
    }

    #[test]
    fn test_single_cluster_is_mean() {
        let vectors = vec![vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0]];
        let result = kmeans(&vectors, 1, 42);

        assert_eq!(result.labels, vec![0, 0, 0]);
        assert_close(&result.centroids[0], &[2.0, 2.0]);
    }

    #[test]
    fn test_k_capped_by_points() {
        let vectors = vec![vec![1.0, 1.0], vec![2.0, 2.0]];
        let result = kmeans(&vectors, 5, 42);

        assert_eq!(result.centroids.len(), 2);
        assert_eq!(result.labels, vec![0, 1]);
    }

    #[test]
    fn test_zero_k_has_no_centroids() {
        let vectors = vec![vec![1.0], vec![3.0]];
        let result = kmeans(&vectors, 0, 42);
        assert_eq!(result.labels, vec![0, 0]);
        assert!(result.centroids.is_empty());
    }

    #[test]
    fn test_deterministic_for_same_seed() {
        let vectors: Vec<Vec<f64>> = (0..40)
            .map(|i| {
                let x = i as f64;
                vec![(x * 0.37).sin(), (x * 0.11).cos(), x % 7.0]
            })
            .collect();

        let first = kmeans(&vectors, 4, 1234);
        let second = kmeans(&vectors, 4, 1234);
        assert_eq!(first, second);

        assert_eq!(first.centroids.len(), 4);
        assert!(first.labels.iter().all(|&l| l < 4));
    }

    #[test]
    fn test_identical_points() {
        let vectors = vec![vec![0.5, 0.5]; 4];
        let result = kmeans(&vectors, 3, 42);

        assert_eq!(result.labels, vec![0, 0, 0, 0]);
        assert_eq!(result.centroids.len(), 3);
        assert!(result.centroids.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn test_high_dimensional_distance() {
        let a = vec![0.001; 3072];
        let b = vec![0.002; 3072];
        let expected = (3072.0f64 * 0.001 * 0.001).sqrt();
        assert!((euclidean_distance(&a, &b) - expected).abs() < 1e-12);
    }
}
