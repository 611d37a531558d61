//! Cosine similarity and the condensed pairwise matrix

/// Cosine similarity between two vectors, clamped to `[-1, 1]`.
///
/// Accumulates in f64, so any finite f32 components stay in range.
/// Zero-norm or non-finite inputs yield 0.0. Vectors of different length
/// are compared over their common prefix.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(&x, &y)| x as f64 * y as f64).sum();
    let norm_a: f64 = a.iter().map(|&x| x as f64 * x as f64).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|&x| x as f64 * x as f64).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let sim = dot / (norm_a * norm_b);
    if !sim.is_finite() {
        return 0.0;
    }
    sim.clamp(-1.0, 1.0) as f32
}

/// Symmetric similarity matrix stored as its strict upper triangle.
///
/// `get(i, j) == get(j, i)` by construction; the diagonal is 1.0.
#[derive(Debug, Clone, Default)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    /// Compute similarities for every unordered pair of `vectors`
    pub fn compute(vectors: &[&[f32]]) -> Self {
        let size = vectors.len();
        let mut values = Vec::with_capacity(size * size.saturating_sub(1) / 2);
        for i in 0..size {
            for j in (i + 1)..size {
                values.push(cosine_similarity(vectors[i], vectors[j]));
            }
        }
        Self { size, values }
    }

    /// Number of rows (documents)
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of unordered pairs
    pub fn pair_count(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, i: usize, j: usize) -> f32 {
        if i == j {
            return 1.0;
        }
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        self.values[self.offset(lo, hi)]
    }

    /// Iterate `(i, j, similarity)` for all `i < j`, row by row
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        (0..self.size)
            .flat_map(move |i| ((i + 1)..self.size).map(move |j| (i, j)))
            .zip(self.values.iter().copied())
            .map(|((i, j), sim)| (i, j, sim))
    }

    /// Mean similarity over all pairs drawn from `members`
    pub fn mean_over(&self, members: &[usize]) -> f32 {
        let mut total = 0.0f64;
        let mut count = 0usize;
        for (k, &i) in members.iter().enumerate() {
            for &j in &members[k + 1..] {
                total += self.get(i, j) as f64;
                count += 1;
            }
        }
        if count == 0 {
            return 0.0;
        }
        (total / count as f64) as f32
    }

    // Row `lo` starts after the rows above it, each of which holds
    // `size - row - 1` entries.
    fn offset(&self, lo: usize, hi: usize) -> usize {
        lo * (2 * self.size - lo - 1) / 2 + (hi - lo - 1)
    }
}
