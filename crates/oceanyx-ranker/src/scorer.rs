//! Similarity scoring between a decoded sample and one catalog entry.
//!
//! The matching engine only relies on the [`SimilarityScorer`] contract:
//! identical inputs give identical scores, and a longer overlap with the
//! reference never lowers the score. [`KmerScorer`] is the default
//! implementation; hosts can plug in their own, including plain closures.

use std::collections::HashSet;

use oceanyx_common::confidence::clamp_percent;
use oceanyx_common::CatalogEntry;
use oceanyx_ingestion::DecodedSequence;

/// Raw score of a sample against one catalog entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityScore {
    /// 0.0–100.0
    pub confidence_percent: f64,
    /// Reads in the sample that support this entry.
    pub supporting_sequences: u32,
    /// Bases of the reference covered by the best alignment.
    pub aligned_length: usize,
    /// Full reference length; 0 when unknown.
    pub reference_length: usize,
}

pub trait SimilarityScorer: Send + Sync {
    /// Score `sequence` against `entry`. `None` means the entry cannot be scored.
    fn score(&self, sequence: &DecodedSequence, entry: &CatalogEntry) -> Option<SimilarityScore>;

    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> SimilarityScorer for F
where
    F: Fn(&DecodedSequence, &CatalogEntry) -> Option<SimilarityScore> + Send + Sync,
{
    fn score(&self, sequence: &DecodedSequence, entry: &CatalogEntry) -> Option<SimilarityScore> {
        self(sequence, entry)
    }
}

/// Exact k-mer overlap against the entry's reference barcode.
///
/// For each read, the reference positions covered by k-mers shared with the
/// read give the aligned length; read identity is that length over the
/// shorter of read and reference. The entry's confidence is the best read
/// identity, and reads at or above `min_read_identity` count as support.
#[derive(Debug, Clone)]
pub struct KmerScorer {
    k: usize,
    min_read_identity: f64,
}

impl KmerScorer {
    pub fn new(k: usize) -> Self {
        Self { k: k.max(1), min_read_identity: 80.0 }
    }

    pub fn with_min_read_identity(mut self, percent: f64) -> Self {
        self.min_read_identity = clamp_percent(percent);
        self
    }

    fn covered_bases(&self, reference: &[u8], read: &[u8]) -> usize {
        let k = self.k;
        if read.len() < k || reference.len() < k {
            return 0;
        }
        let read_kmers: HashSet<&[u8]> = read.windows(k).collect();

        let mut covered = vec![false; reference.len()];
        for (i, kmer) in reference.windows(k).enumerate() {
            if read_kmers.contains(kmer) {
                covered[i..i + k].iter_mut().for_each(|c| *c = true);
            }
        }
        covered.into_iter().filter(|c| *c).count()
    }
}

impl Default for KmerScorer {
    fn default() -> Self {
        Self::new(8)
    }
}

impl SimilarityScorer for KmerScorer {
    fn score(&self, sequence: &DecodedSequence, entry: &CatalogEntry) -> Option<SimilarityScore> {
        let reference = entry.reference_sequence.as_deref()?.to_ascii_uppercase();
        if reference.len() < self.k {
            return None;
        }

        let mut best_identity = 0.0_f64;
        let mut best_aligned = 0;
        let mut supporting = 0u32;

        for read in &sequence.records {
            let aligned = self.covered_bases(reference.as_bytes(), read.bases.as_bytes());
            if aligned == 0 {
                continue;
            }
            let denominator = read.bases.len().min(reference.len()) as f64;
            let identity = clamp_percent(100.0 * aligned as f64 / denominator);
            if identity >= self.min_read_identity {
                supporting += 1;
            }
            best_identity = best_identity.max(identity);
            best_aligned = best_aligned.max(aligned);
        }

        Some(SimilarityScore {
            confidence_percent: best_identity,
            supporting_sequences: supporting,
            aligned_length: best_aligned,
            reference_length: reference.len(),
        })
    }

    fn name(&self) -> &str {
        "kmer"
    }
}
