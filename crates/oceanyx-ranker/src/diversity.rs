//! Community diversity metrics over a match set.
//!
//! Abundance of a species is the sum of its supporting sequence counts.
//! With p_i = count_i / Σ count:
//!
//!   shannon  = -Σ p_i ln p_i        (terms with p_i = 0 excluded)
//!   evenness = shannon / ln(richness), or exactly 1.0 for one species
//!   rare     = #{ i : p_i < rarity_threshold }

use std::collections::BTreeMap;

use oceanyx_common::{MatchResult, MetricsReport, OceanyxError, Result};
use oceanyx_config::DiversityConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct DiversityMetricsCalculator {
    rarity_threshold: f64,
}

impl Default for DiversityMetricsCalculator {
    fn default() -> Self {
        Self { rarity_threshold: 0.01 }
    }
}

impl From<&DiversityConfig> for DiversityMetricsCalculator {
    fn from(cfg: &DiversityConfig) -> Self {
        Self::new(cfg.rarity_threshold)
    }
}

impl DiversityMetricsCalculator {
    pub fn new(rarity_threshold: f64) -> Self {
        Self { rarity_threshold }
    }

    pub fn compute(&self, matches: &[MatchResult]) -> Result<MetricsReport> {
        if matches.is_empty() {
            return Err(OceanyxError::InsufficientData("no matches to summarise".to_string()));
        }

        let mut abundance: BTreeMap<&str, u64> = BTreeMap::new();
        for m in matches {
            *abundance.entry(m.species_id.as_str()).or_default() +=
                u64::from(m.supporting_sequence_count);
        }
        let total: u64 = abundance.values().sum();
        if total == 0 {
            return Err(OceanyxError::InsufficientData(
                "matches carry no supporting sequences".to_string(),
            ));
        }

        let richness = abundance.len();
        let mut shannon = 0.0_f64;
        let mut rare = 0;
        for &count in abundance.values() {
            let p = count as f64 / total as f64;
            if p > 0.0 {
                shannon -= p * p.ln();
            }
            if p < self.rarity_threshold {
                rare += 1;
            }
        }
        let shannon = shannon.max(0.0);

        let evenness = if richness > 1 {
            (shannon / (richness as f64).ln()).clamp(0.0, 1.0)
        } else {
            1.0
        };

        Ok(MetricsReport {
            shannon_index: shannon,
            species_richness: richness,
            evenness,
            rare_species_count: rare,
        })
    }
}
