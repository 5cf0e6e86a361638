//! Nucleotide normalisation shared by the sequence decoder and the catalog.
//!
//! Bases are upper-cased and RNA `U` is read as `T`. Accepted symbols are
//! the IUPAC ambiguity codes plus `-` gaps, so a normalised sequence is
//! always ASCII.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref BASES: Regex = Regex::new(r"^[ACGTRYKMSWBDHVN\-]+$").unwrap();
}

/// Normalise `raw` to upper-case DNA, or `None` if it is empty or holds a
/// symbol outside the nucleotide alphabet.
pub fn normalise(raw: &str) -> Option<String> {
    let bases: String = raw
        .chars()
        .map(|c| match c.to_ascii_uppercase() {
            'U' => 'T',
            other => other,
        })
        .collect();
    BASES.is_match(&bases).then_some(bases)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rna_and_lowercase() {
        assert_eq!(normalise("acgu-N").as_deref(), Some("ACGT-N"));
    }

    #[test]
    fn test_rejects_foreign_symbols() {
        assert_eq!(normalise(""), None);
        assert_eq!(normalise("ACGTX"), None);
        assert_eq!(normalise("ACGT ACGT"), None);
        assert_eq!(normalise("ACGTÄACGT"), None);
    }
}
