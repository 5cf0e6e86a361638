//! Sequence file decoding (FASTA / FASTQ / bare sequence).
//!
//! Decoding normalises bases to upper-case DNA (`U` → `T`) and accepts the
//! IUPAC ambiguity codes plus `-` gaps. Anything else is `MalformedInput`.

use serde::{Deserialize, Serialize};

use oceanyx_common::{nucleotides, OceanyxError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SequenceFormat {
    Fasta,
    Fastq,
    Raw,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SequenceRecord {
    pub id: String,
    pub bases: String,
}

/// Decoded content of a sequence artifact: one or more reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecodedSequence {
    pub format: SequenceFormat,
    pub records: Vec<SequenceRecord>,
}

impl DecodedSequence {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_bases(&self) -> usize {
        self.records.iter().map(|r| r.bases.len()).sum()
    }
}

/// Decode raw bytes; non-UTF-8 content is malformed.
pub fn decode_bytes(bytes: &[u8]) -> Result<DecodedSequence> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| OceanyxError::MalformedInput(format!("sequence is not UTF-8: {e}")))?;
    decode(text)
}

/// Decode sequence text, sniffing the format from the first non-blank line.
pub fn decode(text: &str) -> Result<DecodedSequence> {
    let first = text.lines().map(str::trim).find(|l| !l.is_empty());
    let decoded = match first {
        None => return Err(malformed("sequence is empty")),
        Some(line) if line.starts_with('>') => DecodedSequence {
            format: SequenceFormat::Fasta,
            records: decode_fasta(text)?,
        },
        Some(line) if line.starts_with('@') => DecodedSequence {
            format: SequenceFormat::Fastq,
            records: decode_fastq(text)?,
        },
        Some(_) => DecodedSequence {
            format: SequenceFormat::Raw,
            records: vec![SequenceRecord {
                id: "query".to_string(),
                bases: normalise_bases(&text.split_whitespace().collect::<String>(), "query")?,
            }],
        },
    };
    Ok(decoded)
}

fn decode_fasta(text: &str) -> Result<Vec<SequenceRecord>> {
    let mut records = Vec::new();
    let mut current: Option<(String, String)> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(header) = line.strip_prefix('>') {
            if let Some((id, raw)) = current.take() {
                records.push(finish_record(id, &raw)?);
            }
            current = Some((record_id(header, records.len()), String::new()));
        } else {
            match current.as_mut() {
                Some((_, raw)) => raw.push_str(line),
                None => return Err(malformed("sequence data before first FASTA header")),
            }
        }
    }
    if let Some((id, raw)) = current {
        records.push(finish_record(id, &raw)?);
    }
    Ok(records)
}

fn decode_fastq(text: &str) -> Result<Vec<SequenceRecord>> {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.len() % 4 != 0 {
        return Err(malformed("FASTQ record count is not a multiple of four lines"));
    }

    let mut records = Vec::with_capacity(lines.len() / 4);
    for chunk in lines.chunks(4) {
        let [header, seq, plus, quality] = chunk else { unreachable!() };
        let header = header
            .strip_prefix('@')
            .ok_or_else(|| malformed(format!("expected '@' header, got {header:?}")))?;
        if !plus.starts_with('+') {
            return Err(malformed(format!("expected '+' separator, got {plus:?}")));
        }
        let id = record_id(header, records.len());
        if seq.len() != quality.len() {
            return Err(malformed(format!(
                "{id}: {} bases but {} quality scores",
                seq.len(),
                quality.len()
            )));
        }
        records.push(finish_record(id, seq)?);
    }
    Ok(records)
}

fn finish_record(id: String, raw: &str) -> Result<SequenceRecord> {
    if raw.is_empty() {
        return Err(malformed(format!("{id}: record has no bases")));
    }
    let bases = normalise_bases(raw, &id)?;
    Ok(SequenceRecord { id, bases })
}

fn normalise_bases(raw: &str, id: &str) -> Result<String> {
    nucleotides::normalise(raw)
        .ok_or_else(|| malformed(format!("{id}: invalid nucleotide characters")))
}

fn record_id(header: &str, index: usize) -> String {
    header
        .split_whitespace()
        .next()
        .map(str::to_string)
        .unwrap_or_else(|| format!("record_{}", index + 1))
}

fn malformed(msg: impl Into<String>) -> OceanyxError {
    OceanyxError::MalformedInput(msg.into())
}
