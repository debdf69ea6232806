// ========================================================================================
//                            Item batches in and out of CSV
// ========================================================================================
//
// The command-line scorer reads candidate items as `score,adv_weight,prosale_only` rows
// and writes the same columns back with the transformed score. Input is parsed with the
// `csv` crate; output floats are formatted with `ryu`, which always round-trips.

use crate::types::ScoreBatch;
use serde::{Deserialize, Deserializer};
use std::io::{self, BufWriter, Read, Write};
use thiserror::Error;

const HEADER: &str = "score,adv_weight,prosale_only";

#[derive(Debug, Error)]
pub enum ItemIoError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Deserialize)]
struct ItemRow {
    score: f32,
    adv_weight: f32,
    #[serde(deserialize_with = "deserialize_flag")]
    prosale_only: bool,
}

/// Accepts `true`/`false` in any case as well as `1`/`0`.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    if raw == "1" || raw.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if raw == "0" || raw.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(serde::de::Error::custom(format!(
            "invalid prosale_only flag '{raw}', expected true/false or 1/0"
        )))
    }
}

/// Owned storage for a set of items, as three parallel columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemColumns {
    pub scores: Vec<f32>,
    pub adv_weights: Vec<f32>,
    pub prosale_only_flags: Vec<bool>,
}

impl ItemColumns {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            scores: Vec::with_capacity(capacity),
            adv_weights: Vec::with_capacity(capacity),
            prosale_only_flags: Vec::with_capacity(capacity),
        }
    }

    /// The synthetic benchmark batch: `score[i] = i`, `adv_weight[i] = 1 / i` and every
    /// even item flagged prosale-only. Item 0 carries an infinite weight.
    pub fn reference(size: usize) -> Self {
        let mut items = Self::with_capacity(size);
        for i in 0..size {
            items.push(i as f32, 1.0 / i as f32, i % 2 == 0);
        }
        items
    }

    pub fn push(&mut self, score: f32, adv_weight: f32, prosale_only: bool) {
        self.scores.push(score);
        self.adv_weights.push(adv_weight);
        self.prosale_only_flags.push(prosale_only);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Borrows the columns as one batch.
    pub fn as_batch(&mut self) -> ScoreBatch<'_> {
        ScoreBatch::new(
            &mut self.scores,
            &self.adv_weights,
            &self.prosale_only_flags,
        )
    }
}

/// Reads every item from a headed CSV stream.
pub fn read_items<R: Read>(reader: R) -> Result<ItemColumns, ItemIoError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut items = ItemColumns::default();
    for row in csv_reader.deserialize() {
        let row: ItemRow = row?;
        items.push(row.score, row.adv_weight, row.prosale_only);
    }
    Ok(items)
}

/// Writes `items` as a headed CSV stream, flags as `1`/`0`.
pub fn write_items<W: Write>(writer: W, items: &ItemColumns) -> Result<(), ItemIoError> {
    let mut writer = BufWriter::new(writer);
    let mut score_buf = ryu::Buffer::new();
    let mut weight_buf = ryu::Buffer::new();

    writeln!(writer, "{HEADER}")?;
    for ((&score, &adv_weight), &prosale_only) in items
        .scores
        .iter()
        .zip(&items.adv_weights)
        .zip(&items.prosale_only_flags)
    {
        writeln!(
            writer,
            "{},{},{}",
            score_buf.format(score),
            weight_buf.format(adv_weight),
            u8::from(prosale_only)
        )?;
    }
    writer.flush()?;
    Ok(())
}
