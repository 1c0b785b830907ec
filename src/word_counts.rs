//! Word tokenisation, counting and ranking.

use crate::error::PipelineError;
use crate::models::WordCount;

use hashbrown::hash_map::{Entry, HashMap};
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Returns an iterator over the normalised words of `text`.
///
/// Words are maximal runs of Unicode letters and numbers. Everything else, including
/// punctuation, separates words. Each word is lower-cased.
pub fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
}

/// A mapping from normalised word to the number of times it occurs.
///
/// Serialises as a JSON object with keys in sorted order.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct WordCounts(HashMap<String, u64>);

impl WordCounts {
    /// Count the words of `text`.
    pub fn from_text(text: &str) -> Self {
        let mut counts = Self::default();
        // Bounded by the length of the text, so cannot overflow.
        for word in words(text) {
            *counts.0.entry(word).or_insert(0) += 1;
        }
        counts
    }

    /// Add `count` occurrences of `word`.
    ///
    /// Fails without modifying the counts if the sum overflows.
    pub fn add(&mut self, word: String, count: u64) -> Result<(), PipelineError> {
        match self.0.entry(word) {
            Entry::Occupied(mut entry) => {
                let sum = entry
                    .get()
                    .checked_add(count)
                    .ok_or_else(|| PipelineError::CountOverflow {
                        word: entry.key().clone(),
                    })?;
                *entry.get_mut() = sum;
            }
            Entry::Vacant(entry) => {
                entry.insert(count);
            }
        }
        Ok(())
    }

    /// Merge `other` into these counts by addition.
    pub fn merge(&mut self, other: WordCounts) -> Result<(), PipelineError> {
        if self.0.is_empty() {
            *self = other;
            return Ok(());
        }
        for (word, count) in other.0 {
            self.add(word, count)?;
        }
        Ok(())
    }

    /// Returns the count for `word`, or zero if it does not occur.
    pub fn get(&self, word: &str) -> u64 {
        self.0.get(word).copied().unwrap_or(0)
    }

    /// Returns the sum of all counts.
    pub fn total(&self) -> Result<u64, PipelineError> {
        self.0
            .values()
            .try_fold(0_u64, |total, count| total.checked_add(*count))
            .ok_or(PipelineError::TotalOverflow)
    }

    /// Returns the number of distinct words.
    pub fn unique(&self) -> usize {
        self.0.len()
    }

    /// Returns the `n` most frequent words.
    ///
    /// Words are ordered by descending count. Equal counts are ordered by ascending word so that
    /// the result does not depend on hashing order.
    pub fn top(&self, n: usize) -> Vec<WordCount> {
        let mut ranked: Vec<(&str, u64)> = self
            .0
            .iter()
            .map(|(word, count)| (word.as_str(), *count))
            .collect();
        if n > 0 && ranked.len() > n {
            ranked.select_nth_unstable_by(n - 1, rank_order);
        }
        ranked.truncate(n);
        ranked.sort_unstable_by(rank_order);
        ranked
            .into_iter()
            .map(|(word, count)| WordCount::new(word, count))
            .collect()
    }
}

/// Ordering of ranked words: descending count then ascending word
fn rank_order(a: &(&str, u64), b: &(&str, u64)) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

#[cfg(test)]
impl<S: Into<String>> FromIterator<(S, u64)> for WordCounts {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut counts = Self::default();
        for (word, count) in iter {
            counts.add(word.into(), count).unwrap();
        }
        counts
    }
}

impl Serialize for WordCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.iter().collect::<BTreeMap<_, _>>().serialize(serializer)
    }
}
