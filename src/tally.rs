use crate::model::{CodeShare, TenantRow};
use std::collections::HashMap;

/// Byte counts per language, iterated in order of first insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageTally {
    entries: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl LanguageTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, language: &str, bytes: u64) {
        match self.index.get(language) {
            Some(&i) => self.entries[i].1 += bytes,
            None => {
                self.index.insert(language.to_string(), self.entries.len());
                self.entries.push((language.to_string(), bytes));
            }
        }
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, b)| b).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(l, b)| (l.as_str(), *b))
    }

    /// Descending by bytes; equal counts keep first-insertion order.
    pub fn ranked(&self) -> Vec<(&str, u64)> {
        let mut ranked: Vec<_> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    /// Ranked `(language, bytes, percent)` triples. Percentages are against the
    /// tally total, rounded to two decimals; an empty tally yields nothing.
    pub fn shares(&self) -> Vec<(&str, u64, f64)> {
        let total = self.total().max(1) as f64;
        self.ranked()
            .into_iter()
            .map(|(lang, bytes)| (lang, bytes, round2(100.0 * bytes as f64 / total)))
            .collect()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Tenant-wide accumulator folded from completed repository tallies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantTally {
    pub all: LanguageTally,
    pub code_only: LanguageTally,
}

impl TenantTally {
    /// Folds every nonzero entry of `repo` into both tallies, leaving languages
    /// listed in `excluded` out of the code-only one.
    pub fn absorb(&mut self, repo: &LanguageTally, excluded: &[String]) {
        for (lang, bytes) in repo.iter().filter(|(_, b)| *b > 0) {
            self.all.add(lang, bytes);
            if !excluded.iter().any(|e| e == lang) {
                self.code_only.add(lang, bytes);
            }
        }
    }

    pub fn tenant_rows(&self) -> Vec<TenantRow> {
        self.all
            .shares()
            .into_iter()
            .map(|(language, bytes, percent)| TenantRow {
                language: language.to_string(),
                bytes,
                percent_all_files: percent,
            })
            .collect()
    }

    pub fn code_shares(&self) -> Vec<CodeShare> {
        self.code_only
            .shares()
            .into_iter()
            .map(|(language, bytes, percent)| CodeShare {
                language: language.to_string(),
                bytes,
                percent,
            })
            .collect()
    }
}
