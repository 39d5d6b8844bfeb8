//! # Matriz de Transição
//!
//! O Viterbi precisa de `P(tag | tag_anterior)` (bigrama) ou
//! `P(tag | tag_anterior, tag_anterior2)` (trigrama). Este crate não estima
//! essas tabelas a partir de corpus: elas chegam prontas, como contagens.
//!
//! ## Formato
//!
//! ```text
//! # anterior  tag  contagem
//! DT          NN   4500
//! # anterior2 anterior  tag  contagem
//! .           DT        NN   3100
//! ```
//!
//! ## Suavização
//!
//! Add-1 (Laplace) sobre o conjunto de tags conhecidas, como no HMM clássico:
//!
//! ```text
//! P(t | p)     = (c(p, t) + 1)     / (c(p) + |T|)
//! P(t | pp, p) = (c(pp, p, t) + 1) / (c(pp, p) + |T|)   se (pp, p) foi visto
//!              = P(t | p)                               caso contrário
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{LoadReport, PosError, Result};
use crate::probability::Probability;

/// Provedor de probabilidades de transição consumido pelo Viterbi.
pub trait TransitionMatrix: Send + Sync {
    /// `P(tag | previous)`.
    fn probability(&self, tag: &str, previous: &str) -> Probability;

    /// `P(tag | previous, previous2)`; por padrão ignora `previous2`.
    fn trigram_probability(&self, tag: &str, previous: &str, previous2: &str) -> Probability {
        let _ = previous2;
        self.probability(tag, previous)
    }
}

/// Matriz construída a partir de contagens pré-computadas.
#[derive(Debug, Clone, Default)]
pub struct CountTransitionMatrix {
    bigrams: HashMap<(String, String), u64>,
    previous_totals: HashMap<String, u64>,
    trigrams: HashMap<(String, String, String), u64>,
    pair_totals: HashMap<(String, String), u64>,
    tags: BTreeSet<String>,
}

impl CountTransitionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_str(text: &str) -> (Self, LoadReport) {
        let mut matrix = CountTransitionMatrix::new();
        let mut report = LoadReport::default();
        for (index, line) in text.lines().enumerate() {
            matrix.load_line(index, line, &mut report);
        }
        matrix.log_summary(&report);
        (matrix, report)
    }

    /// Carrega contagens de um leitor. Linhas malformadas entram no relatório.
    pub fn load_from_reader<R: BufRead>(&mut self, reader: R) -> Result<LoadReport> {
        let mut report = LoadReport::default();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            self.load_line(index, &line, &mut report);
        }
        self.log_summary(&report);
        Ok(report)
    }

    pub fn load_from_path(&mut self, path: impl AsRef<Path>) -> Result<LoadReport> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| PosError::io(path, e))?;
        self.load_from_reader(BufReader::new(file))
            .map_err(|e| match e {
                PosError::Stream(source) => PosError::io(path, source),
                other => other,
            })
    }

    fn load_line(&mut self, index: usize, raw: &str, report: &mut LoadReport) {
        report.lines_read += 1;
        let line = raw.trim_start_matches('\u{feff}').trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            return;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        let parsed = match fields.as_slice() {
            [previous, tag, count] => count
                .trim()
                .parse::<u64>()
                .ok()
                .map(|count| self.add_bigram(previous, tag, count)),
            [previous2, previous, tag, count] => count
                .trim()
                .parse::<u64>()
                .ok()
                .map(|count| self.add_trigram(previous2, previous, tag, count)),
            _ if fields.len() < 3 => {
                report.short_lines += 1;
                return;
            }
            _ => None,
        };
        if parsed.is_none() {
            report.record_malformed(index + 1, "transições", line);
        }
    }

    fn log_summary(&self, report: &LoadReport) {
        tracing::info!(
            bigrams = self.bigrams.len(),
            trigrams = self.trigrams.len(),
            tags = self.tags.len(),
            skipped = report.skipped_lines(),
            "matriz de transição carregada"
        );
    }

    pub fn add_bigram(&mut self, previous: &str, tag: &str, count: u64) {
        if count == 0 {
            return;
        }
        *self
            .bigrams
            .entry((previous.to_string(), tag.to_string()))
            .or_insert(0) += count;
        *self.previous_totals.entry(previous.to_string()).or_insert(0) += count;
        self.tags.insert(previous.to_string());
        self.tags.insert(tag.to_string());
    }

    pub fn add_trigram(&mut self, previous2: &str, previous: &str, tag: &str, count: u64) {
        if count == 0 {
            return;
        }
        *self
            .trigrams
            .entry((previous2.to_string(), previous.to_string(), tag.to_string()))
            .or_insert(0) += count;
        *self
            .pair_totals
            .entry((previous2.to_string(), previous.to_string()))
            .or_insert(0) += count;
        for t in [previous2, previous, tag] {
            self.tags.insert(t.to_string());
        }
    }

    pub fn bigram_count(&self, previous: &str, tag: &str) -> u64 {
        self.bigrams
            .get(&(previous.to_string(), tag.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn trigram_count(&self, previous2: &str, previous: &str, tag: &str) -> u64 {
        self.trigrams
            .get(&(previous2.to_string(), previous.to_string(), tag.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Tags que aparecem em alguma contagem.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.bigrams.is_empty() && self.trigrams.is_empty()
    }

    fn tag_set_size(&self) -> u64 {
        self.tags.len().max(1) as u64
    }
}

impl TransitionMatrix for CountTransitionMatrix {
    fn probability(&self, tag: &str, previous: &str) -> Probability {
        let total = self.previous_totals.get(previous).copied().unwrap_or(0);
        Probability::from_ratio(
            self.bigram_count(previous, tag) + 1,
            total + self.tag_set_size(),
        )
    }

    fn trigram_probability(&self, tag: &str, previous: &str, previous2: &str) -> Probability {
        let pair = (previous2.to_string(), previous.to_string());
        match self.pair_totals.get(&pair) {
            Some(&total) => Probability::from_ratio(
                self.trigram_count(previous2, previous, tag) + 1,
                total + self.tag_set_size(),
            ),
            None => self.probability(tag, previous),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNTS: &str = "# bigramas\n\
                          DT\tNN\t8\n\
                          DT\tJJ\t2\n\
                          JJ\tNN\t5\n\
                          # trigramas\n\
                          .\tDT\tNN\t3\n\
                          .\tDT\tJJ\t1\n";

    #[test]
    fn test_add_one_bigram_probability() {
        let (matrix, report) = CountTransitionMatrix::parse_str(COUNTS);
        assert!(report.is_clean());
        // Tags conhecidas: DT, NN, JJ, "." → |T| = 4
        let p = matrix.probability("NN", "DT");
        assert!((p.linear() - 9.0 / 14.0).abs() < 1e-12);
        // Contexto nunca visto: uniforme
        let unseen = matrix.probability("NN", "VB");
        assert!((unseen.linear() - 1.0 / 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_trigram_falls_back_to_bigram() {
        let (matrix, _) = CountTransitionMatrix::parse_str(COUNTS);
        let p = matrix.trigram_probability("NN", "DT", ".");
        assert!((p.linear() - 4.0 / 8.0).abs() < 1e-12);

        let fallback = matrix.trigram_probability("NN", "DT", "JJ");
        assert_eq!(fallback, matrix.probability("NN", "DT"));
    }

    #[test]
    fn test_malformed_lines_are_reported() {
        let (matrix, report) =
            CountTransitionMatrix::parse_str("DT\tNN\tmuitos\nDT\nDT\tNN\t1\nA\tB\tC\tD\tE\n");
        assert_eq!(report.short_lines, 1);
        assert_eq!(report.malformed_lines, vec![1, 4]);
        assert_eq!(matrix.bigram_count("DT", "NN"), 1);
    }

    #[test]
    fn test_probabilities_sum_to_one_over_known_tags() {
        let (matrix, _) = CountTransitionMatrix::parse_str(COUNTS);
        let tags: Vec<&str> = matrix.tags().collect();
        let sum: f64 = tags.iter().map(|t| matrix.probability(t, "DT").linear()).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }
}
