//! # Suavização Léxica
//!
//! Converte a contagem `c(palavra, tag)` em probabilidade léxica para o Viterbi.
//! A política é plugável via [`LexicalSmoother`]; o padrão é a frequência
//! relativa normalizada pelo total da categoria no léxico de origem:
//!
//! ```text
//! P(palavra | tag) ≈ c(palavra, tag) / max(c(tag), c(palavra, tag), 1)
//! ```
//!
//! O `max` garante que palpites do adivinhador (contagens sintéticas para tags
//! ausentes do léxico) nunca passem de probabilidade 1.

use crate::probability::Probability;

/// Evidência disponível para pontuar uma tag candidata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexicalEvidence<'a> {
    pub word: &'a str,
    pub tag: &'a str,
    /// Contagem da tag para esta palavra.
    pub count: u64,
    /// Contagem total da tag no léxico que produziu `count`.
    pub category_total: u64,
}

pub trait LexicalSmoother: Send + Sync {
    fn smooth(&self, evidence: &LexicalEvidence<'_>) -> Probability;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RelativeFrequencySmoother;

impl LexicalSmoother for RelativeFrequencySmoother {
    fn smooth(&self, evidence: &LexicalEvidence<'_>) -> Probability {
        let denominator = evidence.category_total.max(evidence.count).max(1);
        Probability::from_ratio(evidence.count, denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(count: u64, category_total: u64) -> LexicalEvidence<'static> {
        LexicalEvidence {
            word: "run",
            tag: "VB",
            count,
            category_total,
        }
    }

    #[test]
    fn test_relative_frequency() {
        let p = RelativeFrequencySmoother.smooth(&evidence(6, 60));
        assert!((p.linear() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_never_exceeds_one() {
        // Tag inventada pelo adivinhador: total da categoria zero
        let p = RelativeFrequencySmoother.smooth(&evidence(1, 0));
        assert_eq!(p, Probability::ONE);
        let p = RelativeFrequencySmoother.smooth(&evidence(5, 2));
        assert_eq!(p, Probability::ONE);
    }

    #[test]
    fn test_zero_count_is_impossible() {
        assert!(RelativeFrequencySmoother.smooth(&evidence(0, 10)).is_zero());
    }
}
