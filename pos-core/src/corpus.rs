//! # Textos de Demonstração e Amostra Anotada (inglês)
//!
//! Dois recursos pequenos, embutidos no binário:
//!
//! - [`demo_texts`]: textos usados pela interface web, escolhidos para mostrar
//!   os diferentes caminhos do etiquetador (léxico, adivinhador, re-etiquetador).
//! - [`annotated_sample`]: sentenças com tags de referência (estilo Penn
//!   Treebank), usadas por [`evaluate_accuracy`] para medir o etiquetador.
//!
//! A amostra não é um corpus de treinamento: as contagens do modelo já vêm
//! prontas. Ela serve como teste de regressão e como exemplo do formato.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tagger::PartOfSpeechTagger;

/// Uma sentença anotada: pares (palavra, tag de referência).
pub struct AnnotatedSentence {
    /// O texto da sentença, como seria digitado.
    pub text: &'static str,
    /// Tema da sentença (para análises de acerto por área).
    pub domain: &'static str,
    /// Exemplo: `[("The", "DT"), ("dog", "NN")]`
    pub annotations: &'static [(&'static str, &'static str)],
}

impl AnnotatedSentence {
    pub fn words(&self) -> Vec<&'static str> {
        self.annotations.iter().map(|(w, _)| *w).collect()
    }
}

/// Retorna a amostra anotada completa.
pub fn annotated_sample() -> Vec<AnnotatedSentence> {
    vec![
        AnnotatedSentence {
            text: "The dog runs.",
            domain: "básico",
            annotations: &[("The", "DT"), ("dog", "NN"), ("runs", "VBZ"), (".", ".")],
        },
        AnnotatedSentence {
            text: "The quick brown fox jumps over the lazy dog.",
            domain: "básico",
            annotations: &[
                ("The", "DT"), ("quick", "JJ"), ("brown", "JJ"), ("fox", "NN"), ("jumps", "VBZ"),
                ("over", "IN"), ("the", "DT"), ("lazy", "JJ"), ("dog", "NN"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "She has visited London twice.",
            domain: "viagem",
            annotations: &[
                ("She", "PRP"), ("has", "VBZ"), ("visited", "VBN"), ("London", "NNP"),
                ("twice", "RB"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "Investors bought new shares yesterday.",
            domain: "economia",
            annotations: &[
                ("Investors", "NNS"), ("bought", "VBD"), ("new", "JJ"), ("shares", "NNS"),
                ("yesterday", "NN"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "I want to run.",
            domain: "básico",
            annotations: &[("I", "PRP"), ("want", "VBP"), ("to", "TO"), ("run", "VB"), (".", ".")],
        },
        AnnotatedSentence {
            text: "The children are playing in the park.",
            domain: "cotidiano",
            annotations: &[
                ("The", "DT"), ("children", "NNS"), ("are", "VBP"), ("playing", "VBG"),
                ("in", "IN"), ("the", "DT"), ("park", "NN"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "He is a very good writer.",
            domain: "cotidiano",
            annotations: &[
                ("He", "PRP"), ("is", "VBZ"), ("a", "DT"), ("very", "RB"), ("good", "JJ"),
                ("writer", "NN"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "They will visit Paris in June.",
            domain: "viagem",
            annotations: &[
                ("They", "PRP"), ("will", "MD"), ("visit", "VB"), ("Paris", "NNP"), ("in", "IN"),
                ("June", "NNP"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "Stock prices rose 3.5 percent.",
            domain: "economia",
            annotations: &[
                ("Stock", "NN"), ("prices", "NNS"), ("rose", "VBD"), ("3.5", "CD"),
                ("percent", "NN"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "The government said the report was important.",
            domain: "política",
            annotations: &[
                ("The", "DT"), ("government", "NN"), ("said", "VBD"), ("the", "DT"),
                ("report", "NN"), ("was", "VBD"), ("important", "JJ"), (".", "."),
            ],
        },
    ]
}

/// Resultado de [`evaluate_accuracy`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub sentences: usize,
    pub tokens: usize,
    pub correct: usize,
    /// (tag de referência, tag atribuída) → ocorrências, só para os erros.
    pub confusions: BTreeMap<String, usize>,
}

impl AccuracyReport {
    /// Fração de tokens corretos (1.0 para amostra vazia).
    pub fn accuracy(&self) -> f64 {
        if self.tokens == 0 {
            1.0
        } else {
            self.correct as f64 / self.tokens as f64
        }
    }
}

/// Etiqueta cada sentença e compara com as tags de referência.
pub fn evaluate_accuracy(
    tagger: &PartOfSpeechTagger,
    sample: &[AnnotatedSentence],
) -> AccuracyReport {
    let sentences: Vec<Vec<&str>> = sample.iter().map(AnnotatedSentence::words).collect();
    let tagged = tagger.tag_sentences(&sentences);

    let mut report = AccuracyReport {
        sentences: sample.len(),
        ..AccuracyReport::default()
    };
    for (gold, predicted) in sample.iter().zip(&tagged) {
        for ((word, expected), tw) in gold.annotations.iter().zip(predicted) {
            report.tokens += 1;
            if tw.tag == *expected {
                report.correct += 1;
            } else {
                tracing::debug!(word, expected, got = %tw.tag, "tag divergente");
                *report
                    .confusions
                    .entry(format!("{expected} → {}", tw.tag))
                    .or_insert(0) += 1;
            }
        }
    }
    tracing::info!(
        tokens = report.tokens,
        accuracy = report.accuracy(),
        "avaliação concluída"
    );
    report
}

/// Textos de demonstração para a interface web: (título, texto).
pub fn demo_texts() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "Clássico",
            "The quick brown fox jumps over the lazy dog. The dog barked.",
        ),
        (
            "Viagem",
            "Dr. Smith flew to London on Monday. She has visited the U.S. twice since 2019, and she will visit Paris in June.",
        ),
        (
            "Economia",
            "Stock prices rose 3.5% yesterday, and investors bought $2 billion of new shares. The company's report was better than expected.",
        ),
        (
            "Ambiguidade",
            "Time flies like an arrow. I want to run, but the run was long. She lives in Paris and their lives are happy.",
        ),
        (
            "Palavras Desconhecidas",
            "The glorptastic zibbers quickly frobnicated the Xyzzyville council. NASA's well-known XVII-century manuscripts weren't digitized.",
        ),
        (
            "Contrações e Pontuação",
            "I can't believe it's already 5 p.m. -- isn't the well-known writer running for office?! (Really.)",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaggerConfig;
    use crate::model::PosModel;

    #[test]
    fn test_sample_annotations_use_catalog_tags() {
        let model = PosModel::build().unwrap();
        for sentence in annotated_sample() {
            for (word, tag) in sentence.annotations {
                assert!(model.catalog.contains(tag), "{word}/{tag}");
            }
        }
    }

    #[test]
    fn test_sample_words_are_known_or_numbers() {
        let model = PosModel::build().unwrap();
        for sentence in annotated_sample() {
            for (word, _) in sentence.annotations {
                let known = model.word_lexicon.contains_entry(word)
                    || word.chars().all(|c| c.is_ascii_digit() || c == '.');
                assert!(known, "{word} fora do léxico");
            }
        }
    }

    #[test]
    fn test_evaluate_accuracy_on_builtin_model() {
        let model = PosModel::build().unwrap();
        let tagger = model.tagger(&TaggerConfig::default());
        let sample = annotated_sample();
        let report = evaluate_accuracy(&tagger, &sample);

        assert_eq!(report.sentences, sample.len());
        assert_eq!(report.tokens, sample.iter().map(|s| s.annotations.len()).sum::<usize>());
        assert_eq!(report.tokens - report.correct, report.confusions.values().sum::<usize>());
        assert!(report.accuracy() > 0.9, "acerto: {:?}", report);
    }

    #[test]
    fn test_empty_sample() {
        let model = PosModel::build().unwrap();
        let tagger = model.tagger(&TaggerConfig::default());
        let report = evaluate_accuracy(&tagger, &[]);
        assert_eq!(report.tokens, 0);
        assert_eq!(report.accuracy(), 1.0);
    }

    #[test]
    fn test_demo_texts_are_not_empty() {
        let texts = demo_texts();
        assert!(texts.len() >= 5);
        assert!(texts.iter().all(|(title, text)| !title.is_empty() && !text.is_empty()));
    }
}
