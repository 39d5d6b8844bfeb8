//! # Etiquetador (Orquestrador)
//!
//! Junta léxico, adivinhador, suavização, Viterbi e re-etiquetador:
//!
//! ```text
//! palavras ──► candidatas por palavra ──► P_lex(tag | palavra) ──► Viterbi ──► lemas ──► re-etiquetador
//!               │
//!               ├─ 1. léxico de palavras
//!               ├─ 2. léxico dinâmico (palpites já feitos nesta execução)
//!               └─ 3. adivinhador (resultado vai para o léxico dinâmico)
//! ```
//!
//! ## Léxico dinâmico
//!
//! A primeira vez que uma palavra desconhecida aparece, o palpite do
//! adivinhador é gravado no léxico dinâmico; as próximas ocorrências na mesma
//! execução recebem exatamente as mesmas candidatas. A escrita é feita sob
//! `RwLock` e só acontece se a palavra ainda não estiver lá, então duas
//! threads que adivinham a mesma palavra ao mesmo tempo apenas repetem trabalho.
//!
//! ## Normalização
//!
//! A contagem de cada tag é dividida pelo total da categoria no léxico que a
//! produziu: o léxico de palavras, ou o de sufixos quando o adivinhador
//! respondeu por análise de sufixo ([`LexiconKind::Suffix`]).

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::TaggerConfig;
use crate::guesser::{LexiconKind, PartOfSpeechGuesser};
use crate::lexicon::{Lexicon, TagCounts};
use crate::probability::Probability;
use crate::retagger::Retagger;
use crate::smoothing::{LexicalEvidence, LexicalSmoother, RelativeFrequencySmoother};
use crate::tags::{TagCatalog, TagRole};
use crate::transition::TransitionMatrix;
use crate::viterbi::{ViterbiDecoder, ViterbiResult};

/// Palavra com tag e lema atribuídos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedWord {
    pub word: String,
    pub tag: String,
    pub lemma: String,
}

impl TaggedWord {
    pub fn new(word: impl Into<String>, tag: impl Into<String>, lemma: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            tag: tag.into(),
            lemma: lemma.into(),
        }
    }
}

impl fmt::Display for TaggedWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.word, self.tag)
    }
}

/// De onde vieram as candidatas de uma palavra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateOrigin {
    Lexicon,
    DynamicLexicon,
    Guesser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateTag {
    pub tag: String,
    pub count: u64,
    /// `log P_lex(tag | palavra)`
    pub lexical: f64,
}

/// Candidatas de uma palavra, em ordem decrescente de contagem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenCandidates {
    pub word: String,
    pub origin: CandidateOrigin,
    /// Léxico cujos totais normalizaram as contagens.
    pub normalized_by: LexiconKind,
    pub tags: Vec<CandidateTag>,
}

impl TokenCandidates {
    fn lattice(&self) -> Vec<(String, Probability)> {
        self.tags
            .iter()
            .map(|c| (c.tag.clone(), Probability::from_log(c.lexical)))
            .collect()
    }
}

/// Tudo que aconteceu ao etiquetar uma sentença.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggingTrace {
    pub candidates: Vec<TokenCandidates>,
    pub viterbi: ViterbiResult,
    /// Saída do Viterbi, antes do re-etiquetador.
    pub decoded: Vec<TaggedWord>,
    /// Saída final.
    pub tagged: Vec<TaggedWord>,
    /// Tags alteradas pelo re-etiquetador.
    pub corrections: usize,
}

#[derive(Debug, Default)]
struct DynamicLexicon {
    lexicon: Lexicon,
    /// Palavras cujas contagens vieram do léxico de sufixos.
    suffix_words: HashSet<String>,
}

/// Contadores de diagnóstico.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaggerStats {
    pub sentences_tagged: usize,
    pub words_tagged: usize,
    pub corrections: usize,
    pub beam_rejections: usize,
    pub dynamic_lexicon_words: usize,
    pub guess_cache_len: usize,
}

pub struct PartOfSpeechTagger {
    guesser: PartOfSpeechGuesser,
    transitions: Arc<dyn TransitionMatrix>,
    smoother: Arc<dyn LexicalSmoother>,
    retagger: Option<Arc<dyn Retagger>>,
    config: TaggerConfig,
    dynamic: RwLock<DynamicLexicon>,
    sentences_tagged: AtomicUsize,
    words_tagged: AtomicUsize,
    corrections: AtomicUsize,
    beam_rejections: AtomicUsize,
}

impl PartOfSpeechTagger {
    /// Os léxicos e o catálogo são os do adivinhador.
    pub fn new(
        guesser: PartOfSpeechGuesser,
        transitions: Arc<dyn TransitionMatrix>,
        config: TaggerConfig,
    ) -> Self {
        Self {
            guesser,
            transitions,
            smoother: Arc::new(RelativeFrequencySmoother),
            retagger: None,
            config,
            dynamic: RwLock::new(DynamicLexicon::default()),
            sentences_tagged: AtomicUsize::new(0),
            words_tagged: AtomicUsize::new(0),
            corrections: AtomicUsize::new(0),
            beam_rejections: AtomicUsize::new(0),
        }
    }

    pub fn with_retagger(mut self, retagger: Arc<dyn Retagger>) -> Self {
        self.retagger = Some(retagger);
        self
    }

    pub fn with_smoother(mut self, smoother: Arc<dyn LexicalSmoother>) -> Self {
        self.smoother = smoother;
        self
    }

    pub fn config(&self) -> &TaggerConfig {
        &self.config
    }

    pub fn guesser(&self) -> &PartOfSpeechGuesser {
        &self.guesser
    }

    pub fn word_lexicon(&self) -> &Lexicon {
        self.guesser.word_lexicon()
    }

    pub fn suffix_lexicon(&self) -> &Lexicon {
        self.guesser.suffix_lexicon()
    }

    pub fn catalog(&self) -> &TagCatalog {
        self.guesser.catalog()
    }

    /// Etiqueta uma sentença já tokenizada.
    pub fn tag_sentence<S: AsRef<str>>(&self, words: &[S]) -> Vec<TaggedWord> {
        self.tag_sentence_traced(words).tagged
    }

    /// Etiqueta várias sentenças em paralelo (rayon).
    pub fn tag_sentences<S: AsRef<str> + Sync>(&self, sentences: &[Vec<S>]) -> Vec<Vec<TaggedWord>> {
        sentences
            .par_iter()
            .map(|sentence| self.tag_sentence(sentence))
            .collect()
    }

    /// Etiqueta uma sentença guardando candidatas e passos do Viterbi.
    pub fn tag_sentence_traced<S: AsRef<str>>(&self, words: &[S]) -> TaggingTrace {
        let candidates: Vec<TokenCandidates> = words
            .iter()
            .map(|word| self.candidates_for(word.as_ref()))
            .collect();
        let lattice: Vec<Vec<(String, Probability)>> =
            candidates.iter().map(TokenCandidates::lattice).collect();

        let boundary = self.catalog().tag_for(TagRole::SentenceTerminator);
        let mut decoder =
            ViterbiDecoder::new(boundary, self.config.beam_width, self.config.use_trigrams);
        let viterbi = decoder.decode(words, &lattice, self.transitions.as_ref());

        let decoded: Vec<TaggedWord> = words
            .iter()
            .zip(&viterbi.best_sequence)
            .map(|(word, tag)| {
                let word = word.as_ref();
                TaggedWord::new(word, tag.as_str(), self.lemma_for(word, tag))
            })
            .collect();

        let tagged = match (&self.retagger, self.config.retag) {
            (Some(retagger), true) => retagger.retag(decoded.clone()),
            _ => decoded.clone(),
        };
        let corrections = count_corrections(&decoded, &tagged);

        self.sentences_tagged.fetch_add(1, Ordering::Relaxed);
        self.words_tagged.fetch_add(words.len(), Ordering::Relaxed);
        self.corrections.fetch_add(corrections, Ordering::Relaxed);
        self.beam_rejections.fetch_add(viterbi.rejected, Ordering::Relaxed);
        tracing::debug!(
            words = words.len(),
            rejected = viterbi.rejected,
            corrections,
            "sentença etiquetada"
        );

        TaggingTrace {
            candidates,
            viterbi,
            decoded,
            tagged,
            corrections,
        }
    }

    /// Candidatas da palavra com probabilidades léxicas. Nunca vazio.
    pub fn candidates_for(&self, word: &str) -> TokenCandidates {
        let (origin, normalized_by, counts) = self.counts_for(word);
        let normalizer = match normalized_by {
            LexiconKind::Word => self.word_lexicon(),
            LexiconKind::Suffix => self.suffix_lexicon(),
        };

        let mut tags: Vec<CandidateTag> = counts
            .into_iter()
            .map(|(tag, count)| {
                let lexical = self.smoother.smooth(&LexicalEvidence {
                    word,
                    tag: &tag,
                    count,
                    category_total: normalizer.category_count(&tag),
                });
                CandidateTag {
                    tag,
                    count,
                    lexical: lexical.log(),
                }
            })
            .collect();
        // Mais frequente primeiro: em empate no Viterbi vence a tag mais comum
        tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));

        TokenCandidates {
            word: word.to_string(),
            origin,
            normalized_by,
            tags,
        }
    }

    fn counts_for(&self, word: &str) -> (CandidateOrigin, LexiconKind, TagCounts) {
        if let Some(entry) = self.word_lexicon().lexicon_entry(word) {
            return (CandidateOrigin::Lexicon, LexiconKind::Word, entry.tag_counts());
        }

        {
            let dynamic = self.dynamic.read();
            if let Some(entry) = dynamic.lexicon.exact_entry(word) {
                let kind = if dynamic.suffix_words.contains(word) {
                    LexiconKind::Suffix
                } else {
                    LexiconKind::Word
                };
                return (CandidateOrigin::DynamicLexicon, kind, entry.tag_counts());
            }
        }

        let guess = self.guesser.guess(word);
        let kind = guess.source.unwrap_or(LexiconKind::Word);
        let mut dynamic = self.dynamic.write();
        if !dynamic.lexicon.contains_entry(word) {
            for (tag, &count) in &guess.tags {
                dynamic.lexicon.update_entry_count(word, tag, word, count);
            }
            if kind == LexiconKind::Suffix {
                dynamic.suffix_words.insert(word.to_string());
            }
        }
        (CandidateOrigin::Guesser, kind, guess.tags)
    }

    /// Lema do léxico para a tag escolhida; sem lema conhecido, a própria palavra.
    fn lemma_for(&self, word: &str, tag: &str) -> String {
        let lemma = self
            .word_lexicon()
            .lexicon_entry(word)
            .map(|entry| entry.lemma(tag))
            .unwrap_or("");
        if lemma.is_empty() || lemma == "*" {
            word.to_string()
        } else {
            lemma.to_string()
        }
    }

    /// Tags alteradas pelo re-etiquetador desde a criação.
    pub fn correction_count(&self) -> usize {
        self.corrections.load(Ordering::Relaxed)
    }

    /// Tags descartadas pelo beam desde a criação.
    pub fn beam_rejection_count(&self) -> usize {
        self.beam_rejections.load(Ordering::Relaxed)
    }

    pub fn dynamic_lexicon_len(&self) -> usize {
        self.dynamic.read().lexicon.len()
    }

    /// Esquece os palpites desta execução (léxico dinâmico e cache do adivinhador).
    pub fn reset_dynamic_lexicon(&self) {
        let mut dynamic = self.dynamic.write();
        dynamic.lexicon = Lexicon::new();
        dynamic.suffix_words.clear();
        self.guesser.clear_cache();
    }

    /// Os léxicos só usam categorias do catálogo.
    pub fn is_consistent(&self) -> bool {
        let catalog = self.catalog();
        self.word_lexicon().is_consistent_with(catalog)
            && self.suffix_lexicon().is_consistent_with(catalog)
    }

    pub fn stats(&self) -> TaggerStats {
        TaggerStats {
            sentences_tagged: self.sentences_tagged.load(Ordering::Relaxed),
            words_tagged: self.words_tagged.load(Ordering::Relaxed),
            corrections: self.correction_count(),
            beam_rejections: self.beam_rejection_count(),
            dynamic_lexicon_words: self.dynamic_lexicon_len(),
            guess_cache_len: self.guesser.cache_len(),
        }
    }
}

impl fmt::Debug for PartOfSpeechTagger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartOfSpeechTagger")
            .field("guesser", &self.guesser)
            .field("config", &self.config)
            .field("retagger", &self.retagger.is_some())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Posições com tag diferente, mais a diferença de tamanho.
pub fn count_corrections(before: &[TaggedWord], after: &[TaggedWord]) -> usize {
    let changed = before
        .iter()
        .zip(after)
        .filter(|(b, a)| b.tag != a.tag)
        .count();
    changed + before.len().abs_diff(after.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abbreviations::Abbreviations;
    use crate::retagger::RuleRetagger;
    use crate::transition::CountTransitionMatrix;

    const WORDS: &str = "the\t100\tDT\tthe\t100\n\
                         dog\t20\tNN\tdog\t20\n\
                         dogs\t10\tNNS\tdog\t10\n\
                         runs\t12\tVBZ\trun\t8\tNNS\trun\t4\n\
                         run\t10\tVB\t*\t6\tNN\t*\t4\n\
                         to\t50\tTO\tto\t50\n\
                         .\t80\t.\t.\t80\n";

    const SUFFIXES: &str = "ing\t10\tVBG\t*\t8\tNN\t*\t2\n";

    const TRANSITIONS: &str = ".\tDT\t50\n\
                               .\tNN\t10\n\
                               DT\tNN\t40\n\
                               DT\tNNS\t10\n\
                               NN\tVBZ\t30\n\
                               NN\tNNS\t2\n\
                               NNS\tVBP\t10\n\
                               VBZ\t.\t20\n\
                               VBZ\tVBG\t5\n\
                               VBG\t.\t5\n\
                               TO\tVB\t30\n\
                               TO\tNN\t1\n";

    fn tagger_with(config: TaggerConfig) -> PartOfSpeechTagger {
        let (words, _) = Lexicon::parse_str(WORDS);
        let (suffixes, _) = Lexicon::parse_str(SUFFIXES);
        let (transitions, _) = CountTransitionMatrix::parse_str(TRANSITIONS);
        let guesser = PartOfSpeechGuesser::new(
            Arc::new(words),
            Arc::new(suffixes),
            Arc::new(TagCatalog::builtin()),
            Arc::new(Abbreviations::builtin()),
        );
        PartOfSpeechTagger::new(guesser, Arc::new(transitions), config)
    }

    fn tagger() -> PartOfSpeechTagger {
        tagger_with(TaggerConfig::default())
    }

    fn tags(tagged: &[TaggedWord]) -> Vec<&str> {
        tagged.iter().map(|tw| tw.tag.as_str()).collect()
    }

    #[test]
    fn test_tags_simple_sentence() {
        let tagger = tagger();
        let tagged = tagger.tag_sentence(&["The", "dog", "runs", "."]);
        assert_eq!(tags(&tagged), vec!["DT", "NN", "VBZ", "."]);
        assert_eq!(tagged[2].lemma, "run");
        assert_eq!(tagged[0].word, "The");
        assert_eq!(tagged[0].lemma, "the");
    }

    #[test]
    fn test_empty_sentence() {
        let tagger = tagger();
        let words: [&str; 0] = [];
        assert!(tagger.tag_sentence(&words).is_empty());
    }

    #[test]
    fn test_unknown_word_goes_to_dynamic_lexicon_once() {
        let tagger = tagger();
        let first = tagger.candidates_for("walking");
        assert_eq!(first.origin, CandidateOrigin::Guesser);
        assert_eq!(first.normalized_by, LexiconKind::Suffix);
        assert_eq!(first.tags[0].tag, "VBG");
        assert_eq!(tagger.dynamic_lexicon_len(), 1);

        let second = tagger.candidates_for("walking");
        assert_eq!(second.origin, CandidateOrigin::DynamicLexicon);
        assert_eq!(second.normalized_by, LexiconKind::Suffix);
        assert_eq!(tagger.dynamic_lexicon_len(), 1);

        let first_tags: Vec<_> = first.tags.iter().map(|c| (&c.tag, c.count)).collect();
        let second_tags: Vec<_> = second.tags.iter().map(|c| (&c.tag, c.count)).collect();
        assert_eq!(first_tags, second_tags);

        tagger.reset_dynamic_lexicon();
        assert_eq!(tagger.dynamic_lexicon_len(), 0);
        assert_eq!(tagger.guesser().cache_len(), 0);
    }

    #[test]
    fn test_lexical_probabilities_use_category_totals() {
        let tagger = tagger();
        let candidates = tagger.candidates_for("runs");
        assert_eq!(candidates.origin, CandidateOrigin::Lexicon);
        // VBZ: 8 / total(VBZ)=8 → 1; NNS: 4 / total(NNS)=14
        let vbz = candidates.tags.iter().find(|c| c.tag == "VBZ").unwrap();
        let nns = candidates.tags.iter().find(|c| c.tag == "NNS").unwrap();
        assert!((vbz.lexical - 0.0).abs() < 1e-12);
        assert!((nns.lexical - (4.0f64 / 14.0).ln()).abs() < 1e-12);
        assert_eq!(candidates.tags[0].tag, "VBZ");
    }

    #[test]
    fn test_unknown_capitalized_word_is_proper_noun() {
        let tagger = tagger();
        let tagged = tagger.tag_sentence(&["Xyzzyville", "."]);
        assert_eq!(tagged[0].tag, "NNP");
        assert_eq!(tagged[0].lemma, "Xyzzyville");
    }

    #[test]
    fn test_retagger_corrections_are_counted() {
        let retagger = RuleRetagger::parse_str("NN VBN PREVTAG TO\n").unwrap();
        let tagger = tagger().with_retagger(Arc::new(retagger));

        let trace = tagger.tag_sentence_traced(&["to", "run"]);
        assert_eq!(tags(&trace.decoded), vec!["TO", "VB"]);
        assert_eq!(trace.corrections, 0);

        // Força "run" como NN e deixa a regra corrigir
        let retagger = RuleRetagger::parse_str("VB NN PREVTAG TO\nNN VBN PREVTAG TO\n").unwrap();
        let tagger = tagger_with(TaggerConfig::default()).with_retagger(Arc::new(retagger));
        let trace = tagger.tag_sentence_traced(&["to", "run"]);
        assert_eq!(tags(&trace.tagged), vec!["TO", "VBN"]);
        assert_eq!(trace.corrections, 1);
        assert_eq!(tagger.correction_count(), 1);
    }

    #[test]
    fn test_retagging_can_be_disabled() {
        let config = TaggerConfig {
            retag: false,
            ..TaggerConfig::default()
        };
        let retagger = RuleRetagger::parse_str("VB NN PREVTAG TO\n").unwrap();
        let tagger = tagger_with(config).with_retagger(Arc::new(retagger));
        let tagged = tagger.tag_sentence(&["to", "run"]);
        assert_eq!(tags(&tagged), vec!["TO", "VB"]);
        assert_eq!(tagger.correction_count(), 0);
    }

    #[test]
    fn test_parallel_tagging_matches_sequential() {
        let tagger = tagger();
        let sentences = vec![
            vec!["The", "dog", "runs", "."],
            vec!["The", "dogs", "."],
            vec!["to", "run"],
        ];
        let parallel = tagger.tag_sentences(&sentences);
        for (sentence, tagged) in sentences.iter().zip(&parallel) {
            assert_eq!(&tagger.tag_sentence(sentence), tagged);
        }
        assert_eq!(tagger.stats().sentences_tagged, 6);
    }

    #[test]
    fn test_count_corrections_counts_length_changes() {
        let before = vec![TaggedWord::new("a", "DT", "a"), TaggedWord::new("b", "NN", "b")];
        let after = vec![TaggedWord::new("a", "DT", "a")];
        assert_eq!(count_corrections(&before, &after), 1);
        let after = vec![TaggedWord::new("a", "NN", "a"), TaggedWord::new("b", "NN", "b")];
        assert_eq!(count_corrections(&before, &after), 1);
    }

    #[test]
    fn test_consistency_with_catalog() {
        let tagger = tagger();
        assert!(tagger.is_consistent());
    }

    #[test]
    fn test_tagger_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PartOfSpeechTagger>();
    }
}
