//! # Modelo de Etiquetagem
//!
//! O modelo reúne todos os recursos imutáveis que o etiquetador consulta:
//!
//! | Arquivo             | Recurso                                  |
//! |---------------------|------------------------------------------|
//! | `tags.tsv`          | catálogo de tags ([`TagCatalog`])        |
//! | `words.lex`         | léxico de palavras                       |
//! | `suffixes.lex`      | léxico de sufixos (palavras desconhecidas) |
//! | `transitions.tsv`   | contagens de bigramas/trigramas de tags  |
//! | `abbreviations.txt` | abreviaturas conhecidas                  |
//! | `retag_rules.txt`   | regras do re-etiquetador                 |
//! | `names.txt`         | gazetteer de nomes próprios              |
//!
//! [`PosModel::build`] usa as versões embutidas no binário (pasta `data/`).
//! [`PosModel::load`] lê os mesmos nomes de arquivo de um diretório; arquivos
//! ausentes caem para a versão embutida.
//!
//! As contagens embutidas são pequenas e servem para demonstração: cobrem o
//! vocabulário dos textos de [`crate::corpus`] e as palavras funcionais mais
//! comuns do inglês. Em produção os léxicos viriam de um corpus anotado.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::abbreviations::Abbreviations;
use crate::config::TaggerConfig;
use crate::error::{LoadReport, PosError, Result};
use crate::guesser::PartOfSpeechGuesser;
use crate::lexicon::Lexicon;
use crate::lists::NameGazetteer;
use crate::retagger::RuleRetagger;
use crate::tagger::PartOfSpeechTagger;
use crate::tags::TagCatalog;
use crate::transition::CountTransitionMatrix;

const TAGS_FILE: &str = "tags.tsv";
const WORDS_FILE: &str = "words.lex";
const SUFFIXES_FILE: &str = "suffixes.lex";
const TRANSITIONS_FILE: &str = "transitions.tsv";
const ABBREVIATIONS_FILE: &str = "abbreviations.txt";
const RULES_FILE: &str = "retag_rules.txt";
const NAMES_FILE: &str = "names.txt";

const BUILTIN_WORDS: &str = include_str!("../data/words.lex");
const BUILTIN_SUFFIXES: &str = include_str!("../data/suffixes.lex");
const BUILTIN_TRANSITIONS: &str = include_str!("../data/transitions.tsv");
const BUILTIN_NAMES: &str = include_str!("../data/names.txt");

/// Relatórios de carga dos recursos tabulares.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelReports {
    pub words: LoadReport,
    pub suffixes: LoadReport,
    pub transitions: LoadReport,
}

impl ModelReports {
    pub fn skipped_lines(&self) -> usize {
        self.words.skipped_lines() + self.suffixes.skipped_lines() + self.transitions.skipped_lines()
    }
}

/// Todos os recursos do etiquetador, compartilháveis via `Arc`.
#[derive(Debug, Clone)]
pub struct PosModel {
    pub catalog: Arc<TagCatalog>,
    pub word_lexicon: Arc<Lexicon>,
    pub suffix_lexicon: Arc<Lexicon>,
    pub transitions: Arc<CountTransitionMatrix>,
    pub abbreviations: Arc<Abbreviations>,
    pub retagger: Arc<RuleRetagger>,
    pub names: Arc<NameGazetteer>,
    pub reports: ModelReports,
}

impl PosModel {
    /// Modelo a partir dos recursos embutidos.
    pub fn build() -> Result<Self> {
        let (word_lexicon, words) = Lexicon::parse_str(BUILTIN_WORDS);
        let (suffix_lexicon, suffixes) = Lexicon::parse_str(BUILTIN_SUFFIXES);
        let (transitions, transitions_report) = CountTransitionMatrix::parse_str(BUILTIN_TRANSITIONS);

        Ok(Self {
            catalog: Arc::new(TagCatalog::builtin()),
            word_lexicon: Arc::new(word_lexicon),
            suffix_lexicon: Arc::new(suffix_lexicon),
            transitions: Arc::new(transitions),
            abbreviations: Arc::new(Abbreviations::builtin()),
            retagger: Arc::new(RuleRetagger::builtin()?),
            names: Arc::new(NameGazetteer::parse_str(BUILTIN_NAMES)),
            reports: ModelReports {
                words,
                suffixes,
                transitions: transitions_report,
            },
        })
    }

    /// Carrega os recursos de `dir`. Cada arquivo ausente é trocado pelo embutido.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(PosError::io(
                dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "diretório do modelo não encontrado"),
            ));
        }
        let mut model = Self::build()?;
        let file = |name: &str| {
            let path = dir.join(name);
            path.is_file().then_some(path)
        };

        if let Some(path) = file(TAGS_FILE) {
            model.catalog = Arc::new(TagCatalog::load_from_path(path)?);
        }
        if let Some(path) = file(WORDS_FILE) {
            let mut lexicon = Lexicon::new();
            model.reports.words = lexicon.load_from_path(path)?;
            model.word_lexicon = Arc::new(lexicon);
        }
        if let Some(path) = file(SUFFIXES_FILE) {
            let mut lexicon = Lexicon::new();
            model.reports.suffixes = lexicon.load_from_path(path)?;
            model.suffix_lexicon = Arc::new(lexicon);
        }
        if let Some(path) = file(TRANSITIONS_FILE) {
            let mut matrix = CountTransitionMatrix::new();
            model.reports.transitions = matrix.load_from_path(path)?;
            model.transitions = Arc::new(matrix);
        }
        if let Some(path) = file(ABBREVIATIONS_FILE) {
            model.abbreviations = Arc::new(Abbreviations::load_from_path(path)?);
        }
        if let Some(path) = file(RULES_FILE) {
            model.retagger = Arc::new(RuleRetagger::load_from_path(path)?);
        }
        if let Some(path) = file(NAMES_FILE) {
            model.names = Arc::new(NameGazetteer::load_from_path(path)?);
        }

        tracing::info!(
            dir = %dir.display(),
            words = model.word_lexicon.len(),
            suffixes = model.suffix_lexicon.len(),
            skipped = model.reports.skipped_lines(),
            "modelo carregado"
        );
        Ok(model)
    }

    /// Monta um etiquetador sobre os recursos deste modelo.
    pub fn tagger(&self, config: &TaggerConfig) -> PartOfSpeechTagger {
        let guesser = PartOfSpeechGuesser::new(
            Arc::clone(&self.word_lexicon),
            Arc::clone(&self.suffix_lexicon),
            Arc::clone(&self.catalog),
            Arc::clone(&self.abbreviations),
        )
        .with_cache_capacity(config.guess_cache_capacity)
        .with_suffix_lengths(config.min_suffix_length, config.max_suffix_length)
        .with_name_gazetteer(Arc::clone(&self.names));

        PartOfSpeechTagger::new(guesser, self.transitions.clone(), config.clone())
            .with_retagger(self.retagger.clone())
    }

    /// Categorias dos léxicos ausentes do catálogo.
    pub fn invalid_categories(&self) -> Vec<String> {
        let mut invalid = self.word_lexicon.invalid_categories(&self.catalog);
        for category in self.suffix_lexicon.invalid_categories(&self.catalog) {
            if !invalid.contains(&category) {
                invalid.push(category);
            }
        }
        invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tags(tagger: &PartOfSpeechTagger, words: &[&str]) -> Vec<String> {
        tagger
            .tag_sentence(words)
            .into_iter()
            .map(|tw| tw.tag)
            .collect()
    }

    #[test]
    fn test_builtin_model_is_clean_and_consistent() {
        let model = PosModel::build().unwrap();
        assert!(model.reports.words.is_clean());
        assert!(model.reports.suffixes.is_clean());
        assert!(model.reports.transitions.is_clean());
        assert!(model.invalid_categories().is_empty());
        assert!(!model.retagger.is_empty());
        assert!(model.names.contains("London"));
    }

    #[test]
    fn test_builtin_model_tags_simple_sentences() {
        let model = PosModel::build().unwrap();
        let tagger = model.tagger(&TaggerConfig::default());
        assert!(tagger.is_consistent());

        assert_eq!(tags(&tagger, &["The", "dog", "runs", "."]), vec!["DT", "NN", "VBZ", "."]);

        let out = tagger.tag_sentence(&["She", "lives", "in", "Paris", "."]);
        assert_eq!(out[1].tag, "VBZ");
        assert_eq!(out[1].lemma, "live");
        assert_eq!(out[3].tag, "NNP");
    }

    #[test]
    fn test_unknown_words_use_the_guesser() {
        let model = PosModel::build().unwrap();
        let tagger = model.tagger(&TaggerConfig::default());
        let out = tagger.tag_sentence(&["The", "Xyzzyville", "council", "."]);
        assert_eq!(out[1].tag, "NNP");
        assert_eq!(out[1].lemma, "Xyzzyville");
        assert_eq!(tagger.dynamic_lexicon_len(), 1);
    }

    #[test]
    fn test_load_falls_back_to_builtin_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(WORDS_FILE), "zorp\t3\tNN\tzorp\t3\nbad line\n").unwrap();

        let model = PosModel::load(dir.path()).unwrap();
        assert_eq!(model.word_lexicon.len(), 1);
        assert_eq!(model.reports.words.short_lines, 1);
        // Demais recursos vieram do binário
        assert!(model.suffix_lexicon.contains_entry("ing"));
        assert!(!model.transitions.is_empty());
        assert_eq!(model.catalog.len(), TagCatalog::builtin().len());
    }

    #[test]
    fn test_load_reports_invalid_rules() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(RULES_FILE), "NN VB WHENEVER TO\n").unwrap();
        let err = PosModel::load(dir.path()).unwrap_err();
        assert!(matches!(err, PosError::InvalidRule { line: 1, .. }));
    }

    #[test]
    fn test_load_missing_directory() {
        let err = PosModel::load("/caminho/que/nao/existe").unwrap_err();
        assert!(matches!(err, PosError::Io { .. }));
    }
}
