//! # Listas Auxiliares do Adivinhador
//!
//! Colaboradores externos consultados pelo [`PartOfSpeechGuesser`](crate::guesser::PartOfSpeechGuesser)
//! depois das regras ortográficas:
//!
//! | Tipo                         | Pergunta respondida                          |
//! |------------------------------|----------------------------------------------|
//! | [`WordTagSource`]            | "quais tags esta palavra pode ter?"          |
//! | [`SpellingStandardizer`]     | "qual é a grafia padrão desta variante?"     |
//! | [`NameGazetteer`]            | "isto é um nome próprio conhecido?"          |
//!
//! Todos são somente leitura depois de construídos e podem ser compartilhados
//! entre threads.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::casing::{is_capitalized, upper_first};
use crate::error::{PosError, Result};
use crate::lexicon::TagCounts;

/// Fonte de tags para palavras (lista auxiliar registrada no adivinhador).
pub trait WordTagSource: Send + Sync {
    /// Nome da lista, usado em diagnósticos.
    fn name(&self) -> &str;

    /// Tags da palavra (grafia exata), ou `None` se ausente.
    fn lookup(&self, word: &str) -> Option<TagCounts>;
}

/// Lista de palavras com suas tags possíveis: `palavra<TAB>tag[<TAB>tag…]`.
///
/// Cada tag recebe contagem 1 (lista sem frequências).
#[derive(Debug, Clone, Default)]
pub struct TaggedWordList {
    name: String,
    words: HashMap<String, Vec<String>>,
}

impl TaggedWordList {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            words: HashMap::new(),
        }
    }

    /// Linhas sem tag são ignoradas; `#` inicia comentário.
    pub fn parse_str(name: impl Into<String>, text: &str) -> Self {
        let mut list = TaggedWordList::new(name);
        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split('\t');
            let Some(word) = fields.next() else { continue };
            for tag in fields.filter(|t| !t.is_empty()) {
                list.add(word, tag);
            }
        }
        list
    }

    pub fn load_from_path(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| PosError::io(path, e))?;
        Ok(Self::parse_str(name, &text))
    }

    pub fn add(&mut self, word: &str, tag: &str) {
        let tags = self.words.entry(word.to_string()).or_default();
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl WordTagSource for TaggedWordList {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup(&self, word: &str) -> Option<TagCounts> {
        self.words
            .get(word)
            .map(|tags| tags.iter().map(|t| (t.clone(), 1)).collect())
    }
}

/// Converte grafias variantes (arcaicas, britânicas...) para a forma padrão.
pub trait SpellingStandardizer: Send + Sync {
    fn standardize(&self, word: &str) -> Option<String>;
}

/// Padronizador por tabela: `variante<TAB>padrão`.
///
/// A busca ignora caixa; se a palavra original começa com maiúscula, a forma
/// padrão também começa ("Colour" → "Color").
#[derive(Debug, Clone, Default)]
pub struct MapSpellingStandardizer {
    mappings: HashMap<String, String>,
}

impl MapSpellingStandardizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_str(text: &str) -> Self {
        let mut standardizer = MapSpellingStandardizer::new();
        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.starts_with('#') {
                continue;
            }
            if let Some((variant, standard)) = line.split_once('\t') {
                standardizer.add(variant, standard.trim());
            }
        }
        standardizer
    }

    pub fn add(&mut self, variant: &str, standard: &str) {
        if variant.is_empty() || standard.is_empty() {
            return;
        }
        self.mappings
            .insert(variant.to_lowercase(), standard.to_lowercase());
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl SpellingStandardizer for MapSpellingStandardizer {
    fn standardize(&self, word: &str) -> Option<String> {
        let standard = self.mappings.get(&word.to_lowercase())?;
        if is_capitalized(word) {
            Some(upper_first(standard))
        } else {
            Some(standard.clone())
        }
    }
}

/// Gazetteer de nomes próprios (pessoas, lugares, organizações).
#[derive(Debug, Clone, Default)]
pub struct NameGazetteer {
    names: HashSet<String>,
}

impl NameGazetteer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Um nome por linha; `#` inicia comentário.
    pub fn parse_str(text: &str) -> Self {
        let names = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();
        Self { names }
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| PosError::io(path, e))?;
        Ok(Self::parse_str(&text))
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    /// Só palavras com inicial maiúscula podem ser nomes ("may" ≠ "May").
    pub fn contains(&self, word: &str) -> bool {
        is_capitalized(word) && self.names.contains(word)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_word_list_lookup() {
        let list = TaggedWordList::parse_str("funcao", "# comentário\nthat\tDT\tIN\tWDT\nof\tIN\n");
        assert_eq!(list.name(), "funcao");
        assert_eq!(list.len(), 2);

        let tags = list.lookup("that").unwrap();
        assert_eq!(tags.len(), 3);
        assert_eq!(tags.get("IN"), Some(&1));
        assert!(list.lookup("That").is_none());
    }

    #[test]
    fn test_duplicate_tags_collapse() {
        let mut list = TaggedWordList::new("x");
        list.add("run", "VB");
        list.add("run", "VB");
        assert_eq!(list.lookup("run").unwrap().len(), 1);
    }

    #[test]
    fn test_standardizer_restores_capital() {
        let standardizer = MapSpellingStandardizer::parse_str("colour\tcolor\nhath\thas\n");
        assert_eq!(standardizer.standardize("colour").as_deref(), Some("color"));
        assert_eq!(standardizer.standardize("Colour").as_deref(), Some("Color"));
        assert_eq!(standardizer.standardize("HATH").as_deref(), Some("Has"));
        assert!(standardizer.standardize("dog").is_none());
    }

    #[test]
    fn test_gazetteer_requires_capital() {
        let gazetteer = NameGazetteer::parse_str("May\nLondon\n");
        assert!(gazetteer.contains("London"));
        assert!(gazetteer.contains("May"));
        assert!(!gazetteer.contains("may"));
        assert!(!gazetteer.contains("Paris"));
    }
}
