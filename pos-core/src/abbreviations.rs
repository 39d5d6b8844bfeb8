//! # Abreviaturas
//!
//! Tabela imutável de abreviaturas ("Dr.", "etc.", "U.S."). É construída uma
//! vez na inicialização do modelo e passada por referência ao tokenizador e ao
//! adivinhador.

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{PosError, Result};

const BUILTIN_ABBREVIATIONS: &str = include_str!("../data/abbreviations.txt");

/// Iniciais: uma ou mais letras maiúsculas, cada uma seguida de ponto ("A.", "U.S.").
static INITIALS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:\p{Lu}\.)+$").unwrap());

#[derive(Debug, Clone, Default)]
pub struct Abbreviations {
    exact: HashSet<String>,
    lowercase: HashSet<String>,
}

impl Abbreviations {
    /// Lista padrão embutida (inglês).
    pub fn builtin() -> Self {
        Self::parse_str(BUILTIN_ABBREVIATIONS)
    }

    /// Uma abreviatura por linha; `#` inicia comentário.
    pub fn parse_str(text: &str) -> Self {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect()
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| PosError::io(path, e))?;
        Ok(Self::parse_str(&text))
    }

    pub fn insert(&mut self, abbreviation: &str) {
        self.lowercase.insert(abbreviation.to_lowercase());
        self.exact.insert(abbreviation.to_string());
    }

    /// Grafia exata, depois em minúsculas ("MR." casa com "Mr.").
    pub fn contains(&self, word: &str) -> bool {
        self.exact.contains(word) || self.lowercase.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for Abbreviations {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut abbreviations = Abbreviations::default();
        for abbreviation in iter {
            abbreviations.insert(abbreviation);
        }
        abbreviations
    }
}

/// Forma de iniciais ("J.", "U.S.").
pub fn looks_like_initials(word: &str) -> bool {
    INITIALS.is_match(word)
}
