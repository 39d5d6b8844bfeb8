//! # Tokenizador e Segmentador de Sentenças
//!
//! O etiquetador recebe sentenças já tokenizadas; este módulo é a implementação
//! simples usada pelo pipeline e pela interface web. Cada token preserva sua
//! posição original no texto (offset) para permitir destacar as tags na UI.
//!
//! ## Esquema de Tokenização
//!
//! 1. Segmentação de palavras Unicode (UAX #29, crate `unicode-segmentation`):
//!    "can't", "3.14" e "1,000" já saem inteiros.
//! 2. Abreviaturas e iniciais recuperam o ponto: "Dr" + "." → "Dr.", "U.S" + "." → "U.S.".
//! 3. Palavras hifenizadas são religadas: "well" + "-" + "known" → "well-known".
//! 4. Sequências de pontuação viram um token: "-" + "-" → "--", "?" + "!" → "?!".
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use pos_core::abbreviations::Abbreviations;
//! use pos_core::tokenizer::{split_sentences, tokenize};
//!
//! let abbreviations = Abbreviations::builtin();
//! let tokens = tokenize("Dr. Smith lives in a well-known town. He runs.", &abbreviations);
//! let sentences = split_sentences(tokens);
//! assert_eq!(sentences.len(), 2);
//! assert_eq!(sentences[0][0].text, "Dr.");
//! ```

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::abbreviations::{looks_like_initials, Abbreviations};

/// Um token extraído do texto original.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    /// O texto do token (ex: "dog", ",", "Dr.").
    pub text: String,
    /// Índice de byte inicial no texto original (inclusive).
    pub start: usize,
    /// Índice de byte final no texto original (exclusivo).
    pub end: usize,
    /// Índice sequencial do token no texto (0, 1, 2...).
    pub index: usize,
}

fn is_terminator(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| matches!(c, '.' | '!' | '?' | '…'))
}

fn is_closing(text: &str) -> bool {
    matches!(text, "\"" | "'" | "”" | "’" | ")" | "]" | "}" | "''")
}

fn is_word_like(text: &str) -> bool {
    text.chars().any(char::is_alphanumeric)
}

/// Tokeniza um texto.
pub fn tokenize(text: &str, abbreviations: &Abbreviations) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();

    for (start, segment) in text.split_word_bound_indices() {
        if segment.trim().is_empty() {
            continue;
        }
        let end = start + segment.len();

        if let Some(last) = tokens.last_mut() {
            if last.end == start && should_merge(&last.text, segment, abbreviations) {
                last.text.push_str(segment);
                last.end = end;
                continue;
            }
        }
        tokens.push(Token {
            text: segment.to_string(),
            start,
            end,
            index: 0,
        });
    }

    let mut tokens = join_hyphenated(tokens);
    for (i, token) in tokens.iter_mut().enumerate() {
        token.index = i;
    }
    tokens
}

fn should_merge(previous: &str, next: &str, abbreviations: &Abbreviations) -> bool {
    if next == "." && is_word_like(previous) {
        let candidate = format!("{previous}.");
        return abbreviations.contains(&candidate) || looks_like_initials(&candidate);
    }
    let runs = |c: char| matches!(c, '.' | '!' | '?');
    if previous.chars().all(runs) && next.chars().all(runs) {
        return true;
    }
    previous.chars().all(|c| c == '-') && next == "-"
}

/// Religa `palavra - palavra` sem espaços ("mother-in-law").
fn join_hyphenated(tokens: Vec<Token>) -> Vec<Token> {
    let mut joined: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter().peekable();

    while let Some(token) = iter.next() {
        let hyphen_follows = token.text == "-"
            && joined
                .last()
                .is_some_and(|prev| prev.end == token.start && is_word_like(&prev.text))
            && iter
                .peek()
                .is_some_and(|next| next.start == token.end && is_word_like(&next.text));

        if hyphen_follows {
            if let (Some(prev), Some(next)) = (joined.last_mut(), iter.next()) {
                prev.text.push('-');
                prev.text.push_str(&next.text);
                prev.end = next.end;
                continue;
            }
        }
        joined.push(token);
    }
    joined
}

/// Agrupa tokens em sentenças. Uma sentença termina em `.`, `!`, `?` (ou
/// sequências deles), incluindo aspas e parênteses de fechamento logo depois.
///
/// Os tokens mantêm o índice global do texto.
pub fn split_sentences(tokens: Vec<Token>) -> Vec<Vec<Token>> {
    let mut sentences = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    let mut closing = false;

    for token in tokens {
        if closing && !is_closing(&token.text) {
            sentences.push(std::mem::take(&mut current));
            closing = false;
        }
        if is_terminator(&token.text) {
            closing = true;
        }
        current.push(token);
    }
    if !current.is_empty() {
        sentences.push(current);
    }
    sentences
}

/// Textos dos tokens (entrada do etiquetador).
pub fn words(tokens: &[Token]) -> Vec<&str> {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(text: &str) -> Vec<String> {
        tokenize(text, &Abbreviations::builtin())
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_tokenize_basic() {
        assert_eq!(texts("The dog runs."), vec!["The", "dog", "runs", "."]);
    }

    #[test]
    fn test_offsets_point_into_text() {
        let text = "Mr. Brown paid $5, didn't he?";
        for token in tokenize(text, &Abbreviations::builtin()) {
            assert_eq!(&text[token.start..token.end], token.text);
        }
    }

    #[test]
    fn test_abbreviations_keep_their_dot() {
        assert_eq!(
            texts("Dr. Smith met J. Doe in the U.S. today."),
            vec!["Dr.", "Smith", "met", "J.", "Doe", "in", "the", "U.S.", "today", "."]
        );
    }

    #[test]
    fn test_numbers_and_contractions() {
        assert_eq!(
            texts("It costs $3.50, not 1,000 dollars; don't worry"),
            vec!["It", "costs", "$", "3.50", ",", "not", "1,000", "dollars", ";", "don't", "worry"]
        );
    }

    #[test]
    fn test_hyphens_and_punctuation_runs() {
        assert_eq!(
            texts("A well-known mother-in-law -- really?!"),
            vec!["A", "well-known", "mother-in-law", "--", "really", "?!"]
        );
    }

    #[test]
    fn test_split_sentences() {
        let tokens = tokenize(
            "The dog runs. (Why?) he asked. Mr. Smith left",
            &Abbreviations::builtin(),
        );
        let sentences = split_sentences(tokens);
        let lens: Vec<usize> = sentences.iter().map(Vec::len).collect();
        assert_eq!(lens, vec![4, 4, 3, 3]);
        assert_eq!(words(&sentences[1]), vec!["(", "Why", "?", ")"]);
        assert_eq!(sentences[3][0].text, "Mr.");
        // Índices globais preservados
        assert_eq!(sentences[1][0].index, 4);
    }

    #[test]
    fn test_empty_text() {
        assert!(texts("   ").is_empty());
        assert!(split_sentences(Vec::new()).is_empty());
    }
}
