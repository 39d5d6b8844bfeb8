//! # Re-etiquetador por Regras
//!
//! O Viterbi só enxerga uma ou duas tags para trás. Alguns erros recorrentes
//! são mais fáceis de corrigir com regras explícitas aplicadas depois da
//! decodificação, no estilo de Brill:
//!
//! ```text
//! # origem destino condição valor
//! NN       VB      PREVTAG  TO        "to run"   → run/VB
//! VBD      VBN     PREVWORD has       "has walked" → walked/VBN
//! WORD     like    VBP      IN        regra léxica: "like" VBP → IN
//! ```
//!
//! ## Condições
//!
//! | Condição  | Verdadeira quando                         |
//! |-----------|-------------------------------------------|
//! | PREVTAG   | a tag anterior é `valor`                  |
//! | NEXTTAG   | a próxima tag é `valor`                   |
//! | PREV2TAG  | a tag duas posições atrás é `valor`       |
//! | PREVWORD  | a palavra anterior é `valor` (sem caixa)  |
//! | NEXTWORD  | a próxima palavra é `valor` (sem caixa)   |
//!
//! As regras são aplicadas na ordem do arquivo, cada uma da esquerda para a
//! direita, já enxergando as correções das regras anteriores.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PosError, Result};
use crate::tagger::TaggedWord;

const BUILTIN_RULES: &str = include_str!("../data/retag_rules.txt");

/// Pós-processador de uma sentença etiquetada. Pode mudar o tamanho da sentença.
pub trait Retagger: Send + Sync {
    fn retag(&self, sentence: Vec<TaggedWord>) -> Vec<TaggedWord>;
}

/// Condição de disparo de uma regra.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum RuleCondition {
    /// Regra léxica: a própria palavra.
    Word(String),
    PrevTag(String),
    NextTag(String),
    Prev2Tag(String),
    PrevWord(String),
    NextWord(String),
}

impl RuleCondition {
    fn holds(&self, sentence: &[TaggedWord], i: usize) -> bool {
        let at = |offset: isize| -> Option<&TaggedWord> {
            let index = i as isize + offset;
            if index < 0 {
                None
            } else {
                sentence.get(index as usize)
            }
        };
        match self {
            RuleCondition::Word(w) => sentence[i].word.eq_ignore_ascii_case(w),
            RuleCondition::PrevTag(t) => at(-1).is_some_and(|tw| &tw.tag == t),
            RuleCondition::NextTag(t) => at(1).is_some_and(|tw| &tw.tag == t),
            RuleCondition::Prev2Tag(t) => at(-2).is_some_and(|tw| &tw.tag == t),
            RuleCondition::PrevWord(w) => at(-1).is_some_and(|tw| tw.word.eq_ignore_ascii_case(w)),
            RuleCondition::NextWord(w) => at(1).is_some_and(|tw| tw.word.eq_ignore_ascii_case(w)),
        }
    }
}

/// Regra "troque `from` por `to` quando `condition`".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetagRule {
    pub from: String,
    pub to: String,
    pub condition: RuleCondition,
}

impl fmt::Display for RetagRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.condition {
            RuleCondition::Word(w) => write!(f, "WORD {w} {} {}", self.from, self.to),
            RuleCondition::PrevTag(v) => write!(f, "{} {} PREVTAG {v}", self.from, self.to),
            RuleCondition::NextTag(v) => write!(f, "{} {} NEXTTAG {v}", self.from, self.to),
            RuleCondition::Prev2Tag(v) => write!(f, "{} {} PREV2TAG {v}", self.from, self.to),
            RuleCondition::PrevWord(v) => write!(f, "{} {} PREVWORD {v}", self.from, self.to),
            RuleCondition::NextWord(v) => write!(f, "{} {} NEXTWORD {v}", self.from, self.to),
        }
    }
}

/// Uma correção aplicada (para diagnóstico e visualização).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Correction {
    pub token_index: usize,
    pub word: String,
    pub from: String,
    pub to: String,
    pub rule: String,
}

#[derive(Debug, Clone, Default)]
pub struct RuleRetagger {
    rules: Vec<RetagRule>,
}

impl RuleRetagger {
    pub fn new(rules: Vec<RetagRule>) -> Self {
        Self { rules }
    }

    /// Regras embutidas (inglês).
    pub fn builtin() -> Result<Self> {
        Self::parse_str(BUILTIN_RULES)
    }

    /// Uma regra por linha, campos separados por espaço; `#` inicia comentário.
    pub fn parse_str(text: &str) -> Result<Self> {
        let mut rules = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let rule = parse_rule(line).ok_or_else(|| PosError::InvalidRule {
                line: index + 1,
                content: line.to_string(),
            })?;
            rules.push(rule);
        }
        tracing::debug!(rules = rules.len(), "regras de re-etiquetagem carregadas");
        Ok(Self { rules })
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| PosError::io(path, e))?;
        Self::parse_str(&text)
    }

    pub fn rules(&self) -> &[RetagRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Aplica as regras e devolve também a lista de correções.
    pub fn retag_with_corrections(
        &self,
        mut sentence: Vec<TaggedWord>,
    ) -> (Vec<TaggedWord>, Vec<Correction>) {
        let mut corrections = Vec::new();
        for rule in &self.rules {
            for i in 0..sentence.len() {
                if sentence[i].tag != rule.from || !rule.condition.holds(&sentence, i) {
                    continue;
                }
                corrections.push(Correction {
                    token_index: i,
                    word: sentence[i].word.clone(),
                    from: rule.from.clone(),
                    to: rule.to.clone(),
                    rule: rule.to_string(),
                });
                sentence[i].tag = rule.to.clone();
            }
        }
        (sentence, corrections)
    }
}

impl Retagger for RuleRetagger {
    fn retag(&self, sentence: Vec<TaggedWord>) -> Vec<TaggedWord> {
        self.retag_with_corrections(sentence).0
    }
}

fn parse_rule(line: &str) -> Option<RetagRule> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [first, second, third, fourth] = fields.as_slice() else {
        return None;
    };

    if *first == "WORD" {
        return Some(RetagRule {
            from: third.to_string(),
            to: fourth.to_string(),
            condition: RuleCondition::Word(second.to_string()),
        });
    }

    let value = fourth.to_string();
    let condition = match *third {
        "PREVTAG" => RuleCondition::PrevTag(value),
        "NEXTTAG" => RuleCondition::NextTag(value),
        "PREV2TAG" => RuleCondition::Prev2Tag(value),
        "PREVWORD" => RuleCondition::PrevWord(value),
        "NEXTWORD" => RuleCondition::NextWord(value),
        _ => return None,
    };
    Some(RetagRule {
        from: first.to_string(),
        to: second.to_string(),
        condition,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(pairs: &[(&str, &str)]) -> Vec<TaggedWord> {
        pairs
            .iter()
            .map(|(w, t)| TaggedWord::new(*w, *t, *w))
            .collect()
    }

    fn tags(sentence: &[TaggedWord]) -> Vec<&str> {
        sentence.iter().map(|tw| tw.tag.as_str()).collect()
    }

    #[test]
    fn test_contextual_rules() {
        let retagger = RuleRetagger::parse_str(
            "NN VB PREVTAG TO\nVBD VBN PREVWORD has\nIN RB NEXTTAG .\nJJ NN PREV2TAG DT\n",
        )
        .unwrap();
        assert_eq!(retagger.len(), 4);

        let out = retagger.retag(sentence(&[("to", "TO"), ("run", "NN")]));
        assert_eq!(tags(&out), vec!["TO", "VB"]);

        let out = retagger.retag(sentence(&[("HAS", "VBZ"), ("walked", "VBD")]));
        assert_eq!(tags(&out), vec!["VBZ", "VBN"]);

        let out = retagger.retag(sentence(&[("went", "VBD"), ("in", "IN"), (".", ".")]));
        assert_eq!(tags(&out), vec!["VBD", "RB", "."]);

        let out = retagger.retag(sentence(&[("the", "DT"), ("very", "RB"), ("red", "JJ")]));
        assert_eq!(tags(&out), vec!["DT", "RB", "NN"]);
    }

    #[test]
    fn test_lexical_rule() {
        let retagger = RuleRetagger::parse_str("WORD like VBP IN\n").unwrap();
        let out = retagger.retag(sentence(&[("Like", "VBP"), ("like", "VB")]));
        assert_eq!(tags(&out), vec!["IN", "VB"]);
    }

    #[test]
    fn test_rules_see_earlier_corrections() {
        // A segunda regra só dispara porque a primeira trocou NN por VB
        let retagger = RuleRetagger::parse_str("NN VB PREVTAG TO\nNN VBN PREVTAG VB\n").unwrap();
        let (out, corrections) =
            retagger.retag_with_corrections(sentence(&[("to", "TO"), ("x", "NN"), ("y", "NN")]));
        assert_eq!(tags(&out), vec!["TO", "VB", "VBN"]);
        assert_eq!(corrections.len(), 2);
        assert_eq!(corrections[0].rule, "NN VB PREVTAG TO");
    }

    #[test]
    fn test_boundaries_do_not_match() {
        let retagger = RuleRetagger::parse_str("NN VB PREVTAG TO\nNN VB NEXTWORD x\n").unwrap();
        let out = retagger.retag(sentence(&[("run", "NN")]));
        assert_eq!(tags(&out), vec!["NN"]);
    }

    #[test]
    fn test_invalid_rules_are_errors() {
        let err = RuleRetagger::parse_str("# ok\nNN VB SOMETIMES TO\n").unwrap_err();
        assert!(matches!(err, PosError::InvalidRule { line: 2, .. }));
        assert!(RuleRetagger::parse_str("NN VB\n").is_err());
    }

    #[test]
    fn test_builtin_rules_parse() {
        let retagger = RuleRetagger::builtin().unwrap();
        assert!(!retagger.is_empty());
    }
}
