//! # Catálogo de Tags Morfossintáticas
//!
//! Define quais tags existem e o que cada uma significa. O núcleo do
//! etiquetador só faz dois tipos de pergunta ao catálogo:
//!
//! 1. "Esta tag é da classe X?" (substantivo, verbo, nome próprio, pontuação...)
//! 2. "Qual é a tag do papel geral Y?" (substantivo singular, número cardinal...)
//!
//! ## Formato
//!
//! Uma tag por linha, campos separados por TAB; `#` no início da linha é comentário:
//!
//! ```text
//! tag   classe       classe_maior  classe_lema  tag_geral  papéis                descrição
//! NN    noun         noun          noun         NN         singular-noun         Noun, singular or mass
//! NNP   proper-noun  noun          noun         NNP        singular-proper-noun  Proper noun, singular
//! ```
//!
//! ## Tags compostas
//!
//! Contrações e possessivos recebem tags com várias partes unidas por `|`
//! (ex: `NN|POS` para "dog's"). As consultas de classe usam a primeira parte.
//!
//! O catálogo padrão (estilo Penn Treebank) está embutido em `data/tags.tsv`.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PosError, Result};

const BUILTIN_CATALOG: &str = include_str!("../data/tags.tsv");

/// Separador das partes de uma tag composta.
pub const COMPOUND_SEPARATOR: char = '|';

/// Papéis gramaticais gerais que o adivinhador e o etiquetador precisam resolver em tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagRole {
    SingularNoun,
    PluralNoun,
    SingularProperNoun,
    PluralProperNoun,
    PossessiveSingularNoun,
    PossessiveSingularProperNoun,
    CardinalNumber,
    OrdinalNumber,
    Symbol,
    Currency,
    SentenceTerminator,
    Comma,
    Colon,
    LeftBracket,
    RightBracket,
    OpenQuote,
    CloseQuote,
}

impl TagRole {
    /// Todos os papéis (para iteração).
    pub const ALL: [TagRole; 17] = [
        TagRole::SingularNoun,
        TagRole::PluralNoun,
        TagRole::SingularProperNoun,
        TagRole::PluralProperNoun,
        TagRole::PossessiveSingularNoun,
        TagRole::PossessiveSingularProperNoun,
        TagRole::CardinalNumber,
        TagRole::OrdinalNumber,
        TagRole::Symbol,
        TagRole::Currency,
        TagRole::SentenceTerminator,
        TagRole::Comma,
        TagRole::Colon,
        TagRole::LeftBracket,
        TagRole::RightBracket,
        TagRole::OpenQuote,
        TagRole::CloseQuote,
    ];

    /// Nome usado no arquivo de catálogo (ex: "singular-noun").
    pub fn name(&self) -> &'static str {
        match self {
            TagRole::SingularNoun => "singular-noun",
            TagRole::PluralNoun => "plural-noun",
            TagRole::SingularProperNoun => "singular-proper-noun",
            TagRole::PluralProperNoun => "plural-proper-noun",
            TagRole::PossessiveSingularNoun => "possessive-singular-noun",
            TagRole::PossessiveSingularProperNoun => "possessive-singular-proper-noun",
            TagRole::CardinalNumber => "cardinal-number",
            TagRole::OrdinalNumber => "ordinal-number",
            TagRole::Symbol => "symbol",
            TagRole::Currency => "currency",
            TagRole::SentenceTerminator => "sentence-terminator",
            TagRole::Comma => "comma",
            TagRole::Colon => "colon",
            TagRole::LeftBracket => "left-bracket",
            TagRole::RightBracket => "right-bracket",
            TagRole::OpenQuote => "open-quote",
            TagRole::CloseQuote => "close-quote",
        }
    }

    /// Tag usada quando o catálogo não declara o papel.
    pub fn default_tag(&self) -> &'static str {
        match self {
            TagRole::SingularNoun => "NN",
            TagRole::PluralNoun => "NNS",
            TagRole::SingularProperNoun => "NNP",
            TagRole::PluralProperNoun => "NNPS",
            TagRole::PossessiveSingularNoun => "NN|POS",
            TagRole::PossessiveSingularProperNoun => "NNP|POS",
            TagRole::CardinalNumber => "CD",
            TagRole::OrdinalNumber => "JJ",
            TagRole::Symbol => "SYM",
            TagRole::Currency => "$",
            TagRole::SentenceTerminator => ".",
            TagRole::Comma => ",",
            TagRole::Colon => ":",
            TagRole::LeftBracket => "-LRB-",
            TagRole::RightBracket => "-RRB-",
            TagRole::OpenQuote => "``",
            TagRole::CloseQuote => "''",
        }
    }

    /// Parseia o nome do arquivo de catálogo (ex: "plural-noun" → Some(PluralNoun)).
    pub fn from_name(name: &str) -> Option<Self> {
        TagRole::ALL.iter().copied().find(|role| role.name() == name)
    }
}

impl fmt::Display for TagRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Descrição de uma tag do catálogo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagInfo {
    pub tag: String,
    /// Classe de palavra (ex: "noun", "proper-noun", "verb").
    pub word_class: String,
    /// Classe maior (ex: "noun" para substantivos comuns e próprios).
    pub major_word_class: String,
    /// Classe usada na lematização.
    pub lemma_word_class: String,
    /// Tag geral equivalente (ex: NNS → NN).
    pub general_tag: String,
    pub roles: Vec<TagRole>,
    pub description: String,
}

/// Catálogo imutável de tags válidas.
#[derive(Debug, Clone, Default)]
pub struct TagCatalog {
    tags: Vec<TagInfo>,
    index: HashMap<String, usize>,
    roles: HashMap<TagRole, usize>,
}

impl TagCatalog {
    /// Catálogo padrão embutido (estilo Penn Treebank).
    pub fn builtin() -> Self {
        // O arquivo embutido é validado pelos testes deste módulo
        Self::parse_str(BUILTIN_CATALOG).unwrap_or_default()
    }

    /// Lê o catálogo a partir do texto. Linhas inválidas são erro de configuração.
    pub fn parse_str(text: &str) -> Result<Self> {
        let mut catalog = TagCatalog::default();

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 7 || fields[0].is_empty() {
                return Err(PosError::InvalidCatalogLine {
                    line: index + 1,
                    content: line.to_string(),
                });
            }

            let roles = parse_roles(fields[5])?;
            catalog.insert(TagInfo {
                tag: fields[0].to_string(),
                word_class: fields[1].to_string(),
                major_word_class: fields[2].to_string(),
                lemma_word_class: fields[3].to_string(),
                general_tag: fields[4].to_string(),
                roles,
                description: fields[6].to_string(),
            });
        }

        Ok(catalog)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| PosError::io(path, e))?;
        Self::parse_str(&text)
    }

    fn insert(&mut self, info: TagInfo) {
        let position = match self.index.get(&info.tag) {
            Some(&existing) => {
                self.tags[existing] = info;
                existing
            }
            None => {
                self.tags.push(info);
                self.tags.len() - 1
            }
        };
        let info = &self.tags[position];
        self.index.insert(info.tag.clone(), position);
        for role in &info.roles {
            // O primeiro a declarar o papel fica com ele
            self.roles.entry(*role).or_insert(position);
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.index.contains_key(tag)
    }

    /// A tag existe, ou todas as suas partes (se composta) existem.
    pub fn contains_all_components(&self, tag: &str) -> bool {
        self.contains(tag) || split_compound(tag).all(|part| self.contains(part))
    }

    pub fn info(&self, tag: &str) -> Option<&TagInfo> {
        self.index.get(tag).map(|&i| &self.tags[i])
    }

    /// Tags na ordem do arquivo.
    pub fn tags(&self) -> impl Iterator<Item = &TagInfo> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Tag correspondente a um papel geral. Total: sem declaração no
    /// catálogo, usa [`TagRole::default_tag`].
    pub fn tag_for(&self, role: TagRole) -> &str {
        self.roles
            .get(&role)
            .map(|&i| self.tags[i].tag.as_str())
            .unwrap_or_else(|| role.default_tag())
    }

    /// Tag geral de uma tag ("NNS" → "NN"); tags desconhecidas retornam elas mesmas.
    pub fn general_tag<'a>(&'a self, tag: &'a str) -> &'a str {
        self.info(tag).map(|i| i.general_tag.as_str()).unwrap_or(tag)
    }

    /// A tag (ou, se composta e ausente do catálogo, sua primeira parte)
    /// pertence à classe ou classe maior `class`.
    pub fn is_tag_of_class(&self, tag: &str, class: &str) -> bool {
        let info = self
            .info(tag)
            .or_else(|| split_compound(tag).next().and_then(|first| self.info(first)));
        info.map(|i| i.word_class == class || i.major_word_class == class)
            .unwrap_or(false)
    }

    /// Substantivo (comum ou próprio).
    pub fn is_noun(&self, tag: &str) -> bool {
        self.is_tag_of_class(tag, "noun")
    }

    pub fn is_proper_noun(&self, tag: &str) -> bool {
        self.is_tag_of_class(tag, "proper-noun")
    }

    pub fn is_verb(&self, tag: &str) -> bool {
        self.is_tag_of_class(tag, "verb")
    }

    pub fn is_adjective(&self, tag: &str) -> bool {
        self.is_tag_of_class(tag, "adjective")
    }

    pub fn is_adverb(&self, tag: &str) -> bool {
        self.is_tag_of_class(tag, "adverb")
    }

    pub fn is_number(&self, tag: &str) -> bool {
        self.is_tag_of_class(tag, "number")
    }

    pub fn is_punctuation(&self, tag: &str) -> bool {
        self.is_tag_of_class(tag, "punctuation")
    }

    pub fn is_compound_tag(&self, tag: &str) -> bool {
        is_compound_tag(tag)
    }
}

/// Tag composta de várias partes (ex: "NN|POS").
pub fn is_compound_tag(tag: &str) -> bool {
    tag.contains(COMPOUND_SEPARATOR)
}

/// Partes de uma tag composta ("NN|POS" → ["NN", "POS"]); tag simples → ela mesma.
pub fn split_compound(tag: &str) -> impl Iterator<Item = &str> {
    tag.split(COMPOUND_SEPARATOR).filter(|part| !part.is_empty())
}

fn parse_roles(field: &str) -> Result<Vec<TagRole>> {
    if field == "-" || field.trim().is_empty() {
        return Ok(Vec::new());
    }
    field
        .split(',')
        .map(str::trim)
        .map(|name| TagRole::from_name(name).ok_or_else(|| PosError::UnknownRole(name.to_string())))
        .collect()
}
