//! # Adivinhador de Classes Gramaticais
//!
//! Palavras fora do léxico ("Xyzzyville", "re-tagged", "1990s") ainda precisam
//! de tags candidatas, senão o Viterbi não tem o que pontuar. O adivinhador
//! produz um mapa tag → pseudo-contagem **nunca vazio** para qualquer string.
//!
//! ## Cadeia de Regras
//!
//! As regras são testadas em ordem fixa; a primeira que responde vence. A
//! ordem importa (trocar duas regras muda a saída):
//!
//! | #  | Regra                 | Exemplo              | Resultado            |
//! |----|-----------------------|----------------------|----------------------|
//! | 1  | cache                 | (já visto)           | resultado anterior   |
//! | 2  | léxico de palavras    | "NASA" → "Nasa"      | contagens do léxico  |
//! | 3  | pontuação             | "," "--" "``"        | `,` `:` `` ` ``      |
//! | 4  | símbolo               | "&" "%" "+"          | SYM                  |
//! | 5  | número / ordinal      | "3.5" "1990s" "21st" | CD / JJ              |
//! | 6  | moeda                 | "$" "US$" "$5"       | `$` / CD             |
//! | 7  | abreviatura           | "Dr." "etc."         | NNP / NN             |
//! | 8  | numeral romano        | "XIV" "V"            | CD (+NNP se 1 letra) |
//! | 9  | hífen                 | "L---'s" "well-old"  | padrões / última parte |
//! | 10 | grafia padronizada    | "colour" → "color"   | contagens do léxico  |
//! | 11 | gazetteer de nomes    | "London"             | NNP                  |
//! | 12 | possessivo            | "Xyz's"              | NNP\|POS / NN\|POS   |
//! | 13 | listas auxiliares     | (registradas)        | tags da lista        |
//! | 14 | sufixos               | "walking" → "ing"    | contagens do sufixo  |
//! | 15 | tudo maiúsculo        | "XQZ"                | NNP                  |
//! | 16 | padrão                | "Xyzzyville"         | NN/NNS/NNP/NNPS      |
//!
//! Toda resposta vai para um cache LRU antes de ser devolvida. Apenas a regra
//! de sufixos registra o léxico de origem ([`LexiconKind::Suffix`]), consultado
//! depois pelo etiquetador para normalizar as probabilidades léxicas.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::abbreviations::{looks_like_initials, Abbreviations};
use crate::cache::LruCache;
use crate::casing::{capitalize, ends_with_s, has_capital, is_all_caps, is_capitalized};
use crate::lexicon::{Lexicon, TagCounts};
use crate::lists::{NameGazetteer, SpellingStandardizer, WordTagSource};
use crate::tags::{is_compound_tag, TagCatalog, TagRole};

/// Capacidade padrão do cache de palavras.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

static CARDINAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d{1,3}(?:,\d{3})+|\d*\.?\d+)(?:[/:.-]\d+)*%?$").unwrap()
});
static DECADE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^'?\d+'?s$").unwrap());
static ORDINAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\d+(?:st|nd|rd|th)$").unwrap());
static CURRENCY_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Z]{0,3}[$£€¥¢]\d[\d,]*(?:\.\d+)?|\d[\d,]*(?:\.\d+)?[$£€¥¢])$").unwrap()
});
static CURRENCY_SIGN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{0,3}[$£€¥¢]$").unwrap());
static ROMAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^M{0,4}(?:CM|CD|D?C{0,3})(?:XC|XL|L?X{0,3})(?:IX|IV|V?I{0,3})$").unwrap()
});
static UPPER_DASHES_POSSESSIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\p{Lu}-{2,}['’]s$").unwrap());
static LOWER_DASHES_POSSESSIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\p{Ll}-{2,}['’]s$").unwrap());
static DASHES_POSSESSIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-{2,}['’]s$").unwrap());
static UPPER_DASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\p{Lu}-{2,}$").unwrap());
static LOWER_DASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\p{Ll}-{2,}$").unwrap());

/// Léxico que originou um palpite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LexiconKind {
    Word,
    Suffix,
}

/// Entrada do cache: tags e, quando conhecido, o léxico de origem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedGuess {
    pub tags: TagCounts,
    pub source: Option<LexiconKind>,
}

/// Recursos disponíveis para as regras durante um palpite.
pub struct GuessContext<'a> {
    pub word_lexicon: &'a Lexicon,
    pub suffix_lexicon: &'a Lexicon,
    pub catalog: &'a TagCatalog,
    pub abbreviations: &'a Abbreviations,
    pub standardizer: Option<&'a dyn SpellingStandardizer>,
    pub names: Option<&'a NameGazetteer>,
    pub word_lists: &'a [Arc<dyn WordTagSource>],
    pub min_suffix_length: usize,
    pub max_suffix_length: usize,
}

impl GuessContext<'_> {
    fn single(&self, role: TagRole) -> TagCounts {
        single_tag(self.catalog.tag_for(role))
    }
}

/// Uma regra da cadeia: responde com um mapa de tags ou recusa (`None`).
pub trait GuessRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn try_guess(&self, word: &str, ctx: &GuessContext<'_>) -> Option<TagCounts>;

    /// Léxico de origem registrado no cache quando esta regra responde.
    fn source(&self) -> Option<LexiconKind> {
        None
    }
}

fn single_tag(tag: &str) -> TagCounts {
    let mut tags = TagCounts::new();
    tags.insert(tag.to_string(), 1);
    tags
}

fn is_currency_char(c: char) -> bool {
    matches!(c, '$' | '£' | '€' | '¥' | '¢')
}

fn is_punctuation_char(c: char) -> bool {
    matches!(
        c,
        '.' | ','
            | ';'
            | ':'
            | '!'
            | '?'
            | '-'
            | '('
            | ')'
            | '['
            | ']'
            | '{'
            | '}'
            | '"'
            | '\''
            | '`'
            | '…'
            | '–'
            | '—'
            | '“'
            | '”'
            | '‘'
            | '’'
            | '«'
            | '»'
            | '¡'
            | '¿'
    )
}

fn is_symbol_char(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace() && !is_punctuation_char(c) && !is_currency_char(c)
}

/// Papel de uma sequência de pontuação.
fn punctuation_role(word: &str) -> TagRole {
    match word {
        "," => TagRole::Comma,
        "(" | "[" | "{" | "-LRB-" => TagRole::LeftBracket,
        ")" | "]" | "}" | "-RRB-" => TagRole::RightBracket,
        "``" | "\"" | "“" | "‘" | "«" => TagRole::OpenQuote,
        "''" | "'" | "”" | "’" | "»" => TagRole::CloseQuote,
        _ if word.chars().all(|c| matches!(c, '.' | '!' | '?' | '…')) => {
            TagRole::SentenceTerminator
        }
        _ => TagRole::Colon,
    }
}

/// 2. Grafia exata ou, se toda maiúscula, só com a inicial maiúscula.
pub struct WordLexiconRule;

impl GuessRule for WordLexiconRule {
    fn name(&self) -> &'static str {
        "word-lexicon"
    }

    fn try_guess(&self, word: &str, ctx: &GuessContext<'_>) -> Option<TagCounts> {
        if let Some(entry) = ctx.word_lexicon.exact_entry(word) {
            return Some(entry.tag_counts());
        }
        if is_all_caps(word) {
            return ctx
                .word_lexicon
                .exact_entry(&capitalize(word))
                .map(|entry| entry.tag_counts());
        }
        None
    }
}

/// 3. Pontuação.
pub struct PunctuationRule;

impl GuessRule for PunctuationRule {
    fn name(&self) -> &'static str {
        "punctuation"
    }

    fn try_guess(&self, word: &str, ctx: &GuessContext<'_>) -> Option<TagCounts> {
        if word.is_empty() || !word.chars().all(is_punctuation_char) {
            return None;
        }
        Some(ctx.single(punctuation_role(word)))
    }
}

/// 4. Símbolos (sem moeda, que tem regra própria).
pub struct SymbolRule;

impl GuessRule for SymbolRule {
    fn name(&self) -> &'static str {
        "symbol"
    }

    fn try_guess(&self, word: &str, ctx: &GuessContext<'_>) -> Option<TagCounts> {
        if word.is_empty() || !word.chars().all(is_symbol_char) {
            return None;
        }
        Some(ctx.single(TagRole::Symbol))
    }
}

/// 5. Cardinais ("42", "3.5", "1,000", "1990s", "12/31") e ordinais ("21st").
pub struct NumberRule;

impl GuessRule for NumberRule {
    fn name(&self) -> &'static str {
        "number"
    }

    fn try_guess(&self, word: &str, ctx: &GuessContext<'_>) -> Option<TagCounts> {
        if ORDINAL.is_match(word) {
            return Some(ctx.single(TagRole::OrdinalNumber));
        }
        if CARDINAL.is_match(word) || DECADE.is_match(word) {
            return Some(ctx.single(TagRole::CardinalNumber));
        }
        None
    }
}

/// 6. Sinal de moeda ("$", "US$") ou quantia ("$5", "20€").
pub struct CurrencyRule;

impl GuessRule for CurrencyRule {
    fn name(&self) -> &'static str {
        "currency"
    }

    fn try_guess(&self, word: &str, ctx: &GuessContext<'_>) -> Option<TagCounts> {
        if CURRENCY_SIGN.is_match(word) {
            return Some(ctx.single(TagRole::Currency));
        }
        if CURRENCY_AMOUNT.is_match(word) {
            return Some(ctx.single(TagRole::CardinalNumber));
        }
        None
    }
}

/// 7. Abreviaturas e iniciais.
pub struct AbbreviationRule;

impl GuessRule for AbbreviationRule {
    fn name(&self) -> &'static str {
        "abbreviation"
    }

    fn try_guess(&self, word: &str, ctx: &GuessContext<'_>) -> Option<TagCounts> {
        if !ctx.abbreviations.contains(word) && !looks_like_initials(word) {
            return None;
        }
        let role = if is_capitalized(word) {
            TagRole::SingularProperNoun
        } else {
            TagRole::SingularNoun
        };
        Some(ctx.single(role))
    }
}

/// 8. Numerais romanos maiúsculos. Uma letra só ("V") também pode ser inicial.
pub struct RomanNumeralRule;

impl GuessRule for RomanNumeralRule {
    fn name(&self) -> &'static str {
        "roman-numeral"
    }

    fn try_guess(&self, word: &str, ctx: &GuessContext<'_>) -> Option<TagCounts> {
        if word.is_empty() || !ROMAN.is_match(word) {
            return None;
        }
        let mut tags = ctx.single(TagRole::CardinalNumber);
        if word.chars().count() == 1 {
            tags.insert(ctx.catalog.tag_for(TagRole::SingularProperNoun).to_string(), 1);
        }
        Some(tags)
    }
}

/// 9. Palavras hifenizadas.
///
/// Nomes censurados ("L---", "d---'s") têm padrões próprios; nos demais
/// casos vale a classe da parte depois do último hífen ("well-known" → "known").
pub struct HyphenRule;

impl GuessRule for HyphenRule {
    fn name(&self) -> &'static str {
        "hyphenated"
    }

    fn try_guess(&self, word: &str, ctx: &GuessContext<'_>) -> Option<TagCounts> {
        if !word.contains('-') {
            return None;
        }
        let role = if UPPER_DASHES_POSSESSIVE.is_match(word) {
            Some(TagRole::PossessiveSingularProperNoun)
        } else if LOWER_DASHES_POSSESSIVE.is_match(word) {
            Some(TagRole::PossessiveSingularNoun)
        } else if DASHES_POSSESSIVE.is_match(word) {
            Some(TagRole::PossessiveSingularProperNoun)
        } else if UPPER_DASHES.is_match(word) {
            Some(TagRole::SingularProperNoun)
        } else if LOWER_DASHES.is_match(word) {
            Some(TagRole::SingularNoun)
        } else {
            None
        };
        if let Some(role) = role {
            return Some(ctx.single(role));
        }

        let last = word.rsplit('-').next().filter(|part| !part.is_empty())?;
        ctx.word_lexicon.category_counts(last)
    }
}

/// 10. Grafia padronizada ("colour" → "color") consultada no léxico.
pub struct StandardSpellingRule;

impl GuessRule for StandardSpellingRule {
    fn name(&self) -> &'static str {
        "standard-spelling"
    }

    fn try_guess(&self, word: &str, ctx: &GuessContext<'_>) -> Option<TagCounts> {
        let standard = ctx.standardizer?.standardize(word)?;
        if standard == word {
            return None;
        }
        ctx.word_lexicon.category_counts(&standard)
    }
}

/// 11. Nomes próprios conhecidos.
pub struct NameGazetteerRule;

impl GuessRule for NameGazetteerRule {
    fn name(&self) -> &'static str {
        "name-gazetteer"
    }

    fn try_guess(&self, word: &str, ctx: &GuessContext<'_>) -> Option<TagCounts> {
        if ctx.names?.contains(word) {
            Some(ctx.single(TagRole::SingularProperNoun))
        } else {
            None
        }
    }
}

/// 12. Possessivo ("Xyz's", "dog’s").
pub struct PossessiveRule;

impl GuessRule for PossessiveRule {
    fn name(&self) -> &'static str {
        "possessive"
    }

    fn try_guess(&self, word: &str, ctx: &GuessContext<'_>) -> Option<TagCounts> {
        let stem = word
            .strip_suffix("'s")
            .or_else(|| word.strip_suffix("’s"))
            .filter(|stem| stem.chars().any(char::is_alphanumeric))?;
        let role = if is_capitalized(stem) {
            TagRole::PossessiveSingularProperNoun
        } else {
            TagRole::PossessiveSingularNoun
        };
        Some(ctx.single(role))
    }
}

/// 13. Listas auxiliares, na ordem de registro (exata, depois minúsculas).
pub struct WordListRule;

impl GuessRule for WordListRule {
    fn name(&self) -> &'static str {
        "word-lists"
    }

    fn try_guess(&self, word: &str, ctx: &GuessContext<'_>) -> Option<TagCounts> {
        let lower = word.to_lowercase();
        ctx.word_lists.iter().find_map(|list| {
            list.lookup(word)
                .or_else(|| list.lookup(&lower))
                .filter(|tags| !tags.is_empty())
        })
    }
}

/// 14. Análise de sufixos, do mais longo ao mais curto.
///
/// Tags de nome próprio só valem se a palavra tiver alguma maiúscula; tags
/// compostas só valem se a palavra tiver apóstrofo. Se o filtro esvaziar o
/// mapa, tenta o próximo sufixo.
pub struct SuffixRule;

impl GuessRule for SuffixRule {
    fn name(&self) -> &'static str {
        "suffix"
    }

    fn try_guess(&self, word: &str, ctx: &GuessContext<'_>) -> Option<TagCounts> {
        let lower: Vec<char> = word.to_lowercase().chars().collect();
        let keep_proper = has_capital(word);
        let keep_compound = word.contains('\'') || word.contains('’');
        let longest = ctx.max_suffix_length.min(lower.len());
        let shortest = ctx.min_suffix_length.max(1);
        if longest < shortest {
            return None;
        }

        for length in (shortest..=longest).rev() {
            let suffix: String = lower[lower.len() - length..].iter().collect();
            let Some(entry) = ctx.suffix_lexicon.exact_entry(&suffix) else {
                continue;
            };
            let tags: TagCounts = entry
                .tag_counts()
                .into_iter()
                .filter(|(tag, _)| keep_proper || !ctx.catalog.is_proper_noun(tag))
                .filter(|(tag, _)| keep_compound || !is_compound_tag(tag))
                .collect();
            if !tags.is_empty() {
                tracing::trace!(word, suffix = %suffix, "sufixo encontrado");
                return Some(tags);
            }
        }
        None
    }

    fn source(&self) -> Option<LexiconKind> {
        Some(LexiconKind::Suffix)
    }
}

/// 15. Palavra toda maiúscula: nome próprio singular.
pub struct AllCapsRule;

impl GuessRule for AllCapsRule {
    fn name(&self) -> &'static str {
        "all-caps"
    }

    fn try_guess(&self, word: &str, ctx: &GuessContext<'_>) -> Option<TagCounts> {
        if is_all_caps(word) {
            Some(ctx.single(TagRole::SingularProperNoun))
        } else {
            None
        }
    }
}

/// 16. Último recurso: substantivo comum/próprio, singular/plural. Nunca recusa.
pub struct DefaultNounRule;

impl GuessRule for DefaultNounRule {
    fn name(&self) -> &'static str {
        "default-noun"
    }

    fn try_guess(&self, word: &str, ctx: &GuessContext<'_>) -> Option<TagCounts> {
        Some(ctx.single(default_noun_role(word)))
    }
}

fn default_noun_role(word: &str) -> TagRole {
    match (is_capitalized(word), ends_with_s(word)) {
        (true, true) => TagRole::PluralProperNoun,
        (true, false) => TagRole::SingularProperNoun,
        (false, true) => TagRole::PluralNoun,
        (false, false) => TagRole::SingularNoun,
    }
}

/// Cadeia padrão, na ordem em que as regras devem ser aplicadas.
pub fn default_rules() -> Vec<Box<dyn GuessRule>> {
    vec![
        Box::new(WordLexiconRule),
        Box::new(PunctuationRule),
        Box::new(SymbolRule),
        Box::new(NumberRule),
        Box::new(CurrencyRule),
        Box::new(AbbreviationRule),
        Box::new(RomanNumeralRule),
        Box::new(HyphenRule),
        Box::new(StandardSpellingRule),
        Box::new(NameGazetteerRule),
        Box::new(PossessiveRule),
        Box::new(WordListRule),
        Box::new(SuffixRule),
        Box::new(AllCapsRule),
        Box::new(DefaultNounRule),
    ]
}

/// Adivinhador com cache. Compartilhável entre threads (`Send + Sync`).
pub struct PartOfSpeechGuesser {
    word_lexicon: Arc<Lexicon>,
    suffix_lexicon: Arc<Lexicon>,
    catalog: Arc<TagCatalog>,
    abbreviations: Arc<Abbreviations>,
    standardizer: Option<Arc<dyn SpellingStandardizer>>,
    names: Option<Arc<NameGazetteer>>,
    word_lists: Vec<Arc<dyn WordTagSource>>,
    rules: Vec<Box<dyn GuessRule>>,
    cache: Mutex<LruCache<CachedGuess>>,
    min_suffix_length: usize,
    max_suffix_length: usize,
}

impl PartOfSpeechGuesser {
    pub fn new(
        word_lexicon: Arc<Lexicon>,
        suffix_lexicon: Arc<Lexicon>,
        catalog: Arc<TagCatalog>,
        abbreviations: Arc<Abbreviations>,
    ) -> Self {
        let max_suffix_length = suffix_lexicon.longest_entry_length();
        Self {
            word_lexicon,
            suffix_lexicon,
            catalog,
            abbreviations,
            standardizer: None,
            names: None,
            word_lists: Vec::new(),
            rules: default_rules(),
            cache: Mutex::new(LruCache::new(DEFAULT_CACHE_CAPACITY)),
            min_suffix_length: 1,
            max_suffix_length,
        }
    }

    /// Troca a capacidade do cache (esvaziando-o).
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = Mutex::new(LruCache::new(capacity));
        self
    }

    /// Limites de tamanho dos sufixos testados. `max = None` usa a maior
    /// entrada do léxico de sufixos.
    pub fn with_suffix_lengths(mut self, min: usize, max: Option<usize>) -> Self {
        self.min_suffix_length = min.max(1);
        let longest = self.suffix_lexicon.longest_entry_length();
        self.max_suffix_length = max.unwrap_or(longest);
        self
    }

    pub fn with_word_list(mut self, list: Arc<dyn WordTagSource>) -> Self {
        self.word_lists.push(list);
        self
    }

    pub fn with_standardizer(mut self, standardizer: Arc<dyn SpellingStandardizer>) -> Self {
        self.standardizer = Some(standardizer);
        self
    }

    pub fn with_name_gazetteer(mut self, names: Arc<NameGazetteer>) -> Self {
        self.names = Some(names);
        self
    }

    /// Tags candidatas da palavra. Nunca vazio.
    pub fn guess_parts_of_speech(&self, word: &str) -> TagCounts {
        self.guess(word).tags
    }

    /// Tags candidatas e léxico de origem.
    pub fn guess(&self, word: &str) -> CachedGuess {
        if let Some(hit) = self.cached(word) {
            return hit;
        }

        let ctx = self.context();
        for rule in &self.rules {
            let Some(tags) = rule.try_guess(word, &ctx) else {
                continue;
            };
            if tags.is_empty() {
                continue;
            }
            tracing::debug!(word, rule = rule.name(), ?tags, "palpite");
            let guess = CachedGuess {
                tags,
                source: rule.source(),
            };
            self.cache.lock().insert(word, guess.clone());
            return guess;
        }

        // Só alcançável com uma cadeia sem a regra padrão
        let guess = CachedGuess {
            tags: ctx.single(default_noun_role(word)),
            source: None,
        };
        self.cache.lock().insert(word, guess.clone());
        guess
    }

    /// Léxico que respondeu pela palavra, se registrado (só a regra de sufixos registra).
    pub fn lexicon_for_word(&self, word: &str) -> Option<LexiconKind> {
        let cache = self.cache.lock();
        cache
            .peek(word)
            .or_else(|| cache.peek(&word.to_lowercase()))
            .and_then(|guess| guess.source)
    }

    /// Nomes das regras na ordem em que são aplicadas (o cache vem antes de todas).
    pub fn rule_names(&self) -> Vec<&'static str> {
        std::iter::once("cache")
            .chain(self.rules.iter().map(|rule| rule.name()))
            .collect()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    pub fn word_lexicon(&self) -> &Lexicon {
        &self.word_lexicon
    }

    pub fn suffix_lexicon(&self) -> &Lexicon {
        &self.suffix_lexicon
    }

    pub fn catalog(&self) -> &TagCatalog {
        &self.catalog
    }

    fn cached(&self, word: &str) -> Option<CachedGuess> {
        let mut cache = self.cache.lock();
        if let Some(hit) = cache.get(word) {
            return Some(hit);
        }
        let lower = word.to_lowercase();
        if lower != word {
            return cache.get(&lower);
        }
        None
    }

    fn context(&self) -> GuessContext<'_> {
        GuessContext {
            word_lexicon: &self.word_lexicon,
            suffix_lexicon: &self.suffix_lexicon,
            catalog: &self.catalog,
            abbreviations: &self.abbreviations,
            standardizer: self.standardizer.as_deref(),
            names: self.names.as_deref(),
            word_lists: &self.word_lists,
            min_suffix_length: self.min_suffix_length,
            max_suffix_length: self.max_suffix_length,
        }
    }
}

impl fmt::Debug for PartOfSpeechGuesser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartOfSpeechGuesser")
            .field("rules", &self.rule_names())
            .field("word_lists", &self.word_lists.len())
            .field("cache_len", &self.cache_len())
            .field("min_suffix_length", &self.min_suffix_length)
            .field("max_suffix_length", &self.max_suffix_length)
            .finish()
    }
}
