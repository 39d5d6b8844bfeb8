//! # Léxico de Frequências
//!
//! O léxico é a principal fonte de conhecimento do etiquetador: para cada grafia
//! guarda quantas vezes ela apareceu com cada categoria (tag) no corpus de
//! treinamento, além do lema associado a cada categoria.
//!
//! O mesmo tipo serve para dois papéis:
//! - **Léxico de palavras**: chave = palavra completa ("run", "dogs").
//! - **Léxico de sufixos**: chave = terminação da palavra ("ing", "ness"),
//!   usado pelo adivinhador para palavras desconhecidas.
//!
//! ## Formato do Arquivo
//!
//! Uma entrada por linha, campos separados por TAB:
//!
//! ```text
//! grafia  total  categoria1  lema1  contagem1  categoria2  lema2  contagem2 ...
//! run     10     VB          *      6          NN          *      4
//! ```
//!
//! O campo `total` é redundante (é a soma das contagens) e é recalculado na carga.
//! [`Lexicon::save_to_writer`] produz exatamente o formato que
//! [`Lexicon::load_from_reader`] consome.
//!
//! ## Invariantes
//!
//! - `entry_count` de cada entrada = soma das contagens das suas categorias.
//! - Contagem agregada por categoria = soma das contagens dessa categoria em todas as entradas.
//! - Nenhuma contagem fica em zero: categorias vazias são removidas, e entradas
//!   sem categorias saem do léxico.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::casing::{capitalize, is_all_caps};
use crate::error::{LoadReport, PosError, Result};
use crate::tags::TagCatalog;

/// Mapa tag → contagem, em ordem determinística.
///
/// É a "moeda" trocada entre léxicos, adivinhador, listas auxiliares e o etiquetador.
pub type TagCounts = BTreeMap<String, u64>;

/// Contagem e lema de uma categoria dentro de uma entrada.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub lemma: String,
    pub count: u64,
}

/// Uma grafia do léxico com suas categorias, contagens e lemas.
///
/// As categorias ficam na ordem em que foram inseridas. Essa ordem decide
/// empates em [`LexiconEntry::largest_category`]: vence quem atingiu o máximo primeiro.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconEntry {
    spelling: String,
    entry_count: u64,
    categories: Vec<CategoryCount>,
    largest_category: String,
}

impl LexiconEntry {
    pub fn new(spelling: impl Into<String>) -> Self {
        Self {
            spelling: spelling.into(),
            entry_count: 0,
            categories: Vec::new(),
            largest_category: String::new(),
        }
    }

    pub fn spelling(&self) -> &str {
        &self.spelling
    }

    /// Soma das contagens de todas as categorias.
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Contagem de uma categoria (0 se ausente).
    pub fn category_count(&self, category: &str) -> u64 {
        self.find(category).map(|c| c.count).unwrap_or(0)
    }

    /// Lema de uma categoria ("" se ausente).
    pub fn lemma(&self, category: &str) -> &str {
        self.find(category).map(|c| c.lemma.as_str()).unwrap_or("")
    }

    /// Categoria com a maior contagem ("" se a entrada estiver vazia).
    pub fn largest_category(&self) -> &str {
        &self.largest_category
    }

    /// Lema da categoria mais frequente.
    pub fn largest_lemma(&self) -> &str {
        self.lemma(&self.largest_category)
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.find(category).is_some()
    }

    /// Categorias na ordem de inserção.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.category.as_str())
    }

    /// Categorias com contagem e lema, na ordem de inserção.
    pub fn category_data(&self) -> &[CategoryCount] {
        &self.categories
    }

    pub fn number_of_categories(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Cópia das contagens como [`TagCounts`].
    pub fn tag_counts(&self) -> TagCounts {
        self.categories
            .iter()
            .map(|c| (c.category.clone(), c.count))
            .collect()
    }

    fn find(&self, category: &str) -> Option<&CategoryCount> {
        self.categories.iter().find(|c| c.category == category)
    }

    /// Soma `count` à categoria. Retorna `true` se a categoria é nova na entrada.
    fn add_count(&mut self, category: &str, lemma: &str, count: u64) -> bool {
        let is_new = match self.categories.iter_mut().find(|c| c.category == category) {
            Some(existing) => {
                existing.count += count;
                existing.lemma = lemma.to_string();
                false
            }
            None => {
                self.categories.push(CategoryCount {
                    category: category.to_string(),
                    lemma: lemma.to_string(),
                    count,
                });
                true
            }
        };
        self.entry_count += count;

        // Só troca de categoria dominante com contagem estritamente maior
        if self.largest_category.is_empty()
            || self.category_count(category) > self.category_count(&self.largest_category)
        {
            self.largest_category = category.to_string();
        }
        is_new
    }

    /// Remove a categoria e devolve a contagem que ela tinha.
    fn remove_category(&mut self, category: &str) -> Option<u64> {
        let position = self.categories.iter().position(|c| c.category == category)?;
        let removed = self.categories.remove(position);
        self.entry_count -= removed.count;
        if self.largest_category == category {
            self.recompute_largest();
        }
        Some(removed.count)
    }

    fn recompute_largest(&mut self) {
        let mut best: Option<&CategoryCount> = None;
        for candidate in &self.categories {
            if best.map_or(true, |b| candidate.count > b.count) {
                best = Some(candidate);
            }
        }
        self.largest_category = best.map(|c| c.category.clone()).unwrap_or_default();
    }
}

/// Tabela de frequências grafia → categorias, com estatísticas agregadas.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    entries: HashMap<String, LexiconEntry>,
    /// Soma das contagens de cada categoria em todas as entradas.
    category_counts: HashMap<String, u64>,
    /// Quantas entradas distintas possuem cada categoria.
    category_entry_counts: HashMap<String, u64>,
    longest_entry_length: usize,
    shortest_entry_length: usize,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrói um léxico a partir do texto de um arquivo de léxico.
    pub fn parse_str(text: &str) -> (Self, LoadReport) {
        let mut lexicon = Lexicon::new();
        let mut report = LoadReport::default();
        for (index, line) in text.lines().enumerate() {
            lexicon.load_line(index, line, &mut report);
        }
        lexicon.finish_load(&report);
        (lexicon, report)
    }

    /// Carrega entradas de um leitor, somando-as às já existentes.
    ///
    /// Linhas com menos de 4 campos são ignoradas; na primeira tripla
    /// malformada de uma linha o restante da linha é descartado. Ambos os
    /// casos ficam registrados no [`LoadReport`] retornado. Erros de I/O
    /// são propagados.
    pub fn load_from_reader<R: BufRead>(&mut self, reader: R) -> Result<LoadReport> {
        let mut report = LoadReport::default();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            self.load_line(index, &line, &mut report);
        }
        self.finish_load(&report);
        Ok(report)
    }

    /// Carrega um arquivo de léxico UTF-8.
    pub fn load_from_path(&mut self, path: impl AsRef<Path>) -> Result<LoadReport> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| PosError::io(path, e))?;
        self.load_from_reader(BufReader::new(file))
            .map_err(|e| match e {
                PosError::Stream(source) => PosError::io(path, source),
                other => other,
            })
    }

    fn load_line(&mut self, index: usize, line: &str, report: &mut LoadReport) {
        report.lines_read += 1;
        let line_number = index + 1;
        let line = if index == 0 {
            line.trim_start_matches('\u{feff}')
        } else {
            line
        };
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            return;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 4 {
            report.short_lines += 1;
            return;
        }

        let spelling = fields[0];
        for triple in fields[2..].chunks(3) {
            let count = match triple {
                [_, _, count] => count.trim().parse::<u64>().ok(),
                _ => None,
            };
            match count {
                Some(count) => self.update_entry_count(spelling, triple[0], triple[1], count),
                None => {
                    report.record_malformed(line_number, "lexicon", line);
                    break;
                }
            }
        }
    }

    fn finish_load(&mut self, report: &LoadReport) {
        self.recompute_statistics();
        tracing::info!(
            entries = self.entries.len(),
            categories = self.category_counts.len(),
            skipped = report.skipped_lines(),
            "léxico carregado"
        );
    }

    /// Recalcula contagens por categoria e comprimentos mínimo/máximo a partir das entradas.
    pub fn recompute_statistics(&mut self) {
        self.category_counts.clear();
        self.category_entry_counts.clear();
        self.longest_entry_length = 0;
        self.shortest_entry_length = 0;

        for (index, entry) in self.entries.values().enumerate() {
            for data in &entry.categories {
                *self.category_counts.entry(data.category.clone()).or_insert(0) += data.count;
                *self
                    .category_entry_counts
                    .entry(data.category.clone())
                    .or_insert(0) += 1;
            }
            let length = entry.spelling.chars().count();
            if index == 0 {
                self.longest_entry_length = length;
                self.shortest_entry_length = length;
            } else {
                self.longest_entry_length = self.longest_entry_length.max(length);
                self.shortest_entry_length = self.shortest_entry_length.min(length);
            }
        }
    }

    /// Soma `count` ocorrências de `spelling` com `category`, registrando o lema.
    ///
    /// `count == 0` não altera nada. Remoção é feita exclusivamente por
    /// [`Lexicon::remove_entry_category`].
    pub fn update_entry_count(&mut self, spelling: &str, category: &str, lemma: &str, count: u64) {
        if count == 0 {
            return;
        }

        let is_new_entry = !self.entries.contains_key(spelling);
        let entry = self
            .entries
            .entry(spelling.to_string())
            .or_insert_with(|| LexiconEntry::new(spelling));
        let is_new_category = entry.add_count(category, lemma, count);

        *self.category_counts.entry(category.to_string()).or_insert(0) += count;
        if is_new_category {
            *self
                .category_entry_counts
                .entry(category.to_string())
                .or_insert(0) += 1;
        }
        if is_new_entry {
            self.note_length(spelling);
        }
    }

    fn note_length(&mut self, spelling: &str) {
        let length = spelling.chars().count();
        if self.entries.len() == 1 {
            self.longest_entry_length = length;
            self.shortest_entry_length = length;
        } else {
            self.longest_entry_length = self.longest_entry_length.max(length);
            self.shortest_entry_length = self.shortest_entry_length.min(length);
        }
    }

    /// Remove uma categoria de uma entrada, atualizando os agregados.
    ///
    /// A entrada inteira sai do léxico quando fica sem categorias.
    /// Retorna `false` se a entrada ou a categoria não existiam.
    pub fn remove_entry_category(&mut self, spelling: &str, category: &str) -> bool {
        let Some(entry) = self.entries.get_mut(spelling) else {
            return false;
        };
        let Some(removed) = entry.remove_category(category) else {
            return false;
        };
        let now_empty = entry.is_empty();

        decrement(&mut self.category_counts, category, removed);
        decrement(&mut self.category_entry_counts, category, 1);
        if now_empty {
            self.entries.remove(spelling);
        }
        true
    }

    /// Busca uma entrada tolerando variações de caixa.
    ///
    /// 1. Grafia exata.
    /// 2. Se a palavra for toda maiúscula: só a inicial maiúscula ("NASA" → "Nasa").
    /// 3. Tudo minúsculo ("The" → "the").
    pub fn lexicon_entry(&self, word: &str) -> Option<&LexiconEntry> {
        if let Some(entry) = self.entries.get(word) {
            return Some(entry);
        }
        if is_all_caps(word) {
            if let Some(entry) = self.entries.get(&capitalize(word)) {
                return Some(entry);
            }
        }
        let lower = word.to_lowercase();
        if lower != word {
            return self.entries.get(&lower);
        }
        None
    }

    /// Busca apenas pela grafia exata.
    pub fn exact_entry(&self, spelling: &str) -> Option<&LexiconEntry> {
        self.entries.get(spelling)
    }

    pub fn contains_entry(&self, word: &str) -> bool {
        self.lexicon_entry(word).is_some()
    }

    /// Contagens por categoria da palavra (com as variações de caixa de [`Lexicon::lexicon_entry`]).
    pub fn category_counts(&self, word: &str) -> Option<TagCounts> {
        self.lexicon_entry(word).map(LexiconEntry::tag_counts)
    }

    /// Contagem agregada de uma categoria em todo o léxico.
    pub fn category_count(&self, category: &str) -> u64 {
        self.category_counts.get(category).copied().unwrap_or(0)
    }

    /// Contagem de uma categoria para uma palavra.
    pub fn entry_category_count(&self, word: &str, category: &str) -> u64 {
        self.lexicon_entry(word)
            .map(|e| e.category_count(category))
            .unwrap_or(0)
    }

    /// Número de entradas distintas que possuem a categoria.
    pub fn category_entry_count(&self, category: &str) -> u64 {
        self.category_entry_counts.get(category).copied().unwrap_or(0)
    }

    /// Total de ocorrências de uma palavra.
    pub fn entry_count(&self, word: &str) -> u64 {
        self.lexicon_entry(word).map(|e| e.entry_count).unwrap_or(0)
    }

    pub fn largest_category(&self, word: &str) -> &str {
        self.lexicon_entry(word)
            .map(|e| e.largest_category())
            .unwrap_or("")
    }

    pub fn lemma(&self, word: &str, category: &str) -> &str {
        self.lexicon_entry(word)
            .map(|e| e.lemma(category))
            .unwrap_or("")
    }

    pub fn largest_lemma(&self, word: &str) -> &str {
        self.lexicon_entry(word)
            .map(|e| e.largest_lemma())
            .unwrap_or("")
    }

    /// Soma de todas as contagens do léxico.
    pub fn total_count(&self) -> u64 {
        self.category_counts.values().sum()
    }

    /// Todas as categorias presentes, em ordem alfabética.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = self.category_counts.keys().map(String::as_str).collect();
        categories.sort_unstable();
        categories
    }

    pub fn entries(&self) -> impl Iterator<Item = &LexiconEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Comprimento (em caracteres) da maior grafia.
    pub fn longest_entry_length(&self) -> usize {
        self.longest_entry_length
    }

    /// Comprimento (em caracteres) da menor grafia.
    pub fn shortest_entry_length(&self) -> usize {
        self.shortest_entry_length
    }

    /// Categorias do léxico que não existem no catálogo de tags.
    pub fn invalid_categories(&self, catalog: &TagCatalog) -> Vec<String> {
        let mut invalid: Vec<String> = self
            .category_counts
            .keys()
            .filter(|category| !catalog.contains_all_components(category))
            .cloned()
            .collect();
        invalid.sort();
        invalid
    }

    /// `true` se todas as categorias do léxico existem no catálogo.
    pub fn is_consistent_with(&self, catalog: &TagCatalog) -> bool {
        self.invalid_categories(catalog).is_empty()
    }

    /// Grava o léxico no formato de texto, entradas ordenadas por grafia.
    pub fn save_to_writer<W: Write>(&self, mut writer: W) -> Result<()> {
        let mut line = String::new();
        for entry in self.sorted_entries() {
            line.clear();
            format_entry(entry, &mut line);
            writer.write_all(line.as_bytes())?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| PosError::io(path, e))?;
        self.save_to_writer(BufWriter::new(file))
            .map_err(|e| match e {
                PosError::Stream(source) => PosError::io(path, source),
                other => other,
            })
    }

    /// Representação textual completa (mesmo formato de [`Lexicon::save_to_writer`]).
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for entry in self.sorted_entries() {
            format_entry(entry, &mut text);
        }
        text
    }

    fn sorted_entries(&self) -> Vec<&LexiconEntry> {
        let mut entries: Vec<&LexiconEntry> = self.entries.values().collect();
        entries.sort_by(|a, b| a.spelling.cmp(&b.spelling));
        entries
    }
}

/// Categoria dominante primeiro: a carga desempata pela ordem da linha.
fn format_entry(entry: &LexiconEntry, out: &mut String) {
    let _ = write!(out, "{}\t{}", entry.spelling, entry.entry_count);
    let largest = entry
        .categories
        .iter()
        .filter(|data| data.category == entry.largest_category);
    let others = entry
        .categories
        .iter()
        .filter(|data| data.category != entry.largest_category);
    for data in largest.chain(others) {
        let _ = write!(out, "\t{}\t{}\t{}", data.category, data.lemma, data.count);
    }
    out.push('\n');
}

fn decrement(map: &mut HashMap<String, u64>, key: &str, amount: u64) {
    if let Some(value) = map.get_mut(key) {
        *value = value.saturating_sub(amount);
        if *value == 0 {
            map.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Lexicon {
        let mut lexicon = Lexicon::new();
        lexicon.update_entry_count("run", "VB", "run", 6);
        lexicon.update_entry_count("run", "NN", "run", 4);
        lexicon.update_entry_count("dogs", "NNS", "dog", 3);
        lexicon.update_entry_count("Nasa", "NNP", "Nasa", 2);
        lexicon.update_entry_count("the", "DT", "the", 50);
        lexicon
    }

    #[test]
    fn test_scenario_run_line() {
        let (lexicon, report) = Lexicon::parse_str("run\t10\tVB\t*\t6\tNN\t*\t4\n");
        assert!(report.is_clean());
        assert_eq!(lexicon.entry_category_count("run", "VB"), 6);
        assert_eq!(lexicon.largest_category("run"), "VB");
        assert_eq!(lexicon.entry_count("run"), 10);
        assert_eq!(lexicon.lemma("run", "NN"), "*");
    }

    #[test]
    fn test_largest_category_tie_break_follows_insertion_order() {
        let mut a_first = Lexicon::new();
        a_first.update_entry_count("x", "A", "x", 5);
        a_first.update_entry_count("x", "B", "x", 5);
        assert_eq!(a_first.largest_category("x"), "A");

        let mut b_first = Lexicon::new();
        b_first.update_entry_count("x", "B", "x", 5);
        b_first.update_entry_count("x", "A", "x", 5);
        assert_eq!(b_first.largest_category("x"), "B");

        // Estritamente maior troca a dominante
        a_first.update_entry_count("x", "B", "x", 1);
        assert_eq!(a_first.largest_category("x"), "B");
    }

    #[test]
    fn test_aggregates_follow_updates() {
        let lexicon = sample();
        assert_eq!(lexicon.category_count("VB"), 6);
        assert_eq!(lexicon.category_count("NN"), 4);
        assert_eq!(lexicon.category_entry_count("NN"), 1);
        assert_eq!(lexicon.total_count(), 65);
        assert_eq!(lexicon.longest_entry_length(), 4);
        assert_eq!(lexicon.shortest_entry_length(), 3);
    }

    #[test]
    fn test_zero_count_is_noop() {
        let mut lexicon = Lexicon::new();
        lexicon.update_entry_count("nada", "NN", "nada", 0);
        assert!(lexicon.is_empty());
        assert_eq!(lexicon.category_count("NN"), 0);
    }

    #[test]
    fn test_remove_category_and_entry() {
        let mut lexicon = sample();
        assert!(lexicon.remove_entry_category("run", "VB"));
        assert_eq!(lexicon.entry_count("run"), 4);
        assert_eq!(lexicon.largest_category("run"), "NN");
        assert_eq!(lexicon.category_count("VB"), 0);
        assert!(!lexicon.categories().contains(&"VB"));

        assert!(lexicon.remove_entry_category("run", "NN"));
        assert!(lexicon.exact_entry("run").is_none());
        assert_eq!(lexicon.category_entry_count("NN"), 0);

        assert!(!lexicon.remove_entry_category("run", "NN"));
        assert!(!lexicon.remove_entry_category("dogs", "VB"));
    }

    #[test]
    fn test_lookup_recapitalizes() {
        let lexicon = sample();
        // Tudo maiúsculo → só a inicial
        assert_eq!(lexicon.lexicon_entry("NASA").map(|e| e.spelling()), Some("Nasa"));
        // Início de frase → minúsculas
        assert_eq!(lexicon.lexicon_entry("The").map(|e| e.spelling()), Some("the"));
        assert_eq!(lexicon.lexicon_entry("RUN").map(|e| e.spelling()), Some("run"));
        assert!(lexicon.lexicon_entry("gato").is_none());
    }

    #[test]
    fn test_missing_lookups_have_defaults() {
        let lexicon = sample();
        assert_eq!(lexicon.entry_count("gato"), 0);
        assert_eq!(lexicon.entry_category_count("gato", "NN"), 0);
        assert_eq!(lexicon.entry_category_count("run", "JJ"), 0);
        assert_eq!(lexicon.largest_category("gato"), "");
        assert_eq!(lexicon.lemma("gato", "NN"), "");
        assert_eq!(lexicon.lemma("run", "JJ"), "");
        assert_eq!(lexicon.category_count("XYZ"), 0);
    }

    #[test]
    fn test_malformed_lines_are_reported_not_fatal() {
        let text = "ok\t3\tNN\tok\t3\n\
                    curta\t1\tNN\n\
                    ruim\t5\tNN\truim\t2\tVB\truim\tdois\tJJ\truim\t1\n\
                    impar\t4\tNN\timpar\t4\tVB\n\
                    \n\
                    fim\t1\tNN\tfim\t1\n";
        let (lexicon, report) = Lexicon::parse_str(text);

        assert_eq!(report.short_lines, 1);
        assert_eq!(report.malformed_lines, vec![3, 4]);
        assert_eq!(report.skipped_lines(), 3);

        // Triplas válidas antes da malformada são mantidas, as seguintes não
        assert_eq!(lexicon.entry_category_count("ruim", "NN"), 2);
        assert_eq!(lexicon.entry_category_count("ruim", "JJ"), 0);
        assert_eq!(lexicon.entry_category_count("impar", "NN"), 4);
        assert!(lexicon.exact_entry("curta").is_none());
        assert!(lexicon.exact_entry("fim").is_some());
    }

    #[test]
    fn test_save_load_round_trip() {
        let original = sample();
        let text = original.to_text();
        let (reloaded, report) = Lexicon::parse_str(&text);
        assert!(report.is_clean());

        assert_eq!(reloaded.len(), original.len());
        for entry in original.entries() {
            let other = reloaded.exact_entry(entry.spelling()).unwrap();
            assert_eq!(other.entry_count(), entry.entry_count());
            assert_eq!(other.tag_counts(), entry.tag_counts());
            assert_eq!(other.largest_category(), entry.largest_category());
            for category in entry.categories() {
                assert_eq!(other.lemma(category), entry.lemma(category));
            }
        }
        for category in original.categories() {
            assert_eq!(reloaded.category_count(category), original.category_count(category));
            assert_eq!(
                reloaded.category_entry_count(category),
                original.category_entry_count(category)
            );
        }
        assert_eq!(reloaded.longest_entry_length(), original.longest_entry_length());
        assert_eq!(reloaded.shortest_entry_length(), original.shortest_entry_length());
        // Texto estável: salvar de novo produz o mesmo conteúdo
        assert_eq!(reloaded.to_text(), text);
    }

    #[test]
    fn test_round_trip_keeps_tie_break() {
        let mut lexicon = Lexicon::new();
        lexicon.update_entry_count("x", "B", "bx", 5);
        lexicon.update_entry_count("x", "A", "ax", 5);
        let (reloaded, _) = Lexicon::parse_str(&lexicon.to_text());
        assert_eq!(reloaded.largest_category("x"), "B");
        assert_eq!(reloaded.lemma("x", "A"), "ax");
    }

    #[test]
    fn test_round_trip_keeps_tie_won_by_update() {
        let mut lexicon = Lexicon::new();
        lexicon.update_entry_count("x", "B", "x", 3);
        lexicon.update_entry_count("x", "A", "x", 5);
        lexicon.update_entry_count("x", "B", "x", 2);
        assert_eq!(lexicon.largest_category("x"), "A");

        let text = lexicon.to_text();
        assert_eq!(text, "x\t10\tA\tx\t5\tB\tx\t5\n");
        let (reloaded, report) = Lexicon::parse_str(&text);
        assert!(report.is_clean());
        assert_eq!(reloaded.largest_category("x"), "A");
        assert_eq!(reloaded.entry_category_count("x", "B"), 5);
        assert_eq!(reloaded.to_text(), text);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.lex");
        let original = sample();
        original.save_to_path(&path).unwrap();

        let mut reloaded = Lexicon::new();
        let report = reloaded.load_from_path(&path).unwrap();
        assert!(report.is_clean());
        assert_eq!(reloaded.to_text(), original.to_text());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut lexicon = Lexicon::new();
        let result = lexicon.load_from_path("/caminho/que/nao/existe.lex");
        assert!(matches!(result, Err(PosError::Io { .. })));
    }

    #[test]
    fn test_consistency_with_catalog() {
        let catalog = TagCatalog::builtin();
        let mut lexicon = sample();
        assert!(lexicon.is_consistent_with(&catalog));

        lexicon.update_entry_count("zork", "QQ", "zork", 1);
        assert_eq!(lexicon.invalid_categories(&catalog), vec!["QQ".to_string()]);
        assert!(!lexicon.is_consistent_with(&catalog));
    }
}
