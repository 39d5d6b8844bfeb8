//! # Algoritmo de Viterbi com Beam Search
//!
//! O algoritmo de Viterbi é um método de **programação dinâmica** que encontra
//! a sequência de tags mais provável de forma eficiente.
//!
//! ## Intuição
//!
//! Com 5 tags candidatas por palavra, uma busca exaustiva teria `O(5^N)`
//! caminhos. O Viterbi explora que o **melhor caminho até a palavra i com tag t**
//! depende apenas do **melhor caminho até a palavra i-1 com alguma tag p** → `O(N × T²)`.
//!
//! ## Recursão (log-space)
//!
//! ```text
//! Início:    score(-2, ".") = score(-1, ".") = 1
//!
//! Bigrama:   score(i, t) = max_p [ score(i-1, p) · P_lex(t | w_i) · P(t | p) ]
//! Trigrama:  score(i, p, t) = max_pp [ score(i-1, pp, p) · P_lex(t | w_i) · P(t | p, pp) ]
//! ```
//!
//! No modo trigrama a treliça guarda um estado por par `(tag anterior, tag)`,
//! então todo par `(p, pp)` sobrevivente é considerado.
//!
//! ## Beam Search
//!
//! Depois de pontuar todas as tags da posição `i`, qualquer estado cujo log-score
//! fique mais de `beam_width` abaixo do melhor da posição é removido da treliça
//! (e não volta mais). O padrão é `ln(1000)`: sobrevivem as tags até 1000×
//! menos prováveis que a melhor.
//!
//! ## Backtracking
//!
//! Na última posição escolhe o estado sobrevivente de maior score e segue os
//! ponteiros de traceback até a posição 0.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::probability::Probability;
use crate::transition::TransitionMatrix;

/// Tag sintética das posições -2 e -1 (fronteira de sentença).
pub const DEFAULT_BOUNDARY_TAG: &str = ".";

/// Largura padrão do beam: `ln(1000)`.
pub fn default_beam_width() -> f64 {
    1000f64.ln()
}

/// Estado do Viterbi em uma posição (para visualização passo a passo)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViterbiStep {
    /// Índice do token sendo processado
    pub token_index: usize,
    pub word: String,
    /// Scores de todas as tags pontuadas nesta posição (incluindo as podadas)
    pub scores: Vec<TagScore>,
    /// Tags removidas pelo beam nesta posição
    pub pruned: Vec<String>,
    /// A tag com maior score neste passo
    pub best_tag: String,
    /// Log-score do melhor caminho até aqui
    pub best_score: f64,
}

/// Score de uma tag individual no Viterbi (valores em log)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagScore {
    pub tag: String,
    /// Score acumulado até este passo com esta tag
    pub score: f64,
    /// Tag anterior que gerou este score ótimo
    pub best_prev: String,
    /// Probabilidade léxica `P_lex(tag | palavra)`
    pub lexical: f64,
    /// Probabilidade de transição a partir de `best_prev`
    pub transition: f64,
}

/// Resultado completo do Viterbi
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViterbiResult {
    /// Sequência de tags mais provável (uma por token)
    pub best_sequence: Vec<String>,
    /// Log-probabilidade da melhor sequência
    pub best_score: f64,
    /// Tabela de scores por posição
    pub steps: Vec<ViterbiStep>,
    /// Quantos estados o beam descartou
    pub rejected: usize,
}

/// Estado da treliça. No modo bigrama há um estado por tag; no trigrama, um
/// por par `(tag, prev)`.
#[derive(Debug, Clone)]
struct Cell {
    tag: String,
    /// Tag da posição anterior neste estado (fronteira na posição 0).
    prev: String,
    score: Probability,
    /// Índice do estado predecessor na coluna anterior.
    back: Option<usize>,
}

/// Decodificador incremental: uma chamada de [`ViterbiDecoder::update`] por palavra,
/// depois [`ViterbiDecoder::backtrace`].
#[derive(Debug, Clone)]
pub struct ViterbiDecoder {
    boundary_tag: String,
    beam_width: f64,
    use_trigrams: bool,
    columns: Vec<Vec<Cell>>,
    rejected: usize,
}

impl Default for ViterbiDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_BOUNDARY_TAG, default_beam_width(), false)
    }
}

impl ViterbiDecoder {
    pub fn new(boundary_tag: impl Into<String>, beam_width: f64, use_trigrams: bool) -> Self {
        Self {
            boundary_tag: boundary_tag.into(),
            beam_width: beam_width.max(0.0),
            use_trigrams,
            columns: Vec::new(),
            rejected: 0,
        }
    }

    /// Descarta a treliça para decodificar outra sentença (o contador de rejeições continua).
    pub fn reset(&mut self) {
        self.columns.clear();
    }

    /// Processa a próxima posição da sentença.
    ///
    /// `candidates` traz as tags possíveis da palavra com suas probabilidades
    /// léxicas, na ordem em que devem ser avaliadas (empates ficam com a primeira).
    pub fn update(
        &mut self,
        word: &str,
        candidates: &[(String, Probability)],
        transitions: &dyn TransitionMatrix,
    ) -> ViterbiStep {
        let token_index = self.columns.len();
        let seed = [Cell {
            tag: self.boundary_tag.clone(),
            prev: self.boundary_tag.clone(),
            score: Probability::ONE,
            back: None,
        }];
        let (previous, linked): (&[Cell], bool) = match self.columns.last() {
            Some(column) if !column.is_empty() => (column.as_slice(), true),
            _ => (&seed[..], false),
        };

        let mut column: Vec<Cell> = Vec::with_capacity(candidates.len());
        let mut scores = Vec::with_capacity(candidates.len());

        for (position, (tag, lexical)) in candidates.iter().enumerate() {
            if candidates[..position].iter().any(|(t, _)| t == tag) {
                continue;
            }

            // Estados desta tag, com a transição que os produziu
            let mut states: Vec<(Cell, Probability)> = Vec::new();
            for (index, prev) in previous.iter().enumerate() {
                let transition = if self.use_trigrams {
                    transitions.trigram_probability(tag, &prev.tag, &prev.prev)
                } else {
                    transitions.probability(tag, &prev.tag)
                };
                let score = prev.score * *lexical * transition;
                let cell = Cell {
                    tag: tag.clone(),
                    prev: prev.tag.clone(),
                    score,
                    back: linked.then_some(index),
                };

                let existing = if self.use_trigrams {
                    states.iter_mut().find(|(state, _)| state.prev == prev.tag)
                } else {
                    states.first_mut()
                };
                match existing {
                    Some(state) => {
                        if score.total_cmp(&state.0.score) == Ordering::Greater {
                            *state = (cell, transition);
                        }
                    }
                    None => states.push((cell, transition)),
                }
            }

            let best = states.iter().fold(None, |best: Option<&(Cell, Probability)>, state| {
                match best {
                    Some(b) if state.0.score.total_cmp(&b.0.score) != Ordering::Greater => Some(b),
                    _ => Some(state),
                }
            });
            let Some((cell, transition)) = best else {
                continue;
            };
            scores.push(TagScore {
                tag: tag.clone(),
                score: cell.score.log(),
                best_prev: cell.prev.clone(),
                lexical: lexical.log(),
                transition: transition.log(),
            });
            column.extend(states.into_iter().map(|(cell, _)| cell));
        }

        let pruned = self.prune(&mut column);
        let (best_tag, best_score) = best_cell(&column)
            .map(|cell| (cell.tag.clone(), cell.score.log()))
            .unwrap_or_else(|| (self.boundary_tag.clone(), f64::NEG_INFINITY));

        self.columns.push(column);
        ViterbiStep {
            token_index,
            word: word.to_string(),
            scores,
            pruned,
            best_tag,
            best_score,
        }
    }

    /// Remove os estados abaixo do beam. Devolve as tags que ficaram sem nenhum estado.
    fn prune(&mut self, column: &mut Vec<Cell>) -> Vec<String> {
        let Some(best) = best_cell(column).map(|cell| cell.score) else {
            return Vec::new();
        };
        let threshold = best.log() - self.beam_width;
        let mut dropped: Vec<String> = Vec::new();
        column.retain(|cell| {
            if cell.score.log() < threshold {
                dropped.push(cell.tag.clone());
                false
            } else {
                true
            }
        });
        if dropped.is_empty() {
            return Vec::new();
        }
        self.rejected += dropped.len();

        let mut pruned: Vec<String> = Vec::new();
        for tag in dropped {
            if !pruned.contains(&tag) && !column.iter().any(|cell| cell.tag == tag) {
                pruned.push(tag);
            }
        }
        tracing::trace!(position = self.columns.len(), ?pruned, "tags podadas pelo beam");
        pruned
    }

    /// Melhor sequência de tags para as posições processadas.
    ///
    /// Uma posição sem estados vira a tag de fronteira, e a posição anterior
    /// recomeça do seu melhor estado.
    pub fn backtrace(&self) -> Vec<String> {
        let mut sequence = vec![String::new(); self.columns.len()];
        let mut cursor: Option<usize> = None;
        for (position, column) in self.columns.iter().enumerate().rev() {
            let cell = match cursor {
                Some(index) => column.get(index),
                None => best_cell(column),
            };
            match cell {
                Some(cell) => {
                    sequence[position] = cell.tag.clone();
                    cursor = cell.back;
                }
                None => {
                    sequence[position] = self.boundary_tag.clone();
                    cursor = None;
                }
            }
        }
        sequence
    }

    /// Score do melhor caminho completo (`ONE` para sentença vazia).
    pub fn best_score(&self) -> Probability {
        match self.columns.last() {
            None => Probability::ONE,
            Some(column) => best_cell(column)
                .map(|cell| cell.score)
                .unwrap_or(Probability::ZERO),
        }
    }

    /// Tags sobreviventes na posição `position`, com o melhor score de cada uma.
    pub fn surviving(&self, position: usize) -> Vec<(&str, Probability)> {
        let mut survivors: Vec<(&str, Probability)> = Vec::new();
        for cell in self.columns.get(position).into_iter().flatten() {
            match survivors.iter_mut().find(|(tag, _)| *tag == cell.tag) {
                Some(entry) => {
                    if cell.score.total_cmp(&entry.1) == Ordering::Greater {
                        entry.1 = cell.score;
                    }
                }
                None => survivors.push((cell.tag.as_str(), cell.score)),
            }
        }
        survivors
    }

    /// Total de estados descartados pelo beam desde a criação.
    pub fn rejected_count(&self) -> usize {
        self.rejected
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Decodifica uma sentença inteira.
    pub fn decode<S: AsRef<str>>(
        &mut self,
        words: &[S],
        candidates: &[Vec<(String, Probability)>],
        transitions: &dyn TransitionMatrix,
    ) -> ViterbiResult {
        self.reset();
        let rejected_before = self.rejected;
        let steps = words
            .iter()
            .zip(candidates)
            .map(|(word, tags)| self.update(word.as_ref(), tags, transitions))
            .collect();
        ViterbiResult {
            best_sequence: self.backtrace(),
            best_score: self.best_score().log(),
            steps,
            rejected: self.rejected - rejected_before,
        }
    }
}

/// Primeira célula de score máximo.
fn best_cell(column: &[Cell]) -> Option<&Cell> {
    column.iter().fold(None, |best: Option<&Cell>, cell| match best {
        Some(b) if cell.score.total_cmp(&b.score) != Ordering::Greater => Some(b),
        _ => Some(cell),
    })
}

/// Executa o Viterbi com fronteira `"."` e os parâmetros dados.
pub fn viterbi_decode<S: AsRef<str>>(
    words: &[S],
    candidates: &[Vec<(String, Probability)>],
    transitions: &dyn TransitionMatrix,
    beam_width: f64,
    use_trigrams: bool,
) -> ViterbiResult {
    ViterbiDecoder::new(DEFAULT_BOUNDARY_TAG, beam_width, use_trigrams).decode(
        words,
        candidates,
        transitions,
    )
}

/// Converte log-scores em probabilidades softmax (para confiança)
pub fn scores_to_probs(scores: &[f64]) -> Vec<f64> {
    if scores.is_empty() {
        return vec![];
    }
    let max_score = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max_score == f64::NEG_INFINITY {
        return vec![1.0 / scores.len() as f64; scores.len()];
    }
    let exps: Vec<f64> = scores.iter().map(|&s| (s - max_score).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}
