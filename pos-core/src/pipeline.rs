//! # Pipeline de Etiquetagem — Orquestrador com Eventos Observáveis
//!
//! O pipeline liga tokenizador, segmentador de sentenças e etiquetador e
//! emite eventos em cada passo via um canal Rust (`mpsc`), permitindo que o
//! servidor WebSocket transmita o progresso em tempo real para o cliente.
//!
//! ## Fluxo de Eventos
//!
//! ```text
//! TokenizationDone
//! └─ para cada sentença:
//!      CandidatesFound  (um por token)
//!      ViterbiStep      (um por token)
//!      TagAssigned      (um por token, tag do Viterbi)
//!      Retagged         (só tokens alterados pelo re-etiquetador)
//! Done
//! ```

use std::sync::mpsc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::TaggerConfig;
use crate::error::Result;
use crate::model::PosModel;
use crate::tagger::{CandidateOrigin, CandidateTag, PartOfSpeechTagger, TaggedWord};
use crate::tokenizer::{split_sentences, tokenize, words, Token};
use crate::viterbi::{scores_to_probs, ViterbiStep};

/// Eventos emitidos pelo pipeline durante o processamento.
///
/// Estes eventos permitem que a UI visualize o "raciocínio" do etiquetador
/// passo a passo. Os índices de token são globais (posição no texto todo).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    /// **Passo 1**: Tokenização e segmentação concluídas.
    TokenizationDone {
        tokens: Vec<Token>,
        sentences: usize,
        total: usize,
    },
    /// **Passo 2**: Tags candidatas de um token e de onde vieram
    /// (léxico, léxico dinâmico ou adivinhador).
    CandidatesFound {
        sentence: usize,
        token_index: usize,
        token_text: String,
        origin: CandidateOrigin,
        candidates: Vec<CandidateTag>,
    },
    /// **Passo 3**: Um passo do Viterbi, com os scores de todas as tags e as podadas.
    ViterbiStep {
        sentence: usize,
        token_index: usize,
        token_text: String,
        step: ViterbiStep,
    },
    /// **Passo 4**: Tag escolhida pelo Viterbi.
    TagAssigned {
        token_index: usize,
        token_text: String,
        tag: String,
        lemma: String,
        /// Softmax dos scores da posição.
        confidence: f64,
    },
    /// **Passo 5 (Opcional)**: O re-etiquetador trocou a tag de um token ou juntou e separou palavras.
    Retagged {
        token_index: usize,
        token_text: String,
        from: String,
        to: String,
    },
    /// **Conclusão**: Resultado final consolidado.
    Done {
        tokens: Vec<AnalyzedToken>,
        sentences: usize,
        total_tokens: usize,
        corrections: usize,
        processing_ms: u64,
    },
    /// **Falha**: Ocorreu um erro irrecuperável.
    Error { message: String },
}

/// Token com a etiqueta final.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyzedToken {
    pub token: Token,
    pub sentence: usize,
    pub tag: String,
    pub lemma: String,
    pub confidence: f64,
}

/// O pipeline principal: texto bruto → tokens etiquetados.
///
/// # Modos de Uso
/// - **Sync**: [`PosPipeline::analyze`] para scripts e chamadas diretas.
/// - **Streaming**: [`PosPipeline::analyze_streaming`] para UIs reativas (via WebSocket).
#[derive(Debug)]
pub struct PosPipeline {
    model: PosModel,
    tagger: PartOfSpeechTagger,
}

impl PosPipeline {
    /// Pipeline sobre o modelo embutido com a configuração padrão.
    pub fn new() -> Result<Self> {
        Ok(Self::with_model(PosModel::build()?, &TaggerConfig::default()))
    }

    pub fn with_model(model: PosModel, config: &TaggerConfig) -> Self {
        let tagger = model.tagger(config);
        Self { model, tagger }
    }

    pub fn model(&self) -> &PosModel {
        &self.model
    }

    pub fn tagger(&self) -> &PartOfSpeechTagger {
        &self.tagger
    }

    /// Processa o texto de forma síncrona e retorna o resultado final.
    pub fn analyze(&self, text: &str) -> Vec<AnalyzedToken> {
        let (tx, rx) = mpsc::channel();
        self.analyze_streaming(text, tx);

        let mut analyzed = Vec::new();
        while let Ok(event) = rx.recv() {
            if let PipelineEvent::Done { tokens, .. } = event {
                analyzed = tokens;
            }
        }
        analyzed
    }

    /// Etiqueta vários textos em paralelo, sem eventos.
    pub fn analyze_batch(&self, texts: &[&str]) -> Vec<Vec<TaggedWord>> {
        let sentences: Vec<Vec<String>> = texts
            .iter()
            .flat_map(|text| split_sentences(tokenize(text, &self.model.abbreviations)))
            .map(|sentence| sentence.into_iter().map(|t| t.text).collect())
            .collect();
        self.tagger.tag_sentences(&sentences)
    }

    /// Executa o pipeline enviando eventos de progresso pelo canal `tx`.
    ///
    /// Erros de envio (receptor fechado) são ignorados: o cliente desistiu.
    pub fn analyze_streaming(&self, text: &str, tx: mpsc::Sender<PipelineEvent>) {
        let start = Instant::now();

        // === Passo 1: Tokenização ===
        let tokens = tokenize(text, &self.model.abbreviations);
        let total = tokens.len();
        let sentences = split_sentences(tokens.clone());
        let _ = tx.send(PipelineEvent::TokenizationDone {
            tokens,
            sentences: sentences.len(),
            total,
        });

        let mut analyzed = Vec::with_capacity(total);
        let mut corrections = 0;

        for (sentence_index, sentence) in sentences.iter().enumerate() {
            let trace = self.tagger.tag_sentence_traced(&words(sentence));
            corrections += trace.corrections;

            // === Passo 2: Candidatas ===
            for (token, candidates) in sentence.iter().zip(&trace.candidates) {
                let _ = tx.send(PipelineEvent::CandidatesFound {
                    sentence: sentence_index,
                    token_index: token.index,
                    token_text: token.text.clone(),
                    origin: candidates.origin,
                    candidates: candidates.tags.clone(),
                });
            }

            // === Passo 3: Viterbi ===
            for (token, step) in sentence.iter().zip(&trace.viterbi.steps) {
                let _ = tx.send(PipelineEvent::ViterbiStep {
                    sentence: sentence_index,
                    token_index: token.index,
                    token_text: token.text.clone(),
                    step: step.clone(),
                });
            }

            // === Passo 4: Tags do Viterbi ===
            for ((token, decoded), step) in sentence.iter().zip(&trace.decoded).zip(&trace.viterbi.steps) {
                let _ = tx.send(PipelineEvent::TagAssigned {
                    token_index: token.index,
                    token_text: token.text.clone(),
                    tag: decoded.tag.clone(),
                    lemma: decoded.lemma.clone(),
                    confidence: confidence(step, &decoded.tag),
                });
            }

            // === Passo 5: Re-etiquetagem ===
            let aligned;
            let final_tokens: &[Token] = if trace.tagged.len() == sentence.len() {
                sentence
            } else {
                tracing::warn!(
                    before = sentence.len(),
                    after = trace.tagged.len(),
                    "re-etiquetador mudou o tamanho da sentença"
                );
                aligned = align_tokens(sentence, &trace.tagged);
                &aligned
            };
            let first_index = sentence.first().map_or(0, |t| t.index);
            for (token, tagged) in final_tokens.iter().zip(&trace.tagged) {
                let position = token.index.saturating_sub(first_index);
                let decoded = trace.decoded.get(position);
                let source_text = sentence.get(position).map(|t| t.text.as_str());
                if let Some(decoded) = decoded {
                    if decoded.tag != tagged.tag || source_text != Some(token.text.as_str()) {
                        let _ = tx.send(PipelineEvent::Retagged {
                            token_index: token.index,
                            token_text: token.text.clone(),
                            from: decoded.tag.clone(),
                            to: tagged.tag.clone(),
                        });
                    }
                }

                // Tag trocada pelo re-etiquetador fica com a confiança da tag decodificada
                let confidence = match (trace.viterbi.steps.get(position), decoded) {
                    (Some(step), Some(decoded)) => confidence(step, &decoded.tag),
                    _ => 0.0,
                };
                analyzed.push(AnalyzedToken {
                    token: token.clone(),
                    sentence: sentence_index,
                    tag: tagged.tag.clone(),
                    lemma: tagged.lemma.clone(),
                    confidence,
                });
            }
        }

        let elapsed = start.elapsed().as_millis() as u64;
        tracing::debug!(tokens = total, sentences = sentences.len(), elapsed, "texto analisado");
        let _ = tx.send(PipelineEvent::Done {
            tokens: analyzed,
            sentences: sentences.len(),
            total_tokens: total,
            corrections,
            processing_ms: elapsed,
        });
    }
}

/// Associa cada palavra da saída do re-etiquetador a um trecho do texto,
/// quando ele junta tokens (`New` + `York`) ou separa um token (`can't` → `ca` + `n't`).
///
/// Uma palavra que não corresponde ao texto ocupa o token corrente inteiro;
/// palavras que sobram depois do último token ficam com um trecho vazio no fim.
fn align_tokens(sentence: &[Token], tagged: &[TaggedWord]) -> Vec<Token> {
    let mut aligned = Vec::with_capacity(tagged.len());
    let mut cursor = 0;
    // Bytes já consumidos do token corrente
    let mut offset = 0;

    for tw in tagged {
        let Some(first) = sentence.get(cursor) else {
            let (end, index) = sentence.last().map_or((0, 0), |t| (t.end, t.index));
            aligned.push(Token {
                text: tw.word.clone(),
                start: end,
                end,
                index,
            });
            continue;
        };
        let start = first.start + offset;
        let index = first.index;
        let mut end = start;
        let mut rest = tw.word.as_str();

        while let Some(token) = sentence.get(cursor) {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }
            let piece = &token.text[offset..];
            if rest.starts_with(piece) {
                rest = &rest[piece.len()..];
                end = token.end;
                cursor += 1;
                offset = 0;
            } else if piece.starts_with(rest) {
                offset += rest.len();
                end = token.start + offset;
                rest = "";
            } else {
                break;
            }
        }

        if end == start {
            // Palavra reescrita: fica com o resto do token corrente
            end = first.end;
            cursor += 1;
            offset = 0;
        }
        aligned.push(Token {
            text: tw.word.clone(),
            start,
            end,
            index,
        });
    }
    aligned
}

/// Probabilidade (softmax dos scores da posição) da tag; 0 se a tag não foi pontuada.
fn confidence(step: &ViterbiStep, tag: &str) -> f64 {
    let scores: Vec<f64> = step.scores.iter().map(|s| s.score).collect();
    let probs = scores_to_probs(&scores);
    step.scores
        .iter()
        .zip(probs)
        .find(|(score, _)| score.tag == tag)
        .map_or(0.0, |(_, p)| p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::retagger::Retagger;

    fn pipeline() -> PosPipeline {
        PosPipeline::new().unwrap()
    }

    #[test]
    fn test_pipeline_basic() {
        let analyzed = pipeline().analyze("The dog runs. She lives in Paris.");
        let tags: Vec<&str> = analyzed.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(tags, vec!["DT", "NN", "VBZ", ".", "PRP", "VBZ", "IN", "NNP", "."]);
        assert_eq!(analyzed[5].lemma, "live");
        assert_eq!(analyzed[4].sentence, 1);
        assert!(analyzed.iter().all(|t| t.confidence > 0.0 && t.confidence <= 1.0));
    }

    #[test]
    fn test_pipeline_empty() {
        assert!(pipeline().analyze("").is_empty());
        assert!(pipeline().analyze("   \n ").is_empty());
    }

    #[test]
    fn test_pipeline_events_streaming() {
        let pipeline = pipeline();
        let (tx, rx) = mpsc::channel();
        pipeline.analyze_streaming("Dr. Smith flew to London.", tx);

        let events: Vec<PipelineEvent> = rx.try_iter().collect();
        assert!(
            matches!(&events[0], PipelineEvent::TokenizationDone { total: 6, sentences: 1, .. }),
            "Primeiro evento deve ser TokenizationDone"
        );
        assert!(
            matches!(events.last(), Some(PipelineEvent::Done { total_tokens: 6, .. })),
            "Último evento deve ser Done"
        );

        let count = |pred: fn(&PipelineEvent) -> bool| events.iter().filter(|e| pred(e)).count();
        assert_eq!(count(|e| matches!(e, PipelineEvent::CandidatesFound { .. })), 6);
        assert_eq!(count(|e| matches!(e, PipelineEvent::ViterbiStep { .. })), 6);
        assert_eq!(count(|e| matches!(e, PipelineEvent::TagAssigned { .. })), 6);
    }

    #[test]
    fn test_retagged_events_follow_corrections() {
        let pipeline = pipeline();
        let (tx, rx) = mpsc::channel();
        pipeline.analyze_streaming("I want to run. He has walked home.", tx);

        let events: Vec<PipelineEvent> = rx.try_iter().collect();
        let retagged = events
            .iter()
            .filter(|e| matches!(e, PipelineEvent::Retagged { .. }))
            .count();
        let Some(PipelineEvent::Done { corrections, tokens, .. }) = events.last() else {
            panic!("último evento deve ser Done");
        };
        assert_eq!(retagged, *corrections);
        assert_eq!(tokens[3].tag, "VB");
        assert_eq!(tokens[7].tag, "VBN");
    }

    #[test]
    fn test_retagged_tokens_keep_decoded_confidence() {
        let analyzed = pipeline().analyze("I want to run. He has walked home.");
        assert_eq!(analyzed[3].tag, "VB");
        assert_eq!(analyzed[7].tag, "VBN");
        assert!(analyzed.iter().all(|t| t.confidence > 0.0 && t.confidence <= 1.0));
    }

    /// Junta "New" + "York" em uma só palavra.
    struct JoinNewYork;

    impl Retagger for JoinNewYork {
        fn retag(&self, sentence: Vec<TaggedWord>) -> Vec<TaggedWord> {
            let mut out: Vec<TaggedWord> = Vec::with_capacity(sentence.len());
            for tw in sentence {
                match out.last_mut() {
                    Some(prev) if prev.word == "New" && tw.word == "York" => {
                        *prev = TaggedWord::new("New York", "NNP", "New York");
                    }
                    _ => out.push(tw),
                }
            }
            out
        }
    }

    #[test]
    fn test_retagger_that_merges_words_is_reported() {
        let model = PosModel::build().unwrap();
        let tagger = model
            .tagger(&TaggerConfig::default())
            .with_retagger(Arc::new(JoinNewYork));
        let pipeline = PosPipeline { model, tagger };

        let (tx, rx) = mpsc::channel();
        pipeline.analyze_streaming("She lives in New York.", tx);
        let events: Vec<PipelineEvent> = rx.try_iter().collect();

        let retagged: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::Retagged { token_text, .. } => Some(token_text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(retagged, vec!["New York"]);

        let Some(PipelineEvent::Done { tokens, total_tokens, .. }) = events.last() else {
            panic!("último evento deve ser Done");
        };
        assert_eq!(*total_tokens, 6);
        let texts: Vec<&str> = tokens.iter().map(|t| t.token.text.as_str()).collect();
        assert_eq!(texts, vec!["She", "lives", "in", "New York", "."]);
        assert_eq!(tokens[3].tag, "NNP");
        assert_eq!((tokens[3].token.start, tokens[3].token.end), (13, 21));
        assert_eq!(tokens[4].token.index, 5);
        assert!(tokens.iter().all(|t| t.confidence > 0.0));
    }

    #[test]
    fn test_align_tokens_merges_and_splits() {
        let pipeline = pipeline();
        let sentence = tokenize("He can't see New York.", &pipeline.model().abbreviations);
        let tagged: Vec<TaggedWord> = ["He", "ca", "n't", "see", "New York", "."]
            .iter()
            .map(|w| TaggedWord::new(*w, "X", *w))
            .collect();

        let spans: Vec<(usize, usize, usize)> = align_tokens(&sentence, &tagged)
            .iter()
            .map(|t| (t.start, t.end, t.index))
            .collect();
        assert_eq!(
            spans,
            vec![(0, 2, 0), (3, 5, 1), (5, 8, 1), (9, 12, 2), (13, 21, 3), (21, 22, 5)]
        );
    }

    #[test]
    fn test_align_tokens_rewritten_and_extra_words() {
        let pipeline = pipeline();
        let sentence = tokenize("He left", &pipeline.model().abbreviations);
        let tagged = vec![
            TaggedWord::new("Him", "PRP", "he"),
            TaggedWord::new("left", "VBD", "leave"),
            TaggedWord::new(".", ".", "."),
        ];

        let aligned = align_tokens(&sentence, &tagged);
        assert_eq!((aligned[0].start, aligned[0].end), (0, 2));
        assert_eq!(aligned[0].text, "Him");
        assert_eq!((aligned[1].start, aligned[1].end), (3, 7));
        assert_eq!((aligned[2].start, aligned[2].end, aligned[2].index), (7, 7, 1));
    }

    #[test]
    fn test_analyze_batch_matches_analyze() {
        let pipeline = pipeline();
        let batch = pipeline.analyze_batch(&["The dog runs.", "I want to run."]);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].iter().map(|tw| tw.tag.as_str()).collect::<Vec<_>>(), vec!["DT", "NN", "VBZ", "."]);
        assert_eq!(batch[1][3].tag, "VB");
    }

    #[test]
    fn test_unknown_words_flow_through_the_guesser() {
        let pipeline = pipeline();
        let (tx, rx) = mpsc::channel();
        pipeline.analyze_streaming("Zibbers glorp.", tx);
        let origins: Vec<CandidateOrigin> = rx
            .try_iter()
            .filter_map(|e| match e {
                PipelineEvent::CandidatesFound { origin, .. } => Some(origin),
                _ => None,
            })
            .collect();
        assert_eq!(
            origins,
            vec![CandidateOrigin::Guesser, CandidateOrigin::Guesser, CandidateOrigin::Lexicon]
        );
    }
}
