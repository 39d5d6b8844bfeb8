//! # pos-core — Etiquetador Morfossintático (POS Tagging) Estatístico
//!
//! Este crate atribui a cada token de uma sentença a classe gramatical mais
//! provável (substantivo, verbo, adjetivo...), combinando três fontes de conhecimento:
//!
//! 1. Um **léxico de frequências** (palavra → contagem por tag) pré-computado.
//! 2. Uma **cadeia de heurísticas** ([`guesser`]) para palavras fora do léxico.
//! 3. Um **decodificador Viterbi** ([`viterbi`]) com poda por beam, que escolhe a
//!    sequência de tags mais provável sob um modelo de Markov de bigramas/trigramas.
//!
//! ## Arquitetura do Sistema
//!
//! ```text
//! texto ─► tokenizer ─► sentenças ─► tagger ─┬─► lexicon / léxico dinâmico / guesser
//!                                            ├─► smoothing (P_lex)
//!                                            ├─► viterbi (transition)
//!                                            └─► retagger ─► palavras etiquetadas + lemas
//! ```
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use pos_core::{PosModel, TaggerConfig};
//!
//! let model = PosModel::build().unwrap();
//! let tagger = model.tagger(&TaggerConfig::default());
//!
//! for tw in tagger.tag_sentence(&["The", "dog", "runs", "."]) {
//!     println!("{} ({})", tw, tw.lemma);
//! }
//! ```
//!
//! ## Módulos Principais
//!
//! - [`pipeline`]: orquestrador texto → tokens etiquetados, com eventos observáveis.
//! - [`tagger`]: etiquetador de sentenças já tokenizadas.
//! - [`lexicon`] e [`tags`]: recursos de dados (frequências e catálogo de tags).
//! - [`model`]: carga dos recursos embutidos ou de um diretório.

pub mod abbreviations;
pub mod cache;
pub mod casing;
pub mod config;
pub mod corpus;
pub mod error;
pub mod guesser;
pub mod lexicon;
pub mod lists;
pub mod model;
pub mod pipeline;
pub mod probability;
pub mod retagger;
pub mod smoothing;
pub mod tagger;
pub mod tags;
pub mod tokenizer;
pub mod transition;
pub mod viterbi;

pub use config::TaggerConfig;
pub use error::{LoadReport, PosError, Result};
pub use guesser::PartOfSpeechGuesser;
pub use lexicon::{Lexicon, LexiconEntry, TagCounts};
pub use model::PosModel;
pub use pipeline::{AnalyzedToken, PipelineEvent, PosPipeline};
pub use probability::Probability;
pub use tagger::{PartOfSpeechTagger, TaggedWord};
pub use tags::{TagCatalog, TagRole};
pub use tokenizer::Token;
