//! # Configuração do Etiquetador
//!
//! Todos os campos têm padrão, então um JSON parcial (ou `{}`) é válido:
//!
//! ```json
//! { "beam_width": 4.6, "use_trigrams": true }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PosError, Result};
use crate::guesser::DEFAULT_CACHE_CAPACITY;
use crate::viterbi::default_beam_width;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggerConfig {
    /// Largura do beam em log-space (padrão `ln 1000`).
    pub beam_width: f64,
    /// Usa `P(t | p, pp)` em vez de `P(t | p)`.
    pub use_trigrams: bool,
    /// Capacidade do cache LRU do adivinhador.
    pub guess_cache_capacity: usize,
    pub min_suffix_length: usize,
    /// `None`: maior entrada do léxico de sufixos.
    pub max_suffix_length: Option<usize>,
    /// Aplica o re-etiquetador depois do Viterbi.
    pub retag: bool,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            beam_width: default_beam_width(),
            use_trigrams: false,
            guess_cache_capacity: DEFAULT_CACHE_CAPACITY,
            min_suffix_length: 1,
            max_suffix_length: None,
            retag: true,
        }
    }
}

impl TaggerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| PosError::io(path, e))?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = TaggerConfig::from_json_str(r#"{ "use_trigrams": true }"#).unwrap();
        assert!(config.use_trigrams);
        assert_eq!(config.guess_cache_capacity, 10_000);
        assert!((config.beam_width - 1000f64.ln()).abs() < 1e-12);
        assert!(config.retag);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = TaggerConfig::from_json_str("{ beam_width: }").unwrap_err();
        assert!(matches!(err, PosError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "max_suffix_length": 4, "retag": false }}"#).unwrap();
        let config = TaggerConfig::from_path(file.path()).unwrap();
        assert_eq!(config.max_suffix_length, Some(4));
        assert!(!config.retag);
    }
}
