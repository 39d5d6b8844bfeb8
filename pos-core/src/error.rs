//! # Erros e Diagnósticos de Carga
//!
//! Dois tipos de problema aparecem ao carregar recursos do etiquetador:
//!
//! | Tipo                          | Tratamento                                      |
//! |-------------------------------|-------------------------------------------------|
//! | Falha de I/O, catálogo ou regra inválida | [`PosError`] propagado ao chamador   |
//! | Linha malformada em léxico/matriz        | linha pulada e registrada em [`LoadReport`] |
//!
//! Uma linha ruim em um léxico com centenas de milhares de entradas não deve
//! abortar a carga, mas também não pode sumir em silêncio: o chamador sempre
//! consegue perguntar quantas linhas foram descartadas.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// `Result` do crate, com [`PosError`] como erro padrão.
pub type Result<T, E = PosError> = std::result::Result<T, E>;

/// Erros que podem ocorrer ao montar ou carregar os recursos do etiquetador.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PosError {
    /// Falha de leitura/escrita em um arquivo de recurso.
    #[error("erro de I/O em {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Falha de I/O em um leitor/escritor sem caminho associado.
    #[error(transparent)]
    Stream(#[from] std::io::Error),

    /// Linha do catálogo de tags com número de campos incorreto.
    #[error("linha {line} do catálogo de tags inválida: {content:?}")]
    InvalidCatalogLine { line: usize, content: String },

    /// Papel gramatical desconhecido no catálogo.
    #[error("papel de tag desconhecido: `{0}`")]
    UnknownRole(String),

    /// Regra de re-etiquetagem que não pôde ser interpretada.
    #[error("regra de re-etiquetagem inválida na linha {line}: {content:?}")]
    InvalidRule { line: usize, content: String },

    /// Configuração JSON inválida.
    #[error("configuração inválida: {0}")]
    Config(#[from] serde_json::Error),
}

impl PosError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PosError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Relatório de uma carga tolerante a falhas (léxicos, matriz de transição).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Linhas lidas (incluindo as puladas e as em branco).
    pub lines_read: usize,
    /// Linhas com campos insuficientes, ignoradas por inteiro.
    pub short_lines: usize,
    /// Números (base 1) das linhas com dados malformados.
    pub malformed_lines: Vec<usize>,
}

impl LoadReport {
    /// Total de linhas que não foram aproveitadas integralmente.
    pub fn skipped_lines(&self) -> usize {
        self.short_lines + self.malformed_lines.len()
    }

    /// `true` se nenhuma linha foi descartada.
    pub fn is_clean(&self) -> bool {
        self.skipped_lines() == 0
    }

    pub(crate) fn record_malformed(&mut self, line: usize, source: &str, content: &str) {
        tracing::warn!(line, source, content, "linha malformada ignorada");
        self.malformed_lines.push(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts_skipped_lines() {
        let mut report = LoadReport::default();
        assert!(report.is_clean());

        report.short_lines = 2;
        report.record_malformed(7, "teste", "x\t1\tNN");
        assert_eq!(report.skipped_lines(), 3);
        assert_eq!(report.malformed_lines, vec![7]);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_io_error_mentions_path() {
        let err = PosError::io(
            "/tmp/nao-existe.lex",
            std::io::Error::new(std::io::ErrorKind::NotFound, "sumiu"),
        );
        let message = err.to_string();
        assert!(message.contains("nao-existe.lex"));
    }
}
