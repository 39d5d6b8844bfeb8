//! Utilitários de caixa (maiúsculas/minúsculas) usados pelo léxico e pelo adivinhador.

/// Primeira letra maiúscula, restante como está.
pub fn upper_first(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
    }
}

/// Primeira letra maiúscula, restante em minúsculas ("NASA" → "Nasa").
pub fn capitalize(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().collect::<String>() + &c.as_str().to_lowercase(),
    }
}

/// O primeiro caractere é uma letra maiúscula.
pub fn is_capitalized(word: &str) -> bool {
    word.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
}

/// Existe ao menos uma letra maiúscula em qualquer posição.
pub fn has_capital(word: &str) -> bool {
    word.chars().any(char::is_uppercase)
}

/// Tem letras e todas elas são maiúsculas ("NASA", "U.S.").
pub fn is_all_caps(word: &str) -> bool {
    let mut letters = word.chars().filter(|c| c.is_alphabetic()).peekable();
    letters.peek().is_some() && letters.all(char::is_uppercase)
}

/// Termina em `s`/`S` (heurística de plural).
pub fn ends_with_s(word: &str) -> bool {
    word.ends_with('s') || word.ends_with('S')
}
