//! Field extraction from raw recognized text.
//!
//! Converts the recognition output into a validated name/phone record using
//! priority-ordered pattern cascades. Within each cascade the first candidate
//! that passes validation wins and later patterns are not tried. Extraction
//! is a pure function of its input and never fails: malformed or absent
//! matches simply leave the corresponding field unset.

use regex::Regex;
use std::sync::OnceLock;

/// Which intake field a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Name,
    Phone,
}

/// The 0-2 field structured result of one extraction pass. Created fresh per
/// processed frame; merging across frames is the orchestrator's business.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateRecord {
    /// Normalized (whitespace-collapsed, title-cased) full name.
    pub name: Option<String>,
    /// Bare phone digits, 10 or 11 of them.
    pub phone: Option<String>,
}

impl CandidateRecord {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none()
    }
}

/// Uppercase/lowercase letter classes including the Portuguese accented
/// letters Tesseract produces for this workload.
const UPPER: &str = "A-ZÁÀÂÃÉÊÍÓÔÕÚÇ";
const LOWER: &str = "a-záàâãéêíóôõúç";

/// Words that disqualify a name candidate: field labels (including the
/// truncated forms OCR produces for them), document vocabulary, connectives
/// and boilerplate closings.
const DENY_WORDS: &[&str] = &[
    // Field labels
    "nome", "name", "telefone", "tel", "tell", "celular", "fone", "lefone", "elefone", "one",
    "whats", "whatsapp", "cliente", "client", "person", "pessoa", "contato", "contact",
    // Technical vocabulary
    "cpf", "rg", "cep", "endereco", "email", "data", "nascimento", "profissao", "cargo",
    "empresa", "trabalho", "app",
    // Document vocabulary
    "documento", "registro", "numero", "codigo", "protocolo", "servico", "produto", "valor",
    "preco", "total", "arquivo", "rquivo", "quivo", "editar", "formatar", "exibir", "h1", "h2",
    "h3", "título", "subtítulo",
    // Connectives and prepositions
    "para", "com", "sem", "por", "em", "da", "do", "dos", "das", "me",
    // Closings
    "favor", "obrigado", "atenciosamente", "cordialmente",
];

/// Minimum length of a plausible name after whitespace normalization.
const MIN_NAME_LEN: usize = 5;

/// Minimum number of words in a plausible name.
const MIN_NAME_WORDS: usize = 2;

/// Name patterns in priority order: labeled value, line-initial capitalized
/// run, capitalized run anywhere, all-uppercase run (lowest confidence).
fn name_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            Regex::new(&format!(
                r"(?i)(?:nome|name|client|cliente)\s*:?\s*([{UPPER}{LOWER}\s]{{3,50}})"
            ))
            .unwrap(),
            Regex::new(&format!(
                r"(?m)^([{UPPER}][{LOWER}]+(?:\s+[{UPPER}][{LOWER}]+)+.*?)(?:\s*\d|\s*$)"
            ))
            .unwrap(),
            Regex::new(&format!(
                r"([{UPPER}][{LOWER}]{{2,}}(?:\s+[{UPPER}][{LOWER}]{{2,}})+)"
            ))
            .unwrap(),
            Regex::new(&format!(r"([{UPPER}]{{3,}}(?:\s+[{UPPER}]{{3,}})+)")).unwrap(),
        ]
    })
}

/// Phone patterns in priority order: labeled digits, parenthesized area
/// code, space-separated area code, 11 bare digits, 10 bare digits,
/// separator-grouped digits.
fn phone_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"(?i)(?:tel|telefone|celular|fone|whats)\s*:?\s*([\(\)\d\s\-\.]{8,15})")
                .unwrap(),
            Regex::new(r"(\(\d{2}\)\s*\d{4,5}[\s\-]*\d{4})").unwrap(),
            Regex::new(r"(\d{2}\s+\d{4,5}[\s\-]+\d{4})").unwrap(),
            Regex::new(r"(\d{11})").unwrap(),
            Regex::new(r"(\d{10})").unwrap(),
            Regex::new(r"(\d{2}[\s\-\.]+\d{4,5}[\s\-\.]+\d{4})").unwrap(),
        ]
    })
}

fn digit_run_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d{3,}").unwrap())
}

fn uppercase_run_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // 8+ consecutive uppercase letters without spaces is an OCR-noise
    // signature, not a real name.
    PATTERN.get_or_init(|| Regex::new(&format!(r"[{UPPER}]{{8,}}")).unwrap())
}

/// Extracts a candidate record from recognized text. Both fields are looked
/// for independently; the record may contain one, both, or neither.
pub fn extract_record(text: &str) -> CandidateRecord {
    let text = text.trim();
    if text.chars().count() < 2 {
        return CandidateRecord::default();
    }

    CandidateRecord {
        name: extract_name(text),
        phone: extract_phone(text),
    }
}

/// Runs the name cascade; the first validated candidate wins.
fn extract_name(text: &str) -> Option<String> {
    for pattern in name_patterns() {
        for caps in pattern.captures_iter(text) {
            let candidate = caps[1].trim();
            if is_valid_name(candidate) {
                return Some(normalize_name(candidate));
            }
        }
    }
    None
}

/// Runs the phone cascade; the first candidate with a plausible digit count
/// wins.
fn extract_phone(text: &str) -> Option<String> {
    for pattern in phone_patterns() {
        for caps in pattern.captures_iter(text) {
            if let Some(digits) = phone_digits(&caps[1]) {
                return Some(digits);
            }
        }
    }
    None
}

/// Strips non-digit characters and accepts only 10 or 11 digit results
/// (Brazilian landline/mobile convention).
fn phone_digits(candidate: &str) -> Option<String> {
    let digits: String = candidate.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 10 || digits.len() == 11 {
        Some(digits)
    } else {
        None
    }
}

/// Heuristic validation of a name candidate.
fn is_valid_name(candidate: &str) -> bool {
    let normalized = candidate.split_whitespace().collect::<Vec<_>>().join(" ");
    let words: Vec<&str> = normalized.split_whitespace().collect();

    if normalized.chars().count() < MIN_NAME_LEN || words.len() < MIN_NAME_WORDS {
        return false;
    }

    if digit_run_pattern().is_match(&normalized) {
        return false;
    }

    for word in &words {
        let clean: String = word
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        if DENY_WORDS.contains(&clean.as_str()) {
            return false;
        }
    }

    if words.iter().any(|w| w.chars().count() < 2) {
        return false;
    }

    if !normalized.chars().any(|c| c.is_alphabetic()) {
        return false;
    }

    if uppercase_run_pattern().is_match(&normalized) {
        return false;
    }

    true
}

/// Whitespace-collapses and title-cases an accepted candidate. Idempotent.
fn normalize_name(candidate: &str) -> String {
    candidate
        .split_whitespace()
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_after_label() {
        let record = extract_record("Nome: Maria Santos");
        assert_eq!(record.name.as_deref(), Some("Maria Santos"));
    }

    #[test]
    fn test_name_label_case_insensitive() {
        let record = extract_record("NOME: ANA PAULA");
        assert_eq!(record.name.as_deref(), Some("Ana Paula"));
    }

    #[test]
    fn test_name_line_initial_capitalized_run() {
        let record = extract_record("Carlos Eduardo Lima\nrua das flores");
        assert_eq!(record.name.as_deref(), Some("Carlos Eduardo Lima"));
    }

    #[test]
    fn test_name_capitalized_run_mid_text() {
        let record = extract_record("agendado para Pedro Alves amanha");
        assert_eq!(record.name.as_deref(), Some("Pedro Alves"));
    }

    #[test]
    fn test_name_all_uppercase_fallback() {
        let record = extract_record("JOÃO PEDRO SOUZA");
        assert_eq!(record.name.as_deref(), Some("João Pedro Souza"));
    }

    #[test]
    fn test_name_deny_list_rejects_labels() {
        assert_eq!(extract_record("Nome Cliente").name, None);
        assert_eq!(extract_record("Telefone Casa").name, None);
    }

    #[test]
    fn test_deny_list_total_over_casing_and_punctuation() {
        assert!(!is_valid_name("Maria Obrigado"));
        assert!(!is_valid_name("Maria OBRIGADO!"));
        assert!(!is_valid_name("maria obrigado,"));
    }

    #[test]
    fn test_validation_rejects_digit_runs() {
        assert!(!is_valid_name("Ana 1234 Silva"));
    }

    #[test]
    fn test_validation_rejects_short_words() {
        assert!(!is_valid_name("Ana B Silva"));
    }

    #[test]
    fn test_validation_rejects_single_word_and_short() {
        assert!(!is_valid_name("Ana"));
        assert!(!is_valid_name("J Li"));
    }

    #[test]
    fn test_validation_rejects_uppercase_noise() {
        assert!(!is_valid_name("ABCDEFGHIJ Silva"));
    }

    #[test]
    fn test_validation_requires_alphabetic() {
        assert!(!is_valid_name("12 34"));
    }

    #[test]
    fn test_validation_accepts_plain_name() {
        assert!(is_valid_name("Ana Silva"));
        assert!(is_valid_name("joão pereira"));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let once = normalize_name("  JOÃO   pedro  SOUZA ");
        let twice = normalize_name(&once);
        assert_eq!(once, "João Pedro Souza");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_phone_labeled() {
        let record = extract_record("Tel: (11) 98765-4321");
        assert_eq!(record.phone.as_deref(), Some("11987654321"));
    }

    #[test]
    fn test_phone_too_few_digits_rejected() {
        let record = extract_record("Tel: 123-456");
        assert_eq!(record.phone, None);
    }

    #[test]
    fn test_phone_parenthesized_without_label() {
        let record = extract_record("ligar para (21) 3456-7890 hoje");
        assert_eq!(record.phone.as_deref(), Some("2134567890"));
    }

    #[test]
    fn test_phone_bare_digit_runs() {
        assert_eq!(
            extract_record("11987654321").phone.as_deref(),
            Some("11987654321")
        );
        assert_eq!(
            extract_record("2134567890").phone.as_deref(),
            Some("2134567890")
        );
    }

    #[test]
    fn test_phone_digit_count_rule() {
        assert_eq!(phone_digits("(11) 98765-4321").as_deref(), Some("11987654321"));
        assert_eq!(phone_digits("(21) 3456-7890").as_deref(), Some("2134567890"));
        // 9 and 12 digit candidates are rejected outright.
        assert_eq!(phone_digits("987-654-321"), None);
        assert_eq!(phone_digits("1234-5678-9012"), None);
    }

    #[test]
    fn test_extract_both_fields() {
        let record = extract_record("JOÃO PEDRO SOUZA\nTelefone: (21) 99876-5432");
        assert_eq!(record.name.as_deref(), Some("João Pedro Souza"));
        assert_eq!(record.phone.as_deref(), Some("21998765432"));
    }

    #[test]
    fn test_extract_nothing_from_noise() {
        let record = extract_record("x7 #@! 99");
        assert!(record.is_empty());
    }

    #[test]
    fn test_extract_empty_input() {
        assert!(extract_record("").is_empty());
        assert!(extract_record("  \n ").is_empty());
    }
}
