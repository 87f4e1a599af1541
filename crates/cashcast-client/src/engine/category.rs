//! Maps free-text categories onto the canonical category vocabulary.
//!
//! Rules run in a fixed order: English translation, then description
//! overrides (streaming, pharmacy, then transfer/invoice/investment
//! heuristics), then the `Sem categoria` fallback. Normalizing an already
//! normalized category with the same description returns it unchanged.

pub const DEFAULT_CATEGORY: &str = "Sem categoria";
pub const STREAMING: &str = "Streaming";
pub const PHARMACY: &str = "Farmácia";
pub const PIX_TRANSFER: &str = "Transferência PIX";
pub const INVOICE_PAYMENT: &str = "Pagamento de Fatura";
pub const INVESTMENTS: &str = "Investimentos";
pub const TRANSFER: &str = "Transferência";

const ENGLISH_CATEGORIES: [(&str, &str); 30] = [
    ("food", "Alimentação"),
    ("groceries", "Alimentação"),
    ("restaurants", "Alimentação"),
    ("restaurant", "Alimentação"),
    ("transport", "Transporte"),
    ("transportation", "Transporte"),
    ("housing", "Moradia"),
    ("rent", "Moradia"),
    ("health", "Saúde"),
    ("healthcare", "Saúde"),
    ("education", "Educação"),
    ("entertainment", "Lazer"),
    ("leisure", "Lazer"),
    ("shopping", "Compras"),
    ("services", "Serviços"),
    ("travel", "Viagem"),
    ("salary", "Salário"),
    ("income", "Salário"),
    ("taxes", "Impostos"),
    ("utilities", "Contas"),
    ("bills", "Contas"),
    ("subscriptions", STREAMING),
    ("streaming", STREAMING),
    ("pharmacy", PHARMACY),
    ("investments", INVESTMENTS),
    ("investment", INVESTMENTS),
    ("transfer", TRANSFER),
    ("transfers", TRANSFER),
    ("other", "Outros"),
    ("uncategorized", DEFAULT_CATEGORY),
];

const STREAMING_KEYWORDS: [&str; 14] = [
    "netflix",
    "spotify",
    "disney",
    "hbo max",
    "prime video",
    "amazon prime",
    "globoplay",
    "deezer",
    "youtube premium",
    "apple tv",
    "paramount",
    "crunchyroll",
    "star plus",
    "twitch",
];

const PHARMACY_KEYWORDS: [&str; 9] = [
    "farmacia",
    "drogaria",
    "drogasil",
    "droga raia",
    "raia",
    "pague menos",
    "panvel",
    "pacheco",
    "drogao",
];

const PIX_KEYWORDS: [&str; 1] = ["pix"];

const INVOICE_PAYMENT_KEYWORDS: [&str; 6] = [
    "pagamento de fatura",
    "pagamento fatura",
    "pgto fatura",
    "pagto fatura",
    "fatura cartao",
    "credit card payment",
];

const INVESTMENT_KEYWORDS: [&str; 8] = [
    "aplicacao",
    "resgate",
    "cdb",
    "lci",
    "lca",
    "tesouro direto",
    "investimento",
    "corretora",
];

const TRANSFER_KEYWORDS: [&str; 5] = ["ted", "doc", "transferencia", "transf", "transfer"];

/// Returns the canonical, never-empty category for `raw`.
pub fn normalize_category(raw: Option<&str>, description: Option<&str>) -> String {
    let translated = translate_category(raw.unwrap_or(""));

    if let Some(overridden) = description.and_then(description_override) {
        return overridden.to_string();
    }

    if translated.is_empty() {
        return DEFAULT_CATEGORY.to_string();
    }
    translated
}

fn translate_category(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let Some(folded) = fold_text(trimmed) else {
        return String::new();
    };
    for (english, canonical) in ENGLISH_CATEGORIES {
        if folded == english {
            return canonical.to_string();
        }
    }
    trimmed.to_string()
}

fn description_override(description: &str) -> Option<&'static str> {
    let folded = fold_text(description)?;
    let padded = format!(" {folded} ");

    if contains_any(&padded, &STREAMING_KEYWORDS) {
        return Some(STREAMING);
    }
    if contains_any(&padded, &PHARMACY_KEYWORDS) {
        return Some(PHARMACY);
    }
    if contains_any(&padded, &PIX_KEYWORDS) {
        return Some(PIX_TRANSFER);
    }
    if contains_any(&padded, &INVOICE_PAYMENT_KEYWORDS) {
        return Some(INVOICE_PAYMENT);
    }
    if contains_any(&padded, &INVESTMENT_KEYWORDS) {
        return Some(INVESTMENTS);
    }
    if contains_any(&padded, &TRANSFER_KEYWORDS) {
        return Some(TRANSFER);
    }
    None
}

fn contains_any(padded: &str, keywords: &[&str]) -> bool {
    keywords
        .iter()
        .any(|keyword| padded.contains(&format!(" {keyword} ")))
}

/// Lowercases, strips Portuguese accents and collapses every run of
/// non-alphanumeric characters into one space.
pub(crate) fn fold_text(value: &str) -> Option<String> {
    let mut output = String::new();
    let mut previous_space = false;
    for character in value.trim().chars().flat_map(char::to_lowercase) {
        let folded = fold_accent(character);
        if folded.is_ascii_alphanumeric() {
            output.push(folded);
            previous_space = false;
        } else if !previous_space {
            output.push(' ');
            previous_space = true;
        }
    }

    let normalized = output.trim().to_string();
    if normalized.is_empty() {
        return None;
    }
    Some(normalized)
}

fn fold_accent(character: char) -> char {
    match character {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DEFAULT_CATEGORY, INVESTMENTS, INVOICE_PAYMENT, PHARMACY, PIX_TRANSFER, STREAMING,
        fold_text, normalize_category,
    };

    #[test]
    fn english_tokens_translate_to_canonical_vocabulary() {
        assert_eq!(normalize_category(Some("Food"), None), "Alimentação");
        assert_eq!(normalize_category(Some("  transport "), None), "Transporte");
        assert_eq!(normalize_category(Some("uncategorized"), None), DEFAULT_CATEGORY);
    }

    #[test]
    fn unknown_custom_categories_pass_through_trimmed() {
        assert_eq!(normalize_category(Some("  Pets  "), None), "Pets");
    }

    #[test]
    fn empty_or_missing_category_falls_back_to_default() {
        assert_eq!(normalize_category(None, None), DEFAULT_CATEGORY);
        assert_eq!(normalize_category(Some("   "), Some("Padaria")), DEFAULT_CATEGORY);
    }

    #[test]
    fn pix_marker_forces_pix_transfer_regardless_of_category() {
        assert_eq!(
            normalize_category(Some("Food"), Some("PIX ENVIADO - Maria")),
            PIX_TRANSFER
        );
        assert_eq!(
            normalize_category(Some("Alimentação"), Some("Pix recebido")),
            PIX_TRANSFER
        );
    }

    #[test]
    fn streaming_wins_over_later_rules() {
        assert_eq!(
            normalize_category(Some("Shopping"), Some("PIX NETFLIX.COM")),
            STREAMING
        );
        assert_eq!(
            normalize_category(None, Some("Spotify pagamento de fatura")),
            STREAMING
        );
    }

    #[test]
    fn pharmacy_wins_over_transfer_heuristics() {
        assert_eq!(
            normalize_category(Some("Health"), Some("DROGARIA SAO PAULO pix")),
            PHARMACY
        );
        assert_eq!(normalize_category(None, Some("Farmácia Popular")), PHARMACY);
    }

    #[test]
    fn invoice_and_investment_heuristics_apply_on_word_boundaries() {
        assert_eq!(
            normalize_category(None, Some("Pagamento de Fatura - Nubank")),
            INVOICE_PAYMENT
        );
        assert_eq!(
            normalize_category(Some("Other"), Some("Aplicação CDB 110%")),
            INVESTMENTS
        );
        // "pixel" must not match the PIX marker.
        assert_eq!(normalize_category(Some("Shopping"), Some("Google Pixel")), "Compras");
    }

    #[test]
    fn normalization_is_idempotent() {
        let cases = [
            (Some("Food"), Some("Mercado Extra")),
            (Some("Pets"), None),
            (None, Some("PIX para João")),
            (Some("health"), Some("Droga Raia")),
            (None, None),
        ];
        for (raw, description) in cases {
            let once = normalize_category(raw, description);
            let twice = normalize_category(Some(&once), description);
            assert_eq!(once, twice);
            assert!(!once.is_empty());
        }
    }

    #[test]
    fn fold_text_strips_accents_and_punctuation() {
        assert_eq!(
            fold_text("  Transferência--PIX!! "),
            Some("transferencia pix".to_string())
        );
        assert_eq!(fold_text("***"), None);
    }
}
