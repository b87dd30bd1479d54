use once_cell::sync::Lazy;
use regex::Regex;

/// Legal-entity prefixes that get their company name quoted.
const LEGAL_ENTITY_ABBREVIATIONS: [&str; 8] =
    ["ООО", "ОАО", "ИП", "ЗАО", "ПАО", "НПАО", "ГУП", "МУП"];

static LEADING_TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^(\S+)\s+(.+)$").unwrap());

/// Rewrites `ООО Ромашка` as `ООО "Ромашка"`.
///
/// Names without a known prefix, a bare prefix, and names whose remainder is
/// already quoted come back unchanged (trimmed).
pub fn normalize_company_name(name: &str) -> String {
    let name = name.trim();

    let Some(captures) = LEADING_TOKEN_PATTERN.captures(name) else {
        return name.to_string();
    };

    let abbreviation = &captures[1];
    let rest = captures[2].trim();

    if !LEGAL_ENTITY_ABBREVIATIONS.contains(&abbreviation)
        || rest.starts_with('"')
        || rest.starts_with('«')
    {
        return name.to_string();
    }

    format!("{} \"{}\"", abbreviation, rest)
}
