//! Deterministic local extraction.
//!
//! Pure, synchronous pattern matching over page text and HTML source:
//! tax identifiers (INN, 10 or 12 digits), contact emails, and a legal
//! entity name for registry lookups.
//!
//! A digit run of the right length is necessary but not sufficient. The
//! match must sit next to a registry-context cue (a tax-ID label or a
//! legal-form marker), and its surrounding window must be free of
//! analytics/session markers. Both checks run over a lowercased window of
//! text around the match.

use regex::Regex;
use std::sync::LazyLock;

/// Registry-context cues; at least one must appear near a digit run.
const CONTEXT_CUES: &[&str] = &[
    "инн",
    "огрн",
    "кпп",
    "реквизит",
    "юридическ",
    "ооо",
    "зао",
    "оао",
    "пао",
    "ип ",
    "inn",
    "ogrn",
    "tax",
    "registration",
];

/// Tracking/session markers; any one near a digit run rejects the match.
const FALSE_POSITIVE_MARKERS: &[&str] = &[
    "metrika",
    "metrica",
    "ym(",
    "gtag",
    "ga(",
    "google-analytics",
    "googletagmanager",
    "gtm-",
    "analytics",
    "counter",
    "roistat",
    "bitrix",
    "session",
    "csrf",
    "clientid",
    "client_id",
];

/// Half-width (bytes) of the cue/marker inspection window.
const WINDOW_BYTES: usize = 80;

/// Half-width (bytes) of the stored proof snippet.
const SNIPPET_BYTES: usize = 50;

static RE_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9][A-Za-z0-9._%+-]*@[A-Za-z0-9][A-Za-z0-9.-]*\.[A-Za-z]{2,}").unwrap()
});

static RE_LEGAL_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(ООО|ОАО|ЗАО|ПАО|АО|ИП)\s*[«"„']([^»"„“”']{2,80})[»"“”']"#).unwrap()
});

/// Email suffixes that mark asset filenames, not addresses.
const EMAIL_SKIP_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".css", ".js"];

/// Email domains that mark placeholders and error trackers.
const EMAIL_SKIP_DOMAINS: &[&str] = &["example.", "sentry", "wixpress", "yourdomain", "domain.com"];

/// One accepted identifier match with its evidence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnMatch {
    /// The digit sequence itself
    pub value: String,
    /// ~50-100 chars of surrounding text, for the proof record
    pub context: String,
    /// Whether the INN control digits verify (confidence signal only)
    pub checksum_ok: bool,
}

/// Find tax-identifier candidates in `text`, in document order.
///
/// Applies the full accept filter: length, context-cue adjacency, and
/// false-positive screening. Returned matches are deduplicated by value.
pub fn find_inn(text: &str) -> Vec<InnMatch> {
    let mut matches = Vec::new();

    for (start, end) in digit_runs(text) {
        let len = end - start;
        if len != 10 && len != 12 {
            continue;
        }

        let window = slice_around(text, start, end, WINDOW_BYTES).to_lowercase();
        if !CONTEXT_CUES.iter().any(|cue| window.contains(cue)) {
            continue;
        }
        if FALSE_POSITIVE_MARKERS.iter().any(|m| window.contains(m)) {
            continue;
        }

        let value = text[start..end].to_string();
        if matches.iter().any(|m: &InnMatch| m.value == value) {
            continue;
        }

        let checksum_ok = inn_checksum_ok(&value);
        matches.push(InnMatch {
            context: slice_around(text, start, end, SNIPPET_BYTES).to_string(),
            value,
            checksum_ok,
        });
    }

    matches
}

/// Pick the strongest candidate: first checksum-verified match, else the
/// first match overall.
pub fn best_inn(matches: &[InnMatch]) -> Option<&InnMatch> {
    matches
        .iter()
        .find(|m| m.checksum_ok)
        .or_else(|| matches.first())
}

/// Verify the INN control-digit algorithm for 10- or 12-digit values.
pub fn inn_checksum_ok(inn: &str) -> bool {
    let digits: Vec<u32> = inn.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != inn.len() {
        return false;
    }

    match digits.len() {
        10 => control_digit(&digits[..9], &[2, 4, 10, 3, 5, 9, 4, 6, 8]) == digits[9],
        12 => {
            control_digit(&digits[..10], &[7, 2, 4, 10, 3, 5, 9, 4, 6, 8]) == digits[10]
                && control_digit(&digits[..11], &[3, 7, 2, 4, 10, 3, 5, 9, 4, 6, 8]) == digits[11]
        }
        _ => false,
    }
}

fn control_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    (sum % 11) % 10
}

/// Find contact emails, lowercased and deduplicated, in document order.
pub fn find_emails(text: &str) -> Vec<String> {
    let mut emails = Vec::new();
    for m in RE_EMAIL.find_iter(text) {
        let email = m.as_str().to_lowercase();
        if EMAIL_SKIP_SUFFIXES.iter().any(|s| email.ends_with(s)) {
            continue;
        }
        if EMAIL_SKIP_DOMAINS.iter().any(|d| email.contains(d)) {
            continue;
        }
        if !emails.contains(&email) {
            emails.push(email);
        }
    }
    emails
}

/// Extract a legal-entity name like `ООО «Ромашка»` for registry lookup.
pub fn extract_company_name(text: &str) -> Option<String> {
    RE_LEGAL_NAME.captures(text).map(|cap| {
        format!(
            "{} {}",
            cap[1].to_uppercase(),
            cap[2].trim().trim_matches('"')
        )
    })
}

/// Maximal ASCII digit runs in `text`, as byte ranges.
fn digit_runs(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;

    for (i, b) in bytes.iter().enumerate() {
        match (b.is_ascii_digit(), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push((s, bytes.len()));
    }
    runs
}

/// Slice `text` expanded `pad` bytes on each side of `[start, end)`,
/// snapped inward to char boundaries (page text is mostly Cyrillic).
fn slice_around(text: &str, start: usize, end: usize, pad: usize) -> &str {
    let mut lo = start.saturating_sub(pad);
    while !text.is_char_boundary(lo) {
        lo -= 1;
    }
    let mut hi = (end + pad).min(text.len());
    while !text.is_char_boundary(hi) {
        hi += 1;
    }
    &text[lo..hi]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footer_inn_with_label_is_accepted() {
        let text = "ООО «Ромашка» ИНН 7707083893 ОГРН 1027700132195";
        let matches = find_inn(text);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].value, "7707083893");
        assert!(matches[0].checksum_ok);
        assert!(matches[0].context.contains("ИНН"));
    }

    #[test]
    fn twelve_digit_inn_is_accepted() {
        let text = "ИП Иванов, ИНН 500100732259";
        let matches = find_inn(text);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].value, "500100732259");
        assert!(matches[0].checksum_ok);
    }

    #[test]
    fn tracking_context_is_rejected() {
        // Valid length, valid checksum, but lives in an analytics call.
        let text = "ym(7707083893, 'init', {clickmap:true});";
        assert!(find_inn(text).is_empty());

        let text = "gtag('config', 'counter-7707083893');";
        assert!(find_inn(text).is_empty());
    }

    #[test]
    fn digits_without_registry_cue_are_rejected() {
        let text = "Позвоните нам: 4951234567 с 9 до 18";
        assert!(find_inn(text).is_empty());
    }

    #[test]
    fn cue_next_to_tracking_marker_still_rejects() {
        // The fatal marker wins even when a cue co-occurs in the window.
        let text = "ИНН counter ym( 7707083893";
        assert!(find_inn(text).is_empty());
    }

    #[test]
    fn eleven_digit_runs_are_ignored() {
        let text = "ИНН 77070838931 указан с опечаткой";
        assert!(find_inn(text).is_empty());
    }

    #[test]
    fn checksum_distinguishes_real_from_fabricated() {
        assert!(inn_checksum_ok("7707083893"));
        assert!(inn_checksum_ok("500100732259"));
        assert!(!inn_checksum_ok("7712345678"));
        assert!(!inn_checksum_ok("123"));
        assert!(!inn_checksum_ok("77070838ab"));
    }

    #[test]
    fn checksum_failure_does_not_reject_a_cued_match() {
        // Context adjacency is authoritative; the checksum only grades.
        let text = "Реквизиты: ИНН 7712345678, КПП 771201001";
        let matches = find_inn(text);
        assert_eq!(matches.len(), 1);
        assert!(!matches[0].checksum_ok);
    }

    #[test]
    fn best_inn_prefers_checksum_verified() {
        let matches = vec![
            InnMatch {
                value: "7712345678".into(),
                context: String::new(),
                checksum_ok: false,
            },
            InnMatch {
                value: "7707083893".into(),
                context: String::new(),
                checksum_ok: true,
            },
        ];
        assert_eq!(best_inn(&matches).unwrap().value, "7707083893");
    }

    #[test]
    fn emails_extracted_and_filtered() {
        let text = "Пишите: Sales@Romashka.RU или info@romashka.ru. \
                    Логотип: logo@2x.png, трекинг: abc@sentry.io";
        assert_eq!(
            find_emails(text),
            vec!["sales@romashka.ru".to_string(), "info@romashka.ru".to_string()]
        );
    }

    #[test]
    fn company_name_extracted_from_legal_form() {
        let text = "© 2024 ООО «Ромашка Плюс». Все права защищены.";
        assert_eq!(
            extract_company_name(text).as_deref(),
            Some("ООО Ромашка Плюс")
        );
        assert_eq!(extract_company_name("Просто текст"), None);
    }

    #[test]
    fn snippet_respects_multibyte_boundaries() {
        // Digit run surrounded by Cyrillic; window edges must not split chars.
        let text = "ааааааааааааааааааааааааааааааааааааааа ИНН 7707083893 ббб";
        let matches = find_inn(text);
        assert_eq!(matches.len(), 1);
        assert!(matches[0].context.contains("7707083893"));
    }
}
