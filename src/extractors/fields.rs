// src/extractors/fields.rs

// --- Imports ---
use crate::extractors::date::{parse_date, ParsedDate};
use crate::extractors::reason::{ReasonCategorizer, ReasonType};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

// --- Labels ---
// Labels recognised inside report descriptions. Anything else is skipped.
const LABEL_ISSUE: &str = "銘柄";
const LABEL_RATIO: &str = "割合";
const LABEL_OBLIGATION_DATE: &str = "報告義務発生日";
const LABEL_REASON: &str = "提出事由";
const LABEL_PURPOSE: &str = "保有目的";

// Opening bracket of a label; a value runs up to the next one.
const LABEL_OPEN: char = '【';

// --- Regex Patterns (Lazy Static) ---
static LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)【(.*?)】").expect("Failed to compile LABEL_RE"));

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Failed to compile WHITESPACE_RE"));

// Markup that survives entity decoding, e.g. "&lt;br&gt;" in a doubly-escaped feed
static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]+>").expect("Failed to compile TAG_RE"));

static TICKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([0-9]{4})\]").expect("Failed to compile TICKER_RE"));

static PERCENTAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+\.[0-9]+)%").expect("Failed to compile PERCENTAGE_RE"));

// Percentage-change rules, most specific first. The bare form must stay last.
static CHANGE_RULES: Lazy<Vec<(Regex, ChangeDirection)>> = Lazy::new(|| {
    [
        (r"([0-9.]+)pt↑", ChangeDirection::Increase),
        (r"([0-9.]+)pt↓", ChangeDirection::Decrease),
        // A delta/triangle prefix marks a decrease in these reports
        (r"[Δ△▲]([0-9.]+)pt", ChangeDirection::Decrease),
        (r"([0-9.]+)pt", ChangeDirection::Unknown),
    ]
    .into_iter()
    .map(|(pat, direction)| {
        (
            Regex::new(pat).expect("Failed to compile change pattern"),
            direction,
        )
    })
    .collect()
});

// --- Data Structures ---

/// Direction of a holding-ratio change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangeDirection {
    Increase,
    Decrease,
    /// No directional marker, or no change figure at all.
    #[default]
    Unknown,
}

impl ChangeDirection {
    pub fn code(self) -> i64 {
        match self {
            ChangeDirection::Increase => 1,
            ChangeDirection::Decrease => -1,
            ChangeDirection::Unknown => 0,
        }
    }

    /// Short human-readable marker stored in `change_flag`.
    pub fn flag(self) -> Option<&'static str> {
        match self {
            ChangeDirection::Increase => Some("増"),
            ChangeDirection::Decrease => Some("減"),
            ChangeDirection::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PercentageChange {
    pub raw: Option<String>,   // matched token, e.g. "1.02pt↑"
    pub value: Option<f64>,    // magnitude in percentage points
    pub direction: ChangeDirection,
}

/// Everything pulled out of one report description.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportFields {
    pub ticker: Option<String>,
    pub company: Option<String>,
    pub percentage: Option<f64>,
    pub change: PercentageChange,
    pub report_date: Option<String>,
    pub report_date_parsed: Option<ParsedDate>,
    pub reason: Option<String>,
    pub reason_type: ReasonType,
    pub purpose: Option<String>,
}

// --- Extractor ---
#[derive(Debug, Clone, Default)]
pub struct FieldExtractor {
    categorizer: ReasonCategorizer,
}

impl FieldExtractor {
    pub fn new() -> Self {
        Self {
            categorizer: ReasonCategorizer::new(),
        }
    }

    /// Extracts report fields from an entry description that may still carry
    /// HTML markup and entities.
    pub fn extract(&self, description: &str) -> ReportFields {
        let text = clean_description(description);
        self.extract_text(&text)
    }

    /// Extracts report fields from plain `【label】value` text.
    pub fn extract_text(&self, text: &str) -> ReportFields {
        let mut fields = ReportFields::default();

        for (label, value) in label_segments(text) {
            let value = collapse_whitespace(value);
            match label.as_str() {
                LABEL_ISSUE => {
                    fields.ticker = extract_ticker(&value);
                    fields.company = extract_company(&value);
                }
                LABEL_RATIO => {
                    fields.percentage = extract_percentage(&value);
                    fields.change = extract_percentage_change(&value);
                }
                LABEL_OBLIGATION_DATE => {
                    fields.report_date_parsed = parse_date(&value);
                    fields.report_date = Some(value);
                }
                LABEL_REASON => {
                    fields.reason_type = self.categorizer.categorize(&value);
                    fields.reason = Some(value);
                }
                LABEL_PURPOSE => {
                    fields.purpose = Some(value);
                }
                other => {
                    tracing::trace!("Ignoring label '{}'", other);
                }
            }
        }

        fields
    }
}

// --- Helpers ---

/// Decodes HTML entities and drops tags, leaving plain text.
pub fn clean_description(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    let text: String = fragment.root_element().text().collect();
    TAG_RE.replace_all(&text, "").into_owned()
}

/// Splits text into `(label, raw value)` pairs. A value ends at the next `【`,
/// even if that bracket is never closed.
fn label_segments(text: &str) -> Vec<(String, &str)> {
    let mut segments = Vec::new();
    let mut pos = 0;

    while let Some(caps) = LABEL_RE.captures_at(text, pos) {
        let (Some(whole), Some(label)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let value_start = whole.end();
        let value_end = text[value_start..]
            .find(LABEL_OPEN)
            .map(|offset| value_start + offset)
            .unwrap_or(text.len());

        segments.push((label.as_str().to_string(), &text[value_start..value_end]));

        if value_end >= text.len() {
            break;
        }
        pos = value_end;
    }

    segments
}

fn collapse_whitespace(value: &str) -> String {
    WHITESPACE_RE.replace_all(value, " ").trim().to_string()
}

/// Four-digit security code written as `[1234]`.
pub fn extract_ticker(text: &str) -> Option<String> {
    TICKER_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Issuer name following the bracketed code.
pub fn extract_company(text: &str) -> Option<String> {
    let close = text.find(']')?;
    let name = text[close + 1..].trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

pub fn extract_percentage(text: &str) -> Option<f64> {
    PERCENTAGE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Change in holding ratio, e.g. `1.02pt↑`, `2.03pt↓`, `Δ28.74pt` or `5.00pt`.
///
/// Within a rule the first figure that parses as a number wins; a lone `.`
/// is skipped. When a rule has no usable figure the next rule is tried.
pub fn extract_percentage_change(text: &str) -> PercentageChange {
    for (re, direction) in CHANGE_RULES.iter() {
        let hit = re.captures_iter(text).find_map(|caps| {
            let whole = caps.get(0)?;
            let value = caps.get(1)?.as_str().parse::<f64>().ok()?;
            Some((whole.as_str().to_string(), value))
        });
        if let Some((raw, value)) = hit {
            return PercentageChange {
                raw: Some(raw),
                value: Some(value),
                direction: *direction,
            };
        }
    }
    PercentageChange::default()
}
