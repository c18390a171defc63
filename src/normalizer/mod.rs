//! Trade record normalization
//!
//! Maps raw, loosely-typed journal records onto the canonical [`Trade`]
//! entity. The source schema is user-customizable, so every canonical field
//! is located by scanning an ordered candidate-substring list combined with a
//! required value kind; nothing here ever fails — a field that cannot be
//! resolved is simply absent on the produced trade.


use crate::types::{classify_outcome, FieldKind, FieldValue, Grade, Outcome, RawRecord, Trade};
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// One way to locate a canonical field in the source schema
struct FieldSpec {
    /// Candidate substrings matched case-insensitively against field names
    candidates: &'static [&'static str],
    /// Required declared kind of the source field
    kind: FieldKind,
}

const fn spec(candidates: &'static [&'static str], kind: FieldKind) -> FieldSpec {
    FieldSpec { candidates, kind }
}

// Mapping table: canonical field -> ordered resolution attempts.
// New source schemas are supported by adding candidates, not code.
const DATE_SPECS: &[FieldSpec] = &[spec(&["date", "traded", "entry", "opened"], FieldKind::Date)];
const PAIR_SPECS: &[FieldSpec] = &[
    spec(&["pair", "symbol", "instrument", "market"], FieldKind::Select),
    spec(&["pair", "symbol", "instrument", "market"], FieldKind::Text),
];
const DIRECTION_SPECS: &[FieldSpec] = &[spec(&["direction", "side", "bias"], FieldKind::Select)];
const OUTCOME_SPECS: &[FieldSpec] = &[spec(&["outcome", "result"], FieldKind::Select)];
const R_MULTIPLE_SPECS: &[FieldSpec] = &[
    spec(&["multiple"], FieldKind::Number),
    spec(&["r multiple"], FieldKind::Number),
    spec(&["r-multiple"], FieldKind::Number),
    spec(&["rr", "r:r"], FieldKind::Number),
];
const GRADE_SPECS: &[FieldSpec] = &[spec(&["grade", "rating", "quality"], FieldKind::Select)];
const SESSION_SPECS: &[FieldSpec] = &[spec(&["session"], FieldKind::Select)];
const TIMEFRAME_SPECS: &[FieldSpec] = &[
    spec(&["entry time", "entry tf"], FieldKind::Select),
    spec(&["timeframe", "tf"], FieldKind::Select),
];
const COMMENT_SPECS: &[FieldSpec] = &[
    spec(&["comment"], FieldKind::Text),
    spec(&["note", "review"], FieldKind::Text),
];
const CONFLUENCE_SPECS: &[FieldSpec] = &[
    spec(&["ltf"], FieldKind::MultiSelect),
    spec(&["confluence", "tags", "setup"], FieldKind::MultiSelect),
];
const IMAGE_SPECS: &[FieldSpec] = &[
    spec(&["files"], FieldKind::Files),
    spec(&["chart", "image", "screenshot"], FieldKind::Files),
];

/// First source field whose name contains any candidate substring and whose
/// declared kind matches; specs are tried in order
fn resolve<'a>(record: &'a RawRecord, specs: &[FieldSpec]) -> Option<&'a FieldValue> {
    for spec in specs {
        let found = record.fields.iter().find(|f| {
            f.value.kind() == spec.kind && {
                let name = f.name.to_lowercase();
                spec.candidates.iter().any(|c| name.contains(c))
            }
        });
        if let Some(field) = found {
            return Some(&field.value);
        }
    }
    None
}

fn select_value(record: &RawRecord, specs: &[FieldSpec]) -> Option<String> {
    match resolve(record, specs)? {
        FieldValue::Select(label) => Some(label.clone()),
        FieldValue::Text(runs) | FieldValue::Title(runs) => {
            let joined = runs.concat();
            (!joined.is_empty()).then_some(joined)
        }
        _ => None,
    }
}

fn text_value(record: &RawRecord, specs: &[FieldSpec]) -> String {
    match resolve(record, specs) {
        Some(FieldValue::Text(runs)) | Some(FieldValue::Title(runs)) => runs.concat(),
        _ => String::new(),
    }
}

fn number_value(record: &RawRecord, specs: &[FieldSpec]) -> Option<Decimal> {
    match resolve(record, specs)? {
        FieldValue::Number(n) => Some(*n),
        _ => None,
    }
}

fn multi_value(record: &RawRecord, specs: &[FieldSpec]) -> Vec<String> {
    match resolve(record, specs) {
        Some(FieldValue::MultiSelect(labels)) => labels.clone(),
        _ => Vec::new(),
    }
}

fn files_value(record: &RawRecord, specs: &[FieldSpec]) -> Vec<String> {
    match resolve(record, specs) {
        Some(FieldValue::Files(files)) => files
            .iter()
            .filter_map(|f| f.url().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Parse an ISO date, tolerating a time suffix ("2024-03-01T09:30:00")
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Normalize one raw record into a canonical trade.
///
/// Total: always returns a trade, possibly with most fields absent. Records
/// without a parseable date are excluded from statistics downstream, not
/// here.
pub fn normalize(record: &RawRecord) -> Trade {
    let mut trade = Trade::empty(record.id.clone());

    trade.date = resolve(record, DATE_SPECS).and_then(|v| match v {
        FieldValue::Date(raw) => parse_date(raw),
        _ => None,
    });
    trade.pair = select_value(record, PAIR_SPECS);
    trade.direction = select_value(record, DIRECTION_SPECS);
    trade.outcome = select_value(record, OUTCOME_SPECS)
        .map(|raw| classify_outcome(&raw))
        .unwrap_or(Outcome::Unknown);
    trade.r_multiple = number_value(record, R_MULTIPLE_SPECS);
    trade.grade = select_value(record, GRADE_SPECS).and_then(|raw| raw.parse::<Grade>().ok());
    trade.session = select_value(record, SESSION_SPECS);
    trade.timeframe = select_value(record, TIMEFRAME_SPECS);
    trade.comment = text_value(record, COMMENT_SPECS);
    trade.confluences = multi_value(record, CONFLUENCE_SPECS);
    trade.images = files_value(record, IMAGE_SPECS);

    trade
}

/// Normalize a batch of records, preserving order
pub fn normalize_all(records: &[RawRecord]) -> Vec<Trade> {
    records.iter().map(normalize).collect()
}
