use crate::models::EmailRecord;
use crate::rules::{Condition, DatePredicate, Field, MatchMode, Predicate, Rule, StringPredicate};
use chrono::{DateTime, Duration, Utc};
use tracing::warn;

const DAYS_PER_MONTH: i64 = 30;

/// `To` is not captured at ingestion, so it always reads as empty.
pub fn field_value(record: &EmailRecord, field: Field) -> &str {
    match field {
        Field::From => &record.sender,
        Field::To => "",
        Field::Subject => &record.subject,
        Field::Message => &record.snippet,
        Field::DateReceived => &record.received_datetime,
    }
}

pub fn rule_matches(rule: &Rule, record: &EmailRecord, now: DateTime<Utc>) -> bool {
    let mut results = rule
        .conditions
        .iter()
        .map(|condition| eval_condition(condition, record, now));

    match rule.match_mode {
        MatchMode::All => results.all(|matched| matched),
        MatchMode::Any => results.any(|matched| matched),
    }
}

pub fn eval_condition(condition: &Condition, record: &EmailRecord, now: DateTime<Utc>) -> bool {
    let value = field_value(record, condition.field);

    match condition.predicate {
        Predicate::String(predicate) => {
            eval_string(predicate, value, &condition.value.as_text())
        }
        Predicate::Date(predicate) => {
            let Some(received) = parse_received(value) else {
                return false;
            };
            let Some(threshold) = condition.value.as_threshold() else {
                warn!(value = ?condition.value, "Date threshold is not a whole number");
                return false;
            };
            eval_date(predicate, now - received, threshold)
        }
    }
}

fn eval_string(predicate: StringPredicate, field: &str, expected: &str) -> bool {
    let field = field.to_lowercase();
    let expected = expected.to_lowercase();

    match predicate {
        StringPredicate::Contains => field.contains(&expected),
        StringPredicate::DoesNotContain => !field.contains(&expected),
        StringPredicate::Equals => field == expected,
        StringPredicate::DoesNotEqual => field != expected,
    }
}

fn eval_date(predicate: DatePredicate, age: Duration, threshold: i64) -> bool {
    let days = |n: i64| Duration::try_days(n);

    let limit = match predicate {
        DatePredicate::LessThanDays | DatePredicate::GreaterThanDays => days(threshold),
        DatePredicate::LessThanMonths | DatePredicate::GreaterThanMonths => threshold
            .checked_mul(DAYS_PER_MONTH)
            .and_then(days),
    };
    let Some(limit) = limit else {
        return false;
    };

    match predicate {
        DatePredicate::LessThanDays | DatePredicate::LessThanMonths => age < limit,
        DatePredicate::GreaterThanDays | DatePredicate::GreaterThanMonths => age > limit,
    }
}

/// ISO-8601 offset timestamps we accept besides strict RFC 3339.
const ISO_FALLBACK_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

/// Timestamp with an offset (`Z` included). Naive timestamps are unparseable.
pub fn parse_received(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    let normalized = match value.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{rest}+00:00"),
        None => value.to_string(),
    };
    let normalized = normalized.replacen(' ', "T", 1);
    ISO_FALLBACK_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(&normalized, fmt).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
