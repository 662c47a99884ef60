//! Free-text salary parsing.

use serde::{Deserialize, Serialize};

/// Numeric interpretation of a salary string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: f64,
    pub max: f64,
    pub average: f64,
}

impl SalaryRange {
    fn single(value: f64) -> Self {
        Self {
            min: value,
            max: value,
            average: value,
        }
    }

    fn between(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            average: (min + max) / 2.0,
        }
    }
}

/// Parse a salary such as `"$40,000 - $50,000"` or `"$60000"`.
///
/// `$` and `,` are stripped. A `" - "` separator yields a range; otherwise the
/// whole string must be a single number. Blank strings and "not specified"
/// are unparseable.
pub fn parse_salary(salary: &str) -> Option<SalaryRange> {
    let cleaned: String = salary.chars().filter(|c| *c != '$' && *c != ',').collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned.eq_ignore_ascii_case("not specified") {
        return None;
    }

    let parts: Vec<&str> = cleaned.split(" - ").collect();
    match parts.as_slice() {
        [min, max] => {
            let min = parse_number(min)?;
            let max = parse_number(max)?;
            Some(SalaryRange::between(min, max))
        }
        [value] => parse_number(value).map(SalaryRange::single),
        _ => None,
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
