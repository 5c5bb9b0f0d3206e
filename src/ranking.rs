//! Price parsing and ranking.
//!
//! DataCenter prices come as grouped digits (`"1,234"`) or with Korean
//! large-number units (`"1조 2,345억"`). Anything else, including the
//! `"Error"` sentinel, has no magnitude and ranks after every number.

use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;

use crate::types::ScrapeResult;

static TOKEN_RE: OnceLock<Regex> = OnceLock::new();

fn token_re() -> &'static Regex {
    TOKEN_RE.get_or_init(|| {
        Regex::new(r"^\s*(\d[\d,]*(?:\.\d+)?)\s*([만억조경])?").expect("valid price token regex")
    })
}

fn unit_value(unit: &str) -> f64 {
    match unit {
        "만" => 1e4,
        "억" => 1e8,
        "조" => 1e12,
        "경" => 1e16,
        _ => 1.0,
    }
}

/// Parse a price string into a comparable magnitude.
///
/// Returns `None` for the sentinel and for any text that is not a number.
pub fn parse_price(text: &str) -> Option<f64> {
    let mut rest = text.trim();
    rest = rest.strip_suffix("BP").unwrap_or(rest).trim_end();
    if rest.is_empty() {
        return None;
    }

    let re = token_re();
    let mut total = 0.0;
    let mut last_unit = f64::INFINITY;

    while !rest.is_empty() {
        let caps = re.captures(rest)?;
        let digits = caps[1].replace(',', "");
        let value: f64 = digits.parse().ok()?;
        let unit = caps.get(2).map(|m| unit_value(m.as_str())).unwrap_or(1.0);

        // Units must descend: "2억 1조" is not a number
        if unit >= last_unit {
            return None;
        }
        last_unit = unit;

        total += value * unit;
        rest = rest[caps.get(0)?.end()..].trim_start();
    }

    Some(total)
}

fn by_magnitude_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sort results by descending price and keep at most `limit` of them.
///
/// The sort is stable, so equal prices keep their scrape order.
pub fn rank(results: &[ScrapeResult], limit: Option<usize>) -> Vec<ScrapeResult> {
    let mut keyed: Vec<(Option<f64>, &ScrapeResult)> = results
        .iter()
        .map(|r| (parse_price(r.prices.price.as_str()), r))
        .collect();

    keyed.sort_by(|a, b| by_magnitude_desc(a.0, b.0));

    let take = limit.unwrap_or(keyed.len());
    keyed
        .into_iter()
        .take(take)
        .map(|(_, r)| r.clone())
        .collect()
}
