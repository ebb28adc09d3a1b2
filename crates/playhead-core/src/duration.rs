//! Human duration strings such as `1.5s`, `5m`, `1h 30m` or `250`
//!
//! A component is a decimal number followed by an optional unit. Components
//! may be separated by whitespace and are summed. A number without a unit is
//! read as milliseconds.

use nom::{
    bytes::complete::take_while,
    character::complete::multispace0,
    combinator::all_consuming,
    multi::many1,
    number::complete::double,
    sequence::{preceded, terminated},
    IResult, Parser,
};

/// Parse a duration string into milliseconds.
///
/// Returns `None` when the input does not match the grammar or names an
/// unknown unit.
pub fn parse_duration(raw: &str) -> Option<f64> {
    let (_, components) = all_consuming(terminated(
        many1(preceded(multispace0, component)),
        multispace0,
    ))
    .parse(raw)
    .ok()?;

    components
        .into_iter()
        .try_fold(0.0, |total, (value, unit)| {
            unit_millis(unit).map(|scale| total + value * scale)
        })
}

fn component(input: &str) -> IResult<&str, (f64, &str)> {
    (
        double,
        preceded(multispace0, take_while(|c: char| c.is_alphabetic())),
    )
        .parse(input)
}

/// Milliseconds per unit
fn unit_millis(unit: &str) -> Option<f64> {
    const SECOND: f64 = 1_000.0;
    const MINUTE: f64 = 60.0 * SECOND;
    const HOUR: f64 = 60.0 * MINUTE;
    const DAY: f64 = 24.0 * HOUR;

    let scale = match unit.to_ascii_lowercase().as_str() {
        "" | "ms" => 1.0,
        "ns" => 1e-6,
        "us" | "µs" => 1e-3,
        "s" | "sec" | "secs" => SECOND,
        "m" | "min" | "mins" => MINUTE,
        "h" | "hr" | "hrs" => HOUR,
        "d" | "day" | "days" => DAY,
        "w" | "wk" | "week" | "weeks" => 7.0 * DAY,
        "y" | "yr" | "year" | "years" => 365.25 * DAY,
        _ => return None,
    };
    Some(scale)
}
