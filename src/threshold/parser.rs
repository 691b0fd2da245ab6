//! Range specification parser using nom.
//!
//! Accepted forms, tried in this order against the trimmed input:
//! `N`, `N:`, `~:N`, `N:M`, `@N:M`. Numbers are an optional `-`, digits and
//! an optional fractional part.

use super::ast::ThresholdRange;
use crate::core::{ProbeError, Result};
use nom::{
    branch::alt,
    character::complete::{char, digit1},
    combinator::{all_consuming, map, map_res, opt, recognize},
    sequence::{pair, preceded, separated_pair, terminated, tuple},
    IResult,
};

/// Parse a range specification.
///
/// Returns `Ok(None)` for an absent or blank spec: an unconfigured range
/// never alerts.
pub fn parse_range(spec: Option<&str>) -> Result<Option<ThresholdRange>> {
    let Some(raw) = spec else {
        return Ok(None);
    };
    let input = raw.trim();
    if input.is_empty() {
        return Ok(None);
    }

    match range(input) {
        Ok((_, parsed)) => Ok(Some(parsed)),
        Err(_) => Err(ProbeError::format(raw)),
    }
}

/// Parse one of the five forms, each of which must consume the whole input
fn range(input: &str) -> IResult<&str, ThresholdRange> {
    alt((
        all_consuming(upper),
        all_consuming(at_least),
        all_consuming(at_most),
        all_consuming(outside),
        all_consuming(inside),
    ))(input)
}

/// `N`
fn upper(input: &str) -> IResult<&str, ThresholdRange> {
    map(number, ThresholdRange::Upper)(input)
}

/// `N:`
fn at_least(input: &str) -> IResult<&str, ThresholdRange> {
    map(terminated(number, char(':')), ThresholdRange::AtLeast)(input)
}

/// `~:N`
fn at_most(input: &str) -> IResult<&str, ThresholdRange> {
    map(preceded(pair(char('~'), char(':')), number), ThresholdRange::AtMost)(input)
}

/// `N:M`
fn outside(input: &str) -> IResult<&str, ThresholdRange> {
    map(separated_pair(number, char(':'), number), |(low, high)| {
        ThresholdRange::Outside { low, high }
    })(input)
}

/// `@N:M`
fn inside(input: &str) -> IResult<&str, ThresholdRange> {
    map(
        preceded(char('@'), separated_pair(number, char(':'), number)),
        |(low, high)| ThresholdRange::Inside { low, high },
    )(input)
}

/// Signed decimal: `-?[0-9]+(\.[0-9]+)?`
fn number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((opt(char('-')), digit1, opt(pair(char('.'), digit1))))),
        str::parse::<f64>,
    )(input)
}
