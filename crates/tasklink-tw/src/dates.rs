//! Date and duration codec for the TaskWarrior wire formats
//!
//! The engine serializes instants in a compact `YYYYMMDDTHHMMSSZ` form
//! (exactly 16 characters, `T` at offset 8, trailing `Z`) which is
//! detected and rewritten to punctuated ISO-8601 before standard parsing.
//! Free-form date expressions ("tomorrow", "eom") are never parsed
//! locally: they are delegated to the engine's `calc` sub-command.

use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use tasklink_core::{Error, Result};
use tracing::debug;

use crate::command::TaskExecutor;

/// Whether a string is in the engine's compact timestamp format
fn is_compact(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 16
        && bytes[8] == b'T'
        && bytes[15] == b'Z'
        && bytes[..8].iter().all(u8::is_ascii_digit)
        && bytes[9..15].iter().all(u8::is_ascii_digit)
}

/// Rewrite `20260101T193139Z` to `2026-01-01T19:31:39Z`
fn punctuate_compact(value: &str) -> String {
    format!(
        "{}-{}-{}T{}:{}:{}Z",
        &value[0..4],
        &value[4..6],
        &value[6..8],
        &value[9..11],
        &value[11..13],
        &value[13..15]
    )
}

/// Decode an engine timestamp into a UTC instant
///
/// Accepts the compact format, standard ISO-8601 with an offset or `Z`,
/// and offset-less ISO-8601 (treated as UTC, which is how the engine
/// prints `calc` results).
pub fn decode_datetime(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    let candidate = if is_compact(value) {
        punctuate_compact(value)
    } else {
        value.to_string()
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&candidate) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(&candidate, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    Err(Error::Parse(format!("Unparsable date string: {}", value)))
}

/// Encode a UTC instant as punctuated ISO-8601 with second precision
pub fn encode_datetime(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Encode a duration as an ISO-8601 duration literal
///
/// Negative durations are clamped to `PT0S`; the engine has no notion of
/// negative spans in attribute values.
pub fn encode_duration(value: Duration) -> String {
    let total = value.num_seconds();
    if total <= 0 {
        return "PT0S".to_string();
    }

    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let mut out = String::from("P");
    if days > 0 {
        out.push_str(&format!("{}D", days));
    }
    if hours > 0 || minutes > 0 || seconds > 0 {
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{}H", hours));
        }
        if minutes > 0 {
            out.push_str(&format!("{}M", minutes));
        }
        if seconds > 0 {
            out.push_str(&format!("{}S", seconds));
        }
    }
    out
}

/// Parse an ISO-8601 duration literal (`P[nW]`, `P[nD][T[nH][nM][nS]]`)
pub fn parse_duration(value: &str) -> Result<Duration> {
    let value = value.trim();
    let rest = value
        .strip_prefix('P')
        .ok_or_else(|| Error::Parse(format!("Unparsable duration: {}", value)))?;
    if rest.is_empty() {
        return Err(Error::Parse(format!("Unparsable duration: {}", value)));
    }

    let (date_part, time_part) = match rest.split_once('T') {
        Some((d, t)) => (d, Some(t)),
        None => (rest, None),
    };

    let mut seconds: i64 = 0;
    let mut parse_units = |part: &str, units: &[(char, i64)]| -> Result<()> {
        let mut number = String::new();
        for c in part.chars() {
            if c.is_ascii_digit() {
                number.push(c);
                continue;
            }
            let factor = units
                .iter()
                .find(|(unit, _)| *unit == c)
                .map(|(_, f)| *f)
                .ok_or_else(|| Error::Parse(format!("Unparsable duration: {}", value)))?;
            let n: i64 = number
                .parse()
                .map_err(|_| Error::Parse(format!("Unparsable duration: {}", value)))?;
            seconds += n * factor;
            number.clear();
        }
        if !number.is_empty() {
            return Err(Error::Parse(format!("Unparsable duration: {}", value)));
        }
        Ok(())
    };

    parse_units(date_part, &[('W', 604_800), ('D', 86_400)])?;
    if let Some(time_part) = time_part {
        if time_part.is_empty() {
            return Err(Error::Parse(format!("Unparsable duration: {}", value)));
        }
        parse_units(time_part, &[('H', 3_600), ('M', 60), ('S', 1)])?;
    }

    Ok(Duration::seconds(seconds))
}

/// Resolver for free-form date expressions
///
/// Delegates to the engine's `calc` sub-command and reads back its
/// single-line result. A non-zero exit or an unparsable result is an
/// [`Error::InvalidDate`], never a local fallback guess.
pub struct DateResolver<E: TaskExecutor> {
    executor: E,
}

impl<E: TaskExecutor> DateResolver<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Evaluate a date expression, returning the engine's raw result line
    pub async fn calc(&self, expression: &str) -> Result<String> {
        debug!(expression, "Calculating date expression");
        let output = self.executor.run(&["calc", expression]).await?;
        if !output.success() {
            return Err(Error::InvalidDate(format!(
                "Failed to calculate '{}': {}",
                expression,
                output.stderr.trim()
            )));
        }
        Ok(output.stdout.trim().to_string())
    }

    /// Evaluate a date expression into a UTC instant
    pub async fn resolve(&self, expression: &str) -> Result<DateTime<Utc>> {
        let raw = self.calc(expression).await?;
        decode_datetime(&raw)
            .map_err(|_| Error::InvalidDate(format!("Unparsable calc result: {}", raw)))
    }

    /// Whether the engine accepts the expression as a date
    ///
    /// Appends `+ P1D` to the expression: the engine echoes unknown
    /// expressions back verbatim instead of failing, so an echo of the
    /// input concatenated with `P1D` means the expression did not resolve.
    pub async fn validate_expression(&self, expression: &str) -> bool {
        let output = match self.executor.run(&["calc", expression, "+ P1D"]).await {
            Ok(output) => output,
            Err(_) => return false,
        };
        if !output.success() {
            return false;
        }
        output.stdout.trim() != format!("{}P1D", expression.trim())
    }
}
