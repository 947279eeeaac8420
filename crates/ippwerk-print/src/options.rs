// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scheduler option strings and their encoding as job template attributes.
//
// The option string looks like `media=a4 sides='two-sided-long-edge' collate
// nobanner`: whitespace separated, values optionally quoted, backslash escapes
// inside and outside quotes.  A bare name means `true`, a bare `noNAME` means
// `NAME=false`.

use ippwerk_core::types::JobOption;
use tracing::debug;

use crate::message::Message;
use crate::tag::{GroupTag, ValueTag};
use crate::value::{RangeOfInteger, ResolutionUnit, Value};

/// Options the submission sets itself; never taken from the option string.
const RESERVED: &[&str] = &["copies", "document-format", "job-name", "requesting-user-name"];

/// Split an option string into `name=value` pairs.
pub fn parse_options(input: &str) -> Vec<JobOption> {
    let mut options = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut name = String::new();
        while let Some(c) = chars.next_if(|c| !c.is_whitespace() && *c != '=') {
            name.push(c);
        }

        let value = if chars.next_if_eq(&'=').is_some() {
            Some(read_value(&mut chars))
        } else {
            None
        };

        if name.is_empty() {
            continue;
        }

        let option = match value {
            Some(value) => JobOption { name, value },
            None => match name.strip_prefix("no") {
                Some(rest) if !rest.is_empty() => JobOption {
                    name: rest.to_owned(),
                    value: "false".into(),
                },
                _ => JobOption {
                    name,
                    value: "true".into(),
                },
            },
        };
        options.push(option);
    }

    options
}

fn read_value(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut value = String::new();
    let mut quote: Option<char> = None;

    while let Some(&c) = chars.peek() {
        match (quote, c) {
            (None, c) if c.is_whitespace() => break,
            (_, '\\') => {
                chars.next();
                if let Some(escaped) = chars.next() {
                    value.push(escaped);
                }
                continue;
            }
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (_, c) => value.push(c),
        }
        chars.next();
    }

    value
}

/// Add `options` to the job group of `request`, guessing each value's
/// syntax from its shape.  Reserved names are skipped.
pub fn encode_options(request: &mut Message, options: &[JobOption]) {
    for option in options {
        if RESERVED.contains(&option.name.as_str()) {
            debug!(name = %option.name, "skipping reserved option");
            continue;
        }

        let parts: Vec<&str> = option.value.split(',').collect();
        let (tag, values) = typed_values(&parts);
        request.add_values(GroupTag::Job, tag, option.name.clone(), values);
    }
}

/// One syntax for the whole set: the first value picks it, and a value that
/// does not fit drops the whole set back to keywords.
fn typed_values(parts: &[&str]) -> (ValueTag, Vec<Value>) {
    let tag = parts.first().map_or(ValueTag::Keyword, |first| guess_tag(first));

    let typed: Option<Vec<Value>> = parts.iter().map(|p| parse_as(tag, p)).collect();
    match typed {
        Some(values) => (tag, values),
        None => (
            ValueTag::Keyword,
            parts.iter().map(|p| Value::string(*p)).collect(),
        ),
    }
}

fn guess_tag(value: &str) -> ValueTag {
    if value.parse::<i32>().is_ok() {
        ValueTag::Integer
    } else if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
        ValueTag::Boolean
    } else if parse_range(value).is_some() {
        ValueTag::RangeOfInteger
    } else if parse_resolution(value).is_some() {
        ValueTag::Resolution
    } else {
        ValueTag::Keyword
    }
}

fn parse_as(tag: ValueTag, value: &str) -> Option<Value> {
    match tag {
        ValueTag::Integer => value.parse().ok().map(Value::Integer),
        ValueTag::Boolean => match value.to_ascii_lowercase().as_str() {
            "true" => Some(Value::Boolean(true)),
            "false" => Some(Value::Boolean(false)),
            _ => None,
        },
        ValueTag::RangeOfInteger => parse_range(value).map(Value::Range),
        ValueTag::Resolution => parse_resolution(value),
        _ => Some(Value::string(value)),
    }
}

/// `1-5` as used by `page-ranges`.
fn parse_range(value: &str) -> Option<RangeOfInteger> {
    let (lower, upper) = value.split_once('-')?;
    RangeOfInteger::new(lower.parse().ok()?, upper.parse().ok()?)
}

/// `600dpi`, `300x600dpi` or `118dpc`.
fn parse_resolution(value: &str) -> Option<Value> {
    let (numbers, units) = if let Some(n) = value.strip_suffix("dpi") {
        (n, ResolutionUnit::PerInch)
    } else if let Some(n) = value.strip_suffix("dpc") {
        (n, ResolutionUnit::PerCm)
    } else {
        return None;
    };

    let (x, y) = match numbers.split_once('x') {
        Some((x, y)) => (x.parse().ok()?, y.parse().ok()?),
        None => {
            let xy = numbers.parse().ok()?;
            (xy, xy)
        }
    };
    Some(Value::resolution(x, y, units))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opt(name: &str, value: &str) -> JobOption {
        JobOption {
            name: name.into(),
            value: value.into(),
        }
    }

    #[test]
    fn plain_pairs_and_flags() {
        let parsed = parse_options("media=a4  collate nobanner sides=two-sided-long-edge");
        assert_eq!(
            parsed,
            vec![
                opt("media", "a4"),
                opt("collate", "true"),
                opt("banner", "false"),
                opt("sides", "two-sided-long-edge"),
            ]
        );
    }

    #[test]
    fn quotes_and_escapes() {
        let parsed = parse_options(r#"job-sheets='none, none' title="a \"b\"" path=a\ b"#);
        assert_eq!(
            parsed,
            vec![
                opt("job-sheets", "none, none"),
                opt("title", "a \"b\""),
                opt("path", "a b"),
            ]
        );
    }

    #[test]
    fn bare_no_is_a_flag_not_a_negation() {
        assert_eq!(parse_options("no"), vec![opt("no", "true")]);
        assert!(parse_options("   ").is_empty());
    }

    #[test]
    fn values_are_typed_by_shape() {
        let mut request = Message::default();
        encode_options(
            &mut request,
            &[
                opt("number-up", "2"),
                opt("collate", "false"),
                opt("page-ranges", "1-5"),
                opt("printer-resolution", "300x600dpi"),
                opt("media", "a4"),
                opt("finishings", "3,4"),
            ],
        );

        let attr = request.find("number-up", ValueTag::Integer).unwrap();
        assert_eq!(attr.values, vec![Value::Integer(2)]);
        assert!(request.find("collate", ValueTag::Boolean).is_some());

        let range = request.find("page-ranges", ValueTag::RangeOfInteger).unwrap();
        let range = range.values[0].as_range().unwrap();
        assert_eq!((range.lower(), range.upper()), (1, 5));

        let res = request
            .find("printer-resolution", ValueTag::Resolution)
            .unwrap();
        let res = res.values[0].as_resolution().unwrap();
        assert_eq!((res.x, res.y, res.units), (300, 600, ResolutionUnit::PerInch));

        assert!(request.find("media", ValueTag::Keyword).is_some());
        let set = request.find("finishings", ValueTag::Integer).unwrap();
        assert_eq!(set.values.len(), 2);
        assert!(request.groups.iter().all(|g| g.tag == GroupTag::Job));
    }

    #[test]
    fn mixed_sets_fall_back_to_keywords() {
        let mut request = Message::default();
        encode_options(&mut request, &[opt("mixed", "1,a4")]);
        let attr = request.find("mixed", ValueTag::Keyword).unwrap();
        assert_eq!(attr.strings().unwrap(), ["1", "a4"]);
    }

    #[test]
    fn reserved_names_are_skipped() {
        let mut request = Message::default();
        encode_options(&mut request, &[opt("copies", "4"), opt("document-format", "x")]);
        assert!(request.groups.is_empty());
    }
}
