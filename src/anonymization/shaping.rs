//! Post-resolution span shaping
//!
//! Accepted spans are trimmed or split before tokenization so that the
//! surrounding grammar stays readable and equal parts share a token:
//!
//! - PERSON: trailing titles stay visible (see [`crate::anonymization::titles`])
//! - MONEY: `約1,500万円程度` tokenizes only `1,500`
//! - ID: `第12345号` tokenizes only `12345`
//! - LOCATION: `東京都港区芝公園4-2-8` becomes one token per unit
//!   (`東京都`, `港区`, `芝公園`, `4-2-8`)
//!
//! Shaping only shrinks spans or cuts them into adjacent pieces, so the
//! accepted cover stays non-overlapping.

use crate::anonymization::config::EngineConfig;
use crate::anonymization::models::{Category, Span};
use crate::anonymization::text::CharIndex;
use crate::anonymization::titles::split_title_suffixes;
use regex::Regex;
use std::ops::Range;

const MONEY_PATTERN: &str = r"^(?:約|およそ|概算で)?\s*[¥￥]?\s*(?P<core>(?:[0-9０-９]{1,3}(?:[,，][0-9０-９]{3})+|[0-9０-９]+)(?:[.．][0-9０-９]+)?)\s*(?:兆|億|万|千)?円?\s*(?:程度|ほど|前後|以上|以下|未満|超)?$";

const IDENTIFIER_PATTERN: &str = r"^第?\s*(?P<core>[0-9０-９]+)\s*号?$";

const ADDRESS_NUMBER_PATTERN: &str = r"[0-9０-９]+(?:[-−－ー][0-9０-９]+){1,2}|[0-9０-９]+(?:丁目|番地|番|号)(?:[0-9０-９]+号?)?|[一二三四五六七八九十百]+(?:丁目|番地|番|号)";

/// Address units a LOCATION span is cut after, longest first
const ADDRESS_UNITS: &[&str] = &[
    "マンション",
    "アパート",
    "タワー",
    "ハイツ",
    "コーポ",
    "パーク",
    "丁目",
    "番地",
    "街区",
    "団地",
    "ビル",
    "都",
    "道",
    "府",
    "県",
    "市",
    "区",
    "町",
    "村",
    "号",
];

/// Trims and splits accepted spans according to the engine settings
#[derive(Debug, Clone)]
pub struct SpanShaper {
    titles: bool,
    money: Option<Regex>,
    identifier: Option<Regex>,
    address_numbers: Option<Regex>,
}

impl SpanShaper {
    /// Compiles the shaping rules enabled in `config`
    pub fn new(config: &EngineConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            titles: config.split_title_suffixes,
            money: compile_if(config.split_money_affixes, MONEY_PATTERN)?,
            identifier: compile_if(config.split_identifier_affixes, IDENTIFIER_PATTERN)?,
            address_numbers: compile_if(config.split_addresses, ADDRESS_NUMBER_PATTERN)?,
        })
    }

    /// Shapes position-ordered, non-overlapping spans over `text`
    ///
    /// The result is still position ordered and non-overlapping.
    pub fn shape(&self, mut spans: Vec<Span>, text: &str, chars: &CharIndex) -> Vec<Span> {
        if self.titles {
            split_title_suffixes(&mut spans, text, chars);
        }

        let mut shaped = Vec::with_capacity(spans.len());
        for mut span in spans {
            let Some(covered) = span.slice(text, chars) else {
                shaped.push(span);
                continue;
            };
            match (span.label, &self.money, &self.identifier, &self.address_numbers) {
                (Category::Money, Some(money), _, _) => {
                    if let Some(core) = numeric_core(covered, money) {
                        shrink(&mut span, core);
                    }
                }
                (Category::Id, _, Some(identifier), _) => {
                    if let Some(core) = numeric_core(covered, identifier) {
                        shrink(&mut span, core);
                    }
                }
                (Category::Location, _, _, Some(numbers)) => {
                    let parts = address_parts(covered, numbers);
                    if parts.len() > 1 {
                        shaped.extend(parts.into_iter().map(|part| Span {
                            start: span.start + part.start,
                            end: span.start + part.end,
                            ..span.clone()
                        }));
                        continue;
                    }
                    if let Some(part) = parts.into_iter().next() {
                        shrink(&mut span, part);
                    }
                }
                _ => {}
            }
            shaped.push(span);
        }
        shaped
    }
}

fn compile_if(enabled: bool, pattern: &str) -> Result<Option<Regex>, regex::Error> {
    enabled.then(|| Regex::new(pattern)).transpose()
}

/// Narrows `span` to the char range `part`, relative to its start
fn shrink(span: &mut Span, part: Range<usize>) {
    if part.start < part.end && part.end <= span.len() {
        span.end = span.start + part.end;
        span.start += part.start;
    }
}

/// Char range of the `core` group when `pattern` matches all of `covered`
///
/// `None` when the pattern does not match or the core is the whole span.
fn numeric_core(covered: &str, pattern: &Regex) -> Option<Range<usize>> {
    let core = pattern.captures(covered)?.name("core")?;
    let start = covered[..core.start()].chars().count();
    let end = start + core.as_str().chars().count();
    (end - start < covered.chars().count()).then_some(start..end)
}

/// Char ranges of the address units in `covered`, relative to its start
///
/// House numbers become parts of their own; the text between them is cut
/// after each address unit. Whitespace around parts is dropped.
pub fn address_parts(covered: &str, numbers: &Regex) -> Vec<Range<usize>> {
    let mut byte_parts = Vec::new();
    let mut last = 0;
    for number in numbers.find_iter(covered) {
        split_units(covered, last..number.start(), &mut byte_parts);
        byte_parts.push(number.range());
        last = number.end();
    }
    split_units(covered, last..covered.len(), &mut byte_parts);

    byte_parts
        .into_iter()
        .filter_map(|range| trim_range(covered, range))
        .map(|range| {
            let start = covered[..range.start].chars().count();
            start..start + covered[range].chars().count()
        })
        .collect()
}

/// Cuts `covered[segment]` after every address unit that follows a name
///
/// A run of unit characters (`京都府`) is cut after its last unit only.
fn split_units(covered: &str, segment: Range<usize>, parts: &mut Vec<Range<usize>>) {
    let mut piece_start = segment.start;
    let mut iter = covered[segment.clone()].char_indices().peekable();

    while let Some((offset, c)) = iter.next() {
        let piece_end = segment.start + offset + c.len_utf8();
        let Some(unit) = unit_suffix(&covered[piece_start..piece_end]) else {
            continue;
        };
        if piece_end - piece_start == unit.len() {
            continue;
        }
        if let Some(&(_, next)) = iter.peek() {
            let extended = &covered[piece_start..piece_end + next.len_utf8()];
            if unit_suffix(extended).is_some() {
                continue;
            }
        }
        parts.push(piece_start..piece_end);
        piece_start = piece_end;
    }

    if piece_start < segment.end {
        parts.push(piece_start..segment.end);
    }
}

fn unit_suffix(piece: &str) -> Option<&'static str> {
    ADDRESS_UNITS.iter().copied().find(|unit| piece.ends_with(unit))
}

fn trim_range(s: &str, range: Range<usize>) -> Option<Range<usize>> {
    let piece = &s[range.clone()];
    let leading = piece.len() - piece.trim_start().len();
    let trimmed = piece.trim();
    (!trimmed.is_empty()).then(|| {
        let start = range.start + leading;
        start..start + trimmed.len()
    })
}
