use crate::error::VariableError;
use crate::numeral::{integer_to_roman, to_radix, Radix};
use std::collections::HashMap;
use std::ops::Range;

pub const MAX_INDEX_WIDTH: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    Decimal,
    Roman,
    Binary,
    Octal,
    Hex,
}

impl IndexFormat {
    fn from_suffix(ch: u8) -> Option<Self> {
        match ch {
            b'r' => Some(Self::Roman),
            b'b' => Some(Self::Binary),
            b'o' => Some(Self::Octal),
            b'h' => Some(Self::Hex),
            _ => None,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Self::Decimal => "",
            Self::Roman => "r",
            Self::Binary => "b",
            Self::Octal => "o",
            Self::Hex => "h",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SkipRange {
    pub min: u64,
    pub max: u64,
}

impl SkipRange {
    pub fn contains(&self, value: u64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexSpec {
    pub start: u64,
    pub width: usize,
    pub zero_pad: bool,
    pub format: IndexFormat,
    pub step: u64,
    pub skip: Vec<SkipRange>,
}

impl Default for IndexSpec {
    fn default() -> Self {
        Self {
            start: 1,
            width: 0,
            zero_pad: false,
            format: IndexFormat::Decimal,
            step: 1,
            skip: Vec::new(),
        }
    }
}

impl IndexSpec {
    pub fn signature(&self) -> String {
        let skip = self
            .skip
            .iter()
            .map(|range| format!("{}-{}", range.min, range.max))
            .collect::<Vec<_>>()
            .join(";");
        format!(
            "{}%{}{}d{}{}<{}>",
            self.start,
            if self.zero_pad { "0" } else { "" },
            self.width,
            self.format.suffix(),
            self.step,
            skip
        )
    }

    pub fn next_value(&self, counter: Counter) -> Result<(u64, Counter), VariableError> {
        let overflow = || VariableError::format(self.signature(), "連番が上限を超えました");

        let mut offset = counter.offset;
        let mut value = counter
            .position
            .checked_mul(self.step)
            .and_then(|v| v.checked_add(self.start))
            .and_then(|v| v.checked_add(offset))
            .ok_or_else(overflow)?;

        // Jump past a whole range at once; each range is crossed at most once.
        while let Some(range) = self.skip.iter().find(|range| range.contains(value)) {
            let jump = ((range.max - value) / self.step + 1)
                .checked_mul(self.step)
                .ok_or_else(overflow)?;
            value = value.checked_add(jump).ok_or_else(overflow)?;
            offset = offset.checked_add(jump).ok_or_else(overflow)?;
        }

        Ok((
            value,
            Counter {
                position: counter.position + 1,
                offset,
            },
        ))
    }

    pub fn render(&self, value: u64) -> String {
        let digits = match self.format {
            IndexFormat::Roman => return integer_to_roman(value),
            IndexFormat::Decimal => to_radix(value, Radix::Decimal),
            IndexFormat::Binary => to_radix(value, Radix::Binary),
            IndexFormat::Octal => to_radix(value, Radix::Octal),
            IndexFormat::Hex => to_radix(value, Radix::Hex),
        };
        let fill = if self.zero_pad { '0' } else { ' ' };
        let missing = self.width.saturating_sub(digits.len());
        let mut out = String::with_capacity(missing + digits.len());
        out.extend(std::iter::repeat(fill).take(missing));
        out.push_str(&digits);
        out
    }
}

pub fn parse_index_spec(input: &str) -> Result<IndexSpec, VariableError> {
    match find_index(input, 0)? {
        Some((range, spec)) if range == (0..input.len()) => Ok(spec),
        _ => Err(VariableError::format(input, "連番の書式を解釈できません")),
    }
}

pub fn find_index(
    text: &str,
    from: usize,
) -> Result<Option<(Range<usize>, IndexSpec)>, VariableError> {
    let bytes = text.as_bytes();
    let mut search = from;

    while let Some(pos) = text[search..].find('%') {
        let percent = search + pos;
        search = percent + 1;

        let width_start = percent + 1;
        let width_end = scan_digits(bytes, width_start);
        if bytes.get(width_end) != Some(&b'd') {
            continue;
        }

        let mut start_at = percent;
        while start_at > from && bytes[start_at - 1].is_ascii_digit() {
            start_at -= 1;
        }

        let mut spec = IndexSpec::default();
        if start_at < percent {
            spec.start = parse_number(&text[start_at..percent], text)?;
        }
        if width_start < width_end {
            let width = &text[width_start..width_end];
            spec.zero_pad = width.starts_with('0');
            spec.width = parse_number(width, text)? as usize;
            if spec.width > MAX_INDEX_WIDTH {
                return Err(VariableError::format(
                    &text[start_at..=width_end],
                    format!("桁数は{MAX_INDEX_WIDTH}以下で指定してください"),
                ));
            }
        }

        let mut end = width_end + 1;
        if let Some(format) = bytes.get(end).copied().and_then(IndexFormat::from_suffix) {
            spec.format = format;
            end += 1;
        }

        let step_end = scan_digits(bytes, end);
        if step_end > end {
            spec.step = parse_number(&text[end..step_end], text)?;
            if spec.step == 0 {
                return Err(VariableError::format(
                    &text[start_at..step_end],
                    "増分に0は指定できません",
                ));
            }
            end = step_end;
        }

        if bytes.get(end) == Some(&b'<') {
            if let Some(close) = text[end..].find('>') {
                let close = end + close;
                if let Some(skip) = parse_skip_list(&text[end + 1..close]) {
                    let skip = skip.map_err(|reason| {
                        VariableError::format(&text[start_at..=close], reason)
                    })?;
                    spec.skip = skip;
                    end = close + 1;
                }
            }
        }

        return Ok(Some((start_at..end, spec)));
    }

    Ok(None)
}

fn scan_digits(bytes: &[u8], mut at: usize) -> usize {
    while bytes.get(at).is_some_and(u8::is_ascii_digit) {
        at += 1;
    }
    at
}

fn parse_number(digits: &str, token: &str) -> Result<u64, VariableError> {
    digits
        .parse::<u64>()
        .map_err(|err| VariableError::format(token, err.to_string()))
}

/// `None` when the bracket content is not a skip list at all, so the caller
/// leaves it as literal text.
fn parse_skip_list(body: &str) -> Option<Result<Vec<SkipRange>, String>> {
    let mut ranges = Vec::new();
    for item in body.split(';') {
        let item = item.trim_start();
        let (min, max) = match item.split_once('-') {
            Some((min, max)) => (min, max),
            None => (item, item),
        };
        if !is_digits(min) || !is_digits(max) {
            return None;
        }
        let (Ok(min), Ok(max)) = (min.parse::<u64>(), max.parse::<u64>()) else {
            return Some(Err("除外範囲の数値が大きすぎます".to_string()));
        };
        if min > max {
            return Some(Err(format!("除外範囲が逆転しています: {min}-{max}")));
        }
        ranges.push(SkipRange { min, max });
    }
    Some(Ok(ranges))
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counter {
    pub position: u64,
    pub offset: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberingStep {
    pub signature: String,
    pub value: u64,
    pub next: Counter,
}

#[derive(Debug, Clone, Default)]
pub struct NumberingState {
    counters: HashMap<String, Counter>,
}

impl NumberingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, signature: &str) -> Counter {
        self.counters.get(signature).copied().unwrap_or_default()
    }

    pub fn peek(&self, spec: &IndexSpec) -> Result<NumberingStep, VariableError> {
        let signature = spec.signature();
        let (value, next) = spec.next_value(self.counter(&signature))?;
        Ok(NumberingStep {
            signature,
            value,
            next,
        })
    }

    pub fn commit(&mut self, steps: impl IntoIterator<Item = NumberingStep>) {
        for step in steps {
            self.counters.insert(step.signature, step.next);
        }
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}
