//! Numeric normalization of free-text slot values.
//!
//! Parents type "2天", "一天半", "90 minutes" or "1岁半". These helpers turn
//! such text into comparable numbers. Anything unparseable yields `None`;
//! callers treat `None` as "condition does not hold".

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::session::{slot_names, SlotValue};

const CHINESE_DIGITS: &str = "零一二两三四五六七八九十";

static ARABIC_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("valid number regex"));

static CHINESE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[零一二两三四五六七八九十]+").expect("valid numeral regex"));

static DURATION_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?P<num>\d+(?:\.\d+)?|[零一二两三四五六七八九十]+)?\s*个?\s*(?P<half>半)?\s*个?\s*(?P<unit>周|星期|礼拜|个月|月|天|日|小时|钟头|分钟|分|(?:weeks?|wks?|months?|days?|hours?|hrs?|h|minutes?|mins?)\b)(?P<tail>半)?",
    )
    .expect("valid duration regex")
});

static AGE_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?P<num>\d+(?:\.\d+)?|[零一二两三四五六七八九十]+)?\s*个?\s*(?P<half>半)?\s*个?\s*(?P<unit>岁|周岁|个月|月|周|星期|天|(?:years?|yrs?|months?|mos?|weeks?|days?)\b)(?P<tail>半)?",
    )
    .expect("valid age regex")
});

/// Parses Chinese numerals up to 九十九.
///
/// Two adjacent ascending digits name a range ("两三" is two or three) and
/// read as the lower bound. Any other run of digits without 十 is rejected.
pub fn chinese_to_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() || !text.chars().all(|c| CHINESE_DIGITS.contains(c)) {
        return None;
    }

    match text.split_once('十') {
        Some((tens, units)) => {
            let tens = if tens.is_empty() { 1 } else { single_or_range(tens)? };
            let units = if units.is_empty() { 0 } else { single_or_range(units)? };
            Some(f64::from(tens * 10 + units))
        }
        None => single_or_range(text).map(f64::from),
    }
}

fn digit_value(c: char) -> Option<u32> {
    let digit = match c {
        '零' => 0,
        '一' => 1,
        '二' | '两' => 2,
        '三' => 3,
        '四' => 4,
        '五' => 5,
        '六' => 6,
        '七' => 7,
        '八' => 8,
        '九' => 9,
        _ => return None,
    };
    Some(digit)
}

/// One digit, or a two-digit range such as "三四" read as its lower bound.
fn single_or_range(text: &str) -> Option<u32> {
    let digits: Vec<u32> = text.chars().map(digit_value).collect::<Option<_>>()?;
    match digits.as_slice() {
        [single] => Some(*single),
        [low, high] if *high == low + 1 => Some(*low),
        _ => None,
    }
}

fn parse_quantity(text: &str) -> Option<f64> {
    text.parse::<f64>()
        .ok()
        .or_else(|| chinese_to_number(text))
}

/// Extracts the first number embedded in text.
///
/// Arabic numerals (including decimals) win over Chinese numerals.
pub fn to_number(text: &str) -> Option<f64> {
    if let Some(m) = ARABIC_NUMBER.find(text) {
        return m.as_str().parse::<f64>().ok();
    }
    CHINESE_NUMBER
        .find(text)
        .and_then(|m| chinese_to_number(m.as_str()))
}

/// Outcome of scanning text for `<quantity><unit>` components.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Components {
    /// Sum of every paired component.
    Total(f64),
    /// A unit appeared without a readable quantity ("十几天", "10+ days").
    Unpaired,
    /// No unit at all; the text may be a bare number.
    NoUnit,
}

/// Sums every `<quantity><unit>` component of `text` using `unit_scale`.
fn sum_components(pattern: &Regex, text: &str, unit_scale: fn(&str) -> Option<f64>) -> Components {
    let mut total = 0.0;
    let mut matched = false;
    let mut saw_unit = false;

    for caps in pattern.captures_iter(text) {
        let Some(scale) = caps.name("unit").and_then(|u| unit_scale(u.as_str())) else {
            continue;
        };
        saw_unit = true;

        let quantity = caps.name("num").and_then(|m| parse_quantity(m.as_str()));
        let halves = caps.name("half").is_some() || caps.name("tail").is_some();

        let amount = match (quantity, halves) {
            (Some(q), true) => q + 0.5,
            (Some(q), false) => q,
            (None, true) => 0.5,
            (None, false) => continue,
        };

        total += amount * scale;
        matched = true;
    }

    match (matched, saw_unit) {
        (true, _) => Components::Total(total),
        (false, true) => Components::Unpaired,
        (false, false) => Components::NoUnit,
    }
}

fn with_bare_fallback(components: Components, text: &str) -> Option<f64> {
    match components {
        Components::Total(total) => Some(total),
        Components::Unpaired => None,
        Components::NoUnit => to_number(text),
    }
}

fn hours_per_unit(unit: &str) -> Option<f64> {
    let unit = unit.to_lowercase();
    let scale = match unit.as_str() {
        "周" | "星期" | "礼拜" | "week" | "weeks" | "wk" | "wks" => 168.0,
        "个月" | "月" | "month" | "months" => 720.0,
        "天" | "日" | "day" | "days" => 24.0,
        "小时" | "钟头" | "hour" | "hours" | "hr" | "hrs" | "h" => 1.0,
        "分钟" | "分" | "minute" | "minutes" | "min" | "mins" => 1.0 / 60.0,
        _ => return None,
    };
    Some(scale)
}

fn months_per_unit(unit: &str) -> Option<f64> {
    let unit = unit.to_lowercase();
    let scale = match unit.as_str() {
        "岁" | "周岁" | "year" | "years" | "yr" | "yrs" => 12.0,
        "个月" | "月" | "month" | "months" | "mo" | "mos" => 1.0,
        "周" | "星期" | "week" | "weeks" => 7.0 / 30.0,
        "天" | "day" | "days" => 1.0 / 30.0,
        _ => return None,
    };
    Some(scale)
}

/// Converts a duration description to hours. A bare number is hours; a
/// unit without a readable quantity yields `None`.
pub fn duration_to_hours(text: &str) -> Option<f64> {
    with_bare_fallback(sum_components(&DURATION_PART, text, hours_per_unit), text)
}

/// Converts an age description to months. A bare number is months.
pub fn age_to_months(text: &str) -> Option<f64> {
    with_bare_fallback(sum_components(&AGE_PART, text, months_per_unit), text)
}

/// Normalizes a slot value for numeric comparison, choosing the parser by slot.
pub fn normalize_slot_number(slot: &str, value: &SlotValue) -> Option<f64> {
    let text = match value {
        SlotValue::Number(n) => return Some(*n),
        SlotValue::Flag(_) => return None,
        SlotValue::Text(s) => s.clone(),
        SlotValue::List(items) => items.first()?.clone(),
    };

    match slot {
        slot_names::DURATION => duration_to_hours(&text),
        slot_names::AGE_MONTHS => age_to_months(&text),
        _ => to_number(&text),
    }
}
