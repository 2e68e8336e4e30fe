//! Number format codes.
//!
//! Turns a cell's numeric value into the text a spreadsheet would display
//! for its `numFmtId`. Supported: General, the common built-in ids, and
//! custom codes made of digit placeholders, thousands separators, percent,
//! literal text and date/time tokens. Anything else renders as General.

/// Built-in format code for an id, for the ids this module supports.
pub const fn builtin_format(id: u32) -> Option<&'static str> {
    match id {
        0 => Some("General"),
        1 => Some("0"),
        2 => Some("0.00"),
        3 => Some("#,##0"),
        4 => Some("#,##0.00"),
        9 => Some("0%"),
        10 => Some("0.00%"),
        14 => Some("mm-dd-yy"),
        15 => Some("d-mmm-yy"),
        16 => Some("d-mmm"),
        17 => Some("mmm-yy"),
        18 => Some("h:mm AM/PM"),
        19 => Some("h:mm:ss AM/PM"),
        20 => Some("h:mm"),
        21 => Some("h:mm:ss"),
        22 => Some("m/d/yy h:mm"),
        37 => Some("#,##0 ;(#,##0)"),
        38 => Some("#,##0 ;[Red](#,##0)"),
        39 => Some("#,##0.00;(#,##0.00)"),
        40 => Some("#,##0.00;[Red](#,##0.00)"),
        45 => Some("mm:ss"),
        46 => Some("[h]:mm:ss"),
        47 => Some("mmss.0"),
        49 => Some("@"),
        _ => None,
    }
}

/// Format `value` with a format code.
pub fn format_number(value: f64, format_code: &str, date1904: bool) -> String {
    NumberFormat::compile(format_code).format(value, date1904)
}

/// A compiled format code.
#[derive(Debug, Clone, PartialEq)]
pub enum NumberFormat {
    General,
    Sections(Vec<Section>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    condition: Option<Condition>,
    tokens: Vec<Token>,
    number: Option<NumberPattern>,
    /// Number of `%` signs; each multiplies by 100.
    percent: u32,
    /// Precision of fractional seconds (`ss.0` -> 1).
    second_digits: u32,
    is_date: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Condition {
    op: CompareOp,
    threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Condition {
    fn matches(self, value: f64) -> bool {
        match self.op {
            CompareOp::Lt => value < self.threshold,
            CompareOp::Le => value <= self.threshold,
            CompareOp::Gt => value > self.threshold,
            CompareOp::Ge => value >= self.threshold,
            CompareOp::Eq => (value - self.threshold).abs() < f64::EPSILON,
            CompareOp::Ne => (value - self.threshold).abs() >= f64::EPSILON,
        }
    }
}

/// The digit-placeholder part of a section, e.g. `#,##0.00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NumberPattern {
    int_min: usize,
    frac_min: usize,
    frac_max: usize,
    has_point: bool,
    thousands: bool,
    /// Trailing commas; each divides by 1000.
    scale: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Number,
    Text,
    Year(usize),
    Month(usize),
    Minute(usize),
    Day(usize),
    Hour(usize),
    Second(usize),
    FracSecond,
    ElapsedHours,
    ElapsedMinutes,
    ElapsedSeconds,
    AmPm { short: bool },
}

impl NumberFormat {
    pub fn compile(format_code: &str) -> Self {
        let code = format_code.trim();
        if code.is_empty() || code.eq_ignore_ascii_case("General") {
            return Self::General;
        }
        let sections: Vec<Section> = split_sections(code).iter().map(|s| compile_section(s)).collect();
        if sections.is_empty() {
            Self::General
        } else {
            Self::Sections(sections)
        }
    }

    pub fn format(&self, value: f64, date1904: bool) -> String {
        let Self::Sections(sections) = self else {
            return format_general(value);
        };
        if !value.is_finite() {
            return format_general(value);
        }
        let (section, signed) = pick_section(sections, value);
        match section {
            Some(section) => section.render(value, signed, date1904),
            None => format_general(value),
        }
    }

    pub const fn is_general(&self) -> bool {
        matches!(self, Self::General)
    }
}

/// Pick the section for `value`. The flag says whether the section expects
/// the signed value (only the first section of a single-section code does).
fn pick_section(sections: &[Section], value: f64) -> (Option<&Section>, bool) {
    if sections.iter().any(|s| s.condition.is_some()) {
        let chosen = sections
            .iter()
            .take(3)
            .find(|s| s.condition.is_some_and(|c| c.matches(value)))
            .or_else(|| sections.iter().take(3).find(|s| s.condition.is_none()));
        return (chosen, false);
    }
    let numeric: Vec<&Section> = sections.iter().take(3).collect();
    match numeric.as_slice() {
        [only] => (Some(*only), true),
        [positive, negative] => {
            if value < 0.0 {
                (Some(*negative), false)
            } else {
                (Some(*positive), false)
            }
        }
        [positive, negative, zero, ..] => {
            if value > 0.0 {
                (Some(*positive), false)
            } else if value < 0.0 {
                (Some(*negative), false)
            } else {
                (Some(*zero), false)
            }
        }
        [] => (None, true),
    }
}

/// Split on `;` outside quotes, escapes and brackets.
fn split_sections(code: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut in_brackets = false;
    let mut escaped = false;

    for c in code.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if !in_quotes => {
                escaped = true;
                current.push(c);
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            '[' if !in_quotes => {
                in_brackets = true;
                current.push(c);
            }
            ']' if !in_quotes => {
                in_brackets = false;
                current.push(c);
            }
            ';' if !in_quotes && !in_brackets => sections.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    sections.push(current);
    sections
}

fn has_date_tokens(section: &str) -> bool {
    let mut in_quotes = false;
    let mut in_brackets = false;
    let mut escaped = false;
    for c in section.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' | '_' | '*' if !in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes => {
                in_brackets = true;
            }
            ']' if !in_quotes => in_brackets = false,
            'y' | 'Y' | 'm' | 'M' | 'd' | 'D' | 'h' | 'H' | 's' | 'S'
                if !in_quotes && !in_brackets =>
            {
                return true;
            }
            _ => {}
        }
    }
    // Elapsed time like [h] on its own is still a time format.
    let lower = section.to_ascii_lowercase();
    ["[h]", "[hh]", "[m]", "[mm]", "[s]", "[ss]"]
        .iter()
        .any(|token| lower.contains(token))
}

#[allow(clippy::too_many_lines)]
fn compile_section(source: &str) -> Section {
    let is_date = has_date_tokens(source);
    let chars: Vec<char> = source.chars().collect();
    let mut section = Section {
        condition: None,
        tokens: Vec::new(),
        number: None,
        percent: 0,
        second_digits: 0,
        is_date,
    };
    let mut literal = String::new();
    let mut i = 0;

    macro_rules! flush {
        () => {
            if !literal.is_empty() {
                section.tokens.push(Token::Literal(std::mem::take(&mut literal)));
            }
        };
    }

    let run_len = |start: usize, target: char| {
        chars
            .iter()
            .skip(start)
            .take_while(|c| c.eq_ignore_ascii_case(&target))
            .count()
    };

    while let Some(&c) = chars.get(i) {
        match c {
            '"' => {
                let text: String = chars.iter().skip(i + 1).take_while(|&&ch| ch != '"').collect();
                i += text.chars().count() + 2;
                literal.push_str(&text);
            }
            '\\' => {
                if let Some(&next) = chars.get(i + 1) {
                    literal.push(next);
                }
                i += 2;
            }
            '_' => {
                // Padding the width of the next character.
                literal.push(' ');
                i += 2;
            }
            '*' => i += 2,
            '[' => {
                let content: String = chars.iter().skip(i + 1).take_while(|&&ch| ch != ']').collect();
                i += content.chars().count() + 2;
                let lower = content.to_ascii_lowercase();
                if !lower.is_empty() && lower.chars().all(|ch| ch == 'h') {
                    flush!();
                    section.tokens.push(Token::ElapsedHours);
                } else if !lower.is_empty() && lower.chars().all(|ch| ch == 'm') {
                    flush!();
                    section.tokens.push(Token::ElapsedMinutes);
                } else if !lower.is_empty() && lower.chars().all(|ch| ch == 's') {
                    flush!();
                    section.tokens.push(Token::ElapsedSeconds);
                } else if let Some(condition) = parse_condition(&content) {
                    section.condition = Some(condition);
                } else if let Some(currency) = content.strip_prefix('$') {
                    // [$€-407]: currency symbol plus locale.
                    literal.push_str(currency.split('-').next().unwrap_or(""));
                }
                // Colors and bare locales render nothing.
            }
            '%' => {
                section.percent += 1;
                literal.push('%');
                i += 1;
            }
            '@' => {
                flush!();
                section.tokens.push(Token::Text);
                i += 1;
            }
            '0' | '#' | '?' | '.' | ','
                if !is_date && section.number.is_none() && starts_number(&chars, i) =>
            {
                flush!();
                let body: String = chars
                    .iter()
                    .skip(i)
                    .take_while(|ch| matches!(ch, '0' | '#' | '?' | '.' | ','))
                    .collect();
                i += body.chars().count();
                section.number = Some(parse_number_pattern(&body));
                section.tokens.push(Token::Number);
            }
            '.' if is_date && chars.get(i + 1) == Some(&'0') => {
                flush!();
                let digits = chars.iter().skip(i + 1).take_while(|&&ch| ch == '0').count();
                section.second_digits = u32::try_from(digits).unwrap_or(0).min(3);
                section.tokens.push(Token::FracSecond);
                i += digits + 1;
            }
            'y' | 'Y' | 'm' | 'M' | 'd' | 'D' | 'h' | 'H' | 's' | 'S' if is_date => {
                flush!();
                let len = run_len(i, c);
                section.tokens.push(match c.to_ascii_lowercase() {
                    'y' => Token::Year(len),
                    'm' => Token::Month(len),
                    'd' => Token::Day(len),
                    'h' => Token::Hour(len),
                    _ => Token::Second(len),
                });
                i += len;
            }
            'a' | 'A' if is_date => {
                let rest: String = chars.iter().skip(i).take(5).collect::<String>().to_ascii_lowercase();
                if rest.starts_with("am/pm") {
                    flush!();
                    section.tokens.push(Token::AmPm { short: false });
                    i += 5;
                } else if rest.starts_with("a/p") {
                    flush!();
                    section.tokens.push(Token::AmPm { short: true });
                    i += 3;
                } else {
                    literal.push(c);
                    i += 1;
                }
            }
            _ => {
                literal.push(c);
                i += 1;
            }
        }
    }
    flush!();

    resolve_minutes(&mut section.tokens);
    section
}

/// Whether the placeholder run starting at `i` contains a digit placeholder.
fn starts_number(chars: &[char], i: usize) -> bool {
    chars
        .iter()
        .skip(i)
        .take_while(|ch| matches!(ch, '0' | '#' | '?' | '.' | ','))
        .any(|ch| matches!(ch, '0' | '#' | '?'))
}

fn parse_condition(content: &str) -> Option<Condition> {
    let (op, rest) = if let Some(rest) = content.strip_prefix("<=") {
        (CompareOp::Le, rest)
    } else if let Some(rest) = content.strip_prefix(">=") {
        (CompareOp::Ge, rest)
    } else if let Some(rest) = content.strip_prefix("<>") {
        (CompareOp::Ne, rest)
    } else if let Some(rest) = content.strip_prefix('<') {
        (CompareOp::Lt, rest)
    } else if let Some(rest) = content.strip_prefix('>') {
        (CompareOp::Gt, rest)
    } else if let Some(rest) = content.strip_prefix('=') {
        (CompareOp::Eq, rest)
    } else {
        return None;
    };
    let threshold = rest.trim().parse().ok()?;
    Some(Condition { op, threshold })
}

fn parse_number_pattern(body: &str) -> NumberPattern {
    let trimmed = body.trim_end_matches(',');
    let scale = u32::try_from(body.len() - trimmed.len()).unwrap_or(0);
    let (int_part, frac_part) = match trimmed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (trimmed, None),
    };
    let frac = frac_part.unwrap_or("");
    NumberPattern {
        int_min: int_part.matches('0').count(),
        frac_min: frac.matches('0').count(),
        frac_max: frac.chars().filter(|c| matches!(c, '0' | '#' | '?')).count(),
        has_point: frac_part.is_some(),
        thousands: int_part.contains(','),
        scale,
    }
}

/// `m` right after an hour or right before a second means minutes.
fn resolve_minutes(tokens: &mut [Token]) {
    let date_positions: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| !matches!(t, Token::Literal(_)))
        .map(|(i, _)| i)
        .collect();

    for (n, &pos) in date_positions.iter().enumerate() {
        let Some(Token::Month(len)) = tokens.get(pos).cloned() else {
            continue;
        };
        if len > 2 {
            continue;
        }
        let after_hour = n
            .checked_sub(1)
            .and_then(|p| date_positions.get(p))
            .and_then(|&p| tokens.get(p))
            .is_some_and(|t| matches!(t, Token::Hour(_) | Token::ElapsedHours));
        let before_second = date_positions
            .get(n + 1)
            .and_then(|&p| tokens.get(p))
            .is_some_and(|t| matches!(t, Token::Second(_) | Token::ElapsedSeconds));
        if after_hour || before_second {
            if let Some(slot) = tokens.get_mut(pos) {
                *slot = Token::Minute(len);
            }
        }
    }
}

impl Section {
    fn render(&self, value: f64, signed: bool, date1904: bool) -> String {
        if self.is_date {
            return self.render_date(value, date1904);
        }
        let magnitude = if signed { value } else { value.abs() };

        let mut out = String::new();
        let mut scaled = magnitude.abs();
        for _ in 0..self.percent {
            scaled *= 100.0;
        }
        if let Some(pattern) = self.number {
            for _ in 0..pattern.scale {
                scaled /= 1000.0;
            }
        }

        let body = self.number.map(|p| format_pattern(scaled, p));
        if signed && magnitude < 0.0 && body.as_deref().is_some_and(|b| b.chars().any(|c| c.is_ascii_digit() && c != '0')) {
            out.push('-');
        }

        for token in &self.tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Number => out.push_str(body.as_deref().unwrap_or("")),
                Token::Text => out.push_str(&format_general(value)),
                _ => {}
            }
        }
        out
    }

    #[allow(clippy::cast_possible_truncation)]
    fn render_date(&self, value: f64, date1904: bool) -> String {
        // Serials outside 0..=9999-12-31 cannot be shown as dates.
        if !(0.0..2_958_466.0).contains(&value) {
            return format_general(value);
        }
        let unit = 10_i64.pow(self.second_digits);
        #[allow(clippy::cast_precision_loss)]
        let total_units = (value * 86_400.0 * unit as f64).round() as i64;
        let total_seconds = total_units.div_euclid(unit);
        let sub_second = total_units.rem_euclid(unit);
        let days = total_seconds.div_euclid(86_400);
        let seconds_of_day = total_seconds.rem_euclid(86_400);

        let (year, month, day, weekday) = serial_to_date(days, date1904);
        let hour = seconds_of_day / 3600;
        let minute = (seconds_of_day % 3600) / 60;
        let second = seconds_of_day % 60;
        let twelve_hour = self.tokens.iter().any(|t| matches!(t, Token::AmPm { .. }));

        let mut out = String::new();
        for token in &self.tokens {
            match *token {
                Token::Literal(ref text) => out.push_str(text),
                Token::Year(len) if len <= 2 => out.push_str(&format!("{:02}", year.rem_euclid(100))),
                Token::Year(_) => out.push_str(&year.to_string()),
                Token::Month(1) => out.push_str(&month.to_string()),
                Token::Month(2) => out.push_str(&format!("{month:02}")),
                Token::Month(3) => out.push_str(month_name(month).get(..3).unwrap_or("")),
                Token::Month(5) => out.push_str(month_name(month).get(..1).unwrap_or("")),
                Token::Month(_) => out.push_str(month_name(month)),
                Token::Day(1) => out.push_str(&day.to_string()),
                Token::Day(2) => out.push_str(&format!("{day:02}")),
                Token::Day(3) => out.push_str(day_name(weekday).get(..3).unwrap_or("")),
                Token::Day(_) => out.push_str(day_name(weekday)),
                Token::Hour(len) => {
                    let h = if twelve_hour {
                        match hour % 12 {
                            0 => 12,
                            h => h,
                        }
                    } else {
                        hour
                    };
                    out.push_str(&pad(h, len));
                }
                Token::Minute(len) => out.push_str(&pad(minute, len)),
                Token::Second(len) => out.push_str(&pad(second, len)),
                Token::FracSecond => {
                    let width = usize::try_from(self.second_digits).unwrap_or(1);
                    out.push('.');
                    out.push_str(&format!("{sub_second:0width$}"));
                }
                Token::ElapsedHours => out.push_str(&(total_seconds / 3600).to_string()),
                Token::ElapsedMinutes => out.push_str(&(total_seconds / 60).to_string()),
                Token::ElapsedSeconds => out.push_str(&total_seconds.to_string()),
                Token::AmPm { short } => {
                    let am = hour < 12;
                    out.push_str(match (short, am) {
                        (false, true) => "AM",
                        (false, false) => "PM",
                        (true, true) => "A",
                        (true, false) => "P",
                    });
                }
                Token::Number | Token::Text => {}
            }
        }
        out
    }
}

fn pad(value: i64, len: usize) -> String {
    if len >= 2 {
        format!("{value:02}")
    } else {
        value.to_string()
    }
}

fn format_pattern(value: f64, pattern: NumberPattern) -> String {
    let rounded = format!("{:.*}", pattern.frac_max, value);
    let (int_digits, frac_digits) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));

    let mut frac = frac_digits.to_string();
    while frac.len() > pattern.frac_min && frac.ends_with('0') {
        frac.pop();
    }

    let mut int_part = if int_digits == "0" && pattern.int_min == 0 {
        String::new()
    } else {
        int_digits.to_string()
    };
    while int_part.len() < pattern.int_min {
        int_part.insert(0, '0');
    }
    if pattern.thousands {
        int_part = group_thousands(&int_part);
    }

    if pattern.has_point {
        format!("{int_part}.{frac}")
    } else {
        int_part
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// General format: integers as-is, other values to at most ten decimals,
/// scientific for very large or very small magnitudes.
#[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
pub fn format_general(value: f64) -> String {
    if !value.is_finite() {
        return "#NUM!".to_string();
    }
    let magnitude = value.abs();
    if value == value.trunc() && magnitude < 1e11 {
        return format!("{}", value as i64);
    }
    if magnitude >= 1e11 || magnitude < 1e-9 {
        let formatted = format!("{value:.5E}");
        let (mantissa, exponent) = formatted.split_once('E').unwrap_or((formatted.as_str(), "0"));
        let mantissa = mantissa.trim_end_matches('0').trim_end_matches('.');
        let exponent: i32 = exponent.parse().unwrap_or(0);
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}E{sign}{:02}", exponent.abs());
    }
    let s = format!("{value:.10}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// (year, month, day, weekday with 0 = Sunday) for a serial day number.
fn serial_to_date(days: i64, date1904: bool) -> (i64, i64, i64, i64) {
    let jdn = if date1904 {
        days + 2_416_481
    } else if days <= 60 {
        // Serial 60 is the fictitious 1900-02-29.
        days + 2_415_020
    } else {
        days + 2_415_019
    };
    let (year, month, day) = jdn_to_ymd(jdn);
    (year, month, day, (jdn + 1).rem_euclid(7))
}

/// Julian day number to proleptic Gregorian (year, month, day).
fn jdn_to_ymd(jdn: i64) -> (i64, i64, i64) {
    let f = jdn + 1401 + (((4 * jdn + 274_277) / 146_097) * 3) / 4 - 38;
    let e = 4 * f + 3;
    let g = (e % 1461) / 4;
    let h = 5 * g + 2;
    let day = (h % 153) / 5 + 1;
    let month = ((h / 153 + 2) % 12) + 1;
    let year = e / 1461 - 4716 + (14 - month) / 12;
    (year, month, day)
}

fn month_name(month: i64) -> &'static str {
    const NAMES: [&str; 12] = [
        "January", "February", "March", "April", "May", "June", "July", "August", "September",
        "October", "November", "December",
    ];
    usize::try_from(month - 1)
        .ok()
        .and_then(|i| NAMES.get(i))
        .copied()
        .unwrap_or("")
}

fn day_name(weekday: i64) -> &'static str {
    const NAMES: [&str; 7] = [
        "Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
    ];
    usize::try_from(weekday)
        .ok()
        .and_then(|i| NAMES.get(i))
        .copied()
        .unwrap_or("")
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use test_case::test_case;

    // ---------------------------------------------------------------------
    // General
    // ---------------------------------------------------------------------

    #[test_case(42.0, "42")]
    #[test_case(-7.0, "-7")]
    #[test_case(0.5, "0.5")]
    #[test_case(0.1 + 0.2, "0.3")]
    #[test_case(1.5e12, "1.5E+12")]
    #[test_case(0.0, "0")]
    fn test_general(value: f64, expected: &str) {
        assert_eq!(format_number(value, "General", false), expected);
    }

    // ---------------------------------------------------------------------
    // Numbers
    // ---------------------------------------------------------------------

    #[test_case(1234.567, "0", "1235")]
    #[test_case(1234.567, "0.00", "1234.57")]
    #[test_case(1234.567, "#,##0", "1,235")]
    #[test_case(1_234_567.891, "#,##0.00", "1,234,567.89")]
    #[test_case(0.256, "0%", "26%")]
    #[test_case(0.256, "0.00%", "25.60%")]
    #[test_case(5.0, "000", "005")]
    #[test_case(0.5, "#.##", ".5")]
    #[test_case(2.5, "0.0#", "2.5")]
    #[test_case(2.456, "0.0#", "2.46")]
    #[test_case(1_500_000.0, "#,##0.0,,\"M\"", "1.5M")]
    #[test_case(12.0, "\"Total: \"0", "Total: 12")]
    #[test_case(12.0, "$#,##0.00", "$12.00")]
    #[test_case(12.0, "[$€-407]#,##0", "€12")]
    #[test_case(-12.0, "0.00", "-12.00")]
    fn test_numeric(value: f64, code: &str, expected: &str) {
        assert_eq!(format_number(value, code, false), expected);
    }

    #[test]
    fn test_sections() {
        let code = "#,##0.00;(#,##0.00);\"zero\"";
        assert_eq!(format_number(1234.5, code, false), "1,234.50");
        assert_eq!(format_number(-1234.5, code, false), "(1,234.50)");
        assert_eq!(format_number(0.0, code, false), "zero");
        assert_eq!(format_number(-5.0, "0;[Red]0", false), "5");
    }

    #[test]
    fn test_padding_and_conditions() {
        assert_eq!(format_number(3.0, "0_)", false), "3 ");
        assert_eq!(format_number(150.0, "[>100]\"big\";0", false), "big");
        assert_eq!(format_number(50.0, "[>100]\"big\";0", false), "50");
    }

    #[test]
    fn test_text_placeholder() {
        assert_eq!(format_number(12.5, "@", false), "12.5");
    }

    // ---------------------------------------------------------------------
    // Dates and times
    // ---------------------------------------------------------------------

    #[test_case(45292.0, "yyyy-mm-dd", "2024-01-01")]
    #[test_case(45292.0, "mm-dd-yy", "01-01-24")]
    #[test_case(45292.0, "d-mmm-yy", "1-Jan-24")]
    #[test_case(45292.0, "dddd, mmmm d", "Monday, January 1")]
    #[test_case(45292.0, "mmm-yy", "Jan-24")]
    #[test_case(45292.75, "h:mm AM/PM", "6:00 PM")]
    #[test_case(45292.5, "h:mm:ss", "12:00:00")]
    #[test_case(45292.0 + 1.0 / 24.0 + 5.0 / 1440.0, "m/d/yy h:mm", "1/1/24 1:05")]
    #[test_case(1.5, "[h]:mm:ss", "36:00:00")]
    #[test_case(0.000_7, "mm:ss", "01:00")]
    #[test_case(1.0, "yyyy-mm-dd", "1900-01-01")]
    #[test_case(61.0, "yyyy-mm-dd", "1900-03-01")]
    fn test_dates(value: f64, code: &str, expected: &str) {
        assert_eq!(format_number(value, code, false), expected);
    }

    #[test]
    fn test_date1904() {
        assert_eq!(format_number(0.0, "yyyy-mm-dd", true), "1904-01-01");
        assert_eq!(format_number(43830.0, "yyyy-mm-dd", true), "2024-01-01");
    }

    #[test]
    fn test_fractional_seconds() {
        let value = 12.3 / 86_400.0;
        assert_eq!(format_number(value, "mmss.0", false), "0012.3");
    }

    #[test]
    fn test_negative_date_falls_back() {
        assert_eq!(format_number(-1.0, "yyyy-mm-dd", false), "-1");
    }

    #[test]
    fn test_builtins() {
        assert_eq!(builtin_format(14), Some("mm-dd-yy"));
        assert_eq!(builtin_format(49), Some("@"));
        assert_eq!(builtin_format(11), None);
        assert!(NumberFormat::compile(builtin_format(0).unwrap()).is_general());
    }
}
