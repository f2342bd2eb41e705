use std::cmp::Ordering;
use std::fmt;

/// Runtime value. Integers and decimals share the `Number` kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            // NaN counts as nonzero
            Value::Number(n) => *n != 0.0,
            Value::Text(s) => !s.is_empty(),
        }
    }

    /// Numeric coercion used by the arithmetic and ordering operators.
    /// Blank text is 0, `0x`/`0o`/`0b` prefixes select a radix, `Infinity`
    /// is spelled out in full, and anything else unparsable is NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Text(s) => text_to_number(s.trim()),
        }
    }

    /// Two texts order lexicographically; anything else orders numerically.
    /// `None` when either side is NaN.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Text(l), Value::Text(r)) => Some(l.cmp(r)),
            (l, r) => l.to_number().partial_cmp(&r.to_number()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Text(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

fn text_to_number(text: &str) -> f64 {
    match text {
        "" => return 0.0,
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let radix = match text.get(..2) {
        Some("0x") | Some("0X") => 16,
        Some("0o") | Some("0O") => 8,
        Some("0b") | Some("0B") => 2,
        _ => 10,
    };

    if radix != 10 {
        let digits = &text[2..];
        if digits.is_empty() {
            return f64::NAN;
        }
        return digits
            .chars()
            .try_fold(0.0, |acc, c| c.to_digit(radix).map(|d| acc * radix as f64 + d as f64))
            .unwrap_or(f64::NAN);
    }

    // `str::parse` also takes "inf" and "nan", which are not numbers here.
    if !text.chars().all(|c| c.is_ascii_digit() || "+-.eE".contains(c)) {
        return f64::NAN;
    }
    text.parse::<f64>().unwrap_or(f64::NAN)
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let magnitude = n.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let formatted = format!("{:e}", n);
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => formatted,
        };
    }

    format!("{}", n)
}
