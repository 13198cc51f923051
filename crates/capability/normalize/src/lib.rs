//! 遥测报文解析。
//!
//! 报文为一行 ASCII 文本，由逗号分隔的 `KEY=VALUE` 记号组成：
//!
//! ```text
//! DEV=<int>,TYPE=ENV,TEMP=<float>,HUM=<float>
//! DEV=<int>,TYPE=KEYPAD,KEY=<char>
//! DEV=<int>,TYPE=SENSOR,GPIO=<int>,STATE=<0|1>
//! DEV=<int>,TYPE=ROTARY,L=<0|1>,R=<0|1>
//! ```
//!
//! 前两个记号固定为 `DEV`、`TYPE`，其余字段按类型顺序出现，不允许多余字段。
//! `KEY` 的值是任意单个字符（包括逗号），但空格会随行尾空白一起被去掉。
//! 解析是纯函数，不做任何 I/O，失败时返回带原因码的 [`ParseError`]。

use domain::{MotionState, TelemetryMessage, TelemetryUpdate};
use std::ops::RangeInclusive;

/// 解析错误。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("payload is not ascii text")]
    Encoding,
    #[error("empty message")]
    Empty,
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("malformed token: {0}")]
    MalformedToken(String),
    #[error("expected field {expected}, found {found}")]
    UnexpectedField {
        expected: &'static str,
        found: String,
    },
    #[error("invalid number for {field}: {value}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("invalid flag for {field}: {value}")]
    InvalidFlag { field: &'static str, value: String },
    #[error("invalid key: {0:?}")]
    InvalidKey(String),
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("unknown message type: {0}")]
    UnknownType(String),
    #[error("unexpected trailing field: {0}")]
    TrailingField(String),
}

impl ParseError {
    /// 稳定的原因码，用于日志与指标。
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Encoding => "encoding",
            Self::Empty => "empty",
            Self::MissingField(_) => "missing_field",
            Self::MalformedToken(_) => "malformed_token",
            Self::UnexpectedField { .. } => "unexpected_field",
            Self::InvalidNumber { .. } => "invalid_number",
            Self::InvalidFlag { .. } => "invalid_flag",
            Self::InvalidKey(_) => "invalid_key",
            Self::OutOfRange { .. } => "out_of_range",
            Self::UnknownType(_) => "unknown_type",
            Self::TrailingField(_) => "trailing_field",
        }
    }
}

/// 数值合法范围，超出范围的读数不进入点表。
#[derive(Debug, Clone)]
pub struct ValueLimits {
    pub temperature: RangeInclusive<f64>,
    pub humidity: RangeInclusive<f64>,
}

impl Default for ValueLimits {
    fn default() -> Self {
        Self {
            temperature: -40.0..=125.0,
            humidity: 0.0..=100.0,
        }
    }
}

/// 报文解析器。
#[derive(Debug, Clone, Default)]
pub struct MessageParser {
    limits: ValueLimits,
}

impl MessageParser {
    pub fn new(limits: ValueLimits) -> Self {
        Self { limits }
    }

    /// 解析一条原始报文。
    pub fn parse(&self, payload: &[u8]) -> Result<TelemetryMessage, ParseError> {
        if !payload.is_ascii() {
            return Err(ParseError::Encoding);
        }
        let text = std::str::from_utf8(payload).map_err(|_| ParseError::Encoding)?;
        let text = text.trim_matches(|c: char| c == '\0' || c.is_ascii_whitespace());
        if text.is_empty() {
            return Err(ParseError::Empty);
        }

        let mut tokens = Tokens::new(text);
        let device_id = parse_number::<i64>("DEV", tokens.expect("DEV")?)?;
        let kind = tokens.expect("TYPE")?;

        let update = match kind {
            "ENV" => {
                let temperature = parse_float("TEMP", tokens.expect("TEMP")?)?;
                let humidity = parse_float("HUM", tokens.expect("HUM")?)?;
                ensure_range("TEMP", temperature, &self.limits.temperature)?;
                ensure_range("HUM", humidity, &self.limits.humidity)?;
                TelemetryUpdate::Environment {
                    temperature,
                    humidity,
                }
            }
            "KEYPAD" => TelemetryUpdate::Keypad {
                key: tokens.expect_char("KEY")?,
            },
            "SENSOR" => {
                let gpio = parse_number::<u32>("GPIO", tokens.expect("GPIO")?)?;
                let state = parse_flag("STATE", tokens.expect("STATE")?)?;
                TelemetryUpdate::Motion {
                    gpio,
                    state: MotionState::from_flag(state),
                }
            }
            "ROTARY" => {
                let left = parse_flag("L", tokens.expect("L")?)?;
                let right = parse_flag("R", tokens.expect("R")?)?;
                TelemetryUpdate::Rotary { left, right }
            }
            other => return Err(ParseError::UnknownType(other.to_string())),
        };
        tokens.finish()?;

        Ok(TelemetryMessage { device_id, update })
    }
}

/// 使用默认数值范围解析一条报文。
pub fn parse_message(payload: &[u8]) -> Result<TelemetryMessage, ParseError> {
    MessageParser::default().parse(payload)
}

/// 按顺序消费 `KEY=VALUE` 记号。
struct Tokens<'a> {
    rest: Option<&'a str>,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self { rest: Some(text) }
    }

    fn next_token(&mut self) -> Option<&'a str> {
        let rest = self.rest?;
        match rest.split_once(',') {
            Some((token, tail)) => {
                self.rest = Some(tail);
                Some(token)
            }
            None => {
                self.rest = None;
                Some(rest)
            }
        }
    }

    fn expect(&mut self, key: &'static str) -> Result<&'a str, ParseError> {
        let token = self.next_token().ok_or(ParseError::MissingField(key))?;
        let value = Self::value_of(token, key)?;
        Ok(value.trim())
    }

    /// 单字符字段，字符本身可以是逗号，因此不按逗号预先切分。
    ///
    /// 空格无法作为按键发送：整行首尾空白在切分前已被去掉。
    fn expect_char(&mut self, key: &'static str) -> Result<char, ParseError> {
        let rest = self.rest.take().ok_or(ParseError::MissingField(key))?;
        let value = Self::value_of(rest, key)?;
        let mut chars = value.chars();
        let Some(ch) = chars.next() else {
            return Err(ParseError::InvalidKey(String::new()));
        };
        let tail = chars.as_str();
        if tail.is_empty() {
            return Ok(ch);
        }
        match tail.strip_prefix(',') {
            // 余下部分交给 finish() 报告多余字段
            Some(trailing) => {
                self.rest = Some(trailing);
                Ok(ch)
            }
            None => Err(ParseError::InvalidKey(value.to_string())),
        }
    }

    fn value_of(token: &'a str, key: &'static str) -> Result<&'a str, ParseError> {
        let (found, value) = token
            .split_once('=')
            .ok_or_else(|| ParseError::MalformedToken(token.to_string()))?;
        if found.trim() != key {
            return Err(ParseError::UnexpectedField {
                expected: key,
                found: found.to_string(),
            });
        }
        Ok(value)
    }

    fn finish(mut self) -> Result<(), ParseError> {
        match self.next_token() {
            Some(token) => Err(ParseError::TrailingField(token.to_string())),
            None => Ok(()),
        }
    }
}

fn parse_number<T: std::str::FromStr>(
    field: &'static str,
    value: &str,
) -> Result<T, ParseError> {
    value.parse::<T>().map_err(|_| ParseError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

fn parse_float(field: &'static str, value: &str) -> Result<f64, ParseError> {
    let parsed = parse_number::<f64>(field, value)?;
    // "NaN"/"inf" 能被 f64 解析，但不是有效读数
    if !parsed.is_finite() {
        return Err(ParseError::InvalidNumber {
            field,
            value: value.to_string(),
        });
    }
    Ok(parsed)
}

fn parse_flag(field: &'static str, value: &str) -> Result<bool, ParseError> {
    match value {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(ParseError::InvalidFlag {
            field,
            value: value.to_string(),
        }),
    }
}

fn ensure_range(
    field: &'static str,
    value: f64,
    range: &RangeInclusive<f64>,
) -> Result<(), ParseError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ParseError::OutOfRange { field, value })
    }
}
