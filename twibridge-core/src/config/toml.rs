//! Minimal TOML parser for the bridge configuration
//!
//! Handles only the subset the configuration file needs. It does NOT
//! support the full TOML grammar.
//!
//! Supported features:
//! - `[uart]`, `[i2c]` and `[frame]` section headers
//! - Key = value pairs (string, integer, boolean)
//! - Decimal and `0x` hex integers, `_` digit separators
//! - Comments (# ...)
//!
//! Keys left out keep their defaults.

use twibridge_hal::uart::{DataBits, Parity, StopBits};
use twibridge_hal::BusTiming;

use super::types::{BridgeConfig, MAX_DEADLINE_MS};
use crate::bitbang::WaitBudget;
use crate::bridge::FailurePolicy;

/// Parse error, tagged with the 1-based line number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Section header names no known section
    UnknownSection(usize),
    /// Key is not valid in its section
    UnknownKey(usize),
    /// Value has the wrong type or is out of range
    InvalidValue(usize),
    /// Line is neither a header nor `key = value`
    Malformed(usize),
}

impl ConfigError {
    /// Line the error was found on
    pub fn line(&self) -> usize {
        match *self {
            ConfigError::UnknownSection(line)
            | ConfigError::UnknownKey(line)
            | ConfigError::InvalidValue(line)
            | ConfigError::Malformed(line) => line,
        }
    }
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Uart,
    I2c,
    Frame,
}

/// Value-level failure, before the line number is attached
#[derive(Debug)]
enum ValueError {
    UnknownKey,
    Invalid,
}

/// Parse TOML configuration into a [`BridgeConfig`]
pub fn parse_config(input: &str) -> Result<BridgeConfig, ConfigError> {
    let mut config = BridgeConfig::default();
    let mut section = Section::Root;

    for (index, line) in input.lines().enumerate() {
        let number = index + 1;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            section = parse_section_header(line).ok_or(ConfigError::UnknownSection(number))?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ConfigError::Malformed(number))?;
        apply_value(&mut config, section, key, value).map_err(|e| match e {
            ValueError::UnknownKey => ConfigError::UnknownKey(number),
            ValueError::Invalid => ConfigError::InvalidValue(number),
        })?;
    }

    Ok(config)
}

fn parse_section_header(line: &str) -> Option<Section> {
    let name = line.strip_prefix('[')?;
    let name = strip_comment(name).strip_suffix(']')?.trim();
    match name {
        "uart" => Some(Section::Uart),
        "i2c" => Some(Section::I2c),
        "frame" => Some(Section::Frame),
        _ => None,
    }
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = strip_comment(value.trim());

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Drop a trailing `# comment` unless the `#` sits inside a string
fn strip_comment(value: &str) -> &str {
    match value.find('#') {
        Some(pos) if value[..pos].matches('"').count() % 2 == 0 => value[..pos].trim(),
        _ => value,
    }
}

fn apply_value(
    config: &mut BridgeConfig,
    section: Section,
    key: &str,
    value: &str,
) -> Result<(), ValueError> {
    match (section, key) {
        (Section::Uart, "baudrate") => {
            config.uart.baudrate = nonzero(parse_uint(value)?)?;
        }
        (Section::Uart, "data_bits") => {
            config.uart.data_bits =
                DataBits::from_count(narrow(parse_uint(value)?)?).ok_or(ValueError::Invalid)?;
        }
        (Section::Uart, "parity") => {
            config.uart.parity = Parity::from_name(parse_string(value)?).ok_or(ValueError::Invalid)?;
        }
        (Section::Uart, "stop_bits") => {
            config.uart.stop_bits =
                StopBits::from_count(narrow(parse_uint(value)?)?).ok_or(ValueError::Invalid)?;
        }
        (Section::I2c, "divisor") => {
            config.i2c.divisor = narrow(nonzero(parse_uint(value)?)?)?;
        }
        (Section::I2c, "status_bits") => {
            config.i2c.status_bits = narrow(parse_uint(value)?)?;
        }
        (Section::I2c, "timing") => {
            config.i2c.timing = BusTiming::from_name(parse_string(value)?).ok_or(ValueError::Invalid)?;
        }
        (Section::I2c, "stretch_polls") => {
            // Zero waits forever
            config.i2c.stretch = match parse_uint(value)? {
                0 => WaitBudget::Unbounded,
                polls => WaitBudget::Polls(polls),
            };
        }
        (Section::I2c, "wait_polls") => {
            config.i2c.wait_polls = nonzero(parse_uint(value)?)?;
        }
        (Section::Frame, "deadline_ms") => {
            let deadline_ms = nonzero(parse_uint(value)?)?;
            if deadline_ms > MAX_DEADLINE_MS {
                return Err(ValueError::Invalid);
            }
            config.frame.deadline_ms = deadline_ms;
        }
        (Section::Frame, "policy") => {
            config.frame.policy =
                FailurePolicy::from_name(parse_string(value)?).ok_or(ValueError::Invalid)?;
        }
        (Section::Frame, "drain_on_error") => {
            config.frame.policy = if parse_bool(value)? {
                FailurePolicy::Drain
            } else {
                FailurePolicy::Continue
            };
        }
        _ => return Err(ValueError::UnknownKey),
    }
    Ok(())
}

fn parse_string(value: &str) -> Result<&str, ValueError> {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or(ValueError::Invalid)
}

fn parse_bool(value: &str) -> Result<bool, ValueError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ValueError::Invalid),
    }
}

fn parse_uint(value: &str) -> Result<u32, ValueError> {
    let (digits, radix) = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (value, 10),
    };
    if digits.is_empty() || digits.starts_with('_') || digits.ends_with('_') {
        return Err(ValueError::Invalid);
    }

    let mut result: u32 = 0;
    for c in digits.chars().filter(|&c| c != '_') {
        let digit = c.to_digit(radix).ok_or(ValueError::Invalid)?;
        result = result
            .checked_mul(radix)
            .and_then(|r| r.checked_add(digit))
            .ok_or(ValueError::Invalid)?;
    }
    Ok(result)
}

fn narrow(value: u32) -> Result<u8, ValueError> {
    u8::try_from(value).map_err(|_| ValueError::Invalid)
}

fn nonzero(value: u32) -> Result<u32, ValueError> {
    if value == 0 {
        Err(ValueError::Invalid)
    } else {
        Ok(value)
    }
}
