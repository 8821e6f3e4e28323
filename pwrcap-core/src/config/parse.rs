//! Minimal TOML reader for capture configuration
//!
//! Handles only what `capture.toml` needs, without allocation:
//! - `[capture]`, `[transfer]` and `[debug]` section headers
//! - `key = value` pairs with string, integer and boolean values
//! - `#` comments, whole-line and trailing
//!
//! Unknown keys are ignored so newer files still load on older firmware.
//! Values are not validated here; call [`CaptureConfig::validate`] after
//! parsing.

use super::types::{CaptureConfig, CaptureMode};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Value of the wrong type or out of range
    InvalidValue,
    /// Key outside any section
    KeyOutsideSection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Capture,
    Transfer,
    Debug,
}

/// Parse a capture configuration, starting from defaults
pub fn parse_config(input: &str) -> Result<CaptureConfig, ParseError> {
    let mut config = CaptureConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            section = parse_section_header(line)?;
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            apply_value(section, key, value, &mut config)?;
        }
    }

    Ok(config)
}

/// Parse "[name]" with an optional trailing comment
fn parse_section_header(line: &str) -> Result<Section, ParseError> {
    let end = line.find(']').ok_or(ParseError::InvalidSection)?;
    let rest = line[end + 1..].trim();
    if !rest.is_empty() && !rest.starts_with('#') {
        return Err(ParseError::InvalidSection);
    }

    match line[1..end].trim() {
        "capture" => Ok(Section::Capture),
        "transfer" => Ok(Section::Transfer),
        "debug" => Ok(Section::Debug),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove trailing comments that are not inside a string
    let value = match value.find('#') {
        Some(hash_pos) if value[..hash_pos].matches('"').count() % 2 == 0 => {
            value[..hash_pos].trim()
        }
        _ => value,
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Strip surrounding quotes, if any
fn parse_string(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Parse an integer, allowing TOML `_` digit separators
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    let mut digits: heapless::String<24> = heapless::String::new();
    for c in value.chars().filter(|&c| c != '_') {
        digits.push(c).map_err(|_| ParseError::InvalidValue)?;
    }
    digits.parse().map_err(|_| ParseError::InvalidValue)
}

fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Parse a pin number, unquoted like the serde schema expects
///
/// Unassigned pins are written as any number at or above
/// [`MAX_VALID_PIN_NUMBER`](pwrcap_hal::gpio::MAX_VALID_PIN_NUMBER).
fn parse_pin(value: &str) -> Result<u32, ParseError> {
    parse_int(value)
}

fn parse_mode(value: &str) -> Result<CaptureMode, ParseError> {
    match parse_string(value) {
        "disabled" => Ok(CaptureMode::Disabled),
        "init_only" => Ok(CaptureMode::InitOnly),
        "continuous" => Ok(CaptureMode::Continuous),
        "burst" => Ok(CaptureMode::Burst),
        _ => Err(ParseError::InvalidValue),
    }
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut CaptureConfig,
) -> Result<(), ParseError> {
    match section {
        Section::Root => return Err(ParseError::KeyOutsideSection),
        Section::Capture => {
            let c = &mut config.capture;
            match key {
                "mode" => c.mode = parse_mode(value)?,
                "burst_size" => c.burst_size = parse_int(value)?,
                "timer_period_ticks" => c.timer_period_ticks = parse_int(value)?,
                "iom" => c.iom = Some(parse_int(value)?),
                _ => {}
            }
        }
        Section::Transfer => {
            let t = &mut config.transfer;
            match key {
                "total_bytes" => t.total_bytes = parse_int(value)?,
                "fifo_threshold" => t.fifo_threshold = parse_int(value)?,
                "double_buffered" => t.double_buffered = parse_bool(value)?,
                _ => {}
            }
        }
        Section::Debug => {
            let d = &mut config.debug;
            match key {
                "print_enabled" => d.print_enabled = parse_bool(value)?,
                "print_in_loop" => d.print_in_loop = parse_bool(value)?,
                "pins_enabled" => d.pins_enabled = parse_bool(value)?,
                "transfer_pin" => d.transfer_pin = parse_pin(value)?,
                "burst_pin" => d.burst_pin = parse_pin(value)?,
                "sleep_pin" => d.sleep_pin = parse_pin(value)?,
                _ => {}
            }
        }
    }

    Ok(())
}
