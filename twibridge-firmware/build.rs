//! Build script for twibridge-firmware
//!
//! - Passes the linker scripts (memory.x comes from embassy-stm32)
//! - Validates bridge.toml at compile time

use std::fs;
use std::path::Path;

fn main() {
    setup_linker();
    validate_config();
}

/// Linker arguments for cortex-m-rt and defmt
fn setup_linker() {
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate bridge.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=bridge.toml");

    let config_path = Path::new("bridge.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: bridge.toml not found!                                   ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds bridge.toml from the crate directory.       ║\n\
            ║  An empty file selects the default configuration.                ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read bridge.toml                               ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in bridge.toml                       ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_sections(&config, &mut errors);
    validate_uart(&config, &mut errors);
    validate_i2c(&config, &mut errors);
    validate_frame(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid configuration in bridge.toml                     ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=bridge.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

const SECTIONS: &[(&str, &[&str])] = &[
    ("uart", &["baudrate", "data_bits", "parity", "stop_bits"]),
    (
        "i2c",
        &["divisor", "status_bits", "timing", "stretch_polls", "wait_polls"],
    ),
    ("frame", &["deadline_ms", "policy", "drain_on_error"]),
];

/// Only known sections and keys; the firmware parser rejects anything else
fn validate_sections(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(root) = config.as_table() else {
        return;
    };

    for (name, section) in root {
        let Some(keys) = SECTIONS.iter().find(|(s, _)| *s == name.as_str()).map(|(_, k)| *k) else {
            errors.push(format!("unknown section [{}]", name));
            continue;
        };
        let Some(table) = section.as_table() else {
            errors.push(format!("[{}] must be a table", name));
            continue;
        };
        for key in table.keys() {
            if !keys.contains(&key.as_str()) {
                errors.push(format!("[{}] unknown key '{}'", name, key));
            }
        }
    }
}

fn int_in(
    config: &toml::Value,
    section: &str,
    key: &str,
    range: std::ops::RangeInclusive<i64>,
    errors: &mut Vec<String>,
) {
    match config.get(section).and_then(|s| s.get(key)) {
        None => {}
        Some(toml::Value::Integer(v)) if range.contains(v) => {}
        Some(toml::Value::Integer(_)) => errors.push(format!(
            "[{}] {} must be {}-{}",
            section,
            key,
            range.start(),
            range.end()
        )),
        Some(_) => errors.push(format!("[{}] {} must be an integer", section, key)),
    }
}

fn one_of(config: &toml::Value, section: &str, key: &str, names: &[&str], errors: &mut Vec<String>) {
    match config.get(section).and_then(|s| s.get(key)) {
        None => {}
        Some(toml::Value::String(v)) if names.contains(&v.as_str()) => {}
        Some(_) => errors.push(format!(
            "[{}] {} must be one of {}",
            section,
            key,
            names.join(", ")
        )),
    }
}

fn validate_uart(config: &toml::Value, errors: &mut Vec<String>) {
    int_in(config, "uart", "baudrate", 1..=u32::MAX as i64, errors);
    int_in(config, "uart", "data_bits", 7..=9, errors);
    int_in(config, "uart", "stop_bits", 1..=2, errors);
    one_of(config, "uart", "parity", &["none", "even", "odd"], errors);
}

fn validate_i2c(config: &toml::Value, errors: &mut Vec<String>) {
    int_in(config, "i2c", "divisor", 1..=255, errors);
    int_in(config, "i2c", "status_bits", 0..=255, errors);
    int_in(config, "i2c", "stretch_polls", 0..=u32::MAX as i64, errors);
    int_in(config, "i2c", "wait_polls", 1..=u32::MAX as i64, errors);
    one_of(config, "i2c", "timing", &["standard", "fast", "overclock"], errors);
}

fn validate_frame(config: &toml::Value, errors: &mut Vec<String>) {
    // Upper bound is the IWDG reach: 40 kHz LSI, /256, 12-bit reload
    int_in(config, "frame", "deadline_ms", 1..=26_000, errors);
    one_of(config, "frame", "policy", &["drain", "continue"], errors);

    if let Some(value) = config.get("frame").and_then(|s| s.get("drain_on_error")) {
        if !value.is_bool() {
            errors.push("[frame] drain_on_error must be true or false".to_string());
        }
    }
}
