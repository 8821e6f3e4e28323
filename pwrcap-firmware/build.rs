//! Build script for pwrcap-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates capture.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use pwrcap_core::config::{parse_config, CaptureConfig};
use pwrcap_hal::gpio::is_assigned;

/// GPIOs the firmware can drive as debug pins (GPIO0..=7)
const DEBUG_PIN_CANDIDATES: u32 = 8;

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate capture.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=capture.toml");

    let config_path = Path::new("capture.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: capture.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds a capture.toml configuration file.          ║\n\
            ║  Please create one in the pwrcap-firmware directory.             ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read capture.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Full TOML parse against the config schema
    let config: CaptureConfig = match toml::from_str(&config_content) {
        Ok(config) => config,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid capture.toml                                     ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    // The firmware reads the file with the embedded parser, which must agree
    match parse_config(&config_content) {
        Ok(embedded) if embedded == config => {}
        Ok(_) => report_errors(&["embedded parser disagrees with full TOML parse".into()]),
        Err(e) => report_errors(&[format!("embedded parser rejected file: {:?}", e)]),
    }

    let mut errors = Vec::new();

    if let Err(e) = config.validate() {
        errors.push(format!("{:?}", e));
    }

    let map = config.debug_pin_map();
    for (role, pin) in [
        ("transfer", map.transfer),
        ("burst", map.burst),
        ("sleep", map.sleep),
    ] {
        if is_assigned(pin) && pin >= DEBUG_PIN_CANDIDATES {
            errors.push(format!(
                "{} pin {} is not a debug-capable GPIO (0-{})",
                role,
                pin,
                DEBUG_PIN_CANDIDATES - 1
            ));
        }
    }

    if config.debug.print_in_loop && !config.debug.print_enabled {
        println!("cargo:warning=print_in_loop without print_enabled is ignored");
    }

    if !errors.is_empty() {
        report_errors(&errors);
    }

    println!("cargo:warning=capture.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            // Width counted in chars, not bytes
            let truncated = if line.chars().count() > 64 {
                format!("{}...", line.chars().take(61).collect::<String>())
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn report_errors(errors: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: Invalid capture configuration                            ║\n\
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
