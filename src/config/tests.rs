use super::builder::default_config_content;
use super::validation::validate_config;
use super::*;
use crate::common::constants::test_constants::*;
use chrono::NaiveTime;
use serial_test::serial;
use std::fs;
use tempfile::tempdir;

fn config_with_house(normal: i64, playing: i64) -> String {
    format!(
        r#"
fade_duration = {TEST_FADE_DURATION:.1}

[channels.house]
normal = {normal}
playing = {playing}
"#
    )
}

#[test]
#[serial]
fn test_config_load_default_creation() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("houselights").join("houselights.toml");

    let original = std::env::var("XDG_CONFIG_HOME").ok();
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    }

    let result = Config::load();

    unsafe {
        match original {
            Some(val) => std::env::set_var("XDG_CONFIG_HOME", val),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    if let Err(e) = &result {
        eprintln!("Config::load() failed: {:?}", e);
    }
    assert_eq!(result.unwrap(), Config::default());
    assert!(config_path.exists());
}

#[test]
fn test_default_file_parses_to_defaults() {
    let config = parse_config(&default_config_content()).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_empty_file_uses_defaults() {
    let config = parse_config("").unwrap();
    assert_eq!(config.serial.port, "/dev/ttyACM0");
    assert_eq!(config.serial.baud_rate, 9600);
    assert_eq!(config.fade_duration_ms(), 3000);
    assert!(config.blackout.is_none());
    assert!(config.channel(crate::lighting::Channel::House).enabled);
    assert!(!config.channel(crate::lighting::Channel::Ambient).enabled);
}

#[test]
fn test_load_from_path() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("houselights.toml");
    fs::write(&path, config_with_house(TEST_HOUSE_NORMAL, TEST_HOUSE_PLAYING)).unwrap();

    let config = Config::load_from_path(&path).unwrap();
    let house = config.channel(crate::lighting::Channel::House);
    assert_eq!(house.brightness.normal, 30);
    assert_eq!(house.brightness.playing, 80);
    // Unset modes keep their defaults
    assert_eq!(house.brightness.paused, 40);
}

#[test]
fn test_missing_file_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let result = Config::load_from_path(&temp_dir.path().join("nope.toml"));
    assert!(result.is_err());
}

#[test]
fn test_out_of_range_brightness_is_clamped() {
    let config = parse_config(&config_with_house(-20, 150)).unwrap();
    let house = config.channel(crate::lighting::Channel::House);
    assert_eq!(house.brightness.normal, 0);
    assert_eq!(house.brightness.playing, 100);
}

#[test]
fn test_fractional_and_quoted_brightness_are_accepted() {
    let config = parse_config("[channels.house]\nnormal = 42.5\nplaying = \"50\"\npaused = 250.0").unwrap();
    let house = config.channel(crate::lighting::Channel::House);
    assert_eq!(house.brightness.normal, 43);
    assert_eq!(house.brightness.playing, 50);
    assert_eq!(house.brightness.paused, 100);
}

#[test]
fn test_unreadable_brightness_falls_back_to_default() {
    let config =
        parse_config("[channels.house]\nnormal = \"bright\"\nplaying = true\nscreensaver = 25").unwrap();
    let house = config.channel(crate::lighting::Channel::House);
    assert_eq!(house.brightness.normal, 100);
    assert_eq!(house.brightness.playing, 0);
    assert_eq!(house.brightness.screensaver, 25);
}

#[test]
fn test_fade_and_poll_interval_are_clamped() {
    let config = parse_config("fade_duration = -1.0\nblackout_poll_interval = 0").unwrap();
    assert_eq!(config.fade_duration, 0.0);
    assert_eq!(config.blackout_poll_interval, 1);

    let config = parse_config("fade_duration = 9000.0\nblackout_poll_interval = 9000").unwrap();
    assert_eq!(config.fade_duration, 600.0);
    assert_eq!(config.blackout_poll_interval, 300);
}

#[test]
fn test_fractional_fade_duration() {
    let config = parse_config("fade_duration = 1.25").unwrap();
    assert_eq!(config.fade_duration_ms(), 1250);
}

#[test]
fn test_blackout_window_parsed() {
    let content = format!(
        "[blackout]\nstart = \"{TEST_BLACKOUT_START}\"\nend = \"{TEST_BLACKOUT_END}\"\n"
    );
    let config = parse_config(&content).unwrap();
    let window = config.blackout.unwrap();
    assert_eq!(window.start, NaiveTime::from_hms_opt(22, 0, 0).unwrap());
    assert_eq!(window.end, NaiveTime::from_hms_opt(2, 0, 0).unwrap());
}

#[test]
fn test_blackout_requires_both_times() {
    assert!(parse_config("[blackout]\nstart = \"22:00:00\"").is_err());
}

#[test]
fn test_invalid_blackout_time_rejected() {
    assert!(parse_config("[blackout]\nstart = \"25:00\"\nend = \"02:00\"").is_err());
}

#[test]
fn test_empty_port_rejected() {
    let file: ConfigFile = toml::from_str("[serial]\nport = \"  \"").unwrap();
    assert!(validate_config(&file).is_err());
}

#[test]
fn test_baud_rate_limits() {
    assert!(parse_config("[serial]\nbaud_rate = 115200").is_ok());
    assert!(parse_config("[serial]\nbaud_rate = 10").is_err());
}

#[test]
fn test_duplicate_addresses_rejected_only_when_enabled() {
    let clash = "[channels.aisle]\naddress = 1";
    assert!(parse_config(clash).is_err());

    let disabled = "[channels.aisle]\naddress = 1\nenabled = false";
    assert!(parse_config(disabled).is_ok());
}

#[test]
fn test_malformed_toml_rejected() {
    assert!(parse_config("fade_duration = ").is_err());
    assert!(parse_config("dim_on_pause = \"yes\"").is_err());
}
