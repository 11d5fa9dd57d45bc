/*!
 * Tests for configuration loading and validation
 */

use anyhow::Result;
use subburn::app_config::{Config, LogLevel};
use crate::common;

/// A missing config file is created with defaults
#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config.render.min_height, 720);
    let reloaded = Config::load_or_create(&path)?;
    assert_eq!(reloaded.style, config.style);
    Ok(())
}

/// Partial files fall back to defaults for every missing field
#[test]
fn test_load_or_create_withPartialFile_shouldFillDefaults() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        dir.path(),
        "conf.json",
        r#"{"encoder": {"prefer_hardware": false}, "style": {"font_floor": 36}, "log_level": "debug"}"#,
    )?;

    let config = Config::load_or_create(&path)?;

    assert!(!config.encoder.prefer_hardware);
    assert_eq!(config.encoder.software.codec, "libx264");
    assert_eq!(config.style.font_floor, 36);
    assert_eq!(config.style.font_ratio, 0.055);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.jobs.max_concurrent_jobs, 2);
    Ok(())
}

/// Broken JSON is reported, not replaced
#[test]
fn test_load_or_create_withInvalidJson_shouldFail() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(dir.path(), "conf.json", "{ not json")?;

    assert!(Config::load_or_create(&path).is_err());
    assert_eq!(std::fs::read_to_string(&path)?, "{ not json");
    Ok(())
}

/// Validation rejects values the pipeline cannot work with
#[test]
fn test_validate_withInvalidValues_shouldFail() {
    let mut config = Config::default();
    config.render.min_height = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.style.font_ratio = -0.1;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.encoder.hardware_slots = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.encoder.process_timeout_secs = Some(0);
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.encoder.process_timeout_secs = Some(3600);
    assert!(config.validate().is_ok());
}

/// Default encoder profiles match the documented argument sets
#[test]
fn test_default_encoder_profiles_shouldMatchDocumentedArgs() {
    let config = Config::default();
    assert_eq!(config.encoder.accelerated.codec, "h264_nvenc");
    assert_eq!(
        config.encoder.accelerated.args,
        ["-preset", "p1", "-tune", "ll", "-rc", "cbr", "-b:v", "8M", "-maxrate", "8M", "-bufsize", "16M"]
    );
    assert_eq!(config.encoder.software.codec, "libx264");
    assert_eq!(config.encoder.software.args, ["-preset", "ultrafast", "-crf", "23"]);
    assert_eq!(config.encoder.process_timeout_secs, None);
}
