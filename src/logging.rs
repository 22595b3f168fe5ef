//! Logging configuration for Janction Mobile
//!
//! Uses log4rs with appenders:
//! 1. ConsoleAppender - stdout output
//! 2. RollingFileAppender - log files with rotation (desktop only)

use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
#[cfg(not(target_os = "android"))]
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
#[cfg(not(target_os = "android"))]
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
#[cfg(not(target_os = "android"))]
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
#[cfg(not(target_os = "android"))]
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::PathBuf;

/// Parse a configured level name, falling back to Info
pub fn parse_level(level: &str) -> LevelFilter {
    level.trim().parse().unwrap_or(LevelFilter::Info)
}

/// Initialize log4rs with a console appender
/// On desktop, also adds a rolling file appender
///
/// # Arguments
/// * `log_dir` - Directory for log files (ignored on Android)
/// * `level` - Root level filter
///
/// # Log File Configuration (desktop only)
/// - File: `{log_dir}/janction.1.log`
/// - Max size: 20 MB per file
/// - Max count: 10 files (rotation)
/// - Pattern: `{timestamp} [{level}] {target} - {message}`
pub fn init_logger(log_dir: PathBuf, level: LevelFilter) -> anyhow::Result<log4rs::Handle> {
    let console = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%H:%M:%S)} [{l}] {t} - {m}{n}",
        )))
        .build();

    // On Android, skip file appender (permission issues)
    #[cfg(target_os = "android")]
    let config = {
        let _ = log_dir;
        Config::builder()
            .appender(Appender::builder().build("console", Box::new(console)))
            .build(Root::builder().appender("console").build(level))?
    };

    #[cfg(not(target_os = "android"))]
    let config = {
        std::fs::create_dir_all(&log_dir)?;

        let log_file = log_dir.join("janction.1.log");
        let log_pattern = log_dir.join("janction.{}.log");
        let log_pattern = log_pattern
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Log directory is not valid UTF-8: {:?}", log_dir))?;

        // Rolling file appender (20MB per file, 10 files max)
        let roller = FixedWindowRoller::builder().base(1).build(log_pattern, 10)?;
        let trigger = SizeTrigger::new(20 * 1024 * 1024);
        let policy = CompoundPolicy::new(Box::new(trigger), Box::new(roller));

        let logfile = RollingFileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(
                "{d(%Y-%m-%d %H:%M:%S)} [{l}] {t} - {m}{n}",
            )))
            .build(log_file, Box::new(policy))?;

        Config::builder()
            .appender(Appender::builder().build("console", Box::new(console)))
            .appender(Appender::builder().build("logfile", Box::new(logfile)))
            .build(
                Root::builder()
                    .appender("console")
                    .appender("logfile")
                    .build(level),
            )?
    };

    Ok(log4rs::init_config(config)?)
}
