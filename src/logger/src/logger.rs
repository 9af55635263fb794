use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use log::{Level, LevelFilter, SetLoggerError};
use env_logger::{Builder, Env, fmt::Color};
use std::{io::Write, sync::OnceLock, time::Duration};

static INSTANCE: OnceLock<Logger> = OnceLock::new();

/// Environment variable overriding the log filter (same syntax as `RUST_LOG`).
pub const LOG_ENV: &str = "COHORT_LOG";

#[derive(Debug)]
pub struct Logger {
    multi_pg: MultiProgress,
}

impl Logger {

    /// Initialize the global logger. Calling this a second time only updates the verbosity level.
    pub fn init(verbosity: u8) -> Result<(), SetLoggerError> {
        let log_level = Self::u8_to_loglevel(verbosity);
        if INSTANCE.get().is_some() {
            Self::set_level(verbosity);
            return Ok(())
        }

        let env = Env::default()
            .filter(LOG_ENV);

        let logger = Builder::new().filter_level(log_level)
            .format(|buf, record| {
                let (traceback, set_intensity) = if record.level() == LevelFilter::Error {
                    (format!("(@ {}:{}) ", record.file().unwrap_or("unknown"), record.line().unwrap_or(0)), true)
                } else {
                    (String::new(), false)
                };

                let mut arg_style = buf.style();
                arg_style.set_intense(set_intensity);

                let mut level_style = buf.style();
                let color = match record.level() {
                    Level::Error => Color::Red,
                    Level::Warn  => Color::Yellow,
                    Level::Info  => Color::Green,
                    Level::Debug => Color::Blue,
                    Level::Trace => Color::Cyan
                };
                level_style.set_color(color).set_bold(true);

                writeln!(
                    buf,
                    "[{} {: <5} {}] {traceback}{}",
                    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
                    level_style.value(record.level()),
                    record.target(),
                    arg_style.value(record.args())
                )
            })
            .parse_env(env)
            .build();

        // The env filter may be more verbose than the cli level. Keep the most verbose of both.
        let max_level = std::cmp::max(logger.filter(), log_level);

        // Progress bar support.
        let multi_pg = MultiProgress::new();
        LogWrapper::new(multi_pg.clone(), logger).try_init()?;
        log::set_max_level(max_level);
        let _ = INSTANCE.set(Self{multi_pg});
        Ok(())
    }

    fn u8_to_loglevel(verbosity: u8) -> LevelFilter {
        match verbosity {
            0            => LevelFilter::Error,
            1            => LevelFilter::Warn,
            2            => LevelFilter::Info,
            3            => LevelFilter::Debug,
            4..= u8::MAX => LevelFilter::Trace
        }
    }

    pub fn set_level(verbosity: u8) {
        log::set_max_level(Self::u8_to_loglevel(verbosity));
    }

    /// Shared progress-bar container, if the logger was initialized.
    pub fn multi() -> Option<&'static MultiProgress> {
        INSTANCE.get().map(|logger| &logger.multi_pg)
    }

    /// Spawn a ticking spinner attached to the logger's progress container.
    /// Returns a hidden spinner when the logger was never initialized (e.g. library use, tests).
    pub fn spinner(message: impl Into<String>) -> ProgressBar {
        let Some(multi) = Self::multi() else {
            return ProgressBar::hidden()
        };
        let spinner = multi.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg} ({pos} records)") {
            spinner.set_style(style);
        }
        spinner.set_message(message.into());
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level(){
        Logger::init(0).expect("Failed to initialize logger");
        for level in 0..u8::MAX {
            Logger::set_level(level);

            let expected_level = match level {
                0           => LevelFilter::Error,
                1           => LevelFilter::Warn,
                2           => LevelFilter::Info,
                3           => LevelFilter::Debug,
                4..=u8::MAX => LevelFilter::Trace
            };

            assert_eq!(log::max_level(), expected_level);
        }
        // Re-initialization is a no-op apart from the level.
        Logger::init(3).expect("Second initialization should not fail");
        assert_eq!(log::max_level(), LevelFilter::Debug);
        assert!(Logger::multi().is_some());
    }
}
