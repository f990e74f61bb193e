//! `wiegand-monitor`: print decoded Wiegand events from two sysfs GPIO lines.
//!
//! The GPIOs must already be exported with their `edge` file set (usually
//! `falling`). Events go to stdout, logs to stderr.

mod logging;

use anyhow::{Context, bail};
use clap::Parser;
use std::process::ExitCode;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info};
use wiegand_core::LineId;
use wiegand_hardware::sysfs::SysfsEdgeSource;
use wiegand_hardware::{WiegandConfig, WiegandEvent, WiegandSession};

use crate::logging::{LogLevel, init_logging};

#[derive(Parser, Debug)]
#[command(name = "wiegand-monitor", version, about = "Wiegand keypad and card reader monitor")]
struct Cli {
    /// D0 line: GPIO number or value file path [default: $WIEGAND_D0 or 17].
    #[arg(long, value_name = "GPIO|PATH")]
    d0: Option<LineId>,

    /// D1 line: GPIO number or value file path [default: $WIEGAND_D1 or 18].
    #[arg(long, value_name = "GPIO|PATH")]
    d1: Option<LineId>,

    /// Silence that ends a frame, in milliseconds [default: $WIEGAND_TIMEOUT or 20].
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    gap_ms: Option<u64>,

    /// Minimum log level (stderr). Overridden by RUST_LOG.
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: LogLevel,

    /// Print one JSON object per event.
    #[arg(long)]
    json: bool,
}

impl Cli {
    /// Overlay command line flags on `config`.
    fn apply(&self, mut config: WiegandConfig) -> WiegandConfig {
        if let Some(d0) = &self.d0 {
            config.d0 = d0.clone();
        }
        if let Some(d1) = &self.d1 {
            config.d1 = d1.clone();
        }
        if let Some(gap_ms) = self.gap_ms {
            config.gap_ms = gap_ms;
        }
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.apply(WiegandConfig::from_env());
    let (sink, mut events) = mpsc::unbounded_channel::<WiegandEvent>();

    let mut session = WiegandSession::new(config, SysfsEdgeSource::new(), sink)
        .context("invalid configuration")?;
    session.start().context("failed to start session")?;

    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result.context("failed to listen for Ctrl-C")?;
                info!("Interrupted, stopping");
                break;
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                println!("{}", render(&event, cli.json)?);

                if let WiegandEvent::Error(message) = event {
                    bail!("session failed: {message}");
                }
            }
        }
    }

    session.stop().await.context("failed to stop session")?;

    // Drain the final stop event
    while let Ok(event) = events.try_recv() {
        println!("{}", render(&event, cli.json)?);
    }

    Ok(())
}

fn render(event: &WiegandEvent, json: bool) -> anyhow::Result<String> {
    if json {
        Ok(serde_json::to_string(event)?)
    } else {
        Ok(event.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parses_line_ids() {
        let cli = Cli::try_parse_from(["wiegand-monitor", "--d0", "5", "--d1", "/dev/d1"])
            .expect("line args should parse");

        assert_eq!(cli.d0, Some(LineId::Gpio(5)));
        assert_eq!(cli.d1, Some(LineId::Path(PathBuf::from("/dev/d1"))));
        assert_eq!(cli.log_level, LogLevel::Info);
        assert!(!cli.json);
    }

    #[test]
    fn rejects_zero_gap() {
        let err = Cli::try_parse_from(["wiegand-monitor", "--gap-ms", "0"])
            .expect_err("zero gap should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from(["wiegand-monitor", "--d1", "23", "--gap-ms", "40"])
            .expect("args should parse");

        let config = cli.apply(WiegandConfig::default());
        assert_eq!(config.d0, LineId::Gpio(17));
        assert_eq!(config.d1, LineId::Gpio(23));
        assert_eq!(config.gap_ms, 40);
    }

    #[test]
    fn renders_events() {
        let event = WiegandEvent::Reader(0x95_61F3);
        assert_eq!(render(&event, false).unwrap(), "reader: 9789939");
        assert_eq!(
            render(&event, true).unwrap(),
            r#"{"event":"reader","data":9789939}"#
        );
        assert_eq!(render(&WiegandEvent::Stop, true).unwrap(), r#"{"event":"stop"}"#);
    }

    #[test]
    fn parses_log_level_and_json() {
        let cli = Cli::try_parse_from(["wiegand-monitor", "--log-level", "trace", "--json"])
            .expect("args should parse");

        assert_eq!(cli.log_level, LogLevel::Trace);
        assert!(cli.json);
    }
}
