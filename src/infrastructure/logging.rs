//! Console logging - one timestamped, colour-coded line per event

use chrono::Local;
use owo_colors::{OwoColorize, Style};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

use super::config::LoggingConfig;

pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Event formatter: `<timestamp> [LEVEL] message fields...`
pub struct ConsoleFormat {
    ansi: bool,
}

impl ConsoleFormat {
    pub fn new(ansi: bool) -> Self {
        Self { ansi }
    }
}

fn level_style(level: Level) -> Style {
    match level {
        Level::ERROR => Style::new().red().bold(),
        Level::WARN => Style::new().yellow().bold(),
        Level::INFO => Style::new().green(),
        Level::DEBUG => Style::new().blue(),
        Level::TRACE => Style::new().magenta(),
    }
}

/// Timestamp and severity label that start every line
pub fn render_prefix(timestamp: &str, level: Level, ansi: bool) -> String {
    let label = format!("[{}]", level);
    if !ansi {
        return format!("{} {}", timestamp, label);
    }
    format!(
        "{} {}",
        timestamp.style(Style::new().green().on_black()),
        label.style(level_style(level))
    )
}

impl<S, N> FormatEvent<S, N> for ConsoleFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let now = Local::now().format(TIMESTAMP_FORMAT).to_string();
        write!(writer, "{} ", render_prefix(&now, *event.metadata().level(), self.ansi))?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    // A subscriber may already be installed (tests, embedding); keep it
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .event_format(ConsoleFormat::new(config.ansi))
        .try_init();
}
