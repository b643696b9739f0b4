use tracing::Level;

/// Format of log lines written to stderr.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Options to configure logging.
#[derive(Clone, Debug, clap::Args)]
#[group(skip)]
pub struct Config {
    /// Log line format.
    #[clap(
        long = "log-format",
        value_enum,
        default_value_t = LogFormat::Text,
        env = "LOG_FORMAT"
    )]
    pub format: LogFormat,

    /// Also log debug messages, including every kubectl invocation.
    #[clap(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Config {
    /// Install the global subscriber.  Everything goes to stderr, so stdout is
    /// left for the tools' own output.
    pub fn init(&self) {
        let level = if self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        };

        let builder = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_max_level(level)
            .with_target(false);

        match self.format {
            LogFormat::Text => builder.without_time().compact().init(),
            LogFormat::Json => builder.json().init(),
        }
    }
}
