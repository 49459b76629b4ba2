use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "ocsdash",
    version,
    about = "OCS subscriber dashboard",
    long_about = "ocsdash lists the subscribers of an OCS account and shows them as KPIs, the raw JSON response and a table.\n\nExamples:\n  ocsdash -u https://ocs.example.com\n  ocsdash -u https://ocs.example.com -a 3771 --columns subscriberId,iccid,status\n  ocsdash -u https://ocs.example.com -o subscribers.html\n  ocsdash --config ~/.ocsdash/config.yml --interactive\n\nTip: Use --init-config to write a default config file and keep CLI invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv, -vvv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'u',
        long = "url",
        visible_alias = "base-url",
        value_name = "URL",
        help_heading = "Target",
        help = "Backend base URL."
    )]
    pub url: Option<String>,

    #[arg(
        short = 'e',
        long = "endpoint",
        value_name = "PATH",
        help_heading = "Target",
        help = "Subscriber listing endpoint, resolved against the base URL."
    )]
    pub endpoint: Option<String>,

    #[arg(
        short = 'a',
        long = "account-id",
        visible_alias = "account",
        value_name = "ID",
        help_heading = "Target",
        help = "Account whose subscribers are listed."
    )]
    pub account_id: Option<u64>,

    #[arg(
        short = 'C',
        long = "config",
        value_name = "FILE",
        help_heading = "Target",
        help = "Path to config file (defaults to ~/.ocsdash/config.yml when present)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "init-config",
        help_heading = "Target",
        help = "Write a default config file (to --config or the default path) and exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 't',
        long = "timeout",
        value_name = "SECS",
        help_heading = "HTTP",
        help = "Request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'p',
        long = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "Proxy for the backend request."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'H',
        long = "header",
        value_name = "KEY: VALUE",
        action = ArgAction::Append,
        help_heading = "HTTP",
        help = "Extra request header (repeatable)."
    )]
    pub header: Vec<String>,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Also write a report to this file."
    )]
    pub output: Option<String>,

    #[arg(
        long = "output-format",
        visible_alias = "of",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Report format (text, json, html). Inferred from the file extension when omitted."
    )]
    pub output_format: Option<String>,

    #[arg(
        long = "columns",
        value_name = "KEYS",
        help_heading = "Output",
        help = "Comma-separated subset of table columns (e.g. subscriberId,iccid,status)."
    )]
    pub columns: Option<String>,

    #[arg(
        long = "raw",
        overrides_with = "no_raw",
        help_heading = "Output",
        help = "Show the raw JSON response panel."
    )]
    pub raw: bool,

    #[arg(
        long = "no-raw",
        overrides_with = "raw",
        help_heading = "Output",
        help = "Hide the raw JSON response panel."
    )]
    pub no_raw: bool,

    #[arg(
        short = 'n',
        long = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'i',
        long = "interactive",
        help_heading = "Mode",
        help = "Keep the dashboard open: Enter refreshes, q quits."
    )]
    pub interactive: bool,
}

impl CliArgs {
    /// `Some(true)` for --raw, `Some(false)` for --no-raw, `None` when
    /// neither was given.
    pub fn show_raw(&self) -> Option<bool> {
        if self.raw {
            Some(true)
        } else if self.no_raw {
            Some(false)
        } else {
            None
        }
    }
}
