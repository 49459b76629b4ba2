use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use clap::{error::ErrorKind, CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::client::{self, ClientOptions, OcsClient, SubscriberSource};
use crate::config::{self, ConfigFile};
use crate::dashboard::{Dashboard, DashboardState};
use crate::output::{self, DashboardView, OutputFormat};
use crate::subscriber::{self, Column};
use crate::utils;

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ocsdash={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Clone, Debug)]
struct RunConfig {
    base_url: String,
    endpoint: String,
    account_id: u64,
    timeout: u64,
    proxy: Option<String>,
    headers: Vec<(String, String)>,
    output: Option<String>,
    output_format: Option<OutputFormat>,
    columns: Vec<Column>,
    show_raw: bool,
    no_color: bool,
    interactive: bool,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let base_url = args
        .url
        .clone()
        .or(cfg.base_url)
        .ok_or_else(|| "a backend URL is required (--url or base_url in config)".to_string())?;
    utils::parse_base_url(&base_url).map_err(|e| format!("invalid base_url '{base_url}': {e}"))?;

    let endpoint = args
        .endpoint
        .clone()
        .or(cfg.endpoint)
        .unwrap_or_else(|| client::DEFAULT_ENDPOINT.to_string());
    client::endpoint_url(&base_url, &endpoint)
        .map_err(|e| format!("invalid endpoint '{endpoint}': {e}"))?;

    let account_id = args
        .account_id
        .or(cfg.account_id)
        .unwrap_or(client::DEFAULT_ACCOUNT_ID);

    let timeout = args
        .timeout
        .or(cfg.timeout)
        .unwrap_or(client::DEFAULT_TIMEOUT_SECONDS);
    if timeout == 0 {
        return Err("invalid timeout, expected positive number of seconds".to_string());
    }

    let proxy = args
        .proxy
        .clone()
        .or(cfg.proxy)
        .filter(|p| !p.trim().is_empty());

    let raw_headers = if args.header.is_empty() {
        cfg.headers.unwrap_or_default()
    } else {
        args.header.clone()
    };
    let headers = raw_headers
        .iter()
        .map(|h| utils::parse_header_line(h).map_err(|e| format!("invalid header '{h}': {e}")))
        .collect::<Result<Vec<_>, _>>()?;

    let column_keys = match args.columns.as_deref() {
        Some(raw) => utils::parse_csv_list(raw),
        None => cfg.columns.unwrap_or_default(),
    };
    let columns = subscriber::select_columns(&column_keys)?;

    let output = args
        .output
        .clone()
        .or(cfg.output)
        .map(|p| config::expand_tilde_string(&p));
    let output_format = match args.output_format.clone().or(cfg.output_format) {
        Some(raw) => Some(OutputFormat::parse(&raw).ok_or_else(|| {
            format!("invalid output format '{raw}', expected text, json, or html")
        })?),
        None => None,
    };

    let show_raw = args.show_raw().or(cfg.show_raw).unwrap_or(true);
    let no_color = args.no_color || cfg.no_color.unwrap_or(false);

    Ok(RunConfig {
        base_url,
        endpoint,
        account_id,
        timeout,
        proxy,
        headers,
        output,
        output_format,
        columns,
        show_raw,
        no_color,
        interactive: args.interactive,
    })
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message("Loading…");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

async fn refresh_with_spinner<S: SubscriberSource>(dashboard: &mut Dashboard<S>) {
    let pb = spinner();
    dashboard.refresh().await;
    pb.finish_and_clear();
}

async fn write_report(path: &str, format: OutputFormat, view: &DashboardView<'_>) -> Result<(), String> {
    let rendered = output::render(view, format);
    let mut outfile = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|e| format!("failed to open output file: {e}"))?;
    outfile
        .write_all(&rendered)
        .await
        .map_err(|e| format!("failed to write output file: {e}"))?;
    info!(path, ?format, "report written");
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<ExitCode, String> {
    if run.no_color {
        colored::control::set_override(false);
    }

    let client = OcsClient::new(&ClientOptions {
        base_url: run.base_url.clone(),
        endpoint: run.endpoint.clone(),
        timeout_seconds: run.timeout,
        proxy: run.proxy.clone(),
        headers: run.headers.clone(),
    })
    .map_err(|e| e.to_string())?;
    let endpoint = client.url().to_string();
    debug!(%endpoint, account_id = run.account_id, "dashboard starting");

    let output_format = run.output.as_deref().map(|path| {
        run.output_format
            .or_else(|| output::infer_format_from_path(path))
            .unwrap_or(OutputFormat::Text)
    });

    let mut dashboard = Dashboard::new(client, run.account_id);
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        refresh_with_spinner(&mut dashboard).await;

        let view = DashboardView {
            account_id: dashboard.account_id(),
            endpoint: &endpoint,
            columns: &run.columns,
            state: dashboard.state(),
            show_raw: run.show_raw,
        };
        print!("{}", output::render_text(&view, !run.no_color));

        if let (Some(path), Some(format)) = (run.output.as_deref(), output_format) {
            write_report(path, format, &view).await?;
        }

        if !run.interactive {
            break;
        }

        print!("\n[Enter] refresh  [q] quit > ");
        let _ = std::io::stdout().flush();
        match input.next_line().await {
            Ok(Some(line)) if line.trim().eq_ignore_ascii_case("q") => break,
            Ok(Some(_)) => println!(),
            Ok(None) => break,
            Err(e) => return Err(format!("failed to read input: {e}")),
        }
    }

    match dashboard.state() {
        DashboardState::Failed(_) => Ok(ExitCode::FAILURE),
        _ => Ok(ExitCode::SUCCESS),
    }
}

fn init_config(args: &CliArgs) -> Result<(), String> {
    let path = match args.config.as_deref() {
        Some(p) => config::expand_tilde(p),
        None => config::default_config_path()
            .ok_or_else(|| "could not determine home directory".to_string())?,
    };
    if config::ensure_default_config_file(&path)? {
        println!("wrote default config to {}", path.display());
    } else {
        println!("config already exists at {}", path.display());
    }
    Ok(())
}

fn load_run_config_file(args: &CliArgs) -> Result<ConfigFile, String> {
    match args.config.as_deref() {
        Some(p) => config::load_config(&config::expand_tilde(p), false),
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true),
            None => Ok(ConfigFile::default()),
        },
    }
}

pub fn run_cli() -> Result<ExitCode, String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                let mut cmd = CliArgs::command();
                print!("{}", cmd.render_long_help());
                return Ok(ExitCode::SUCCESS);
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(ExitCode::SUCCESS);
            }
            _ => return Err(e.to_string()),
        },
    };

    init_tracing(args.verbose);

    if args.init_config {
        init_config(&args)?;
        return Ok(ExitCode::SUCCESS);
    }

    let cfg = load_run_config_file(&args)?;
    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
