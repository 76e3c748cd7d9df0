use std::cell::RefCell;
use std::future::Future;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::Serialize;
use serde_json::json;
use tokio::time::MissedTickBehavior;
use tracing::level_filters::LevelFilter;

use crate::alarms::{self, AlarmField, AlarmSet, ALL_FIELDS};
use crate::api::types::ScheduleParams;
use crate::api::{ApiClient, ClientOptions, RobotBackend};
use crate::cli::args::{AlarmsCommand, CliArgs, Command, PageArgs, TargetArgs};
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::output::{self, OutputFormat};
use crate::pagination::DEFAULT_PAGE_SIZE;
use crate::render;
use crate::runner::{resolve_target, Dashboard, ListView, Operator, Outcome};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_REFRESH_INTERVAL: u64 = 10;
const DEFAULT_NAME_PREFIX: &str = "Robot ";

#[derive(Clone, Debug)]
struct RunConfig {
    client: ClientOptions,
    page_size: u32,
    refresh_interval: u64,
    name_prefix: String,
    output_format: OutputFormat,
    assume_yes: bool,
    no_color: bool,
    force_color: bool,
    verbose: u8,
    command: Command,
}

fn command_page_size(command: &Command) -> Option<u32> {
    match command {
        Command::List(PageArgs { page_size, .. })
        | Command::Watch {
            page: PageArgs { page_size, .. },
            ..
        }
        | Command::BatchDelete { page_size, .. } => *page_size,
        _ => None,
    }
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };

    let base_url = args
        .base_url
        .or(cfg.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let timeout_seconds = args.timeout.or(cfg.timeout);
    let proxy = args
        .proxy
        .or(cfg.proxy)
        .filter(|p| !p.trim().is_empty());

    let page_size = command_page_size(&args.command)
        .or(cfg.page_size)
        .unwrap_or(DEFAULT_PAGE_SIZE);
    if !crate::pagination::is_valid_page_size(page_size) {
        return Err(format!(
            "invalid page_size {page_size} in config, expected one of 10, 20, 50, 100"
        ));
    }

    let refresh_interval = match &args.command {
        Command::Watch { interval, .. } => *interval,
        _ => None,
    }
    .or(cfg.refresh_interval)
    .unwrap_or(DEFAULT_REFRESH_INTERVAL)
    .max(1);

    let name_prefix = match &args.command {
        Command::BatchAdd { prefix, .. } => prefix.clone(),
        _ => None,
    }
    .or(cfg.name_prefix)
    .unwrap_or_else(|| DEFAULT_NAME_PREFIX.to_string());

    let output_format_raw = args
        .output_format
        .or(cfg.output_format)
        .unwrap_or_else(|| "text".to_string());
    let output_format = OutputFormat::parse(&output_format_raw)
        .ok_or_else(|| format!("invalid output_format '{output_format_raw}'"))?;

    Ok(RunConfig {
        client: ClientOptions {
            base_url,
            timeout_seconds,
            proxy,
        },
        page_size,
        refresh_interval,
        name_prefix,
        output_format,
        assume_yes: args.yes || cfg.assume_yes.unwrap_or(false),
        no_color,
        force_color: args.color,
        verbose: args.verbose,
        command: args.command,
    })
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Terminal prompts and an indicatif spinner on stderr.
struct TerminalOperator {
    assume_yes: bool,
    spinner: RefCell<Option<ProgressBar>>,
}

impl TerminalOperator {
    fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            spinner: RefCell::new(None),
        }
    }
}

impl Operator for TerminalOperator {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "{} {prompt} [y/N] ", "?".yellow().bold());
        let _ = stderr.flush();

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }

    fn show_loading(&self, message: &str) {
        let pb = ProgressBar::new_spinner();
        pb.set_draw_target(ProgressDrawTarget::stderr());
        if let Ok(style) = ProgressStyle::with_template(":: {spinner} {msg} [{elapsed}]") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        if let Some(previous) = self.spinner.replace(Some(pb)) {
            previous.finish_and_clear();
        }
    }

    fn hide_loading(&self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }
}

fn emit(bytes: &[u8]) -> Result<(), String> {
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(bytes)
        .and_then(|_| stdout.flush())
        .map_err(|e| format!("failed to write output: {e}"))
}

fn emit_value<T: Serialize>(format: OutputFormat, value: &T, text: String) -> Result<(), String> {
    match format {
        OutputFormat::Json => emit(&output::render_json(value)),
        OutputFormat::Text => emit(format!("{text}\n").as_bytes()),
    }
}

fn emit_view(format: OutputFormat, view: &ListView) -> Result<(), String> {
    match format {
        OutputFormat::Json => emit(&output::render_json(view)),
        OutputFormat::Text => emit(&output::render_list_view(view)),
    }
}

fn report<T, F>(format: OutputFormat, outcome: Outcome<T>, describe: F) -> Result<(), String>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    match outcome {
        Outcome::Cancelled => emit_value(
            format,
            &json!({ "cancelled": true }),
            "cancelled".dimmed().to_string(),
        ),
        Outcome::Completed(value) => {
            let text = format!("{} {}", "ok".green().bold(), describe(&value));
            emit_value(format, &value, text)
        }
    }
}

fn target_of(args: &TargetArgs) -> Result<crate::api::Identifier, String> {
    resolve_target(args.id.as_deref(), args.serial).map_err(|e| e.to_string())
}

fn parse_alarm_set(
    fa: Option<&str>,
    fb: Option<&str>,
    fc: Option<&str>,
    fd: Option<&str>,
) -> Result<AlarmSet, String> {
    let mut set = AlarmSet::default();
    for (field, raw) in [
        (AlarmField::Fa, fa),
        (AlarmField::Fb, fb),
        (AlarmField::Fc, fc),
        (AlarmField::Fd, fd),
    ] {
        if let Some(raw) = raw {
            *set.bits_mut(field) = alarms::parse_bit_list(field, raw)?;
        }
    }
    Ok(set)
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

/// Reload the current page every `interval_seconds` until `stop` resolves.
/// A failed reload is printed and the next tick tries again.
pub(crate) async fn watch<B, O, S>(
    dashboard: &mut Dashboard<B, O>,
    format: OutputFormat,
    interval_seconds: u64,
    stop: S,
) -> Result<(), String>
where
    B: RobotBackend,
    O: Operator,
    S: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_seconds));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // one stop future for the whole loop, so a signal during a reload is kept
    tokio::pin!(stop);
    eprintln!(":: refreshing every {interval_seconds}s, press Ctrl-C to stop");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match dashboard.load_robots().await {
                    Ok(view) => emit_view(format, view)?,
                    Err(e) => eprintln!("{} {e}", "refresh failed:".red()),
                }
            }
            _ = &mut stop => {
                eprintln!(":: stopped");
                return Ok(());
            }
        }
    }
}

async fn toggle<O: Operator>(
    dashboard: &mut Dashboard<ApiClient, O>,
    format: OutputFormat,
    robot_id: &str,
    currently_enabled: bool,
) -> Result<(), String> {
    let outcome = dashboard
        .toggle_status(robot_id, currently_enabled)
        .await
        .map_err(|e| e.to_string())?;
    report(format, outcome, |ack| {
        ack.message
            .clone()
            .unwrap_or_else(|| "status updated".to_string())
    })
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    let client = ApiClient::new(&run.client).map_err(|e| e.to_string())?;
    tracing::debug!(base_url = client.base_url(), "client ready");
    let operator = TerminalOperator::new(run.assume_yes);
    let mut dashboard = Dashboard::new(client, operator, run.page_size);
    let format = run.output_format;
    let err = |e: crate::runner::DashboardError| e.to_string();

    match run.command {
        Command::List(page) => {
            let view = match page.page {
                Some(n) => dashboard.go_to_page(n).await,
                None => dashboard.load_robots().await,
            }
            .map_err(err)?;
            emit_view(format, view)
        }
        Command::Watch { page, .. } => {
            if let Some(n) = page.page {
                dashboard.pagination_mut().go_to_page(n);
            }
            watch(&mut dashboard, format, run.refresh_interval, ctrl_c()).await
        }
        Command::Add { name, serial } => {
            let ack = dashboard.add_robot(&name, serial).await.map_err(err)?;
            let label = match name.trim() {
                "" => format!("#{serial}"),
                trimmed => format!("'{trimmed}' (#{serial})"),
            };
            let text = format!("{} robot {label} added", "ok".green().bold());
            emit_value(format, &ack, text)
        }
        Command::Delete { robot_id } => {
            let outcome = dashboard.delete_robot(&robot_id).await.map_err(err)?;
            report(format, outcome, |_| format!("robot {robot_id} deleted"))
        }
        Command::Enable { robot_id } => toggle(&mut dashboard, format, &robot_id, false).await,
        Command::Disable { robot_id } => toggle(&mut dashboard, format, &robot_id, true).await,
        Command::Show { robot_id } => {
            let snapshot = dashboard.view_robot(&robot_id).await.map_err(err)?;
            match format {
                OutputFormat::Json => emit(&output::render_json(&snapshot)),
                OutputFormat::Text => emit(&output::render_lines(&render::render_snapshot(&snapshot))),
            }
        }
        Command::BatchAdd { range, .. } => {
            let outcome = dashboard
                .batch_add(range.start, range.end, &run.name_prefix)
                .await
                .map_err(err)?;
            report(format, outcome, |ack| format!("added {} robots", ack.count))
        }
        Command::BatchDelete { range, .. } => {
            let outcome = dashboard
                .batch_delete(range.start, range.end)
                .await
                .map_err(err)?;
            report(format, outcome, |ack| format!("deleted {} robots", ack.count))
        }
        Command::Schedule {
            target,
            schedule_id,
            weekday,
            hour,
            minute,
            run_count,
        } => {
            let target = target_of(&target)?;
            let params = ScheduleParams {
                schedule_id,
                weekday,
                hour,
                minute,
                run_count,
            };
            let outcome = dashboard
                .schedule_start(&target, &params)
                .await
                .map_err(err)?;
            report(format, outcome, |ack| {
                format!(
                    "schedule {} sent to {}",
                    params.schedule_id,
                    ack.robot_id.as_deref().unwrap_or("robot")
                )
            })
        }
        Command::Start(target) => {
            let target = target_of(&target)?;
            let outcome = dashboard.start(&target).await.map_err(err)?;
            report(format, outcome, |_| format!("start command sent to {target}"))
        }
        Command::TimeSync(target) => {
            let target = target_of(&target)?;
            let outcome = dashboard.time_sync(&target).await.map_err(err)?;
            report(format, outcome, |_| format!("time sync sent to {target}"))
        }
        Command::Alarms(AlarmsCommand::Get(target)) => {
            let target = target_of(&target)?;
            let set = dashboard.load_alarms(&target).await.map_err(err)?;
            let values = set.to_values()?;
            emit_value(format, &values, set.summary().join("\n"))
        }
        Command::Alarms(AlarmsCommand::Set {
            target,
            fa,
            fb,
            fc,
            fd,
        }) => {
            let target = target_of(&target)?;
            let set = parse_alarm_set(fa.as_deref(), fb.as_deref(), fc.as_deref(), fd.as_deref())?;
            let outcome = dashboard.set_alarms(&target, &set).await.map_err(err)?;
            report(format, outcome, |_| {
                if set.is_clear() {
                    format!("all alarms cleared on {target}")
                } else {
                    format!("alarm settings saved on {target}")
                }
            })
        }
        Command::Alarms(AlarmsCommand::Bits { field, target }) => {
            let fields: Vec<AlarmField> = match field.as_deref() {
                Some(raw) => vec![AlarmField::parse(raw)
                    .ok_or_else(|| format!("invalid alarm field '{raw}'"))?],
                None => ALL_FIELDS.to_vec(),
            };
            let checked = if target.id.is_some() || target.serial.is_some() {
                let target = target_of(&target)?;
                dashboard.load_alarms(&target).await.map_err(err)?
            } else {
                AlarmSet::default()
            };
            match format {
                OutputFormat::Json => {
                    let rows: Vec<_> = fields
                        .iter()
                        .flat_map(|f| {
                            let bits = checked.bits(*f);
                            f.labels().into_iter().map(move |(bit, label)| {
                                json!({
                                    "field": f.name(),
                                    "bit": bit,
                                    "label": label,
                                    "checked": bits.contains(&bit),
                                })
                            })
                        })
                        .collect();
                    emit(&output::render_json(&rows))
                }
                OutputFormat::Text => {
                    let mut lines = Vec::new();
                    for f in &fields {
                        lines.push(format!("{} ({} bits)", f.name().bold(), f.width()));
                        lines.extend(
                            alarms::render_checkboxes(*f, checked.bits(*f))
                                .into_iter()
                                .map(|l| format!("  {l}")),
                        );
                    }
                    emit(&output::render_lines(&lines))
                }
            }
        }
        Command::InitConfig { .. } => Ok(()),
    }
}

fn init_config(path: Option<String>) -> Result<(), String> {
    let path: PathBuf = match path {
        Some(p) => config::expand_tilde(&p),
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

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = e.print();
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    if let Command::InitConfig { path } = &args.command {
        return init_config(path.clone());
    }

    let cfg = match args.config.as_deref() {
        Some(path) => config::load_config(&config::expand_tilde(path), false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;

    init_tracing(run.verbose);
    if run.force_color {
        colored::control::set_override(true);
    } else if run.no_color {
        colored::control::set_override(false);
    }

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
