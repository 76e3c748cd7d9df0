use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "fleetdash",
    version,
    about = "admin console for a fleet of cleaning robots",
    long_about = "fleetdash manages a fleet of cleaning robots through the robot management REST API: list and page through robots, toggle them, inspect telemetry, send commands and edit alarm settings.\n\nExamples:\n  fleetdash list --page 2 --page-size 50\n  fleetdash batch-delete --start 100 --end 120\n  fleetdash alarms set --serial 17 --fa 0,3 --fd 1\n\nTip: run `fleetdash init-config` once and keep the backend URL in ~/.fleetdash/config.yml."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'c',
        long = "color",
        global = true,
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        long = "no-color",
        global = true,
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "output-format",
        visible_alias = "of",
        value_name = "FORMAT",
        global = true,
        help_heading = "Output",
        help = "Output format: text or json."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'C',
        long = "config",
        visible_alias = "cfg",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.fleetdash/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'b',
        long = "base-url",
        visible_alias = "url",
        value_name = "URL",
        global = true,
        help_heading = "HTTP",
        help = "Backend base URL, e.g. http://127.0.0.1:8080."
    )]
    pub base_url: Option<String>,

    #[arg(
        long = "timeout",
        value_name = "SECONDS",
        global = true,
        help_heading = "HTTP",
        help = "Request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        long = "proxy",
        value_name = "URL",
        global = true,
        help_heading = "HTTP",
        help = "Proxy for every request."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'y',
        long = "yes",
        visible_alias = "assume-yes",
        global = true,
        help_heading = "Behaviour",
        help = "Answer yes to every confirmation prompt."
    )]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PageArgs {
    #[arg(short = 'p', long = "page", value_name = "N", help = "Page to show (starts at 1).")]
    pub page: Option<u32>,

    #[arg(
        short = 's',
        long = "page-size",
        value_name = "N",
        help = "Rows per page: 10, 20, 50 or 100."
    )]
    pub page_size: Option<u32>,
}

/// A command target: robot id, or serial number when no id is given.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    #[arg(long = "id", value_name = "ROBOT_ID", help = "Robot id (preferred over --serial).")]
    pub id: Option<String>,

    #[arg(long = "serial", value_name = "N", help = "Robot serial number.")]
    pub serial: Option<u32>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RangeArgs {
    #[arg(long = "start", value_name = "SERIAL", help = "First serial number (inclusive).")]
    pub start: Option<u32>,

    #[arg(long = "end", value_name = "SERIAL", help = "Last serial number (inclusive).")]
    pub end: Option<u32>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List robots, one page at a time.
    #[command(visible_alias = "ls")]
    List(PageArgs),

    /// Re-list robots on an interval until Ctrl-C.
    Watch {
        #[command(flatten)]
        page: PageArgs,

        #[arg(
            short = 'i',
            long = "interval",
            value_name = "SECONDS",
            help = "Refresh interval in seconds (default 10)."
        )]
        interval: Option<u64>,
    },

    /// Register one robot.
    Add {
        #[arg(short = 'n', long = "name", value_name = "NAME", default_value = "")]
        name: String,

        #[arg(long = "serial", value_name = "N")]
        serial: u32,
    },

    /// Delete one robot.
    #[command(visible_alias = "rm")]
    Delete {
        #[arg(value_name = "ROBOT_ID")]
        robot_id: String,
    },

    /// Enable a disabled robot.
    Enable {
        #[arg(value_name = "ROBOT_ID")]
        robot_id: String,
    },

    /// Disable an enabled robot.
    Disable {
        #[arg(value_name = "ROBOT_ID")]
        robot_id: String,
    },

    /// Show a robot's last reported telemetry.
    #[command(visible_alias = "view")]
    Show {
        #[arg(value_name = "ROBOT_ID")]
        robot_id: String,
    },

    /// Register every serial number in a range.
    BatchAdd {
        #[command(flatten)]
        range: RangeArgs,

        #[arg(long = "prefix", value_name = "TEXT", help = "Name prefix (default \"Robot \").")]
        prefix: Option<String>,
    },

    /// Delete every robot whose serial number is in a range.
    BatchDelete {
        #[command(flatten)]
        range: RangeArgs,

        #[arg(
            short = 's',
            long = "page-size",
            value_name = "N",
            help = "Listing page size used while resolving the range."
        )]
        page_size: Option<u32>,
    },

    /// Send a scheduled-start command.
    Schedule {
        #[command(flatten)]
        target: TargetArgs,

        #[arg(long = "schedule-id", value_name = "1-255")]
        schedule_id: u8,

        #[arg(long = "weekday", value_name = "0-6", help = "0 = Sunday.")]
        weekday: u8,

        #[arg(long = "hour", value_name = "0-23")]
        hour: u8,

        #[arg(long = "minute", value_name = "0-59")]
        minute: u8,

        #[arg(long = "run-count", value_name = "1-255", default_value_t = 1)]
        run_count: u8,
    },

    /// Start a robot immediately.
    Start(TargetArgs),

    /// Push the current time to a robot.
    TimeSync(TargetArgs),

    /// Read or write alarm bit-fields.
    #[command(subcommand)]
    Alarms(AlarmsCommand),

    /// Write a commented default config file.
    InitConfig {
        #[arg(value_name = "FILE", help = "Destination (defaults to ~/.fleetdash/config.yml).")]
        path: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum AlarmsCommand {
    /// Show the alarm bits currently set on a robot.
    Get(TargetArgs),

    /// Replace all four alarm fields. Omitted fields are cleared.
    Set {
        #[command(flatten)]
        target: TargetArgs,

        #[arg(long = "fa", value_name = "BITS", help = "FA bits, comma-separated (0-26).")]
        fa: Option<String>,

        #[arg(long = "fb", value_name = "BITS", help = "FB bits, comma-separated (0-10).")]
        fb: Option<String>,

        #[arg(long = "fc", value_name = "BITS", help = "FC bits, comma-separated (0-30).")]
        fc: Option<String>,

        #[arg(long = "fd", value_name = "BITS", help = "FD bits, comma-separated (0-4).")]
        fd: Option<String>,
    },

    /// Print the checkbox table of one or all fields.
    Bits {
        #[arg(long = "field", value_name = "FA|FB|FC|FD")]
        field: Option<String>,

        #[command(flatten)]
        target: TargetArgs,
    },
}
