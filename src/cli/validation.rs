use crate::alarms::AlarmField;
use crate::cli::args::{AlarmsCommand, CliArgs, Command, PageArgs};
use crate::output::OutputFormat;
use crate::pagination;

fn validate_page_size(value: Option<u32>) -> Result<(), String> {
    if let Some(size) = value {
        if !pagination::is_valid_page_size(size) {
            return Err(format!(
                "invalid page-size {size}, expected one of 10, 20, 50, 100"
            ));
        }
    }
    Ok(())
}

fn validate_page_args(args: &PageArgs) -> Result<(), String> {
    if args.page == Some(0) {
        return Err("invalid page, expected positive integer".to_string());
    }
    validate_page_size(args.page_size)
}

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(raw) = args.output_format.as_deref() {
        if OutputFormat::parse(raw).is_none() {
            return Err(format!("invalid --output-format '{raw}', expected text or json"));
        }
    }
    if args.timeout == Some(0) {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    match &args.command {
        Command::List(page) => validate_page_args(page)?,
        Command::Watch { page, interval } => {
            validate_page_args(page)?;
            if *interval == Some(0) {
                return Err("invalid interval, expected positive integer".to_string());
            }
        }
        Command::BatchDelete { page_size, .. } => validate_page_size(*page_size)?,
        Command::Alarms(AlarmsCommand::Bits {
            field: Some(raw), ..
        }) => {
            if AlarmField::parse(raw).is_none() {
                return Err(format!("invalid --field '{raw}', expected FA, FB, FC or FD"));
            }
        }
        _ => {}
    }
    Ok(())
}
