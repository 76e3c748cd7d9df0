use colored::Colorize;
use serde::Serialize;

use crate::api::types::{Robot, Statistics};
use crate::render::TextTable;
use crate::runner::ListView;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn render_json<T: Serialize>(value: &T) -> Vec<u8> {
    let mut out = serde_json::to_vec_pretty(value).unwrap_or_else(|_| b"null".to_vec());
    out.push(b'\n');
    out
}

pub fn render_statistics(stats: &Statistics) -> String {
    format!(
        "{} {}   {} {}   {} {}",
        "total:".bold(),
        stats.total,
        "enabled:".bold(),
        stats.enabled.to_string().green(),
        "disabled:".bold(),
        stats.disabled.to_string().red()
    )
}

fn status_cell(robot: &Robot) -> String {
    if robot.enabled {
        "enabled".green().to_string()
    } else {
        "disabled".red().to_string()
    }
}

pub fn render_robot_table(robots: &[Robot]) -> Vec<String> {
    let mut table = TextTable::new(["Robot ID", "Name", "Serial", "Status"]);
    for robot in robots {
        table.push_row(vec![
            robot.robot_id.clone(),
            robot.robot_name.clone(),
            format!("#{}", robot.serial_number),
            status_cell(robot),
        ]);
    }
    table.render()
}

/// Text rendering of a list view: statistics, grid, then page controls.
pub fn render_list_view(view: &ListView) -> Vec<u8> {
    let mut lines = vec![render_statistics(view.statistics()), String::new()];
    match view {
        ListView::Empty { .. } => lines.push("No robots registered yet.".dimmed().to_string()),
        ListView::Page {
            robots, footer, ..
        } => {
            lines.extend(render_robot_table(robots));
            if !footer.is_empty() {
                lines.push(String::new());
                lines.push(footer.clone());
            }
        }
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out.into_bytes()
}

pub fn render_lines(lines: &[String]) -> Vec<u8> {
    let mut out = lines.join("\n");
    out.push('\n');
    out.into_bytes()
}
