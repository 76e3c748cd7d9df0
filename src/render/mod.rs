//! Human-readable rendering of a robot's last reported telemetry.
//!
//! The document shape is owned by the backend, so everything here walks a
//! generic [`serde_json::Value`] and only special-cases keys it recognises.

mod labels;
mod table;

use itertools::Itertools;
use serde_json::{Map, Value};

use crate::api::types::RobotSnapshot;

pub use labels::label_for;
pub use table::TextTable;

const INDENT: &str = "  ";

/// Keys rendered in their own sections instead of inline.
const SECTION_KEYS: [&str; 8] = [
    "current_timestamp",
    "local_time",
    "clean_records",
    "cleanRecords",
    "schedules",
    "schedule",
    "timers",
    "schedule_tasks",
];

/// Object-valued keys shown as two-column key/value tables.
const TABLE_KEYS: [&str; 7] = [
    "motor_params",
    "environment_info",
    "temp_voltage_protection",
    "lora_params",
    "master_currents",
    "slave_currents",
    "position_info",
];

const CLEAN_RECORD_ROWS: usize = 5;
const MIN_CURRENT_ROWS: usize = 16;

/// JavaScript-style truthiness, used where the backend may send `0`, `""`
/// or `null` for "absent".
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Bare text for a scalar, strings without quotes.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn tenths(value: &Value, unit: &str) -> Option<String> {
    value.as_f64().map(|v| format!("{:.1}{unit}", v / 10.0))
}

/// Formats a scalar using the unit conventions of its key. Voltages and
/// currents arrive in tenths.
pub fn format_value(key: &str, value: &Value) -> String {
    if value.is_null() {
        return "null".to_string();
    }
    let formatted = match key {
        "battery_level" => Some(format!("{}%", scalar_text(value))),
        "battery_voltage" | "solar_voltage" => tenths(value, "V"),
        "battery_current" | "main_motor_current" | "slave_motor_current" | "solar_current" => {
            tenths(value, "A")
        }
        "battery_temperature" | "board_temperature" => {
            Some(format!("{}°C", scalar_text(value)))
        }
        "working_duration" => Some(format!("{} h", scalar_text(value))),
        _ => None,
    };
    if let Some(formatted) = formatted {
        return formatted;
    }
    match value {
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        other => scalar_text(other),
    }
}

fn pad2(value: Option<&Value>) -> String {
    match value {
        Some(v) => format!("{:0>2}", scalar_text(v)),
        None => "00".to_string(),
    }
}

/// `YYYY-MM-DD HH:MM:SS` from a `{year, month, day, hour, minute, second,
/// weekday}` object; parts without their keys are left out.
pub fn format_time_object(value: &Value) -> String {
    let Some(obj) = value.as_object() else {
        return String::new();
    };
    let mut parts = Vec::new();
    if let Some(year) = obj.get("year") {
        parts.push(format!(
            "{}-{}-{}",
            scalar_text(year),
            pad2(obj.get("month")),
            pad2(obj.get("day"))
        ));
    }
    if obj.contains_key("hour") {
        parts.push(format!(
            "{}:{}:{}",
            pad2(obj.get("hour")),
            pad2(obj.get("minute")),
            pad2(obj.get("second"))
        ));
    }
    if let Some(weekday) = obj.get("weekday") {
        if !obj.get("year").map(truthy).unwrap_or(false) {
            parts.push(format!("weekday {}", scalar_text(weekday)));
        }
    }
    parts.join(" ")
}

/// Recursive rendering of a nested value. Object keys are labelled,
/// array items indexed.
pub fn render_value(value: &Value, depth: usize, out: &mut Vec<String>) {
    let pad = INDENT.repeat(depth);
    match value {
        Value::Object(map) => {
            for (key, item) in map {
                let label = label_for(key);
                if item.is_object() || item.is_array() {
                    out.push(format!("{pad}{label}:"));
                    render_value(item, depth + 1, out);
                } else {
                    out.push(format!("{pad}{label}: {}", format_value(key, item)));
                }
            }
        }
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                if item.is_object() || item.is_array() {
                    out.push(format!("{pad}[{idx}]"));
                    render_value(item, depth + 1, out);
                } else {
                    out.push(format!("{pad}[{idx}] {}", scalar_text(item)));
                }
            }
        }
        scalar => out.push(format!("{pad}{}", scalar_text(scalar))),
    }
}

fn nested_text(value: &Value) -> String {
    let mut lines = Vec::new();
    render_value(value, 0, &mut lines);
    lines.iter().map(|l| l.trim()).join("; ")
}

/// Two-column table for an object (`field | value`) or array (`# | value`).
pub fn key_value_table(value: &Value) -> TextTable {
    match value {
        Value::Array(items) => {
            let mut table = TextTable::new(["#", "Value"]);
            for (idx, item) in items.iter().enumerate() {
                let cell = if item.is_object() || item.is_array() {
                    nested_text(item)
                } else {
                    scalar_text(item)
                };
                table.push_row(vec![(idx + 1).to_string(), cell]);
            }
            table
        }
        Value::Object(map) => {
            let mut table = TextTable::new(["Field", "Value"]);
            for (key, item) in map {
                let cell = if item.is_object() || item.is_array() {
                    nested_text(item)
                } else {
                    format_value(key, item)
                };
                table.push_row(vec![label_for(key).to_string(), cell]);
            }
            table
        }
        scalar => {
            let mut table = TextTable::new(["Value"]);
            table.push_row(vec![scalar_text(scalar)]);
            table
        }
    }
}

/// First truthy value among `keys`, looked up in each source in turn per key.
fn pick<'a>(sources: &[&'a Value], keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| {
        sources
            .iter()
            .copied()
            .filter_map(|source| source.get(key))
            .find(|v| truthy(v))
    })
}

fn currents_table(robot_data: &Value, last_data: &Value) -> TextTable {
    let empty = Vec::new();
    let masters = pick(&[robot_data, last_data], &["master_currents"])
        .and_then(Value::as_array)
        .unwrap_or(&empty);
    let slaves = pick(&[robot_data, last_data], &["slave_currents"])
        .and_then(Value::as_array)
        .unwrap_or(&empty);
    let rows = masters.len().max(slaves.len()).max(MIN_CURRENT_ROWS);

    let mut table = TextTable::new(["#", "Master current", "Slave current"]);
    for i in 0..rows {
        let master = masters
            .get(i)
            .map(|v| format_value("master_currents", v))
            .unwrap_or_default();
        let slave = slaves
            .get(i)
            .map(|v| format_value("slave_currents", v))
            .unwrap_or_default();
        table.push_row(vec![(i + 1).to_string(), master, slave]);
    }
    table
}

fn field_text(item: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| item.get(key).filter(|v| !v.is_null()))
        .map(scalar_text)
        .unwrap_or_default()
}

fn clean_records_table(records: &[Value]) -> TextTable {
    let mut table = TextTable::new(["#", "Day", "Time", "Minutes", "Result", "Energy"]);
    for i in 0..CLEAN_RECORD_ROWS {
        let idx = (i + 1).to_string();
        let Some(rec) = records.get(i).filter(|r| truthy(r)) else {
            table.push_row(vec![idx, "no data".to_string()]);
            continue;
        };
        let result = match rec.get("result") {
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => "ok".to_string(),
            Some(Value::Number(n)) => format!("code {n}"),
            Some(other) => scalar_text(other),
            None => String::new(),
        };
        table.push_row(vec![
            idx,
            field_text(rec, &["day"]),
            format!("{}:{}", pad2(rec.get("hour")), pad2(rec.get("minute"))),
            field_text(rec, &["minutes"]),
            result,
            field_text(rec, &["energy"]),
        ]);
    }
    table
}

fn schedules_table(schedules: &[Value]) -> TextTable {
    let mut table = TextTable::new(["#", "ID", "Weekday", "Time", "Runs", "Status"]);
    for (i, item) in schedules.iter().enumerate() {
        let idx = (i + 1).to_string();
        if !truthy(item) {
            table.push_row(vec![idx, "no data".to_string()]);
            continue;
        }
        let status = ["enabled", "active"]
            .iter()
            .find_map(|key| item.get(key).and_then(Value::as_bool))
            .map(|on| if on { "enabled" } else { "disabled" })
            .unwrap_or("")
            .to_string();
        table.push_row(vec![
            idx,
            field_text(item, &["id", "schedule_id"]),
            field_text(item, &["weekday", "week"]),
            format!("{}:{}", pad2(item.get("hour")), pad2(item.get("minute"))),
            field_text(item, &["run_count", "runTimes"]),
            status,
        ]);
    }
    table
}

fn push_table(out: &mut Vec<String>, title: &str, table: &TextTable) {
    out.push(String::new());
    out.push(format!("{title}:"));
    out.extend(table.render().into_iter().map(|l| format!("{INDENT}{l}")));
}

/// Full text rendering of a snapshot: header, inline data, times, then
/// tables.
pub fn render_snapshot(snapshot: &RobotSnapshot) -> Vec<String> {
    let Some(robot_id) = snapshot.robot_id.as_deref() else {
        let message = snapshot
            .error
            .clone()
            .unwrap_or_else(|| "unable to fetch robot data".to_string());
        return vec![message];
    };

    let mut out = Vec::new();
    let mut tables = Vec::new();

    out.push(format!("Robot ID: {robot_id}"));
    if let Some(serial) = snapshot.serial_number {
        out.push(format!("Serial: #{serial}"));
    }
    if let Some(name) = snapshot.robot_name.as_deref().filter(|n| !n.is_empty()) {
        out.push(format!("Name: {name}"));
    }
    let status = if snapshot.is_running() {
        "Running"
    } else {
        "Stopped"
    };
    out.push(format!("Status: {status}"));

    let last_data = &snapshot.last_data;
    for key in ["publish_topic", "subscribe_topic"] {
        if let Some(v) = last_data.get(key).filter(|v| truthy(v)) {
            out.push(format!("{}: {}", label_for(key), scalar_text(v)));
        }
    }
    for key in ["sequence", "report_interval_seconds"] {
        if let Some(v) = last_data.get(key) {
            out.push(format!("{}: {}", label_for(key), scalar_text(v)));
        }
    }

    out.push(String::new());
    out.push("Data".to_string());
    out.push("----".to_string());

    let robot_data = last_data
        .get("data")
        .filter(|v| truthy(v))
        .unwrap_or(last_data);
    let empty = Map::new();
    let entries = robot_data.as_object().unwrap_or(&empty);

    let mut currents_rendered = false;
    for (key, value) in entries {
        if SECTION_KEYS.contains(&key.as_str()) {
            continue;
        }
        let label = label_for(key);
        if !(value.is_object() || value.is_array()) {
            out.push(format!("{label}: {}", format_value(key, value)));
            continue;
        }
        if key == "master_currents" && !currents_rendered {
            push_table(&mut tables, label, &currents_table(robot_data, last_data));
            currents_rendered = true;
        } else if key == "slave_currents" && currents_rendered {
            continue;
        } else if TABLE_KEYS.contains(&key.as_str()) {
            push_table(&mut tables, label, &key_value_table(value));
        } else {
            out.push(format!("{label}:"));
            render_value(value, 1, &mut out);
        }
    }

    for key in ["current_timestamp", "local_time"] {
        if let Some(time) = robot_data.get(key) {
            let text = format_time_object(time);
            if !text.is_empty() {
                out.push(format!("{}: {text}", label_for(key)));
            }
        }
    }

    let clean_records = pick(&[robot_data, last_data], &["clean_records", "cleanRecords"])
        .and_then(Value::as_array)
        .filter(|records| !records.is_empty());
    if let Some(records) = clean_records {
        push_table(&mut tables, "Recent clean records", &clean_records_table(records));
    }

    let schedules = pick(
        &[robot_data, last_data],
        &["schedules", "timers", "schedule_tasks", "scheduleList"],
    )
    .and_then(Value::as_array)
    .filter(|items| !items.is_empty());
    if let Some(items) = schedules {
        push_table(&mut tables, "Recent schedules", &schedules_table(items));
    }

    out.extend(tables);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(last_data: Value) -> RobotSnapshot {
        RobotSnapshot {
            robot_id: Some("r1".to_string()),
            serial_number: Some(12),
            robot_name: Some("Robot 12".to_string()),
            status: Some("running".to_string()),
            last_data,
            error: None,
        }
    }

    #[test]
    fn units_follow_key_conventions() {
        assert_eq!(format_value("battery_level", &json!(87)), "87%");
        assert_eq!(format_value("battery_voltage", &json!(254)), "25.4V");
        assert_eq!(format_value("solar_current", &json!(7)), "0.7A");
        assert_eq!(format_value("board_temperature", &json!(41)), "41°C");
        assert_eq!(format_value("working_duration", &json!(3)), "3 h");
        assert_eq!(format_value("enabled", &json!(true)), "yes");
        assert_eq!(format_value("anything", &Value::Null), "null");
        assert_eq!(format_value("robot_number", &json!("A-7")), "A-7");
    }

    #[test]
    fn time_objects_render_date_and_clock() {
        let full = json!({"year": 2024, "month": 3, "day": 9, "hour": 7, "minute": 5, "second": 0, "weekday": 6});
        assert_eq!(format_time_object(&full), "2024-03-09 07:05:00");
        let clock = json!({"hour": 23, "minute": 59, "second": 1});
        assert_eq!(format_time_object(&clock), "23:59:01");
        let weekly = json!({"hour": 8, "minute": 0, "second": 0, "weekday": 2});
        assert_eq!(format_time_object(&weekly), "08:00:00 weekday 2");
        assert_eq!(format_time_object(&json!(5)), "");
    }

    #[test]
    fn nested_values_are_labelled_and_indexed() {
        let mut out = Vec::new();
        render_value(&json!({"lora_params": {"power": 20}, "unknown_list": [1, "x"]}), 0, &mut out);
        assert_eq!(
            out,
            vec![
                "LoRa parameters:",
                "  Power: 20",
                "unknown_list:",
                "  [0] 1",
                "  [1] x",
            ]
        );
    }

    #[test]
    fn snapshot_without_robot_id_shows_error() {
        let snap = RobotSnapshot {
            error: Some("robot not found".to_string()),
            ..RobotSnapshot::default()
        };
        assert_eq!(render_snapshot(&snap), vec!["robot not found"]);
    }

    #[test]
    fn snapshot_renders_header_data_and_tables() {
        let snap = snapshot(json!({
            "publish_topic": "robots/r1/up",
            "sequence": 42,
            "data": {
                "battery_level": 80,
                "battery_voltage": 251,
                "motor_params": {"walk_motor_speed": 3},
                "master_currents": [10, 11],
                "slave_currents": [12],
                "local_time": {"year": 2024, "month": 1, "day": 2, "hour": 3, "minute": 4, "second": 5},
                "clean_records": [{"day": 1, "hour": 6, "minute": 30, "minutes": 45, "result": 0, "energy": 12}]
            }
        }));
        let lines = render_snapshot(&snap);

        assert_eq!(lines[0], "Robot ID: r1");
        assert!(lines.contains(&"Serial: #12".to_string()));
        assert!(lines.contains(&"Status: Running".to_string()));
        assert!(lines.contains(&"Publish topic: robots/r1/up".to_string()));
        assert!(lines.contains(&"MQTT sequence: 42".to_string()));
        assert!(lines.contains(&"Battery level: 80%".to_string()));
        assert!(lines.contains(&"Battery voltage: 25.1V".to_string()));
        assert!(lines.contains(&"Local time: 2024-01-02 03:04:05".to_string()));
        assert!(lines.contains(&"Motor parameters:".to_string()));
        assert!(lines.contains(&"Master currents:".to_string()));
        assert!(!lines.contains(&"Slave currents:".to_string()));
        assert!(lines.contains(&"Recent clean records:".to_string()));
        assert!(lines.iter().any(|l| l.contains("06:30") && l.contains("ok")));
        assert_eq!(lines.iter().filter(|l| l.contains("no data")).count(), 4);

        let currents_header = lines
            .iter()
            .position(|l| l == "Master currents:")
            .unwrap();
        // header, rule, then at least 16 rows
        let first_row = &lines[currents_header + 3];
        assert!(first_row.contains("10") && first_row.contains("12"));
        assert!(lines.len() > currents_header + 2 + MIN_CURRENT_ROWS);
    }

    #[test]
    fn string_last_data_is_parsed() {
        let snap = snapshot(Value::String(r#"{"data": {"battery_level": 5}}"#.to_string())).normalize();
        let lines = render_snapshot(&snap);
        assert!(lines.contains(&"Battery level: 5%".to_string()));
    }

    #[test]
    fn schedules_render_from_first_present_key() {
        let snap = snapshot(json!({
            "timers": [{"schedule_id": 3, "week": 1, "hour": 9, "minute": 5, "runTimes": 2, "active": false}]
        }));
        let lines = render_snapshot(&snap);
        assert!(lines.contains(&"Recent schedules:".to_string()));
        let row = lines.iter().find(|l| l.contains("09:05")).unwrap();
        assert!(row.contains("disabled"));
        assert!(row.starts_with("  1 "));
    }
}
