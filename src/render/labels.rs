/// Display label for a telemetry key, falling back to the key itself.
pub fn label_for(key: &str) -> &str {
    lookup(key).unwrap_or(key)
}

fn lookup(key: &str) -> Option<&'static str> {
    let label = match key {
        "robot_id" => "Robot ID",
        "publish_topic" => "Publish topic",
        "subscribe_topic" => "Subscribe topic",
        "sequence" => "MQTT sequence",
        "report_interval_seconds" => "Report interval (s)",
        "running" => "Running",
        "data" => "Data",

        "main_motor_current" => "Main motor current",
        "slave_motor_current" => "Slave motor current",
        "battery_voltage" => "Battery voltage",
        "battery_current" => "Battery current",
        "battery_status" => "Battery status",
        "battery_level" => "Battery level",
        "battery_temperature" => "Battery temperature",
        "position_info" => "Position info",
        "working_duration" => "Working duration",
        "total_run_count" => "Total runs",
        "current_lap_count" => "Current lap",
        "solar_voltage" => "Solar voltage",
        "solar_current" => "Solar current",
        "board_temperature" => "Board temperature",
        "robot_number" => "Robot number",
        "software_version" => "Software version",
        "parking_position" => "Parking position",
        "daytime_scan_protect" => "Daytime scan protection",
        "schedule_tasks" => "Schedule tasks",
        "enabled" => "Enabled",
        "motor_params" => "Motor parameters",
        "temp_voltage_protection" => "Temperature/voltage protection",
        "local_time" => "Local time",
        "environment_info" => "Environment",
        "master_currents" => "Master currents",
        "slave_currents" => "Slave currents",
        "position" => "Position",
        "direction" => "Direction",
        "module_eui" => "Module EUI",
        "domestic_foreign_flag" => "Domestic/foreign build",
        "country_code" => "Country code",
        "region_code" => "Region code",
        "project_code" => "Project code",

        "lora_params" => "LoRa parameters",
        "power" => "Power",
        "frequency" => "Frequency",
        "rate" => "Rate",

        "year" => "Year",
        "month" => "Month",
        "day" => "Day",
        "second" => "Second",

        "sensor_temperature" => "Sensor temperature",
        "sensor_humidity" => "Sensor humidity",
        "ambient_temperature" => "Ambient temperature",
        "day_night_status" => "Day/night status",

        "current_timestamp" => "Current timestamp",

        "walk_motor_speed" => "Walk motor speed",
        "brush_motor_speed" => "Brush motor speed",
        "windproof_motor_speed" => "Windproof motor speed",
        "walk_motor_max_current_ma" => "Walk motor cut-off current (mA)",
        "brush_motor_max_current_ma" => "Brush motor cut-off current (mA)",
        "windproof_motor_max_current_ma" => "Windproof motor cut-off current (mA)",
        "walk_motor_warning_current_ma" => "Walk motor warning current (mA)",
        "brush_motor_warning_current_ma" => "Brush motor warning current (mA)",
        "windproof_motor_warning_current_ma" => "Windproof motor warning current (mA)",
        "walk_motor_mileage_m" => "Walk motor mileage (m)",
        "brush_motor_timeout_s" => "Brush motor timeout (s)",
        "windproof_motor_timeout_s" => "Windproof motor timeout (s)",
        "reverse_time_s" => "Reverse time (s)",
        "protection_angle" => "Protection angle",

        "protection_current_ma" => "Protection current (mA)",
        "high_temp_threshold" => "High temperature threshold",
        "low_temp_threshold" => "Low temperature threshold",
        "protection_temp" => "Protection temperature",
        "recovery_temp" => "Recovery temperature",
        "protection_voltage" => "Protection voltage",
        "recovery_voltage" => "Recovery voltage",
        "protection_battery_level" => "Protection battery level",
        "limit_run_battery_level" => "Limited-run battery level",
        "recovery_battery_level" => "Recovery battery level",
        "board_protection_temp" => "Board protection temperature",
        "board_recovery_temp" => "Board recovery temperature",

        "weekday" => "Weekday",
        "hour" => "Hour",
        "minute" => "Minute",
        "run_count" => "Run count",

        "robot_name" => "Robot name",
        "serial_number" => "Serial number",
        _ => return None,
    };
    Some(label)
}
