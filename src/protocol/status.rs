//! Status strings carried in status telemetry entries.

/// Alert: the tag button was pressed.
pub const BUTTON_PRESSED: &str = "BUTTON=PRESSED";

/// Alert: the temperature probe is unplugged.
pub const PROBE_UNPLUGGED: &str = "TEMP_PROBE_ERROR=UNPLUGGED";

/// Alert: the temperature probe returned an invalid reading.
pub const PROBE_INVALID_VALUE: &str = "TEMP_PROBE_ERROR=INVALID_VALUE";

pub const UTIL_STATE_UNPLUGGED: &str = "UTIL_STATE=UNPLUGGED";
pub const UTIL_STATE_PLUGGED_IN_OFF: &str = "UTIL_STATE=PLUGGED_IN_OFF";
pub const UTIL_STATE_PLUGGED_IN_IDLE: &str = "UTIL_STATE=PLUGGED_IN_IDLE";
pub const UTIL_STATE_PLUGGED_IN_ACTIVE: &str = "UTIL_STATE=PLUGGED_IN_ACTIVE";

pub const DOOR_OPEN_PERCENT_KEY: &str = "DOOR_OPEN_PERCENT";
pub const HIGH_POWER_MODE_PERCENT_KEY: &str = "HIGH_POWER_MODE_PERCENT";

/// Percentage of time the fridge door has been open.
pub fn door_open_percent(percent: u8) -> String {
    format!("{DOOR_OPEN_PERCENT_KEY}={percent}")
}

/// Percentage of time the device ran in high-power mode.
pub fn high_power_percent(percent: u8) -> String {
    format!("{HIGH_POWER_MODE_PERCENT_KEY}={percent}")
}
