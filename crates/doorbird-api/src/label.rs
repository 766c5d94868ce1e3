/// Human-readable device label for log lines.
///
/// In order of preference: the configured name, `{device type}@{address}`
/// once the device type is known, or the bare address.
pub fn device_label(name: Option<&str>, device_type: Option<&str>, address: &str) -> String {
    if let Some(name) = name.filter(|n| !n.is_empty()) {
        return name.to_owned();
    }

    match device_type.filter(|t| !t.is_empty()) {
        Some(device_type) => format!("{device_type}@{address}"),
        None => address.to_owned(),
    }
}
