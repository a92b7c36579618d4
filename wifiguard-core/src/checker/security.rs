use crate::wifi::SecurityMode;

/// Capability markers, strongest first.
const MARKERS: [(&str, SecurityMode); 3] = [
    ("EAP", SecurityMode::Eap),
    ("PSK", SecurityMode::Psk),
    ("WEP", SecurityMode::Wep),
];

/// Classify a network from its advertised capability string.
pub fn classify(capabilities: &str) -> SecurityMode {
    MARKERS
        .iter()
        .find(|(marker, _)| capabilities.contains(*marker))
        .map(|(_, mode)| *mode)
        .unwrap_or(SecurityMode::Open)
}
