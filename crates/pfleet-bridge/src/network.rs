//! Wireless address discovery helpers

use regex::Regex;
use std::net::Ipv4Addr;
use std::sync::LazyLock;

/// Port the device bridge listens on after `adb tcpip`
pub const DEFAULT_TCPIP_PORT: u16 = 5555;

/// Wireless interface queried for the device's address
pub const DEFAULT_WIFI_INTERFACE: &str = "wlan0";

/// `inet 192.168.1.42/24 ...` (iproute2) or `inet addr:192.168.1.42 ...` (busybox ifconfig).
/// `inet6` lines never match because `inet` must be followed by whitespace.
static INET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\binet\s+(?:addr:)?(\d{1,3}(?:\.\d{1,3}){3})(?:/\d{1,2})?\b")
        .expect("Invalid inet pattern regex")
});

/// Remote command printing the interface configuration
pub fn interface_query_argv(interface: &str) -> [&str; 4] {
    ["ip", "addr", "show", interface]
}

/// Extract the first IPv4 address from interface configuration output
///
/// Only lines carrying the `inet` token are considered; the mask suffix is
/// stripped. Candidates that are not valid dotted quads are skipped.
pub fn parse_inet_address(output: &str) -> Option<Ipv4Addr> {
    output
        .lines()
        .filter_map(|line| INET_PATTERN.captures(line))
        .filter_map(|caps| caps.get(1)?.as_str().parse::<Ipv4Addr>().ok())
        .next()
}
