//! Helpers for reading the NVUE payload shapes nvq queries.
//!
//! The EVPN MAC endpoint returns an object keyed by MAC address; the BGP
//! l2vpn-evpn loc-RIB returns `{"rd": {<rd>: {"route-type": {<type>: ...}}}}`.

use serde_json::Value;

/// MACs shown per device before eliding the rest.
pub const MAC_PREVIEW: usize = 10;

/// Payload shape implied by the queried API path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// Object keyed by MAC address (EVPN MAC table and anything unrecognized).
    MacTable,
    /// BGP l2vpn-evpn loc-RIB keyed by route distinguisher.
    EvpnLocRib,
}

impl PayloadKind {
    pub fn for_api_path(api_path: &str) -> Self {
        let path = api_path.split(['?', '#']).next().unwrap_or(api_path);
        if path.trim_end_matches('/').ends_with("/l2vpn-evpn/loc-rib") {
            PayloadKind::EvpnLocRib
        } else {
            PayloadKind::MacTable
        }
    }
}

/// MAC addresses (object keys) in a MAC-table payload, in payload order.
pub fn mac_addresses(data: &Value) -> Vec<&str> {
    match data.as_object() {
        Some(map) => map.keys().map(String::as_str).collect(),
        None => Vec::new(),
    }
}

/// One-line description of a MAC-table payload: `leaf1 has MACs [..]`.
pub fn mac_line(device: &str, data: &Value) -> String {
    if !data.is_object() {
        return format!("{} returned non-dict data", device);
    }
    let macs = mac_addresses(data);
    let shown: Vec<&str> = macs.iter().take(MAC_PREVIEW).copied().collect();
    let more = if macs.len() > MAC_PREVIEW { "..." } else { "" };
    format!("{} has MACs {:?}{}", device, shown, more)
}

/// EVPN type-2 (MAC/IP) routes of one route distinguisher.
#[derive(Debug, Clone, PartialEq)]
pub struct Type2Routes<'a> {
    pub rd: &'a str,
    pub routes: &'a Value,
}

/// Type-2 route blocks per RD from a loc-RIB payload. RDs without type-2
/// routes are skipped.
pub fn evpn_type2_routes(data: &Value) -> Vec<Type2Routes<'_>> {
    let Some(rds) = data.get("rd").and_then(Value::as_object) else {
        return Vec::new();
    };
    rds.iter()
        .filter_map(|(rd, entry)| {
            entry
                .get("route-type")
                .and_then(|rt| rt.get("2"))
                .map(|routes| Type2Routes { rd, routes })
        })
        .collect()
}
