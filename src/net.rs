//! Client IP resolution.
//!
//! Proxy headers are consulted in a fixed order and a candidate is only
//! accepted if it parses as a public IP literal; otherwise resolution falls
//! through to the next source and finally to the raw connection address,
//! even when that address is private.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use axum::http::HeaderMap;

/// Headers checked for a forwarded client address, in preference order.
const IP_HEADERS: [&str; 3] = ["x-forwarded-for", "x-real-ip", "x-client-ip"];

/// Resolve the client IP from proxy headers, falling back to the socket
/// address. A comma-separated forwarded-for list yields its first entry.
pub fn resolve_client_ip(headers: &HeaderMap, remote: IpAddr) -> IpAddr {
    for header in IP_HEADERS {
        let Some(value) = headers.get(header).and_then(|v| v.to_str().ok()) else {
            continue;
        };
        let candidate = value.split(',').next().unwrap_or("").trim();
        if let Ok(ip) = candidate.parse::<IpAddr>() {
            if is_public(ip) {
                return ip;
            }
        }
    }
    remote
}

/// Whether `ip` is a routable public address (not private, loopback,
/// link-local, or otherwise reserved).
pub fn is_public(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => is_public_v6(v6),
    }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();
    !(ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_documentation()
        // 100.64.0.0/10 carrier-grade NAT
        || (octets[0] == 100 && (octets[1] & 0xc0) == 64)
        // 240.0.0.0/4 reserved
        || octets[0] >= 240)
}

fn is_public_v6(ip: Ipv6Addr) -> bool {
    let segments = ip.segments();
    !(ip.is_loopback()
        || ip.is_unspecified()
        // fc00::/7 unique local
        || (segments[0] & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (segments[0] & 0xffc0) == 0xfe80)
}
