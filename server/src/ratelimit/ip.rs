//! Client identification for throttling.
//!
//! Throttle records key on a normalized textual client identifier. IPv4
//! addresses pass through unchanged; IPv6 addresses collapse to their /64
//! prefix so one allocation cannot dodge the limiter address by address.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::extract::ConnectInfo;
use axum::http::HeaderMap;

/// IPv6 segments kept when normalizing (a /64 prefix).
const IPV6_PREFIX_SEGMENTS: usize = 4;

/// Resolves the normalized client identifier for a request.
///
/// `X-Forwarded-For` and `X-Real-IP` are honored only when `trust_proxy` is
/// set; otherwise the socket peer address wins, with loopback as the last
/// resort.
pub fn client_identifier(
    headers: &HeaderMap,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
    trust_proxy: bool,
) -> String {
    normalize_ip(extract_ip(headers, connect_info, trust_proxy))
}

fn extract_ip(
    headers: &HeaderMap,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
    trust_proxy: bool,
) -> IpAddr {
    if trust_proxy {
        let forwarded = headers
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse().ok());
        if let Some(ip) = forwarded {
            return ip;
        }

        let real_ip = headers
            .get("X-Real-IP")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse().ok());
        if let Some(ip) = real_ip {
            return ip;
        }
    }

    connect_info
        .map(|c| c.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

fn normalize_ip(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => {
            let segments = v6.segments();
            let prefix: Vec<String> = segments[..IPV6_PREFIX_SEGMENTS]
                .iter()
                .map(|s| format!("{s:x}"))
                .collect();
            format!("{}::/64", prefix.join(":"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    fn peer(ip: [u8; 4]) -> ConnectInfo<SocketAddr> {
        ConnectInfo(SocketAddr::new(
            IpAddr::V4(Ipv4Addr::new(ip[0], ip[1], ip[2], ip[3])),
            40000,
        ))
    }

    #[test]
    fn test_ipv4_passes_through() {
        let headers = HeaderMap::new();
        let id = client_identifier(&headers, Some(&peer([203, 0, 113, 5])), false);
        assert_eq!(id, "203.0.113.5");
    }

    #[test]
    fn test_ipv6_collapses_to_prefix() {
        let ip = IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0x85a3, 0x42, 0, 0, 0, 9));
        assert_eq!(normalize_ip(ip), "2001:db8:85a3:42::/64");
    }

    #[test]
    fn test_forwarded_header_requires_trust() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Forwarded-For", "198.51.100.7, 10.0.0.2".parse().unwrap());

        let trusted = client_identifier(&headers, Some(&peer([10, 0, 0, 1])), true);
        assert_eq!(trusted, "198.51.100.7");

        let untrusted = client_identifier(&headers, Some(&peer([10, 0, 0, 1])), false);
        assert_eq!(untrusted, "10.0.0.1");
    }

    #[test]
    fn test_real_ip_is_second_choice() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Real-IP", "198.51.100.25".parse().unwrap());
        assert_eq!(
            client_identifier(&headers, Some(&peer([10, 0, 0, 1])), true),
            "198.51.100.25"
        );

        headers.insert("X-Forwarded-For", "203.0.113.50".parse().unwrap());
        assert_eq!(
            client_identifier(&headers, Some(&peer([10, 0, 0, 1])), true),
            "203.0.113.50"
        );
    }

    #[test]
    fn test_garbage_header_falls_back_to_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Forwarded-For", "not-an-ip".parse().unwrap());
        assert_eq!(
            client_identifier(&headers, Some(&peer([10, 0, 0, 1])), true),
            "10.0.0.1"
        );
    }

    #[test]
    fn test_no_peer_falls_back_to_loopback() {
        let headers = HeaderMap::new();
        assert_eq!(client_identifier(&headers, None, false), "127.0.0.1");
    }
}
