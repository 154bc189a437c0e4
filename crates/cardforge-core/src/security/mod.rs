//! Egress security gate (SSRF defense).
//!
//! Every outbound destination - AI proxy targets, third-party importer
//! URLs - passes through [`EgressPolicy::validate`] before a client is
//! constructed. The gate checks, in order: URL parseability, localhost
//! policy, hostname allowlist, then a *fresh* DNS resolution with
//! private-range classification of every returned address. Resolution
//! results are never cached across calls: an allowlisted public hostname
//! can be repointed at a private address between requests, so each call
//! must re-resolve (DNS rebinding / TOCTOU).
//!
//! Classification errs toward blocked. Anything that fails to parse as an
//! address is blocked; resolution *failure* however is treated as "no
//! addresses" and passes an allowlisted hostname through (fail-open, see
//! DESIGN.md).

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use ipnet::{Ipv4Net, Ipv6Net};
use thiserror::Error;
use tokio::net::lookup_host;
use url::{Host, Url};

mod redact;

pub use redact::redact;

#[derive(Error, Debug)]
pub enum SecurityError {
    #[error("blocked URL: {reason}")]
    UrlBlocked { url: String, reason: String },

    #[error("private/internal address blocked: {addr}")]
    PrivateAddress { addr: IpAddr },
}

impl SecurityError {
    fn blocked(url: &str, reason: impl Into<String>) -> Self {
        // URLs in error messages may carry keys in query strings
        Self::UrlBlocked {
            url: redact(url),
            reason: reason.into(),
        }
    }
}

/// Where a destination address lands, from the gate's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrClass {
    Loopback,
    LinkLocal,
    Private,
    Cgnat,
    Reserved,
    Multicast,
    Unspecified,
    Public,
}

impl AddrClass {
    /// Everything except `Public` is blocked.
    pub fn is_blocked(self) -> bool {
        self != Self::Public
    }
}

/// Shared Address Space, RFC 6598.
static CGNAT: LazyLock<Ipv4Net> = LazyLock::new(|| {
    "100.64.0.0/10".parse().expect("CGNAT range literal")
});

/// IANA special-use IPv4 blocks not covered by the std predicates.
static IPV4_RESERVED: LazyLock<Vec<Ipv4Net>> = LazyLock::new(|| {
    [
        "192.0.0.0/24",    // IETF protocol assignments
        "192.0.2.0/24",    // TEST-NET-1
        "198.18.0.0/15",   // benchmarking
        "198.51.100.0/24", // TEST-NET-2
        "203.0.113.0/24",  // TEST-NET-3
        "240.0.0.0/4",     // reserved for future use
    ]
    .iter()
    .map(|s| s.parse().expect("reserved range literal"))
    .collect()
});

/// Unique local addresses, fc00::/7.
static IPV6_UNIQUE_LOCAL: LazyLock<Ipv6Net> =
    LazyLock::new(|| "fc00::/7".parse().expect("ULA range literal"));

/// Link-local unicast, fe80::/10.
static IPV6_LINK_LOCAL: LazyLock<Ipv6Net> =
    LazyLock::new(|| "fe80::/10".parse().expect("link-local range literal"));

fn classify_v4(addr: Ipv4Addr) -> AddrClass {
    if addr.is_unspecified() {
        AddrClass::Unspecified
    } else if addr.is_loopback() {
        AddrClass::Loopback
    } else if addr.is_link_local() {
        AddrClass::LinkLocal
    } else if addr.is_private() {
        AddrClass::Private
    } else if CGNAT.contains(&addr) {
        AddrClass::Cgnat
    } else if addr.is_multicast() {
        AddrClass::Multicast
    } else if addr.is_broadcast() || IPV4_RESERVED.iter().any(|net| net.contains(&addr)) {
        AddrClass::Reserved
    } else {
        AddrClass::Public
    }
}

fn classify_v6(addr: Ipv6Addr) -> AddrClass {
    if addr.is_unspecified() {
        AddrClass::Unspecified
    } else if addr.is_loopback() {
        AddrClass::Loopback
    } else if IPV6_LINK_LOCAL.contains(&addr) {
        AddrClass::LinkLocal
    } else if IPV6_UNIQUE_LOCAL.contains(&addr) {
        AddrClass::Private
    } else if addr.is_multicast() {
        AddrClass::Multicast
    } else {
        AddrClass::Public
    }
}

/// Classify an IP address. IPv4-mapped IPv6 addresses are classified as
/// their embedded IPv4 address, so `::ffff:192.168.1.1` is still private.
pub fn classify(addr: IpAddr) -> AddrClass {
    match addr {
        IpAddr::V4(v4) => classify_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(mapped) => classify_v4(mapped),
            None => classify_v6(v6),
        },
    }
}

/// Classify an address string. Parse failure is blocked, never public.
pub fn classify_str(addr: &str) -> AddrClass {
    addr.parse().map_or(AddrClass::Reserved, classify)
}

/// Localhost variants: `localhost`, `localhost.localdomain`,
/// `localhost.<word>`, any `127.*` literal, `::1` (bracketed or not).
pub fn is_localhost_host(hostname: &str) -> bool {
    let host = hostname.to_ascii_lowercase();

    if matches!(
        host.as_str(),
        "localhost" | "localhost.localdomain" | "127.0.0.1" | "::1" | "[::1]"
    ) {
        return true;
    }
    if host.starts_with("127.") {
        return true;
    }
    host.strip_prefix("localhost.")
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_alphanumeric() || c == '_'))
}

/// Case-insensitive allowlist match. `*.domain` matches the bare domain and
/// any subdomain; an entry without the wildcard matches exactly.
pub fn matches_allowlist(hostname: &str, allowlist: &[String]) -> bool {
    let host = hostname.to_ascii_lowercase();

    allowlist.iter().any(|pattern| {
        let pattern = pattern.to_ascii_lowercase();
        match pattern.strip_prefix("*.") {
            Some(bare) => host == bare || host.ends_with(&pattern[1..]),
            None => host == pattern,
        }
    })
}

/// Outbound destination policy: allowlisted hosts plus a localhost escape
/// hatch for self-hosted backends.
///
/// Stateless beyond its configuration; safe to clone into every client.
#[derive(Debug, Clone)]
pub struct EgressPolicy {
    allowlist: Vec<String>,
    allow_localhost: bool,
}

impl EgressPolicy {
    pub fn new(allowlist: Vec<String>, allow_localhost: bool) -> Self {
        Self {
            allowlist,
            allow_localhost,
        }
    }

    pub fn allow_localhost(&self) -> bool {
        self.allow_localhost
    }

    /// Validate a destination URL. Resolves DNS on every call; a past
    /// verdict is never reused.
    ///
    /// # Errors
    ///
    /// [`SecurityError::UrlBlocked`] for unparseable URLs, localhost when
    /// the policy forbids it, and hostnames outside the allowlist.
    /// [`SecurityError::PrivateAddress`] when any resolved (or literal)
    /// address classifies as blocked.
    pub async fn validate(&self, raw_url: &str) -> Result<(), SecurityError> {
        let parsed = Url::parse(raw_url)
            .map_err(|_| SecurityError::blocked(raw_url, "invalid URL"))?;

        match parsed.host() {
            None => Err(SecurityError::blocked(raw_url, "invalid URL: no hostname")),
            Some(Host::Ipv4(ip)) => self.check_ip_literal(raw_url, IpAddr::V4(ip)),
            Some(Host::Ipv6(ip)) => self.check_ip_literal(raw_url, IpAddr::V6(ip)),
            Some(Host::Domain(domain)) => {
                let domain = domain.to_ascii_lowercase();
                self.check_domain(raw_url, &domain).await
            }
        }
    }

    /// IP-literal hosts skip DNS entirely.
    fn check_ip_literal(&self, raw_url: &str, addr: IpAddr) -> Result<(), SecurityError> {
        let class = classify(addr);

        if class == AddrClass::Loopback {
            return if self.allow_localhost {
                Ok(())
            } else {
                Err(SecurityError::blocked(raw_url, "localhost access not allowed"))
            };
        }

        if class.is_blocked() {
            tracing::debug!(%addr, ?class, "rejected private-range IP literal");
            return Err(SecurityError::PrivateAddress { addr });
        }

        // Public literal: still has to be allowlisted, same as a hostname.
        if matches_allowlist(&addr.to_string(), &self.allowlist) {
            Ok(())
        } else {
            Err(SecurityError::blocked(
                raw_url,
                format!("host '{addr}' not in allowlist"),
            ))
        }
    }

    async fn check_domain(&self, raw_url: &str, domain: &str) -> Result<(), SecurityError> {
        if is_localhost_host(domain) {
            return if self.allow_localhost {
                Ok(())
            } else {
                Err(SecurityError::blocked(raw_url, "localhost access not allowed"))
            };
        }

        if !matches_allowlist(domain, &self.allowlist) {
            return Err(SecurityError::blocked(
                raw_url,
                format!("host '{domain}' not in allowlist"),
            ));
        }

        let addrs = match lookup_host((domain, 0u16)).await {
            Ok(addrs) => addrs.map(|sock| sock.ip()).collect::<Vec<_>>(),
            Err(err) => {
                // Unresolvable allowlisted hostnames pass: nothing to
                // classify. Deliberate fail-open, flagged in DESIGN.md.
                tracing::warn!(domain, error = %err, "DNS resolution failed, passing allowlisted host");
                Vec::new()
            }
        };

        for addr in addrs {
            let class = classify(addr);
            if class.is_blocked() {
                tracing::debug!(domain, %addr, ?class, "allowlisted host resolved to blocked range");
                return Err(SecurityError::PrivateAddress { addr });
            }
        }

        Ok(())
    }
}
