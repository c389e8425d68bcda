//! Distributed-trace header injection for first-party resources.
//!
//! The decision is taken producer-side, before the request leaves, and the resulting
//! `TraceContext` rides on `Command::StartResource` so the resource event can be linked
//! to the backend trace.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::config::RumConfig;
use super::id::IdGenerator;
use super::sampler::Sampler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceContextInjection {
    /// Headers on every first-party request, carrying the sampling decision.
    All,
    /// Headers only on sampled requests.
    Sampled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum B3Encoding {
    /// One `b3` header.
    Single,
    /// `X-B3-TraceId`, `X-B3-SpanId`, `X-B3-Sampled`.
    Multiple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    pub trace_id: u128,
    pub span_id: u64,
    pub sampled: bool,
}

impl TraceContext {
    pub fn headers(&self, encoding: B3Encoding) -> Vec<(String, String)> {
        let trace_id = format!("{:032x}", self.trace_id);
        let span_id = format!("{:016x}", self.span_id);
        let sampled = if self.sampled { "1" } else { "0" };
        match encoding {
            B3Encoding::Single => vec![("b3".to_string(), format!("{trace_id}-{span_id}-{sampled}"))],
            B3Encoding::Multiple => vec![
                ("X-B3-TraceId".to_string(), trace_id),
                ("X-B3-SpanId".to_string(), span_id),
                ("X-B3-Sampled".to_string(), sampled.to_string()),
            ],
        }
    }
}

pub struct TraceInjector {
    first_party_hosts: Vec<String>,
    sample_rate: f32,
    injection: TraceContextInjection,
    encoding: B3Encoding,
    sampler: Arc<dyn Sampler>,
    ids: Arc<dyn IdGenerator>,
}

impl TraceInjector {
    pub fn new(config: &RumConfig, sampler: Arc<dyn Sampler>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            first_party_hosts: config
                .first_party_hosts
                .iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
            sample_rate: config.trace_sample_rate,
            injection: config.trace_context_injection,
            encoding: config.b3_encoding,
            sampler,
            ids,
        }
    }

    pub fn is_first_party(&self, url: &str) -> bool {
        let Some(host) = host_of(url) else {
            return false;
        };
        self.first_party_hosts
            .iter()
            .any(|fp| host == *fp || host.ends_with(&format!(".{fp}")))
    }

    /// Returns the context to report plus the headers to put on the request.
    /// `None` means the request must go out untouched.
    pub fn inject(&self, url: &str) -> Option<(TraceContext, Vec<(String, String)>)> {
        if !self.is_first_party(url) {
            return None;
        }
        let sampled = self.sampler.sample(self.sample_rate);
        if !sampled && self.injection == TraceContextInjection::Sampled {
            return None;
        }
        let context = TraceContext {
            trace_id: self.ids.next_id().as_u128(),
            span_id: self.ids.next_id().as_u64_pair().1,
            sampled,
        };
        Some((context, context.headers(self.encoding)))
    }
}

fn host_of(url: &str) -> Option<String> {
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    let authority = rest.split(['/', '?', '#']).next()?;
    let host_port = authority.rsplit('@').next()?;
    let host = match host_port.strip_prefix('[') {
        // IPv6 literal: `[::1]:8080`
        Some(bracketed) => bracketed.split(']').next()?,
        None => host_port.split(':').next()?,
    };
    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::id::SequentialIdGenerator;
    use crate::kernel::sampler::FixedSampler;

    fn injector(sampled: bool, injection: TraceContextInjection, encoding: B3Encoding) -> TraceInjector {
        let mut config = RumConfig::new("app");
        config.first_party_hosts = vec!["example.com".into()];
        config.trace_context_injection = injection;
        config.b3_encoding = encoding;
        TraceInjector::new(&config, Arc::new(FixedSampler(sampled)), Arc::new(SequentialIdGenerator::new()))
    }

    #[test]
    fn matches_host_and_subdomains_only() {
        let inj = injector(true, TraceContextInjection::All, B3Encoding::Single);
        assert!(inj.is_first_party("https://example.com/a"));
        assert!(inj.is_first_party("https://api.Example.com:8443/a?b=c"));
        assert!(!inj.is_first_party("https://notexample.com/"));
        assert!(!inj.is_first_party("https://example.com.evil.org/"));
    }

    #[test]
    fn ipv6_literal_hosts_keep_their_address() {
        assert_eq!(host_of("http://[::1]:8080/health").as_deref(), Some("::1"));
        assert_eq!(host_of("https://[2001:DB8::2]/a").as_deref(), Some("2001:db8::2"));
        assert_eq!(host_of("https://user@example.com:443/").as_deref(), Some("example.com"));

        let mut config = RumConfig::new("app");
        config.first_party_hosts = vec!["::1".into()];
        let local = TraceInjector::new(&config, Arc::new(FixedSampler::always()), Arc::new(SequentialIdGenerator::new()));
        assert!(local.is_first_party("http://[::1]:8080/health"));
        assert!(!local.is_first_party("http://[::2]:8080/health"));
    }

    #[test]
    fn third_party_requests_are_untouched() {
        let inj = injector(true, TraceContextInjection::All, B3Encoding::Single);
        assert!(inj.inject("https://cdn.other.net/lib.js").is_none());
    }

    #[test]
    fn single_header_format() {
        let inj = injector(true, TraceContextInjection::Sampled, B3Encoding::Single);
        let (ctx, headers) = inj.inject("https://example.com/").unwrap();
        assert!(ctx.sampled);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].0, "b3");
        assert_eq!(headers[0].1, "00000000000000000000000000000001-0000000000000002-1");
    }

    #[test]
    fn unsampled_requests_depend_on_injection_policy() {
        let sampled_only = injector(false, TraceContextInjection::Sampled, B3Encoding::Multiple);
        assert!(sampled_only.inject("https://example.com/").is_none());

        let all = injector(false, TraceContextInjection::All, B3Encoding::Multiple);
        let (ctx, headers) = all.inject("https://example.com/").unwrap();
        assert!(!ctx.sampled);
        assert_eq!(headers[2], ("X-B3-Sampled".to_string(), "0".to_string()));
    }
}
