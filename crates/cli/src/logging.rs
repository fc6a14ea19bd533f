//! Subscriber setup.

use clmm_keeper_protocols::rpc::is_rate_limit_message;
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Metadata};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::{Context, Filter, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, fmt as fmt_layer};

/// Drops warnings and errors whose message or `error` field reports HTTP 429,
/// which public RPC endpoints emit in bursts while the pool rotates.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateLimitFilter;

impl<S> Filter<S> for RateLimitFilter {
    fn enabled(&self, _meta: &Metadata<'_>, _cx: &Context<'_, S>) -> bool {
        true
    }

    fn event_enabled(&self, event: &Event<'_>, _cx: &Context<'_, S>) -> bool {
        if !matches!(*event.metadata().level(), Level::WARN | Level::ERROR) {
            return true;
        }
        let mut visitor = RateLimitVisitor::default();
        event.record(&mut visitor);
        !visitor.matched
    }
}

#[derive(Default)]
struct RateLimitVisitor {
    matched: bool,
}

impl Visit for RateLimitVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if is_checked(field) {
            self.matched |= is_rate_limit_message(value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if !self.matched && is_checked(field) {
            self.matched = is_rate_limit_message(&format!("{value:?}"));
        }
    }
}

fn is_checked(field: &Field) -> bool {
    matches!(field.name(), "message" | "error")
}

/// Installs the fmt layer with `RUST_LOG` filtering (default `info`) and
/// rate-limit suppression.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer::layer().with_target(false).with_filter(RateLimitFilter))
        .init();
}
