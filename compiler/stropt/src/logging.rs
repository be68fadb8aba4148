//! Diagnostic logging.
//!
//! Off unless `STROPT_LOG` or `RUST_LOG` holds a filter, e.g.
//! `STROPT_LOG=stropt_layout=trace`. Output is an indented span tree on
//! stderr, so it never mixes with the report on stdout.

use std::sync::Once;

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;
use tracing_tree::HierarchicalLayer;

static TRACING_INIT: Once = Once::new();

/// Checked first for the log filter; `RUST_LOG` is the fallback.
pub const LOG_ENV: &str = "STROPT_LOG";

/// Install the global subscriber. Calling this more than once is harmless.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let own = std::env::var(LOG_ENV).ok();
        let Some(directives) = select_filter(own, std::env::var("RUST_LOG").ok()) else {
            return;
        };

        let filter = EnvFilter::try_new(&directives).unwrap_or_else(|err| {
            eprintln!("warning: ignoring invalid log filter `{directives}`: {err}");
            EnvFilter::new("warn")
        });

        tracing_subscriber::registry()
            .with(filter)
            .with(
                HierarchicalLayer::new(2)
                    .with_targets(true)
                    .with_bracketed_fields(true),
            )
            .init();
    });
}

/// The first non-blank filter among `STROPT_LOG` and `RUST_LOG`.
fn select_filter(stropt: Option<String>, rust: Option<String>) -> Option<String> {
    stropt
        .into_iter()
        .chain(rust)
        .find(|directives| !directives.trim().is_empty())
}
