//! Custom tracing layers

use tracing::{Subscriber, span};
use tracing_subscriber::{
    fmt::{
        self, MakeWriter,
        format::{Format, Json, JsonFields},
    },
    layer::{Context, Layer},
    registry::LookupSpan,
};

use crate::config::JsonlConfig;
use crate::context::{ReplicaContextData, ReplicaContextGuard};

/// Layer that attaches the active replica context to new spans
///
/// Formatters and later layers can read it back from the span's
/// extensions as a [`ReplicaContextExtension`].
pub struct ReplicaContextLayer;

impl ReplicaContextLayer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ReplicaContextLayer {
    fn default() -> Self {
        Self::new()
    }
}

/// Extension data stored on spans
#[derive(Debug, Clone)]
pub struct ReplicaContextExtension {
    pub data: ReplicaContextData,
}

impl<S> Layer<S> for ReplicaContextLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, _attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id)
            && let Some(data) = ReplicaContextGuard::current()
        {
            span.extensions_mut()
                .insert(ReplicaContextExtension { data });
        }
    }
}

/// Create a JSONL formatting layer writing to `writer`
pub fn jsonl_layer<S, W>(writer: W, config: &JsonlConfig) -> fmt::Layer<S, JsonFields, Format<Json>, W>
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(config.include_spans)
        .flatten_event(config.flatten_events)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_writer(writer)
}
