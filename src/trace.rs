//! Pipeline instrumentation that compiles away without the `tracing` feature.
//!
//! Stages open an info span through `trace_span!`. Stage totals go out at
//! info level via `trace_event!`; per-class NMS counts are noisier and use
//! `trace_debug!`. Disabled builds still evaluate field values, so call sites
//! carry no `cfg` and no unused-variable warnings.

/// Opens an info-level span named after a pipeline stage.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($stage:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($stage $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($stage:expr $(, $($field:tt)*)?) => {
        $crate::trace::DisabledSpan
    };
}

/// Emits a stage-level count at info level.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($stage:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(name: $stage, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($stage:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
}

/// Emits a per-class count at debug level.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($stage:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::debug!(name: $stage, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($stage:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
}

pub(crate) use trace_debug;
pub(crate) use trace_event;
pub(crate) use trace_span;

/// Span guard returned by `trace_span!` when tracing is compiled out.
#[cfg(not(feature = "tracing"))]
pub struct DisabledSpan;

#[cfg(not(feature = "tracing"))]
impl DisabledSpan {
    /// Same shape as `tracing::Span::entered`, so call sites are identical.
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
