//! Logging and span export for the gate.
//!
//! A fmt layer is always installed, either human-readable or JSON lines.
//! When [`SpanExport`] is configured, gate run spans are also fed to an
//! OpenTelemetry tracer provider.

use gate_config::TelemetryConfig;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_sdk::trace::{Config, RandomIdGenerator, Sampler, TracerProvider};
use opentelemetry_sdk::Resource;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Output format of the fmt layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines with file and thread
    #[default]
    Plain,
    /// One JSON object per event, with the current span
    Json,
}

/// OpenTelemetry span export settings
#[derive(Debug, Clone, PartialEq)]
pub struct SpanExport {
    /// Collector endpoint, recorded on the resource
    pub endpoint: Option<String>,
    /// Share of gate runs sampled, 0.0 - 1.0
    pub sampling_rate: f64,
}

impl SpanExport {
    fn sampler(&self) -> Sampler {
        match self.sampling_rate {
            r if r >= 1.0 => Sampler::AlwaysOn,
            r if r <= 0.0 => Sampler::AlwaysOff,
            r => Sampler::TraceIdRatioBased(r),
        }
    }
}

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// `service.name` resource attribute and tracer name
    pub service_name: String,
    /// Crate version reported on the resource
    pub service_version: String,
    /// `deployment.environment` resource attribute
    pub environment: String,
    /// Filter directive used when `RUST_LOG` is unset
    pub filter: String,
    /// fmt layer output
    pub format: LogFormat,
    /// Span export, off when `None`
    pub export: Option<SpanExport>,
    /// Extra resource attributes, in insertion order
    pub resource_attributes: Vec<(String, String)>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::for_service("prompt-gate")
    }
}

impl TracingConfig {
    /// Plain-text logging at `info` for `service_name`, no span export
    #[must_use]
    pub fn for_service(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
            filter: "info".to_string(),
            format: LogFormat::Plain,
            export: None,
            resource_attributes: Vec::new(),
        }
    }

    /// Deployment environment
    #[must_use]
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Fallback filter directive, e.g. `info,gate_agents=debug`
    #[must_use]
    pub fn filter(mut self, directive: impl Into<String>) -> Self {
        self.filter = directive.into();
        self
    }

    /// fmt layer output format
    #[must_use]
    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Export spans, sampling the given share of runs
    #[must_use]
    pub fn export_spans(mut self, endpoint: Option<String>, sampling_rate: f64) -> Self {
        self.export = Some(SpanExport {
            endpoint,
            sampling_rate: sampling_rate.clamp(0.0, 1.0),
        });
        self
    }

    /// Extra resource attribute
    #[must_use]
    pub fn resource_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.resource_attributes.push((key.into(), value.into()));
        self
    }

    fn resource(&self, export: &SpanExport) -> Resource {
        let mut attributes = vec![
            KeyValue::new("service.name", self.service_name.clone()),
            KeyValue::new("service.version", self.service_version.clone()),
            KeyValue::new("deployment.environment", self.environment.clone()),
        ];
        if let Some(endpoint) = &export.endpoint {
            attributes.push(KeyValue::new("otlp.endpoint", endpoint.clone()));
        }
        attributes.extend(
            self.resource_attributes
                .iter()
                .map(|(k, v)| KeyValue::new(k.clone(), v.clone())),
        );
        Resource::new(attributes)
    }

    fn tracer_provider(&self) -> Option<TracerProvider> {
        let export = self.export.as_ref()?;
        let config = Config::default()
            .with_sampler(export.sampler())
            .with_id_generator(RandomIdGenerator::default())
            .with_resource(self.resource(export));
        Some(TracerProvider::builder().with_config(config).build())
    }
}

impl From<&TelemetryConfig> for TracingConfig {
    fn from(telemetry: &TelemetryConfig) -> Self {
        let format = if telemetry.json_logs {
            LogFormat::Json
        } else {
            LogFormat::Plain
        };
        let config = Self::for_service(telemetry.service_name.clone())
            .environment(telemetry.environment.clone())
            .filter(telemetry.log_level.clone())
            .format(format);

        // A collector endpoint is what turns export on.
        match &telemetry.otlp_endpoint {
            Some(endpoint) => config.export_spans(Some(endpoint.clone()), telemetry.sampling_rate),
            None => config,
        }
    }
}

/// Install the global subscriber.
///
/// Returns the tracer provider when span export is on; pass it to
/// [`shutdown_tracing`] before exit so buffered spans are flushed.
///
/// # Errors
/// Fails if the filter directive is invalid or a global subscriber is
/// already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<Option<TracerProvider>, TracingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter).map_err(|e| TracingError::Filter(e.to_string()))?,
    };

    let fmt_layer = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .boxed(),
        LogFormat::Plain => fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
    };

    let provider = config.tracer_provider();
    let otel_layer = provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer(config.service_name.clone()))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(otel_layer)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TracingError::Init(e.to_string()))?;

    info!(
        service = %config.service_name,
        environment = %config.environment,
        format = ?config.format,
        span_export = config.export.is_some(),
        "Tracing initialized"
    );

    Ok(provider)
}

/// Flush exported spans and drop the provider
pub fn shutdown_tracing(provider: Option<TracerProvider>) {
    let Some(provider) = provider else {
        return;
    };
    for result in provider.force_flush() {
        if let Err(e) = result {
            warn!(error = %e, "Failed to flush spans");
        }
    }
    drop(provider);
    info!("Tracing shutdown complete");
}

/// Tracing initialization error
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    /// A global subscriber is already installed
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
    /// The filter directive could not be parsed
    #[error("Invalid log filter: {0}")]
    Filter(String),
}
