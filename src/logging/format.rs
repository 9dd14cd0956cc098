//! One-line JSON event format for process diagnostics.
//!
//! ```json
//! {"ts":"2024-12-28T15:04:05.123Z","level":"info","type":"app","msg":"Server started","ctx":{"service":"careminate"},"data":{}}
//! ```

use serde_json::{Map, Value};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Custom JSON formatter for tracing.
pub struct JsonFormatter {
    service_name: String,
}

impl JsonFormatter {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }
}

impl<S, N> FormatEvent<S, N> for JsonFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let entry = build_entry(
            &iso8601_now(),
            *meta.level(),
            meta.target(),
            &self.service_name,
            visitor,
        );

        writeln!(writer, "{}", serde_json::to_string(&entry).unwrap_or_default())
    }
}

fn build_entry(ts: &str, level: Level, target: &str, service: &str, visitor: FieldVisitor) -> Value {
    let level_name = match level {
        Level::TRACE | Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        Level::ERROR => "error",
    };

    let log_type = if target == "access" {
        "access"
    } else if level == Level::ERROR {
        "error"
    } else {
        "app"
    };

    let mut data = visitor.fields;

    // Access lines summarise as "METHOD /path STATUS"
    let msg = if log_type == "access" {
        let method = data.get("method").and_then(Value::as_str).unwrap_or("?");
        let path = data.get("path").and_then(Value::as_str).unwrap_or("?");
        let status = data.get("status").and_then(Value::as_u64).unwrap_or(0);
        format!("{} {} {}", method, path, status)
    } else {
        visitor.message.unwrap_or_default()
    };

    let mut ctx = Map::new();
    ctx.insert("service".into(), Value::from(service));
    if let Some(request_id) = data.remove("request_id") {
        ctx.insert("request_id".into(), request_id);
    }

    serde_json::json!({
        "ts": ts,
        "level": level_name,
        "type": log_type,
        "msg": msg,
        "ctx": ctx,
        "data": data,
    })
}

fn iso8601_now() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

/// Field visitor for collecting tracing fields.
#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value).trim_matches('"').to_string());
        } else {
            self.fields.insert(
                field.name().to_string(),
                Value::String(format!("{:?}", value)),
            );
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields
                .insert(field.name().to_string(), Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }
}
