use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::{format_description::FormatItem, macros::format_description, OffsetDateTime};
use tracing::{Level, Subscriber};
use tracing_subscriber::{
    fmt::{format::Writer, FmtContext, FormatEvent, FormatFields},
    registry::LookupSpan,
};

const GENERATION_TARGET: &str = "reelscopy_rs::generation_log";
const PREVIEW_CHAR_LIMIT: usize = 160;
const TARGET_GUTTER_WIDTH: usize = 28;
const TIMESTAMP_FORMAT: &[FormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Summary of one round trip to the generation backend, rendered as a box
/// under the log line when DEBUG is enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub provider: String,
    pub model: String,
    pub subject: String,
    pub keyword: String,
    pub prompt_chars: usize,
    pub elapsed_ms: u64,
    pub outcome: GenerationOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum GenerationOutcome {
    Text(String),
    Fallback,
    Failed(String),
}

impl GenerationRecord {
    pub fn render_pretty(&self, use_color: bool) -> String {
        let mut lines = Vec::new();
        lines.push(format!(
            "┌─ Generation ({} / {}, {} ms)",
            self.provider, self.model, self.elapsed_ms
        ));
        push_body_line(
            &mut lines,
            format!("SUBJECT : {}", preview_value(&self.subject, use_color)),
        );
        push_body_line(
            &mut lines,
            format!("KEYWORD : {}", preview_value(&self.keyword, use_color)),
        );
        push_body_line(&mut lines, format!("PROMPT  : {} chars", self.prompt_chars));

        let outcome = match &self.outcome {
            GenerationOutcome::Text(text) => {
                format!("OUT     : {}", preview_value(text, use_color))
            }
            GenerationOutcome::Fallback => {
                let label = "empty response, using fallback text";
                format!("OUT     : {}", stylize(label, use_color, OutcomeStyle::Warn))
            }
            GenerationOutcome::Failed(reason) => {
                let reason = escape_fragment(reason);
                format!("ERROR   : {}", stylize(&reason, use_color, OutcomeStyle::Error))
            }
        };
        push_body_line(&mut lines, outcome);
        lines.push("└─".to_string());

        lines.join("\n")
    }
}

#[derive(Debug, Clone, Copy)]
enum OutcomeStyle {
    Warn,
    Error,
}

fn stylize(fragment: &str, use_color: bool, style: OutcomeStyle) -> String {
    if !use_color {
        return fragment.to_string();
    }

    match style {
        OutcomeStyle::Warn => fragment.yellow().to_string(),
        OutcomeStyle::Error => fragment.red().to_string(),
    }
}

fn escape_fragment(value: &str) -> String {
    let mut rendered = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\n' => rendered.push('⏎'),
            '\t' => rendered.push('⇥'),
            '\r' => rendered.push('␍'),
            c if c.is_control() => rendered.push_str(&format!("\\u{{{:04X}}}", c as u32)),
            c => rendered.push(c),
        }
    }
    rendered
}

fn push_body_line(lines: &mut Vec<String>, content: String) {
    lines.push(format!("│ {}", content));
}

fn preview_value(value: &str, use_color: bool) -> String {
    let mut preview: String = value.chars().take(PREVIEW_CHAR_LIMIT).collect();
    if value.chars().count() > PREVIEW_CHAR_LIMIT {
        preview.push_str("...");
    }
    let escaped = escape_fragment(&preview);
    if use_color {
        escaped.cyan().to_string()
    } else {
        escaped
    }
}

#[derive(Debug, Default)]
struct GenerationEventVisitor {
    record_json: Option<String>,
}

impl tracing::field::Visit for GenerationEventVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "generation_json" {
            self.record_json = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "generation_json" && self.record_json.is_none() {
            self.record_json = Some(format!("{value:?}"));
        }
    }
}

/// Compact single-line event format with a coloured level and a fixed-width
/// target gutter; generation records get their box appended.
#[derive(Default)]
pub struct CaptionLogFormatter;

impl CaptionLogFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl<S, N> FormatEvent<S, N> for CaptionLogFormatter
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        let use_color = writer.has_ansi_escapes();

        write_prefix(&mut writer, metadata, use_color)?;
        ctx.format_fields(writer.by_ref(), event)?;
        writer.write_char('\n')?;

        if metadata.target() == GENERATION_TARGET {
            let mut visitor = GenerationEventVisitor::default();
            event.record(&mut visitor);
            if let Some(json) = visitor.record_json {
                match serde_json::from_str::<GenerationRecord>(&json) {
                    Ok(record) => {
                        writer.write_str(&record.render_pretty(use_color))?;
                        writer.write_char('\n')?;
                    }
                    Err(err) => {
                        writer.write_str("│ Failed to render generation record: ")?;
                        writer.write_str(&err.to_string())?;
                        writer.write_char('\n')?;
                    }
                }
            }
        }

        Ok(())
    }
}

pub fn record_generation(record: &GenerationRecord) {
    if !tracing::level_enabled!(tracing::Level::DEBUG) {
        return;
    }
    if let Ok(json) = serde_json::to_string(record) {
        tracing::event!(
            target: GENERATION_TARGET,
            tracing::Level::DEBUG,
            generation_json = json.as_str(),
            elapsed_ms = record.elapsed_ms,
            "caption generation"
        );
    } else {
        tracing::event!(
            target: GENERATION_TARGET,
            tracing::Level::DEBUG,
            "caption generation (serialization failure)"
        );
    }
}

fn write_prefix(
    writer: &mut Writer<'_>,
    metadata: &tracing::Metadata<'_>,
    use_color: bool,
) -> fmt::Result {
    let timestamp_plain = format_timestamp();
    let timestamp_display = if use_color {
        timestamp_plain.as_str().dimmed().to_string()
    } else {
        timestamp_plain
    };
    writer.write_str(&timestamp_display)?;

    let level_plain = format!("{:>5}", metadata.level());
    let level_has_leading_space = level_plain.starts_with(' ');
    let level_display = if use_color {
        color_level(&level_plain, *metadata.level())
    } else {
        level_plain.clone()
    };
    if level_has_leading_space {
        writer.write_str(&level_display)?;
    } else {
        writer.write_char(' ')?;
        writer.write_str(&level_display)?;
    }
    writer.write_char(' ')?;

    let target_text = format!("{:<width$}", metadata.target(), width = TARGET_GUTTER_WIDTH);
    let target_text = if use_color {
        target_text.blue().dimmed().to_string()
    } else {
        target_text
    };
    writer.write_str(&target_text)?;
    writer.write_str(": ")?;

    Ok(())
}

fn color_level(text: &str, level: Level) -> String {
    match level {
        Level::ERROR => text.red().bold().to_string(),
        Level::WARN => text.yellow().bold().to_string(),
        Level::INFO => text.green().to_string(),
        Level::DEBUG => text.cyan().to_string(),
        Level::TRACE => text.dimmed().to_string(),
    }
}

fn format_timestamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(&TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| "0000-00-00 00:00:00".to_string())
}
