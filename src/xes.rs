//! In-memory XES event log and its XML serialization.

use crate::demo::is_gzip;
use crate::time::{format_timestamp, Timestamp};
use anyhow::{Context, Result};
use flate2::{write::GzEncoder, Compression};
use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub const CONCEPT_NAME: &str = "concept:name";
pub const TIMESTAMP: &str = "time:timestamp";
pub const END_TIMESTAMP: &str = "time:end_timestamp";
pub const ROLE: &str = "org:role";
pub const RESOURCE: &str = "org:resource";

const XES_NAMESPACE: &str = "http://www.xes-standard.org/";
const EXTENSIONS: &[(&str, &str, &str)] = &[
    ("Concept", "concept", "http://www.xes-standard.org/concept.xesext"),
    ("Time", "time", "http://www.xes-standard.org/time.xesext"),
    ("Organizational", "org", "http://www.xes-standard.org/org.xesext"),
];

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Date(Timestamp),
    Boolean(bool),
}

impl Value {
    fn element(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Int(_) => "int",
            Value::Date(_) => "date",
            Value::Boolean(_) => "boolean",
        }
    }

    fn render(&self) -> Cow<'_, str> {
        match self {
            Value::String(s) => Cow::Borrowed(s.as_str()),
            Value::Int(i) => Cow::Owned(i.to_string()),
            Value::Date(t) => Cow::Owned(format_timestamp(*t)),
            Value::Boolean(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub key: String,
    pub value: Value,
}

/// Ordered attribute list; order is preserved in the output.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Attributes(Vec<Attribute>);

impl Attributes {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|a| a.key == key).map(|a| &a.value)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Replaces the value of an existing key in place, or appends it.
    pub fn set(&mut self, key: &str, value: Value) {
        match self.0.iter_mut().find(|a| a.key == key) {
            Some(attribute) => attribute.value = value,
            None => self.0.push(Attribute {
                key: key.to_owned(),
                value,
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.0.iter()
    }

    pub fn string(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, Value::String(value.into()));
        self
    }

    pub fn int(mut self, key: &str, value: i64) -> Self {
        self.set(key, Value::Int(value));
        self
    }

    pub fn date(mut self, key: &str, value: Timestamp) -> Self {
        self.set(key, Value::Date(value));
        self
    }

    pub fn boolean(mut self, key: &str, value: bool) -> Self {
        self.set(key, Value::Boolean(value));
        self
    }

    pub fn opt_string(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.string(key, value),
            None => self,
        }
    }

    pub fn opt_boolean(self, key: &str, value: Option<bool>) -> Self {
        match value {
            Some(value) => self.boolean(key, value),
            None => self,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Event {
    pub attributes: Attributes,
}

impl Event {
    pub fn new(activity: impl Into<String>, time: Timestamp) -> Event {
        Event {
            attributes: Attributes::default()
                .string(CONCEPT_NAME, activity)
                .date(TIMESTAMP, time),
        }
    }

    pub fn with(self, f: impl FnOnce(Attributes) -> Attributes) -> Event {
        Event {
            attributes: f(self.attributes),
        }
    }

    pub fn activity(&self) -> Option<&str> {
        self.attributes.get_str(CONCEPT_NAME)
    }

    pub fn role(&self) -> Option<&str> {
        self.attributes.get_str(ROLE)
    }

    pub fn timestamp(&self) -> Option<Timestamp> {
        match self.attributes.get(TIMESTAMP) {
            Some(Value::Date(t)) => Some(*t),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Trace {
    pub attributes: Attributes,
    pub events: Vec<Event>,
}

impl Trace {
    pub fn name(&self) -> Option<&str> {
        self.attributes.get_str(CONCEPT_NAME)
    }

    /// Stable sort by timestamp: events at the same instant keep their relative order.
    pub fn sort_events(&mut self) {
        self.events.sort_by_key(Event::timestamp);
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Log {
    pub attributes: Attributes,
    pub traces: Vec<Trace>,
}

impl Log {
    pub fn event_count(&self) -> usize {
        self.traces.iter().map(|t| t.events.len()).sum()
    }
}

pub fn write_xes<W: Write>(w: &mut W, log: &Log) -> io::Result<()> {
    writeln!(w, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        w,
        r#"<log xes.version="1.0" xes.features="" openxes.version="1.0RC7" xmlns="{}">"#,
        XES_NAMESPACE
    )?;
    for (name, prefix, uri) in EXTENSIONS {
        writeln!(
            w,
            r#"  <extension name="{}" prefix="{}" uri="{}"/>"#,
            name, prefix, uri
        )?;
    }
    write_attributes(w, &log.attributes, 1)?;
    for trace in &log.traces {
        writeln!(w, "  <trace>")?;
        write_attributes(w, &trace.attributes, 2)?;
        for event in &trace.events {
            writeln!(w, "    <event>")?;
            write_attributes(w, &event.attributes, 3)?;
            writeln!(w, "    </event>")?;
        }
        writeln!(w, "  </trace>")?;
    }
    writeln!(w, "</log>")
}

fn write_attributes<W: Write>(w: &mut W, attributes: &Attributes, depth: usize) -> io::Result<()> {
    for attribute in attributes.iter() {
        writeln!(
            w,
            r#"{:indent$}<{} key="{}" value="{}"/>"#,
            "",
            attribute.value.element(),
            escape(&attribute.key),
            escape(&attribute.value.render()),
            indent = depth * 2
        )?;
    }
    Ok(())
}

pub fn write_log(path: &Path, log: &Log) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    if is_gzip(path) {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        write_xes(&mut encoder, log)?;
        encoder.finish()?.flush()?;
    } else {
        write_xes(&mut writer, log)?;
        writer.flush()?;
    }
    Ok(())
}

/// Escapes markup for an attribute value. Control characters XML 1.0 cannot carry are dropped;
/// tab and line breaks become character references so attribute normalization keeps them.
fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(|c: char| c.is_control() || matches!(c, '&' | '<' | '>' | '"' | '\'')) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\t' => escaped.push_str("&#9;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            c if c.is_ascii_control() => {}
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
pub fn render(log: &Log) -> String {
    let mut buf = Vec::new();
    write_xes(&mut buf, log).unwrap();
    String::from_utf8(buf).unwrap()
}
