use serde_json::Value;

use crate::entry::Entry;
use crate::error::Result;
use crate::level::Level;
use crate::options::HandlerOptions;
use crate::sink::WriteSyncer;

use super::{Handler, HandlerCore, format_time};

/// Renders entries as one JSON object per line
///
/// ```text
/// {"time":"2024/06/11 10:00:00.000000","source":"src/main.rs:12","level":"info","message":"listening","fields":[{"port":8080}]}
/// ```
///
/// Key names come from [`JsonKeys`](crate::JsonKeys); keys are written in
/// the order shown.
#[derive(Debug)]
pub struct JsonHandler {
    core: HandlerCore,
}

impl JsonHandler {
    pub fn new(sink: impl WriteSyncer + 'static, options: HandlerOptions) -> Self {
        Self {
            core: HandlerCore::new(sink, options),
        }
    }

    pub fn options(&self) -> HandlerOptions {
        self.core.options().clone()
    }

    /// Replace the options; applies to the next entry
    pub fn set_options(&self, options: HandlerOptions) {
        self.core.set_options(options);
    }

    /// The line `handle` would write for `entry`, newline included
    pub fn format(&self, entry: &Entry) -> Result<String> {
        let options = self.core.options();
        let keys = &options.json;
        let fields = Value::Array(entry.fields.iter().map(|f| f.to_json()).collect());

        let members = [
            (&keys.time, Value::from(format_time(&entry.time, &options.time_layout))),
            (&keys.source, Value::from(entry.source_string())),
            (&keys.level, Value::from(entry.level.as_lower_str())),
            (&keys.message, Value::from(entry.message.as_str())),
            (&keys.fields, fields),
        ];

        let mut line = String::with_capacity(256);
        line.push('{');
        for (idx, (key, value)) in members.iter().enumerate() {
            if idx > 0 {
                line.push(',');
            }
            line.push_str(&serde_json::to_string(key)?);
            line.push(':');
            line.push_str(&serde_json::to_string(value)?);
        }
        line.push_str("}\n");
        Ok(line)
    }
}

impl Handler for JsonHandler {
    fn enabled(&self, level: Level) -> bool {
        self.core.enabled(level)
    }

    fn handle(&self, entry: &Entry) -> Result<()> {
        let line = self.format(entry)?;
        self.core.write(line.as_bytes())
    }

    fn sync(&self) -> Result<()> {
        self.core.sync()
    }

    fn close(&self) -> Result<()> {
        self.core.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Source;
    use crate::field::Field;
    use crate::options::JsonKeys;
    use crate::sink::MemorySink;
    use chrono::{Local, TimeZone};
    use serde_json::json;

    fn entry() -> Entry {
        let mut entry = Entry::new(Level::Error, "request \"failed\"")
            .with_time(Local.with_ymd_and_hms(2024, 6, 11, 10, 0, 0).unwrap())
            .with_source(Source {
                file: "src/api.rs",
                line: 40,
            });
        entry.push_fields([
            Field::int("status", 502),
            Field::nested("upstream", vec![Field::string("host", "db-1")]),
        ]);
        entry
    }

    #[test]
    fn test_json_line() {
        let handler = JsonHandler::new(MemorySink::new(), HandlerOptions::default());
        let line = handler.format(&entry()).unwrap();

        assert!(line.ends_with("}\n"));
        assert!(line.starts_with(r#"{"time":"2024/06/11 10:00:00.000000","source":"src/api.rs:40""#));

        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(
            parsed,
            json!({
                "time": "2024/06/11 10:00:00.000000",
                "source": "src/api.rs:40",
                "level": "error",
                "message": "request \"failed\"",
                "fields": [{"status": 502}, {"upstream": {"host": "db-1"}}]
            })
        );
    }

    #[test]
    fn test_renamed_keys() {
        let keys = JsonKeys {
            time: "ts".into(),
            source: "caller".into(),
            level: "lvl".into(),
            message: "msg".into(),
            fields: "data".into(),
        };
        let handler = JsonHandler::new(
            MemorySink::new(),
            HandlerOptions::default().with_json_keys(keys),
        );

        let parsed: Value = serde_json::from_str(&handler.format(&entry()).unwrap()).unwrap();
        assert_eq!(parsed["lvl"], "error");
        assert_eq!(parsed["caller"], "src/api.rs:40");
        assert_eq!(parsed["msg"], "request \"failed\"");
        assert!(parsed["data"].is_array());
        assert!(parsed.get("level").is_none());
    }

    #[test]
    fn test_handle_writes_one_line_per_entry() {
        let sink = MemorySink::new();
        let handler = JsonHandler::new(sink.clone(), HandlerOptions::default());

        handler.handle(&entry()).unwrap();
        handler.handle(&Entry::new(Level::Info, "second")).unwrap();

        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        let second: Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(second["source"], "!unknownFile:0");
        assert_eq!(second["fields"], json!([]));
    }
}
