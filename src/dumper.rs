//! The [`Dumper`] context: configuration, theme, sink and capabilities in one
//! explicitly constructed object.
//!
//! Every public entry point runs to completion and writes its output to the
//! sink in one piece. Output problems are logged, never returned: a debug call
//! must not take down the program it instruments.

use crate::backtrace::{self, Frame};
use crate::encoding::Encoding;
use crate::error::Result;
use crate::formatter::ValueFormatter;
use crate::hex;
use crate::introspect::{Introspector, MethodsSubject, MethodsView};
use crate::label::{CallSite, FileSourceReader, LabelResolver, SourceReader};
use crate::palette;
use crate::session::Session;
use crate::sink::{MemoryBuffer, Sink};
use crate::value::{Inspect, Value};
use par_dump_config::{ConfigLoader, ConfigStore, Settings, ThemeResolver};
use parking_lot::Mutex;

pub struct Dumper {
    store: ConfigStore,
    settings: Settings,
    sink: Sink,
    source: Box<dyn SourceReader>,
    introspector: Option<Box<dyn Introspector>>,
    /// File of the last filename banner.
    last_file: Mutex<Option<String>>,
}

impl Dumper {
    /// Validate `store` and open the sink it configures.
    pub fn open(store: ConfigStore) -> Result<Self> {
        let settings = Settings::from_store(&store)?;
        let sink = Sink::open(&settings)?;
        Ok(Self::assemble(store, settings, sink))
    }

    /// Load configuration with `loader`, then [`Dumper::open`].
    pub fn load(loader: &ConfigLoader) -> Result<Self> {
        Self::open(loader.load()?)
    }

    /// Dumper writing into memory; returns the buffer alongside.
    pub fn in_memory(store: ConfigStore) -> Result<(Self, MemoryBuffer)> {
        let settings = Settings::from_store(&store)?;
        let (sink, buffer) = Sink::memory(&settings)?;
        Ok((Self::assemble(store, settings, sink), buffer))
    }

    fn assemble(store: ConfigStore, settings: Settings, sink: Sink) -> Self {
        Self {
            store,
            settings,
            sink,
            source: Box::new(FileSourceReader::new()),
            introspector: None,
            last_file: Mutex::new(None),
        }
    }

    /// Replace the reader used for label inference and method sources.
    pub fn with_source_reader(mut self, source: impl SourceReader + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    pub fn with_introspector(mut self, introspector: impl Introspector + 'static) -> Self {
        self.introspector = Some(Box::new(introspector));
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn theme(&self) -> ThemeResolver<'_> {
        ThemeResolver::new(&self.store, self.settings.use_colors)
    }

    fn labels(&self) -> LabelResolver<'_> {
        LabelResolver::new(&self.settings, self.theme(), self.source.as_ref())
    }

    fn formatter(&self) -> ValueFormatter<'_> {
        ValueFormatter::new(&self.settings, self.theme(), self.labels())
    }

    /// Start a session; the footer is written when the guard drops.
    pub fn session(&self) -> Session<'_> {
        Session::begin(self)
    }

    /// Dump `value` with an inferred label and the configured depth.
    ///
    /// Returns `value` so the call can wrap an expression.
    #[track_caller]
    pub fn dump<T: Inspect>(&self, value: T) -> T {
        let call_site = CallSite::caller();
        self.dump_at(&value.inspect(), None, None, &call_site);
        value
    }

    /// Dump with an explicit label and/or depth.
    #[track_caller]
    pub fn dump_with<T: Inspect>(&self, value: T, label: Option<&str>, max_depth: Option<usize>) -> T {
        let call_site = CallSite::caller();
        self.dump_at(&value.inspect(), label, max_depth, &call_site);
        value
    }

    /// Dump an already inspected value as if called from `call_site`.
    pub fn dump_at(
        &self,
        value: &Value,
        label: Option<&str>,
        max_depth: Option<usize>,
        call_site: &CallSite,
    ) {
        self.banner(call_site);
        let text = self.render(value, label, max_depth, call_site);
        self.emit(&text);
    }

    /// `<label> = <value><eol>`, as [`Dumper::dump_at`] would write it.
    pub fn render(
        &self,
        value: &Value,
        label: Option<&str>,
        max_depth: Option<usize>,
        call_site: &CallSite,
    ) -> String {
        let label = self.labels().resolve(label, call_site);
        let body = self.formatter().format(value, 0, max_depth);
        format!("{label} = {body}{}", self.settings.eol())
    }

    /// Write raw text plus a line ending.
    ///
    /// `encoding` names the encoding of `text`; it is detected when absent or
    /// unrecognized. Line endings are normalized to the configured style.
    pub fn write(&self, text: impl AsRef<[u8]>, encoding: Option<&str>) {
        let source = encoding.and_then(|label| {
            let parsed = Encoding::from_label(label);
            if parsed.is_none() {
                log::warn!("Unknown encoding `{label}`, detecting instead");
            }
            parsed
        });
        let mut bytes = text.as_ref().to_vec();
        bytes.push(b'\n');
        if let Err(e) = self.sink.write_text(&bytes, source) {
            log::error!("Failed to write dump output: {e}");
        }
    }

    /// Write one line ending.
    pub fn nl(&self) {
        self.emit(self.settings.eol());
    }

    /// Print the current call stack.
    pub fn backtrace(&self) {
        self.backtrace_frames(&backtrace::capture());
    }

    /// Print a call stack supplied by the host.
    pub fn backtrace_frames(&self, frames: &[Frame]) {
        let text = backtrace::render(frames, &self.theme(), self.settings.eol());
        self.emit(&text);
    }

    /// List the methods of a type, or show one method's source.
    ///
    /// `subject` is a type name or a value (an object lists its own type).
    #[track_caller]
    pub fn methods<'s>(&self, subject: impl Into<MethodsSubject<'s>>, method: Option<&str>) {
        let call_site = CallSite::caller();
        let type_name = subject.into().type_name();
        let type_name = type_name.as_str();
        let Some(introspector) = self.introspector.as_deref() else {
            log::warn!("methods({type_name}) called without an introspector");
            self.emit(&format!("{type_name} is not a declared class.{}", self.settings.eol()));
            return;
        };
        if introspector.list_declared_methods(type_name).is_some() {
            self.banner(&call_site);
        }

        let view = MethodsView {
            introspector,
            source: self.source.as_ref(),
            theme: self.theme(),
            eol: self.settings.eol(),
        };
        let line_prefix = self.settings.print_filename.then_some(call_site.line);
        self.emit(&view.render(type_name, method, line_prefix));
    }

    /// Hex dump of `bytes`.
    pub fn hex(&self, bytes: impl AsRef<[u8]>) {
        self.emit(&hex::render(bytes.as_ref(), self.settings.eol()));
    }

    /// Print the 256-color palette chart.
    pub fn palette(&self) {
        self.emit(&palette::render(self.theme().use_colors(), self.settings.eol()));
    }

    /// `In file <path>` when the call site moved to another file.
    fn banner(&self, call_site: &CallSite) {
        if !self.settings.print_filename {
            return;
        }
        let mut last = self.last_file.lock();
        if last.as_deref() == Some(call_site.file.as_str()) {
            return;
        }
        *last = Some(call_site.file.clone());
        let eol = self.settings.eol();
        self.emit(&format!("In file {}{eol}{eol}", call_site.file));
    }

    /// Append already formatted text to the sink.
    pub(crate) fn emit(&self, text: &str) {
        if let Err(e) = self.sink.write_raw(text) {
            log::error!("Failed to write dump output: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::{MethodDescriptor, TypeDescriptor, TypeRegistry};
    use crate::label::NoSource;
    use par_dump_config::defaults::builtin_store;
    use serde_json::json;

    fn plain_store() -> ConfigStore {
        let mut store = builtin_store().expect("builtin store");
        store.set("use_colors", json!(false));
        store
    }

    fn output(buffer: &MemoryBuffer) -> String {
        String::from_utf8(buffer.lock().clone()).expect("utf-8 output")
    }

    #[test]
    fn test_dump_echoes_value() {
        let (dumper, buffer) = Dumper::in_memory(plain_store()).expect("dumper");
        let dumper = dumper.with_source_reader(NoSource);
        let value = dumper.dump_with(41 + 1, Some("answer"), None);
        assert_eq!(value, 42);
        assert_eq!(output(&buffer), "answer = (int) 42\n");
    }

    #[test]
    fn test_explicit_depth_overrides_config() {
        let (dumper, buffer) = Dumper::in_memory(plain_store()).expect("dumper");
        dumper.dump_with(vec![vec![1]], Some("v"), Some(1));
        assert_eq!(output(&buffer), "v = (array:1) \n    0 => (array:1) \n");
    }

    #[test]
    fn test_configured_depth_does_not_widen_string_cap() {
        let mut store = plain_store();
        store.set("string_cap", json!(10));
        store.set("max_depth", json!(30));
        let (dumper, buffer) = Dumper::in_memory(store).expect("dumper");
        dumper.dump_with("abcdefghijklmnopqrstuvwxy", Some("s"), None);
        dumper.dump_with("abcdefghijklmnopqrstuvwxy", Some("w"), Some(30));
        assert_eq!(
            output(&buffer),
            "s = (string:25:ASCII) \"abcdefghij...\"\nw = (string:25:ASCII) \"abcdefghijklmnopqrstuvwxy\"\n"
        );
    }

    #[test]
    fn test_configured_zero_depth_keeps_truncation() {
        let mut store = plain_store();
        store.set("string_cap", json!(10));
        store.set("max_depth", json!(0));
        let (dumper, buffer) = Dumper::in_memory(store).expect("dumper");
        dumper.dump_with("abcdefghijklmnopqrstuvwxy", Some("s"), None);
        assert_eq!(output(&buffer), "s = (string:25:ASCII) \"abcdefghij...\"\n");
    }

    #[test]
    fn test_banner_printed_once_per_file() {
        let mut store = plain_store();
        store.set("print_filename", json!(true));
        let (dumper, buffer) = Dumper::in_memory(store).expect("dumper");

        let site = CallSite::new("src/a.rs", 3);
        dumper.dump_at(&Value::Null, Some("a"), None, &site);
        dumper.dump_at(&Value::Null, Some("b"), None, &CallSite::new("src/a.rs", 4));
        dumper.dump_at(&Value::Null, Some("c"), None, &CallSite::new("src/b.rs", 1));

        assert_eq!(
            output(&buffer),
            "In file src/a.rs\n\n3   a = (NULL)\n4   b = (NULL)\nIn file src/b.rs\n\n1   c = (NULL)\n"
        );
    }

    #[test]
    fn test_write_normalizes_and_terminates() {
        let mut store = plain_store();
        store.set("line_endings", json!("CRLF"));
        let (dumper, buffer) = Dumper::in_memory(store).expect("dumper");
        dumper.write("a\nb", None);
        dumper.nl();
        assert_eq!(output(&buffer), "a\r\nb\r\n\r\n");
    }

    #[test]
    fn test_write_with_source_encoding() {
        let (dumper, buffer) = Dumper::in_memory(plain_store()).expect("dumper");
        dumper.write([0xfc_u8], Some("ISO-8859-1"));
        dumper.write("ü", Some("not-an-encoding"));
        assert_eq!(output(&buffer), "ü\nü\n");
    }

    #[test]
    fn test_methods_without_introspector() {
        let (dumper, buffer) = Dumper::in_memory(plain_store()).expect("dumper");
        dumper.methods("Widget", None);
        assert_eq!(output(&buffer), "Widget is not a declared class.\n");
    }

    #[test]
    fn test_methods_with_registry() {
        let registry = TypeRegistry::new()
            .with_type(TypeDescriptor::new("Widget").method(MethodDescriptor::new("", "draw")));
        let (dumper, buffer) = Dumper::in_memory(plain_store()).expect("dumper");
        let dumper = dumper.with_introspector(registry);
        dumper.methods("Widget", None);
        assert_eq!(output(&buffer), "\nMethods of Widget\n class Widget\n    draw()\n\n");
    }

    #[test]
    fn test_methods_of_an_object_value() {
        let registry = TypeRegistry::new()
            .with_type(TypeDescriptor::new("Widget").method(MethodDescriptor::new("", "draw")));
        let (dumper, buffer) = Dumper::in_memory(plain_store()).expect("dumper");
        let dumper = dumper.with_introspector(registry);
        let widget = Value::object("Widget", [("id", Value::Int(1))]);
        dumper.methods(&widget, None);
        dumper.methods(&Value::Int(1), None);
        assert_eq!(
            output(&buffer),
            "\nMethods of Widget\n class Widget\n    draw()\n\ninteger is not a declared class.\n"
        );
    }

    #[test]
    fn test_backtrace_frames() {
        let (dumper, buffer) = Dumper::in_memory(plain_store()).expect("dumper");
        dumper.backtrace_frames(&[Frame::new("main").at("src/main.rs", 1)]);
        assert_eq!(output(&buffer), "\nPrinting callstack:\n#0 src/main.rs:(1) main()\n");
    }

    #[test]
    fn test_colors_follow_validated_setting() {
        let mut store = plain_store();
        store.set("use_colors", json!(true));
        let (dumper, _buffer) = Dumper::in_memory(store).expect("dumper");
        assert!(dumper.settings().use_colors);
        assert!(dumper.theme().use_colors());

        // Loose truthy strings are rejected rather than guessed at.
        let mut store = plain_store();
        store.set("use_colors", json!("sometimes"));
        assert!(Dumper::in_memory(store).is_err());
    }

    #[test]
    fn test_unknown_output_encoding_is_fatal() {
        let mut store = plain_store();
        store.set("output_encoding", json!("KOI8-R"));
        assert!(Dumper::in_memory(store).is_err());
    }
}
