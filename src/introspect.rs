//! Method listings for declared types.
//!
//! Rust has no runtime reflection, so type and method information comes from
//! an [`Introspector`]. The renderer here only consumes its descriptors.
//! [`TypeRegistry`] is an in-memory implementation for hosts that describe
//! their types up front.

use crate::label::SourceReader;
use crate::value::Value;
use par_dump_config::ThemeResolver;
use std::collections::HashMap;

/// A method parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDescriptor {
    pub name: String,
    /// Passed by reference; rendered with a leading `&`.
    pub by_ref: bool,
    /// Default value of an optional parameter.
    pub default: Option<Value>,
}

impl ParamDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            by_ref: false,
            default: None,
        }
    }

    pub fn by_ref(mut self) -> Self {
        self.by_ref = true;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Lines `start_line..=end_line` of `file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpan {
    pub file: String,
    pub start_line: u32,
    pub end_line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    pub name: String,
    pub declaring_type: String,
    pub params: Vec<ParamDescriptor>,
    pub doc: Option<String>,
    pub span: Option<SourceSpan>,
}

impl MethodDescriptor {
    pub fn new(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declaring_type: declaring_type.into(),
            params: Vec::new(),
            doc: None,
            span: None,
        }
    }

    pub fn param(mut self, param: ParamDescriptor) -> Self {
        self.params.push(param);
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn span(mut self, file: impl Into<String>, start_line: u32, end_line: u32) -> Self {
        self.span = Some(SourceSpan {
            file: file.into(),
            start_line,
            end_line,
        });
        self
    }
}

/// Source of type and method information.
pub trait Introspector: Send + Sync {
    /// Methods declared directly on `type_name`, or `None` if the type is unknown.
    fn list_declared_methods(&self, type_name: &str) -> Option<Vec<MethodDescriptor>>;

    /// The type `type_name` extends, if any.
    fn parent_type(&self, type_name: &str) -> Option<String>;

    /// A method of `type_name` or of one of its ancestors.
    fn describe_method(&self, type_name: &str, method: &str) -> Option<MethodDescriptor> {
        let mut current = Some(type_name.to_string());
        let mut visited = Vec::new();
        while let Some(name) = current {
            if visited.contains(&name) {
                break;
            }
            if let Some(found) = self
                .list_declared_methods(&name)?
                .into_iter()
                .find(|m| m.name == method)
            {
                return Some(found);
            }
            current = self.parent_type(&name);
            visited.push(name);
        }
        None
    }
}

/// A type as registered in a [`TypeRegistry`].
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub name: String,
    pub parent: Option<String>,
    pub methods: Vec<MethodDescriptor>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            methods: Vec::new(),
        }
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Add a method; its declaring type is set to this type.
    pub fn method(mut self, mut method: MethodDescriptor) -> Self {
        method.declaring_type = self.name.clone();
        self.methods.push(method);
        self
    }
}

/// [`Introspector`] over types registered at startup.
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, TypeDescriptor>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: TypeDescriptor) {
        log::debug!("Registered type {} ({} methods)", descriptor.name, descriptor.methods.len());
        self.types.insert(descriptor.name.clone(), descriptor);
    }

    pub fn with_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.register(descriptor);
        self
    }
}

impl Introspector for TypeRegistry {
    fn list_declared_methods(&self, type_name: &str) -> Option<Vec<MethodDescriptor>> {
        self.types.get(type_name).map(|t| t.methods.clone())
    }

    fn parent_type(&self, type_name: &str) -> Option<String> {
        self.types.get(type_name).and_then(|t| t.parent.clone())
    }
}

/// What a method listing is asked about: a type by name, or a value whose
/// type is listed.
#[derive(Debug, Clone, Copy)]
pub enum MethodsSubject<'a> {
    Name(&'a str),
    Object(&'a Value),
}

impl MethodsSubject<'_> {
    /// Name of the type to list.
    ///
    /// Objects and callables give their type name, strings are taken as a
    /// type name, anything else gives its value kind (which no registry
    /// declares, so the listing reports it as unknown).
    pub fn type_name(&self) -> String {
        match self {
            MethodsSubject::Name(name) => name.to_string(),
            MethodsSubject::Object(value) => subject_type_name(value),
        }
    }
}

fn subject_type_name(value: &Value) -> String {
    match value {
        Value::Object { type_name, .. } | Value::Callable { type_name, .. } => type_name.clone(),
        Value::String(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Value::Shared(node) => match &*node.read() {
            Value::Shared(_) => value.type_label().to_string(),
            inner => subject_type_name(inner),
        },
        other => other.type_label().to_string(),
    }
}

impl<'a> From<&'a str> for MethodsSubject<'a> {
    fn from(name: &'a str) -> Self {
        MethodsSubject::Name(name)
    }
}

impl<'a> From<&'a String> for MethodsSubject<'a> {
    fn from(name: &'a String) -> Self {
        MethodsSubject::Name(name)
    }
}

impl<'a> From<&'a Value> for MethodsSubject<'a> {
    fn from(value: &'a Value) -> Self {
        MethodsSubject::Object(value)
    }
}

/// Formatting inputs shared by the listing and the method view.
pub struct MethodsView<'a> {
    pub introspector: &'a dyn Introspector,
    pub source: &'a dyn SourceReader,
    pub theme: ThemeResolver<'a>,
    pub eol: &'a str,
}

impl MethodsView<'_> {
    /// Listing of `type_name` and its ancestors, or the source of one method.
    ///
    /// `line_prefix` is the padded call-site line used in filename mode.
    pub fn render(&self, type_name: &str, method: Option<&str>, line_prefix: Option<u32>) -> String {
        if self.introspector.list_declared_methods(type_name).is_none() {
            return format!("{type_name} is not a declared class.{}", self.eol);
        }

        let mut out = String::from(self.eol);
        if let Some(line) = line_prefix {
            out.push_str(&format!("{line:<4}"));
        }

        match method.and_then(|m| self.introspector.describe_method(type_name, m)) {
            Some(descriptor) => out.push_str(&self.method_info(&descriptor)),
            None => out.push_str(&self.listing(type_name)),
        }
        out
    }

    fn listing(&self, type_name: &str) -> String {
        let eol = self.eol;
        let mut out = format!("Methods of {type_name}{eol}");

        for (i, (name, mut methods)) in self.ancestry(type_name).into_iter().enumerate() {
            let (label, tag) = if i == 0 {
                ("class", "methods_class")
            } else {
                ("extends", "methods_class_extends")
            };
            let label_tag = if i == 0 {
                "methods_class_label"
            } else {
                "methods_extends_label"
            };
            out.push_str(&format!(
                " {} {}{eol}",
                self.theme.colorize(label, label_tag),
                self.theme.colorize(&name, tag)
            ));

            methods.sort_by(|a, b| a.name.cmp(&b.name));
            for method in &methods {
                out.push_str(&format!(
                    "    {}({}){eol}",
                    self.theme.colorize(&method.name, "methods_function"),
                    self.params(method)
                ));
            }
            out.push_str(eol);
        }
        out
    }

    /// `type_name` followed by its ancestors, each with its declared methods.
    fn ancestry(&self, type_name: &str) -> Vec<(String, Vec<MethodDescriptor>)> {
        let mut chain: Vec<(String, Vec<MethodDescriptor>)> = Vec::new();
        let mut current = Some(type_name.to_string());
        while let Some(name) = current {
            if chain.iter().any(|(seen, _)| *seen == name) {
                log::warn!("Type hierarchy of {type_name} loops back to {name}");
                break;
            }
            let Some(methods) = self.introspector.list_declared_methods(&name) else {
                log::debug!("Parent type {name} of {type_name} is not registered");
                break;
            };
            current = self.introspector.parent_type(&name);
            chain.push((name, methods));
        }
        chain
    }

    fn method_info(&self, method: &MethodDescriptor) -> String {
        let eol = self.eol;
        let mut out = format!("defined in class {}{eol}", method.declaring_type);
        if let Some(span) = &method.span {
            out.push_str(&format!("  file {}:{}{eol}", span.file, span.start_line));
        }
        out.push_str(&format!("    {}{eol}", method.doc.as_deref().unwrap_or("")));
        if let Some(span) = &method.span {
            match self
                .source
                .read_lines(&span.file, span.start_line, span.end_line)
            {
                Some(lines) => {
                    for line in lines {
                        out.push_str(&line);
                        out.push_str(eol);
                    }
                }
                None => log::debug!("Source of {} not readable at {}", method.name, span.file),
            }
        }
        out
    }

    fn params(&self, method: &MethodDescriptor) -> String {
        method
            .params
            .iter()
            .map(|param| self.param(param))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn param(&self, param: &ParamDescriptor) -> String {
        let reference = if param.by_ref { "&" } else { "" };
        let mut declaration = self
            .theme
            .colorize(&format!("{reference}{}", param.name), "methods_param");

        if let Some(default) = &param.default {
            let value = match default {
                Value::Array(_) => self.theme.colorize("[]", "dump_array"),
                Value::Null => self.theme.colorize("null", "dump_null"),
                Value::String(bytes) => format!(
                    "'{}'",
                    self.theme
                        .colorize(&String::from_utf8_lossy(bytes), "dump_string")
                ),
                Value::Bool(b) => self
                    .theme
                    .colorize(if *b { "true" } else { "false" }, "dump_bool"),
                Value::Int(i) => self.theme.colorize(&i.to_string(), "dump_int"),
                Value::Float(f) => self.theme.colorize(&f.to_string(), "dump_float"),
                other => self.theme.colorize(other.type_label(), "dump_value"),
            };
            declaration.push_str(" = ");
            declaration.push_str(&value);
        }
        declaration
    }
}
