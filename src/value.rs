//! Dynamic value model for dumped data.
//!
//! [`Value`] is what the formatter walks. Rust values get into it through the
//! [`Inspect`] trait, which is implemented for primitives, strings,
//! collections, `serde_json::Value` and the usual smart pointers. Types with
//! fields of their own implement `Inspect` by returning [`Value::object`].
//!
//! [`Value::Shared`] wraps an `Arc<RwLock<Value>>` so that graphs with shared
//! nodes, including reference cycles, can be described and dumped safely.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

/// Shared, possibly cyclic node.
pub type SharedValue = Arc<RwLock<Value>>;

/// Key of an array entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{i}"),
            Key::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        i64::try_from(i).map_or_else(|_| Key::Str(i.to_string()), Key::Int)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

/// A runtime value as the inspector sees it.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Raw bytes in whatever encoding they came in.
    String(Vec<u8>),
    /// Ordered mapping from int-or-string keys to values.
    Array(Vec<(Key, Value)>),
    /// Record with a type name and named fields.
    Object {
        type_name: String,
        fields: Vec<(String, Value)>,
    },
    /// Handle to something outside the program (file, socket, ...).
    Resource { kind: String },
    /// Something invokable. `type_name` is used when it is nested.
    Callable { name: String, type_name: String },
    /// Shared node; rendered through its lock with cycle detection.
    Shared(SharedValue),
    /// Anything the model has no variant for.
    Unknown,
}

/// Structural equality. Shared nodes compare by identity, so comparing two
/// cyclic graphs never recurses.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) | (Value::Unknown, Value::Unknown) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (
                Value::Object {
                    type_name: a,
                    fields: fa,
                },
                Value::Object {
                    type_name: b,
                    fields: fb,
                },
            ) => a == b && fa == fb,
            (Value::Resource { kind: a }, Value::Resource { kind: b }) => a == b,
            (
                Value::Callable {
                    name: a,
                    type_name: ta,
                },
                Value::Callable {
                    name: b,
                    type_name: tb,
                },
            ) => a == b && ta == tb,
            (Value::Shared(a), Value::Shared(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    pub fn string(bytes: impl Into<Vec<u8>>) -> Self {
        Value::String(bytes.into())
    }

    /// Array with keys `0..n`.
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (Key::from(i), v))
                .collect(),
        )
    }

    /// Array with explicit keys.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<Key>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Array(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn object<N, I>(type_name: impl Into<String>, fields: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Value)>,
    {
        Value::Object {
            type_name: type_name.into(),
            fields: fields.into_iter().map(|(n, v)| (n.into(), v)).collect(),
        }
    }

    pub fn resource(kind: impl Into<String>) -> Self {
        Value::Resource { kind: kind.into() }
    }

    pub fn callable(name: impl Into<String>) -> Self {
        Value::Callable {
            name: name.into(),
            type_name: "Closure".to_string(),
        }
    }

    /// Wrap a value in a shared node.
    pub fn shared(value: Value) -> SharedValue {
        Arc::new(RwLock::new(value))
    }

    /// Short type name, used for argument lists and parameter defaults.
    pub fn type_label(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object { .. } => "object",
            Value::Resource { .. } => "resource",
            Value::Callable { .. } => "callable",
            Value::Shared(_) => "shared",
            Value::Unknown => "unknown",
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    n.as_f64().map_or(Value::Unknown, Value::Float)
                }
            }
            serde_json::Value::String(s) => Value::String(s.into_bytes()),
            serde_json::Value::Array(items) => Value::list(items.into_iter().map(Value::from)),
            serde_json::Value::Object(map) => {
                Value::map(map.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}

/// Conversion into the inspector's value model.
pub trait Inspect {
    fn inspect(&self) -> Value;
}

/// Conversion into an array key.
pub trait InspectKey {
    fn inspect_key(&self) -> Key;
}

impl Inspect for Value {
    fn inspect(&self) -> Value {
        self.clone()
    }
}

impl Inspect for serde_json::Value {
    fn inspect(&self) -> Value {
        Value::from(self.clone())
    }
}

impl Inspect for () {
    fn inspect(&self) -> Value {
        Value::Null
    }
}

impl Inspect for bool {
    fn inspect(&self) -> Value {
        Value::Bool(*self)
    }
}

macro_rules! inspect_signed {
    ($($ty:ty),*) => {
        $(
            impl Inspect for $ty {
                fn inspect(&self) -> Value {
                    Value::Int(i64::from(*self))
                }
            }

            impl InspectKey for $ty {
                fn inspect_key(&self) -> Key {
                    Key::Int(i64::from(*self))
                }
            }
        )*
    };
}

inspect_signed!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! inspect_wide {
    ($($ty:ty),*) => {
        $(
            impl Inspect for $ty {
                fn inspect(&self) -> Value {
                    // Out-of-range integers degrade to floats.
                    i64::try_from(*self).map_or(Value::Float(*self as f64), Value::Int)
                }
            }

            impl InspectKey for $ty {
                fn inspect_key(&self) -> Key {
                    i64::try_from(*self).map_or_else(|_| Key::Str(self.to_string()), Key::Int)
                }
            }
        )*
    };
}

inspect_wide!(isize, usize, u64, i128, u128);

impl Inspect for f32 {
    fn inspect(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl Inspect for f64 {
    fn inspect(&self) -> Value {
        Value::Float(*self)
    }
}

impl Inspect for char {
    fn inspect(&self) -> Value {
        Value::String(self.to_string().into_bytes())
    }
}

impl Inspect for str {
    fn inspect(&self) -> Value {
        Value::String(self.as_bytes().to_vec())
    }
}

impl Inspect for String {
    fn inspect(&self) -> Value {
        Value::String(self.as_bytes().to_vec())
    }
}

impl InspectKey for str {
    fn inspect_key(&self) -> Key {
        Key::Str(self.to_string())
    }
}

impl InspectKey for String {
    fn inspect_key(&self) -> Key {
        Key::Str(self.clone())
    }
}

impl<K: InspectKey + ?Sized> InspectKey for &K {
    fn inspect_key(&self) -> Key {
        (**self).inspect_key()
    }
}

impl Inspect for Path {
    fn inspect(&self) -> Value {
        Value::String(self.to_string_lossy().into_owned().into_bytes())
    }
}

impl Inspect for PathBuf {
    fn inspect(&self) -> Value {
        self.as_path().inspect()
    }
}

impl Inspect for std::fs::File {
    fn inspect(&self) -> Value {
        Value::resource("stream")
    }
}

impl Inspect for std::net::TcpStream {
    fn inspect(&self) -> Value {
        Value::resource("socket")
    }
}

impl<T: Inspect> Inspect for Option<T> {
    fn inspect(&self) -> Value {
        self.as_ref().map_or(Value::Null, Inspect::inspect)
    }
}

impl<T: Inspect + ?Sized> Inspect for &T {
    fn inspect(&self) -> Value {
        (**self).inspect()
    }
}

impl<T: Inspect + ?Sized> Inspect for &mut T {
    fn inspect(&self) -> Value {
        (**self).inspect()
    }
}

impl<T: Inspect + ?Sized> Inspect for Box<T> {
    fn inspect(&self) -> Value {
        (**self).inspect()
    }
}

impl<T: Inspect + ?Sized> Inspect for Rc<T> {
    fn inspect(&self) -> Value {
        (**self).inspect()
    }
}

impl<T: Inspect + ?Sized> Inspect for Arc<T> {
    fn inspect(&self) -> Value {
        (**self).inspect()
    }
}

impl<T: Inspect> Inspect for [T] {
    fn inspect(&self) -> Value {
        Value::list(self.iter().map(Inspect::inspect))
    }
}

impl<T: Inspect, const N: usize> Inspect for [T; N] {
    fn inspect(&self) -> Value {
        self.as_slice().inspect()
    }
}

impl<T: Inspect> Inspect for Vec<T> {
    fn inspect(&self) -> Value {
        self.as_slice().inspect()
    }
}

impl<T: Inspect> Inspect for VecDeque<T> {
    fn inspect(&self) -> Value {
        Value::list(self.iter().map(Inspect::inspect))
    }
}

impl<K: InspectKey, V: Inspect> Inspect for BTreeMap<K, V> {
    fn inspect(&self) -> Value {
        Value::map(self.iter().map(|(k, v)| (k.inspect_key(), v.inspect())))
    }
}

impl<K: InspectKey, V: Inspect, S> Inspect for HashMap<K, V, S> {
    fn inspect(&self) -> Value {
        Value::map(self.iter().map(|(k, v)| (k.inspect_key(), v.inspect())))
    }
}
