//! Host symbol resolution.
//!
//! The evaluator knows nothing about the file being viewed.  Names it can't
//! find among its own variables are handed to a [`SymbolResolver`], which
//! describes template fields, their members and elements, and type names.

use std::collections::HashMap;

use super::error::ExprError;
use super::value::Value;

// ── Symbol ────────────────────────────────────────────────────────────────────

/// A resolved host symbol.
///
/// For containers `value` is [`Value::Struct`], [`Value::Array`] or
/// [`Value::Blob`] and the symbol is passed back as the parent when a member
/// or element is looked up.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub value: Value,
    /// Size in bytes.
    pub size: i64,
    /// Offset of the field in the file.
    pub address: i64,
    /// Display form of the field, for `string()`.  Empty unless the host
    /// supplies one.
    pub text: String,
}

impl Symbol {
    /// A symbol with no display text; see [`Symbol::with_text`].
    pub fn new(value: impl Into<Value>, size: i64, address: i64) -> Self {
        Symbol {
            value: value.into(),
            size,
            address,
            text: String::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

// ── SymbolResolver ────────────────────────────────────────────────────────────

/// Host interface for everything outside the evaluator's own variables.
pub trait SymbolResolver {
    /// Look up `name` at top level (`parent` is `None`), a member of a
    /// struct, or element `index` of an array or blob (`name` is empty).
    ///
    /// Must give the same answer for the same question within one
    /// evaluation.
    fn resolve(&self, name: &str, parent: Option<&Symbol>, index: usize) -> Option<Symbol>;

    /// Read `count` bytes of the file at `address`, for `get()`.
    fn read_bytes(&self, _address: i64, _count: usize) -> Result<Vec<u8>, ExprError> {
        Err(ExprError::host("Reading file data is not supported"))
    }
}

/// A resolver that knows no symbols.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSymbols;

impl SymbolResolver for NoSymbols {
    fn resolve(&self, _name: &str, _parent: Option<&Symbol>, _index: usize) -> Option<Symbol> {
        None
    }
}

impl<R: SymbolResolver + ?Sized> SymbolResolver for &R {
    fn resolve(&self, name: &str, parent: Option<&Symbol>, index: usize) -> Option<Symbol> {
        (**self).resolve(name, parent, index)
    }

    fn read_bytes(&self, address: i64, count: usize) -> Result<Vec<u8>, ExprError> {
        (**self).read_bytes(address, count)
    }
}

// ── SymbolTable ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Children {
    Members(Vec<(String, Symbol)>),
    Elements(Vec<Symbol>),
    Bytes(Vec<u8>),
}

/// An in-memory [`SymbolResolver`].
///
/// Containers are identified by kind, address and size, so two containers
/// of the same kind must not occupy exactly the same bytes.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    top: HashMap<String, Symbol>,
    containers: Vec<(Symbol, Children)>,
    data: Vec<u8>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The file contents behind `get()`.
    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, symbol: Symbol) {
        self.top.insert(name.into(), symbol);
    }

    /// A type name; its size answers `sizeof`.
    pub fn insert_type(&mut self, name: impl Into<String>, size: i64) {
        self.insert(name, Symbol::new(Value::None, size, 0));
    }

    /// A struct; returns its symbol so that it can also be nested.
    pub fn insert_struct(
        &mut self,
        name: impl Into<String>,
        address: i64,
        members: Vec<(&str, Symbol)>,
    ) -> Symbol {
        let size = members.iter().map(|(_, m)| m.size).sum();
        let sym = Symbol::new(Value::Struct, size, address);
        let members = members
            .into_iter()
            .map(|(n, m)| (n.to_owned(), m))
            .collect();
        self.containers.push((sym.clone(), Children::Members(members)));
        self.insert(name, sym.clone());
        sym
    }

    pub fn insert_array(&mut self, name: impl Into<String>, address: i64, elements: Vec<Symbol>) -> Symbol {
        let size = elements.iter().map(|e| e.size).sum();
        let sym = Symbol::new(Value::Array, size, address);
        self.containers.push((sym.clone(), Children::Elements(elements)));
        self.insert(name, sym.clone());
        sym
    }

    pub fn insert_blob(&mut self, name: impl Into<String>, address: i64, bytes: Vec<u8>) -> Symbol {
        let sym = Symbol::new(Value::Blob, bytes.len() as i64, address);
        self.containers.push((sym.clone(), Children::Bytes(bytes)));
        self.insert(name, sym.clone());
        sym
    }

    fn children_of(&self, parent: &Symbol) -> Option<&Children> {
        self.containers
            .iter()
            .find(|(c, _)| c.value == parent.value && c.address == parent.address && c.size == parent.size)
            .map(|(_, ch)| ch)
    }
}

impl SymbolResolver for SymbolTable {
    fn resolve(&self, name: &str, parent: Option<&Symbol>, index: usize) -> Option<Symbol> {
        let Some(parent) = parent else {
            return self.top.get(name).cloned();
        };
        match self.children_of(parent)? {
            Children::Members(members) => members
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, m)| m.clone()),
            Children::Elements(elements) => elements.get(index).cloned(),
            Children::Bytes(bytes) => bytes
                .get(index)
                .map(|b| Symbol::new(Value::Int(i64::from(*b)), 1, parent.address + index as i64)),
        }
    }

    fn read_bytes(&self, address: i64, count: usize) -> Result<Vec<u8>, ExprError> {
        let start = usize::try_from(address)
            .map_err(|_| ExprError::host(format!("Address {address} is not in the file")))?;
        start
            .checked_add(count)
            .and_then(|end| self.data.get(start..end))
            .map(<[u8]>::to_vec)
            .ok_or_else(|| ExprError::host(format!("Address {address} is not in the file")))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SymbolTable {
        let mut t = SymbolTable::new().with_data(vec![1, 2, 3, 4]);
        t.insert("intField", Symbol::new(12345, 4, 0));
        t.insert_array(
            "arrayField",
            24,
            vec![Symbol::new(5, 4, 24), Symbol::new(6, 4, 28)],
        );
        t.insert_struct(
            "structField",
            32,
            vec![("value1", Symbol::new(7, 4, 32)), ("value2", Symbol::new(8, 4, 36))],
        );
        t.insert_blob("blobField", 42, vec![123, 21]);
        t
    }

    #[test]
    fn top_level() {
        let t = table();
        assert_eq!(t.resolve("intField", None, 0).unwrap().value, Value::Int(12345));
        assert!(t.resolve("nope", None, 0).is_none());
    }

    #[test]
    fn members_and_elements() {
        let t = table();
        let s = t.resolve("structField", None, 0).unwrap();
        assert_eq!(s.size, 8);
        assert_eq!(t.resolve("value2", Some(&s), 0).unwrap().address, 36);
        assert!(t.resolve("value3", Some(&s), 0).is_none());

        let a = t.resolve("arrayField", None, 0).unwrap();
        assert_eq!(t.resolve("", Some(&a), 1).unwrap().value, Value::Int(6));
        assert!(t.resolve("", Some(&a), 2).is_none());

        let b = t.resolve("blobField", None, 0).unwrap();
        let byte = t.resolve("", Some(&b), 1).unwrap();
        assert_eq!((byte.value, byte.size, byte.address), (Value::Int(21), 1, 43));
    }

    #[test]
    fn reading_bytes() {
        let t = table();
        assert_eq!(t.read_bytes(1, 2).unwrap(), vec![2, 3]);
        assert!(t.read_bytes(3, 2).is_err());
        assert!(t.read_bytes(-1, 1).is_err());
        assert_eq!(
            NoSymbols.read_bytes(0, 1).unwrap_err().to_string(),
            "Reading file data is not supported"
        );
    }
}
