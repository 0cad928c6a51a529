//! Dynamic Values
//!
//! Every piece of data the interpreter touches is a `Value`: a cheaply
//! clonable handle that carries a string representation plus lazily
//! computed typed views (integer, double, list, dictionary). The string
//! form is authoritative; typed views are derived on demand and cached
//! ("shimmering"). A value never changes its observable string form.
//!
//! There is no nil `Value`; query operations that can miss return
//! `Option<Value>` instead, so "no such value" stays distinct from an
//! empty string, an empty list, and zero.

use std::cell::{Cell, OnceCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

pub mod index;
pub mod list;
pub mod number;

pub use index::parse_index;
pub use list::{format_element, format_list, parse_list};
pub use number::{format_double, parse_bool, parse_double, parse_int};

/// An ordered string-keyed mapping, the dictionary view of a value.
pub type Dict = IndexMap<String, Value>;

#[derive(Clone)]
pub struct Value {
    inner: Rc<Inner>,
}

struct Inner {
    string: OnceCell<String>,
    int: Cell<Option<i64>>,
    dbl: Cell<Option<f64>>,
    list: OnceCell<Rc<Vec<Value>>>,
    dict: OnceCell<Rc<Dict>>,
}

impl Inner {
    fn fresh() -> Self {
        Self {
            string: OnceCell::new(),
            int: Cell::new(None),
            dbl: Cell::new(None),
            list: OnceCell::new(),
            dict: OnceCell::new(),
        }
    }
}

impl Value {
    /// The empty string.
    pub fn empty() -> Self {
        Self::string(String::new())
    }

    pub fn string(s: impl Into<String>) -> Self {
        let inner = Inner::fresh();
        let _ = inner.string.set(s.into());
        Self { inner: Rc::new(inner) }
    }

    pub fn int(i: i64) -> Self {
        let inner = Inner::fresh();
        inner.int.set(Some(i));
        Self { inner: Rc::new(inner) }
    }

    pub fn double(d: f64) -> Self {
        let inner = Inner::fresh();
        inner.dbl.set(Some(d));
        Self { inner: Rc::new(inner) }
    }

    /// Booleans read back as "1" / "0".
    pub fn boolean(b: bool) -> Self {
        Self::int(if b { 1 } else { 0 })
    }

    pub fn list(items: Vec<Value>) -> Self {
        let inner = Inner::fresh();
        let _ = inner.list.set(Rc::new(items));
        Self { inner: Rc::new(inner) }
    }

    pub fn dict(map: Dict) -> Self {
        let inner = Inner::fresh();
        let _ = inner.dict.set(Rc::new(map));
        Self { inner: Rc::new(inner) }
    }

    /// The authoritative string form, computing it from a typed rep the
    /// first time it is asked for.
    pub fn as_str(&self) -> &str {
        self.inner.string.get_or_init(|| {
            if let Some(i) = self.inner.int.get() {
                i.to_string()
            } else if let Some(d) = self.inner.dbl.get() {
                format_double(d)
            } else if let Some(items) = self.inner.list.get() {
                format_list(items)
            } else if let Some(map) = self.inner.dict.get() {
                let mut flat = Vec::with_capacity(map.len() * 2);
                for (k, v) in map.iter() {
                    flat.push(Value::string(k.clone()));
                    flat.push(v.clone());
                }
                format_list(&flat)
            } else {
                String::new()
            }
        })
    }

    pub fn bytes(&self) -> &[u8] {
        self.as_str().as_bytes()
    }

    pub fn byte_length(&self) -> usize {
        self.as_str().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }

    /// Signed 64-bit view.
    pub fn as_int(&self) -> Result<i64, String> {
        if let Some(i) = self.inner.int.get() {
            return Ok(i);
        }
        let i = parse_int(self.as_str())?;
        self.inner.int.set(Some(i));
        Ok(i)
    }

    /// IEEE-754 binary64 view. An integer rep promotes without reparsing.
    pub fn as_double(&self) -> Result<f64, String> {
        if let Some(d) = self.inner.dbl.get() {
            return Ok(d);
        }
        if let Some(i) = self.inner.int.get() {
            return Ok(i as f64);
        }
        let d = parse_double(self.as_str())?;
        self.inner.dbl.set(Some(d));
        Ok(d)
    }

    pub fn as_bool(&self) -> Result<bool, String> {
        if let Some(i) = self.inner.int.get() {
            return Ok(i != 0);
        }
        parse_bool(self.as_str())
    }

    /// List view. A dictionary rep flattens to alternating key/value
    /// elements; anything else parses the string form.
    pub fn as_list(&self) -> Result<Rc<Vec<Value>>, String> {
        if let Some(items) = self.inner.list.get() {
            return Ok(items.clone());
        }
        if self.inner.string.get().is_none() {
            if let Some(map) = self.inner.dict.get() {
                let mut flat = Vec::with_capacity(map.len() * 2);
                for (k, v) in map.iter() {
                    flat.push(Value::string(k.clone()));
                    flat.push(v.clone());
                }
                let rc = Rc::new(flat);
                let _ = self.inner.list.set(rc.clone());
                return Ok(rc);
            }
        }
        let items = parse_list(self.as_str())?;
        let rc = Rc::new(items);
        // A concurrent init cannot happen on a single thread; set may
        // only fail if a recursive parse already filled the cell.
        let _ = self.inner.list.set(rc.clone());
        Ok(self.inner.list.get().expect("list rep just set").clone())
    }

    /// Dictionary view: the list view paired off, later duplicate keys
    /// overwriting earlier values in place.
    pub fn as_dict(&self) -> Result<Rc<Dict>, String> {
        if let Some(map) = self.inner.dict.get() {
            return Ok(map.clone());
        }
        let items = self.as_list()?;
        if items.len() % 2 != 0 {
            return Err("missing value to go with key".to_string());
        }
        let mut map = Dict::with_capacity(items.len() / 2);
        for pair in items.chunks(2) {
            map.insert(pair[0].as_str().to_string(), pair[1].clone());
        }
        let rc = Rc::new(map);
        let _ = self.inner.dict.set(rc.clone());
        Ok(self.inner.dict.get().expect("dict rep just set").clone())
    }

    /// Byte equality of the string forms.
    pub fn eq_value(&self, other: &Value) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner) || self.as_str() == other.as_str()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.eq_value(other)
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({:?})", self.as_str())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::int(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::double(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::boolean(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_to_string() {
        let v = Value::int(42);
        assert_eq!(v.as_str(), "42");
        assert_eq!(v.as_int().unwrap(), 42);
    }

    #[test]
    fn test_string_to_int() {
        let v = Value::string("  -17 ");
        assert_eq!(v.as_int().unwrap(), -17);
    }

    #[test]
    fn test_bad_int() {
        let v = Value::string("pear");
        assert_eq!(v.as_int().unwrap_err(), "expected integer but got \"pear\"");
    }

    #[test]
    fn test_double_view() {
        let v = Value::string("2.5");
        assert_eq!(v.as_double().unwrap(), 2.5);
        let v = Value::double(1.0);
        assert_eq!(v.as_str(), "1.0");
    }

    #[test]
    fn test_list_round_trip() {
        let v = Value::list(vec![
            Value::string("a b"),
            Value::string(""),
            Value::string("c"),
        ]);
        assert_eq!(v.as_str(), "{a b} {} c");
        let parsed = Value::string("{a b} {} c");
        let items = parsed.as_list().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_str(), "a b");
        assert_eq!(items[1].as_str(), "");
        assert_eq!(items[2].as_str(), "c");
    }

    #[test]
    fn test_dict_view() {
        let v = Value::string("a 1 b 2");
        let map = v.as_dict().unwrap();
        assert_eq!(map.get("a").unwrap().as_str(), "1");
        assert_eq!(map.get("b").unwrap().as_str(), "2");
    }

    #[test]
    fn test_dict_odd_elements() {
        let v = Value::string("a 1 b");
        assert!(v.as_dict().is_err());
    }

    #[test]
    fn test_dict_preserves_insertion_order() {
        let mut map = Dict::new();
        map.insert("z".to_string(), Value::int(1));
        map.insert("a".to_string(), Value::int(2));
        let v = Value::dict(map);
        assert_eq!(v.as_str(), "z 1 a 2");
    }

    #[test]
    fn test_boolean_words() {
        assert!(Value::string("yes").as_bool().unwrap());
        assert!(!Value::string("off").as_bool().unwrap());
        assert!(Value::string("3").as_bool().unwrap());
        assert!(Value::string("maybe").as_bool().is_err());
    }

    #[test]
    fn test_equality_is_by_string() {
        assert_eq!(Value::int(7), Value::string("7"));
        assert_ne!(Value::string("7.0"), Value::string("7"));
    }
}
