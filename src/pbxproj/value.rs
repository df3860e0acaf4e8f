/// Value tree for the OpenStep-style property lists used by project.pbxproj
///
/// Every node remembers the byte range it was parsed from so edits can be
/// spliced into the original text without reformatting the rest of the file.

use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Array(Vec<Node>),
    Dict(Dict),
    Data(String), // raw hex between < and >
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub value: Value,
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: String,
    pub key_span: Range<usize>,
    pub value: Node,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dict {
    pub entries: Vec<Entry>,
    pub open: usize,  // offset of `{`
    pub close: usize, // offset of `}`
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Node]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl Dict {
    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entry(key).map(|e| &e.value)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|n| n.value.as_str())
    }

    pub fn get_dict(&self, key: &str) -> Option<&Dict> {
        self.get(key).and_then(|n| n.value.as_dict())
    }

    pub fn get_array(&self, key: &str) -> Option<&[Node]> {
        self.get(key).and_then(|n| n.value.as_array())
    }

    /// String items of an array entry, skipping anything that isn't a string
    pub fn get_str_list(&self, key: &str) -> Option<Vec<&str>> {
        self.get_array(key)
            .map(|items| items.iter().filter_map(|n| n.value.as_str()).collect())
    }
}
