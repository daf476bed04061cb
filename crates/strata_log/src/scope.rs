//! Immutable, parent-linked logging scopes.
//!
//! Every derivation (fields, group, prefix) allocates a new node pointing at
//! its parent. Nodes are never mutated after creation, so one base scope can
//! be extended from many threads at once without coordination.
//!
//! Flattening walks leaf to root once to collect the lineage, then replays
//! it root to leaf:
//!
//! - group names accumulate into a `g1.g2.` path applied to every attribute
//!   added at or below the group,
//! - prefix fragments concatenate, root-most first,
//! - attributes are reported in the order they were added.

use crate::value::{Attr, GROUP_DELIMITER, Value};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

/// Receives the flattened contents of a scope chain.
pub trait Visit {
    /// Called for each message-prefix fragment, root-most first.
    fn prefix(&mut self, fragment: &str);

    /// Called for each attribute, with the group path in effect where it
    /// was added (empty, or ending in `.`).
    fn attr(&mut self, group_path: &str, attr: &Attr);
}

/// One link in a scope chain.
#[derive(Debug, Default)]
pub struct Scope {
    parent: Option<Arc<Scope>>,
    group: Option<String>,
    prefix: Option<String>,
    attrs: Vec<Attr>,
}

impl Scope {
    /// Creates an empty root scope.
    #[must_use]
    pub fn root() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Derives a scope carrying `attrs`.
    ///
    /// Attributes keyed with [`PREFIX_KEY`](crate::PREFIX_KEY) become prefix
    /// fragments instead of fields. An empty list returns `self` unchanged.
    #[must_use]
    pub fn with_attrs(self: &Arc<Self>, attrs: Vec<Attr>) -> Arc<Self> {
        if attrs.is_empty() {
            return Arc::clone(self);
        }

        let mut prefix: Option<String> = None;
        let mut fields = Vec::with_capacity(attrs.len());
        for attr in attrs {
            if attr.is_prefix() {
                let fragment = prefix.get_or_insert_with(String::new);
                match &attr.value {
                    Value::Str(s) => fragment.push_str(s),
                    other => fragment.push_str(&other.to_string()),
                }
                continue;
            }
            fields.push(attr);
        }

        Arc::new(Self {
            parent: Some(Arc::clone(self)),
            group: None,
            prefix,
            attrs: fields,
        })
    }

    /// Derives a scope carrying a single field.
    #[must_use]
    pub fn with_field(
        self: &Arc<Self>,
        key: impl Into<Cow<'static, str>>,
        value: impl Into<Value>,
    ) -> Arc<Self> {
        self.with_attrs(vec![Attr::new(key, value)])
    }

    /// Derives a scope whose later attributes are namespaced under `name`.
    ///
    /// An empty name returns `self` unchanged.
    #[must_use]
    pub fn with_group(self: &Arc<Self>, name: impl Into<String>) -> Arc<Self> {
        let name = name.into();
        if name.is_empty() {
            return Arc::clone(self);
        }

        Arc::new(Self {
            parent: Some(Arc::clone(self)),
            group: Some(name),
            prefix: None,
            attrs: Vec::new(),
        })
    }

    /// Derives a scope adding a message-prefix fragment.
    #[must_use]
    pub fn with_prefix(self: &Arc<Self>, fragment: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            parent: Some(Arc::clone(self)),
            group: None,
            prefix: Some(fragment.into()),
            attrs: Vec::new(),
        })
    }

    /// Returns the parent scope, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&Arc<Scope>> {
        self.parent.as_ref()
    }

    /// Number of links from the root to this scope.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut node = self;
        while let Some(parent) = node.parent.as_deref() {
            depth += 1;
            node = parent;
        }
        depth
    }

    /// Returns the chain from the root down to this scope.
    #[must_use]
    pub fn lineage(&self) -> Vec<&Scope> {
        let mut lineage = Vec::with_capacity(8);
        let mut node = Some(self);
        while let Some(scope) = node {
            lineage.push(scope);
            node = scope.parent.as_deref();
        }
        lineage.reverse();
        lineage
    }

    /// Replays the chain root to leaf into `visitor`.
    ///
    /// Returns the group path in effect at this scope, which applies to
    /// attributes supplied at the call site.
    pub fn visit(&self, visitor: &mut impl Visit) -> String {
        let mut group_path = String::new();
        for scope in self.lineage() {
            if let Some(group) = &scope.group {
                group_path.push_str(group);
                group_path.push(GROUP_DELIMITER);
            }
            if let Some(fragment) = &scope.prefix {
                visitor.prefix(fragment);
            }
            for attr in &scope.attrs {
                visitor.attr(&group_path, attr);
            }
        }
        group_path
    }

    /// Returns the concatenated prefix fragments of the whole chain.
    #[must_use]
    pub fn message_prefix(&self) -> String {
        self.lineage()
            .into_iter()
            .filter_map(|scope| scope.prefix.as_deref())
            .collect()
    }

    /// Returns the accumulated group path, e.g. `g1.g2.`.
    #[must_use]
    pub fn group_path(&self) -> String {
        let mut path = String::new();
        for group in self.lineage().into_iter().filter_map(|s| s.group.as_deref()) {
            path.push_str(group);
            path.push(GROUP_DELIMITER);
        }
        path
    }
}

/// Prepends `prefix` to `message`, separated by a single space.
#[must_use]
pub fn join_message<'a>(prefix: &str, message: &'a str) -> Cow<'a, str> {
    if prefix.is_empty() {
        Cow::Borrowed(message)
    } else {
        Cow::Owned(format!("{prefix} {message}"))
    }
}

/// Fully qualified key/value table with "first seen, last value wins"
/// ordering.
///
/// A key keeps the position of its first insertion; re-inserting it only
/// replaces the value.
#[derive(Debug, Clone, Default)]
pub struct FieldTable {
    entries: Vec<(String, Value)>,
    index: HashMap<String, usize>,
}

impl FieldTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `key`.
    pub fn insert(&mut self, key: String, value: Value) {
        if let Some(&slot) = self.index.get(&key) {
            self.entries[slot].1 = value;
            return;
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
    }

    /// Inserts an attribute under `group_path`, flattening group values.
    ///
    /// Prefix fragments nested in a group are skipped.
    pub fn insert_attr(&mut self, group_path: &str, attr: &Attr) {
        match &attr.value {
            Value::Group(members) => {
                let mut nested = String::with_capacity(group_path.len() + attr.key.len() + 1);
                nested.push_str(group_path);
                if !attr.key.is_empty() {
                    nested.push_str(&attr.key);
                    nested.push(GROUP_DELIMITER);
                }
                for member in members.iter().filter(|m| !m.is_prefix()) {
                    self.insert_attr(&nested, member);
                }
            }
            value => {
                let mut key = String::with_capacity(group_path.len() + attr.key.len());
                key.push_str(group_path);
                key.push_str(&attr.key);
                self.insert(key, value.clone());
            }
        }
    }

    /// Moves the value stored under `from` to `to`, keeping its position.
    ///
    /// If `to` already exists, it takes the moved value and the `from`
    /// slot is removed.
    pub fn rename(&mut self, from: &str, to: &str) {
        let Some(slot) = self.index.remove(from) else {
            return;
        };
        if let Some(&existing) = self.index.get(to) {
            let (_, value) = self.entries.remove(slot);
            let target = if existing > slot { existing - 1 } else { existing };
            self.entries[target].1 = value;
            self.reindex();
            return;
        }
        self.entries[slot].0 = to.to_string();
        self.index.insert(to.to_string(), slot);
    }

    /// Sorts entries by key.
    pub fn sort(&mut self) {
        self.entries.sort_by(|a, b| a.0.cmp(&b.0));
        self.reindex();
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in display order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (slot, (key, _)) in self.entries.iter().enumerate() {
            self.index.insert(key.clone(), slot);
        }
    }
}

impl Visit for FieldTable {
    fn prefix(&mut self, _fragment: &str) {}

    fn attr(&mut self, group_path: &str, attr: &Attr) {
        self.insert_attr(group_path, attr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Collect {
        prefix: String,
        fields: Vec<String>,
    }

    impl Visit for Collect {
        fn prefix(&mut self, fragment: &str) {
            self.prefix.push_str(fragment);
        }

        fn attr(&mut self, group_path: &str, attr: &Attr) {
            self.fields.push(format!("{group_path}{}={}", attr.key, attr.value));
        }
    }

    #[test]
    fn test_root_is_empty() {
        let root = Scope::root();
        assert_eq!(root.depth(), 0);
        assert_eq!(root.message_prefix(), "");
        assert_eq!(root.group_path(), "");
    }

    #[test]
    fn test_visit_order_is_root_to_leaf() {
        let scope = Scope::root()
            .with_field("a", 1)
            .with_group("g1")
            .with_field("b", 2)
            .with_group("g2")
            .with_field("c", 3);

        let mut collect = Collect::default();
        let path = scope.visit(&mut collect);

        assert_eq!(collect.fields, vec!["a=1", "g1.b=2", "g1.g2.c=3"]);
        assert_eq!(path, "g1.g2.");
        assert_eq!(scope.group_path(), "g1.g2.");
    }

    #[test]
    fn test_prefix_fragments_concatenate() {
        let scope = Scope::root()
            .with_prefix("[a]")
            .with_field("k", "v")
            .with_prefix("[b]");
        assert_eq!(scope.message_prefix(), "[a][b]");
    }

    #[test]
    fn test_prefix_key_is_not_a_field() {
        let scope = Scope::root().with_attrs(vec![Attr::prefix("[p]"), Attr::new("k", "v")]);

        let mut collect = Collect::default();
        scope.visit(&mut collect);

        assert_eq!(collect.prefix, "[p]");
        assert_eq!(collect.fields, vec!["k=v"]);
    }

    #[test]
    fn test_parent_is_untouched_by_children() {
        let base = Scope::root().with_field("base", true);
        let left = base.with_field("side", "left");
        let right = base.with_prefix("[r]").with_group("g");

        let mut collect = Collect::default();
        base.visit(&mut collect);
        assert_eq!(collect.fields, vec!["base=true"]);
        assert_eq!(base.message_prefix(), "");

        assert_eq!(left.depth(), 2);
        assert_eq!(right.group_path(), "g.");
        assert!(Arc::ptr_eq(left.parent().unwrap(), &base));
    }

    #[test]
    fn test_empty_derivations_share_the_node() {
        let base = Scope::root().with_field("k", 1);
        assert!(Arc::ptr_eq(&base.with_attrs(Vec::new()), &base));
        assert!(Arc::ptr_eq(&base.with_group(""), &base));
    }

    #[test]
    fn test_join_message() {
        assert_eq!(join_message("", "hello"), "hello");
        assert_eq!(join_message("[id]", "hello"), "[id] hello");
    }

    #[test]
    fn test_field_table_first_seen_last_wins() {
        let mut table = FieldTable::new();
        table.insert("b".into(), Value::from(1));
        table.insert("a".into(), Value::from(2));
        table.insert("b".into(), Value::from(3));

        let entries: Vec<_> = table.iter().map(|(k, v)| format!("{k}={v}")).collect();
        assert_eq!(entries, vec!["b=3", "a=2"]);

        table.sort();
        let entries: Vec<_> = table.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(entries, vec!["a", "b"]);
        assert_eq!(table.get("b"), Some(&Value::from(3)));
    }

    #[test]
    fn test_field_table_flattens_groups() {
        let mut table = FieldTable::new();
        table.insert_attr(
            "g.",
            &Attr::group("req", vec![Attr::new("m", "GET"), Attr::group("", vec![Attr::new("x", 1)])]),
        );
        let keys: Vec<_> = table.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["g.req.m", "g.req.x"]);
    }

    #[test]
    fn test_field_table_skips_nested_prefix() {
        let mut table = FieldTable::new();
        table.insert_attr("", &Attr::group("g", vec![Attr::prefix("[x]"), Attr::new("k", 1)]));
        let keys: Vec<_> = table.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["g.k"]);
    }

    #[test]
    fn test_field_table_rename() {
        let mut table = FieldTable::new();
        table.insert("level".into(), Value::from(1));
        table.insert("other".into(), Value::from(2));
        table.rename("level", "fields.level");

        let keys: Vec<_> = table.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["fields.level", "other"]);
        assert!(!table.contains("level"));

        table.rename("missing", "whatever");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_field_table_rename_onto_existing_key() {
        let mut table = FieldTable::new();
        table.insert("fields.msg".into(), Value::from("old"));
        table.insert("x".into(), Value::from(0));
        table.insert("msg".into(), Value::from("new"));
        table.rename("msg", "fields.msg");

        let entries: Vec<_> = table.iter().map(|(k, v)| format!("{k}={v}")).collect();
        assert_eq!(entries, vec!["fields.msg=new", "x=0"]);
        assert_eq!(table.get("x"), Some(&Value::from(0)));
    }
}
