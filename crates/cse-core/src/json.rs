use serde_json::{Map, Value, json};

use crate::script::NodeRef;

#[derive(Clone, Copy)]
pub struct JsonOpts {
    pub max_children: usize,
    pub max_depth: usize,
    /// Emit `$span` byte ranges for every node.
    pub spans: bool,
}

impl Default for JsonOpts {
    fn default() -> Self {
        Self {
            max_children: 128,
            max_depth: 16,
            spans: false,
        }
    }
}

/// Renders `node` and its subtree. Children become an array rather than an
/// object so duplicate names and anonymous members survive the conversion.
pub fn node_to_json_value(node: NodeRef<'_>, opts: JsonOpts) -> Value {
    write_node(node, 0, &opts)
}

fn write_node(node: NodeRef<'_>, depth: usize, opts: &JsonOpts) -> Value {
    let mut map = Map::new();
    if let Some(name) = node.name() {
        map.insert("$name".to_string(), json!(name));
    }
    if let Some(value) = node.value() {
        map.insert("$value".to_string(), json!(value));
    }
    if opts.spans {
        let s = node.span();
        map.insert("$span".to_string(), json!([s.start, s.end]));
    }
    if node.is_block() || node.is_root() {
        if depth >= opts.max_depth {
            map.insert("$children".to_string(), Value::Null);
        } else {
            let total = node.child_count();
            let max = opts.max_children.min(total);
            let mut arr: Vec<Value> = node
                .children()
                .take(max)
                .map(|c| write_node(c, depth + 1, opts))
                .collect();
            if total > max {
                arr.push(json!({"$truncated": true, "$omitted": total - max}));
            }
            map.insert("$children".to_string(), Value::Array(arr));
        }
    }
    Value::Object(map)
}

pub fn dump_node_json(node: NodeRef<'_>, opts: JsonOpts) -> String {
    serde_json::to_string_pretty(&node_to_json_value(node, opts)).unwrap_or_default()
}
