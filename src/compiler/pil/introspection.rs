//! Serializes the reconstructed parser graph into the introspection
//! document external tooling consumes. Pure: reads the pipeline, builds a
//! `serde_json` tree, touches nothing else.

use crate::compiler::pil::pil_nodes::Pipeline;
use crate::settings::ROOT_PARSE_NODE;
use serde_json::{Map, Value, json};

/// Reverse the byte order of `value` over its `bytes` least significant
/// bytes. Transition keys are emitted in wire order, which is byte-swapped
/// relative to the numeric literals in the source program.
pub fn invert_bytes(mut value: u128, bytes: u32) -> u128 {
    let mut inverted = 0u128;
    for _ in 0..bytes {
        inverted = (inverted << 8) | (value & 0xFF);
        value >>= 8;
    }
    inverted
}

fn key_literal(value: u128, bytes: u32) -> String {
    // Two lowercase hex digits per byte of the selector field
    let digits = (bytes as usize) * 2;
    format!("0x{:0digits$x}", invert_bytes(value, bytes))
}

/// Build the introspection document for a populated pipeline.
///
/// One "parse node" per state with an extraction record, and one
/// synthesized "proto table" per state with literal transitions; the
/// table a node's next-proto descriptor points at is `<state>_table`.
pub fn introspection_json(pipeline: &Pipeline, document_name: &str) -> Value {
    let graph = &pipeline.parser;

    let mut parse_nodes = Vec::new();
    for extract in &graph.extracts {
        let mut node = Map::new();
        node.insert("name".to_string(), json!(extract.state));
        node.insert("min-hdr-length".to_string(), json!(extract.header_bytes));

        if let Some(selector) = graph.selector_for(&extract.state) {
            node.insert(
                "next-proto".to_string(),
                json!({
                    "field-off": selector.field_offset,
                    "field-len": selector.field_len,
                    "table": format!("{}_table", extract.state),
                }),
            );
        }

        node.insert(
            "metadata".to_string(),
            json!({
                "ents": [{
                    "name": extract.field,
                    "type": "extract",
                    "md-off": extract.field_offset,
                    "hdr-src-off": 0,
                    "length": extract.header_bytes,
                }]
            }),
        );

        parse_nodes.push(Value::Object(node));
    }

    let mut proto_tables = Vec::new();
    for transitions in &graph.transitions {
        // The transition keys are sized by the field the state branches
        // on; a state can't have transitions without a selector
        let Some(selector) = graph.selector_for(&transitions.state) else {
            continue;
        };

        let entries: Vec<Value> = transitions
            .entries
            .iter()
            .map(|entry| {
                json!({
                    "node": entry.next_state,
                    "key": key_literal(entry.value, selector.field_len),
                })
            })
            .collect();

        proto_tables.push(json!({
            "name": format!("{}_table", transitions.state),
            "ents": entries,
        }));
    }

    json!({
        "parsers": {
            "name": document_name,
            "root-node": ROOT_PARSE_NODE,
        },
        "parse-nodes": parse_nodes,
        "proto-tables": proto_tables,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_reversal() {
        assert_eq!(invert_bytes(0x0800, 2), 0x0008);
        assert_eq!(invert_bytes(0x0806, 2), 0x0608);
        assert_eq!(invert_bytes(0x11, 1), 0x11);
        assert_eq!(invert_bytes(0xAABBCCDD, 4), 0xDDCCBBAA);
        // Only the covered bytes survive the swap
        assert_eq!(invert_bytes(0x01_0203, 2), 0x0302);
    }

    #[test]
    fn keys_are_padded_to_the_field_length() {
        assert_eq!(key_literal(0x0800, 2), "0x0008");
        assert_eq!(key_literal(0x0806, 2), "0x0608");
        assert_eq!(key_literal(0x6, 1), "0x06");
    }
}
