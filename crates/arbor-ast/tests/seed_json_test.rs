// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Seed programs arrive from front ends as JSON; make sure the format is readable.

use arbor_ast::{BinaryOp, LanguageProfile, Node, NodeKind};

#[test]
fn test_parse_front_end_seed() {
    let json = r#"{
        "kind": "block",
        "children": [
            { "kind": "assign", "slot": 1, "children": [
                { "kind": "binary", "op": "mul", "children": [
                    { "kind": "variable", "slot": 0 },
                    { "kind": "literal", "value": { "int": 2 } }
                ]}
            ]},
            { "kind": "return", "children": [ { "kind": "variable", "slot": 1 } ] }
        ]
    }"#;

    let tree: Node = serde_json::from_str(json).unwrap();
    assert_eq!(tree.kind, NodeKind::Block);
    assert_eq!(tree.node_count(), 6);
    assert_eq!(
        tree.get(&[0, 0]).unwrap().kind,
        NodeKind::Binary { op: BinaryOp::Mul }
    );
    assert!(LanguageProfile::imperative().validate(&tree).is_ok());

    let rendered = serde_json::to_string(&tree).unwrap();
    let reparsed: Node = serde_json::from_str(&rendered).unwrap();
    assert_eq!(reparsed, tree);
}

#[test]
fn test_clone_is_independent() {
    let original = Node::binary(BinaryOp::Add, Node::var(0), Node::int(1));
    let mut copy = original.clone();
    copy.replace_at(&[1], Node::int(99)).unwrap();

    assert_eq!(original.to_string(), "(+ x0 1)");
    assert_eq!(copy.to_string(), "(+ x0 99)");
}
