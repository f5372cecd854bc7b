use super::dupath::{DuKind, DuStep};
use super::types::{FlowGraph, FlowNode};

fn graph(source: &str, name: &str) -> FlowGraph {
    FlowGraph::from_source(source, name).unwrap()
}

fn find<'a>(node: &'a FlowNode, pred: &dyn Fn(&FlowNode) -> bool) -> Option<&'a FlowNode> {
    if pred(node) {
        return Some(node);
    }
    node.children.iter().find_map(|c| find(c, pred))
}

fn by_id(graph: &FlowGraph, id: usize) -> &FlowNode {
    find(&graph.root, &|n| n.id == Some(id)).unwrap()
}

fn by_code<'a>(graph: &'a FlowGraph, fragment: &str) -> &'a FlowNode {
    find(&graph.root, &|n| {
        n.id.is_some() && n.code.iter().any(|c| c.contains(fragment))
    })
    .unwrap()
}

const IF_ELSE: &str = "int f(int x) {\n    int y;\n    if (x > 0) {\n        y = 1;\n    } else {\n        y = 2;\n    }\n    return y;\n}\n";

#[test]
fn if_else_anchors_condition_branches_and_return() {
    let g = graph(IF_ELSE, "f");
    assert_eq!(g.split_lines(), vec![2, 3, 4, 6, 8]);
}

#[test]
fn for_loop_is_one_anchor_plus_body() {
    let source = "void g(int n) {\n    for (int i = 0; i < n; i++) {\n        sum += i;\n    }\n}\n";
    let g = graph(source, "g");
    assert_eq!(g.split_lines(), vec![2, 3]);
}

#[test]
fn do_while_anchors_both_do_and_while_lines() {
    let source = "void h(int x) {\n    do {\n        x++;\n    } while (x < 10);\n}\n";
    let g = graph(source, "h");
    assert_eq!(g.split_lines(), vec![2, 3, 4]);
}

#[test]
fn empty_body_yields_no_lines_and_no_error() {
    let g = graph("void e() {}\n", "e");
    assert_eq!(g.split_lines(), Vec::<usize>::new());
    assert!(g.root.is_entry);
}

#[test]
fn straight_line_run_merges_to_first_line() {
    let source = "void m(int a) {\n    int b = a;\n    b = b + 1;\n    a = b;\n}\n";
    let g = graph(source, "m");
    assert_eq!(g.split_lines(), vec![2]);
    let run = by_code(&g, "int b = a");
    assert_eq!(run.code.len(), 3);
    assert_eq!(run.code[1], "b = b + 1");
}

#[test]
fn while_header_has_body_and_exit_successors() {
    let source = "void w(int x) {\n    while (x > 0) {\n        x--;\n    }\n    return;\n}\n";
    let g = graph(source, "w");
    let header = by_code(&g, "while (x > 0)");
    assert_eq!(header.successors.len(), 2);
    let body = by_id(&g, header.successors[0]);
    assert_eq!(body.code, vec!["x --"]);
    let after = by_id(&g, header.successors[1]);
    assert_eq!(after.code, vec!["return"]);
    // Body loops back to the header.
    assert_eq!(body.successors, vec![header.id.unwrap()]);
}

#[test]
fn continue_targets_enclosing_loop_header() {
    let source = "void c(int n) {\n    while (n) {\n        continue;\n    }\n}\n";
    let g = graph(source, "c");
    let header = by_code(&g, "while (n)");
    let cont = by_code(&g, "continue");
    assert_eq!(cont.successors, vec![header.id.unwrap()]);
}

#[test]
fn continue_outside_loop_fails_fast() {
    let err = FlowGraph::from_source("void c() {\n    continue;\n}\n", "c").unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("continue"), "unexpected message: {msg}");
    assert!(msg.contains("line 2"), "unexpected message: {msg}");
}

#[test]
fn branch_defines_form_one_alternative() {
    let g = graph(IF_ELSE, "f");
    let steps = &g.du.paths["y"];
    assert_eq!(steps.len(), 3);
    assert!(matches!(steps[0], DuStep::Leaf(_, DuKind::Define)));
    let DuStep::Alternative(arms) = &steps[1] else {
        panic!("expected alternative, got {:?}", steps[1]);
    };
    assert_eq!(arms.len(), 2);
    for arm in arms {
        let DuStep::Group(events) = arm else {
            panic!("expected group, got {arm:?}");
        };
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], DuStep::Leaf(_, DuKind::Define)));
    }
    assert!(matches!(steps[2], DuStep::Leaf(_, DuKind::Use)));
}

#[test]
fn condition_use_precedes_branch_events() {
    let g = graph(IF_ELSE, "f");
    let header = by_code(&g, "if (x > 0)");
    // `x` is defined by the parameter at the entry node (id 0) and then
    // used by the condition header before any branch runs.
    assert_eq!(
        g.du.paths["x"],
        vec![
            DuStep::Leaf(0, DuKind::Define),
            DuStep::Leaf(header.id.unwrap(), DuKind::Use),
        ]
    );
}

#[test]
fn loop_body_events_form_a_repetition() {
    let source = "void g(int n) {\n    while (n) {\n        n = n - 1;\n    }\n}\n";
    let g = graph(source, "g");
    let steps = &g.du.paths["n"];
    // Entry define, condition use, then the body as a repetition.
    assert!(matches!(steps[0], DuStep::Leaf(0, DuKind::Define)));
    assert!(matches!(steps[1], DuStep::Leaf(_, DuKind::Use)));
    let DuStep::Repetition(body) = &steps[2] else {
        panic!("expected repetition, got {:?}", steps[2]);
    };
    assert!(matches!(body[0], DuStep::Leaf(_, DuKind::DefineAndUse)));
}

const SWITCH: &str = "int s(int x) {\n    switch (x) {\n        case 1:\n            x = 10;\n            break;\n        case 2:\n            x = 20;\n        default:\n            x = 0;\n    }\n    return x;\n}\n";

#[test]
fn switch_header_targets_every_clause_in_source_order() {
    let g = graph(SWITCH, "s");
    let header = by_code(&g, "switch (x)");
    assert_eq!(header.successors.len(), 3);
    let labels: Vec<&str> = header
        .successors
        .iter()
        .map(|id| by_id(&g, *id).code[0].as_str())
        .collect();
    assert_eq!(labels, vec!["case 1 :", "case 2 :", "default :"]);
}

#[test]
fn switch_clause_falls_through_to_next_clause_body() {
    let g = graph(SWITCH, "s");
    let case2_body = by_code(&g, "x = 20");
    let default_body = by_code(&g, "x = 0");
    assert_eq!(case2_body.successors, vec![default_body.id.unwrap()]);
}

#[test]
fn break_jumps_past_the_switch() {
    let g = graph(SWITCH, "s");
    let brk = by_code(&g, "break");
    let after = by_code(&g, "return x");
    assert_eq!(brk.successors, vec![after.id.unwrap()]);
}

#[test]
fn switch_clause_events_stay_peer_groups() {
    let g = graph(SWITCH, "s");
    let steps = &g.du.paths["x"];
    // Entry define, condition use, three peer clause groups, return use.
    assert_eq!(steps.len(), 6);
    assert!(matches!(steps[0], DuStep::Leaf(0, DuKind::Define)));
    assert!(matches!(steps[1], DuStep::Leaf(_, DuKind::Use)));
    for step in &steps[2..5] {
        let DuStep::Group(events) = step else {
            panic!("expected group, got {step:?}");
        };
        assert!(matches!(events[0], DuStep::Leaf(_, DuKind::Define)));
    }
    assert!(matches!(steps[5], DuStep::Leaf(_, DuKind::Use)));
}

#[test]
fn repeated_builds_are_identical() {
    let first = graph(IF_ELSE, "f");
    let second = graph(IF_ELSE, "f");
    assert_eq!(first, second);
}

#[test]
fn split_lines_are_a_subset_of_source_lines() {
    for (source, name) in [(IF_ELSE, "f"), (SWITCH, "s")] {
        let g = graph(source, name);
        let lines: Vec<&str> = source.lines().collect();
        for line in g.split_lines() {
            let text = lines[line - 1].trim();
            assert!(!text.is_empty(), "split line {line} is blank");
        }
    }
}

#[test]
fn dot_output_labels_branch_outcomes() {
    let g = graph(IF_ELSE, "f");
    let dot = g.to_dot();
    assert!(dot.contains("label=\"True\""));
    assert!(dot.contains("label=\"False\""));
    assert!(dot.contains("shape=doublecircle"));
    assert!(dot.contains("shape=box"));
}
