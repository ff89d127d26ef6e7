//! Render a `JoinPlan` as an execution-plan tree.
//!
//! Pure and deterministic: identical plans produce identical trees and
//! identical rendered text (params live in a `BTreeMap` for stable order).
//! Used for testing and debugging, never for execution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use riffle_core::config::JoinSide;

use crate::estimate::SizeEstimate;
use crate::plan::{JoinPlan, JoinStrategy};

/// One node of the rendered physical plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanNode {
    pub name: String,
    pub params: BTreeMap<String, String>,
    pub children: Vec<PlanNode>,
}

impl PlanNode {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            params: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    fn child(mut self, node: PlanNode) -> Self {
        self.children.push(node);
        self
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn fmt_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;
    const GIB: u64 = 1024 * MIB;
    if bytes >= GIB {
        format!("{:.1} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn fmt_estimate(est: &Option<SizeEstimate>) -> String {
    match est {
        Some(e) => format!("{} ({})", fmt_bytes(e.bytes), e.source),
        None => "unknown".to_string(),
    }
}

fn fmt_keys(plan: &JoinPlan) -> String {
    let pairs: Vec<String> = plan
        .key
        .0
        .iter()
        .map(|(l, r)| format!("({}, {})", l, r))
        .collect();
    format!("[{}]", pairs.join(", "))
}

/// Joined output column list, with the `_right` collision suffixes the
/// output schema applies.
fn fmt_output(plan: &JoinPlan) -> String {
    let names: Vec<String> = plan
        .output_schema()
        .fields
        .iter()
        .map(|f| f.name.clone())
        .collect();
    format!("[{}]", names.join(", "))
}

fn scan_node(id: &str, arity: usize) -> PlanNode {
    PlanNode::new("Scan")
        .param("relation", id)
        .param("columns", arity.to_string())
}

/// Build the execution-plan tree for `plan`.
///
/// Broadcast-hash: the build side sits under a broadcast `Exchange`; the
/// probe side streams in place. Sort-merge: both sides sit under
/// hash-partition `Exchange` nodes.
pub fn explain(plan: &JoinPlan) -> PlanNode {
    let left_scan = scan_node(&plan.left.id, plan.left.schema.arity());
    let right_scan = scan_node(&plan.right.id, plan.right.schema.arity());

    let mut root = PlanNode::new(&plan.strategy.to_string())
        .param("keys", fmt_keys(plan))
        .param("left_estimate", fmt_estimate(&plan.left_estimate))
        .param("right_estimate", fmt_estimate(&plan.right_estimate))
        .param("output", fmt_output(plan));

    if let Ok(fp) = plan.fingerprint() {
        root = root.param("plan_id", &fp.to_hex()[..16]);
    }

    match plan.strategy {
        JoinStrategy::BroadcastHashJoin => {
            let side = plan.broadcast_side.unwrap_or(JoinSide::Right);
            root = root.param("build", side.to_string());
            let wrap = |scan: PlanNode| PlanNode::new("Exchange").param("mode", "broadcast").child(scan);
            match side {
                JoinSide::Left => root.child(wrap(left_scan)).child(right_scan),
                JoinSide::Right => root.child(left_scan).child(wrap(right_scan)),
            }
        }
        JoinStrategy::SortMergeJoin => {
            let wrap = |scan: PlanNode| {
                PlanNode::new("Exchange")
                    .param("mode", "hash-partition")
                    .child(scan)
            };
            root.child(wrap(left_scan)).child(wrap(right_scan))
        }
    }
}

/// Indented text rendering of a plan tree.
pub fn render(node: &PlanNode) -> String {
    let mut out = String::new();
    render_into(node, 0, &mut out);
    out
}

fn render_into(node: &PlanNode, depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(&node.name);
    if !node.params.is_empty() {
        let params: Vec<String> = node
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        out.push_str(&format!(" [{}]", params.join(", ")));
    }
    out.push('\n');
    for child in &node.children {
        render_into(child, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::EstimateSource;
    use crate::plan::JoinKey;
    use riffle_core::relation::RelationDesc;
    use riffle_core::schema::{DataType, Field, Schema};

    fn sample_plan(strategy: JoinStrategy, side: Option<JoinSide>) -> JoinPlan {
        let schema = Schema::new(vec![Field::new("id", DataType::Int64, false)]);
        JoinPlan {
            strategy,
            broadcast_side: side,
            key: JoinKey::on(&[("id", "id")]),
            left: RelationDesc {
                id: "orders".into(),
                schema: schema.clone(),
            },
            right: RelationDesc {
                id: "lookup".into(),
                schema,
            },
            left_estimate: Some(SizeEstimate {
                relation: "orders".into(),
                bytes: 5 * 1024 * 1024,
                source: EstimateSource::Approx,
            }),
            right_estimate: Some(SizeEstimate {
                relation: "lookup".into(),
                bytes: 64,
                source: EstimateSource::Exact,
            }),
        }
    }

    #[test]
    fn broadcast_plan_exchanges_only_the_build_side() {
        let tree = explain(&sample_plan(
            JoinStrategy::BroadcastHashJoin,
            Some(JoinSide::Right),
        ));
        assert_eq!(tree.name, "BroadcastHashJoin");
        assert_eq!(tree.params["build"], "right");
        assert_eq!(tree.children[0].name, "Scan");
        assert_eq!(tree.children[1].name, "Exchange");
        assert_eq!(tree.children[1].params["mode"], "broadcast");
    }

    #[test]
    fn sort_merge_plan_exchanges_both_sides() {
        let tree = explain(&sample_plan(JoinStrategy::SortMergeJoin, None));
        assert_eq!(tree.name, "SortMergeJoin");
        for child in &tree.children {
            assert_eq!(child.name, "Exchange");
            assert_eq!(child.params["mode"], "hash-partition");
        }
    }

    #[test]
    fn output_columns_carry_collision_suffixes() {
        let tree = explain(&sample_plan(JoinStrategy::SortMergeJoin, None));
        assert_eq!(tree.params["output"], "[id, id_right]");
    }

    #[test]
    fn explain_is_deterministic() {
        let plan = sample_plan(JoinStrategy::BroadcastHashJoin, Some(JoinSide::Right));
        assert_eq!(explain(&plan), explain(&plan));
        assert_eq!(render(&explain(&plan)), render(&explain(&plan)));
    }

    #[test]
    fn rendered_text_includes_estimates_and_tags() {
        let text = render(&explain(&sample_plan(
            JoinStrategy::BroadcastHashJoin,
            Some(JoinSide::Right),
        )));
        assert!(text.contains("5.0 MiB (approx)"));
        assert!(text.contains("64 B (exact)"));
        assert!(text.contains("keys=[(id, id)]"));
    }
}
