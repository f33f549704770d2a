use serde_json::Value;
use tracing::debug;

use super::catalog::{default_edge_attributes, default_population_attributes};
use super::model::{
    Attributes, GlobalParam, GraphLevel, NodeKind, PanelState, ParamKind, Position, SchemaEdge,
    SchemaNode, SchemaTree, Viewport, merge_shallow,
};
use super::store::{get_level, replace_level};
use super::template::hand_over_template;

/// 전역 파라미터를 가리키는 예약 요소 ID.
pub const GLOBAL_SCOPE_ID: &str = "global";

/// 노드 목록에 대한 증분 변경.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeChange {
    /// 위치 이동.
    Position { id: String, position: Position },
    /// 선택 상태 변경.
    Select { id: String, selected: bool },
    /// 노드 삭제. 연결된 엣지도 함께 지워진다.
    Remove { id: String },
    /// 완성된 노드 추가.
    Add { node: SchemaNode },
}

/// 엣지 목록에 대한 증분 변경.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeChange {
    /// 선택 상태 변경.
    Select { id: String, selected: bool },
    /// 엣지 삭제.
    Remove { id: String },
    /// 완성된 엣지 추가. 양 끝점이 같은 레벨에 있어야 한다.
    Add { edge: SchemaEdge },
}

/// 현재 레벨 복사본을 수정한 뒤 변경이 있을 때만 트리를 다시 만든다.
fn with_level<F>(tree: &SchemaTree, path: &[String], edit: F) -> SchemaTree
where
    F: FnOnce(&mut GraphLevel) -> bool,
{
    let mut level = (*get_level(tree, path)).clone();
    if edit(&mut level) {
        replace_level(tree, path, level)
    } else {
        tree.clone()
    }
}

/// 노드 위치/선택/삭제/추가 변경을 현재 레벨에 반영한다.
pub fn apply_node_changes(
    tree: &SchemaTree,
    path: &[String],
    changes: &[NodeChange],
) -> SchemaTree {
    with_level(tree, path, |level| {
        let mut changed = false;
        for change in changes {
            changed |= apply_node_change(level, change);
        }
        changed
    })
}

fn apply_node_change(level: &mut GraphLevel, change: &NodeChange) -> bool {
    match change {
        NodeChange::Position { id, position } => match level.node_mut(id) {
            Some(node) if node.position != *position => {
                node.position = *position;
                true
            }
            Some(_) => false,
            None => ignored("node", id),
        },
        NodeChange::Select { id, selected } => match level.node_mut(id) {
            Some(node) if node.selected != *selected => {
                node.selected = *selected;
                true
            }
            Some(_) => false,
            None => ignored("node", id),
        },
        NodeChange::Remove { id } => match level.remove_node(id) {
            Some(removed) => {
                hand_over_template(level, &removed);
                true
            }
            None => ignored("node", id),
        },
        NodeChange::Add { node } => {
            if level.node(&node.id).is_some() {
                return ignored("node", &node.id);
            }
            level.nodes.push(node.clone());
            true
        }
    }
}

/// 엣지 선택/삭제/추가 변경을 현재 레벨에 반영한다.
pub fn apply_edge_changes(
    tree: &SchemaTree,
    path: &[String],
    changes: &[EdgeChange],
) -> SchemaTree {
    with_level(tree, path, |level| {
        let mut changed = false;
        for change in changes {
            changed |= apply_edge_change(level, change);
        }
        changed
    })
}

fn apply_edge_change(level: &mut GraphLevel, change: &EdgeChange) -> bool {
    match change {
        EdgeChange::Select { id, selected } => match level.edge_mut(id) {
            Some(edge) if edge.selected != *selected => {
                edge.selected = *selected;
                true
            }
            Some(_) => false,
            None => ignored("edge", id),
        },
        EdgeChange::Remove { id } => {
            let before = level.edges.len();
            level.edges.retain(|edge| edge.id != *id);
            level.edges.len() != before || ignored("edge", id)
        }
        EdgeChange::Add { edge } => {
            let endpoints_exist = level.node(&edge.source_node_id).is_some()
                && level.node(&edge.target_node_id).is_some();
            if !endpoints_exist || level.edge(&edge.id).is_some() {
                return ignored("edge", &edge.id);
            }
            level.edges.push(edge.clone());
            true
        }
    }
}

/// 같은 ID의 노드를 통째로 바꾼다. 순서(z-order)는 유지된다.
pub fn replace_node(tree: &SchemaTree, path: &[String], node: SchemaNode) -> SchemaTree {
    with_level(tree, path, |level| match level.node_mut(&node.id) {
        Some(slot) if *slot != node => {
            *slot = node;
            true
        }
        Some(_) => false,
        None => ignored("node", &node.id),
    })
}

/// 두 노드를 기본 속성의 엣지로 잇는다. 같은 쌍의 평행 엣지를 허용한다.
pub fn connect(
    tree: &SchemaTree,
    path: &[String],
    edge_id: &str,
    source_id: &str,
    target_id: &str,
) -> SchemaTree {
    let mut edge = SchemaEdge::new(edge_id, source_id, target_id);
    edge.attributes = default_edge_attributes();
    apply_edge_changes(tree, path, &[EdgeChange::Add { edge }])
}

/// 현재 레벨 좌표 `position`에 새 노드를 만든다.
///
/// Population은 기본 뉴런 모델 파라미터를, Group은 빈 하위 그래프를 받는다.
pub fn create_node(
    tree: &SchemaTree,
    path: &[String],
    node_id: &str,
    position: Position,
    kind: NodeKind,
) -> SchemaTree {
    let mut node = SchemaNode::new(node_id, kind, position);
    if kind == NodeKind::Population {
        merge_shallow(&mut node.attributes, &default_population_attributes());
    }
    apply_node_changes(tree, path, &[NodeChange::Add { node }])
}

/// 노드나 엣지의 속성에 부분 속성을 얕게 병합한다.
///
/// `GLOBAL_SCOPE_ID`는 경로와 무관하게 전역 파라미터로 병합된다.
pub fn update_element_attributes(
    tree: &SchemaTree,
    path: &[String],
    element_id: &str,
    partial: &Attributes,
) -> SchemaTree {
    if element_id == GLOBAL_SCOPE_ID {
        return merge_global_parameters(tree, partial);
    }
    with_level(tree, path, |level| {
        if let Some(node) = level.node_mut(element_id) {
            merge_shallow(&mut node.attributes, partial);
            true
        } else if let Some(edge) = level.edge_mut(element_id) {
            merge_shallow(&mut edge.attributes, partial);
            true
        } else {
            ignored("element", element_id)
        }
    })
}

fn merge_global_parameters(tree: &SchemaTree, partial: &Attributes) -> SchemaTree {
    let mut next = tree.clone();
    for (name, value) in partial {
        upsert_global(&mut next.global_parameters, name, value);
    }
    next
}

fn upsert_global(params: &mut Vec<GlobalParam>, name: &str, value: &Value) {
    let kind = ParamKind::infer(value);
    match params.iter_mut().find(|param| param.name == name) {
        Some(param) => {
            param.value = value.clone();
            param.kind = kind;
        }
        None => params.push(GlobalParam {
            name: name.to_string(),
            kind,
            value: value.clone(),
        }),
    }
}

/// 전역 파라미터 하나를 이름으로 지운다.
pub fn remove_global_parameter(tree: &SchemaTree, name: &str) -> SchemaTree {
    let mut next = tree.clone();
    next.global_parameters.retain(|param| param.name != name);
    next
}

/// 현재 레벨의 뷰포트만 갱신한다.
pub fn update_viewport(tree: &SchemaTree, path: &[String], viewport: Viewport) -> SchemaTree {
    with_level(tree, path, |level| {
        if level.viewport == viewport {
            return false;
        }
        level.viewport = viewport;
        true
    })
}

/// 루트 패널 상태를 갱신한다.
pub fn update_panel_state(tree: &SchemaTree, state: PanelState) -> SchemaTree {
    SchemaTree {
        panel_state: state,
        ..tree.clone()
    }
}

fn ignored(kind: &str, id: &str) -> bool {
    debug!(element = kind, id = %id, "존재하지 않는 요소에 대한 변경 무시");
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::model::{LABEL_KEY, NEURON_TYPE_KEY, PROJECTION_TYPE_KEY, single};
    use serde_json::json;
    use std::sync::Arc;

    fn path(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn two_node_tree() -> SchemaTree {
        let tree = SchemaTree::new("t");
        let tree = create_node(&tree, &[], "a", Position::new(0.0, 0.0), NodeKind::Input);
        create_node(&tree, &[], "b", Position::new(100.0, 0.0), NodeKind::Population)
    }

    #[test]
    fn removing_a_connected_node_drops_its_edges() {
        let tree = connect(&two_node_tree(), &[], "e1", "a", "b");
        assert_eq!(tree.root.edges.len(), 1);

        let tree = apply_node_changes(&tree, &[], &[NodeChange::Remove { id: "a".into() }]);

        assert!(tree.root.node("a").is_none());
        assert!(tree.root.edges.is_empty());
        assert!(tree.root.node("b").is_some());
    }

    #[test]
    fn connect_allows_parallel_edges_with_default_attributes() {
        let tree = connect(&two_node_tree(), &[], "e1", "a", "b");
        let tree = connect(&tree, &[], "e2", "a", "b");
        assert_eq!(tree.root.edges.len(), 2);
        assert_eq!(
            tree.root.edges[0].attributes[PROJECTION_TYPE_KEY],
            json!("DeltaSynapse")
        );
    }

    #[test]
    fn connect_ignores_dangling_endpoints() {
        let tree = two_node_tree();
        let next = connect(&tree, &[], "e1", "a", "ghost");
        assert!(next.is_same(&tree));
    }

    #[test]
    fn created_nodes_carry_kind_defaults() {
        let tree = two_node_tree();
        let tree = create_node(&tree, &[], "g", Position::default(), NodeKind::Group);
        let population = tree.root.node("b").expect("노드 없음");
        assert_eq!(population.attributes[NEURON_TYPE_KEY], json!("BLIFATNeuron"));
        assert_eq!(population.label(), "Population");
        let group = tree.root.node("g").expect("노드 없음");
        assert!(group.subgraph.as_ref().is_some_and(|sub| sub.is_empty()));
    }

    #[test]
    fn scoped_mutations_reach_nested_levels_only() {
        let tree = create_node(
            &SchemaTree::new("t"),
            &[],
            "g1",
            Position::default(),
            NodeKind::Group,
        );
        let tree = create_node(
            &tree,
            &path(&["g1"]),
            "in",
            Position::new(5.0, 5.0),
            NodeKind::Input,
        );

        assert_eq!(tree.root.nodes.len(), 1);
        let inner = get_level(&tree, &path(&["g1"]));
        assert_eq!(inner.nodes.len(), 1);
        assert_eq!(inner.nodes[0].id, "in");
    }

    #[test]
    fn position_and_selection_changes_merge_into_the_level() {
        let tree = apply_node_changes(
            &two_node_tree(),
            &[],
            &[
                NodeChange::Position {
                    id: "a".into(),
                    position: Position::new(7.0, 8.0),
                },
                NodeChange::Select {
                    id: "b".into(),
                    selected: true,
                },
            ],
        );
        assert_eq!(tree.root.node("a").map(|n| n.position), Some(Position::new(7.0, 8.0)));
        assert_eq!(tree.root.node("b").map(|n| n.selected), Some(true));
    }

    #[test]
    fn unknown_ids_are_silent_no_ops() {
        let tree = two_node_tree();
        let next = apply_node_changes(&tree, &[], &[NodeChange::Remove { id: "zzz".into() }]);
        assert!(next.is_same(&tree));
        let next = update_element_attributes(&tree, &[], "zzz", &single(LABEL_KEY, "x"));
        assert!(next.is_same(&tree));
        let next = apply_edge_changes(&tree, &[], &[EdgeChange::Remove { id: "zzz".into() }]);
        assert!(next.is_same(&tree));
    }

    #[test]
    fn attribute_updates_merge_shallowly_into_nodes_and_edges() {
        let tree = connect(&two_node_tree(), &[], "e1", "a", "b");
        let tree = update_element_attributes(&tree, &[], "a", &single(LABEL_KEY, "Retina"));
        let tree = update_element_attributes(&tree, &[], "e1", &single("animated", true));
        assert_eq!(tree.root.node("a").map(|n| n.label()), Some("Retina"));
        let edge = tree.root.edge("e1").expect("엣지 없음");
        assert_eq!(edge.attributes["animated"], json!(true));
        assert_eq!(edge.attributes[PROJECTION_TYPE_KEY], json!("DeltaSynapse"));
    }

    #[test]
    fn global_updates_never_touch_any_level() {
        let tree = create_node(&two_node_tree(), &[], "g1", Position::default(), NodeKind::Group);
        let tree = create_node(&tree, &path(&["g1"]), "in", Position::default(), NodeKind::Input);

        let mut partial = Attributes::new();
        partial.insert("dt".into(), json!(0.5));
        partial.insert("steps".into(), json!(100));
        let next = update_element_attributes(&tree, &path(&["g1"]), GLOBAL_SCOPE_ID, &partial);

        assert!(Arc::ptr_eq(&next.root, &tree.root));
        assert_eq!(next.global_parameters.len(), 2);
        let steps = next
            .global_parameters
            .iter()
            .find(|p| p.name == "steps")
            .expect("파라미터 없음");
        assert_eq!(steps.kind, ParamKind::Int);

        let next = update_element_attributes(&next, &[], GLOBAL_SCOPE_ID, &single("steps", "many"));
        assert_eq!(next.global_parameters.len(), 2);
        let steps = next.global_parameters.iter().find(|p| p.name == "steps");
        assert_eq!(steps.map(|p| p.kind), Some(ParamKind::Text));

        let next = remove_global_parameter(&next, "dt");
        assert_eq!(next.global_parameters.len(), 1);
    }

    #[test]
    fn viewport_updates_leave_nodes_and_edges_alone() {
        let tree = connect(&two_node_tree(), &[], "e1", "a", "b");
        let viewport = Viewport {
            offset_x: 12.0,
            offset_y: -3.0,
            zoom: 0.5,
        };
        let next = update_viewport(&tree, &[], viewport);
        assert_eq!(next.root.viewport, viewport);
        assert_eq!(next.root.nodes, tree.root.nodes);
        assert_eq!(next.root.edges, tree.root.edges);
        assert!(update_viewport(&next, &[], viewport).is_same(&next));
    }

    #[test]
    fn panel_state_is_stored_at_the_root() {
        let tree = two_node_tree();
        let state = PanelState {
            collapsed: true,
            width: 420.0,
        };
        let next = update_panel_state(&tree, state);
        assert_eq!(next.panel_state, state);
        assert!(Arc::ptr_eq(&next.root, &tree.root));
    }

    #[test]
    fn removing_a_template_keeps_children_alive() {
        let tree = create_node(
            &SchemaTree::new("t"),
            &[],
            "t",
            Position::default(),
            NodeKind::Group,
        );
        let tree = create_node(&tree, &path(&["t"]), "in", Position::default(), NodeKind::Input);
        let mut child = SchemaNode::new("c", NodeKind::Group, Position::default());
        child.parent_group_id = Some("t".into());
        child.subgraph = None;
        let tree = apply_node_changes(&tree, &[], &[NodeChange::Add { node: child }]);

        let tree = apply_node_changes(&tree, &[], &[NodeChange::Remove { id: "t".into() }]);

        let inner = get_level(&tree, &path(&["c"]));
        assert_eq!(inner.nodes.len(), 1);
        assert_eq!(inner.nodes[0].id, "in");
    }
}
