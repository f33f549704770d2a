use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

use super::model::{
    Attributes, EditorError, GlobalParam, GraphLevel, LABEL_KEY, NodeKind, PanelState, ParamKind,
    Position, SchemaEdge, SchemaNode, SchemaTree, Viewport,
};
use crate::scheme::{
    DocEdge, DocGlobalParam, DocNode, DocNodeData, DocPosition, DocSubFlow, SchemeDocument,
};

/// 문서를 트리로 변환한 결과이다.
#[derive(Debug, Clone)]
pub struct LoadedTree {
    /// 정규화된 트리.
    pub tree: SchemaTree,
    /// 변환 중 버려지거나 보정된 항목.
    pub issues: Vec<EditorError>,
}

/// 문서를 스키마 트리로 변환한다.
///
/// 알 수 없는 노드 유형과 끝점이 없는 엣지는 버리고, `subFlow`도 `parent`도 없는 그룹에는
/// 빈 하위 그래프를 채운다. 버린 항목은 `issues`로 보고한다.
pub fn scheme_to_tree(doc: &SchemeDocument) -> LoadedTree {
    let mut issues = Vec::new();
    let root = level_from_doc(&doc.nodes, &doc.edges, doc.position, doc.zoom, &mut issues);
    let tree = SchemaTree {
        name: doc.name.clone(),
        root: Arc::new(root),
        global_parameters: doc.global_params.iter().map(global_from_doc).collect(),
        panel_state: PanelState {
            collapsed: doc.is_panel_collapsed,
            width: doc.panel_width as f32,
        },
        navigation_path: doc.flow_history_stack.clone(),
    };
    for issue in &issues {
        warn!("문서 정규화: {issue}");
    }
    LoadedTree { tree, issues }
}

fn level_from_doc(
    nodes: &[DocNode],
    edges: &[DocEdge],
    position: [f64; 2],
    zoom: f64,
    issues: &mut Vec<EditorError>,
) -> GraphLevel {
    let nodes: Vec<SchemaNode> = nodes
        .iter()
        .filter_map(|doc| node_from_doc(doc, issues))
        .collect();
    let known: HashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
    let edges = edges
        .iter()
        .filter_map(|doc| {
            if known.contains(doc.source.as_str()) && known.contains(doc.target.as_str()) {
                Some(edge_from_doc(doc))
            } else {
                issues.push(EditorError::DanglingEdge {
                    edge_id: doc.id.clone(),
                    source_id: doc.source.clone(),
                    target_id: doc.target.clone(),
                });
                None
            }
        })
        .collect();
    GraphLevel {
        nodes,
        edges,
        viewport: viewport_from_doc(position, zoom, issues),
    }
}

fn viewport_from_doc(position: [f64; 2], zoom: f64, issues: &mut Vec<EditorError>) -> Viewport {
    let zoom = if zoom.is_finite() && zoom > 0.0 {
        zoom as f32
    } else {
        issues.push(EditorError::InvalidZoom(zoom.to_string()));
        1.0
    };
    Viewport {
        offset_x: position[0] as f32,
        offset_y: position[1] as f32,
        zoom,
    }
}

fn node_from_doc(doc: &DocNode, issues: &mut Vec<EditorError>) -> Option<SchemaNode> {
    let kind = match doc.node_type.parse::<NodeKind>() {
        Ok(kind) => kind,
        Err(err) => {
            issues.push(err);
            return None;
        }
    };
    let mut attributes = doc.data.attributes.clone();
    normalize_label(&mut attributes, kind);

    let (subgraph, parent_group_id) = if kind == NodeKind::Group {
        let owned = doc.data.sub_flow.as_ref().map(|sub| {
            Arc::new(level_from_doc(&sub.nodes, &sub.edges, sub.position, sub.zoom, issues))
        });
        match &doc.data.parent {
            Some(parent) => (owned, Some(parent.clone())),
            None => (
                Some(owned.unwrap_or_else(|| Arc::new(GraphLevel::empty()))),
                None,
            ),
        }
    } else {
        (None, None)
    };

    Some(SchemaNode {
        id: doc.id.clone(),
        kind,
        position: Position::new(doc.position.x as f32, doc.position.y as f32),
        selected: doc.selected,
        attributes,
        subgraph,
        parent_group_id,
    })
}

/// 렌더러 요소 형태(`{props: {children}}`)로 저장된 라벨을 문자열로 바꾼다.
fn normalize_label(attributes: &mut Attributes, kind: NodeKind) {
    let text = match attributes.get(LABEL_KEY) {
        Some(Value::String(_)) => return,
        Some(Value::Object(obj)) => obj
            .get("props")
            .and_then(|props| props.get("children"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    };
    let text = text.unwrap_or_else(|| kind.default_label().to_string());
    attributes.insert(LABEL_KEY.into(), Value::String(text));
}

fn edge_from_doc(doc: &DocEdge) -> SchemaEdge {
    SchemaEdge {
        id: doc.id.clone(),
        source_node_id: doc.source.clone(),
        target_node_id: doc.target.clone(),
        selected: doc.selected,
        attributes: doc.attributes.clone(),
    }
}

fn global_from_doc(doc: &DocGlobalParam) -> GlobalParam {
    GlobalParam {
        name: doc.name.clone(),
        kind: ParamKind::parse(&doc.kind).unwrap_or_else(|| ParamKind::infer(&doc.value)),
        value: doc.value.clone(),
    }
}

/// 스키마 트리를 저장용 문서로 변환한다.
///
/// 자식 그룹은 `parent`만 기록하고 자리표시자 하위 그래프는 버린다.
pub fn tree_to_scheme(tree: &SchemaTree) -> SchemeDocument {
    let root = &tree.root;
    SchemeDocument {
        name: tree.name.clone(),
        nodes: root.nodes.iter().map(node_to_doc).collect(),
        edges: root.edges.iter().map(edge_to_doc).collect(),
        position: [root.viewport.offset_x as f64, root.viewport.offset_y as f64],
        zoom: root.viewport.zoom as f64,
        is_panel_collapsed: tree.panel_state.collapsed,
        panel_width: tree.panel_state.width as f64,
        global_params: tree
            .global_parameters
            .iter()
            .map(|param| DocGlobalParam {
                name: param.name.clone(),
                kind: param.kind.as_str().to_string(),
                value: param.value.clone(),
            })
            .collect(),
        flow_history_stack: tree.navigation_path.clone(),
    }
}

fn node_to_doc(node: &SchemaNode) -> DocNode {
    let (sub_flow, parent) = match (&node.parent_group_id, node.is_group()) {
        (Some(parent), true) => (None, Some(parent.clone())),
        (None, true) => {
            let level = node
                .subgraph
                .clone()
                .unwrap_or_else(|| Arc::new(GraphLevel::empty()));
            (Some(level_to_sub_flow(&level)), None)
        }
        (_, false) => (None, None),
    };
    DocNode {
        id: node.id.clone(),
        node_type: node.kind.type_tag().to_string(),
        position: DocPosition {
            x: node.position.x as f64,
            y: node.position.y as f64,
        },
        selected: node.selected,
        data: DocNodeData {
            sub_flow,
            parent,
            attributes: node.attributes.clone(),
        },
    }
}

fn level_to_sub_flow(level: &GraphLevel) -> DocSubFlow {
    DocSubFlow {
        nodes: level.nodes.iter().map(node_to_doc).collect(),
        edges: level.edges.iter().map(edge_to_doc).collect(),
        position: [level.viewport.offset_x as f64, level.viewport.offset_y as f64],
        zoom: level.viewport.zoom as f64,
    }
}

fn edge_to_doc(edge: &SchemaEdge) -> DocEdge {
    DocEdge {
        id: edge.id.clone(),
        source: edge.source_node_id.clone(),
        target: edge.target_node_id.clone(),
        selected: edge.selected,
        attributes: edge.attributes.clone(),
    }
}
