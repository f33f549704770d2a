use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::model::{
    EditorError, GraphLevel, LABEL_KEY, NavigationPath, NodeKind, Position, SchemaEdge,
    SchemaNode, SchemaTree, new_edge_id, new_node_id,
};
use super::store;

/// 복제 노드의 기본 오프셋(px).
pub const CLONE_BASE_OFFSET: f32 = 200.0;
/// 같은 원본을 연속 복제할 때마다 더해지는 오프셋(px).
pub const CLONE_STEP_OFFSET: f32 = 50.0;

/// 그룹 노드가 표시할 하위 그래프의 출처이다.
#[derive(Debug)]
pub enum TemplateSource<'a> {
    /// 자신이 소유한 하위 그래프를 쓴다.
    Own(&'a SchemaNode),
    /// 체인을 따라 찾은 독립 템플릿의 하위 그래프를 쓴다.
    Inherited(&'a SchemaNode),
    /// 참조가 끊겼거나 순환한다.
    Unresolved(EditorError),
}

/// 표시용 그룹 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupStatus {
    /// 같은 레벨의 다른 그룹이 이 노드를 템플릿으로 쓴다.
    Template,
    /// 다른 그룹을 템플릿으로 참조한다.
    Child,
    /// 어느 쪽도 아니다.
    Plain,
}

/// `parent_group_id` 체인을 따라 실제 하위 그래프 소유자를 찾는다.
pub fn resolve_template<'a>(node: &'a SchemaNode, level: &'a GraphLevel) -> TemplateSource<'a> {
    let mut current = node;
    let mut chain: Vec<&str> = vec![node.id.as_str()];
    while let Some(parent_id) = current.parent_group_id.as_deref() {
        if chain.contains(&parent_id) {
            let mut ids: Vec<String> = chain.iter().map(|id| id.to_string()).collect();
            ids.push(parent_id.to_string());
            return TemplateSource::Unresolved(EditorError::CyclicTemplate { chain: ids });
        }
        match level.node(parent_id).filter(|parent| parent.is_group()) {
            Some(parent) => {
                chain.push(parent.id.as_str());
                current = parent;
            }
            None => {
                return TemplateSource::Unresolved(EditorError::StaleTemplate {
                    child_id: current.id.clone(),
                    parent_id: parent_id.to_string(),
                });
            }
        }
    }
    if std::ptr::eq(current, node) {
        TemplateSource::Own(node)
    } else {
        TemplateSource::Inherited(current)
    }
}

/// 그룹 노드가 실제로 표시하는 하위 그래프를 반환한다.
///
/// `level`은 노드를 직접 담고 있는 레벨이다. 그룹이 아니거나 참조를 해석할 수 없으면
/// 빈 레벨을 반환한다.
pub fn effective_subgraph(node: &SchemaNode, level: &GraphLevel) -> Arc<GraphLevel> {
    if !node.is_group() {
        return Arc::new(GraphLevel::empty());
    }
    match resolve_template(node, level) {
        TemplateSource::Own(owner) | TemplateSource::Inherited(owner) => owner
            .subgraph
            .clone()
            .unwrap_or_else(|| Arc::new(GraphLevel::empty())),
        TemplateSource::Unresolved(err) => {
            if matches!(err, EditorError::CyclicTemplate { .. }) {
                warn!(node_id = %node.id, "{err}");
            } else {
                debug!(node_id = %node.id, "{err}");
            }
            Arc::new(GraphLevel::empty())
        }
    }
}

/// 그룹의 표시 상태를 계산한다. 템플릿 여부가 자식 여부보다 우선한다.
pub fn group_status(node: &SchemaNode, level: &GraphLevel) -> GroupStatus {
    let is_template = level.nodes.iter().any(|other| {
        other.is_group()
            && other.id != node.id
            && other.parent_group_id.as_deref() == Some(node.id.as_str())
    });
    if is_template {
        GroupStatus::Template
    } else if node.is_child() {
        GroupStatus::Child
    } else {
        GroupStatus::Plain
    }
}

/// 레벨 안의 모든 끊긴/순환 템플릿 참조를 보고한다.
pub fn template_diagnostics(level: &GraphLevel) -> Vec<EditorError> {
    level
        .nodes
        .iter()
        .filter(|node| node.is_child())
        .filter_map(|node| match resolve_template(node, level) {
            TemplateSource::Unresolved(err) => Some(err),
            _ => None,
        })
        .collect()
}

/// 같은 원본의 연속 복제 위치를 계산하는 추적기이다.
#[derive(Debug, Clone, Default)]
pub struct CloneOffsetTracker {
    last_source_id: Option<String>,
    base_position: Option<Position>,
    count: u32,
}

impl CloneOffsetTracker {
    /// 다음 복제 노드의 오프셋을 반환하고 카운터를 올린다.
    ///
    /// 원본이 바뀌거나 원본이 이동했으면 카운터가 0으로 돌아간다.
    pub fn next_offset(&mut self, source: &SchemaNode) -> (f32, f32) {
        let same_source = self.last_source_id.as_deref() == Some(source.id.as_str())
            && self.base_position == Some(source.position);
        if !same_source {
            self.count = 0;
            self.base_position = Some(source.position);
        }
        self.last_source_id = Some(source.id.clone());
        let step = self.count as f32 * CLONE_STEP_OFFSET;
        self.count += 1;
        (CLONE_BASE_OFFSET + step, CLONE_BASE_OFFSET + step)
    }
}

/// 복제 결과: 새 그룹 노드와 삽입할 레벨의 경로.
#[derive(Debug, Clone, PartialEq)]
pub struct ClonedGroup {
    /// 새 자식 그룹.
    pub node: SchemaNode,
    /// 원본과 같은 레벨의 경로.
    pub level_path: NavigationPath,
}

/// `path` 레벨의 그룹 `source_id`를 복제한 새 자식 그룹을 만든다.
///
/// 원본이 자식이면 같은 템플릿의 자식을, 독립 그룹이면 원본을 템플릿으로 하는 자식을 만든다.
/// 하위 그래프 내용은 복사하지 않는다.
pub fn clone_group(
    tree: &SchemaTree,
    path: &[String],
    source_id: &str,
    tracker: &mut CloneOffsetTracker,
) -> Option<ClonedGroup> {
    let level = store::get_level(tree, path);
    let source = level.node(source_id).filter(|node| node.is_group())?;
    let template_id = source
        .parent_group_id
        .clone()
        .unwrap_or_else(|| source.id.clone());
    let (dx, dy) = tracker.next_offset(source);

    let mut attributes = source.attributes.clone();
    attributes.insert(LABEL_KEY.into(), clone_label(source.label(), &level).into());

    let node = SchemaNode {
        id: new_node_id(),
        kind: NodeKind::Group,
        position: source.position.offset(dx, dy),
        selected: false,
        attributes,
        subgraph: None,
        parent_group_id: Some(template_id),
    };
    Some(ClonedGroup {
        node,
        level_path: path.to_vec(),
    })
}

/// 형제 그룹 라벨과 겹치지 않는 복제 라벨을 만든다.
///
/// 끝의 숫자를 뗀 기본 라벨 자체는 1번으로 센다. 예: `Pop`, `Pop2`가 있으면 `Pop3`.
pub fn clone_label(source_label: &str, level: &GraphLevel) -> String {
    static SUFFIX: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^(?P<base>.*?)(?P<index>\d*)$").expect("정규식 컴파일 실패"));

    let split = |label: &str| -> Option<(String, u128)> {
        let caps = SUFFIX.captures(label)?;
        let index = match &caps["index"] {
            "" => 1,
            digits => digits.parse().unwrap_or(u128::MAX),
        };
        Some((caps["base"].to_string(), index))
    };

    let base = split(source_label)
        .map(|(base, _)| base)
        .filter(|base| !base.is_empty())
        .unwrap_or_else(|| NodeKind::Group.default_label().to_string());
    let max_index = level
        .nodes
        .iter()
        .filter(|node| node.is_group())
        .filter_map(|node| split(node.label()))
        .filter(|(sibling_base, _)| *sibling_base == base)
        .map(|(_, index)| index)
        .max()
        .unwrap_or(0);
    format!("{base}{}", max_index.saturating_add(1))
}

/// 자식 그룹을 템플릿 내용의 깊은 복사본을 소유한 독립 그룹으로 바꾼다.
///
/// 복사된 모든 노드/엣지는 새 ID를 받는다. 자식이 아니면 그대로 복제해 돌려준다.
pub fn detach_from_parent(node: &SchemaNode, level: &GraphLevel) -> SchemaNode {
    if !node.is_child() {
        return node.clone();
    }
    let source = effective_subgraph(node, level);
    let mut detached = node.clone();
    detached.subgraph = Some(Arc::new(deep_copy_level(&source)));
    detached.parent_group_id = None;
    detached
}

/// 레벨을 재귀적으로 복사하며 모든 ID를 새로 발급한다.
///
/// 엣지 끝점과 하위 자식 그룹의 템플릿 참조는 치환 맵을 통해 새 ID로 바뀐다.
pub fn deep_copy_level(level: &GraphLevel) -> GraphLevel {
    let id_map: HashMap<&str, String> = level
        .nodes
        .iter()
        .map(|node| (node.id.as_str(), new_node_id()))
        .collect();
    let remap = |id: &str| id_map.get(id).cloned().unwrap_or_else(|| id.to_string());

    let nodes = level
        .nodes
        .iter()
        .map(|node| SchemaNode {
            id: remap(&node.id),
            kind: node.kind,
            position: node.position,
            selected: node.selected,
            attributes: node.attributes.clone(),
            subgraph: node
                .subgraph
                .as_ref()
                .map(|sub| Arc::new(deep_copy_level(sub))),
            parent_group_id: node.parent_group_id.as_deref().map(remap),
        })
        .collect();
    let edges = level
        .edges
        .iter()
        .map(|edge| SchemaEdge {
            id: new_edge_id(),
            source_node_id: remap(&edge.source_node_id),
            target_node_id: remap(&edge.target_node_id),
            selected: edge.selected,
            attributes: edge.attributes.clone(),
        })
        .collect();
    GraphLevel {
        nodes,
        edges,
        viewport: level.viewport,
    }
}

/// 삭제된 템플릿의 자식들을 살린다.
///
/// 남은 자식 중 첫 번째가 삭제된 노드의 하위 그래프(또는 템플릿 참조)를 넘겨받고,
/// 나머지 자식은 그 노드를 새 템플릿으로 가리킨다.
pub fn hand_over_template(level: &mut GraphLevel, removed: &SchemaNode) {
    if !removed.is_group() {
        return;
    }
    let orphans: Vec<String> = level
        .nodes
        .iter()
        .filter(|node| {
            node.is_group() && node.parent_group_id.as_deref() == Some(removed.id.as_str())
        })
        .map(|node| node.id.clone())
        .collect();
    let Some((heir_id, siblings)) = orphans.split_first() else {
        return;
    };
    if let Some(heir) = level.node_mut(heir_id) {
        heir.subgraph = removed.subgraph.clone();
        heir.parent_group_id = removed.parent_group_id.clone();
    }
    for sibling_id in siblings {
        if let Some(sibling) = level.node_mut(sibling_id) {
            sibling.parent_group_id = Some(heir_id.clone());
        }
    }
    debug!(removed = %removed.id, heir = %heir_id, "템플릿 삭제: 첫 자식이 내용을 넘겨받음");
}

/// 그룹 포트 한 줄.
#[derive(Debug, Clone, PartialEq)]
pub struct PortRef {
    /// 하위 그래프 안의 Input/Output 노드 ID.
    pub node_id: String,
    /// 표시 라벨.
    pub label: String,
}

/// 그룹 노드가 외부에 노출하는 입출력 포트.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupPorts {
    /// 하위 그래프의 Input 노드.
    pub inputs: Vec<PortRef>,
    /// 하위 그래프의 Output 노드.
    pub outputs: Vec<PortRef>,
}

impl GroupPorts {
    /// 그룹 본문에 필요한 행 수(최소 1).
    pub fn row_count(&self) -> usize {
        self.inputs.len().max(self.outputs.len()).max(1)
    }
}

/// 그룹의 실효 하위 그래프에서 Input/Output 노드를 포트로 추출한다.
pub fn group_ports(node: &SchemaNode, level: &GraphLevel) -> GroupPorts {
    let subgraph = effective_subgraph(node, level);
    let ports_of = |kind: NodeKind| {
        subgraph
            .nodes
            .iter()
            .filter(|inner| inner.kind == kind)
            .map(|inner| PortRef {
                node_id: inner.id.clone(),
                label: inner.label().to_string(),
            })
            .collect()
    };
    GroupPorts {
        inputs: ports_of(NodeKind::Input),
        outputs: ports_of(NodeKind::Output),
    }
}
