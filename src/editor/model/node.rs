use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::attributes::{Attributes, LABEL_KEY, label_of};
use super::error::EditorError;
use super::level::{GraphLevel, Position};

/// 에디터에서 지원하는 노드 유형을 정의한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// 외부 입력 노드이다.
    Input,
    /// 외부 출력 노드이다.
    Output,
    /// 뉴런 집단(Population) 노드이다.
    Population,
    /// 하위 그래프를 담는 그룹 노드이다.
    Group,
}

impl NodeKind {
    /// 팔레트/메뉴 표시 순서.
    pub const ALL: [NodeKind; 4] = [
        NodeKind::Input,
        NodeKind::Output,
        NodeKind::Population,
        NodeKind::Group,
    ];

    /// 새 노드에 붙는 기본 라벨이다.
    pub fn default_label(self) -> &'static str {
        match self {
            NodeKind::Input => "Input",
            NodeKind::Output => "Output",
            NodeKind::Population => "Population",
            NodeKind::Group => "Group",
        }
    }

    /// 문서에 저장되는 `type` 태그이다.
    pub fn type_tag(self) -> &'static str {
        match self {
            NodeKind::Input => "inputNode",
            NodeKind::Output => "outputNode",
            NodeKind::Population => "populationNode",
            NodeKind::Group => "groupNode",
        }
    }
}

impl FromStr for NodeKind {
    type Err = EditorError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "inputNode" => Ok(NodeKind::Input),
            "outputNode" => Ok(NodeKind::Output),
            "populationNode" => Ok(NodeKind::Population),
            "groupNode" => Ok(NodeKind::Group),
            other => Err(EditorError::UnknownNodeType(other.to_string())),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_label())
    }
}

/// 그래프 레벨에 놓이는 노드이다.
///
/// `subgraph`와 `parent_group_id`는 [`NodeKind::Group`]에서만 의미가 있다.
/// `parent_group_id`가 설정되어 있으면 `subgraph`는 남아 있더라도 무시된다.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    /// 노드 고유 ID. 삭제 후에도 재사용되지 않는다.
    pub id: String,
    /// 노드 유형.
    pub kind: NodeKind,
    /// 소속 레벨 좌표계의 위치.
    pub position: Position,
    /// 선택 여부.
    pub selected: bool,
    /// 유형별 불투명 속성.
    pub attributes: Attributes,
    /// 독립 그룹이 소유한 하위 그래프.
    pub subgraph: Option<Arc<GraphLevel>>,
    /// 템플릿(부모) 그룹의 ID. 같은 레벨의 형제 노드를 가리킨다.
    pub parent_group_id: Option<String>,
}

impl SchemaNode {
    /// 유형별 기본 라벨을 가진 노드를 생성한다. 그룹은 빈 하위 그래프를 소유한다.
    pub fn new(id: impl Into<String>, kind: NodeKind, position: Position) -> Self {
        let mut attributes = Attributes::new();
        attributes.insert(LABEL_KEY.into(), kind.default_label().into());
        Self {
            id: id.into(),
            kind,
            position,
            selected: false,
            attributes,
            subgraph: (kind == NodeKind::Group).then(|| Arc::new(GraphLevel::empty())),
            parent_group_id: None,
        }
    }

    /// 그룹 노드인지 확인한다.
    pub fn is_group(&self) -> bool {
        self.kind == NodeKind::Group
    }

    /// 다른 그룹을 템플릿으로 참조하는 자식 그룹인지 확인한다.
    pub fn is_child(&self) -> bool {
        self.is_group() && self.parent_group_id.is_some()
    }

    /// 표시 라벨을 반환한다. 속성에 없으면 유형 기본값을 쓴다.
    pub fn label(&self) -> &str {
        label_of(&self.attributes).unwrap_or(self.kind.default_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_tags_round_trip_and_unknown_tags_are_rejected() {
        for kind in NodeKind::ALL {
            assert_eq!(kind.type_tag().parse::<NodeKind>().ok(), Some(kind));
        }
        assert!(matches!(
            "default".parse::<NodeKind>(),
            Err(EditorError::UnknownNodeType(tag)) if tag == "default"
        ));
    }

    #[test]
    fn only_group_nodes_own_a_subgraph_on_creation() {
        let group = SchemaNode::new("g", NodeKind::Group, Position::default());
        let input = SchemaNode::new("i", NodeKind::Input, Position::default());
        assert!(group.subgraph.as_ref().is_some_and(|sub| sub.is_empty()));
        assert!(input.subgraph.is_none());
        assert_eq!(group.label(), "Group");
    }
}
