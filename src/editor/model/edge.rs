use super::attributes::Attributes;

/// 같은 레벨의 두 노드를 잇는 방향성 연결(프로젝션)이다.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaEdge {
    /// 엣지 고유 ID.
    pub id: String,
    /// 출발 노드 ID.
    pub source_node_id: String,
    /// 도착 노드 ID.
    pub target_node_id: String,
    /// 선택 여부.
    pub selected: bool,
    /// 시각/의미 속성(색상, 애니메이션, 프로젝션 유형과 파라미터).
    pub attributes: Attributes,
}

impl SchemaEdge {
    /// 속성이 비어 있는 엣지를 생성한다.
    pub fn new(
        id: impl Into<String>,
        source_node_id: impl Into<String>,
        target_node_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_node_id: source_node_id.into(),
            target_node_id: target_node_id.into(),
            selected: false,
            attributes: Attributes::new(),
        }
    }

    /// 지정한 노드가 양 끝점 중 하나인지 확인한다.
    pub fn touches(&self, node_id: &str) -> bool {
        self.source_node_id == node_id || self.target_node_id == node_id
    }
}
