/// 에디터 작업 중 발생 가능한 오류를 표현한다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    /// 문서에 알 수 없는 노드 type 태그가 있다.
    #[error("알 수 없는 노드 유형입니다: {0}")]
    UnknownNodeType(String),
    /// 템플릿(parent) 참조 체인이 순환한다.
    #[error("템플릿 참조가 순환합니다: {}", .chain.join(" -> "))]
    CyclicTemplate { chain: Vec<String> },
    /// 템플릿 참조가 같은 레벨에 없는 노드를 가리킨다.
    #[error("존재하지 않는 템플릿을 참조합니다: {child_id} -> {parent_id}")]
    StaleTemplate { child_id: String, parent_id: String },
    /// 엣지가 같은 레벨에 없는 노드를 가리킨다.
    #[error("존재하지 않는 노드를 참조하는 엣지입니다: {edge_id} ({source_id} -> {target_id})")]
    DanglingEdge {
        edge_id: String,
        source_id: String,
        target_id: String,
    },
    /// 뷰포트 줌 값이 양의 유한수가 아니다.
    #[error("잘못된 뷰포트 줌 값입니다: {0}")]
    InvalidZoom(String),
}
