use uuid::Uuid;

/// 새 노드 ID를 발급한다.
pub fn new_node_id() -> String {
    format!("node-{}", Uuid::new_v4().simple())
}

/// 새 엣지 ID를 발급한다.
pub fn new_edge_id() -> String {
    format!("edge-{}", Uuid::new_v4().simple())
}
