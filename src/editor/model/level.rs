use super::edge::SchemaEdge;
use super::node::SchemaNode;

/// 그래프 레벨 좌표계의 2D 위치이다.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    /// X 좌표.
    pub x: f32,
    /// Y 좌표.
    pub y: f32,
}

impl Position {
    /// 좌표를 생성한다.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// 각 축으로 이동한 좌표를 반환한다.
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// 레벨별로 보존되는 화면 상태(이동 오프셋, 줌)이다.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// X 방향 오프셋.
    pub offset_x: f32,
    /// Y 방향 오프셋.
    pub offset_y: f32,
    /// 줌 배율.
    pub zoom: f32,
}

impl Viewport {
    /// 화면 좌표를 이 뷰포트 기준 레벨 좌표로 변환한다.
    pub fn screen_to_level(&self, screen_x: f32, screen_y: f32) -> Position {
        let zoom = if self.zoom > 0.0 { self.zoom } else { 1.0 };
        Position::new(
            (screen_x - self.offset_x) / zoom,
            (screen_y - self.offset_y) / zoom,
        )
    }

    /// 레벨 좌표를 화면 좌표로 변환한다.
    pub fn level_to_screen(&self, position: Position) -> (f32, f32) {
        (
            position.x * self.zoom + self.offset_x,
            position.y * self.zoom + self.offset_y,
        )
    }
}

impl Default for Viewport {
    /// 원점, 1배율 뷰포트를 반환한다.
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            zoom: 1.0,
        }
    }
}

/// 하나의 탐색 가능한 다이어그램 계층이다.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphLevel {
    /// 노드 목록. 순서는 렌더링 z-order 외에는 의미가 없다.
    pub nodes: Vec<SchemaNode>,
    /// 엣지 목록.
    pub edges: Vec<SchemaEdge>,
    /// 레벨 전용 뷰포트.
    pub viewport: Viewport,
}

impl GraphLevel {
    /// 빈 레벨을 생성한다.
    pub fn empty() -> Self {
        Self::default()
    }

    /// 노드가 하나도 없는지 확인한다.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// ID로 노드를 조회한다.
    pub fn node(&self, id: &str) -> Option<&SchemaNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// ID로 노드를 가변 조회한다.
    pub fn node_mut(&mut self, id: &str) -> Option<&mut SchemaNode> {
        self.nodes.iter_mut().find(|node| node.id == id)
    }

    /// ID로 엣지를 조회한다.
    pub fn edge(&self, id: &str) -> Option<&SchemaEdge> {
        self.edges.iter().find(|edge| edge.id == id)
    }

    /// ID로 엣지를 가변 조회한다.
    pub fn edge_mut(&mut self, id: &str) -> Option<&mut SchemaEdge> {
        self.edges.iter_mut().find(|edge| edge.id == id)
    }

    /// 노드를 제거하고 해당 노드를 참조하는 엣지도 함께 정리한다.
    pub fn remove_node(&mut self, id: &str) -> Option<SchemaNode> {
        let index = self.nodes.iter().position(|node| node.id == id)?;
        let removed = self.nodes.remove(index);
        self.edges.retain(|edge| !edge.touches(id));
        Some(removed)
    }
}
