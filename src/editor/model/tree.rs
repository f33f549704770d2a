use serde_json::Value;
use std::sync::Arc;

use super::level::GraphLevel;

/// 루트에서 현재 표시 중인 레벨까지 진입한 그룹 노드 ID의 순서열이다.
pub type NavigationPath = Vec<String>;

/// 설정 패널 상태.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelState {
    /// 접힘 여부.
    pub collapsed: bool,
    /// 패널 너비(px).
    pub width: f32,
}

/// 패널 너비 기본값.
pub const DEFAULT_PANEL_WIDTH: f32 = 300.0;

impl Default for PanelState {
    fn default() -> Self {
        Self {
            collapsed: false,
            width: DEFAULT_PANEL_WIDTH,
        }
    }
}

/// 전역 파라미터의 값 유형이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// 실수.
    Float,
    /// 정수.
    Int,
    /// 불리언.
    Bool,
    /// 문자열.
    Text,
    /// 그 밖의 JSON 값.
    Json,
}

impl ParamKind {
    /// JSON 값에서 유형을 추론한다.
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Bool(_) => ParamKind::Bool,
            Value::Number(n) if n.is_i64() || n.is_u64() => ParamKind::Int,
            Value::Number(_) => ParamKind::Float,
            Value::String(_) => ParamKind::Text,
            _ => ParamKind::Json,
        }
    }

    /// 문서에 저장되는 유형 이름.
    pub fn as_str(self) -> &'static str {
        match self {
            ParamKind::Float => "float",
            ParamKind::Int => "int",
            ParamKind::Bool => "bool",
            ParamKind::Text => "string",
            ParamKind::Json => "json",
        }
    }

    /// 유형 이름을 해석한다. 알 수 없으면 `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "float" => Some(ParamKind::Float),
            "int" => Some(ParamKind::Int),
            "bool" => Some(ParamKind::Bool),
            "string" => Some(ParamKind::Text),
            "json" => Some(ParamKind::Json),
            _ => None,
        }
    }
}

/// 문서 전체에 적용되는 전역 설정 한 항목이다.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalParam {
    /// 파라미터 이름.
    pub name: String,
    /// 값 유형.
    pub kind: ParamKind,
    /// 값.
    pub value: Value,
}

/// 루트 레벨과 그 아래 모든 하위 레벨로 이루어진 전체 문서이다.
///
/// 변경은 항상 새 트리 값을 만들어 교체한다. 하위 레벨은 `Arc`로 공유되어
/// 경로와 무관한 가지는 복사 없이 재사용된다.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaTree {
    /// 문서 이름.
    pub name: String,
    /// 루트 레벨.
    pub root: Arc<GraphLevel>,
    /// 전역 파라미터(순서 유지).
    pub global_parameters: Vec<GlobalParam>,
    /// 설정 패널 상태.
    pub panel_state: PanelState,
    /// 재로드 시 복원할 탐색 경로.
    pub navigation_path: NavigationPath,
}

impl SchemaTree {
    /// 빈 루트 레벨과 빈 경로를 가진 트리를 생성한다.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: Arc::new(GraphLevel::empty()),
            global_parameters: Vec::new(),
            panel_state: PanelState::default(),
            navigation_path: NavigationPath::new(),
        }
    }

    /// 두 트리가 같은 값임을 O(1)로 판별할 수 있으면 `true`를 반환한다.
    ///
    /// 루트 레벨을 포인터로 비교하므로 내용이 같아도 다시 만들어진 트리는 `false`다.
    pub fn is_same(&self, other: &SchemaTree) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
            && self.name == other.name
            && self.panel_state == other.panel_state
            && self.navigation_path == other.navigation_path
            && self.global_parameters == other.global_parameters
    }
}

impl Default for SchemaTree {
    fn default() -> Self {
        Self::new(String::new())
    }
}
