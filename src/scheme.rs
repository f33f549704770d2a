use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Read;

/// 저장소와 주고받는 스키마 문서 전체이다. 루트 레벨과 패널/전역 설정을 담는다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemeDocument {
    /// 문서 이름.
    #[serde(default)]
    pub name: String,
    /// 루트 레벨 노드.
    #[serde(default)]
    pub nodes: Vec<DocNode>,
    /// 루트 레벨 엣지.
    #[serde(default)]
    pub edges: Vec<DocEdge>,
    /// 루트 뷰포트 오프셋.
    #[serde(default)]
    pub position: [f64; 2],
    /// 루트 뷰포트 줌.
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    /// 설정 패널 접힘 여부.
    #[serde(default)]
    pub is_panel_collapsed: bool,
    /// 설정 패널 너비.
    #[serde(default = "default_panel_width")]
    pub panel_width: f64,
    /// 전역 파라미터 목록.
    #[serde(default)]
    pub global_params: Vec<DocGlobalParam>,
    /// 루트 기준 탐색 경로.
    #[serde(default, deserialize_with = "string_list")]
    pub flow_history_stack: Vec<String>,
}

impl Default for SchemeDocument {
    fn default() -> Self {
        Self {
            name: String::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            position: [0.0, 0.0],
            zoom: default_zoom(),
            is_panel_collapsed: false,
            panel_width: default_panel_width(),
            global_params: Vec::new(),
            flow_history_stack: Vec::new(),
        }
    }
}

/// 문서 안의 노드 표현.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocNode {
    /// 노드 ID. 숫자로 저장된 경우도 문자열로 읽는다.
    #[serde(deserialize_with = "string_id")]
    pub id: String,
    /// `inputNode` / `outputNode` / `populationNode` / `groupNode`.
    #[serde(rename = "type", default)]
    pub node_type: String,
    /// 소속 레벨 좌표.
    #[serde(default)]
    pub position: DocPosition,
    /// 선택 여부.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub selected: bool,
    /// 노드 데이터(속성 + 그룹 전용 필드).
    #[serde(default)]
    pub data: DocNodeData,
}

/// 노드 데이터. 그룹 전용 필드 외의 키는 그대로 보존한다.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocNodeData {
    /// 독립 그룹이 소유한 하위 그래프.
    #[serde(rename = "subFlow", default, skip_serializing_if = "Option::is_none")]
    pub sub_flow: Option<DocSubFlow>,
    /// 자식 그룹이 참조하는 템플릿 그룹 ID.
    #[serde(
        default,
        deserialize_with = "optional_string_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent: Option<String>,
    /// 나머지 속성.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// 그룹 노드에 중첩되는 하위 그래프.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocSubFlow {
    /// 하위 노드.
    #[serde(default)]
    pub nodes: Vec<DocNode>,
    /// 하위 엣지.
    #[serde(default)]
    pub edges: Vec<DocEdge>,
    /// 뷰포트 오프셋.
    #[serde(default)]
    pub position: [f64; 2],
    /// 뷰포트 줌.
    #[serde(default = "default_zoom")]
    pub zoom: f64,
}

impl Default for DocSubFlow {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            position: [0.0, 0.0],
            zoom: default_zoom(),
        }
    }
}

/// 노드 좌표.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DocPosition {
    /// X 좌표.
    #[serde(default)]
    pub x: f64,
    /// Y 좌표.
    #[serde(default)]
    pub y: f64,
}

/// 문서 안의 엣지 표현.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocEdge {
    /// 엣지 ID.
    #[serde(deserialize_with = "string_id")]
    pub id: String,
    /// 출발 노드 ID.
    #[serde(deserialize_with = "string_id")]
    pub source: String,
    /// 도착 노드 ID.
    #[serde(deserialize_with = "string_id")]
    pub target: String,
    /// 선택 여부.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub selected: bool,
    /// 나머지 속성.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// 전역 파라미터 항목.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocGlobalParam {
    /// 이름.
    pub name: String,
    /// 값 유형 이름.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// 값.
    #[serde(default)]
    pub value: Value,
}

fn default_zoom() -> f64 {
    1.0
}

fn default_panel_width() -> f64 {
    300.0
}

fn id_from_value(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// 문자열 또는 숫자 ID를 문자열로 읽는다.
fn string_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_from_value(value).ok_or_else(|| serde::de::Error::custom("ID는 문자열 또는 숫자여야 합니다"))
}

fn optional_string_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(id_from_value(value))
}

fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<Value>::deserialize(deserializer)?;
    Ok(values.into_iter().filter_map(id_from_value).collect())
}

/// JSON 문자열을 문서로 역직렬화한다.
pub fn parse_scheme(json: &str) -> serde_json::Result<SchemeDocument> {
    serde_json::from_str(json)
}

/// Reader에서 JSON을 읽어 문서로 파싱한다.
pub fn load_scheme_from_reader<R: Read>(reader: &mut R) -> anyhow::Result<SchemeDocument> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    Ok(parse_scheme(&buf)?)
}
