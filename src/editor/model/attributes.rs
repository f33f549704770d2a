use serde_json::{Map, Value};

/// 노드/엣지에 부착되는 불투명 속성 맵이다.
///
/// 코어는 `label` 키만 해석하고 나머지는 복사/병합만 수행한다.
pub type Attributes = Map<String, Value>;

/// 표시용 라벨 키.
pub const LABEL_KEY: &str = "label";
/// 뉴런 모델 선택 키.
pub const NEURON_TYPE_KEY: &str = "neuronType";
/// 뉴런 파라미터 맵 키.
pub const NEURON_PARAMS_KEY: &str = "neuronParams";
/// 프로젝션(시냅스) 유형 선택 키.
pub const PROJECTION_TYPE_KEY: &str = "projectionType";
/// 프로젝션 파라미터 맵 키.
pub const PROJECTION_PARAMS_KEY: &str = "projectionParams";
/// 엣지 색상 키.
pub const COLOR_KEY: &str = "color";
/// 엣지 애니메이션 여부 키.
pub const ANIMATED_KEY: &str = "animated";

/// 속성 맵에서 라벨 문자열을 꺼낸다.
pub fn label_of(attributes: &Attributes) -> Option<&str> {
    attributes.get(LABEL_KEY).and_then(Value::as_str)
}

/// `partial`의 최상위 키를 `target`에 덮어쓴다(얕은 병합).
pub fn merge_shallow(target: &mut Attributes, partial: &Attributes) {
    for (key, value) in partial {
        target.insert(key.clone(), value.clone());
    }
}

/// 단일 키/값으로 부분 속성 맵을 만든다.
pub fn single(key: &str, value: impl Into<Value>) -> Attributes {
    let mut map = Attributes::new();
    map.insert(key.to_string(), value.into());
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_overwrites_top_level_keys_only() {
        let mut target = single(LABEL_KEY, "Pop");
        target.insert(NEURON_PARAMS_KEY.into(), json!({ "potential_": 0.0, "min_potential_": -1.0 }));
        let partial = single(NEURON_PARAMS_KEY, json!({ "potential_": 0.5 }));

        merge_shallow(&mut target, &partial);

        assert_eq!(label_of(&target), Some("Pop"));
        assert_eq!(target[NEURON_PARAMS_KEY], json!({ "potential_": 0.5 }));
    }
}
