use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::model::{
    ANIMATED_KEY, Attributes, COLOR_KEY, NEURON_PARAMS_KEY, NEURON_TYPE_KEY,
    PROJECTION_PARAMS_KEY, PROJECTION_TYPE_KEY,
};

/// Population 생성 시 선택되는 기본 뉴런 모델.
pub const DEFAULT_NEURON_MODEL: &str = "BLIFATNeuron";
/// connect 시 선택되는 기본 시냅스 모델.
pub const DEFAULT_SYNAPSE_MODEL: &str = "DeltaSynapse";
/// 새 엣지의 기본 선 색상.
pub const DEFAULT_EDGE_COLOR: &str = "#b1b1b7";

const OUTPUT_TYPES: &[&str] = &[
    "EXCITATORY",
    "INHIBITORY_CURRENT",
    "INHIBITORY_CONDUCTANCE",
    "DOPAMINE",
    "BLOCKING",
];

/// 파라미터 값 유형과 기본값이다.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamDefault {
    /// 실수.
    Float(f64),
    /// 정수.
    Int(i64),
    /// 불리언.
    Bool(bool),
    /// 선택지 중 하나. 첫 항목이 기본값이다.
    Choice(&'static [&'static str]),
}

impl ParamDefault {
    /// 기본값을 JSON 값으로 변환한다.
    pub fn to_value(self) -> Value {
        match self {
            ParamDefault::Float(v) => Value::from(v),
            ParamDefault::Int(v) => Value::from(v),
            ParamDefault::Bool(v) => Value::from(v),
            ParamDefault::Choice(options) => Value::from(options.first().copied().unwrap_or("")),
        }
    }
}

/// 모델 파라미터 한 개의 명세.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// 저장 키.
    pub name: &'static str,
    /// 폼 라벨.
    pub label: &'static str,
    /// 유형과 기본값.
    pub default: ParamDefault,
}

/// 모델 하나의 파라미터 목록.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelSpec {
    /// 모델 이름.
    pub name: &'static str,
    /// 파라미터 명세.
    pub params: &'static [ParamSpec],
}

impl ModelSpec {
    /// 모든 파라미터의 기본값 맵을 만든다.
    pub fn default_params(&self) -> Attributes {
        self.params
            .iter()
            .map(|spec| (spec.name.to_string(), spec.default.to_value()))
            .collect()
    }
}

const fn float(name: &'static str, label: &'static str, v: f64) -> ParamSpec {
    ParamSpec {
        name,
        label,
        default: ParamDefault::Float(v),
    }
}

const fn int(name: &'static str, label: &'static str, v: i64) -> ParamSpec {
    ParamSpec {
        name,
        label,
        default: ParamDefault::Int(v),
    }
}

const fn boolean(name: &'static str, label: &'static str, v: bool) -> ParamSpec {
    ParamSpec {
        name,
        label,
        default: ParamDefault::Bool(v),
    }
}

const fn choice(
    name: &'static str,
    label: &'static str,
    v: &'static [&'static str],
) -> ParamSpec {
    ParamSpec {
        name,
        label,
        default: ParamDefault::Choice(v),
    }
}

const NEURON_MODELS: &[ModelSpec] = &[
    ModelSpec {
        name: "BLIFATNeuron",
        params: &[
            float("activation_threshold_", "Activation threshold", 1.0),
            float("additional_threshold_", "Additional threshold", 0.0),
            float("dynamic_threshold_", "Dynamic threshold", 0.0),
            float("threshold_decay_", "Threshold decay", 0.0),
            float("threshold_increment_", "Threshold increment", 0.0),
            float("postsynaptic_trace_", "Postsynaptic trace", 0.0),
            float("postsynaptic_trace_decay_", "Postsynaptic trace decay", 0.0),
            float("postsynaptic_trace_increment_", "Postsynaptic trace increment", 0.0),
            float("inhibitory_conductance_", "Inhibitory conductance", 0.0),
            float("inhibitory_conductance_decay_", "Inhibitory conductance decay", 0.0),
            float("potential_", "Potential", 0.0),
            float("pre_impact_potential_", "Pre impact potential", 0.0),
            float("potential_decay_", "Potential decay", 0.0),
            int("bursting_phase_", "Bursting phase", 0),
            int("bursting_period_", "Bursting period", 0),
            float("reflexive_weight_", "Reflexive weight", 0.0),
            float("reversal_inhibitory_potential_", "Reversal inhibitory potential", -0.3),
            int("absolute_refractory_period_", "Absolute refractory period", 0),
            float("potential_reset_value_", "Potential reset value", 0.0),
            float("min_potential_", "Min potential", -1.0e9),
            float("dopamine_value_", "Dopamine value", 0.0),
        ],
    },
    ModelSpec {
        name: "SynapticResourceSTDPNeuron",
        params: &[
            float("synapse_sum_threshold_coefficient_", "Synapse Sum Threshold Coefficient", 0.0),
            int("dopamine_plasticity_time_", "Dopamine Plasticity Time", 1),
            float("free_synaptic_resource_", "Free Synaptic Resource", 1.0),
            float("synaptic_resource_threshold_", "Synaptic Resource Threshold", 3.4028235e38),
            int("resource_drain_coefficient_", "Resource Drain Coefficient", 0),
            float("stability_", "Synapse Stability", 0.0),
            float("stability_change_parameter_", "Stability Fluctuation", 0.0),
            float("stability_change_at_isi_", "Stability Change at ISI Start", 0.0),
            int("isi_max_", "ISI Period Duration", 1),
            float("d_h_", "Hebbian Plasticity Strength", 1.0),
        ],
    },
    ModelSpec {
        name: "AltAILIF",
        params: &[
            boolean("is_diff_", "is diff", false),
            boolean("is_reset_", "is reset", true),
            boolean("leak_rev_", "leak rev", true),
            boolean("saturate_", "saturate", true),
            boolean("do_not_save_", "do not save", false),
            float("potential_", "potential", 0.0),
            int("activation_threshold_", "activation threshold", 1),
            int("negative_activation_threshold_", "negative activation threshold", 30000),
            int("potential_leak_", "potential leak", 0),
            int("potential_reset_value_", "potential reset value", 0),
        ],
    },
];

const SYNAPSE_MODELS: &[ModelSpec] = &[
    ModelSpec {
        name: "DeltaSynapse",
        params: &[float("weight_", "Weight", 0.0), int("delay_", "Delay", 1)],
    },
    ModelSpec {
        name: "AdditiveSTDPDeltaSynapse",
        params: &[
            float("weight_", "Weight", 0.0),
            int("delay_", "Delay", 1),
            float("tau_plus_", "tau plus", 10.0),
            float("tau_minus_", "tau minus", 10.0),
            choice("OutputType", "Output Type", OUTPUT_TYPES),
            boolean("train", "Train", true),
        ],
    },
    ModelSpec {
        name: "SynapticResourceSTDPDeltaSynapse",
        params: &[
            float("weight_", "Weight", 0.0),
            int("delay_", "Delay", 1),
            float("synaptic_resource_", "Synaptic resource", 0.0),
            float("w_min_", "w min", 0.0),
            float("w_max_", "w max", 1.0),
            float("d_u_", "d u", 0.0),
            int("dopamine_plasticity_period_", "Dopamine plasticity period", 0),
            choice("OutputType", "Output Type", OUTPUT_TYPES),
            boolean("train", "Train", true),
        ],
    },
];

static NEURON_INDEX: Lazy<HashMap<&'static str, &'static ModelSpec>> =
    Lazy::new(|| NEURON_MODELS.iter().map(|spec| (spec.name, spec)).collect());

static SYNAPSE_INDEX: Lazy<HashMap<&'static str, &'static ModelSpec>> =
    Lazy::new(|| SYNAPSE_MODELS.iter().map(|spec| (spec.name, spec)).collect());

/// 지원하는 뉴런 모델 목록.
pub fn neuron_models() -> &'static [ModelSpec] {
    NEURON_MODELS
}

/// 지원하는 시냅스 모델 목록.
pub fn synapse_models() -> &'static [ModelSpec] {
    SYNAPSE_MODELS
}

/// 이름으로 뉴런 모델을 찾는다.
pub fn find_neuron_model(name: &str) -> Option<&'static ModelSpec> {
    NEURON_INDEX.get(name).copied()
}

/// 이름으로 시냅스 모델을 찾는다.
pub fn find_synapse_model(name: &str) -> Option<&'static ModelSpec> {
    SYNAPSE_INDEX.get(name).copied()
}

/// 새 Population 노드에 병합할 기본 속성.
pub fn default_population_attributes() -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(NEURON_TYPE_KEY.into(), DEFAULT_NEURON_MODEL.into());
    let params = find_neuron_model(DEFAULT_NEURON_MODEL)
        .map(ModelSpec::default_params)
        .unwrap_or_default();
    attributes.insert(NEURON_PARAMS_KEY.into(), Value::Object(params));
    attributes
}

/// connect로 만들어지는 엣지의 기본 속성.
pub fn default_edge_attributes() -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(COLOR_KEY.into(), DEFAULT_EDGE_COLOR.into());
    attributes.insert(ANIMATED_KEY.into(), false.into());
    attributes.insert(PROJECTION_TYPE_KEY.into(), DEFAULT_SYNAPSE_MODEL.into());
    let params = find_synapse_model(DEFAULT_SYNAPSE_MODEL)
        .map(ModelSpec::default_params)
        .unwrap_or_default();
    attributes.insert(PROJECTION_PARAMS_KEY.into(), Value::Object(params));
    attributes
}

/// 저장된 파라미터 맵에 없는 키를 모델 기본값으로 채운 맵을 돌려준다.
pub fn params_with_defaults(spec: &ModelSpec, stored: Option<&Value>) -> Map<String, Value> {
    let mut params = spec.default_params();
    if let Some(Value::Object(stored)) = stored {
        for (key, value) in stored {
            params.insert(key.clone(), value.clone());
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_edge_uses_delta_synapse_parameters() {
        let attributes = default_edge_attributes();
        assert_eq!(attributes[PROJECTION_TYPE_KEY], json!("DeltaSynapse"));
        assert_eq!(
            attributes[PROJECTION_PARAMS_KEY],
            json!({ "weight_": 0.0, "delay_": 1 })
        );
    }

    #[test]
    fn choice_parameters_default_to_the_first_option() {
        let spec = find_synapse_model("AdditiveSTDPDeltaSynapse").expect("모델이 없습니다");
        let params = spec.default_params();
        assert_eq!(params["OutputType"], json!("EXCITATORY"));
        assert_eq!(params["train"], json!(true));
    }

    #[test]
    fn stored_values_override_model_defaults() {
        let spec = find_neuron_model("AltAILIF").expect("모델이 없습니다");
        let stored = json!({ "potential_leak_": 7, "custom_": "kept" });
        let params = params_with_defaults(spec, Some(&stored));
        assert_eq!(params["potential_leak_"], json!(7));
        assert_eq!(params["custom_"], json!("kept"));
        assert_eq!(params["is_reset_"], json!(true));
    }
}
