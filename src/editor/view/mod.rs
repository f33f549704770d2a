use super::catalog::{self, ModelSpec, ParamDefault, ParamSpec};
use super::model::{
    ANIMATED_KEY, Attributes, LABEL_KEY, NEURON_PARAMS_KEY, NEURON_TYPE_KEY, NodeKind,
    PROJECTION_PARAMS_KEY, PROJECTION_TYPE_KEY, PanelState, ParamKind, Position, SchemaEdge,
    SchemaNode, Viewport, single,
};
use super::router::{GLOBAL_SCOPE_ID, NodeChange};
use super::session::{EditorSession, SelectedElement};
use super::template::GroupStatus;
use crate::theme::{BuilderColors, Theme, ThemeDecorations, ThemePalette};
use eframe::egui;
use eframe::epaint::{CubicBezierShape, Stroke};
use serde_json::Value;

mod canvas;
mod layout;
mod palette;
mod properties;

pub use canvas::CanvasState;
pub use layout::FlowEditorUi;
