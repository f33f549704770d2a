mod attributes;
mod edge;
mod error;
mod ids;
mod level;
mod node;
mod tree;

pub use attributes::{
    ANIMATED_KEY, Attributes, COLOR_KEY, LABEL_KEY, NEURON_PARAMS_KEY, NEURON_TYPE_KEY,
    PROJECTION_PARAMS_KEY, PROJECTION_TYPE_KEY, merge_shallow, single,
};
pub use edge::SchemaEdge;
pub use error::EditorError;
pub use ids::{new_edge_id, new_node_id};
pub use level::{GraphLevel, Position, Viewport};
pub use node::{NodeKind, SchemaNode};
pub use tree::{GlobalParam, NavigationPath, PanelState, ParamKind, SchemaTree};
