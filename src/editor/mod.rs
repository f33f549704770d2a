pub mod catalog;
pub mod convert;
pub mod model;
pub mod navigation;
pub mod router;
pub mod session;
pub mod store;
pub mod template;
pub mod view;

pub use convert::{LoadedTree, scheme_to_tree, tree_to_scheme};
pub use model::{NodeKind, SchemaTree};
pub use session::EditorSession;
pub use view::{CanvasState, FlowEditorUi};
