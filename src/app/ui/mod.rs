use crate::editor::FlowEditorUi;
use eframe::egui::{self, RichText};

use super::state::SnnFlowApp;
use super::widgets::{PrimaryButton, solid_section_header};

mod layout;
mod modal;
mod status;
mod toolbar;
