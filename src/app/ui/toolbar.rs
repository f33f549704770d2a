use super::*;

impl SnnFlowApp {
    /// 상단 툴바를 그린다.
    pub(super) fn render_toolbar(&mut self, ui: &mut egui::Ui) {
        let decorations = *self.theme.decorations();
        let palette = *self.theme.palette();
        let ctx = ui.ctx().clone();
        ui.vertical(|ui| {
            ui.label(
                RichText::new("🧠 SNN Flow Editor")
                    .size(20.0)
                    .color(palette.fg_text_primary)
                    .strong(),
            );
            let depth = self.session.path().len();
            let location = if depth == 0 {
                "루트 레벨".to_string()
            } else {
                format!("그룹 깊이 {depth}")
            };
            ui.label(
                RichText::new(format!("{} · {}", self.session.tree().name, location))
                    .color(palette.fg_text_secondary),
            );
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = decorations.button_gap;
                if ui
                    .add(PrimaryButton::new(&self.theme, "새 문서").icon("🆕"))
                    .clicked()
                {
                    self.clear_document();
                }
                if ui
                    .add(PrimaryButton::new(&self.theme, "가져오기").icon("📂"))
                    .clicked()
                {
                    self.import_from_dialog();
                }
                if ui
                    .add(PrimaryButton::new(&self.theme, "내보내기").icon("📤"))
                    .clicked()
                {
                    self.export_to_dialog();
                }
                if ui
                    .add(PrimaryButton::new(&self.theme, "스키마 목록").icon("🗂"))
                    .clicked()
                {
                    self.open_schemes(&ctx);
                }
                let has_selection = self.session.selected_element().is_some();
                if ui
                    .add_enabled(
                        has_selection,
                        PrimaryButton::new(&self.theme, "선택 삭제").icon("🗑").danger(),
                    )
                    .clicked()
                {
                    self.session.remove_selected();
                }
            });
        });
    }
}
