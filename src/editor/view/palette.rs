use super::*;

impl<'a> FlowEditorUi<'a> {
    /// 노드 팔레트와 현재 레벨 요약을 렌더링한다.
    pub(super) fn render_palette(&mut self, ui: &mut egui::Ui) {
        let palette = *self.theme().palette();
        ui.heading("🧱 노드 팔레트");
        ui.separator();
        ui.label("추가할 노드 유형을 선택하세요.");
        ui.add_space(10.0);
        for kind in NodeKind::ALL {
            let button = egui::Button::new(kind.default_label())
                .fill(self.theme().node_kind_color(kind))
                .min_size(egui::vec2(ui.available_width(), 28.0));
            if ui.add(button).clicked() {
                let position = self.canvas().visible_center();
                let id = self.session_mut().create_node(position, kind);
                self.session_mut().select_only(Some(&id));
            }
        }

        ui.add_space(16.0);
        ui.separator();
        let level = self.session().current_level();
        ui.label(
            egui::RichText::new(format!(
                "노드 {}개 · 엣지 {}개",
                level.nodes.len(),
                level.edges.len()
            ))
            .color(palette.fg_text_secondary),
        );
        ui.label(
            egui::RichText::new("더블 클릭: 그룹 열기 · Delete: 선택 삭제")
                .small()
                .color(palette.fg_text_secondary),
        );

        let diagnostics = self.session().diagnostics();
        if !diagnostics.is_empty() {
            ui.add_space(12.0);
            ui.label(
                egui::RichText::new("⚠ 템플릿 참조 문제")
                    .color(palette.accent_warning)
                    .strong(),
            );
            for issue in diagnostics {
                ui.label(egui::RichText::new(issue.to_string()).small());
            }
        }
    }
}
