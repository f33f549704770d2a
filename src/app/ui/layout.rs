use super::*;

impl SnnFlowApp {
    /// 툴바, 상태 표시줄, 편집 화면을 배치한다.
    fn render_editor_view(&mut self, ctx: &egui::Context) {
        let palette = *self.theme.palette();
        let decorations = *self.theme.decorations();
        let toolbar_frame = egui::Frame {
            fill: palette.bg_toolbar,
            stroke: egui::Stroke::new(1.0, palette.border_soft),
            rounding: egui::Rounding::same(decorations.toolbar_rounding),
            inner_margin: decorations.card_inner_margin,
            ..Default::default()
        };
        egui::TopBottomPanel::top("flow_toolbar")
            .frame(toolbar_frame)
            .resizable(false)
            .show(ctx, |ui| {
                self.render_toolbar(ui);
            });
        let status_frame = egui::Frame {
            fill: palette.bg_panel,
            stroke: egui::Stroke::new(1.0, palette.border_soft),
            rounding: egui::Rounding::same(decorations.card_rounding),
            inner_margin: egui::Margin::symmetric(16.0, 6.0),
            ..Default::default()
        };
        egui::TopBottomPanel::bottom("flow_status")
            .frame(status_frame)
            .resizable(false)
            .show(ctx, |ui| {
                self.render_status_bar(ui);
            });
        let mut editor_ui = FlowEditorUi::new(&self.theme, &mut self.session, &mut self.canvas);
        editor_ui.show(ctx);
    }
}

impl eframe::App for SnnFlowApp {
    /// egui 메인 루프에서 호출되어 UI를 갱신한다.
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        self.drain_events();
        self.render_editor_view(ctx);
        self.render_schemes_modal(ctx);
        self.sync_autosave();
        if self.autosave_pending() {
            ctx.request_repaint_after(self.autosave_debounce());
        }
    }
}
