use super::*;

/// 그래프 편집 화면 전체를 담당하는 뷰이다.
pub struct FlowEditorUi<'a> {
    /// 테마 참조.
    theme: &'a Theme,
    /// 편집 세션 참조.
    session: &'a mut EditorSession,
    /// 프레임 사이에 유지되는 캔버스 상태.
    canvas: &'a mut CanvasState,
}

impl<'a> FlowEditorUi<'a> {
    /// 뷰 인스턴스를 생성한다.
    pub fn new(
        theme: &'a Theme,
        session: &'a mut EditorSession,
        canvas: &'a mut CanvasState,
    ) -> Self {
        Self {
            theme,
            session,
            canvas,
        }
    }

    pub(super) fn theme(&self) -> &'a Theme {
        self.theme
    }

    pub(super) fn session(&self) -> &EditorSession {
        self.session
    }

    pub(super) fn session_mut(&mut self) -> &mut EditorSession {
        self.session
    }

    pub(super) fn canvas(&self) -> &CanvasState {
        self.canvas
    }

    pub(super) fn canvas_mut(&mut self) -> &mut CanvasState {
        self.canvas
    }

    /// 그룹으로 들어가고 들어간 레벨의 뷰포트로 전환한다.
    pub(super) fn enter_group(&mut self, group_id: &str) {
        let live = self.canvas.viewport;
        if let Some(viewport) = self.session.enter_group(group_id, live) {
            self.canvas.switch_level(viewport);
        }
    }

    /// 한 단계 위 레벨로 나온다.
    pub(super) fn leave_group(&mut self) {
        let live = self.canvas.viewport;
        if let Some(viewport) = self.session.leave_group(live) {
            self.canvas.switch_level(viewport);
        }
    }

    /// 브레드크럼 단계로 이동한다.
    pub(super) fn jump_to_depth(&mut self, depth: usize) {
        let live = self.canvas.viewport;
        let viewport = self.session.jump_to_depth(depth, live);
        self.canvas.switch_level(viewport);
    }

    /// 좌/중앙/우 패널을 구성한다.
    pub fn show(&mut self, ctx: &egui::Context) {
        let palette = *self.theme.palette();
        let decorations = *self.theme.decorations();
        let builder_colors = *self.theme.builder_colors();
        let palette_frame = egui::Frame {
            fill: palette.bg_sidebar,
            stroke: egui::Stroke::new(1.0, palette.border_soft),
            rounding: egui::Rounding::same(decorations.container_rounding),
            inner_margin: decorations.card_inner_margin,
            ..Default::default()
        };
        egui::SidePanel::left("flow_palette")
            .frame(palette_frame)
            .resizable(false)
            .default_width(220.0)
            .show(ctx, |ui| {
                self.render_palette(ui);
            });
        let panel_state = self.session.tree().panel_state;
        let property_frame = egui::Frame {
            fill: palette.bg_sidebar,
            stroke: egui::Stroke::new(1.0, palette.border_soft),
            rounding: egui::Rounding::same(decorations.container_rounding),
            inner_margin: decorations.card_inner_margin,
            ..Default::default()
        };
        if panel_state.collapsed {
            egui::SidePanel::right("flow_properties_collapsed")
                .frame(property_frame)
                .resizable(false)
                .exact_width(36.0)
                .show(ctx, |ui| {
                    if ui.button("◀").on_hover_text("설정 패널 펼치기").clicked() {
                        self.session.update_panel_state(PanelState {
                            collapsed: false,
                            ..panel_state
                        });
                    }
                });
        } else {
            egui::SidePanel::right("flow_properties")
                .frame(property_frame)
                .resizable(false)
                .exact_width(panel_state.width)
                .show(ctx, |ui| {
                    self.render_properties(ui, panel_state);
                });
        }
        let canvas_frame = egui::Frame {
            fill: builder_colors.canvas_fill,
            stroke: egui::Stroke::new(1.0, palette.border_soft),
            rounding: egui::Rounding::same(decorations.container_rounding),
            inner_margin: egui::Margin::same(12.0),
            ..Default::default()
        };
        egui::CentralPanel::default()
            .frame(canvas_frame)
            .show(ctx, |ui| {
                self.render_breadcrumbs(ui, palette);
                ui.add_space(6.0);
                self.render_canvas(ui, builder_colors);
            });
    }

    /// 캔버스 위에 현재 탐색 경로를 표시한다.
    fn render_breadcrumbs(&mut self, ui: &mut egui::Ui, palette: ThemePalette) {
        let crumbs = self.session.breadcrumbs();
        let last = crumbs.len().saturating_sub(1);
        let mut target: Option<usize> = None;
        ui.horizontal(|ui| {
            if ui
                .add_enabled(last > 0, egui::Button::new("⬆ 상위"))
                .clicked()
            {
                target = Some(last.saturating_sub(1));
            }
            ui.add_space(8.0);
            for (depth, crumb) in crumbs.iter().enumerate() {
                if depth > 0 {
                    ui.label(egui::RichText::new("›").color(palette.fg_text_secondary));
                }
                if depth == last {
                    ui.label(
                        egui::RichText::new(&crumb.label)
                            .color(palette.fg_text_primary)
                            .strong(),
                    );
                } else if ui.link(&crumb.label).clicked() {
                    target = Some(depth);
                }
            }
        });
        match target {
            Some(depth) if depth + 1 == last => self.leave_group(),
            Some(depth) => self.jump_to_depth(depth),
            None => {}
        }
    }
}
