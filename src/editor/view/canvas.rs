use super::*;

const NODE_WIDTH: f32 = 180.0;
const HEADER_HEIGHT: f32 = 26.0;
const PORT_ROW_HEIGHT: f32 = 20.0;
const HANDLE_SIZE: f32 = 14.0;
const GRID_SPACING: f32 = 40.0;
const MIN_ZOOM: f32 = 0.2;
const MAX_ZOOM: f32 = 3.0;

/// 프레임 사이에 유지되는 캔버스 상호작용 상태.
#[derive(Debug, Clone, Default)]
pub struct CanvasState {
    /// 화면에 적용 중인 뷰포트. 레벨 전환 시 트리에 기록된다.
    pub viewport: Viewport,
    /// 연결을 끌고 있는 출발 노드.
    connecting_from: Option<String>,
    /// 열려 있는 노드 생성 메뉴.
    menu: Option<CreateMenu>,
    /// 마지막으로 그린 캔버스 크기.
    canvas_size: egui::Vec2,
    /// 추가할 전역 파라미터 이름 입력.
    pub(super) param_name_draft: String,
    /// 추가할 전역 파라미터 값 입력.
    pub(super) param_value_draft: String,
}

impl CanvasState {
    /// 주어진 뷰포트로 시작하는 상태를 만든다.
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    /// 다른 레벨로 전환하며 진행 중인 상호작용을 버린다.
    pub fn switch_level(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.connecting_from = None;
        self.menu = None;
    }

    /// 보이는 영역 중앙의 레벨 좌표.
    pub(super) fn visible_center(&self) -> Position {
        self.viewport
            .screen_to_level(self.canvas_size.x / 2.0, self.canvas_size.y / 2.0)
    }

    /// 포인터 위치를 기준으로 확대/축소한다.
    fn zoom_at(&mut self, pointer: egui::Vec2, factor: f32) {
        let anchor = self.viewport.screen_to_level(pointer.x, pointer.y);
        let zoom = (self.viewport.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.viewport = Viewport {
            offset_x: pointer.x - anchor.x * zoom,
            offset_y: pointer.y - anchor.y * zoom,
            zoom,
        };
    }
}

/// 우클릭으로 연 노드 생성 메뉴.
#[derive(Debug, Clone, Copy)]
struct CreateMenu {
    /// 메뉴를 띄울 화면 좌표.
    screen_pos: egui::Pos2,
    /// 새 노드가 놓일 레벨 좌표.
    level_pos: Position,
    /// 연 프레임에는 바깥 클릭으로 닫지 않는다.
    just_opened: bool,
}

/// 노드 하나를 그리는 데 필요한 값.
struct NodeLayout {
    id: String,
    kind: NodeKind,
    rect: egui::Rect,
}

/// 노드 유형과 포트 행 수로 레벨 좌표계 크기를 정한다.
fn node_size(kind: NodeKind, port_rows: usize) -> egui::Vec2 {
    let body = match kind {
        NodeKind::Input | NodeKind::Output => 26.0,
        NodeKind::Population => 40.0,
        NodeKind::Group => 12.0 + port_rows as f32 * PORT_ROW_HEIGHT,
    };
    egui::vec2(NODE_WIDTH, HEADER_HEIGHT + body)
}

fn accepts_input(kind: NodeKind) -> bool {
    kind != NodeKind::Input
}

fn emits_output(kind: NodeKind) -> bool {
    kind != NodeKind::Output
}

fn edge_points(from: egui::Rect, to: egui::Rect, zoom: f32) -> [egui::Pos2; 4] {
    let start = from.right_center();
    let end = to.left_center();
    let bend = ((end.x - start.x).abs() / 2.0).max(40.0 * zoom);
    [
        start,
        start + egui::vec2(bend, 0.0),
        end - egui::vec2(bend, 0.0),
        end,
    ]
}

fn bezier_midpoint(points: &[egui::Pos2; 4]) -> egui::Pos2 {
    let [p0, p1, p2, p3] = *points;
    egui::pos2(
        0.125 * p0.x + 0.375 * p1.x + 0.375 * p2.x + 0.125 * p3.x,
        0.125 * p0.y + 0.375 * p1.y + 0.375 * p2.y + 0.125 * p3.y,
    )
}

impl<'a> FlowEditorUi<'a> {
    /// 캔버스를 렌더링하고 노드/연결 상호작용을 처리한다.
    pub(super) fn render_canvas(&mut self, ui: &mut egui::Ui, colors: BuilderColors) {
        let rect = ui.available_rect_before_wrap();
        ui.allocate_rect(rect, egui::Sense::hover());
        self.canvas_mut().canvas_size = rect.size();
        let painter = ui.painter_at(rect);
        let viewport = self.canvas().viewport;
        let level = self.session().current_level();

        self.draw_grid(&painter, rect, viewport, colors);

        let to_screen = |position: Position| {
            let (x, y) = viewport.level_to_screen(position);
            rect.min + egui::vec2(x, y)
        };
        let layouts: Vec<NodeLayout> = level
            .nodes
            .iter()
            .map(|node| {
                let rows = self
                    .session()
                    .group_ports(&node.id)
                    .map(|ports| ports.row_count())
                    .unwrap_or(1);
                NodeLayout {
                    id: node.id.clone(),
                    kind: node.kind,
                    rect: egui::Rect::from_min_size(
                        to_screen(node.position),
                        node_size(node.kind, rows) * viewport.zoom,
                    ),
                }
            })
            .collect();
        let rect_of = |id: &str| layouts.iter().find(|layout| layout.id == id).map(|l| l.rect);

        // 엣지
        let mut clicked_edge: Option<String> = None;
        for edge in &level.edges {
            let (Some(from), Some(to)) =
                (rect_of(&edge.source_node_id), rect_of(&edge.target_node_id))
            else {
                continue;
            };
            let points = edge_points(from, to, viewport.zoom);
            let stroke_color = if edge.selected {
                colors.connection_selected
            } else {
                colors.connection_stroke
            };
            painter.add(CubicBezierShape::from_points_stroke(
                points,
                false,
                egui::Color32::TRANSPARENT,
                Stroke::new(2.0, stroke_color),
            ));
            let mid = bezier_midpoint(&points);
            let hit = egui::Rect::from_center_size(mid, egui::vec2(HANDLE_SIZE, HANDLE_SIZE));
            let edge_response =
                ui.interact(hit, egui::Id::new(("flow_edge", &edge.id)), egui::Sense::click());
            let radius = if edge_response.hovered() { 5.0 } else { 3.5 };
            painter.circle_filled(mid, radius, stroke_color);
            if edge_response.clicked() {
                clicked_edge = Some(edge.id.clone());
            }
        }

        // 연결 핸들
        let pointer = ui.ctx().input(|i| i.pointer.hover_pos());
        let mut connect_request: Option<(String, String)> = None;
        for layout in layouts.iter().filter(|layout| emits_output(layout.kind)) {
            let center = layout.rect.right_center();
            let hit = egui::Rect::from_center_size(center, egui::vec2(HANDLE_SIZE, HANDLE_SIZE));
            let handle_response = ui.interact(
                hit,
                egui::Id::new(("flow_handle", &layout.id)),
                egui::Sense::drag(),
            );
            if handle_response.drag_started() {
                self.canvas_mut().connecting_from = Some(layout.id.clone());
            }
            let connecting = self.canvas().connecting_from.as_deref() == Some(layout.id.as_str());
            if connecting && handle_response.dragged() {
                if let Some(pointer) = pointer {
                    let end_rect = egui::Rect::from_center_size(pointer, egui::Vec2::ZERO);
                    let mut points = edge_points(layout.rect, end_rect, viewport.zoom);
                    points[3] = pointer;
                    painter.add(CubicBezierShape::from_points_stroke(
                        points,
                        false,
                        egui::Color32::TRANSPARENT,
                        Stroke::new(2.0, colors.connection_selected),
                    ));
                }
            }
            if connecting && handle_response.drag_released() {
                let target = pointer.and_then(|pos| {
                    layouts
                        .iter()
                        .rev()
                        .find(|other| other.rect.contains(pos) && accepts_input(other.kind))
                        .map(|other| other.id.clone())
                });
                if let Some(target) = target.filter(|target| *target != layout.id) {
                    connect_request = Some((layout.id.clone(), target));
                }
                self.canvas_mut().connecting_from = None;
            }
        }

        // 노드
        let mut position_changes: Vec<NodeChange> = Vec::new();
        let mut clicked_node: Option<String> = None;
        let mut entered_group: Option<String> = None;
        for layout in &layouts {
            let Some(node) = level.node(&layout.id) else {
                continue;
            };
            let node_response = ui.interact(
                layout.rect,
                egui::Id::new(("flow_node", &layout.id)),
                egui::Sense::click_and_drag(),
            );
            if node_response.dragged_by(egui::PointerButton::Primary) {
                let delta = node_response.drag_delta() / viewport.zoom;
                if delta != egui::Vec2::ZERO {
                    position_changes.push(NodeChange::Position {
                        id: node.id.clone(),
                        position: node.position.offset(delta.x, delta.y),
                    });
                }
            }
            if node_response.clicked() {
                clicked_node = Some(node.id.clone());
            }
            if node_response.double_clicked() && node.is_group() {
                entered_group = Some(node.id.clone());
            }
            self.draw_node(&painter, layout.rect, node, colors, viewport.zoom);
        }
        for layout in &layouts {
            if accepts_input(layout.kind) {
                painter.circle_filled(
                    layout.rect.left_center(),
                    5.0 * viewport.zoom,
                    colors.handle_fill,
                );
            }
            if emits_output(layout.kind) {
                painter.circle_filled(
                    layout.rect.right_center(),
                    5.0 * viewport.zoom,
                    colors.handle_fill,
                );
            }
        }

        // 배경: 이동, 확대/축소, 선택 해제, 생성 메뉴
        let background = ui.interact(
            rect,
            egui::Id::new("flow_canvas_background"),
            egui::Sense::click_and_drag(),
        );
        let mut viewport_committed = false;
        if background.dragged() {
            let delta = background.drag_delta();
            let canvas = self.canvas_mut();
            canvas.viewport.offset_x += delta.x;
            canvas.viewport.offset_y += delta.y;
        }
        if background.drag_released() {
            viewport_committed = true;
        }
        if background.hovered() {
            let factor = ui.ctx().input(|i| i.zoom_delta());
            if let Some(hover) = background.hover_pos().filter(|_| factor != 1.0) {
                self.canvas_mut().zoom_at(hover - rect.min, factor);
                viewport_committed = true;
            }
        }
        if background.secondary_clicked() {
            if let Some(screen_pos) = background.interact_pointer_pos() {
                let local = screen_pos - rect.min;
                let level_pos = self.canvas().viewport.screen_to_level(local.x, local.y);
                self.canvas_mut().menu = Some(CreateMenu {
                    screen_pos,
                    level_pos,
                    just_opened: true,
                });
            }
        }
        let create_request = self.render_create_menu(ui);
        if background.clicked() {
            clicked_node = None;
            clicked_edge = None;
            self.session_mut().select_only(None);
        }

        // 상태 반영
        if !position_changes.is_empty() {
            self.session_mut().apply_node_changes(&position_changes);
        }
        if let Some(id) = clicked_node.or(clicked_edge) {
            self.session_mut().select_only(Some(&id));
        }
        if let Some((source, target)) = connect_request {
            self.session_mut().connect(&source, &target);
        }
        if let Some((kind, position)) = create_request {
            let id = self.session_mut().create_node(position, kind);
            self.session_mut().select_only(Some(&id));
        }
        let delete_pressed = !ui.ctx().wants_keyboard_input()
            && ui.ctx().input(|i| i.key_pressed(egui::Key::Delete));
        if delete_pressed {
            self.session_mut().remove_selected();
        }
        if viewport_committed {
            let viewport = self.canvas().viewport;
            self.session_mut().update_viewport(viewport);
        }
        if let Some(group_id) = entered_group {
            self.enter_group(&group_id);
        }
    }

    /// 노드 생성 메뉴를 그리고 선택된 유형과 위치를 돌려준다.
    fn render_create_menu(&mut self, ui: &mut egui::Ui) -> Option<(NodeKind, Position)> {
        let menu = self.canvas().menu?;
        let mut chosen: Option<NodeKind> = None;
        let mut close = false;
        let area = egui::Area::new(egui::Id::new("flow_create_menu"))
            .fixed_pos(menu.screen_pos)
            .show(ui.ctx(), |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.label("노드 추가");
                    ui.separator();
                    for kind in NodeKind::ALL {
                        if ui.button(kind.default_label()).clicked() {
                            chosen = Some(kind);
                        }
                    }
                    ui.separator();
                    if ui.button("취소").clicked() {
                        close = true;
                    }
                });
            });
        if !menu.just_opened && ui.input(|i| i.pointer.primary_clicked()) {
            let outside = ui
                .input(|i| i.pointer.interact_pos())
                .is_some_and(|pos| !area.response.rect.contains(pos));
            close |= outside;
        }
        let canvas = self.canvas_mut();
        if chosen.is_some() || close {
            canvas.menu = None;
        } else if let Some(open) = canvas.menu.as_mut() {
            open.just_opened = false;
        }
        chosen.map(|kind| (kind, menu.level_pos))
    }

    /// 뷰포트에 맞춰 배경 격자를 그린다.
    fn draw_grid(
        &self,
        painter: &egui::Painter,
        rect: egui::Rect,
        viewport: Viewport,
        colors: BuilderColors,
    ) {
        let spacing = GRID_SPACING * viewport.zoom;
        if spacing < 8.0 {
            return;
        }
        let stroke = Stroke::new(1.0, colors.grid_stroke);
        let mut x = rect.min.x + viewport.offset_x.rem_euclid(spacing);
        while x < rect.max.x {
            painter.line_segment([egui::pos2(x, rect.min.y), egui::pos2(x, rect.max.y)], stroke);
            x += spacing;
        }
        let mut y = rect.min.y + viewport.offset_y.rem_euclid(spacing);
        while y < rect.max.y {
            painter.line_segment([egui::pos2(rect.min.x, y), egui::pos2(rect.max.x, y)], stroke);
            y += spacing;
        }
    }

    /// 개별 노드를 드로잉한다.
    fn draw_node(
        &self,
        painter: &egui::Painter,
        rect: egui::Rect,
        node: &SchemaNode,
        colors: BuilderColors,
        zoom: f32,
    ) {
        let theme = self.theme();
        let rounding = 8.0 * zoom;
        painter.rect_filled(rect, rounding, colors.node_fill);
        let header =
            egui::Rect::from_min_size(rect.min, egui::vec2(rect.width(), HEADER_HEIGHT * zoom));
        painter.rect_filled(
            header,
            egui::Rounding {
                nw: rounding,
                ne: rounding,
                sw: 0.0,
                se: 0.0,
            },
            theme.node_kind_color(node.kind),
        );
        let border = if node.selected {
            Stroke::new(2.0, colors.node_selected)
        } else {
            Stroke::new(1.2, colors.node_border)
        };
        painter.rect_stroke(rect, rounding, border);
        painter.text(
            header.left_center() + egui::vec2(8.0 * zoom, 0.0),
            egui::Align2::LEFT_CENTER,
            node.label(),
            egui::FontId::proportional(14.0 * zoom),
            colors.text_primary,
        );

        let body_top = header.max.y + 4.0 * zoom;
        let small = egui::FontId::proportional(11.0 * zoom);
        match node.kind {
            NodeKind::Population => {
                let neuron = node
                    .attributes
                    .get(NEURON_TYPE_KEY)
                    .and_then(Value::as_str)
                    .unwrap_or(catalog::DEFAULT_NEURON_MODEL);
                painter.text(
                    egui::pos2(rect.min.x + 8.0 * zoom, body_top),
                    egui::Align2::LEFT_TOP,
                    neuron,
                    small,
                    colors.text_secondary,
                );
            }
            NodeKind::Group => {
                let status = self.session().group_status(&node.id);
                let badge = match status {
                    Some(GroupStatus::Template) => "템플릿",
                    Some(GroupStatus::Child) => "자식",
                    _ => "",
                };
                if !badge.is_empty() {
                    painter.text(
                        header.right_center() - egui::vec2(8.0 * zoom, 0.0),
                        egui::Align2::RIGHT_CENTER,
                        badge,
                        small.clone(),
                        colors.text_primary,
                    );
                }
                if let Some(ports) = self.session().group_ports(&node.id) {
                    for (row, port) in ports.inputs.iter().enumerate() {
                        painter.text(
                            egui::pos2(
                                rect.min.x + 10.0 * zoom,
                                body_top + row as f32 * PORT_ROW_HEIGHT * zoom,
                            ),
                            egui::Align2::LEFT_TOP,
                            &port.label,
                            small.clone(),
                            colors.text_secondary,
                        );
                    }
                    for (row, port) in ports.outputs.iter().enumerate() {
                        painter.text(
                            egui::pos2(
                                rect.max.x - 10.0 * zoom,
                                body_top + row as f32 * PORT_ROW_HEIGHT * zoom,
                            ),
                            egui::Align2::RIGHT_TOP,
                            &port.label,
                            small.clone(),
                            colors.text_secondary,
                        );
                    }
                }
            }
            NodeKind::Input | NodeKind::Output => {
                painter.text(
                    egui::pos2(rect.min.x + 8.0 * zoom, body_top),
                    egui::Align2::LEFT_TOP,
                    node.kind.type_tag(),
                    small,
                    colors.text_secondary,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zooming_keeps_the_point_under_the_pointer_fixed() {
        let mut canvas = CanvasState::new(Viewport {
            offset_x: 30.0,
            offset_y: -20.0,
            zoom: 1.0,
        });
        let pointer = egui::vec2(200.0, 150.0);
        let before = canvas.viewport.screen_to_level(pointer.x, pointer.y);

        canvas.zoom_at(pointer, 2.0);

        let after = canvas.viewport.screen_to_level(pointer.x, pointer.y);
        assert_eq!(canvas.viewport.zoom, 2.0);
        assert!((before.x - after.x).abs() < 1e-3);
        assert!((before.y - after.y).abs() < 1e-3);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut canvas = CanvasState::default();
        canvas.zoom_at(egui::Vec2::ZERO, 100.0);
        assert_eq!(canvas.viewport.zoom, MAX_ZOOM);
    }

    #[test]
    fn switching_level_drops_pending_interaction() {
        let mut canvas = CanvasState::default();
        canvas.connecting_from = Some("a".into());
        canvas.switch_level(Viewport {
            zoom: 0.5,
            ..Viewport::default()
        });
        assert!(canvas.connecting_from.is_none());
        assert_eq!(canvas.viewport.zoom, 0.5);
    }

    #[test]
    fn visible_center_maps_through_the_viewport() {
        let mut canvas = CanvasState::new(Viewport {
            offset_x: 100.0,
            offset_y: 50.0,
            zoom: 2.0,
        });
        canvas.canvas_size = egui::vec2(400.0, 300.0);
        assert_eq!(canvas.visible_center(), Position::new(50.0, 50.0));
    }

    #[test]
    fn group_height_grows_with_port_rows() {
        assert!(node_size(NodeKind::Group, 3).y > node_size(NodeKind::Group, 1).y);
    }
}
