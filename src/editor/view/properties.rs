use super::*;

/// 파라미터 명세에 맞는 입력 위젯을 그린다. 값이 바뀌면 `true`.
fn param_editor(ui: &mut egui::Ui, spec: &ParamSpec, value: &mut Value) -> bool {
    match spec.default {
        ParamDefault::Float(default) => {
            let mut number = value.as_f64().unwrap_or(default);
            let changed = ui
                .add(egui::DragValue::new(&mut number).speed(0.01))
                .changed();
            if changed {
                *value = Value::from(number);
            }
            changed
        }
        ParamDefault::Int(default) => {
            let mut number = value.as_i64().unwrap_or(default);
            let changed = ui.add(egui::DragValue::new(&mut number)).changed();
            if changed {
                *value = Value::from(number);
            }
            changed
        }
        ParamDefault::Bool(default) => {
            let mut flag = value.as_bool().unwrap_or(default);
            let changed = ui.checkbox(&mut flag, "").changed();
            if changed {
                *value = Value::from(flag);
            }
            changed
        }
        ParamDefault::Choice(options) => {
            let fallback = options.first().copied().unwrap_or("");
            let current = value.as_str().unwrap_or(fallback).to_string();
            let mut changed = false;
            egui::ComboBox::from_id_source(("param_choice", spec.name))
                .selected_text(&current)
                .show_ui(ui, |ui| {
                    for option in options {
                        if ui.selectable_label(current == *option, *option).clicked() {
                            *value = Value::from(*option);
                            changed = true;
                        }
                    }
                });
            changed
        }
    }
}

/// 모델 선택 콤보와 파라미터 폼을 그리고, 바뀐 부분 속성을 돌려준다.
fn model_form(
    ui: &mut egui::Ui,
    id_source: &str,
    models: &'static [ModelSpec],
    type_key: &str,
    params_key: &str,
    default_model: &str,
    attributes: &Attributes,
) -> Option<Attributes> {
    let current = attributes
        .get(type_key)
        .and_then(Value::as_str)
        .unwrap_or(default_model)
        .to_string();
    let mut partial: Option<Attributes> = None;
    egui::ComboBox::from_id_source((id_source, "model"))
        .selected_text(&current)
        .width(ui.available_width())
        .show_ui(ui, |ui| {
            for model in models {
                if ui
                    .selectable_label(current == model.name, model.name)
                    .clicked()
                    && current != model.name
                {
                    let mut next = single(type_key, model.name);
                    next.insert(params_key.to_string(), Value::Object(model.default_params()));
                    partial = Some(next);
                }
            }
        });
    if partial.is_some() {
        return partial;
    }

    let Some(spec) = models.iter().find(|model| model.name == current) else {
        ui.label(format!("알 수 없는 모델: {current}"));
        return None;
    };
    let mut params = catalog::params_with_defaults(spec, attributes.get(params_key));
    let mut changed = false;
    egui::Grid::new((id_source, "params"))
        .num_columns(2)
        .spacing([8.0, 4.0])
        .show(ui, |ui| {
            for param in spec.params {
                ui.label(param.label);
                if let Some(value) = params.get_mut(param.name) {
                    changed |= param_editor(ui, param, value);
                }
                ui.end_row();
            }
        });
    changed.then(|| single(params_key, Value::Object(params)))
}

/// 자유 입력 문자열을 JSON 값으로 해석한다. 실패하면 문자열 그대로다.
fn parse_param_value(text: &str) -> Value {
    serde_json::from_str(text.trim()).unwrap_or_else(|_| Value::String(text.to_string()))
}

impl<'a> FlowEditorUi<'a> {
    /// 우측 설정 패널을 렌더링한다.
    pub(super) fn render_properties(&mut self, ui: &mut egui::Ui, panel_state: PanelState) {
        let palette = *self.theme().palette();
        let decorations = *self.theme().decorations();
        let mut next_panel = panel_state;
        ui.horizontal(|ui| {
            ui.heading("⚙️ 설정");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("▶").on_hover_text("설정 패널 접기").clicked() {
                    next_panel.collapsed = true;
                }
            });
        });
        ui.add(egui::Slider::new(&mut next_panel.width, 220.0..=600.0).text("패널 너비"));
        if next_panel != panel_state {
            self.session_mut().update_panel_state(next_panel);
        }
        ui.separator();

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                self.render_document_section(ui);
                ui.add_space(8.0);
                egui::Frame::none()
                    .fill(palette.bg_panel)
                    .stroke(egui::Stroke::new(1.0, palette.border_soft))
                    .rounding(egui::Rounding::same(decorations.card_rounding))
                    .inner_margin(decorations.card_inner_margin)
                    .show(ui, |ui| {
                        let Some(selected) = self.session().selected_element() else {
                            ui.label(
                                egui::RichText::new("선택된 요소가 없습니다.")
                                    .color(palette.fg_text_secondary),
                            );
                            return;
                        };
                        ui.small(
                            egui::RichText::new(format!("ID {}", selected.id()))
                                .color(palette.fg_text_secondary),
                        );
                        match selected {
                            SelectedElement::Node(node) => self.render_node_section(ui, &node),
                            SelectedElement::Edge(edge) => self.render_edge_section(ui, &edge),
                        }
                    });
                ui.add_space(8.0);
                self.render_global_params(ui, palette, decorations);
            });
    }

    /// 문서 이름을 편집한다.
    fn render_document_section(&mut self, ui: &mut egui::Ui) {
        ui.label("문서 이름");
        let mut name = self.session().tree().name.clone();
        if ui.text_edit_singleline(&mut name).changed() {
            self.session_mut().rename(&name);
        }
    }

    /// 선택된 노드의 라벨과 유형별 속성을 편집한다.
    fn render_node_section(&mut self, ui: &mut egui::Ui, node: &SchemaNode) {
        ui.heading(format!("{} 노드", node.kind));
        ui.small(format!("ID: {}", node.id));
        ui.add_space(6.0);
        ui.label("라벨");
        let mut label = node.label().to_string();
        if ui.text_edit_singleline(&mut label).changed() {
            self.session_mut()
                .update_element_attributes(&node.id, &single(LABEL_KEY, label));
        }
        ui.add_space(6.0);
        match node.kind {
            NodeKind::Population => {
                ui.label("뉴런 모델");
                if let Some(partial) = model_form(
                    ui,
                    "neuron",
                    catalog::neuron_models(),
                    NEURON_TYPE_KEY,
                    NEURON_PARAMS_KEY,
                    catalog::DEFAULT_NEURON_MODEL,
                    &node.attributes,
                ) {
                    self.session_mut()
                        .update_element_attributes(&node.id, &partial);
                }
            }
            NodeKind::Group => self.render_group_section(ui, node),
            NodeKind::Input | NodeKind::Output => {}
        }
    }

    /// 그룹 상태와 템플릿 관련 동작을 표시한다.
    fn render_group_section(&mut self, ui: &mut egui::Ui, node: &SchemaNode) {
        let status = self.session().group_status(&node.id);
        let status_text = match status {
            Some(GroupStatus::Template) => "템플릿 그룹 (다른 그룹이 내용을 공유함)",
            Some(GroupStatus::Child) => "자식 그룹 (템플릿 내용을 공유함)",
            _ => "독립 그룹",
        };
        ui.label(status_text);
        if let Some(ports) = self.session().group_ports(&node.id) {
            ui.small(format!(
                "입력 포트 {}개 · 출력 포트 {}개",
                ports.inputs.len(),
                ports.outputs.len()
            ));
        }
        ui.add_space(6.0);
        ui.horizontal_wrapped(|ui| {
            let can_enter = self.session().can_enter(&node.id);
            if ui
                .add_enabled(can_enter, egui::Button::new("열기"))
                .on_disabled_hover_text("하위 그래프가 비어 있습니다.")
                .clicked()
            {
                self.enter_group(&node.id);
            }
            if ui.button("복제").clicked() {
                if let Some(new_id) = self.session_mut().duplicate_group(&node.id) {
                    self.session_mut().select_only(Some(&new_id));
                }
            }
            let is_child = self.session().can_detach(&node.id);
            if ui
                .add_enabled(is_child, egui::Button::new("템플릿에서 분리"))
                .clicked()
            {
                self.session_mut().detach_group(&node.id);
            }
        });
    }

    /// 선택된 엣지의 프로젝션 설정을 편집한다.
    fn render_edge_section(&mut self, ui: &mut egui::Ui, edge: &SchemaEdge) {
        let level = self.session().current_level();
        let label_of = |id: &str| {
            level
                .node(id)
                .map(|node| node.label().to_string())
                .unwrap_or_else(|| id.to_string())
        };
        ui.heading("프로젝션");
        ui.small(format!(
            "{} → {}",
            label_of(&edge.source_node_id),
            label_of(&edge.target_node_id)
        ));
        ui.add_space(6.0);
        let mut animated = edge
            .attributes
            .get(ANIMATED_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if ui.checkbox(&mut animated, "애니메이션").changed() {
            self.session_mut()
                .update_element_attributes(&edge.id, &single(ANIMATED_KEY, animated));
        }
        ui.label("시냅스 모델");
        if let Some(partial) = model_form(
            ui,
            "synapse",
            catalog::synapse_models(),
            PROJECTION_TYPE_KEY,
            PROJECTION_PARAMS_KEY,
            catalog::DEFAULT_SYNAPSE_MODEL,
            &edge.attributes,
        ) {
            self.session_mut()
                .update_element_attributes(&edge.id, &partial);
        }
        ui.add_space(6.0);
        if ui.button("엣지 삭제").clicked() {
            self.session_mut().remove_selected();
        }
    }

    /// 전역 파라미터 목록을 편집한다.
    fn render_global_params(
        &mut self,
        ui: &mut egui::Ui,
        palette: ThemePalette,
        decorations: ThemeDecorations,
    ) {
        ui.label(
            egui::RichText::new("🌐 전역 파라미터")
                .color(palette.fg_text_primary)
                .strong(),
        );
        let params = self.session().tree().global_parameters.clone();
        let mut removed: Option<String> = None;
        let mut updated: Option<(String, Value)> = None;
        egui::Frame::none()
            .fill(palette.bg_panel)
            .stroke(egui::Stroke::new(1.0, palette.border_soft))
            .rounding(egui::Rounding::same(decorations.card_rounding))
            .inner_margin(egui::Margin::symmetric(8.0, 6.0))
            .show(ui, |ui| {
                if params.is_empty() {
                    ui.label(
                        egui::RichText::new("정의된 파라미터가 없습니다.")
                            .color(palette.fg_text_secondary),
                    );
                }
                egui::Grid::new("global_params")
                    .num_columns(3)
                    .spacing([8.0, 4.0])
                    .show(ui, |ui| {
                        for param in &params {
                            ui.label(&param.name).on_hover_text(param.kind.as_str());
                            let mut value = param.value.clone();
                            let changed = match param.kind {
                                ParamKind::Float => {
                                    let mut number = value.as_f64().unwrap_or_default();
                                    let changed = ui
                                        .add(egui::DragValue::new(&mut number).speed(0.01))
                                        .changed();
                                    value = Value::from(number);
                                    changed
                                }
                                ParamKind::Int => {
                                    let mut number = value.as_i64().unwrap_or_default();
                                    let changed =
                                        ui.add(egui::DragValue::new(&mut number)).changed();
                                    value = Value::from(number);
                                    changed
                                }
                                ParamKind::Bool => {
                                    let mut flag = value.as_bool().unwrap_or_default();
                                    let changed = ui.checkbox(&mut flag, "").changed();
                                    value = Value::from(flag);
                                    changed
                                }
                                ParamKind::Text => {
                                    let mut text = value.as_str().unwrap_or_default().to_string();
                                    let changed = ui.text_edit_singleline(&mut text).changed();
                                    value = Value::from(text);
                                    changed
                                }
                                ParamKind::Json => {
                                    ui.label(value.to_string());
                                    false
                                }
                            };
                            if changed {
                                updated = Some((param.name.clone(), value));
                            }
                            if ui.small_button("✖").clicked() {
                                removed = Some(param.name.clone());
                            }
                            ui.end_row();
                        }
                    });
            });

        ui.add_space(4.0);
        let mut added: Option<(String, Value)> = None;
        ui.horizontal(|ui| {
            let canvas = self.canvas_mut();
            ui.add(
                egui::TextEdit::singleline(&mut canvas.param_name_draft)
                    .hint_text("이름")
                    .desired_width(90.0),
            );
            ui.add(
                egui::TextEdit::singleline(&mut canvas.param_value_draft)
                    .hint_text("값")
                    .desired_width(90.0),
            );
            let name = canvas.param_name_draft.trim().to_string();
            if ui
                .add_enabled(!name.is_empty(), egui::Button::new("추가"))
                .clicked()
            {
                added = Some((name, parse_param_value(&canvas.param_value_draft)));
                canvas.param_name_draft.clear();
                canvas.param_value_draft.clear();
            }
        });

        if let Some((name, value)) = updated.or(added) {
            self.session_mut()
                .update_element_attributes(GLOBAL_SCOPE_ID, &single(&name, value));
        }
        if let Some(name) = removed {
            self.session_mut().remove_global_parameter(&name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn free_text_values_are_parsed_as_json_when_possible() {
        assert_eq!(parse_param_value("0.5"), json!(0.5));
        assert_eq!(parse_param_value("true"), json!(true));
        assert_eq!(parse_param_value("[1, 2]"), json!([1, 2]));
        assert_eq!(parse_param_value("cortex"), json!("cortex"));
    }
}
