use super::*;

/// 목록 항목 생성 시각을 표시용 문자열로 바꾼다.
fn format_created_at(created_at_ms: i64) -> String {
    let seconds = created_at_ms.div_euclid(1000);
    let days = seconds.div_euclid(86_400);
    let rem = seconds.rem_euclid(86_400);
    let (year, month, day) = civil_from_days(days);
    format!(
        "{year:04}-{month:02}-{day:02} {:02}:{:02} UTC",
        rem / 3600,
        (rem % 3600) / 60
    )
}

/// UNIX epoch 기준 일수를 그레고리력 날짜로 바꾼다.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

impl SnnFlowApp {
    /// 저장된 스키마 목록 창을 렌더링한다.
    pub(super) fn render_schemes_modal(&mut self, ctx: &egui::Context) {
        if !self.schemes_open {
            return;
        }
        let palette = *self.theme.palette();
        let mut open = true;
        let mut load_id: Option<String> = None;
        let mut delete_id: Option<String> = None;
        let mut save_current = false;
        egui::Window::new("스키마 목록")
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .collapsible(false)
            .resizable(false)
            .title_bar(false)
            .show(ctx, |ui| {
                ui.set_width(460.0);
                solid_section_header(ui, &self.theme, "🗂", "저장된 스키마");
                ui.add_space(10.0);
                if self.schemes.is_empty() {
                    ui.label(
                        RichText::new("저장된 스키마가 없습니다.").color(palette.fg_text_secondary),
                    );
                }
                egui::ScrollArea::vertical()
                    .max_height(320.0)
                    .auto_shrink([false, true])
                    .show(ui, |ui| {
                        egui::Grid::new("scheme_list")
                            .num_columns(3)
                            .striped(true)
                            .spacing([12.0, 6.0])
                            .show(ui, |ui| {
                                for scheme in &self.schemes {
                                    ui.label(RichText::new(&scheme.name).strong());
                                    ui.label(
                                        RichText::new(format_created_at(scheme.created_at_ms))
                                            .color(palette.fg_text_secondary),
                                    );
                                    ui.horizontal(|ui| {
                                        if ui.button("불러오기").clicked() {
                                            load_id = Some(scheme.id.clone());
                                        }
                                        if ui.button("삭제").clicked() {
                                            delete_id = Some(scheme.id.clone());
                                        }
                                    });
                                    ui.end_row();
                                }
                            });
                    });
                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    if ui
                        .add(PrimaryButton::new(&self.theme, "현재 문서 저장").icon("💾"))
                        .clicked()
                    {
                        save_current = true;
                    }
                    if ui
                        .add(PrimaryButton::new(&self.theme, "닫기").icon("✖"))
                        .clicked()
                    {
                        open = false;
                    }
                });
            });
        if save_current {
            self.save_current_scheme(ctx);
        }
        if let Some(id) = load_id {
            self.load_scheme(ctx, id);
        }
        if let Some(id) = delete_id {
            self.delete_scheme(ctx, id);
        }
        self.schemes_open = open;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_at_is_rendered_as_utc_date() {
        assert_eq!(format_created_at(0), "1970-01-01 00:00 UTC");
        assert_eq!(format_created_at(1_700_000_000_000), "2023-11-14 22:13 UTC");
    }
}
