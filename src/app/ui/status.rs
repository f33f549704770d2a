use super::*;

/// 자동 저장 상태를 아이콘과 문구로 바꾼다.
pub(super) fn autosave_indicator(
    loaded: bool,
    pending: bool,
    revision: u64,
    saved_revision: Option<u64>,
) -> (&'static str, &'static str) {
    if !loaded {
        return ("⏳", "불러오는 중");
    }
    if pending {
        return ("✏", "변경 사항 저장 대기");
    }
    match saved_revision {
        Some(saved) if saved == revision => ("✅", "자동 저장됨"),
        Some(_) => ("💾", "저장 중"),
        None => ("•", "변경 없음"),
    }
}

impl SnnFlowApp {
    /// 하단 상태 표시줄을 그린다.
    pub(super) fn render_status_bar(&mut self, ui: &mut egui::Ui) {
        let palette = *self.theme.palette();
        let (icon, text) = autosave_indicator(
            self.loaded,
            self.autosave_pending(),
            self.session.revision(),
            self.saved_revision,
        );
        ui.horizontal(|ui| {
            ui.label(RichText::new(format!("{icon} {text}")).color(palette.fg_text_secondary));
            ui.separator();
            if let Some(err) = &self.last_error {
                ui.label(RichText::new(err).color(palette.accent_error).strong());
                if ui.small_button("닫기").clicked() {
                    self.last_error = None;
                }
            } else if let Some(notice) = &self.notice {
                ui.label(RichText::new(notice).color(palette.fg_text_primary));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_follows_the_save_lifecycle() {
        assert_eq!(autosave_indicator(false, false, 1, None).1, "불러오는 중");
        assert_eq!(autosave_indicator(true, true, 2, Some(1)).1, "변경 사항 저장 대기");
        assert_eq!(autosave_indicator(true, false, 2, Some(1)).1, "저장 중");
        assert_eq!(autosave_indicator(true, false, 2, Some(2)).1, "자동 저장됨");
    }
}
