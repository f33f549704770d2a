use crate::theme::{Theme, blend_color};
use eframe::egui::{self, RichText, Widget};

/// 툴바와 모달에서 쓰는 단색 버튼 위젯.
pub(super) struct PrimaryButton<'a> {
    theme: &'a Theme,
    label: &'a str,
    icon: &'a str,
    danger: bool,
}

impl<'a> PrimaryButton<'a> {
    pub(super) fn new(theme: &'a Theme, label: &'a str) -> Self {
        Self {
            theme,
            label,
            icon: "",
            danger: false,
        }
    }

    pub(super) fn icon(mut self, icon: &'a str) -> Self {
        self.icon = icon;
        self
    }

    /// 되돌릴 수 없는 동작에 쓰는 경고색 버튼으로 바꾼다.
    pub(super) fn danger(mut self) -> Self {
        self.danger = true;
        self
    }
}

impl<'a> Widget for PrimaryButton<'a> {
    fn ui(self, ui: &mut egui::Ui) -> egui::Response {
        let decorations = self.theme.decorations();
        let palette = self.theme.palette();
        let enabled = ui.is_enabled();

        let text = if self.icon.is_empty() {
            self.label.to_string()
        } else {
            format!("{}  {}", self.icon, self.label)
        };
        let font_size = 15.0;
        let rich = RichText::new(text).size(font_size).strong().color(if enabled {
            egui::Color32::WHITE
        } else {
            blend_color(palette.fg_text_secondary, palette.bg_panel, 0.4)
        });

        let text_height = ui.ctx().fonts(|f| {
            f.row_height(&egui::FontId::new(font_size, egui::FontFamily::Proportional))
        });
        let accent = if self.danger {
            palette.accent_error
        } else {
            palette.accent_primary
        };
        let fill = if enabled {
            accent
        } else {
            blend_color(accent, palette.border_soft, 0.5)
        };
        let button = egui::Button::new(rich)
            .min_size(egui::vec2(
                decorations.button_min_width,
                decorations.button_height.max(text_height + 6.0),
            ))
            .rounding(egui::Rounding::same(decorations.button_rounding))
            .fill(fill);

        let response = ui.add(button);
        if enabled && response.hovered() {
            ui.output_mut(|o| o.cursor_icon = egui::CursorIcon::PointingHand);
        }
        response
    }
}

/// 단색 헤더를 그려 모달의 제목 영역을 만든다.
pub(super) fn solid_section_header(ui: &mut egui::Ui, theme: &Theme, icon: &str, title: &str) {
    let decorations = theme.decorations();
    let palette = theme.palette();
    let size = egui::vec2(ui.available_width(), decorations.header_height);
    let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
    let rounding = egui::Rounding::same(decorations.header_rounding);
    ui.painter().rect_filled(rect, rounding, decorations.header_fill);
    ui.painter().rect_stroke(
        rect,
        rounding,
        egui::Stroke::new(1.0, blend_color(decorations.header_fill, palette.bg_panel, 0.4)),
    );
    let text = if icon.is_empty() {
        title.to_string()
    } else {
        format!("{icon}  {title}")
    };
    ui.painter().text(
        rect.left_center() + egui::vec2(14.0, 0.0),
        egui::Align2::LEFT_CENTER,
        text,
        egui::FontId::proportional(decorations.header_icon_size),
        decorations.header_text,
    );
}
