use crate::editor::NodeKind;
use eframe::egui::{self, Color32, Margin};

/// 패널/배경/텍스트 기본 색상표.
#[derive(Debug, Clone, Copy)]
pub struct ThemePalette {
    pub bg_panel: Color32,
    pub bg_sidebar: Color32,
    pub bg_main: Color32,
    pub bg_toolbar: Color32,
    pub bg_log: Color32,
    pub border_soft: Color32,
    pub fg_text_primary: Color32,
    pub fg_text_secondary: Color32,
    pub accent_primary: Color32,
    pub accent_error: Color32,
    pub accent_warning: Color32,
}

/// 모서리, 여백, 헤더 등 장식 값.
#[derive(Debug, Clone, Copy)]
pub struct ThemeDecorations {
    pub container_rounding: f32,
    pub toolbar_rounding: f32,
    pub card_rounding: f32,
    pub card_inner_margin: Margin,
    pub button_gap: f32,
    pub button_height: f32,
    pub button_min_width: f32,
    pub button_rounding: f32,
    pub header_height: f32,
    pub header_rounding: f32,
    pub header_fill: Color32,
    pub header_text: Color32,
    pub header_icon_size: f32,
}

/// 그래프 캔버스 전용 색상.
#[derive(Debug, Clone, Copy)]
pub struct BuilderColors {
    pub canvas_fill: Color32,
    pub grid_stroke: Color32,
    pub connection_stroke: Color32,
    pub connection_selected: Color32,
    pub node_fill: Color32,
    pub node_selected: Color32,
    pub node_border: Color32,
    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub handle_fill: Color32,
}

/// UI 전체에서 참조할 공통 테마 정보.
pub struct Theme {
    palette: ThemePalette,
    decorations: ThemeDecorations,
    builder: BuilderColors,
}

impl Default for Theme {
    /// 어두운 기본 테마를 정의한다.
    fn default() -> Self {
        let palette = ThemePalette {
            bg_panel: Color32::from_rgb(28, 30, 36),
            bg_sidebar: Color32::from_rgb(24, 26, 31),
            bg_main: Color32::from_rgb(20, 22, 26),
            bg_toolbar: Color32::from_rgb(34, 37, 44),
            bg_log: Color32::from_rgb(18, 19, 23),
            border_soft: Color32::from_rgb(58, 62, 72),
            fg_text_primary: Color32::from_rgb(226, 230, 238),
            fg_text_secondary: Color32::from_rgb(150, 156, 170),
            accent_primary: Color32::from_rgb(64, 132, 230),
            accent_error: Color32::from_rgb(220, 80, 80),
            accent_warning: Color32::from_rgb(230, 170, 60),
        };
        let decorations = ThemeDecorations {
            container_rounding: 8.0,
            toolbar_rounding: 6.0,
            card_rounding: 6.0,
            card_inner_margin: Margin::same(10.0),
            button_gap: 8.0,
            button_height: 30.0,
            button_min_width: 96.0,
            button_rounding: 5.0,
            header_height: 36.0,
            header_rounding: 5.0,
            header_fill: Color32::from_rgb(44, 58, 84),
            header_text: Color32::from_rgb(232, 238, 248),
            header_icon_size: 18.0,
        };
        let builder = BuilderColors {
            canvas_fill: Color32::from_rgb(22, 24, 29),
            grid_stroke: Color32::from_rgb(34, 37, 44),
            connection_stroke: Color32::from_rgb(120, 130, 150),
            connection_selected: Color32::from_rgb(250, 200, 90),
            node_fill: Color32::from_rgb(40, 44, 54),
            node_selected: Color32::from_rgb(250, 200, 90),
            node_border: Color32::from_rgb(80, 86, 100),
            text_primary: Color32::from_rgb(230, 234, 242),
            text_secondary: Color32::from_rgb(150, 156, 170),
            handle_fill: Color32::from_rgb(200, 206, 220),
        };
        Self {
            palette,
            decorations,
            builder,
        }
    }
}

impl Theme {
    /// egui Context에 테마 기반 스타일을 적용한다.
    pub fn apply(&self, ctx: &egui::Context) {
        let mut visuals = egui::Visuals::dark();
        visuals.window_rounding = egui::Rounding::same(self.decorations.container_rounding);
        visuals.widgets.inactive.bg_fill = self.palette.bg_toolbar;
        visuals.window_fill = self.palette.bg_main;
        visuals.panel_fill = self.palette.bg_panel;
        visuals.extreme_bg_color = self.palette.bg_log;
        visuals.selection.bg_fill = self.palette.accent_primary;
        ctx.set_visuals(visuals);
    }

    pub fn palette(&self) -> &ThemePalette {
        &self.palette
    }

    pub fn decorations(&self) -> &ThemeDecorations {
        &self.decorations
    }

    pub fn builder_colors(&self) -> &BuilderColors {
        &self.builder
    }

    /// 노드 종류별 머리 색상을 반환한다.
    pub fn node_kind_color(&self, kind: NodeKind) -> Color32 {
        match kind {
            NodeKind::Input => Color32::from_rgb(70, 160, 110),
            NodeKind::Output => Color32::from_rgb(200, 110, 70),
            NodeKind::Population => Color32::from_rgb(90, 120, 210),
            NodeKind::Group => Color32::from_rgb(150, 100, 200),
        }
    }
}

/// 두 색을 `t` 비율로 섞는다. `t`가 0이면 `a`, 1이면 `b`이다.
pub fn blend_color(a: Color32, b: Color32, t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Color32::from_rgba_unmultiplied(
        mix(a.r(), b.r()),
        mix(a.g(), b.g()),
        mix(a.b(), b.b()),
        mix(a.a(), b.a()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_color_hits_both_ends() {
        let a = Color32::from_rgb(0, 0, 0);
        let b = Color32::from_rgb(200, 100, 50);
        assert_eq!(blend_color(a, b, 0.0), a);
        assert_eq!(blend_color(a, b, 1.0), b);
        assert_eq!(blend_color(a, b, 0.5), Color32::from_rgb(100, 50, 25));
    }
}
