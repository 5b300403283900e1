use colored::CustomColor;
use std::time::Duration;

/// Colors for the few decorated parts of a trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub tid: CustomColor,
    pub return_tid: CustomColor,
    pub exited_background: CustomColor,
}

impl Palette {
    /// Asks the terminal for its background. The query reads from stdin in
    /// raw mode, so it has to finish before a tracee shares the terminal.
    pub fn detect() -> Self {
        let light = matches!(
            termbg::theme(Duration::from_millis(10)),
            Ok(termbg::Theme::Light)
        );
        Self::for_theme(light)
    }

    pub fn for_theme(light: bool) -> Self {
        let pick = |(light_r, light_g, light_b), (dark_r, dark_g, dark_b)| {
            if light {
                CustomColor::new(light_r, light_g, light_b)
            } else {
                CustomColor::new(dark_r, dark_g, dark_b)
            }
        };
        Palette {
            tid: pick((0, 0, 140), (0, 173, 216)),
            return_tid: pick((64, 64, 64), (160, 160, 160)),
            exited_background: pick((250, 160, 160), (100, 0, 0)),
        }
    }
}
