//! 256-color palette chart.
//!
//! Prints every palette slot on its own background with its three digit
//! index, the same form theme files use, so a theme author can pick values.

use par_dump_config::FULL_RESET;

const WHITE_TEXT: &str = "0;37";
const BLACK_TEXT: &str = "0;30";

/// Render the standard colors, the 6x6x6 cube and the grayscale ramp.
///
/// Without `colored` only the indices are printed.
pub fn render(colored: bool, eol: &str) -> String {
    let cell = |index: u8, text: &str| -> String {
        if colored {
            format!("\x1b[{text};48;5;{index}m   {index:03}   {FULL_RESET}")
        } else {
            format!("   {index:03}   ")
        }
    };

    let mut out = format!("{eol}Standard colors:{eol}{eol}  ");
    for index in 0u8..16 {
        let text = if index == 0 { WHITE_TEXT } else { BLACK_TEXT };
        out.push_str(&cell(index, text));
        if index % 8 == 7 {
            out.push_str(eol);
            out.push_str("  ");
        }
    }

    out.push_str(&format!("{eol}{eol}Extended colors rgb 6x6x6 (216){eol}{eol}"));
    for r in 0u8..6 {
        for g in 0u8..6 {
            out.push_str("  ");
            for b in 0u8..6 {
                let index = 16 + 36 * r + 6 * g + b;
                // Light cells get dark text.
                let text = if 2 * r + 4 * g + b > 10 {
                    BLACK_TEXT
                } else {
                    WHITE_TEXT
                };
                out.push_str(&cell(index, text));
            }
            out.push_str(eol);
        }
        out.push_str(eol);
    }

    out.push_str(&format!("{eol}Grayscale:{eol}{eol}  "));
    for index in 232u8..=255 {
        let text = if index < 242 { WHITE_TEXT } else { BLACK_TEXT };
        out.push_str(&cell(index, text));
        if index % 4 == 3 {
            out.push_str(eol);
            out.push_str("  ");
        }
    }
    out.push_str(eol);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_index_is_listed() {
        let chart = render(false, "\n");
        for index in 0..=255u16 {
            assert!(chart.contains(&format!(" {index:03} ")), "missing {index}");
        }
    }

    #[test]
    fn test_colored_cells() {
        let chart = render(true, "\n");
        assert!(chart.contains("\x1b[0;37;48;5;0m   000   \x1b[0m"));
        assert!(chart.contains("\x1b[0;30;48;5;231m   231   \x1b[0m"));
        assert!(chart.contains("\x1b[0;37;48;5;16m   016   \x1b[0m"));
    }

    #[test]
    fn test_plain_chart_has_no_escapes() {
        assert!(!render(false, "\r\n").contains('\x1b'));
    }
}
