//! Content-stream text walking and line grouping.

use std::collections::HashMap;

use lopdf::Object;
use lopdf::content::Operation;

use crate::models::layout::TextLine;

/// Font resource name to bold flag.
pub(super) type FontStyles = HashMap<Vec<u8>, bool>;

/// A run of text drawn by one show operator.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Span {
    pub x: f32,
    pub top: f32,
    pub text: String,
    pub font_size: f32,
    pub bold: bool,
}

/// Check whether a `BaseFont` name denotes a bold face.
pub(super) fn is_bold_font(base_font: &str) -> bool {
    let name = base_font.to_lowercase();
    ["bold", "black", "heavy"].iter().any(|w| name.contains(w))
}

/// Decode a PDF string: UTF-16BE with byte-order mark, UTF-8, else Latin-1.
pub(super) fn decode_text(bytes: &[u8]) -> String {
    let decoded = if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => bytes.iter().map(|&b| b as char).collect(),
        }
    };

    // Two-byte glyph ids without a usable encoding decode to control noise.
    let controls = decoded.chars().filter(|c| c.is_control()).count();
    if controls * 2 > decoded.chars().count() {
        return String::new();
    }
    decoded.chars().filter(|c| !c.is_control()).collect()
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn numbers<const N: usize>(operands: &[Object]) -> Option<[f32; N]> {
    if operands.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, operand) in out.iter_mut().zip(&operands[operands.len() - N..]) {
        *slot = number(operand)?;
    }
    Some(out)
}

/// Text state between `BT` and `ET`.
struct TextState {
    bold: bool,
    font_size: f32,
    leading: f32,
    // Line matrix [a b c d e f].
    line: [f32; 6],
}

impl TextState {
    fn new() -> Self {
        Self {
            bold: false,
            font_size: 0.0,
            leading: 0.0,
            line: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        }
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        let [a, b, c, d, e, f] = self.line;
        self.line[4] = e + tx * a + ty * c;
        self.line[5] = f + tx * b + ty * d;
    }

    fn next_line(&mut self) {
        self.translate(0.0, -self.leading);
    }

    fn effective_size(&self) -> f32 {
        let scale = self.line[3].abs();
        if scale > 0.0 { self.font_size * scale } else { self.font_size }
    }
}

/// Walk decoded operations and collect the text spans they draw.
pub(super) fn collect_spans(operations: &[Operation], fonts: &FontStyles, page_height: f32) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut state = TextState::new();

    for op in operations {
        let operands = op.operands.as_slice();
        let mut shown: Option<String> = None;

        match op.operator.as_str() {
            "BT" => {
                let (bold, font_size, leading) = (state.bold, state.font_size, state.leading);
                state = TextState::new();
                state.bold = bold;
                state.font_size = font_size;
                state.leading = leading;
            }
            "Tf" => {
                if let Some(Object::Name(name)) = operands.first() {
                    state.bold = fonts.get(name).copied().unwrap_or(false);
                }
                if let Some(size) = operands.get(1).and_then(number) {
                    state.font_size = size;
                }
            }
            "TL" => {
                if let Some([leading]) = numbers::<1>(operands) {
                    state.leading = leading;
                }
            }
            "Td" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    state.translate(tx, ty);
                }
            }
            "TD" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    state.leading = -ty;
                    state.translate(tx, ty);
                }
            }
            "Tm" => {
                if let Some(matrix) = numbers::<6>(operands) {
                    state.line = matrix;
                }
            }
            "T*" => state.next_line(),
            "Tj" => shown = string_operand(operands.first()),
            "'" => {
                state.next_line();
                shown = string_operand(operands.first());
            }
            "\"" => {
                state.next_line();
                shown = string_operand(operands.get(2));
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    shown = Some(show_array(items));
                }
            }
            _ => {}
        }

        if let Some(text) = shown.filter(|t| !t.trim().is_empty()) {
            spans.push(Span {
                x: state.line[4],
                top: page_height - state.line[5],
                text,
                font_size: state.effective_size(),
                bold: state.bold,
            });
        }
    }

    spans
}

fn string_operand(operand: Option<&Object>) -> Option<String> {
    match operand {
        Some(Object::String(bytes, _)) => Some(decode_text(bytes)),
        _ => None,
    }
}

fn show_array(items: &[Object]) -> String {
    let mut text = String::new();
    for item in items {
        match item {
            Object::String(bytes, _) => text.push_str(&decode_text(bytes)),
            // Large negative adjustments are inter-word gaps.
            other => {
                if number(other).is_some_and(|n| n < -200.0) && !text.ends_with(' ') {
                    text.push(' ');
                }
            }
        }
    }
    text
}

/// Group spans into top-down lines. Spans whose rounded tops differ by at
/// most `tolerance` share a line, ordered left to right.
pub(super) fn group_lines(mut spans: Vec<Span>, tolerance: f32) -> Vec<TextLine> {
    spans.sort_by(|a, b| a.top.round().total_cmp(&b.top.round()));

    let mut groups: Vec<Vec<Span>> = Vec::new();
    for span in spans {
        match groups.last_mut() {
            Some(group) if (span.top.round() - group[0].top.round()).abs() <= tolerance => {
                group.push(span)
            }
            _ => groups.push(vec![span]),
        }
    }

    groups
        .into_iter()
        .filter_map(|mut group| {
            group.sort_by(|a, b| a.x.total_cmp(&b.x));
            let first = &group[0];
            let (top, font_size, bold) = (first.top, first.font_size, first.bold);

            let mut text = String::new();
            let mut last_x = None;
            for span in &group {
                let continues = last_x == Some(span.x);
                if !continues && !text.is_empty() && !text.ends_with(' ') && !span.text.starts_with(' ') {
                    text.push(' ');
                }
                text.push_str(&span.text);
                last_x = Some(span.x);
            }

            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                return None;
            }
            let mut line = TextLine::plain(text).at(top);
            if font_size > 0.0 {
                line = line.with_font_size(font_size);
            }
            if bold {
                line = line.bold();
            }
            Some(line)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn op(operator: &str, operands: Vec<Object>) -> Operation {
        Operation::new(operator, operands)
    }

    fn span(x: f32, top: f32, text: &str) -> Span {
        Span {
            x,
            top,
            text: text.to_string(),
            font_size: 10.0,
            bold: false,
        }
    }

    #[test]
    fn test_bold_font_names() {
        assert!(is_bold_font("ABCDEF+Arial-BoldMT"));
        assert!(is_bold_font("Helvetica-Black"));
        assert!(is_bold_font("Heavy Sans"));
        assert!(!is_bold_font("TimesNewRomanPSMT"));
    }

    #[test]
    fn test_decode_text() {
        assert_eq!(decode_text(b"Project Name"), "Project Name");
        assert_eq!(decode_text(&[0xFE, 0xFF, 0x00, 0x41, 0x00, 0x42]), "AB");
        assert_eq!(decode_text(&[0x42, 0xE9]), "B\u{e9}");
        assert_eq!(decode_text(&[0x00, 0x12, 0x00, 0x2A]), "");
    }

    #[test]
    fn test_collect_spans_tracks_position_and_font() {
        let fonts: FontStyles = [(b"F1".to_vec(), false), (b"F2".to_vec(), true)].into_iter().collect();
        let ops = vec![
            op("BT", vec![]),
            op("Tf", vec![Object::Name(b"F2".to_vec()), Object::Integer(14)]),
            op("Td", vec![Object::Integer(72), Object::Integer(700)]),
            op("Tj", vec![Object::string_literal("PROJECT DETAILS")]),
            op("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(10)]),
            op("TL", vec![Object::Integer(12)]),
            op("T*", vec![]),
            op("Tj", vec![Object::string_literal("Project Name : Green Acres")]),
            op("ET", vec![]),
        ];

        let spans = collect_spans(&ops, &fonts, 792.0);

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "PROJECT DETAILS");
        assert_eq!(spans[0].top, 92.0);
        assert!(spans[0].bold);
        assert_eq!(spans[0].font_size, 14.0);
        assert_eq!(spans[1].top, 104.0);
        assert!(!spans[1].bold);
    }

    #[test]
    fn test_tj_array_gaps() {
        let ops = vec![
            op("Tm", vec![Object::Integer(1), Object::Integer(0), Object::Integer(0), Object::Integer(1), Object::Integer(50), Object::Integer(500)]),
            op(
                "TJ",
                vec![Object::Array(vec![
                    Object::string_literal("Sur"),
                    Object::Integer(-20),
                    Object::string_literal("vey"),
                    Object::Integer(-400),
                    Object::string_literal("No"),
                ])],
            ),
        ];
        let spans = collect_spans(&ops, &FontStyles::new(), 800.0);
        assert_eq!(spans[0].text, "Survey No");
        assert_eq!(spans[0].top, 300.0);
    }

    #[test]
    fn test_group_lines_merges_close_tops() {
        let spans = vec![
            span(200.0, 101.4, "Green Acres"),
            span(50.0, 100.0, "Project Name :"),
            span(50.0, 120.0, "District : Mysuru"),
        ];

        let lines = group_lines(spans, 2.0);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Project Name : Green Acres");
        assert_eq!(lines[0].y_position, 100.0);
        assert_eq!(lines[1].text, "District : Mysuru");
    }

    #[test]
    fn test_group_lines_keeps_fragments_together() {
        let spans = vec![span(50.0, 100.0, "Proj"), span(50.0, 100.0, "ect")];
        let lines = group_lines(spans, 2.0);
        assert_eq!(lines[0].text, "Project");
    }
}
