//! Single-page PDF writer.
//!
//! Writes just enough of PDF 1.4 for positioned text in the three standard
//! Helvetica faces: catalog, page tree, one page, one content stream, fonts,
//! an info dictionary and the cross-reference table. Text is encoded in
//! WinAnsi; characters outside Latin-1 become `?`.

use super::types::{Font, TextLine};

/// A4 portrait, in points.
pub const PAGE_WIDTH: i32 = 595;
/// A4 portrait, in points.
pub const PAGE_HEIGHT: i32 = 842;

const FONT_OBJECTS: [(&str, &str); 3] = [
    ("F1", "Helvetica"),
    ("F2", "Helvetica-Bold"),
    ("F3", "Helvetica-Oblique"),
];

const fn resource_name(font: Font) -> &'static str {
    match font {
        Font::Regular => "F1",
        Font::Bold => "F2",
        Font::Oblique => "F3",
    }
}

/// Encodes text as a PDF literal string body in WinAnsi.
fn encode_text(text: &str, out: &mut Vec<u8>) {
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            '\n' | '\r' | '\t' => out.push(b' '),
            c if c.is_ascii() => out.push(c as u8),
            c => match u8::try_from(u32::from(c)) {
                Ok(byte) if byte >= 0xA0 => out.push(byte),
                _ => out.push(b'?'),
            },
        }
    }
}

fn content_stream(lines: &[TextLine]) -> Vec<u8> {
    let mut out = Vec::new();
    for line in lines {
        out.extend_from_slice(
            format!(
                "BT /{} {} Tf {} {} Td (",
                resource_name(line.font),
                line.size,
                line.x,
                line.y
            )
            .as_bytes(),
        );
        encode_text(&line.text, &mut out);
        out.extend_from_slice(b") Tj ET\n");
    }
    out
}

/// Renders positioned text lines to a one-page PDF document.
#[must_use]
pub fn render(title: &str, lines: &[TextLine]) -> Vec<u8> {
    let content = content_stream(lines);

    let mut objects: Vec<Vec<u8>> = Vec::new();
    objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());
    objects.push(b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec());
    objects.push(
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << /F1 5 0 R /F2 6 0 R /F3 7 0 R >> >> /Contents 4 0 R >>"
        )
        .into_bytes(),
    );

    let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
    stream.extend_from_slice(&content);
    stream.extend_from_slice(b"endstream");
    objects.push(stream);

    for (_, base) in FONT_OBJECTS {
        objects.push(
            format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{base} /Encoding /WinAnsiEncoding >>"
            )
            .into_bytes(),
        );
    }

    let mut info = b"<< /Title (".to_vec();
    encode_text(title, &mut info);
    info.extend_from_slice(b") /Producer (budgetaire) >>");
    objects.push(info);

    let mut pdf = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
        pdf.extend_from_slice(body);
        pdf.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = pdf.len();
    let size = objects.len() + 1;
    pdf.extend_from_slice(format!("xref\n0 {size}\n0000000000 65535 f \n").as_bytes());
    for offset in offsets {
        pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {size} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            size - 1
        )
        .as_bytes(),
    );
    pdf
}
