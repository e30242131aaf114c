//! Artifact composition.
//!
//! Each function renders one bundle file from the request. JSON artifacts are
//! returned as `Value` documents so the builder can stamp the watermark before
//! rendering; text artifacts are returned as finished strings.

use pf_core::{Timestamp, Watermark};
use serde_json::{json, Value};

use crate::request::{BundleRequest, SevenD};

const GENERATOR: &str = "PromptForge v3";

/// Normalize prompt text: unix line endings, no trailing whitespace, exactly
/// one trailing newline.
pub fn normalize_prompt(prompt: &str) -> String {
    let mut out = prompt
        .replace("\r\n", "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    let trimmed_len = out.trim_end_matches('\n').len();
    out.truncate(trimmed_len);
    out.push('\n');
    out
}

/// `prompt.txt`.
pub fn compose_txt(request: &BundleRequest) -> String {
    normalize_prompt(&request.prompt)
}

fn seven_d_lines(seven_d: &SevenD) -> [(&'static str, &str); 7] {
    [
        ("Domain", &seven_d.domain),
        ("Scale", &seven_d.scale),
        ("Urgency", &seven_d.urgency),
        ("Complexity", &seven_d.complexity),
        ("Resources", &seven_d.resources),
        ("Application", &seven_d.application),
        ("Output Format", &seven_d.output_format),
    ]
}

/// `prompt.md`, ending with the provenance badge.
pub fn compose_md(request: &BundleRequest, watermark: &Watermark, created_at: Timestamp) -> String {
    let mut md = String::new();
    md.push_str(&format!("# Prompt Engineering Output: {}\n\n", request.module_id));
    md.push_str("## 7D Parameters\n");
    for (label, value) in seven_d_lines(&request.seven_d) {
        md.push_str(&format!("- **{label}**: {value}\n"));
    }
    md.push_str("\n## Prompt\n");
    md.push_str(&normalize_prompt(&request.prompt));
    md.push_str("\n---\n");
    md.push_str(&format!("*Generated by {GENERATOR} on {created_at}*\n\n"));
    md.push_str(&watermark.markdown_badge());
    md.push('\n');
    md
}

/// `prompt.json`, unwatermarked.
pub fn compose_json(request: &BundleRequest, created_at: Timestamp) -> Value {
    json!({
        "prompt": {
            "text": normalize_prompt(&request.prompt),
            "module_id": request.module_id,
            "metadata": {
                "generated_at": created_at,
                "version": "1.0.0",
                "source": GENERATOR,
            }
        },
        "seven_d_params": request.seven_d,
        "export_info": {
            "format": "json",
            "run_id": request.run_id,
        }
    })
}

/// `prompt.pdf`.
///
/// A single-page PDF carrying the prompt as text. Layout is minimal: one
/// Helvetica text object, one line per prompt line.
pub fn compose_pdf(request: &BundleRequest, watermark: &Watermark, created_at: Timestamp) -> Vec<u8> {
    let mut lines: Vec<String> = vec![
        format!("{GENERATOR} - {}", request.module_id),
        String::new(),
    ];
    for (label, value) in seven_d_lines(&request.seven_d) {
        lines.push(format!("{label}: {value}"));
    }
    lines.push(String::new());
    lines.extend(normalize_prompt(&request.prompt).lines().map(str::to_string));
    lines.push(String::new());
    lines.push(format!("Generated: {created_at}"));
    lines.push(watermark.markdown_badge().trim_start_matches("> ").to_string());

    let mut stream = String::from("BT\n/F1 10 Tf\n14 TL\n50 800 Td\n");
    for line in &lines {
        stream.push_str(&format!("({}) Tj T*\n", pdf_escape(line)));
    }
    stream.push_str("ET\n");

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 595 842] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>".to_string(),
        format!("<< /Length {} >>\nstream\n{stream}endstream", stream.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }
    let xref_at = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for off in offsets {
        pdf.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    pdf
}

/// Escape a line for a PDF literal string. Non-ASCII is replaced with `?`
/// since the base font uses a single-byte encoding.
fn pdf_escape(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        match c {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

/// `telemetry.json`, unwatermarked.
pub fn compose_telemetry(request: &BundleRequest) -> Value {
    let t = &request.telemetry;
    json!({
        "run_id": request.run_id,
        "score": t.score,
        "tokens": t.tokens,
        "tta_ms": t.duration_ms,
        "cost_usd": t.cost_usd,
        "model": t.model,
    })
}
