// Report generation from a detection result

use crate::model::{Block, BlockCategory, DetectionResult};
use colored::Colorize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

pub fn generate_report(result: &DetectionResult, format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(result)),
        ReportFormat::Json => generate_json_report(result),
    }
}

pub fn generate_text_report(result: &DetectionResult) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str(&format!("# {}\n", result.page_url.bold()));
    report.push_str(&format!(
        "  Generated: {}\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    report.push_str(&format!("  Sections: {}\n", result.sections.len()));
    report.push_str(&format!(
        "  Blocks: {}\n",
        result.blocks_in(BlockCategory::Block).count()
    ));
    report.push_str(&format!(
        "  Default content: {}\n",
        result
            .blocks
            .iter()
            .filter(|b| b.category.is_default_content())
            .count()
    ));
    report.push_str(&format!(
        "  Buttons: {}\n",
        result.blocks_in(BlockCategory::Button).count()
    ));
    report.push_str(&format!("  Icons: {}\n", result.icons.len()));
    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    if !result.sections.is_empty() {
        report.push_str("## Sections\n");
        for section in &result.sections {
            let label = section.label.as_deref().unwrap_or("-");
            let origin = if section.ssr.is_some() {
                "ssr".green()
            } else {
                "live only".yellow()
            };
            report.push_str(&format!(
                "  {} {} {} [{}]\n",
                section.id.cyan(),
                label,
                section.element.to_string().bright_black(),
                origin
            ));
        }
        report.push('\n');
    }

    let named: Vec<&Block> = result.blocks_in(BlockCategory::Block).collect();
    if !named.is_empty() {
        report.push_str("## Blocks\n");
        for block in named {
            report.push_str(&block_line(block));
        }
        report.push('\n');
    }

    let others: Vec<&Block> = result
        .blocks
        .iter()
        .filter(|b| b.category != BlockCategory::Block)
        .collect();
    if !others.is_empty() {
        report.push_str("## Default content and buttons\n");
        for block in others {
            report.push_str(&block_line(block));
        }
        report.push('\n');
    }

    if !result.icons.is_empty() {
        report.push_str("## Icons\n");
        for icon in &result.icons {
            let state = match (&icon.element, &icon.svg) {
                (Some(_), Some(_)) => "rendered".green(),
                (Some(_), None) => "rendered, no svg".yellow(),
                (None, _) => "not rendered".bright_black(),
            };
            report.push_str(&format!("  {} {} [{}]\n", icon.id.cyan(), icon.name, state));
        }
        report.push('\n');
    }

    report
}

fn block_line(block: &Block) -> String {
    let source = match &block.source_document_url {
        Some(url) => url.bright_black().to_string(),
        None => "no ssr counterpart".yellow().to_string(),
    };
    format!(
        "  {} {} <{}> {} {}\n",
        block.id.cyan(),
        block.name.bold(),
        block.tag_name,
        block.category.as_str(),
        source
    )
}

pub fn generate_json_report(result: &DetectionResult) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Blockscope",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "summary": {
                "sections": result.sections.len(),
                "blocks": result.blocks_in(BlockCategory::Block).count(),
                "default_content": result.blocks.iter().filter(|b| b.category.is_default_content()).count(),
                "buttons": result.blocks_in(BlockCategory::Button).count(),
                "icons": result.icons.len()
            },
            "result": result
        }
    });
    serde_json::to_string_pretty(&json_report)
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
