use std::path::Path;
use tokio::io::AsyncWriteExt;
use toolsource_capture::CapturedSource;
use toolsource_common::{Result, ToolsourceError};
use toolsource_config::OutputConfig;

/// Text to emit for a capture: the whole document, or just its tool XML.
pub fn render(captured: &CapturedSource, output: &OutputConfig) -> Result<String> {
    if !output.extract_xml {
        return Ok(captured.html.clone());
    }
    captured.code_block(&output.code_class).ok_or_else(|| {
        ToolsourceError::Extraction(format!(
            "no <code class=\"{}\"> block in page captured from {}",
            output.code_class, captured.url
        ))
    })
}

/// Write `text` to the configured file, or stdout.
pub async fn emit(text: &str, file: Option<&Path>) -> Result<()> {
    match file {
        Some(path) => tokio::fs::write(path, with_newline(text)).await?,
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(with_newline(text).as_bytes()).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

fn with_newline(text: &str) -> String {
    if text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{text}\n")
    }
}
