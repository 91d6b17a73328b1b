//! Newline-delimited JSON-RPC over stdin/stdout

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

use super::McpHandler;
use crate::Result;

/// Serve MCP on the process's stdin/stdout until stdin closes
pub async fn serve_stdio(handler: McpHandler) -> Result<()> {
    info!("Serving MCP over stdio");
    serve(handler, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;
    info!("stdin closed, shutting down");
    Ok(())
}

/// Serve MCP over any line-oriented reader/writer pair
pub async fn serve<R, W>(handler: McpHandler, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(response) = handler.handle_line(&line).await {
            let mut out = serde_json::to_vec(&response)?;
            out.push(b'\n');
            writer.write_all(&out).await?;
            writer.flush().await?;
        }
    }
    Ok(())
}
