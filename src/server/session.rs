//! Client session
//!
//! Reads command lines from one connection, pulls `STOR` payloads off the
//! same stream, and writes replies back.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;

use crate::config::ServerSettings;
use crate::protocol::responses::{
    EXCEEDED_STORAGE, LOCAL_ERROR, READY, SYNTAX_ERROR, TRANSFER_COMPLETE, format_response,
};
use crate::protocol::{Command, CommandResult, CommandStatus, handle_command, handle_upload, parse_command};
use crate::storage::{StorageService, UploadedFile};

const GREETING: &str = "JSON feeder ready";

/// Serves one client until it quits or disconnects. Oversized uploads and
/// over-long command lines also end the session.
pub async fn handle_client(
    stream: TcpStream,
    client_addr: SocketAddr,
    storage: Arc<dyn StorageService>,
    settings: Arc<ServerSettings>,
) -> io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = Vec::new();
    let line_cap = settings.max_command_length as u64 + 1;

    write_half
        .write_all(format_response(READY, GREETING).as_bytes())
        .await?;
    write_half.flush().await?;

    loop {
        line.clear();
        let n = (&mut reader).take(line_cap).read_until(b'\n', &mut line).await?;
        if n == 0 {
            info!("Connection closed by client {}", client_addr);
            return Ok(());
        }

        if line.len() > settings.max_command_length {
            write_half
                .write_all(format_response(SYNTAX_ERROR, "Command too long").as_bytes())
                .await?;
            write_half.flush().await?;
            warn!(
                "Client {} sent a line over {} bytes; closing",
                client_addr, settings.max_command_length
            );
            return Ok(());
        }

        let text = String::from_utf8_lossy(&line);
        let command = parse_command(text.trim_end_matches(['\r', '\n']));
        info!("Received from {}: {:?}", client_addr, command);

        let result = match command {
            Command::STOR { filename, size } => {
                let limit = settings.max_upload_size_bytes();
                let length = match usize::try_from(size) {
                    Ok(length) if size <= limit => length,
                    _ => {
                        warn!(
                            "Client {} announced {} bytes for {} (limit {}); closing",
                            client_addr, size, filename, limit
                        );
                        write_half
                            .write_all(
                                format_response(EXCEEDED_STORAGE, "File too large").as_bytes(),
                            )
                            .await?;
                        return Ok(());
                    }
                };

                let mut content = vec![0u8; length];
                reader.read_exact(&mut content).await?;
                let upload = UploadedFile::new(filename, content);
                run_blocking(&storage, move |s| handle_upload(s, &upload)).await
            }
            command if command.needs_storage() => {
                run_blocking(&storage, move |s| handle_command(s, &command)).await
            }
            command => handle_command(storage.as_ref(), &command),
        };

        let close = result.status == CommandStatus::CloseConnection;
        send_result(&mut write_half, result).await?;

        if close {
            info!("Client {} requested to quit", client_addr);
            return Ok(());
        }
    }
}

async fn send_result(write_half: &mut OwnedWriteHalf, result: CommandResult) -> io::Result<()> {
    if let Some(msg) = result.message {
        write_half.write_all(msg.as_bytes()).await?;
    }

    if let Some(data) = result.data {
        write_half.write_all(&data).await?;
        write_half
            .write_all(format_response(TRANSFER_COMPLETE, "Transfer complete").as_bytes())
            .await?;
    }

    write_half.flush().await
}

/// Runs a storage-bound handler on the blocking pool.
async fn run_blocking<F>(storage: &Arc<dyn StorageService>, handler: F) -> CommandResult
where
    F: FnOnce(&dyn StorageService) -> CommandResult + Send + 'static,
{
    let storage = Arc::clone(storage);
    match tokio::task::spawn_blocking(move || handler(storage.as_ref())).await {
        Ok(result) => result,
        Err(e) => {
            error!("Storage task failed: {}", e);
            CommandResult::failure(
                e.to_string(),
                format_response(LOCAL_ERROR, "Requested action aborted"),
            )
        }
    }
}
