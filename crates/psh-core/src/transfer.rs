use chrono::Local;
use std::fs::File;
use tracing::{debug, info};

use crate::command::CommandExecutor;
use crate::decompress::{parent_dir, Decompression};
use crate::error::ExecutionError;
use crate::header::transfer_header;
use crate::probe;
use crate::request::TransferRequest;
use crate::target::Target;
use crate::transport::Connection;

/// Copies one local file to one target, then optionally unpacks it and
/// lists the result. Everything after the dial shares one connection.
#[derive(Clone)]
pub struct TransferExecutor {
    commands: CommandExecutor,
}

impl TransferExecutor {
    pub fn new(commands: CommandExecutor) -> Self {
        Self { commands }
    }

    pub fn transfer(
        &self,
        target: &Target,
        request: &TransferRequest,
    ) -> Result<String, ExecutionError> {
        let mut conn = self.commands.connector().open(target)?;
        let result = self.transfer_on(conn.as_mut(), target, request);
        conn.close();
        result
    }

    fn transfer_on(
        &self,
        conn: &mut dyn Connection,
        target: &Target,
        request: &TransferRequest,
    ) -> Result<String, ExecutionError> {
        let mut output = String::new();

        let local_error = |source: std::io::Error| ExecutionError::LocalFile {
            path: request.source.display().to_string(),
            source,
        };
        let mut file = File::open(&request.source).map_err(local_error)?;
        let size = file.metadata().map_err(local_error)?.len();

        let dest_dir = parent_dir(&request.dest);
        let exists = probe::directory_exists(&self.commands, conn, target, &dest_dir)
            .map_err(|e| e.in_step("error checking directory existence"))?;
        if !exists {
            if !request.options.create_dir {
                return Err(ExecutionError::Precondition(format!(
                    "destination directory {} does not exist on {}",
                    dest_dir, target.ip
                )));
            }
            debug!("Creating {} on {}", dest_dir, target.ip);
            let created = self
                .commands
                .run_on(conn, target, &format!("mkdir -p {}", dest_dir), false)
                .map_err(|e| {
                    e.in_step(format!(
                        "failed to create directory {} on {}",
                        dest_dir, target.ip
                    ))
                })?;
            output.push_str(&created);
        }

        conn.send_file(&mut file, size, &request.dest, request.permission)?;
        info!(
            "Copied {} to {}:{} ({} bytes)",
            request.source.display(),
            target.ip,
            request.dest,
            size
        );
        output.push_str(&transfer_header(target, request, &Local::now()));

        let listing = if request.options.decompress {
            let format = Decompression::from_path(&request.dest)?;
            if !probe::command_available(&self.commands, conn, target, format.tool()) {
                return Err(ExecutionError::Precondition(
                    "decompression command not available on remote".to_string(),
                ));
            }
            let unpacked = self
                .commands
                .run_on(conn, target, &format.command(&request.dest), false)
                .map_err(|e| e.in_step(format!("error decompressing file on {}", target.ip)))?;
            output.push_str(&unpacked);
            format!("ls -lart {}", dest_dir)
        } else {
            format!("ls -ltr {}", request.dest)
        };

        let listed = self
            .commands
            .run_on(conn, target, &listing, false)
            .map_err(|e| e.in_step("failed to execute ls command"))?;
        output.push_str(&listed);
        Ok(output)
    }
}
