//! Decompress command implementation.

use crate::utils::{CmdResult, decompressed_name, open_input, open_output};
use flatgz_gzip::{GzipReader, GzipReaderConfig};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

pub fn cmd_decompress(
    input: Option<&Path>,
    output: Option<&Path>,
    stdout: bool,
    verify: bool,
) -> CmdResult {
    let output_path: Option<PathBuf> = match (output, input, stdout) {
        (_, _, true) => None,
        (Some(path), _, false) => Some(path.to_path_buf()),
        (None, Some(input), false) => Some(decompressed_name(input).ok_or_else(|| {
            format!(
                "{}: unknown suffix, use -o to name the output",
                input.display()
            )
        })?),
        (None, None, false) => None,
    };

    let config = GzipReaderConfig::new().with_verify_trailer(verify);
    let mut reader = GzipReader::new(open_input(input)?, config)?;
    let mut writer = open_output(output_path.as_deref())?;

    let summary = match reader.read_to(&mut writer) {
        Ok(summary) => summary,
        Err(e) => {
            drop(writer);
            if let Some(path) = &output_path {
                let _ = fs::remove_file(path);
            }
            return Err(e.into());
        }
    };

    info!(
        "{}: {} bytes from {} blocks{}",
        input.map_or_else(|| "stdin".into(), |p| p.display().to_string()),
        summary.bytes_out,
        summary.blocks,
        if summary.trailer_matches() {
            ", trailer ok"
        } else {
            ""
        }
    );
    Ok(())
}
