//! Compress command implementation.

use crate::utils::{
    CmdResult, CountingReader, CountingWriter, compressed_name, create_progress_bar, open_input,
    open_output, savings_percent,
};
use clap::ValueEnum;
use flatgz_core::crc::{Checksum, ZeroChecksum};
use flatgz_deflate::{BlockType, DeflateConfig};
use flatgz_gzip::{GzipTrailer, GzipWriter};
use log::info;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// DEFLATE block type as a command-line value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum BlockTypeArg {
    /// Uncompressed stored blocks
    Stored,
    /// Fixed Huffman codes
    #[default]
    Fixed,
    /// Huffman codes built per block
    Dynamic,
}

impl From<BlockTypeArg> for BlockType {
    fn from(arg: BlockTypeArg) -> Self {
        match arg {
            BlockTypeArg::Stored => BlockType::Stored,
            BlockTypeArg::Fixed => BlockType::Fixed,
            BlockTypeArg::Dynamic => BlockType::Dynamic,
        }
    }
}

pub fn cmd_compress(
    input: Option<&Path>,
    output: Option<&Path>,
    stdout: bool,
    block_type: BlockTypeArg,
    chain_length: usize,
    zero_checksum: bool,
    progress: bool,
) -> CmdResult {
    let output_path: Option<PathBuf> = match (output, input, stdout) {
        (_, _, true) => None,
        (Some(path), _, false) => Some(path.to_path_buf()),
        (None, Some(input), false) => Some(compressed_name(input)),
        (None, None, false) => None,
    };

    let config = DeflateConfig::new(block_type.into()).with_max_chain_length(chain_length);
    let total = match input {
        Some(path) => Some(fs::metadata(path)?.len()),
        None => None,
    };

    let pb = create_progress_bar(total, progress);
    let mut reader = CountingReader::new(pb.wrap_read(open_input(input)?));
    let mut writer = CountingWriter::new(open_output(output_path.as_deref())?);

    let result = if zero_checksum {
        run(
            GzipWriter::with_checksum(config, ZeroChecksum),
            &mut reader,
            &mut writer,
        )
    } else {
        run(GzipWriter::new(config), &mut reader, &mut writer)
    };
    pb.finish_and_clear();

    let trailer = match result {
        Ok(trailer) => trailer,
        Err(e) => {
            if let Some(path) = &output_path {
                let _ = fs::remove_file(path);
            }
            return Err(e);
        }
    };

    let bytes_in = reader.count();
    info!(
        "{}: {} -> {} bytes ({:.1}% saved, {} blocks, crc32 {:#010x})",
        input.map_or_else(|| "stdin".into(), |p| p.display().to_string()),
        bytes_in,
        writer.count(),
        savings_percent(bytes_in, writer.count()),
        config.block_type,
        trailer.crc32
    );
    Ok(())
}

fn run<C: Checksum, R: Read, W: Write>(
    mut gzip: GzipWriter<C>,
    reader: &mut R,
    writer: &mut W,
) -> CmdResult<GzipTrailer> {
    Ok(gzip.write(reader, writer)?)
}
