//! Info command implementation.

use crate::utils::{CmdResult, CountingReader, os_name, savings_percent};
use flatgz_gzip::header::{TRAILER_SIZE, flags};
use flatgz_gzip::{GzipHeader, GzipReader, GzipReaderConfig, GzipTrailer};
use log::warn;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;

/// Everything `info` reports about one gzip file.
#[derive(Debug, Serialize)]
struct InfoReport<'a> {
    file: String,
    file_size: u64,
    header: &'a GzipHeader,
    header_size: usize,
    deflate_size: u64,
    blocks: u64,
    uncompressed_size: u64,
    trailer: Option<GzipTrailer>,
    computed_crc32: u32,
    trailer_ok: bool,
    trailing_bytes: u64,
}

pub fn cmd_info(input: &Path, json: bool) -> CmdResult {
    let file_size = fs::metadata(input)?.len();
    let mut counter = CountingReader::new(BufReader::new(File::open(input)?));

    let (header, summary) = {
        let mut reader = GzipReader::new(&mut counter, GzipReaderConfig::LENIENT)?;
        let summary = reader.read_to(&mut io::sink())?;
        (reader.header().clone(), summary)
    };

    let header_size = header.encoded_len();
    let trailer_size = if summary.trailer.is_some() {
        TRAILER_SIZE as u64
    } else {
        0
    };
    let consumed = counter.count();
    let trailing_bytes = file_size.saturating_sub(consumed);
    if trailing_bytes > 0 {
        warn!(
            "{}: {} bytes after the first member ignored",
            input.display(),
            trailing_bytes
        );
    }

    let report = InfoReport {
        file: input.display().to_string(),
        file_size,
        header: &header,
        header_size,
        deflate_size: consumed.saturating_sub(header_size as u64 + trailer_size),
        blocks: summary.blocks,
        uncompressed_size: summary.bytes_out,
        trailer: summary.trailer,
        computed_crc32: summary.computed_crc32,
        trailer_ok: summary.trailer_matches(),
        trailing_bytes,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &InfoReport<'_>) {
    let header = report.header;

    println!("GZIP Information");
    println!("================");
    println!("File: {}", report.file);
    println!("Size: {} bytes", report.file_size);

    println!();
    println!("Header ({} bytes):", report.header_size);
    println!("  Flags: {:#04x}", header.flags);
    if header.has_flag(flags::FTEXT) {
        println!("  Text: yes");
    }
    if let Some(name) = &header.filename {
        println!("  Original filename: {}", name);
    }
    if let Some(comment) = &header.comment {
        println!("  Comment: {}", comment);
    }
    if let Some(extra) = &header.extra {
        println!("  Extra field: {} bytes", extra.len());
    }
    if let Some(crc) = header.header_crc {
        println!("  Header CRC16: {:#06x}", crc);
    }
    if header.mtime > 0 {
        println!("  Modification time: {} (Unix timestamp)", header.mtime);
    }
    println!("  Extra flags: {}", header.xfl);
    println!("  OS: {} ({})", header.os, os_name(header.os));

    println!();
    println!("Contents:");
    println!("  DEFLATE blocks: {}", report.blocks);
    println!("  Compressed data: {} bytes", report.deflate_size);
    println!("  Uncompressed size: {} bytes", report.uncompressed_size);
    println!(
        "  Compression ratio: {:.1}%",
        savings_percent(report.uncompressed_size, report.deflate_size)
    );

    println!();
    match report.trailer {
        Some(trailer) => {
            println!("Trailer:");
            println!(
                "  CRC-32: {:#010x} (computed {:#010x})",
                trailer.crc32, report.computed_crc32
            );
            println!("  Size: {} bytes", trailer.size);
            println!("  Matches data: {}", if report.trailer_ok { "yes" } else { "no" });
        }
        None => println!("Trailer: missing"),
    }
}
