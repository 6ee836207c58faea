//! # File Management Module
//!
//! Questo modulo gestisce tutte le operazioni sui file e la discovery delle immagini.
//!
//! ## Responsabilità:
//! - Discovery ricorsiva di immagini in directory
//! - Classificazione del file (`FileKind`) in base all'estensione
//! - Lettura limitata in dimensione e scrittura atomica
//! - Formattazione human-readable delle dimensioni e percentuali di riduzione
//!
//! ## Formati supportati:
//! - **Raster lossy**: JPG, JPEG
//! - **Raster lossless**: PNG
//! - **Palette**: GIF
//! - **Vettoriale**: SVG
//!
//! ## Sicurezza operazioni:
//! - La scrittura passa da un file temporaneo nella directory di destinazione
//!   seguito da rename, quindi la destinazione non resta mai troncata

use anyhow::Result;
use image::ImageFormat;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncReadExt;
use walkdir::WalkDir;

/// Classification of an input file, drives the choice of backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    RasterLossy,
    RasterLossless,
    PaletteIndexed,
    Vector,
    Unsupported,
}

impl FileKind {
    /// Classify a file by its extension
    pub fn detect(path: &Path) -> Self {
        let is_svg = path
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("svg"))
            .unwrap_or(false);
        if is_svg {
            return Self::Vector;
        }

        match ImageFormat::from_path(path) {
            Ok(ImageFormat::Jpeg) => Self::RasterLossy,
            Ok(ImageFormat::Png) => Self::RasterLossless,
            Ok(ImageFormat::Gif) => Self::PaletteIndexed,
            _ => Self::Unsupported,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::RasterLossy => "raster-lossy",
            Self::RasterLossless => "raster-lossless",
            Self::PaletteIndexed => "palette-indexed",
            Self::Vector => "vector",
            Self::Unsupported => "unsupported",
        }
    }
}

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Find all supported image files in a directory
    pub fn find_image_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            if Self::is_supported_format(path) {
                files.push(path.to_path_buf());
            }
        }

        Ok(files)
    }

    /// Check if a file format is supported
    pub fn is_supported_format(path: &Path) -> bool {
        FileKind::detect(path) != FileKind::Unsupported
    }

    /// Read a whole file, refusing anything above `limit` bytes.
    ///
    /// The metadata size is only a first check: pipes, devices and files that
    /// grow while being read report less than they deliver, so the read
    /// itself never takes more than `limit + 1` bytes.
    pub async fn read_limited(path: &Path, limit: u64) -> std::io::Result<ReadResult> {
        let size = fs::metadata(path).await?.len();
        if size > limit {
            return Ok(ReadResult::TooLarge(size));
        }

        let file = fs::File::open(path).await?;
        let mut data = Vec::with_capacity(size as usize);
        file.take(limit.saturating_add(1)).read_to_end(&mut data).await?;

        if data.len() as u64 > limit {
            return Ok(ReadResult::TooLarge(data.len() as u64));
        }
        Ok(ReadResult::Data(data))
    }

    /// Write `data` to `dest` through a temporary file in the same directory.
    ///
    /// An existing destination keeps its permissions, a new one gets the
    /// usual umask-filtered mode.
    pub async fn write_atomic(dest: &Path, data: Vec<u8>) -> std::io::Result<()> {
        let dest = dest.to_path_buf();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let dir = match dest.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            let existing = std::fs::metadata(&dest)
                .ok()
                .filter(|metadata| metadata.is_file())
                .map(|metadata| metadata.permissions());

            let mut builder = tempfile::Builder::new();
            builder.prefix(".image-optimizer-").suffix(".tmp");
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                builder.permissions(std::fs::Permissions::from_mode(0o666));
            }

            let mut temp = builder.tempfile_in(&dir)?;
            temp.write_all(&data)?;
            if let Some(permissions) = existing {
                temp.as_file().set_permissions(permissions)?;
            }
            temp.as_file().sync_all()?;
            temp.persist(&dest).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(std::io::Error::other)?
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Percentage reduction rounded to one decimal, negative when the file grew
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            return 0.0;
        }
        let diff = original_size as f64 - new_size as f64;
        (1000.0 * diff / original_size as f64).round() / 10.0
    }
}

/// Result of a size-limited read
#[derive(Debug)]
pub enum ReadResult {
    Data(Vec<u8>),
    TooLarge(u64),
}
