//! # Backend Transform Module
//!
//! Ogni backend è un algoritmo di compressione trattato come funzione opaca
//! `bytes -> bytes`. I backend reali sono tool esterni (pngquant, optipng,
//! zopflipng, jpeg-recompress, mozjpeg, gifsicle, svgo) eseguiti su file
//! temporanei, lo stesso approccio usato per tutti i tool esterni.
//!
//! ## Componenti:
//! - `BackendId`: insieme chiuso dei backend supportati
//! - `Transform`: contratto di un backend (`apply(bytes) -> bytes`)
//! - `ExternalTool`: implementazione che lancia il tool con `tokio::process`
//! - `BackendProvider` / `ToolProvider`: istanziano i backend abilitati

use crate::args;
use crate::config::ToolOptions;
use crate::error::TransformError;
use crate::tool_resolver::ToolPathResolver;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, warn};

/// Supported compression backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BackendId {
    Pngquant,
    Optipng,
    Zopflipng,
    JpegRecompress,
    Mozjpeg,
    Gifsicle,
    Svgo,
}

impl BackendId {
    pub const ALL: [BackendId; 7] = [
        BackendId::Pngquant,
        BackendId::Optipng,
        BackendId::Zopflipng,
        BackendId::JpegRecompress,
        BackendId::Mozjpeg,
        BackendId::Gifsicle,
        BackendId::Svgo,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pngquant => "pngquant",
            Self::Optipng => "optipng",
            Self::Zopflipng => "zopflipng",
            Self::JpegRecompress => "jpeg_recompress",
            Self::Mozjpeg => "mozjpeg",
            Self::Gifsicle => "gifsicle",
            Self::Svgo => "svgo",
        }
    }

    /// Executable looked up on disk
    pub fn program(&self) -> &'static str {
        match self {
            Self::Pngquant => "pngquant",
            Self::Optipng => "optipng",
            Self::Zopflipng => "zopflipng",
            Self::JpegRecompress => "jpeg-recompress",
            Self::Mozjpeg => "cjpeg",
            Self::Gifsicle => "gifsicle",
            Self::Svgo => "svgo",
        }
    }

    /// Extension of the temporary files handed to the tool
    fn extension(&self) -> &'static str {
        match self {
            Self::Pngquant | Self::Optipng | Self::Zopflipng => "png",
            Self::JpegRecompress | Self::Mozjpeg => "jpg",
            Self::Gifsicle => "gif",
            Self::Svgo => "svg",
        }
    }

    /// Lowest accepted `level` option
    pub fn min_level(&self) -> u8 {
        match self {
            Self::Pngquant | Self::Zopflipng | Self::JpegRecompress | Self::Gifsicle => 1,
            Self::Optipng | Self::Mozjpeg | Self::Svgo => 0,
        }
    }

    /// Highest accepted `level` option
    pub fn max_level(&self) -> u8 {
        match self {
            Self::Pngquant => 11,
            Self::Optipng => 7,
            Self::Zopflipng => u8::MAX,
            Self::JpegRecompress => 32,
            Self::Mozjpeg => 0,
            Self::Gifsicle => 3,
            Self::Svgo => 1,
        }
    }

    /// Full argument list for one invocation, extra arguments first
    pub fn command_args(&self, input: &str, output: &str, options: &ToolOptions) -> Vec<String> {
        let mut args = options.extra_args.clone();

        match self {
            Self::Pngquant => {
                args.extend(args!["--force", "--output", output]);
                if let Some(quality) = options.quality {
                    args.push(format!("--quality=0-{}", quality));
                }
                if let Some(speed) = options.level {
                    args.extend(args!["--speed", speed]);
                }
                args.extend(args!["--", input]);
            }
            Self::Optipng => {
                args.extend(args![
                    format!("-o{}", options.level.unwrap_or(3)),
                    "-quiet",
                    "-out",
                    output,
                    input,
                ]);
            }
            Self::Zopflipng => {
                args.push("-y".to_string());
                if let Some(iterations) = options.level {
                    args.push(format!("--iterations={}", iterations));
                }
                args.extend(args![input, output]);
            }
            Self::JpegRecompress => {
                args.extend(args!["--quiet", "--strip"]);
                if let Some(quality) = options.quality {
                    args.extend(args!["--max", quality]);
                }
                if let Some(loops) = options.level {
                    args.extend(args!["--loops", loops]);
                }
                args.extend(args![input, output]);
            }
            Self::Mozjpeg => {
                if let Some(quality) = options.quality {
                    args.extend(args!["-quality", quality]);
                }
                args.extend(args!["-optimize", "-progressive", "-outfile", output, input]);
            }
            Self::Gifsicle => {
                args.extend(args![
                    "--no-warnings",
                    format!("-O{}", options.level.unwrap_or(1)),
                    "-o",
                    output,
                    input,
                ]);
            }
            Self::Svgo => {
                args.extend(args!["--quiet", "--input", input, "--output", output]);
                if options.level.unwrap_or(0) > 0 {
                    args.push("--multipass".to_string());
                }
            }
        }

        args
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One compression algorithm: a pure function from bytes to bytes
pub trait Transform: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, input: Vec<u8>) -> BoxFuture<'_, Result<Vec<u8>, TransformError>>;
}

/// Ordered backends applied to one file
pub type TransformChain = Vec<Arc<dyn Transform>>;

/// Turns an enabled backend into something runnable
pub trait BackendProvider: Send + Sync {
    fn provide(&self, id: BackendId, options: &ToolOptions) -> Result<Arc<dyn Transform>, TransformError>;
}

/// Backend backed by an external command-line tool
pub struct ExternalTool {
    id: BackendId,
    program: PathBuf,
    options: ToolOptions,
}

impl ExternalTool {
    pub fn new(id: BackendId, program: PathBuf, options: ToolOptions) -> Self {
        Self { id, program, options }
    }

    async fn run(&self, input: Vec<u8>) -> Result<Vec<u8>, TransformError> {
        let name = self.id.name();
        let failed = |message: String| TransformError::failed(name, message);

        let workdir = tempfile::Builder::new()
            .prefix("image-optimizer-")
            .tempdir()
            .map_err(|e| failed(format!("cannot create work directory: {}", e)))?;

        let extension = self.id.extension();
        let input_path = workdir.path().join(format!("input.{}", extension));
        let output_path = workdir.path().join(format!("output.{}", extension));

        tokio::fs::write(&input_path, &input)
            .await
            .map_err(|e| failed(format!("cannot stage input: {}", e)))?;

        let input_str = input_path.to_string_lossy();
        let output_str = output_path.to_string_lossy();
        let args = self.id.command_args(&input_str, &output_str, &self.options);
        debug!("Running {:?} {:?}", self.program, args);

        let start_time = std::time::Instant::now();
        let output = Command::new(&self.program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| failed(format!("cannot spawn {}: {}", self.program.display(), e)))?;
        let elapsed = start_time.elapsed();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("{} failed after {:?}", name, elapsed);
            return Err(failed(format!("{}: {}", output.status, stderr.trim())));
        }

        let bytes = tokio::fs::read(&output_path)
            .await
            .map_err(|e| failed(format!("no output produced: {}", e)))?;
        debug!("{} completed in {:?}: {} -> {} bytes", name, elapsed, input.len(), bytes.len());

        Ok(bytes)
    }
}

impl Transform for ExternalTool {
    fn name(&self) -> &str {
        self.id.name()
    }

    fn apply(&self, input: Vec<u8>) -> BoxFuture<'_, Result<Vec<u8>, TransformError>> {
        Box::pin(self.run(input))
    }
}

/// Provides `ExternalTool` backends found on disk
#[derive(Default)]
pub struct ToolProvider {
    resolver: ToolPathResolver,
}

impl ToolProvider {
    pub fn new(resolver: ToolPathResolver) -> Self {
        Self { resolver }
    }

    /// Backends whose program cannot be found
    pub fn missing(&self, ids: &[BackendId]) -> Vec<BackendId> {
        ids.iter()
            .copied()
            .filter(|id| !self.resolver.is_tool_available(id.program()))
            .collect()
    }
}

impl BackendProvider for ToolProvider {
    fn provide(&self, id: BackendId, options: &ToolOptions) -> Result<Arc<dyn Transform>, TransformError> {
        let program = self
            .resolver
            .resolve_tool(id.program())
            .ok_or_else(|| TransformError::Unavailable {
                backend: id.name().to_string(),
                message: format!("'{}' not found", id.program()),
            })?;

        Ok(Arc::new(ExternalTool::new(id, program, options.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(quality: Option<u8>, level: Option<u8>) -> ToolOptions {
        ToolOptions {
            quality,
            level,
            extra_args: Vec::new(),
        }
    }

    #[test]
    fn test_pngquant_args() {
        let args = BackendId::Pngquant.command_args("in.png", "out.png", &opts(Some(80), None));
        assert_eq!(args, vec!["--force", "--output", "out.png", "--quality=0-80", "--", "in.png"]);
    }

    #[test]
    fn test_optipng_default_level() {
        let args = BackendId::Optipng.command_args("in.png", "out.png", &ToolOptions::default());
        assert_eq!(args, vec!["-o3", "-quiet", "-out", "out.png", "in.png"]);
    }

    #[test]
    fn test_mozjpeg_quality_and_extra_args() {
        let options = ToolOptions {
            quality: Some(70),
            level: None,
            extra_args: vec!["-verbose".to_string()],
        };
        let args = BackendId::Mozjpeg.command_args("in.jpg", "out.jpg", &options);
        assert_eq!(
            args,
            vec!["-verbose", "-quality", "70", "-optimize", "-progressive", "-outfile", "out.jpg", "in.jpg"]
        );
    }

    #[test]
    fn test_svgo_multipass() {
        let args = BackendId::Svgo.command_args("in.svg", "out.svg", &opts(None, Some(1)));
        assert_eq!(args.last().map(String::as_str), Some("--multipass"));
    }

    #[test]
    fn test_missing_tool_is_unavailable() {
        let provider = ToolProvider::new(ToolPathResolver::with_search_path(Vec::new()));
        let err = provider
            .provide(BackendId::Gifsicle, &ToolOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, TransformError::Unavailable { .. }));
        assert_eq!(
            provider.missing(&[BackendId::Gifsicle, BackendId::Svgo]),
            vec![BackendId::Gifsicle, BackendId::Svgo]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_external_tool_failure_is_transform_error() {
        // `false` ignores its arguments and exits with status 1
        let tool = ExternalTool::new(BackendId::Svgo, PathBuf::from("false"), ToolOptions::default());
        let err = tool.apply(b"<svg/>".to_vec()).await.unwrap_err();
        assert!(matches!(err, TransformError::Failed { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_external_tool_without_output_file_fails() {
        // `true` succeeds but never writes the output file
        let tool = ExternalTool::new(BackendId::Svgo, PathBuf::from("true"), ToolOptions::default());
        let err = tool.apply(b"<svg/>".to_vec()).await.unwrap_err();
        assert!(err.to_string().contains("no output produced"));
    }
}
