//! # Transform Chain Resolver
//!
//! Sceglie quali backend applicare ad un file in base al suo `FileKind`.
//! L'ordine è fisso per ogni tipo (riduzione lossy prima della ricompressione
//! lossless), così a parità di config e input l'output è riproducibile.

use crate::backend::{BackendId, BackendProvider, TransformChain};
use crate::config::{BackendConfig, ToolOptions};
use crate::error::TransformError;
use crate::file_manager::FileKind;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Canonical backend order for a file kind
pub fn canonical_order(kind: FileKind) -> &'static [BackendId] {
    match kind {
        FileKind::RasterLossless => &[BackendId::Pngquant, BackendId::Optipng, BackendId::Zopflipng],
        FileKind::RasterLossy => &[BackendId::JpegRecompress, BackendId::Mozjpeg],
        FileKind::PaletteIndexed => &[BackendId::Gifsicle],
        FileKind::Vector => &[BackendId::Svgo],
        FileKind::Unsupported => &[],
    }
}

/// Enabled backends for `kind`, in canonical order. Empty means pass-through.
pub fn resolve(kind: FileKind, config: &BackendConfig) -> Vec<(BackendId, ToolOptions)> {
    canonical_order(kind)
        .iter()
        .filter_map(|id| config.setting(*id).options().map(|options| (*id, options)))
        .collect()
}

/// A resolved chain, ready to run
#[derive(Clone)]
pub struct ResolvedChain {
    pub backends: Vec<BackendId>,
    pub chain: TransformChain,
}

/// Chains resolved once per kind before fan-out, read-only afterwards
#[derive(Clone, Default)]
pub struct ChainCache {
    chains: HashMap<FileKind, Result<ResolvedChain, TransformError>>,
}

impl ChainCache {
    /// Resolve a chain for every distinct kind in `kinds`
    pub fn build(
        kinds: impl IntoIterator<Item = FileKind>,
        config: &BackendConfig,
        provider: &dyn BackendProvider,
    ) -> Self {
        let mut chains = HashMap::new();

        for kind in kinds {
            if chains.contains_key(&kind) {
                continue;
            }
            let resolved = Self::build_chain(kind, config, provider);
            match &resolved {
                Ok(resolved) => debug!(
                    "Chain for {}: [{}]",
                    kind.description(),
                    resolved.backends.iter().map(|b| b.name()).collect::<Vec<_>>().join(", ")
                ),
                Err(e) => warn!("No usable chain for {} files: {}", kind.description(), e),
            }
            chains.insert(kind, resolved);
        }

        Self { chains }
    }

    fn build_chain(
        kind: FileKind,
        config: &BackendConfig,
        provider: &dyn BackendProvider,
    ) -> Result<ResolvedChain, TransformError> {
        let mut backends = Vec::new();
        let mut chain: TransformChain = Vec::new();

        for (id, options) in resolve(kind, config) {
            chain.push(provider.provide(id, &options)?);
            backends.push(id);
        }

        Ok(ResolvedChain { backends, chain })
    }

    /// Chain for `kind`. Kinds never seen by `build` get an empty chain.
    pub fn get(&self, kind: FileKind) -> Result<ResolvedChain, TransformError> {
        match self.chains.get(&kind) {
            Some(resolved) => resolved.clone(),
            None => Ok(ResolvedChain {
                backends: Vec::new(),
                chain: Vec::new(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendSetting;
    use crate::testing::{FakeProvider, Identity};

    #[test]
    fn test_png_chain_order_with_defaults() {
        let ids: Vec<_> = resolve(FileKind::RasterLossless, &BackendConfig::default())
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec![BackendId::Pngquant, BackendId::Zopflipng]);
    }

    #[test]
    fn test_order_is_canonical_not_config_order() {
        let mut config = BackendConfig::none();
        config.zopflipng = true.into();
        config.optipng = true.into();
        config.pngquant = true.into();

        let ids: Vec<_> = resolve(FileKind::RasterLossless, &config)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(
            ids,
            vec![BackendId::Pngquant, BackendId::Optipng, BackendId::Zopflipng]
        );
    }

    #[test]
    fn test_backends_never_cross_kinds() {
        let mut config = BackendConfig::none();
        config.svgo = true.into();

        assert!(resolve(FileKind::RasterLossless, &config).is_empty());
        assert!(resolve(FileKind::RasterLossy, &config).is_empty());
        assert_eq!(resolve(FileKind::Vector, &config).len(), 1);
    }

    #[test]
    fn test_unsupported_kind_resolves_to_empty_chain() {
        assert!(resolve(FileKind::Unsupported, &BackendConfig::default()).is_empty());

        let cache = ChainCache::build([FileKind::Unsupported], &BackendConfig::default(), &FakeProvider::empty());
        let resolved = cache.get(FileKind::Unsupported).unwrap();
        assert!(resolved.chain.is_empty());
    }

    #[test]
    fn test_options_are_passed_through() {
        let mut config = BackendConfig::none();
        config.mozjpeg = BackendSetting::Options(ToolOptions {
            quality: Some(60),
            ..Default::default()
        });

        let resolved = resolve(FileKind::RasterLossy, &config);
        assert_eq!(resolved, vec![(BackendId::Mozjpeg, ToolOptions { quality: Some(60), ..Default::default() })]);
    }

    #[test]
    fn test_cache_resolves_each_kind_once() {
        let provider = FakeProvider::empty().with(BackendId::Svgo, Identity::new("svgo"));
        let mut config = BackendConfig::none();
        config.svgo = true.into();

        let cache = ChainCache::build(
            [FileKind::Vector, FileKind::Vector, FileKind::Vector],
            &config,
            &provider,
        );

        assert_eq!(cache.len(), 1);
        assert_eq!(provider.provided(), 1);
        assert_eq!(cache.get(FileKind::Vector).unwrap().backends, vec![BackendId::Svgo]);
    }

    #[test]
    fn test_missing_backend_fails_only_its_kind() {
        // gifsicle enabled by default but not provided
        let provider = FakeProvider::empty().with(BackendId::Svgo, Identity::new("svgo"));
        let mut config = BackendConfig::none();
        config.svgo = true.into();
        config.gifsicle = true.into();

        let cache = ChainCache::build([FileKind::PaletteIndexed, FileKind::Vector], &config, &provider);

        assert!(cache.get(FileKind::PaletteIndexed).is_err());
        assert!(cache.get(FileKind::Vector).is_ok());
    }
}
