//! Startup asset preflight: confirm every referenced file exists before the
//! kiosk is put in front of visitors.  Missing files are reported, never fatal.

use std::path::Path;

use futures_util::future::join_all;
use tracing::{info, warn};

use kiosk_shared::content::{resolve_asset, AssetKind, AssetRef};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreflightReport {
    pub checked: usize,
    pub missing: Vec<AssetRef>,
}

impl PreflightReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.is_complete() {
            format!("assets: {} ok", self.checked)
        } else {
            format!(
                "assets: {} of {} missing",
                self.missing.len(),
                self.checked
            )
        }
    }

    pub fn missing_of(&self, kind: AssetKind) -> usize {
        self.missing.iter().filter(|a| a.kind == kind).count()
    }
}

/// Stat every asset concurrently.
pub async fn preflight(assets_dir: &Path, assets: &[AssetRef]) -> PreflightReport {
    let checks = assets.iter().map(|asset| {
        let path = resolve_asset(assets_dir, &asset.path);
        async move {
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => None,
                Ok(_) => {
                    warn!("preflight: {:?} {} is not a file", asset.kind, path.display());
                    Some(asset.clone())
                }
                Err(e) => {
                    warn!("preflight: {:?} {} missing: {}", asset.kind, path.display(), e);
                    Some(asset.clone())
                }
            }
        }
    });
    let missing: Vec<AssetRef> = join_all(checks).await.into_iter().flatten().collect();
    let report = PreflightReport {
        checked: assets.len(),
        missing,
    };
    info!("preflight: {}", report.summary());
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(kind: AssetKind, path: &str) -> AssetRef {
        AssetRef {
            kind,
            path: path.to_string(),
        }
    }

    #[tokio::test]
    async fn test_reports_missing_assets_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("video")).expect("mkdir");
        std::fs::write(dir.path().join("video/a.mp4"), b"x").expect("write");
        std::fs::write(dir.path().join("s1.png"), b"x").expect("write");

        let assets = vec![
            asset(AssetKind::Media, "/video/a.mp4"),
            asset(AssetKind::Slide, "./s1.png"),
            asset(AssetKind::Thumbnail, "/t1.png"),
            asset(AssetKind::Media, "/video/b.mp4"),
        ];
        let report = preflight(dir.path(), &assets).await;
        assert_eq!(report.checked, 4);
        assert_eq!(
            report.missing,
            vec![assets[2].clone(), assets[3].clone()]
        );
        assert_eq!(report.missing_of(AssetKind::Media), 1);
        assert_eq!(report.summary(), "assets: 2 of 4 missing");
    }

    #[tokio::test]
    async fn test_directory_is_not_an_asset() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("icons")).expect("mkdir");
        let report = preflight(dir.path(), &[asset(AssetKind::Icon, "icons")]).await;
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_nothing_to_check() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report = preflight(dir.path(), &[]).await;
        assert!(report.is_complete());
        assert_eq!(report.summary(), "assets: 0 ok");
    }
}
