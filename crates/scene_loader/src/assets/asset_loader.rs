//! Packed 3D asset loading
//!
//! Static catalog objects and GLB scenes come from an injected
//! [`AssetLoader`]; decompression is the loader's business.

use futures::future::LocalBoxFuture;

use super::LoadError;
use crate::kernel::CatalogItem;
use crate::scene::SceneNode;

/// Named animation shipped with an asset
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    /// Clip name
    pub name: String,
    /// Length in seconds
    pub duration: f32,
}

/// Decoded asset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedAsset {
    /// Root node of the asset's scene
    pub scene: SceneNode,
    /// Animations shipped with the asset
    pub animations: Vec<AnimationClip>,
}

/// Fetches and decodes a glTF-family asset
pub trait AssetLoader {
    /// Load the asset at `url`
    fn load<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<LoadedAsset, LoadError>>;
}

/// Downloadable asset URL of a catalog item
///
/// Preference order: packed GLB asset, legacy single asset, web asset. Web
/// assets in the legacy `/3d/<digits>/` layout are rewritten to `/3d/glb/`
/// with `.flash.u3d` replaced by `.glb`.
pub fn catalog_asset_url(item: &CatalogItem) -> Option<String> {
    let non_empty = |url: &Option<String>| url.as_ref().filter(|u| !u.is_empty()).cloned();

    if let Some(url) = item.assets.glb.as_ref().and_then(|glb| non_empty(&glb.url)) {
        return Some(url);
    }
    if let Some(url) = non_empty(&item.three_dimensional_asset) {
        return Some(url);
    }
    let web = non_empty(&item.three_dimensional_asset_web)?;
    Some(match find_legacy_segment(&web) {
        Some((start, end)) => {
            let rewritten = format!("{}/3d/glb/{}", &web[..start], &web[end..]);
            rewritten.replacen(".flash.u3d", ".glb", 1)
        }
        None => web,
    })
}

/// Byte range of the first `/3d/<digits>/` segment
fn find_legacy_segment(url: &str) -> Option<(usize, usize)> {
    const PREFIX: &str = "/3d/";
    let mut offset = 0;
    while let Some(found) = url[offset..].find(PREFIX) {
        let start = offset + found;
        let digits_start = start + PREFIX.len();
        let digits = url[digits_start..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        let end = digits_start + digits;
        if digits > 0 && url[end..].starts_with('/') {
            return Some((start, end + 1));
        }
        offset = start + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{AssetReference, CatalogAssets};

    fn item() -> CatalogItem {
        CatalogItem {
            id: "chair".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_packed_asset_wins() {
        let mut item = item();
        item.assets = CatalogAssets {
            glb: Some(AssetReference {
                url: Some("https://cdn.example/chair.glb".to_string()),
            }),
        };
        item.three_dimensional_asset = Some("https://cdn.example/legacy.glb".to_string());
        assert_eq!(
            catalog_asset_url(&item).as_deref(),
            Some("https://cdn.example/chair.glb")
        );
    }

    #[test]
    fn test_legacy_asset_before_web_asset() {
        let mut item = item();
        item.assets.glb = Some(AssetReference { url: Some(String::new()) });
        item.three_dimensional_asset = Some("legacy.glb".to_string());
        item.three_dimensional_asset_web = Some("web.glb".to_string());
        assert_eq!(catalog_asset_url(&item).as_deref(), Some("legacy.glb"));
    }

    #[test]
    fn test_web_asset_legacy_layout_is_rewritten() {
        let mut item = item();
        item.three_dimensional_asset_web =
            Some("https://cdn.example/items/3d/1234/chair.flash.u3d".to_string());
        assert_eq!(
            catalog_asset_url(&item).as_deref(),
            Some("https://cdn.example/items/3d/glb/chair.glb")
        );
    }

    #[test]
    fn test_web_asset_without_legacy_layout_is_untouched() {
        let mut item = item();
        item.three_dimensional_asset_web =
            Some("https://cdn.example/3d/v2/chair.flash.u3d".to_string());
        assert_eq!(
            catalog_asset_url(&item).as_deref(),
            Some("https://cdn.example/3d/v2/chair.flash.u3d")
        );
    }

    #[test]
    fn test_no_url_at_all() {
        assert_eq!(catalog_asset_url(&item()), None);
    }
}
