//! Preset watermark asset manifests.

use crate::fetch::AssetFetcher;

/// Load the list of preset asset locations from a JSON array of strings.
///
/// A missing manifest only hides the preset picker, so every failure yields
/// an empty list and a warning.
pub fn load_preset_manifest(fetcher: &dyn AssetFetcher, location: &str) -> Vec<String> {
    let bytes = match fetcher.fetch(location) {
        Ok(bytes) => bytes,
        Err(err) => {
            log::warn!(target: "preset", "Failed to load preset manifest: {}", err);
            return Vec::new();
        }
    };
    match serde_json::from_slice::<Vec<String>>(&bytes) {
        Ok(presets) => {
            log::debug!(target: "preset", "{} presets from {}", presets.len(), location);
            presets
        }
        Err(err) => {
            log::warn!(target: "preset", "Ignoring preset manifest {}: {}", location, err);
            Vec::new()
        }
    }
}
