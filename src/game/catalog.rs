use std::collections::HashMap;

/// Theme played where no dedicated track exists
pub const DEFAULT_TRACK: &str = "/static/audio/adventure_theme.mp3";

/// Location → ambient track, for turns that carry a location but no
/// ambient sound of their own.
#[derive(Debug, Clone)]
pub struct SoundscapeCatalog {
    tracks: HashMap<String, String>,
    default_track: String,
}

impl Default for SoundscapeCatalog {
    fn default() -> Self {
        let tracks = [
            ("village_of_meadowbrook", "/static/audio/peaceful_village.mp3"),
            ("forest_of_whispers", "/static/audio/mysterious_forest.mp3"),
            ("ancient_ruins", "/static/audio/dark_ruins.mp3"),
            ("mountain_pass", "/static/audio/epic_mountains.mp3"),
            ("tavern", "/static/audio/tavern_music.mp3"),
            ("castle", "/static/audio/royal_castle.mp3"),
            ("cave", "/static/audio/cave_ambience.mp3"),
            ("beach", "/static/audio/ocean_waves.mp3"),
            ("dark_forest", "/static/audio/dark_forest.mp3"),
        ];
        Self {
            tracks: tracks
                .iter()
                .map(|(location, path)| (location.to_string(), path.to_string()))
                .collect(),
            default_track: DEFAULT_TRACK.to_string(),
        }
    }
}

impl SoundscapeCatalog {
    pub fn insert(&mut self, location: impl Into<String>, track: impl Into<String>) {
        self.tracks.insert(location.into(), track.into());
    }

    pub fn track_for(&self, location: &str) -> &str {
        self.tracks
            .get(location)
            .map(String::as_str)
            .unwrap_or(&self.default_track)
    }
}
