/// Fallback hint derived from the location name, shown when the backend
/// has not sent one.
pub fn hint_for_location(location: &str) -> &'static str {
    if location.contains("forest") {
        "Forests hide many secrets. Try 'examine trees' or 'search for trails'."
    } else if location.contains("village") {
        "In villages you can 'talk to villagers' or visit places like the 'tavern' or the 'market'."
    } else if location.contains("cave") {
        "Caves are dangerous. Use 'light torch' to see better or 'listen' to detect creatures."
    } else {
        "Use the command 'look around' to examine your surroundings."
    }
}
