/// Room catalog loading.
///
/// Sources, in order:
///   1. Built-in rooms compiled into the binary (`rooms/*.toml`)
///   2. `<rooms_dir>/*.toml`, sorted by file name
///
/// A later room with an id already in the catalog replaces it in place.
/// Files that fail to read, parse or validate are skipped with a warning;
/// loading itself never fails.

use std::path::{Path, PathBuf};

use crate::domain::catalog::{CatalogError, Room};

const EMBEDDED: &[(&str, &str)] = &[
    ("egypt.toml", include_str!("../../rooms/egypt.toml")),
    ("space.toml", include_str!("../../rooms/space.toml")),
    ("haunted.toml", include_str!("../../rooms/haunted.toml")),
];

/// Parse and validate one room file.
pub fn parse_room(text: &str) -> Result<Room, CatalogError> {
    let room: Room = toml::from_str(text)?;
    room.validate()?;
    Ok(room)
}

pub fn read_room(path: &Path) -> Result<Room, CatalogError> {
    let text = std::fs::read_to_string(path)?;
    parse_room(&text)
}

/// The rooms shipped with the game.
pub fn builtin_rooms() -> Vec<Room> {
    let mut rooms = vec![];
    for (name, text) in EMBEDDED {
        match parse_room(text) {
            Ok(room) => rooms.push(room),
            Err(e) => log::warn!("built-in room {name} skipped: {e}"),
        }
    }
    rooms
}

/// Built-in rooms merged with whatever `dir` holds.
/// A missing directory is the common case and is not reported.
pub fn load_catalog(dir: &Path) -> Vec<Room> {
    let mut rooms = builtin_rooms();
    for path in room_files(dir) {
        match read_room(&path) {
            Ok(room) => {
                log::debug!("loaded room {} from {}", room.id, path.display());
                merge(&mut rooms, room);
            }
            Err(e) => log::warn!("{} skipped: {e}", path.display()),
        }
    }
    rooms
}

fn merge(rooms: &mut Vec<Room>, room: Room) {
    match rooms.iter_mut().find(|r| r.id == room.id) {
        Some(slot) => *slot = room,
        None => rooms.push(room),
    }
}

fn room_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return vec![],
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().map_or(false, |e| e == "toml"))
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::Difficulty;

    const EXTRA: &str = r#"
        id = "lab"
        name = "Secret Lab"
        theme = "lab"
        difficulty = "easy"
        base_score = 300
        time_limit = 200

        [[puzzle]]
        id = "lab-1"
        type = "crypto"
        question = "URYYB"
        answer = "HELLO"
        points = 50
    "#;

    #[test]
    fn builtin_rooms_all_parse() {
        let rooms = builtin_rooms();
        let ids: Vec<&str> = rooms.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["egypt", "space", "haunted"]);
        for room in &rooms {
            assert_eq!(room.puzzles.len(), 10, "{}", room.id);
            assert!(!room.power_ups.is_empty());
            assert!(!room.achievements.is_empty());
        }
    }

    #[test]
    fn egypt_matches_reference_room() {
        let rooms = builtin_rooms();
        let egypt = rooms.iter().find(|r| r.id == "egypt").unwrap();
        assert_eq!(egypt.name, "Ancient Egypt");
        assert_eq!(egypt.difficulty, Difficulty::Medium);
        assert_eq!(egypt.base_score, 1000);
        assert_eq!(egypt.time_limit, 600);
        assert_eq!(egypt.puzzles[0].points, 100);
        assert_eq!(egypt.puzzles[0].difficulty, Difficulty::Easy);
        assert_eq!(egypt.puzzles[1].difficulty, Difficulty::Medium);
        assert!(egypt.puzzles[0].accepts("pharaoh"));
    }

    #[test]
    fn invalid_room_is_rejected() {
        let text = EXTRA.replace("time_limit = 200", "time_limit = 0");
        assert!(matches!(parse_room(&text), Err(CatalogError::ZeroTimeLimit { .. })));
        assert!(matches!(parse_room("id = 3"), Err(CatalogError::Parse(_))));
    }

    #[test]
    fn directory_rooms_are_added_and_override_by_id() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b_lab.toml"), EXTRA).unwrap();
        let override_space = EXTRA.replace("id = \"lab\"", "id = \"space\"");
        std::fs::write(dir.path().join("a_space.toml"), override_space).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "not = [valid").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let rooms = load_catalog(dir.path());
        let ids: Vec<&str> = rooms.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["egypt", "space", "haunted", "lab"]);
        // replaced in place
        assert_eq!(rooms[1].name, "Secret Lab");
        assert_eq!(rooms[1].puzzles.len(), 1);
    }

    #[test]
    fn missing_directory_gives_builtins() {
        let rooms = load_catalog(Path::new("/nonexistent/escapeword/rooms"));
        assert_eq!(rooms.len(), 3);
    }
}
