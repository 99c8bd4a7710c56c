//! Static game and ROM catalog.
//!
//! The catalog is plain data: a list of consoles, the games shown in the library and the ROM
//! files backing them. A game and its ROM share the same identifier. The default catalog is
//! embedded in the binary and can be replaced by a JSON file of the same shape.
use std::path::Path;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use itertools::Itertools;
use serde::Deserialize;
use serde::Serialize;

const EMBEDDED_CATALOG: &str = include_str!("../catalog.json");

/// What a lookup by an unknown console identifier returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownConsolePolicy {
    /// Unknown consoles have no games.
    #[default]
    Empty,
    /// Unknown consoles list the whole catalog.
    All,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsoleInfo {
    pub id: String,
    /// Display name. Games and ROMs refer to their console by this name.
    pub name: String,
    pub description: String,
    pub icon: String,
    pub accent: [u8; 3],
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl ConsoleInfo {
    fn matches(&self, key: &str) -> bool {
        self.id.eq_ignore_ascii_case(key)
            || self.name.eq_ignore_ascii_case(key)
            || self.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(key))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub title: String,
    pub console: String,
    pub description: String,
    pub image: String,
    pub rating: f32,
    pub year: u16,
    pub genre: String,
    pub has_real_emulation: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RomInfo {
    pub id: String,
    pub title: String,
    pub console: String,
    pub description: String,
    pub rom_url: String,
    pub image: String,
    pub is_homebrew: bool,
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub consoles: Vec<ConsoleInfo>,
    pub games: Vec<Game>,
    pub roms: Vec<RomInfo>,
    #[serde(skip)]
    unknown_console: UnknownConsolePolicy,
}

impl Catalog {
    /// The catalog shipped with the launcher.
    pub fn embedded() -> Result<Catalog> {
        Self::from_json_str(EMBEDDED_CATALOG).context("Embedded catalog is invalid")
    }

    pub fn from_json_str(json: &str) -> Result<Catalog> {
        let deserializer = &mut serde_json::Deserializer::from_str(json);
        let catalog: Catalog = serde_path_to_error::deserialize(deserializer)
            .map_err(|err| anyhow::anyhow!("Invalid catalog at `{}`: {}", err.path(), err))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_json_file(path: &Path) -> Result<Catalog> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read catalog {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("Cannot load {}", path.display()))
    }

    pub fn with_unknown_console_policy(mut self, policy: UnknownConsolePolicy) -> Self {
        self.unknown_console = policy;
        self
    }

    pub fn unknown_console_policy(&self) -> UnknownConsolePolicy {
        self.unknown_console
    }

    /// Checks that identifiers are unique and that every game flagged as playable has a ROM.
    pub fn validate(&self) -> Result<()> {
        let duplicate_consoles = self.consoles.iter().map(|c| &c.id).duplicates().join(", ");
        if !duplicate_consoles.is_empty() {
            bail!("Duplicate console ids: {duplicate_consoles}");
        }
        let duplicate_games = self.games.iter().map(|g| &g.id).duplicates().join(", ");
        if !duplicate_games.is_empty() {
            bail!("Duplicate game ids: {duplicate_games}");
        }
        let duplicate_roms = self.roms.iter().map(|r| &r.id).duplicates().join(", ");
        if !duplicate_roms.is_empty() {
            bail!("Duplicate ROM ids: {duplicate_roms}");
        }
        let unplayable = self
            .games
            .iter()
            .filter(|game| game.has_real_emulation && self.rom_by_id(&game.id).is_none())
            .map(|game| &game.id)
            .join(", ");
        if !unplayable.is_empty() {
            bail!("Games marked as emulated without a matching ROM: {unplayable}");
        }
        Ok(())
    }

    pub fn consoles(&self) -> &[ConsoleInfo] {
        &self.consoles
    }

    /// Finds a console by id, display name or alias, ignoring ASCII case.
    pub fn console(&self, key: &str) -> Option<&ConsoleInfo> {
        self.consoles.iter().find(|console| console.matches(key))
    }

    pub fn games_by_console(&self, console_id: &str) -> Vec<&Game> {
        match self.console(console_id) {
            Some(console) => self
                .games
                .iter()
                .filter(|game| game.console == console.name)
                .collect(),
            None => match self.unknown_console {
                UnknownConsolePolicy::Empty => Vec::new(),
                UnknownConsolePolicy::All => self.games.iter().collect(),
            },
        }
    }

    pub fn roms_by_console(&self, console_id: &str) -> Vec<&RomInfo> {
        match self.console(console_id) {
            Some(console) => self
                .roms
                .iter()
                .filter(|rom| rom.console == console.name)
                .collect(),
            None => match self.unknown_console {
                UnknownConsolePolicy::Empty => Vec::new(),
                UnknownConsolePolicy::All => self.roms.iter().collect(),
            },
        }
    }

    pub fn game_count(&self, console_id: &str) -> usize {
        self.games_by_console(console_id).len()
    }

    pub fn game_by_id(&self, id: &str) -> Option<&Game> {
        self.games.iter().find(|game| game.id == id)
    }

    pub fn rom_by_id(&self, id: &str) -> Option<&RomInfo> {
        self.roms.iter().find(|rom| rom.id == id)
    }

    /// The ROM to run for `game`, if the game is wired up to real emulation.
    pub fn playable_rom(&self, game: &Game) -> Option<&RomInfo> {
        if game.has_real_emulation {
            self.rom_by_id(&game.id)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn titles(games: Vec<&Game>) -> Vec<&str> {
        games.iter().map(|game| game.title.as_str()).collect()
    }

    #[test]
    fn test_embedded_catalog_is_valid() {
        let catalog = Catalog::embedded().unwrap();
        assert!(!catalog.consoles().is_empty());
        for game in catalog.games.iter().filter(|game| game.has_real_emulation) {
            assert!(
                catalog.rom_by_id(&game.id).is_some(),
                "{} has no ROM",
                game.id
            );
        }
    }

    #[test]
    fn test_games_by_console_id_and_alias() {
        let catalog = Catalog::embedded().unwrap();
        assert_eq!(
            titles(catalog.games_by_console("nintendo")),
            vec!["Contra", "NES Test ROM"]
        );
        assert_eq!(
            titles(catalog.games_by_console("NES")),
            vec!["Contra", "NES Test ROM"]
        );
        assert_eq!(
            titles(catalog.games_by_console("snes")),
            vec!["Donkey Kong Country"]
        );
    }

    #[test]
    fn test_unknown_console_policy() {
        let catalog = Catalog::embedded().unwrap();
        assert!(catalog.games_by_console("dreamcast").is_empty());
        assert!(catalog.roms_by_console("dreamcast").is_empty());

        let catalog = catalog.with_unknown_console_policy(UnknownConsolePolicy::All);
        assert_eq!(catalog.games_by_console("dreamcast").len(), catalog.games.len());
        assert_eq!(catalog.roms_by_console("dreamcast").len(), catalog.roms.len());
    }

    #[test]
    fn test_playable_rom_requires_flag() {
        let catalog = Catalog::embedded().unwrap();
        let contra = catalog.game_by_id("contra").unwrap();
        assert_eq!(
            catalog.playable_rom(contra).map(|rom| rom.rom_url.as_str()),
            Some("/roms/Contra (U).nes")
        );
        let dkc = catalog.game_by_id("donkey-kong-country").unwrap();
        assert!(catalog.rom_by_id(&dkc.id).is_some());
        assert!(catalog.playable_rom(dkc).is_none());
    }

    #[test]
    fn test_rejects_emulated_game_without_rom() {
        let json = r#"{
            "consoles": [],
            "games": [{
                "id": "ghost", "title": "Ghost", "console": "Nintendo NES",
                "description": "", "image": "", "rating": 1.0, "year": 1990,
                "genre": "", "has_real_emulation": true
            }],
            "roms": []
        }"#;
        let err = Catalog::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("ghost"), "{err}");
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let mut catalog = Catalog::embedded().unwrap();
        catalog.roms.push(catalog.roms[0].clone());
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_reports_json_path_of_bad_field() {
        let json = r#"{ "consoles": [], "games": [{ "id": 3 }], "roms": [] }"#;
        let err = Catalog::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("games[0].id"), "{err}");
    }
}
