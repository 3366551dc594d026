//! Supported games and their per-game configuration.

use crate::parser::{FileMatch, Parser, ParserKind};
use crate::rules::{PriorityRule, PriorityRuleTable};
use serde::{Deserialize, Serialize};

/// How a game reads mod metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModDescriptorType {
    /// `descriptor.mod` inside the mod plus `<name>.mod` next to it.
    DescriptorMod,
    /// `.metadata/metadata.json`.
    JsonMetadata,
    /// `.metadata/metadata.json` with `game_custom_data`.
    JsonMetadataV2,
}

/// Bit set of supported merge outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MergeTypes(u8);

impl MergeTypes {
    pub const BASIC: MergeTypes = MergeTypes(1);
    /// Merged output packed into a zip archive.
    pub const ZIP: MergeTypes = MergeTypes(2);

    pub const fn union(self, other: MergeTypes) -> MergeTypes {
        MergeTypes(self.0 | other.0)
    }

    pub const fn contains(self, other: MergeTypes) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Level of conflict-solver support for a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameAdvancedFeatures {
    None,
    ReadOnly,
    Full,
}

/// A game known to the resolver.
#[derive(Debug, Clone)]
pub struct GameType {
    /// Stable identifier used in config files, e.g. `stellaris`.
    pub key: &'static str,
    pub name: &'static str,
    pub steam_app_id: u32,
    /// Folder under the user's documents, e.g. `Paradox Interactive/Stellaris`.
    pub docs_path: &'static str,
    pub descriptor_type: ModDescriptorType,
    pub merge_types: MergeTypes,
    pub advanced_features: GameAdvancedFeatures,
    pub rules: PriorityRuleTable,
    /// Game-specific parsers, tried before the generic ones.
    pub parsers: Vec<Parser>,
}

impl GameType {
    pub fn supports_conflict_solver(&self) -> bool {
        self.advanced_features != GameAdvancedFeatures::None
    }

    pub fn stellaris() -> Self {
        let rules = PriorityRuleTable::new()
            .with("common", PriorityRule::Lios)
            .with("events", PriorityRule::Lios)
            .with("localisation", PriorityRule::Lios)
            .with("map", PriorityRule::Lios)
            .with("prescripted_countries", PriorityRule::Lios)
            .with("interface", PriorityRule::Fios)
            .with("gfx", PriorityRule::Fios)
            .with("common/component_templates", PriorityRule::Fios)
            .with("common/solar_system_initializers", PriorityRule::Fios)
            .with("common/section_templates", PriorityRule::Fios)
            .with("common/special_projects", PriorityRule::Fios);

        GameType {
            key: "stellaris",
            name: "Stellaris",
            steam_app_id: 281990,
            docs_path: "Paradox Interactive/Stellaris",
            descriptor_type: ModDescriptorType::DescriptorMod,
            merge_types: MergeTypes::BASIC.union(MergeTypes::ZIP),
            advanced_features: GameAdvancedFeatures::Full,
            rules,
            parsers: vec![
                Parser::new(
                    "StellarisWholeText",
                    ParserKind::WholeText {
                        matches: vec![
                            FileMatch::StartsWith("common/on_actions".into()),
                            FileMatch::StartsWith("map/galaxy".into()),
                            FileMatch::StartsWith("map/setup_scenarios".into()),
                            FileMatch::InDirectory("common".into()),
                        ],
                    },
                ),
                Parser::new(
                    "StellarisKey",
                    ParserKind::Key {
                        matches: vec![
                            FileMatch::StartsWith("common/random_names".into()),
                            FileMatch::StartsWith("gfx/worldgfx".into()),
                        ],
                        key_ids: vec!["key=".into(), "name=".into()],
                    },
                ),
            ],
        }
    }

    pub fn hearts_of_iron4() -> Self {
        let rules = PriorityRuleTable::new()
            .with("common", PriorityRule::Lios)
            .with("events", PriorityRule::Lios)
            .with("history", PriorityRule::Lios)
            .with("localisation", PriorityRule::Lios)
            .with("interface", PriorityRule::Fios)
            .with("gfx", PriorityRule::Fios);

        GameType {
            key: "hoi4",
            name: "Hearts of Iron IV",
            steam_app_id: 394360,
            docs_path: "Paradox Interactive/Hearts of Iron IV",
            descriptor_type: ModDescriptorType::DescriptorMod,
            merge_types: MergeTypes::BASIC,
            advanced_features: GameAdvancedFeatures::Full,
            rules,
            parsers: vec![Parser::new(
                "HOI4WholeText",
                ParserKind::WholeText {
                    matches: vec![
                        FileMatch::StartsWith("map".into()),
                        FileMatch::StartsWith("history".into()),
                        FileMatch::StartsWith("common/country_tags".into()),
                        FileMatch::Equals("common/graphicalculturetype.txt".into()),
                    ],
                },
            )],
        }
    }

    pub fn europa_universalis4() -> Self {
        GameType {
            key: "eu4",
            name: "Europa Universalis IV",
            steam_app_id: 236850,
            docs_path: "Paradox Interactive/Europa Universalis IV",
            descriptor_type: ModDescriptorType::DescriptorMod,
            merge_types: MergeTypes::BASIC,
            advanced_features: GameAdvancedFeatures::ReadOnly,
            rules: PriorityRuleTable::new()
                .with("common", PriorityRule::Lios)
                .with("events", PriorityRule::Lios)
                .with("interface", PriorityRule::Fios)
                .with("gfx", PriorityRule::Fios),
            parsers: Vec::new(),
        }
    }

    pub fn crusader_kings3() -> Self {
        GameType {
            key: "ck3",
            name: "Crusader Kings III",
            steam_app_id: 1158310,
            docs_path: "Paradox Interactive/Crusader Kings III",
            descriptor_type: ModDescriptorType::DescriptorMod,
            merge_types: MergeTypes::BASIC,
            advanced_features: GameAdvancedFeatures::ReadOnly,
            rules: PriorityRuleTable::new()
                .with("common", PriorityRule::Lios)
                .with("events", PriorityRule::Lios)
                .with("gui", PriorityRule::Fios)
                .with("gfx", PriorityRule::Fios),
            parsers: Vec::new(),
        }
    }

    pub fn victoria3() -> Self {
        GameType {
            key: "vic3",
            name: "Victoria 3",
            steam_app_id: 529340,
            docs_path: "Paradox Interactive/Victoria 3",
            descriptor_type: ModDescriptorType::JsonMetadata,
            merge_types: MergeTypes::BASIC,
            advanced_features: GameAdvancedFeatures::None,
            rules: PriorityRuleTable::new(),
            parsers: Vec::new(),
        }
    }
}

/// The set of games the resolver knows about.
#[derive(Debug, Clone)]
pub struct GameRegistry {
    games: Vec<GameType>,
}

impl Default for GameRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl GameRegistry {
    pub fn builtin() -> Self {
        Self {
            games: vec![
                GameType::stellaris(),
                GameType::hearts_of_iron4(),
                GameType::europa_universalis4(),
                GameType::crusader_kings3(),
                GameType::victoria3(),
            ],
        }
    }

    pub fn register(&mut self, game: GameType) {
        self.games.retain(|g| g.key != game.key);
        self.games.push(game);
    }

    pub fn get(&self, key: &str) -> Option<&GameType> {
        self.games.iter().find(|g| g.key.eq_ignore_ascii_case(key))
    }

    pub fn games(&self) -> &[GameType] {
        &self.games
    }
}
