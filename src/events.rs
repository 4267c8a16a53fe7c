/// Frame events surfaced to the game layer.
///
/// The map buffers these during [`crate::Map::update`]; the caller drains
/// them afterwards and reacts (shows/hides the interaction prompt, starts a
/// cutscene). Nothing here blocks the physics tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapEvent {
    /// The player's interact box started overlapping `other`.
    PromptAdded {
        player: hecs::Entity,
        other: hecs::Entity,
    },
    /// The player's interact box stopped overlapping `other`.
    PromptRemoved {
        player: hecs::Entity,
        other: hecs::Entity,
    },
    /// The player pressed interact next to `target`; run its script.
    ScriptRequested {
        target: hecs::Entity,
        script: String,
    },
}
