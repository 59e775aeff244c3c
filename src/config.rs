// Runtime settings read from the environment (and `.env`, loaded in main).
//
// DISCORD_TOKEN is read separately in main so it never ends up in `Data`.

const DEFAULT_DATABASE_PATH: &str = "data/voice_time.db";
const DEFAULT_LEADERBOARD_SIZE: usize = 5;
const DEFAULT_COMMAND_PREFIX: &str = "!";
/// Discord embeds cap out at 25 fields.
const MAX_LEADERBOARD_SIZE: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    /// SQLite file holding the voice_time table.
    pub database_path: String,
    /// How many members `/leaderboard` shows.
    pub leaderboard_size: usize,
    /// Prefix for text commands (`!leaderboard`, `!lb`, ...).
    pub command_prefix: String,
}

impl BotConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let database_path = lookup("VOICE_TIME_DB")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());

        let leaderboard_size = match lookup("LEADERBOARD_SIZE") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(size) => size.clamp(1, MAX_LEADERBOARD_SIZE),
                Err(_) => {
                    tracing::warn!(
                        "Invalid LEADERBOARD_SIZE '{}', using {}",
                        raw,
                        DEFAULT_LEADERBOARD_SIZE
                    );
                    DEFAULT_LEADERBOARD_SIZE
                }
            },
            None => DEFAULT_LEADERBOARD_SIZE,
        };

        let command_prefix = lookup("COMMAND_PREFIX")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COMMAND_PREFIX.to_string());

        Self {
            database_path,
            leaderboard_size,
            command_prefix,
        }
    }
}
