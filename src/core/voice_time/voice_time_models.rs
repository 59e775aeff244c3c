/// Identifies one member inside one guild.
///
/// Users can sit in voice in several guilds at once, so sessions and totals
/// are always keyed by the pair rather than by the user alone.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SessionKey {
    pub user_id: u64,
    pub guild_id: u64,
}

impl SessionKey {
    pub fn new(user_id: u64, guild_id: u64) -> Self {
        Self { user_id, guild_id }
    }
}

/// A persisted running total for one member of one guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceTimeRecord {
    pub user_id: u64,
    pub guild_id: u64,
    pub total_seconds: u64,
}

/// One displayable leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// Position in the stored ranking (1-based). Users that could not be
    /// resolved are dropped from the output but still hold their slot.
    pub rank: usize,
    pub user_id: u64,
    pub display_name: String,
    pub total_seconds: u64,
    pub formatted: String,
}

/// Voice statistics for a single member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceProfile {
    pub user_id: u64,
    pub guild_id: u64,
    pub total_seconds: u64,
    pub formatted: String,
    pub rank: usize,
    /// True while the member has an open session.
    pub in_voice: bool,
}
