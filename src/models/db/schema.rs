pub use game_donations::table as game_donations_db;
pub use games::table as games_db;
pub use leaderboard::table as leaderboard_db;

diesel::table! {
    /// 链上游戏缓存表（只读镜像，以合约为准）
    games (id) {
        /// 链上 gameId
        id -> Int8,
        puzzle -> Text,
        /// none / pending / active / verification_pending / solved / archived
        status -> Varchar,
        /// 奖池 (wei)
        pot -> Numeric,
        /// 报名费 (wei)
        entry_fee -> Numeric,
        token_address -> Varchar,
        proposer_address -> Varchar,
        winner_address -> Nullable<Varchar>,
        vote_threshold -> Int8,
        challenge_threshold -> Int8,
        /// riddle / math / other
        puzzle_type -> Varchar,
        require_submission_fee -> Bool,
        first_solver_address -> Nullable<Varchar>,
        oracle_params -> Text,
        verification_deadline -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// 捐赠流水（只追加）
    game_donations (id) {
        id -> Int8,
        game_id -> Int8,
        donor_address -> Varchar,
        amount -> Numeric,
        token_address -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// 排行榜视图（只读）
    leaderboard (address) {
        address -> Varchar,
        wins -> Int8,
        total_donated -> Numeric,
    }
}
