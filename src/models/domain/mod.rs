pub mod event;
pub mod game;

pub use event::{ContractEvent, EventKind};
pub use game::{GameDetails, GameStatus, PuzzleType, StatusFilter};
