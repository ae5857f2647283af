pub mod train;

pub use train::{NerArgs, SentimentArgs, TrainCommands};
