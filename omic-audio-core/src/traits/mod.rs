pub mod audio_engine;
pub mod codec_engine;
pub mod fill_strategy;
