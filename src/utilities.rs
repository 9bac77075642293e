pub mod config;
pub mod ffmpeg;
pub mod frame_store;
pub mod logchamp;
pub mod text_utils;

#[cfg(test)]
pub mod test_fixtures;
