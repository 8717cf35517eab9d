pub mod image_sequence_recorder;
pub mod log_display_sink;
pub mod preview_file_sink;
