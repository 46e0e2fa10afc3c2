pub mod ffmpeg;
pub mod image_io;
pub mod metric_table;
pub mod ser;
pub mod ser_writer;
pub mod source;

pub use metric_table::{read_metric_table, write_metric_table};
pub use source::{frames, open_source, FrameSource};
