pub mod aggregate;
pub mod consts;
pub mod detect;
pub mod error;
pub mod extract;
pub mod frame;
pub mod io;
pub mod metric;
pub mod pipeline;
pub mod series;
pub mod stats;
