mod compression;
mod layout;
mod reader;
mod writer;

pub use compression::{Compression, Deflate, Identity};
pub use layout::{FORMAT_VERSION, MAGIC, read_model, write_model};
pub use reader::ByteReader;
pub use writer::ByteWriter;
