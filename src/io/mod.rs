mod file_reader;
mod http_reader;
mod range_reader;
mod s3_reader;

pub use file_reader::FileRangeReader;
pub use http_reader::HttpRangeReader;
pub use range_reader::{prefix_range, RangeReader};
pub use s3_reader::{create_s3_client, S3RangeReader};
