//! 对外服务入口
//!
//! [`AudioFileReader`] 负责探测与打开流，[`FormatConversionProvider`] 负责PCM目标格式协商。

mod conversion;
mod file_reader;

pub use conversion::{FormatConversionProvider, TARGET_ENCODINGS};
pub use file_reader::AudioFileReader;
