//! 格式描述模块
//!
//! 音频格式、文件格式与属性包等不可变值对象

mod audio_format;
mod file_format;
mod properties;

// 重新导出公共接口
pub use audio_format::AudioFormat;
pub use file_format::{
    AudioFileFormat, FileType, extension_of, frame_length_from_duration, frame_rate_for,
};
pub use properties::{Properties, PropertyValue};
