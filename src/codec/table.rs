//! 编解码器静态表
//!
//! 已知编解码器的 (id, 名称, 描述, 类别) 编译期数组。
//! 名称统一采用FFmpeg短名（小写），与id一一对应。

use super::{CodecId, CodecInfo, CodecKind, PcmLayout, SampleKind};

const fn tag(t: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*t)
}

const fn compressed(id: u32, name: &'static str, description: &'static str) -> CodecInfo {
    CodecInfo {
        id: CodecId(id),
        name,
        description,
        kind: CodecKind::Compressed,
    }
}

const fn other_pcm(id: u32, name: &'static str, description: &'static str) -> CodecInfo {
    CodecInfo {
        id: CodecId(id),
        name,
        description,
        kind: CodecKind::OtherPcm,
    }
}

const fn companded(id: u32, name: &'static str, description: &'static str) -> CodecInfo {
    CodecInfo {
        id: CodecId(id),
        name,
        description,
        kind: CodecKind::Companded,
    }
}

const fn family(id: u32, name: &'static str, description: &'static str, kind: SampleKind) -> CodecInfo {
    CodecInfo {
        id: CodecId(id),
        name,
        description,
        kind: CodecKind::PcmFamily(kind),
    }
}

const fn linear(
    id: u32,
    name: &'static str,
    description: &'static str,
    kind: SampleKind,
    bits: u16,
    big_endian: bool,
    planar: bool,
) -> CodecInfo {
    CodecInfo {
        id: CodecId(id),
        name,
        description,
        kind: CodecKind::LinearPcm(PcmLayout {
            kind,
            bits,
            big_endian,
            planar,
        }),
    }
}

use super::SampleKind::{Float as F, Signed as S, Unsigned as U};

/// 通用PCM编码id（不指定位深度/字节序）
pub(crate) const PCM_SIGNED_ID: u32 = tag(b"PCMS");
pub(crate) const PCM_UNSIGNED_ID: u32 = tag(b"PCMU");
pub(crate) const PCM_FLOAT_ID: u32 = tag(b"PCMF");

pub(super) static CODECS: &[CodecInfo] = &[
    // 通用PCM族
    family(PCM_SIGNED_ID, "pcm_signed", "PCM signed", S),
    family(PCM_UNSIGNED_ID, "pcm_unsigned", "PCM unsigned", U),
    family(PCM_FLOAT_ID, "pcm_float", "PCM float", F),
    // 线性PCM
    linear(0x10000, "pcm_s16le", "PCM signed 16-bit little-endian", S, 16, false, false),
    linear(0x10001, "pcm_s16be", "PCM signed 16-bit big-endian", S, 16, true, false),
    linear(0x10002, "pcm_u16le", "PCM unsigned 16-bit little-endian", U, 16, false, false),
    linear(0x10003, "pcm_u16be", "PCM unsigned 16-bit big-endian", U, 16, true, false),
    linear(0x10004, "pcm_s8", "PCM signed 8-bit", S, 8, false, false),
    linear(0x10005, "pcm_u8", "PCM unsigned 8-bit", U, 8, false, false),
    companded(0x10006, "pcm_mulaw", "PCM mu-law"),
    companded(0x10007, "pcm_alaw", "PCM A-law"),
    linear(0x10008, "pcm_s32le", "PCM signed 32-bit little-endian", S, 32, false, false),
    linear(0x10009, "pcm_s32be", "PCM signed 32-bit big-endian", S, 32, true, false),
    linear(0x1000a, "pcm_u32le", "PCM unsigned 32-bit little-endian", U, 32, false, false),
    linear(0x1000b, "pcm_u32be", "PCM unsigned 32-bit big-endian", U, 32, true, false),
    linear(0x1000c, "pcm_s24le", "PCM signed 24-bit little-endian", S, 24, false, false),
    linear(0x1000d, "pcm_s24be", "PCM signed 24-bit big-endian", S, 24, true, false),
    linear(0x1000e, "pcm_u24le", "PCM unsigned 24-bit little-endian", U, 24, false, false),
    linear(0x1000f, "pcm_u24be", "PCM unsigned 24-bit big-endian", U, 24, true, false),
    other_pcm(0x10010, "pcm_s24daud", "PCM D-Cinema audio signed 24-bit"),
    other_pcm(0x10011, "pcm_zork", "PCM Zork"),
    linear(0x10012, "pcm_s16le_planar", "PCM signed 16-bit little-endian planar", S, 16, false, true),
    other_pcm(0x10013, "pcm_dvd", "PCM DVD"),
    linear(0x10014, "pcm_f32be", "PCM 32-bit float big-endian", F, 32, true, false),
    linear(0x10015, "pcm_f32le", "PCM 32-bit float little-endian", F, 32, false, false),
    linear(0x10016, "pcm_f64be", "PCM 64-bit float big-endian", F, 64, true, false),
    linear(0x10017, "pcm_f64le", "PCM 64-bit float little-endian", F, 64, false, false),
    other_pcm(0x10018, "pcm_bluray", "PCM Blu-ray"),
    other_pcm(0x10019, "pcm_lxf", "PCM LXF"),
    other_pcm(0x1001a, "s302m", "SMPTE 302M"),
    linear(0x1001b, "pcm_s8_planar", "PCM signed 8-bit planar", S, 8, false, true),
    linear(0x18505350, "pcm_s24le_planar", "PCM signed 24-bit little-endian planar", S, 24, false, true),
    linear(0x20505350, "pcm_s32le_planar", "PCM signed 32-bit little-endian planar", S, 32, false, true),
    linear(0x50535010, "pcm_s16be_planar", "PCM signed 16-bit big-endian planar", S, 16, true, true),
    linear(tag(b"S64L"), "pcm_s64le", "PCM signed 64-bit little-endian", S, 64, false, false),
    linear(tag(b"S64B"), "pcm_s64be", "PCM signed 64-bit big-endian", S, 64, true, false),
    other_pcm(tag(b"F16L"), "pcm_f16le", "PCM 16.8 floating point little-endian"),
    other_pcm(tag(b"F24L"), "pcm_f24le", "PCM 24.0 floating point little-endian"),
    other_pcm(tag(b"VIDC"), "pcm_vidc", "PCM Archimedes VIDC"),
    other_pcm(tag(b"PSGA"), "pcm_sga", "PCM SGA"),
    // ADPCM
    compressed(0x11000, "adpcm_ima_qt", "ADPCM IMA QuickTime"),
    compressed(0x11001, "adpcm_ima_wav", "ADPCM IMA WAV"),
    compressed(0x11002, "adpcm_ima_dk3", "ADPCM IMA Duck DK3"),
    compressed(0x11003, "adpcm_ima_dk4", "ADPCM IMA Duck DK4"),
    compressed(0x11004, "adpcm_ima_ws", "ADPCM IMA Westwood"),
    compressed(0x11005, "adpcm_ima_smjpeg", "ADPCM IMA Loki SDL MJPEG"),
    compressed(0x11006, "adpcm_ms", "ADPCM Microsoft"),
    compressed(0x11007, "adpcm_4xm", "ADPCM 4X Movie"),
    compressed(0x11008, "adpcm_xa", "ADPCM CDROM XA"),
    compressed(0x11009, "adpcm_adx", "SEGA CRI ADX ADPCM"),
    compressed(0x1100a, "adpcm_ea", "ADPCM Electronic Arts"),
    compressed(0x1100b, "adpcm_g726", "G.726 ADPCM"),
    compressed(0x1100c, "adpcm_ct", "ADPCM Creative Technology"),
    compressed(0x1100d, "adpcm_swf", "ADPCM Shockwave Flash"),
    compressed(0x1100e, "adpcm_yamaha", "ADPCM Yamaha"),
    compressed(0x1100f, "adpcm_sbpro_4", "ADPCM Sound Blaster Pro 4-bit"),
    compressed(0x11010, "adpcm_sbpro_3", "ADPCM Sound Blaster Pro 2.6-bit"),
    compressed(0x11011, "adpcm_sbpro_2", "ADPCM Sound Blaster Pro 2-bit"),
    compressed(0x11012, "adpcm_thp", "ADPCM Nintendo THP"),
    compressed(0x11013, "adpcm_ima_amv", "ADPCM IMA AMV"),
    compressed(0x11014, "adpcm_ea_r1", "ADPCM Electronic Arts R1"),
    compressed(0x11015, "adpcm_ea_r3", "ADPCM Electronic Arts R3"),
    compressed(0x11016, "adpcm_ea_r2", "ADPCM Electronic Arts R2"),
    compressed(0x11017, "adpcm_ima_ea_sead", "ADPCM IMA Electronic Arts SEAD"),
    compressed(0x11018, "adpcm_ima_ea_eacs", "ADPCM IMA Electronic Arts EACS"),
    compressed(0x11019, "adpcm_ea_xas", "ADPCM Electronic Arts XAS"),
    compressed(0x1101a, "adpcm_ea_maxis_xa", "ADPCM Electronic Arts Maxis CDROM XA"),
    compressed(0x1101b, "adpcm_ima_iss", "ADPCM IMA Funcom ISS"),
    compressed(0x1101c, "adpcm_g722", "G.722 ADPCM"),
    compressed(0x1101d, "adpcm_ima_apc", "ADPCM IMA CRYO APC"),
    compressed(0x56494d41, "vima", "LucasArts VIMA audio"),
    compressed(0x41464320, "adpcm_afc", "ADPCM Nintendo Gamecube AFC"),
    compressed(0x4f4b4920, "adpcm_ima_oki", "ADPCM IMA Dialogic OKI"),
    compressed(tag(b"DAT4"), "adpcm_ima_dat4", "ADPCM IMA Eurocom DAT4"),
    compressed(tag(b"MTAF"), "adpcm_mtaf", "ADPCM MTAF"),
    compressed(tag(b"AICA"), "adpcm_aica", "ADPCM Yamaha AICA"),
    compressed(tag(b"PSX "), "adpcm_psx", "ADPCM Playstation"),
    compressed(tag(b"THPL"), "adpcm_thp_le", "ADPCM Nintendo THP (little-endian)"),
    compressed(tag(b"IRAD"), "adpcm_ima_rad", "ADPCM IMA Radical"),
    compressed(tag(b"ARGO"), "adpcm_argo", "ADPCM Argonaut Games"),
    compressed(tag(b"ZRKA"), "adpcm_zork", "ADPCM Zork"),
    // 语音编解码器
    compressed(0x12000, "amr_nb", "AMR-NB (Adaptive Multi-Rate NarrowBand)"),
    compressed(0x12001, "amr_wb", "AMR-WB (Adaptive Multi-Rate WideBand)"),
    compressed(0x13000, "ra_144", "RealAudio 1.0 (14.4K)"),
    compressed(0x13001, "ra_288", "RealAudio 2.0 (28.8K)"),
    // DPCM
    compressed(0x14000, "roq_dpcm", "DPCM id RoQ"),
    compressed(0x14001, "interplay_dpcm", "DPCM Interplay"),
    compressed(0x14002, "xan_dpcm", "DPCM Xan"),
    compressed(0x14003, "sol_dpcm", "DPCM Sol"),
    compressed(tag(b"DERF"), "derf_dpcm", "DPCM Xilam DERF"),
    compressed(tag(b"GRDP"), "gremlin_dpcm", "DPCM Gremlin"),
    compressed(tag(b"SDX2"), "sdx2_dpcm", "DPCM Squareroot-Delta-Exact"),
    compressed(tag(b"CBD2"), "cbd2_dpcm", "DPCM Cuberoot-Delta-Exact"),
    compressed(tag(b"WADY"), "wady_dpcm", "DPCM Marble WADY"),
    // 通用压缩编解码器
    compressed(0x15000, "mp2", "MPEG-1 Audio Layer 2"),
    compressed(0x15001, "mp3", "MPEG-1 Audio Layer 3"),
    compressed(0x15002, "aac", "MPEG-4 AAC"),
    compressed(0x15003, "ac3", "ATSC A/52A (AC-3)"),
    compressed(0x15004, "dts", "DCA (DTS Coherent Acoustics)"),
    compressed(0x15005, "vorbis", "Vorbis"),
    compressed(0x15006, "dvaudio", "DV audio"),
    compressed(0x15007, "wmav1", "Windows Media Audio 1"),
    compressed(0x15008, "wmav2", "Windows Media Audio 2"),
    compressed(0x15009, "mace3", "MACE (Macintosh Audio Compression/Expansion) 3:1"),
    compressed(0x1500a, "mace6", "MACE (Macintosh Audio Compression/Expansion) 6:1"),
    compressed(0x1500b, "vmdaudio", "Sierra VMD audio"),
    compressed(0x1500c, "flac", "FLAC (Free Lossless Audio Codec)"),
    compressed(0x1500d, "mp3adu", "ADU (Application Data Unit) MP3"),
    compressed(0x1500e, "mp3on4", "MP3onMP4"),
    compressed(0x1500f, "shorten", "Shorten"),
    compressed(0x15010, "alac", "ALAC (Apple Lossless Audio Codec)"),
    compressed(0x15011, "westwood_snd1", "Westwood Audio (SND1)"),
    compressed(0x15012, "gsm", "GSM"),
    compressed(0x15013, "qdm2", "QDesign Music Codec 2"),
    compressed(0x15014, "cook", "Cook / Cooker / Gecko (RealAudio G2)"),
    compressed(0x15015, "truespeech", "DSP Group TrueSpeech"),
    compressed(0x15016, "tta", "TTA (True Audio)"),
    compressed(0x15017, "smackaudio", "Smacker audio"),
    compressed(0x15018, "qcelp", "QCELP / PureVoice"),
    compressed(0x15019, "wavpack", "WavPack"),
    compressed(0x1501a, "dsicinaudio", "Delphine Software International CIN audio"),
    compressed(0x1501b, "imc", "IMC (Intel Music Coder)"),
    compressed(0x1501c, "musepack7", "Musepack SV7"),
    compressed(0x1501d, "mlp", "MLP (Meridian Lossless Packing)"),
    compressed(0x1501e, "gsm_ms", "GSM Microsoft variant"),
    compressed(0x1501f, "atrac3", "ATRAC3 (Adaptive TRansform Acoustic Coding 3)"),
    compressed(0x15020, "voxware", "Voxware RT29 Metasound"),
    compressed(0x15021, "ape", "Monkey's Audio"),
    compressed(0x15022, "nellymoser", "Nellymoser Asao"),
    compressed(0x15023, "musepack8", "Musepack SV8"),
    compressed(0x15024, "speex", "Speex"),
    compressed(0x15025, "wmavoice", "Windows Media Audio Voice"),
    compressed(0x15026, "wmapro", "Windows Media Audio 9 Professional"),
    compressed(0x15027, "wmalossless", "Windows Media Audio Lossless"),
    compressed(0x15028, "atrac3p", "ATRAC3+ (Adaptive TRansform Acoustic Coding 3+)"),
    compressed(0x15029, "eac3", "ATSC A/52B (AC-3, E-AC-3)"),
    compressed(0x1502a, "sipr", "RealAudio SIPR / ACELP.NET"),
    compressed(0x1502b, "mp1", "MPEG-1 Audio Layer 1"),
    compressed(0x1502c, "twinvq", "VQF TwinVQ"),
    compressed(0x1502d, "truehd", "TrueHD"),
    compressed(0x1502e, "mp4als", "MPEG-4 Audio Lossless Coding (ALS)"),
    compressed(0x1502f, "atrac1", "ATRAC1 (Adaptive TRansform Acoustic Coding)"),
    compressed(0x15030, "binkaudio_rdft", "Bink Audio (RDFT)"),
    compressed(0x15031, "binkaudio_dct", "Bink Audio (DCT)"),
    compressed(0x15032, "aac_latm", "AAC LATM (Advanced Audio Coding LATM syntax)"),
    compressed(0x15033, "qdmc", "QDesign Music"),
    compressed(0x15034, "celt", "Constrained Energy Lapped Transform (CELT)"),
    compressed(0x15035, "g723_1", "G.723.1"),
    compressed(0x15036, "g729", "G.729"),
    compressed(0x15037, "8svx_exp", "8SVX exponential"),
    compressed(0x15038, "8svx_fib", "8SVX fibonacci"),
    compressed(0x15039, "bmv_audio", "Discworld II BMV audio"),
    compressed(0x1503a, "ralf", "RealAudio Lossless"),
    compressed(0x1503b, "iac", "IAC (Indeo Audio Coder)"),
    compressed(0x1503c, "ilbc", "iLBC (Internet Low Bitrate Codec)"),
    compressed(0x1503d, "opus_deprecated", "Opus (deprecated id)"),
    compressed(0x1503e, "comfortnoise", "RFC 3389 comfort noise"),
    compressed(0x1503f, "tak_deprecated", "TAK (deprecated id)"),
    compressed(0x46465753, "wavesynth", "Wave synthesis pseudo-codec"),
    compressed(0x38535658, "8svx_raw", "8SVX raw"),
    compressed(0x534f4e43, "sonic", "Sonic"),
    compressed(0x534f4e4c, "sonicls", "Sonic lossless"),
    compressed(0x50414641, "paf_audio", "Amazing Studio Packed Animation File audio"),
    compressed(0x4f505553, "opus", "Opus (Opus Interactive Audio Codec)"),
    compressed(0x7442614b, "tak", "TAK (Tom's lossless Audio Kompressor)"),
    compressed(0x73657663, "evrc", "EVRC (Enhanced Variable Rate Codec)"),
    compressed(0x73736d76, "smv", "SMV (Selectable Mode Vocoder)"),
    // 后续加入的编解码器
    compressed(tag(b"DSDL"), "dsd_lsbf", "DSD (Direct Stream Digital), least significant bit first"),
    compressed(tag(b"DSDM"), "dsd_msbf", "DSD (Direct Stream Digital), most significant bit first"),
    compressed(tag(b"DSLP"), "dsd_lsbf_planar", "DSD, least significant bit first, planar"),
    compressed(tag(b"DSMP"), "dsd_msbf_planar", "DSD, most significant bit first, planar"),
    compressed(tag(b"DST "), "dst", "DST (Direct Stream Transfer)"),
    compressed(tag(b"4GV "), "4gv", "4GV (Fourth Generation Vocoder)"),
    compressed(tag(b"IACM"), "interplay_acm", "Interplay ACM"),
    compressed(tag(b"XMA1"), "xma1", "Xbox Media Audio 1"),
    compressed(tag(b"XMA2"), "xma2", "Xbox Media Audio 2"),
    compressed(tag(b"AT3A"), "atrac3al", "ATRAC3 AL"),
    compressed(tag(b"AT3P"), "atrac3pal", "ATRAC3+ AL"),
    compressed(tag(b"ATR9"), "atrac9", "ATRAC9"),
    compressed(tag(b"DOLE"), "dolby_e", "Dolby E"),
    compressed(tag(b"APTX"), "aptx", "aptX (Audio Processing Technology for Bluetooth)"),
    compressed(tag(b"APHD"), "aptx_hd", "aptX HD"),
    compressed(tag(b"SBC "), "sbc", "SBC (low-complexity subband codec)"),
    compressed(tag(b"HCOM"), "hcom", "HCOM Audio"),
    compressed(tag(b"ACLP"), "acelp_kelvin", "Sipro ACELP.KELVIN"),
    compressed(tag(b"MHA1"), "mpegh_3d_audio", "MPEG-H 3D Audio"),
    compressed(tag(b"SIRN"), "siren", "Siren"),
    compressed(tag(b"HCA "), "hca", "CRI HCA"),
    compressed(tag(b"FSAU"), "fastaudio", "MobiClip FastAudio"),
    compressed(tag(b"MSSR"), "msnsiren", "MSN Siren"),
    compressed(tag(b"DFPW"), "dfpwm", "DFPWM1a audio"),
    compressed(tag(b"BONK"), "bonk", "Bonk audio"),
    compressed(tag(b"MSC4"), "misc4", "Micronas SC-4 audio"),
    compressed(tag(b"APAC"), "apac", "Marian's A-pac audio"),
    compressed(tag(b"FTR "), "ftr", "FTR Voice"),
    compressed(tag(b"WARC"), "wavarc", "Waveform Archiver"),
    compressed(tag(b"RKA "), "rka", "RKA (RK Audio)"),
    compressed(tag(b"AC-4"), "ac4", "AC-4"),
    compressed(tag(b"OSQ "), "osq", "OSQ (Original Sound Quality)"),
    compressed(tag(b"QOA "), "qoa", "QOA (Quite OK Audio)"),
    compressed(tag(b"LC3 "), "lc3", "LC3 (Low Complexity Communication Codec)"),
];
