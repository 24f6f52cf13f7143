use std::io::{self, Read};
use flate2::{Compression, write::GzEncoder, read::GzDecoder};

/// 魔数 - 标识目录 bundle 文件
pub const MAGIC_BYTES: &[u8] = b"FDCAT";

/// 头部长度：魔数 + 2 字节版本 + 4 字节原始大小
const HEADER_LEN: usize = MAGIC_BYTES.len() + 2 + 4;

fn invalid_data(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

/// 将对象序列化为 bincode 二进制
pub fn to_binary<T: serde::Serialize>(obj: &T) -> Result<Vec<u8>, io::Error> {
    bincode::serde::encode_to_vec(obj, bincode::config::standard())
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("序列化失败: {}", e)))
}

/// 从 bincode 二进制反序列化对象
pub fn from_binary<T: for<'a> serde::de::Deserialize<'a>>(data: &[u8]) -> Result<T, io::Error> {
    bincode::serde::decode_from_slice(data, bincode::config::standard())
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("反序列化失败: {}", e)))
        .map(|(value, _)| value)
}

/// 序列化并压缩：魔数 | 版本 | 原始大小(LE u32) | gzip 数据
pub fn to_compressed<T: serde::Serialize>(obj: &T, version: [u8; 2]) -> Result<Vec<u8>, io::Error> {
    let binary = to_binary(obj)?;
    let original_size = u32::try_from(binary.len())
        .map_err(|_| invalid_data(format!("数据过大: {} 字节", binary.len())))?;

    let mut output = Vec::with_capacity(HEADER_LEN + binary.len() / 2);
    output.extend_from_slice(MAGIC_BYTES);
    output.extend_from_slice(&version);
    output.extend_from_slice(&original_size.to_le_bytes());

    let mut encoder = GzEncoder::new(output, Compression::best());
    std::io::Write::write_all(&mut encoder, &binary)?;
    encoder.finish()
}

/// 校验头部，返回 (版本, 原始大小)
fn read_header(data: &[u8], max_version: u8) -> Result<([u8; 2], u32), io::Error> {
    if data.len() < HEADER_LEN {
        return Err(invalid_data(format!("数据太短，无法解析: {} 字节", data.len())));
    }

    if &data[..MAGIC_BYTES.len()] != MAGIC_BYTES {
        return Err(invalid_data("无效的文件格式：魔数不匹配"));
    }

    let version_offset = MAGIC_BYTES.len();
    let version = [data[version_offset], data[version_offset + 1]];
    if version[0] > max_version {
        return Err(invalid_data(format!("不支持的版本: {}.{}", version[0], version[1])));
    }

    let mut size_bytes = [0u8; 4];
    size_bytes.copy_from_slice(&data[version_offset + 2..HEADER_LEN]);
    Ok((version, u32::from_le_bytes(size_bytes)))
}

/// 解压并反序列化，默认最大版本 1
pub fn from_compressed<T: for<'a> serde::de::Deserialize<'a>>(data: &[u8]) -> Result<T, io::Error> {
    from_compressed_with_max_version(data, 1)
}

/// 解压并反序列化，允许指定支持的最大版本
pub fn from_compressed_with_max_version<T: for<'a> serde::de::Deserialize<'a>>(
    data: &[u8],
    max_version: u8,
) -> Result<T, io::Error> {
    let (_, original_size) = read_header(data, max_version)?;

    let mut decoder = GzDecoder::new(&data[HEADER_LEN..]);
    let mut decompressed = Vec::with_capacity(original_size as usize);
    decoder.read_to_end(&mut decompressed)?;

    if decompressed.len() != original_size as usize {
        return Err(invalid_data(format!(
            "解压后数据大小不匹配: 期望 {} 字节, 实际 {} 字节",
            original_size,
            decompressed.len()
        )));
    }

    from_binary(&decompressed)
}

/// 只校验头部，返回版本号
pub fn validate_compressed_data(data: &[u8], max_version: u8) -> Result<[u8; 2], io::Error> {
    read_header(data, max_version).map(|(version, _)| version)
}
