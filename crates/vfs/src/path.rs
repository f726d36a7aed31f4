//! 路径清理与分词
//!
//! 挂载图只处理“干净”的路径：去掉末尾的分隔符，并把连续的分隔符折叠成一个。
//! 例如 `//dev///uart0/` 清理后为 `/dev/uart0`，`/` 清理后为空串（即根节点）。

use alloc::string::String;

use crate::FsError;
use crate::config::PATH_DELIMITER;

/// 清理路径：去掉末尾分隔符并折叠重复分隔符
///
/// 输出缓冲区通过 `try_reserve` 分配，分配失败时返回 [`FsError::NoMemory`]。
pub fn clean_path(path: &str) -> Result<String, FsError> {
    let trimmed = path.trim_end_matches(PATH_DELIMITER);

    let mut clean = String::new();
    clean.try_reserve_exact(trimmed.len())?;

    let mut prev_delim = false;
    for ch in trimmed.chars() {
        let is_delim = ch == PATH_DELIMITER;
        if is_delim && prev_delim {
            continue;
        }
        prev_delim = is_delim;
        clean.push(ch);
    }

    Ok(clean)
}

/// 返回下一个分隔符的位置；路径为空时返回 None
///
/// 没有分隔符时返回路径长度，即整个路径就是最后一个 token。
pub fn next_token(path: &str) -> Option<usize> {
    if path.is_empty() {
        return None;
    }
    Some(path.find(PATH_DELIMITER).unwrap_or(path.len()))
}

/// 取出第一个 token，并返回跳过一个分隔符后的剩余路径
///
/// ```ignore
/// assert_eq!(split_first("dev/uart0"), Some(("dev", "uart0")));
/// assert_eq!(split_first("uart0"), Some(("uart0", "")));
/// assert_eq!(split_first(""), None);
/// ```
pub fn split_first(path: &str) -> Option<(&str, &str)> {
    let end = next_token(path)?;
    let (token, rest) = path.split_at(end);
    Some((token, rest.strip_prefix(PATH_DELIMITER).unwrap_or(rest)))
}

/// 判断是否为绝对路径（清理后的根路径为空串，也视为绝对路径）
pub fn is_absolute(clean: &str) -> bool {
    clean.is_empty() || clean.starts_with(PATH_DELIMITER)
}
