use vfs::path::{clean_path, is_absolute, next_token, split_first};

#[test]
fn test_clean_path_trailing_delimiters() {
    assert_eq!(clean_path("/dev/").unwrap(), "/dev");
    assert_eq!(clean_path("/dev///").unwrap(), "/dev");
    assert_eq!(clean_path("/").unwrap(), "");
    assert_eq!(clean_path("///").unwrap(), "");
}

#[test]
fn test_clean_path_duplicate_delimiters() {
    assert_eq!(clean_path("//dev///uart0").unwrap(), "/dev/uart0");
    assert_eq!(clean_path("/a//b/c//").unwrap(), "/a/b/c");
}

#[test]
fn test_clean_path_keeps_dots() {
    // 挂载图不解释 `.` 和 `..`，它们只是普通的路径段
    assert_eq!(clean_path("/a/./b/../c").unwrap(), "/a/./b/../c");
}

#[test]
fn test_clean_path_relative() {
    assert_eq!(clean_path("dev//uart0/").unwrap(), "dev/uart0");
    assert_eq!(clean_path("").unwrap(), "");
}

#[test]
fn test_is_absolute() {
    assert!(is_absolute(""));
    assert!(is_absolute("/dev"));
    assert!(!is_absolute("dev"));
}

#[test]
fn test_next_token() {
    assert_eq!(next_token(""), None);
    assert_eq!(next_token("dev/uart0"), Some(3));
    assert_eq!(next_token("uart0"), Some(5));
    assert_eq!(next_token("/dev"), Some(0));
}

#[test]
fn test_split_first() {
    assert_eq!(split_first("dev/uart0"), Some(("dev", "uart0")));
    assert_eq!(split_first("dev/disk/sda"), Some(("dev", "disk/sda")));
    assert_eq!(split_first("uart0"), Some(("uart0", "")));
    assert_eq!(split_first(""), None);
}

#[test]
fn test_tokenize_clean_path() {
    let clean = clean_path("//usr//local/bin/").unwrap();
    let mut rest = clean.strip_prefix('/').unwrap();
    let mut tokens = Vec::new();
    while let Some((token, next)) = split_first(rest) {
        tokens.push(token);
        rest = next;
    }
    assert_eq!(tokens, ["usr", "local", "bin"]);
}
