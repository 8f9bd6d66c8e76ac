//! # Utility Functions Module
//!
//! Helpers for building command lines for external tools.

/// Builds an owned argument list from heterogeneous items.
///
/// Each item only needs to implement `AsRef<OsStr>`, so `&str`, `String`
/// and `&Path` can be mixed freely. Paths stay `OsString` so non-UTF-8
/// file names reach the child process untouched.
///
/// # Example
/// ```rust
/// use recompress_inplace::args;
///
/// let loops = 6.to_string();
/// let args = args!["--loops", loops, std::path::Path::new("in.jpg")];
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        vec![$(::std::ffi::OsStr::new(&$item).to_os_string()),*]
    };
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;
    use std::path::Path;

    #[test]
    fn test_args_macro_string_literals() {
        let result = args!["--method", "ssim"];
        assert_eq!(result, vec![OsString::from("--method"), OsString::from("ssim")]);
    }

    #[test]
    fn test_args_macro_empty() {
        let result: Vec<OsString> = args![];
        assert!(result.is_empty());
    }

    #[test]
    fn test_args_macro_mixes_paths_and_strings() {
        let loops = 6.to_string();
        let input = Path::new("/photos/a.jpg");
        let result = args!["--loops", loops, input];
        assert_eq!(
            result,
            vec![
                OsString::from("--loops"),
                OsString::from("6"),
                OsString::from("/photos/a.jpg"),
            ]
        );
        // Arguments are borrowed, not moved
        assert_eq!(loops, "6");
    }
}
