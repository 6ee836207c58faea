//! # Utility Functions Module
//!
//! Helpers for building external tool command lines.

/// Builds an argument vector from items of mixed `Display` types.
///
/// # Example
/// ```rust
/// use image_batch_optimizer::args;
///
/// let quality = 85;
/// let args = args!["-quality", quality, "-optimize"];
/// assert_eq!(args, vec!["-quality", "85", "-optimize"]);
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        vec![$(::std::string::ToString::to_string(&$item)),*]
    };
}
